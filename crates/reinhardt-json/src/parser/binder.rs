//! Binding parsed members into their targets

use std::collections::HashMap;
use std::sync::Arc;

use reinhardt_records::{
	BeanRef, DocumentTemplate, FieldType, KeyedRef, RecordRef, Schema, SchemaBinder, Value,
};

use crate::config::ConverterConfig;
use crate::error::ConversionResult;
use crate::registry::CustomConverter;

/// A resolved member of an object being read.
pub(crate) struct FieldSlot {
	pub index: usize,
	pub name: String,
	pub declared: Option<FieldType>,
	pub scalar_override: bool,
	pub converter: Option<Arc<dyn CustomConverter>>,
	/// Declared but not writable; the value is consumed and dropped.
	pub read_only: bool,
}

impl FieldSlot {
	fn untyped(name: &str) -> Self {
		Self {
			index: 0,
			name: name.to_string(),
			declared: None,
			scalar_override: false,
			converter: None,
			read_only: false,
		}
	}
}

/// Aggregate receiving the members of one object.
pub(crate) trait ObjectTarget {
	/// Schema or type name used in unknown-field errors.
	fn owner(&self) -> String;

	/// Resolve a key, `None` when the target does not declare it.
	fn slot(
		&self,
		config: &ConverterConfig,
		binder: &dyn SchemaBinder,
		key: &str,
	) -> ConversionResult<Option<FieldSlot>>;

	fn assign(&mut self, slot: &FieldSlot, value: Value) -> ConversionResult<()>;
}

/// Free-form map; every key is accepted untyped.
pub(crate) struct KeyedTarget(pub KeyedRef);

impl ObjectTarget for KeyedTarget {
	fn owner(&self) -> String {
		"map".to_string()
	}

	fn slot(
		&self,
		_config: &ConverterConfig,
		_binder: &dyn SchemaBinder,
		key: &str,
	) -> ConversionResult<Option<FieldSlot>> {
		Ok(Some(FieldSlot::untyped(key)))
	}

	fn assign(&mut self, slot: &FieldSlot, value: Value) -> ConversionResult<()> {
		self.0.write().insert(slot.name.clone(), value);
		Ok(())
	}
}

pub(crate) struct RecordTarget {
	record: RecordRef,
	schema: Arc<Schema>,
}

impl RecordTarget {
	pub(crate) fn new(record: RecordRef) -> Self {
		let schema = Arc::clone(record.read().schema());
		Self { record, schema }
	}
}

impl ObjectTarget for RecordTarget {
	fn owner(&self) -> String {
		self.schema.name().to_string()
	}

	fn slot(
		&self,
		config: &ConverterConfig,
		binder: &dyn SchemaBinder,
		key: &str,
	) -> ConversionResult<Option<FieldSlot>> {
		let Some((index, field)) = binder.resolve_field(&self.schema, key) else {
			return Ok(None);
		};
		let converter = config
			.field_converter(self.schema.name(), field.name())
			.cloned()
			.or_else(|| {
				config
					.converters()
					.resolve_declared(field.field_type())
					.map(|(_, converter)| converter)
			});
		Ok(Some(FieldSlot {
			index,
			name: field.name().to_string(),
			declared: Some(field.field_type().clone()),
			scalar_override: field.permits_scalar_override(),
			converter,
			read_only: false,
		}))
	}

	fn assign(&mut self, slot: &FieldSlot, value: Value) -> ConversionResult<()> {
		self.record.write().set_at(slot.index, value)?;
		Ok(())
	}
}

pub(crate) struct BeanTarget {
	bean: BeanRef,
	type_name: String,
}

impl BeanTarget {
	pub(crate) fn new(bean: BeanRef) -> Self {
		let type_name = bean.read().type_name().to_string();
		Self { bean, type_name }
	}
}

impl ObjectTarget for BeanTarget {
	fn owner(&self) -> String {
		self.type_name.clone()
	}

	fn slot(
		&self,
		config: &ConverterConfig,
		_binder: &dyn SchemaBinder,
		key: &str,
	) -> ConversionResult<Option<FieldSlot>> {
		let attribute = {
			let bean = self.bean.read();
			config.introspector().attribute(&*bean, key)
		};
		Ok(attribute.map(|attribute| FieldSlot {
			index: 0,
			converter: config
				.converters()
				.resolve_declared(&attribute.field_type)
				.map(|(_, converter)| converter),
			read_only: !attribute.writable,
			name: attribute.name,
			declared: Some(attribute.field_type),
			scalar_override: false,
		}))
	}

	fn assign(&mut self, slot: &FieldSlot, value: Value) -> ConversionResult<()> {
		self.bean.write().write(&slot.name, value)?;
		Ok(())
	}
}

/// Schemas declared inline by a document, consulted before the configured
/// binder.
pub(crate) struct LayeredBinder<'c> {
	inline: HashMap<String, Arc<Schema>>,
	fallback: &'c dyn SchemaBinder,
}

impl<'c> LayeredBinder<'c> {
	pub(crate) fn new(fallback: &'c dyn SchemaBinder) -> Self {
		Self {
			inline: HashMap::new(),
			fallback,
		}
	}

	pub(crate) fn extend(&mut self, schemas: HashMap<String, Arc<Schema>>) {
		self.inline.extend(schemas);
	}
}

impl SchemaBinder for LayeredBinder<'_> {
	fn schema(&self, name: &str) -> Option<Arc<Schema>> {
		self.inline
			.get(name)
			.cloned()
			.or_else(|| self.fallback.schema(name))
	}

	fn document_template(&self, name: &str) -> Option<DocumentTemplate> {
		self.fallback.document_template(name)
	}
}
