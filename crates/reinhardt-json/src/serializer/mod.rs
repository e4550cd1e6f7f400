//! Serializer
//!
//! Recursive-descent writer over a value graph. Each call owns a fresh
//! [`SerializationContext`]; an aggregate met again while it is still being
//! written is a cycle and is written empty (`{}` or `[]`).

mod context;

pub use context::SerializationContext;

use std::io::Write;
use std::sync::Arc;

use reinhardt_records::{
	AttributeDescriptor, BeanRef, DocumentRef, FieldType, KeyedRef, RecordListRef, RecordRef,
	SequenceRef, Value,
};

use crate::classify::{Classified, classify, classify_converted, invoke_converter};
use crate::config::ConverterConfig;
use crate::error::ConversionResult;
use crate::escape::escape;
use crate::metadata::{self, NAME_KEY, SCHEMA_KEY};

fn identity_of<T: ?Sized>(handle: &Arc<T>) -> usize {
	Arc::as_ptr(handle) as *const () as usize
}

/// Writes one value graph as text.
pub struct Serializer<'c> {
	config: &'c ConverterConfig,
	context: SerializationContext,
	out: String,
}

impl<'c> Serializer<'c> {
	/// Create a serializer with an empty output buffer.
	pub fn new(config: &'c ConverterConfig) -> Self {
		Self {
			config,
			context: SerializationContext::new(),
			out: String::new(),
		}
	}

	/// Serialize a value under an optional declared type.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_json::{ConverterConfig, Serializer};
	/// use reinhardt_records::Value;
	///
	/// let config = ConverterConfig::default();
	/// let value = Value::keyed([("id", Value::int(7)), ("tags", Value::sequence(vec![]))]);
	///
	/// let text = Serializer::serialize(&config, &value, None).unwrap();
	/// assert_eq!(text, r#"{"id":7,"tags":[]}"#);
	/// ```
	pub fn serialize(
		config: &ConverterConfig,
		value: &Value,
		declared: Option<&FieldType>,
	) -> ConversionResult<String> {
		tracing::debug!(kind = value.kind_name(), declared = ?declared, "serializing value");
		let mut serializer = Serializer::new(config);
		serializer.write_value(value, declared)?;
		Ok(serializer.into_string())
	}

	/// Serialize a value into a sink.
	///
	/// # Errors
	///
	/// Sink failures surface as [`ConversionError::Io`](crate::ConversionError::Io).
	pub fn serialize_to<W: Write>(
		config: &ConverterConfig,
		value: &Value,
		declared: Option<&FieldType>,
		mut sink: W,
	) -> ConversionResult<()> {
		let text = Self::serialize(config, value, declared)?;
		sink.write_all(text.as_bytes())?;
		sink.flush()?;
		Ok(())
	}

	/// Output written so far.
	pub fn as_str(&self) -> &str {
		&self.out
	}

	/// Take the output.
	pub fn into_string(self) -> String {
		self.out
	}

	/// Write a value, classifying it first.
	pub fn write_value(&mut self, value: &Value, declared: Option<&FieldType>) -> ConversionResult<()> {
		let classified = classify(self.config, declared, value)?;
		self.write_classified(classified, declared)
	}

	fn write_classified(
		&mut self,
		classified: Classified<'_>,
		declared: Option<&FieldType>,
	) -> ConversionResult<()> {
		match classified {
			Classified::Null => self.out.push_str("null"),
			Classified::Boolean(b) => self.out.push_str(if b { "true" } else { "false" }),
			Classified::Number { token, quoted } => {
				if quoted {
					self.write_string(&token);
				} else {
					self.out.push_str(&token);
				}
			}
			Classified::Text(text) => self.write_string(&text),
			Classified::Sequence(handle) => self.write_sequence(handle, declared)?,
			Classified::RecordList(handle) => self.write_record_list(handle)?,
			Classified::Record(handle) => self.write_record(handle)?,
			Classified::Document(handle) => self.write_document(handle)?,
			Classified::Keyed(handle) => self.write_keyed(handle)?,
			Classified::Opaque(handle) => self.write_bean(handle)?,
		}
		Ok(())
	}

	fn write_string(&mut self, text: &str) {
		self.out.push('"');
		self.out.push_str(&escape(text, self.config.escape_unicode()));
		self.out.push('"');
	}

	fn write_key(&mut self, key: &str) {
		self.write_string(key);
		if self.config.pretty_print().is_some() {
			self.out.push_str(": ");
		} else {
			self.out.push(':');
		}
	}

	fn indent(&mut self, depth: usize) {
		let config = self.config;
		if let Some(pretty) = config.pretty_print() {
			self.out.push_str(&pretty.line_separator);
			for _ in 0..depth {
				self.out.push_str(&pretty.indent);
			}
		}
	}

	/// Separate a member from its predecessor.
	fn member(&mut self, first: &mut bool) {
		if !*first {
			self.out.push(',');
		}
		*first = false;
		self.indent(self.context.current_depth());
	}

	fn close(&mut self, delimiter: char, empty: bool) {
		if !empty {
			self.indent(self.context.current_depth().saturating_sub(1));
		}
		self.out.push(delimiter);
	}

	/// Enter an aggregate, writing `truncated` instead when it is already on
	/// the current path.
	fn enter(&mut self, identity: usize, truncated: &str) -> bool {
		if self.context.enter(identity) {
			return true;
		}
		tracing::trace!(identity, "truncating cyclic reference");
		self.out.push_str(truncated);
		false
	}

	/// Whether a member is left out of keyed, record or bean output.
	fn skipped(&self, value: &Value) -> bool {
		if value.is_null() {
			!self.config.output_null()
		} else {
			self.config.is_disabled_value(value)
		}
	}

	fn write_sequence(&mut self, handle: &SequenceRef, declared: Option<&FieldType>) -> ConversionResult<()> {
		let identity = identity_of(handle);
		if !self.enter(identity, "[]") {
			return Ok(());
		}
		let element = declared
			.and_then(FieldType::element_type)
			.filter(|element| **element != FieldType::Any);

		let items = handle.read();
		self.out.push('[');
		let mut first = true;
		for item in items.iter() {
			self.member(&mut first);
			self.write_value(item, element)?;
		}
		self.close(']', first);
		drop(items);

		self.context.leave(identity);
		Ok(())
	}

	fn write_record_list(&mut self, handle: &RecordListRef) -> ConversionResult<()> {
		let identity = identity_of(handle);
		if !self.enter(identity, "[]") {
			return Ok(());
		}

		let records: Vec<RecordRef> = handle.read().iter().cloned().collect();
		self.out.push('[');
		let mut first = true;
		for record in &records {
			self.member(&mut first);
			self.write_record(record)?;
		}
		self.close(']', first);

		self.context.leave(identity);
		Ok(())
	}

	fn write_record(&mut self, handle: &RecordRef) -> ConversionResult<()> {
		let identity = identity_of(handle);
		if !self.enter(identity, "{}") {
			return Ok(());
		}
		let config = self.config;

		let record = handle.read();
		let schema = Arc::clone(record.schema());
		self.out.push('{');
		let mut first = true;
		for (field, value) in record.iter() {
			if value.is_null() && !config.output_null() {
				continue;
			}
			self.member(&mut first);
			self.write_key(&config.key_case().apply(field.name()));
			match config.field_converter(schema.name(), field.name()) {
				Some(converter) if !value.is_null() => {
					let name = format!("{}.{}", schema.name(), field.name());
					let text = invoke_converter(converter.as_ref(), &name, value)?;
					self.write_classified(
						classify_converted(text, field.field_type()),
						Some(field.field_type()),
					)?;
				}
				_ => self.write_value(value, Some(field.field_type()))?,
			}
		}
		self.close('}', first);
		drop(record);

		self.context.leave(identity);
		Ok(())
	}

	fn write_keyed(&mut self, handle: &KeyedRef) -> ConversionResult<()> {
		let identity = identity_of(handle);
		if !self.enter(identity, "{}") {
			return Ok(());
		}

		let map = handle.read();
		self.out.push('{');
		let mut first = true;
		for (key, value) in map.iter() {
			if self.skipped(value) {
				continue;
			}
			self.member(&mut first);
			self.write_key(key);
			self.write_value(value, None)?;
		}
		self.close('}', first);
		drop(map);

		self.context.leave(identity);
		Ok(())
	}

	fn write_bean(&mut self, handle: &BeanRef) -> ConversionResult<()> {
		let identity = identity_of(handle);
		if !self.enter(identity, "{}") {
			return Ok(());
		}
		let config = self.config;

		let members: Vec<(AttributeDescriptor, Value)> = {
			let bean = handle.read();
			let mut members = Vec::new();
			for attribute in config.introspector().attributes_of(&*bean) {
				if !attribute.readable {
					continue;
				}
				let value = bean.read(&attribute.name)?;
				if value.identity() == Some(identity) {
					tracing::trace!(
						bean = bean.type_name(),
						attribute = %attribute.name,
						"skipping self reference"
					);
					continue;
				}
				members.push((attribute, value));
			}
			members
		};

		self.out.push('{');
		let mut first = true;
		for (attribute, value) in &members {
			if self.skipped(value) {
				continue;
			}
			self.member(&mut first);
			self.write_key(&config.key_case().apply(&attribute.name));
			self.write_value(value, Some(&attribute.field_type))?;
		}
		self.close('}', first);

		self.context.leave(identity);
		Ok(())
	}

	fn write_document(&mut self, handle: &DocumentRef) -> ConversionResult<()> {
		let identity = identity_of(handle);
		if !self.enter(identity, "{}") {
			return Ok(());
		}
		let config = self.config;

		let document = handle.read();
		self.out.push('{');
		let mut first = true;
		if config.emit_schema_metadata() {
			let meta = metadata::describe(&document, config.binder());
			self.member(&mut first);
			self.write_key(SCHEMA_KEY);
			self.write_value(&meta, None)?;
		}
		if let Some(name) = document.name() {
			self.member(&mut first);
			self.write_key(NAME_KEY);
			self.write_string(name);
		}
		for (name, aggregate) in document.aggregates() {
			self.member(&mut first);
			self.write_key(name);
			self.write_value(&aggregate.to_value(), None)?;
		}
		self.close('}', first);
		drop(document);

		self.context.leave(identity);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{KeyCase, PrettyPrint};
	use reinhardt_records::{Record, RecordList, Schema};
	use rstest::rstest;

	fn write(config: &ConverterConfig, value: &Value) -> String {
		Serializer::serialize(config, value, None).unwrap()
	}

	fn person() -> Arc<Schema> {
		Schema::builder("person")
			.field("id", FieldType::I32)
			.field("name", FieldType::Text)
			.build_shared()
			.unwrap()
	}

	#[rstest]
	fn test_record_fields_in_schema_order() {
		// Arrange
		let config = ConverterConfig::default();
		let record = Record::new(person())
			.with("name", "Al")
			.unwrap()
			.with("id", 7)
			.unwrap();

		// Act
		let text = write(&config, &Value::record(record));

		// Assert
		assert_eq!(text, r#"{"id":7,"name":"Al"}"#);
	}

	#[rstest]
	#[case(true, r#"{"id":0,"name":null}"#)]
	#[case(false, "{}")]
	fn test_null_fields(#[case] output_null: bool, #[case] expected: &str) {
		let config = ConverterConfig::builder().output_null(output_null).build();

		let text = write(&config, &Value::record(Record::new(person())));

		assert_eq!(text, expected);
	}

	#[rstest]
	fn test_keyed_cycle_is_truncated() {
		// Arrange
		let config = ConverterConfig::default();
		let map = Value::keyed([("name", Value::text("root"))]);
		map.as_keyed()
			.unwrap()
			.write()
			.insert("self".to_string(), map.clone());

		// Act
		let text = write(&config, &map);

		// Assert
		assert_eq!(text, r#"{"name":"root","self":{}}"#);
	}

	#[rstest]
	fn test_sequence_cycle_is_truncated() {
		let config = ConverterConfig::default();
		let list = Value::sequence(vec![Value::int(1)]);
		list.as_sequence().unwrap().write().push(list.clone());

		assert_eq!(write(&config, &list), "[1,[]]");
	}

	#[rstest]
	fn test_shared_node_written_twice() {
		// Arrange
		let config = ConverterConfig::default();
		let shared = Value::keyed([("v", Value::int(1))]);
		let root = Value::sequence(vec![shared.clone(), shared]);

		// Act
		let text = write(&config, &root);

		// Assert
		assert_eq!(text, r#"[{"v":1},{"v":1}]"#);
	}

	#[rstest]
	fn test_disabled_types_skipped_in_keyed() {
		let config = ConverterConfig::builder()
			.disable_type(FieldType::Timestamp)
			.build();
		let map = Value::keyed([
			("at", Value::Timestamp(chrono::Utc::now())),
			("id", Value::int(1)),
		]);

		assert_eq!(write(&config, &map), r#"{"id":1}"#);
	}

	#[rstest]
	fn test_key_case_applies_to_records() {
		let config = ConverterConfig::builder().key_case(KeyCase::Upper).build();
		let record = Record::new(person()).with("id", 1).unwrap();

		assert_eq!(
			write(&config, &Value::record(record)),
			r#"{"ID":1,"NAME":null}"#
		);
	}

	#[rstest]
	fn test_pretty_print() {
		// Arrange
		let config = ConverterConfig::builder()
			.pretty_print(PrettyPrint::default())
			.build();
		let value = Value::keyed([
			("a", Value::sequence(vec![Value::int(1), Value::int(2)])),
			("b", Value::keyed::<&str, _>([])),
		]);

		// Act
		let text = write(&config, &value);

		// Assert
		assert_eq!(text, "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {}\n}");
	}

	#[rstest]
	fn test_empty_sequence_with_declared_element() {
		let config = ConverterConfig::default();
		let declared = FieldType::list(FieldType::I32);

		let text = Serializer::serialize(&config, &Value::sequence(vec![]), Some(&declared)).unwrap();

		assert_eq!(text, "[]");
	}

	#[rstest]
	fn test_declared_element_type_applies_null_default() {
		let config = ConverterConfig::default();
		let declared = FieldType::list(FieldType::Bool);

		let text =
			Serializer::serialize(&config, &Value::sequence(vec![Value::Null]), Some(&declared)).unwrap();

		assert_eq!(text, "[false]");
	}

	#[rstest]
	fn test_record_list() {
		// Arrange
		let config = ConverterConfig::default();
		let mut list = RecordList::new(person());
		list.push_record(Record::new(person()).with("id", 1).unwrap().with("name", "a").unwrap())
			.unwrap();
		list.push_record(Record::new(person()).with("id", 2).unwrap().with("name", "b").unwrap())
			.unwrap();

		// Act
		let text = write(&config, &Value::record_list(list));

		// Assert
		assert_eq!(text, r#"[{"id":1,"name":"a"},{"id":2,"name":"b"}]"#);
	}

	#[rstest]
	fn test_serialize_to_sink() {
		let config = ConverterConfig::default();
		let mut sink = Vec::new();

		Serializer::serialize_to(&config, &Value::sequence(vec![Value::Bool(true)]), None, &mut sink)
			.unwrap();

		assert_eq!(sink, b"[true]");
	}
}
