//! Parser
//!
//! Recursive descent over decoded text with one byte of lookahead. Members
//! are bound as they are read: into a keyed map or sequence when nothing is
//! known about the target, into records through the configured
//! [`SchemaBinder`], and into beans through the configured introspector.
//!
//! Before tokenizing, a leading byte-order mark is dropped, JSONP padding is
//! removed when enabled, and every `\uHHHH` escape is resolved in one pass.

mod binder;
mod reader;

use std::sync::Arc;

use parking_lot::RwLock;
use reinhardt_records::{
	Aggregate, DocumentRef, DocumentTemplate, FieldType, RecordListRef, SchemaBinder, Value,
};

use crate::config::ConverterConfig;
use crate::error::{ConversionError, ConversionResult};
use crate::escape::decode_unicode_escapes;
use crate::metadata::{self, NAME_KEY, SCHEMA_KEY};
use crate::registry::CustomConverter;

use binder::{BeanTarget, FieldSlot, KeyedTarget, LayeredBinder, ObjectTarget, RecordTarget};
use reader::Reader;

/// What a parse produces.
#[derive(Debug, Clone, Default)]
pub enum Target {
	/// A graph of keyed maps, sequences and inferred scalars.
	#[default]
	Generic,
	/// A new instance of the named bean type, schema or document template.
	///
	/// Bean factories are consulted first, then schemas (an array produces a
	/// record list), then document templates.
	Type(String),
	/// Bind into an existing aggregate. Sequences are appended to.
	Into(Value),
	/// A document whose shape comes from inline `@schema` metadata or from
	/// the template registered under its `@name`.
	Document,
}

/// Type information for the value about to be read.
#[derive(Default)]
struct Expect {
	declared: Option<FieldType>,
	scalar_override: bool,
	converter: Option<Arc<dyn CustomConverter>>,
}

impl Expect {
	fn typed(config: &ConverterConfig, declared: &FieldType) -> Self {
		Self {
			declared: Some(declared.clone()),
			scalar_override: false,
			converter: config
				.converters()
				.resolve_declared(declared)
				.map(|(_, converter)| converter),
		}
	}
}

impl From<&FieldSlot> for Expect {
	fn from(slot: &FieldSlot) -> Self {
		Self {
			declared: slot.declared.clone(),
			scalar_override: slot.scalar_override,
			converter: slot.converter.clone(),
		}
	}
}

/// Drop everything up to the first `(` and from the last `)`, unless the text
/// already opens with an aggregate.
fn strip_padding(text: &str) -> &str {
	if text.trim_start().starts_with(['{', '[']) {
		return text;
	}
	match (text.find('('), text.rfind(')')) {
		(Some(open), Some(close)) if open < close => &text[open + 1..close],
		_ => text,
	}
}

/// Parse text into a value.
///
/// # Errors
///
/// Fails on malformed structure, trailing content, an unknown field while
/// `ignore_unknown` is off, a scalar that cannot be coerced to its declared
/// type, or a target that cannot be resolved.
///
/// # Examples
///
/// ```
/// use reinhardt_json::{ConverterConfig, Target, parse};
///
/// let config = ConverterConfig::default();
/// let value = parse(&config, r#"{"id": 7, "tags": ["a"]}"#, Target::Generic).unwrap();
///
/// let map = value.as_keyed().unwrap().read();
/// assert_eq!(map["id"].as_i64(), Some(7));
/// assert_eq!(map["tags"].as_sequence().unwrap().read().len(), 1);
/// ```
pub fn parse(config: &ConverterConfig, text: &str, target: Target) -> ConversionResult<Value> {
	tracing::debug!(length = text.len(), target = ?target, "parsing document");
	let text = text.strip_prefix('\u{feff}').unwrap_or(text);
	let text = if config.jsonp() {
		strip_padding(text)
	} else {
		text
	};
	let decoded = decode_unicode_escapes(text)?;

	let mut parser = Parser {
		config,
		binder: LayeredBinder::new(config.binder()),
		reader: Reader::new(&decoded),
	};
	let value = parser.read_document(target)?;
	if !parser.reader.at_end() {
		return Err(parser.reader.error("Unexpected trailing content"));
	}
	Ok(value)
}

struct Parser<'c, 'i> {
	config: &'c ConverterConfig,
	binder: LayeredBinder<'c>,
	reader: Reader<'i>,
}

impl Parser<'_, '_> {
	fn read_document(&mut self, target: Target) -> ConversionResult<Value> {
		self.reader.skip_ws();
		match self.reader.peek() {
			Some(b'{') | Some(b'[') => {}
			Some(_) => {
				return Err(self
					.reader
					.error("Not a valid document: expected '{' or '['"));
			}
			None => return Err(self.reader.eof()),
		}

		match target {
			Target::Generic => self.read_value(&Expect::default()),
			Target::Type(name) => self.read_type(&name),
			Target::Into(value) => self.read_into(value),
			Target::Document => {
				let handle: DocumentRef = Arc::new(RwLock::new(Default::default()));
				self.read_document_members(&handle, false)?;
				Ok(Value::Document(handle))
			}
		}
	}

	fn read_type(&mut self, name: &str) -> ConversionResult<Value> {
		let config = self.config;
		if config.factories().contains(name) {
			let bean = config.factories().create(name)?;
			self.read_object(&mut BeanTarget::new(Arc::clone(&bean)))?;
			return Ok(Value::Opaque(bean));
		}
		if self.binder.schema(name).is_some() {
			return if self.reader.peek() == Some(b'[') {
				let list = self.binder.create_nested_record_list(name)?;
				let handle = Arc::new(RwLock::new(list));
				self.read_records(&handle)?;
				Ok(Value::RecordList(handle))
			} else {
				let record = Arc::new(RwLock::new(self.binder.create_nested_record(name)?));
				self.read_object(&mut RecordTarget::new(Arc::clone(&record)))?;
				Ok(Value::Record(record))
			};
		}
		if let Some(template) = self.binder.document_template(name) {
			let handle: DocumentRef = Arc::new(RwLock::new(Default::default()));
			instantiate(&handle, &template);
			self.read_document_members(&handle, true)?;
			return Ok(Value::Document(handle));
		}
		Err(ConversionError::Configuration(format!(
			"no bean factory, schema or document template named '{}'",
			name
		)))
	}

	fn read_into(&mut self, value: Value) -> ConversionResult<Value> {
		match &value {
			Value::Record(record) => self.read_object(&mut RecordTarget::new(Arc::clone(record)))?,
			Value::RecordList(list) => self.read_records(list)?,
			Value::Keyed(map) => self.read_object(&mut KeyedTarget(Arc::clone(map)))?,
			Value::Opaque(bean) => self.read_object(&mut BeanTarget::new(Arc::clone(bean)))?,
			Value::Document(document) => {
				let resolved = !document.read().is_empty();
				self.read_document_members(document, resolved)?;
			}
			Value::Sequence(items) => {
				let items = Arc::clone(items);
				self.read_elements(|parser| {
					let item = parser.read_value(&Expect::default())?;
					items.write().push(item);
					Ok(())
				})?;
			}
			other => {
				return Err(ConversionError::Configuration(format!(
					"cannot bind into a {} value",
					other.kind_name()
				)));
			}
		}
		Ok(value)
	}

	fn read_value(&mut self, expect: &Expect) -> ConversionResult<Value> {
		self.reader.skip_ws();
		let start = self.reader.position();
		match self.reader.peek() {
			Some(b'"') => {
				let text = self.reader.read_string()?;
				self.string_value(&text, expect, start)
			}
			Some(b'{') => self.object_value(expect, start),
			Some(b'[') => self.array_value(expect, start),
			Some(_) => {
				let token = self.reader.read_bare()?;
				self.bare_value(token, expect, start)
			}
			None => Err(self.reader.eof()),
		}
	}

	fn convert(&self, converter: &dyn CustomConverter, text: &str, expect: &Expect) -> ConversionResult<Value> {
		let name = expect
			.declared
			.as_ref()
			.map(ToString::to_string)
			.unwrap_or_default();
		tracing::trace!(converter = %name, "invoking custom converter");
		converter
			.from_text(text)
			.map_err(|e| ConversionError::ConverterInvocation {
				converter: name,
				message: e.0,
			})
	}

	fn string_value(&self, text: &str, expect: &Expect, start: usize) -> ConversionResult<Value> {
		if let Some(converter) = &expect.converter {
			return self.convert(converter.as_ref(), text, expect);
		}
		let Some(declared) = expect.declared.as_ref() else {
			return Ok(Value::text(text));
		};
		match declared.non_optional() {
			FieldType::Any | FieldType::Text => Ok(Value::text(text)),
			FieldType::Record(_)
			| FieldType::RecordList(_)
			| FieldType::List(_)
			| FieldType::Map
			| FieldType::Object(_) => {
				if expect.scalar_override {
					Ok(Value::text(text))
				} else {
					Err(ConversionError::coercion(
						text,
						declared,
						"a string cannot populate a nested aggregate",
					)
					.at(start))
				}
			}
			_ => self
				.config
				.editors()
				.to_scalar(text, declared)
				.map_err(|e| e.at(start)),
		}
	}

	fn bare_value(&self, token: &str, expect: &Expect, start: usize) -> ConversionResult<Value> {
		if token == "null" {
			return Ok(Value::Null);
		}
		if let Some(converter) = &expect.converter {
			return self.convert(converter.as_ref(), token, expect);
		}
		let declared = expect.declared.as_ref().unwrap_or(&FieldType::Any);
		self.config
			.editors()
			.to_scalar(token, declared)
			.map_err(|e| e.at(start))
	}

	fn object_value(&mut self, expect: &Expect, start: usize) -> ConversionResult<Value> {
		let config = self.config;
		match expect.declared.as_ref().map(FieldType::non_optional) {
			None | Some(FieldType::Any) | Some(FieldType::Map) => {
				let map = Value::keyed::<String, _>([]);
				if let Value::Keyed(handle) = &map {
					self.read_object(&mut KeyedTarget(Arc::clone(handle)))?;
				}
				Ok(map)
			}
			Some(FieldType::Record(schema)) => {
				let record = Arc::new(RwLock::new(self.binder.create_nested_record(schema)?));
				self.read_object(&mut RecordTarget::new(Arc::clone(&record)))?;
				Ok(Value::Record(record))
			}
			Some(FieldType::Object(type_name)) => {
				let bean = config.factories().create(type_name)?;
				self.read_object(&mut BeanTarget::new(Arc::clone(&bean)))?;
				Ok(Value::Opaque(bean))
			}
			Some(other) => Err(ConversionError::coercion(
				self.reader.fragment(),
				other,
				"an object cannot populate this type",
			)
			.at(start)),
		}
	}

	fn array_value(&mut self, expect: &Expect, start: usize) -> ConversionResult<Value> {
		match expect.declared.as_ref().map(FieldType::non_optional) {
			None | Some(FieldType::Any) => self.read_sequence(&Expect::default()),
			Some(FieldType::List(element)) => {
				let element = Expect::typed(self.config, element);
				self.read_sequence(&element)
			}
			Some(FieldType::RecordList(schema)) => {
				let list = Arc::new(RwLock::new(self.binder.create_nested_record_list(schema)?));
				self.read_records(&list)?;
				Ok(Value::RecordList(list))
			}
			Some(other) => Err(ConversionError::coercion(
				self.reader.fragment(),
				other,
				"an array cannot populate this type",
			)
			.at(start)),
		}
	}

	fn read_sequence(&mut self, element: &Expect) -> ConversionResult<Value> {
		let mut items = Vec::new();
		self.read_elements(|parser| {
			items.push(parser.read_value(element)?);
			Ok(())
		})?;
		Ok(Value::sequence(items))
	}

	/// Read an array of objects, each into a fresh record of the list.
	fn read_records(&mut self, list: &RecordListRef) -> ConversionResult<()> {
		self.read_elements(|parser| {
			let record = list.write().new_record();
			parser.read_object(&mut RecordTarget::new(record))
		})
	}

	fn read_elements(
		&mut self,
		mut element: impl FnMut(&mut Self) -> ConversionResult<()>,
	) -> ConversionResult<()> {
		self.reader.expect(b'[')?;
		self.reader.skip_ws();
		if self.reader.peek() == Some(b']') {
			self.reader.advance();
			return Ok(());
		}
		loop {
			element(self)?;
			self.reader.skip_ws();
			match self.reader.peek() {
				Some(b',') => self.reader.advance(),
				Some(b']') => {
					self.reader.advance();
					return Ok(());
				}
				Some(_) => return Err(self.reader.error("Expected ',' or ']'")),
				None => return Err(self.reader.eof()),
			}
		}
	}

	/// Read one object, calling `member` with each key after its `:`.
	fn read_members(
		&mut self,
		mut member: impl FnMut(&mut Self, String, usize) -> ConversionResult<()>,
	) -> ConversionResult<()> {
		self.reader.expect(b'{')?;
		self.reader.skip_ws();
		if self.reader.peek() == Some(b'}') {
			self.reader.advance();
			return Ok(());
		}
		loop {
			self.reader.skip_ws();
			let position = self.reader.position();
			match self.reader.peek() {
				Some(b'"') => {}
				Some(_) => return Err(self.reader.error("Expected '\"' to start a key")),
				None => return Err(self.reader.eof()),
			}
			let key = self.reader.read_string()?.into_owned();
			self.reader.expect(b':')?;
			member(self, key, position)?;

			self.reader.skip_ws();
			match self.reader.peek() {
				Some(b',') => self.reader.advance(),
				Some(b'}') => {
					self.reader.advance();
					return Ok(());
				}
				Some(_) => return Err(self.reader.error("Expected ',' or '}'")),
				None => return Err(self.reader.eof()),
			}
		}
	}

	fn read_object(&mut self, target: &mut dyn ObjectTarget) -> ConversionResult<()> {
		self.read_members(|parser, key, position| {
			let slot = target.slot(parser.config, &parser.binder, &key)?;
			match slot {
				Some(slot) if slot.read_only => {
					tracing::trace!(field = %slot.name, owner = %target.owner(), "skipping read-only attribute");
					parser.skip_value()
				}
				Some(slot) => {
					let value = parser.read_value(&Expect::from(&slot))?;
					target.assign(&slot, value)
				}
				None => parser.unknown(key, target.owner(), position),
			}
		})
	}

	/// Fail on an undeclared member, or consume and drop it when lenient.
	fn unknown(&mut self, field: String, owner: String, position: usize) -> ConversionResult<()> {
		if !self.config.ignore_unknown() {
			return Err(ConversionError::UnknownField {
				field,
				owner,
				position,
			});
		}
		tracing::debug!(field = %field, owner = %owner, "ignoring unknown field");
		self.skip_value()
	}

	/// Consume a value without binding it.
	fn skip_value(&mut self) -> ConversionResult<()> {
		self.reader.skip_ws();
		match self.reader.peek() {
			Some(b'"') => self.reader.read_string().map(drop),
			Some(b'{') => self.read_members(|parser, _, _| parser.skip_value()),
			Some(b'[') => self.read_elements(Self::skip_value),
			Some(_) => self.reader.read_bare().map(drop),
			None => Err(self.reader.eof()),
		}
	}

	/// Read the members of a document object.
	///
	/// The shape comes from, in order: an already instantiated document,
	/// inline `@schema` metadata, or the template registered under `@name`.
	/// Either metadata member must come before the first aggregate.
	fn read_document_members(&mut self, document: &DocumentRef, mut resolved: bool) -> ConversionResult<()> {
		self.read_members(|parser, key, position| {
			match key.as_str() {
				SCHEMA_KEY if resolved => {
					tracing::debug!("document shape already resolved, skipping '{}'", SCHEMA_KEY);
					parser.skip_value()
				}
				SCHEMA_KEY => {
					parser.reader.skip_ws();
					let meta_position = parser.reader.position();
					let meta = parser.read_value(&Expect::default())?;
					let inline = metadata::read(&meta, meta_position)?;
					parser.binder.extend(inline.schemas);
					instantiate(document, &inline.template);
					resolved = true;
					Ok(())
				}
				NAME_KEY => {
					// Metadata is never routed through user converters.
					let plain = Expect {
						declared: Some(FieldType::Text),
						..Expect::default()
					};
					let Some(name) = parser.read_value(&plain)?.as_str().map(str::to_string) else {
						return Ok(());
					};
					if !resolved && let Some(template) = parser.binder.document_template(&name) {
						instantiate(document, &template);
						resolved = true;
					}
					document.write().set_name(Some(name));
					Ok(())
				}
				_ if !resolved => Err(ConversionError::Configuration(format!(
					"document shape is unresolved at '{}': supply a target, '{}' or a registered '{}'",
					key, SCHEMA_KEY, NAME_KEY
				))),
				_ => {
					let aggregate = {
						let document = document.read();
						document.get(&key).cloned().or_else(|| {
							document
								.aggregates()
								.find(|(name, _)| name.eq_ignore_ascii_case(&key))
								.map(|(_, aggregate)| aggregate.clone())
						})
					};
					let Some(aggregate) = aggregate else {
						let owner = document
							.read()
							.name()
							.unwrap_or("<anonymous>")
							.to_string();
						return parser.unknown(key, owner, position);
					};
					parser.reader.skip_ws();
					if parser.reader.peek() == Some(b'n') {
						let token = parser.reader.read_bare()?;
						if token == "null" {
							return Ok(());
						}
						return Err(parser.reader.error(format!("Unexpected token '{}'", token)));
					}
					match aggregate {
						Aggregate::Record(record) => parser.read_object(&mut RecordTarget::new(record)),
						Aggregate::List(list) => parser.read_records(&list),
					}
				}
			}
		})?;

		if !resolved {
			return Err(ConversionError::Configuration(format!(
				"document shape is unresolved: supply a target, '{}' or a registered '{}'",
				SCHEMA_KEY, NAME_KEY
			)));
		}
		Ok(())
	}
}

/// Add the aggregates of a template to a document, keeping aggregates it
/// already has.
fn instantiate(document: &DocumentRef, template: &DocumentTemplate) {
	let fresh = reinhardt_records::Document::from_template(template);
	let mut document = document.write();
	for (name, aggregate) in fresh.aggregates() {
		if document.get(name).is_none() {
			document.insert(name, aggregate.clone());
		}
	}
	if document.name().is_none()
		&& let Some(name) = template.name()
	{
		document.set_name(Some(name.to_string()));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reinhardt_records::{Record, RecordList, Schema, SchemaRegistry};
	use rstest::{fixture, rstest};

	#[fixture]
	fn registry() -> Arc<SchemaRegistry> {
		let registry = SchemaRegistry::new();
		registry.register(
			Schema::builder("person")
				.field("id", FieldType::I32)
				.field("name", FieldType::Text)
				.field("address", FieldType::optional(FieldType::record("address")))
				.build()
				.unwrap(),
		);
		registry.register(
			Schema::builder("address")
				.field("city", FieldType::Text)
				.build()
				.unwrap(),
		);
		Arc::new(registry)
	}

	fn config_with(registry: Arc<SchemaRegistry>) -> ConverterConfig {
		ConverterConfig::builder().binder(registry).build()
	}

	#[rstest]
	fn test_generic_infers_scalars() {
		// Arrange
		let config = ConverterConfig::default();

		// Act
		let value = parse(&config, r#"[1, 2.5, true, null, "x"]"#, Target::Generic).unwrap();

		// Assert
		let items = value.as_sequence().unwrap().read();
		assert_eq!(items[0], Value::int(1));
		assert_eq!(items[1].as_f64(), Some(2.5));
		assert_eq!(items[2], Value::Bool(true));
		assert_eq!(items[3], Value::Null);
		assert_eq!(items[4], Value::text("x"));
	}

	#[rstest]
	fn test_nested_record_from_schema(registry: Arc<SchemaRegistry>) {
		// Arrange
		let config = config_with(registry);
		let input = r#"{"id":7,"name":"Al","address":{"city":"Oslo"}}"#;

		// Act
		let value = parse(&config, input, Target::Type("person".to_string())).unwrap();

		// Assert
		let record = value.as_record().unwrap().read();
		assert_eq!(record.get("id"), Some(&Value::int(7)));
		assert_eq!(record.get("name"), Some(&Value::text("Al")));
		let address = record.get("address").unwrap().as_record().unwrap().read();
		assert_eq!(address.schema().name(), "address");
		assert_eq!(address.get("city"), Some(&Value::text("Oslo")));
	}

	#[rstest]
	fn test_array_of_schema_gives_record_list(registry: Arc<SchemaRegistry>) {
		let config = config_with(registry);

		let value = parse(&config, r#"[{"id":1},{"id":2}]"#, Target::Type("person".to_string())).unwrap();

		let list = value.as_record_list().unwrap().read();
		assert_eq!(list.len(), 2);
		assert_eq!(list.get(1).unwrap().read().get("id"), Some(&Value::int(2)));
	}

	#[rstest]
	fn test_string_for_nested_record_is_rejected(registry: Arc<SchemaRegistry>) {
		let config = config_with(registry);

		let error = parse(
			&config,
			r#"{"address":"Oslo"}"#,
			Target::Type("person".to_string()),
		)
		.unwrap_err();

		assert!(error.is_coercion());
		assert_eq!(error.position(), Some(11));
	}

	#[rstest]
	fn test_scalar_override_keeps_text() {
		// Arrange
		let registry = SchemaRegistry::new();
		registry.register(
			Schema::builder("holder")
				.field_def(
					reinhardt_records::FieldDef::new("inner", FieldType::record("holder"))
						.allow_scalar_override(),
				)
				.build()
				.unwrap(),
		);
		let config = config_with(Arc::new(registry));

		// Act
		let value = parse(&config, r#"{"inner":"ref:1"}"#, Target::Type("holder".to_string())).unwrap();

		// Assert
		let record = value.as_record().unwrap().read();
		assert_eq!(record.get("inner"), Some(&Value::text("ref:1")));
	}

	#[rstest]
	fn test_bind_into_existing_record() {
		// Arrange
		let schema = Schema::builder("point")
			.field("x", FieldType::I64)
			.field("y", FieldType::I64)
			.build_shared()
			.unwrap();
		let existing = Value::record(Record::new(schema).with("y", 9).unwrap());
		let config = ConverterConfig::default();

		// Act
		let value = parse(&config, r#"{"x":1}"#, Target::Into(existing.clone())).unwrap();

		// Assert
		assert_eq!(value, existing);
		let record = existing.as_record().unwrap().read();
		assert_eq!(record.get("x"), Some(&Value::int(1)));
		assert_eq!(record.get("y"), Some(&Value::int(9)));
	}

	#[rstest]
	fn test_sequence_target_is_appended() {
		let existing = Value::sequence(vec![Value::int(0)]);
		let config = ConverterConfig::default();

		parse(&config, "[1,2]", Target::Into(existing.clone())).unwrap();

		assert_eq!(existing.as_sequence().unwrap().read().len(), 3);
	}

	#[rstest]
	fn test_record_list_target() {
		let schema = Schema::builder("row")
			.field("v", FieldType::Bool)
			.build_shared()
			.unwrap();
		let list = Value::record_list(RecordList::new(schema));
		let config = ConverterConfig::default();

		parse(&config, r#"[{"v":true}]"#, Target::Into(list.clone())).unwrap();

		assert_eq!(list.as_record_list().unwrap().read().len(), 1);
	}

	#[rstest]
	#[case("7")]
	#[case("\"x\"")]
	#[case("")]
	fn test_top_level_must_be_aggregate(#[case] input: &str) {
		let config = ConverterConfig::default();

		let error = parse(&config, input, Target::Generic).unwrap_err();

		assert!(error.is_structural());
	}

	#[rstest]
	#[case(r#"{"a":1"#, "Unexpected end of input")]
	#[case(r#"{"a" 1}"#, "Expected ':'")]
	#[case(r#"{a:1}"#, "Expected '\"' to start a key")]
	#[case(r#"{"a":1 "b":2}"#, "Expected ',' or '}'")]
	#[case(r#"[1 2]"#, "Expected ',' or ']'")]
	#[case(r#"{"a":1}}"#, "Unexpected trailing content")]
	fn test_structural_errors(#[case] input: &str, #[case] message: &str) {
		let config = ConverterConfig::default();

		let error = parse(&config, input, Target::Generic).unwrap_err();

		assert!(error.is_structural(), "{error}");
		assert!(error.to_string().contains(message), "{error}");
	}

	#[rstest]
	fn test_unknown_field_is_skipped_when_lenient(registry: Arc<SchemaRegistry>) {
		// Arrange
		let config = ConverterConfig::builder()
			.binder(registry)
			.ignore_unknown(true)
			.build();
		let input = r#"{"id":1,"extra":{"deep":[1,{"x":"}"}]},"name":"Al"}"#;

		// Act
		let value = parse(&config, input, Target::Type("person".to_string())).unwrap();

		// Assert
		let record = value.as_record().unwrap().read();
		assert_eq!(record.get("name"), Some(&Value::text("Al")));
	}

	#[rstest]
	fn test_unknown_field_position(registry: Arc<SchemaRegistry>) {
		let config = config_with(registry);

		let error = parse(&config, r#"{"id":1,"extra":2}"#, Target::Type("person".to_string())).unwrap_err();

		assert!(error.is_unknown_field());
		assert_eq!(error.position(), Some(8));
	}

	#[rstest]
	fn test_bom_and_padding_are_stripped() {
		let config = ConverterConfig::builder().jsonp(true).build();

		let value = parse(&config, "\u{feff}callback({\"a\":1});", Target::Generic).unwrap();

		assert_eq!(value.as_keyed().unwrap().read()["a"], Value::int(1));
	}

	#[rstest]
	fn test_unpadded_input_kept_when_jsonp_enabled() {
		let config = ConverterConfig::builder().jsonp(true).build();

		let value = parse(&config, r#"{"a":"f(x)"}"#, Target::Generic).unwrap();

		assert_eq!(value.as_keyed().unwrap().read()["a"], Value::text("f(x)"));
	}

	#[rstest]
	fn test_unicode_escapes_in_keys_and_values() {
		let config = ConverterConfig::default();

		let value = parse(&config, r#"{"k\u00e9":"\u0022q\u0022"}"#, Target::Generic).unwrap();

		assert_eq!(value.as_keyed().unwrap().read()["ké"], Value::text("\"q\""));
	}

	#[rstest]
	fn test_unresolved_target_is_configuration_error() {
		let config = ConverterConfig::default();

		let error = parse(&config, "{}", Target::Type("nothing".to_string())).unwrap_err();

		assert!(matches!(error, ConversionError::Configuration(_)));
	}

	#[rstest]
	fn test_document_from_registered_name() {
		// Arrange
		let registry = SchemaRegistry::new();
		let line = Schema::builder("line")
			.field("sku", FieldType::Text)
			.build_shared()
			.unwrap();
		registry.register_template(
			"order",
			DocumentTemplate::new(Some("order".to_string())).list("lines", line),
		);
		let config = config_with(Arc::new(registry));

		// Act
		let value = parse(
			&config,
			r#"{"@name":"order","lines":[{"sku":"a"},{"sku":"b"}]}"#,
			Target::Document,
		)
		.unwrap();

		// Assert
		let document = value.as_document().unwrap().read();
		assert_eq!(document.name(), Some("order"));
		assert_eq!(document.list("lines").unwrap().read().len(), 2);
	}

	#[rstest]
	fn test_null_name_keeps_template_name() {
		// Arrange
		let registry = SchemaRegistry::new();
		let line = Schema::builder("line")
			.field("sku", FieldType::Text)
			.build_shared()
			.unwrap();
		registry.register_template(
			"order",
			DocumentTemplate::new(Some("order".to_string())).list("lines", line),
		);
		let config = ConverterConfig::builder()
			.binder(Arc::new(registry))
			.converter(
				FieldType::Text,
				crate::registry::converter_fn(|_| Ok(None), |_| Ok(Value::text("rewritten"))),
			)
			.build();

		// Act
		let value = parse(
			&config,
			r#"{"@name":"order","lines":[],"@name":null}"#,
			Target::Document,
		)
		.unwrap();

		// Assert
		let document = value.as_document().unwrap().read();
		assert_eq!(document.name(), Some("order"));
		assert!(document.list("lines").unwrap().read().is_empty());
	}

	#[rstest]
	fn test_document_without_shape_fails() {
		let config = ConverterConfig::default();

		let error = parse(&config, r#"{"header":{}}"#, Target::Document).unwrap_err();

		assert!(matches!(error, ConversionError::Configuration(_)));
	}
}
