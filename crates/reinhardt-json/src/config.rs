//! Converter configuration
//!
//! [`ConverterConfig`] is an immutable snapshot handed to every `serialize`
//! and `parse` call. It is assembled once through [`ConverterConfigBuilder`];
//! plain options can also come from a TOML file via [`ConverterSettings`].

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use reinhardt_records::{
	BeanFactories, BeanRef, DefaultIntrospector, FieldType, Introspector, SchemaBinder,
	SchemaRegistry, Value,
};
use serde::{Deserialize, Serialize};

use crate::coercion::{EditorRegistry, ScalarEditor};
use crate::error::{ConversionError, ConversionResult};
use crate::registry::{ConverterRegistry, CustomConverter};

/// Casing applied to emitted record and bean keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCase {
	/// Keys as declared
	#[default]
	Preserve,
	/// Lowercase keys
	Lower,
	/// Uppercase keys
	Upper,
}

impl KeyCase {
	/// Apply the casing to a key.
	///
	/// Only ASCII letters change case, matching the ASCII case-insensitive
	/// field resolution used when reading keys back.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_json::KeyCase;
	///
	/// assert_eq!(KeyCase::Upper.apply("userName"), "USERNAME");
	/// assert_eq!(KeyCase::Preserve.apply("userName"), "userName");
	/// ```
	pub fn apply<'a>(&self, key: &'a str) -> Cow<'a, str> {
		match self {
			KeyCase::Preserve => Cow::Borrowed(key),
			KeyCase::Lower => Cow::Owned(key.to_ascii_lowercase()),
			KeyCase::Upper => Cow::Owned(key.to_ascii_uppercase()),
		}
	}
}

/// Indentation settings for pretty printed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrettyPrint {
	/// Indent repeated once per nesting level
	pub indent: String,
	/// Line separator written after openings and between members
	pub line_separator: String,
}

impl Default for PrettyPrint {
	fn default() -> Self {
		Self {
			indent: "  ".to_string(),
			line_separator: "\n".to_string(),
		}
	}
}

impl PrettyPrint {
	/// Pretty printing with a custom indent and line separator.
	pub fn new(indent: impl Into<String>, line_separator: impl Into<String>) -> Self {
		Self {
			indent: indent.into(),
			line_separator: line_separator.into(),
		}
	}
}

/// Plain options loadable from TOML.
///
/// Unset options leave the builder's value untouched.
///
/// # Examples
///
/// ```
/// use reinhardt_json::{ConverterSettings, KeyCase};
///
/// let settings = ConverterSettings::from_toml_str(r#"
///     ignore_unknown = true
///     key_case = "lower"
///     disabled_types = ["object<app.Meta>"]
///
///     [pretty_print]
///     indent = "\t"
/// "#).unwrap();
///
/// assert_eq!(settings.ignore_unknown, Some(true));
/// assert_eq!(settings.key_case, Some(KeyCase::Lower));
/// assert_eq!(settings.pretty_print.unwrap().line_separator, "\n");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterSettings {
	/// Write null fields
	pub output_null: Option<bool>,
	/// Escape everything outside printable ASCII
	pub escape_unicode: Option<bool>,
	/// Discard unknown fields instead of failing
	pub ignore_unknown: Option<bool>,
	/// Strip a JSONP wrapper before parsing
	pub jsonp: Option<bool>,
	/// Casing of emitted keys
	pub key_case: Option<KeyCase>,
	/// Pretty printing
	pub pretty_print: Option<PrettyPrint>,
	/// Write `@schema` metadata for documents
	pub emit_schema_metadata: Option<bool>,
	/// Runtime types skipped in keyed maps and beans, in type syntax
	pub disabled_types: Vec<String>,
}

impl ConverterSettings {
	/// Parse settings from TOML text.
	pub fn from_toml_str(text: &str) -> ConversionResult<Self> {
		toml::from_str(text).map_err(|e| ConversionError::Configuration(e.to_string()))
	}
}

/// Immutable converter configuration.
#[derive(Clone)]
pub struct ConverterConfig {
	converters: ConverterRegistry,
	field_converters: HashMap<(String, String), Arc<dyn CustomConverter>>,
	editors: EditorRegistry,
	binder: Arc<dyn SchemaBinder>,
	introspector: Arc<dyn Introspector>,
	factories: BeanFactories,
	disabled_types: HashSet<FieldType>,
	output_null: bool,
	escape_unicode: bool,
	ignore_unknown: bool,
	jsonp: bool,
	key_case: KeyCase,
	pretty_print: Option<PrettyPrint>,
	emit_schema_metadata: bool,
}

impl Default for ConverterConfig {
	fn default() -> Self {
		ConverterConfigBuilder::default().build()
	}
}

impl ConverterConfig {
	/// Creates a builder for fluent configuration
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_json::ConverterConfig;
	///
	/// let config = ConverterConfig::builder()
	///     .ignore_unknown(true)
	///     .output_null(false)
	///     .build();
	///
	/// assert!(config.ignore_unknown());
	/// assert!(!config.output_null());
	/// assert!(!config.escape_unicode());
	/// ```
	pub fn builder() -> ConverterConfigBuilder {
		ConverterConfigBuilder::default()
	}

	/// Custom converters by declared type
	pub fn converters(&self) -> &ConverterRegistry {
		&self.converters
	}

	/// Converter registered for one field of one schema.
	pub fn field_converter(&self, schema: &str, field: &str) -> Option<&Arc<dyn CustomConverter>> {
		if self.field_converters.is_empty() {
			return None;
		}
		self.field_converters
			.get(&(schema.to_string(), field.to_string()))
	}

	/// Scalar editors
	pub fn editors(&self) -> &EditorRegistry {
		&self.editors
	}

	/// Schema binder
	pub fn binder(&self) -> &dyn SchemaBinder {
		self.binder.as_ref()
	}

	/// Bean introspector
	pub fn introspector(&self) -> &dyn Introspector {
		self.introspector.as_ref()
	}

	/// Bean factories
	pub fn factories(&self) -> &BeanFactories {
		&self.factories
	}

	/// Whether values of this runtime type are skipped.
	pub fn is_disabled(&self, runtime_type: &FieldType) -> bool {
		!self.disabled_types.is_empty() && self.disabled_types.contains(runtime_type)
	}

	/// Whether a non-null value is skipped because its runtime type is
	/// disabled.
	pub fn is_disabled_value(&self, value: &Value) -> bool {
		!self.disabled_types.is_empty()
			&& !value.is_null()
			&& self.disabled_types.contains(&value.runtime_type())
	}

	/// Whether null fields are written
	pub fn output_null(&self) -> bool {
		self.output_null
	}

	/// Whether non-ASCII text is `\u` escaped
	pub fn escape_unicode(&self) -> bool {
		self.escape_unicode
	}

	/// Whether unknown fields are discarded
	pub fn ignore_unknown(&self) -> bool {
		self.ignore_unknown
	}

	/// Whether JSONP wrappers are stripped
	pub fn jsonp(&self) -> bool {
		self.jsonp
	}

	/// Casing of emitted keys
	pub fn key_case(&self) -> KeyCase {
		self.key_case
	}

	/// Pretty printing, if enabled
	pub fn pretty_print(&self) -> Option<&PrettyPrint> {
		self.pretty_print.as_ref()
	}

	/// Whether documents carry `@schema` metadata
	pub fn emit_schema_metadata(&self) -> bool {
		self.emit_schema_metadata
	}
}

impl fmt::Debug for ConverterConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConverterConfig")
			.field("converters", &self.converters)
			.field("field_converters", &self.field_converters.keys().collect::<Vec<_>>())
			.field("editors", &self.editors)
			.field("factories", &self.factories)
			.field("disabled_types", &self.disabled_types)
			.field("output_null", &self.output_null)
			.field("escape_unicode", &self.escape_unicode)
			.field("ignore_unknown", &self.ignore_unknown)
			.field("jsonp", &self.jsonp)
			.field("key_case", &self.key_case)
			.field("pretty_print", &self.pretty_print)
			.field("emit_schema_metadata", &self.emit_schema_metadata)
			.finish_non_exhaustive()
	}
}

/// Builder for ConverterConfig
#[derive(Default)]
pub struct ConverterConfigBuilder {
	converters: ConverterRegistry,
	field_converters: HashMap<(String, String), Arc<dyn CustomConverter>>,
	editors: Option<EditorRegistry>,
	binder: Option<Arc<dyn SchemaBinder>>,
	introspector: Option<Arc<dyn Introspector>>,
	factories: BeanFactories,
	disabled_types: HashSet<FieldType>,
	output_null: Option<bool>,
	escape_unicode: Option<bool>,
	ignore_unknown: Option<bool>,
	jsonp: Option<bool>,
	key_case: Option<KeyCase>,
	pretty_print: Option<PrettyPrint>,
	emit_schema_metadata: Option<bool>,
}

impl ConverterConfigBuilder {
	/// Register a custom converter for a declared type
	pub fn converter(mut self, field_type: FieldType, converter: Arc<dyn CustomConverter>) -> Self {
		self.converters.register(field_type, converter);
		self
	}

	/// Register a custom converter for one field of one schema
	pub fn field_converter(
		mut self,
		schema: impl Into<String>,
		field: impl Into<String>,
		converter: Arc<dyn CustomConverter>,
	) -> Self {
		self.field_converters
			.insert((schema.into(), field.into()), converter);
		self
	}

	/// Replace the scalar editor registry
	pub fn editors(mut self, editors: EditorRegistry) -> Self {
		self.editors = Some(editors);
		self
	}

	/// Register a scalar editor on top of the defaults
	pub fn editor(mut self, field_type: FieldType, editor: Arc<dyn ScalarEditor>) -> Self {
		self.editors
			.get_or_insert_with(EditorRegistry::with_defaults)
			.register(field_type, editor);
		self
	}

	/// Set the schema binder
	pub fn binder(mut self, binder: Arc<dyn SchemaBinder>) -> Self {
		self.binder = Some(binder);
		self
	}

	/// Set the bean introspector
	pub fn introspector(mut self, introspector: Arc<dyn Introspector>) -> Self {
		self.introspector = Some(introspector);
		self
	}

	/// Replace the bean factories
	pub fn factories(mut self, factories: BeanFactories) -> Self {
		self.factories = factories;
		self
	}

	/// Register a bean factory
	pub fn bean_factory<F>(mut self, type_name: impl Into<String>, factory: F) -> Self
	where
		F: Fn() -> BeanRef + Send + Sync + 'static,
	{
		self.factories.register(type_name, factory);
		self
	}

	/// Skip values of this runtime type in keyed maps and beans
	pub fn disable_type(mut self, field_type: FieldType) -> Self {
		self.disabled_types.insert(field_type);
		self
	}

	/// Set whether null fields are written
	pub fn output_null(mut self, output: bool) -> Self {
		self.output_null = Some(output);
		self
	}

	/// Set whether non-ASCII text is `\u` escaped
	pub fn escape_unicode(mut self, escape: bool) -> Self {
		self.escape_unicode = Some(escape);
		self
	}

	/// Set whether unknown fields are discarded
	pub fn ignore_unknown(mut self, ignore: bool) -> Self {
		self.ignore_unknown = Some(ignore);
		self
	}

	/// Set whether JSONP wrappers are stripped
	pub fn jsonp(mut self, jsonp: bool) -> Self {
		self.jsonp = Some(jsonp);
		self
	}

	/// Set the casing of emitted keys
	pub fn key_case(mut self, key_case: KeyCase) -> Self {
		self.key_case = Some(key_case);
		self
	}

	/// Enable pretty printing
	pub fn pretty_print(mut self, pretty: PrettyPrint) -> Self {
		self.pretty_print = Some(pretty);
		self
	}

	/// Set whether documents carry `@schema` metadata
	pub fn emit_schema_metadata(mut self, emit: bool) -> Self {
		self.emit_schema_metadata = Some(emit);
		self
	}

	/// Apply loaded settings; options set there override earlier calls.
	///
	/// # Errors
	///
	/// Returns a configuration error when a disabled type is not valid type
	/// syntax.
	pub fn settings(mut self, settings: ConverterSettings) -> ConversionResult<Self> {
		for text in &settings.disabled_types {
			let field_type = text
				.parse::<FieldType>()
				.map_err(|e| ConversionError::Configuration(e.to_string()))?;
			self.disabled_types.insert(field_type);
		}
		self.output_null = settings.output_null.or(self.output_null);
		self.escape_unicode = settings.escape_unicode.or(self.escape_unicode);
		self.ignore_unknown = settings.ignore_unknown.or(self.ignore_unknown);
		self.jsonp = settings.jsonp.or(self.jsonp);
		self.key_case = settings.key_case.or(self.key_case);
		self.pretty_print = settings.pretty_print.or(self.pretty_print);
		self.emit_schema_metadata = settings.emit_schema_metadata.or(self.emit_schema_metadata);
		Ok(self)
	}

	/// Build the configuration
	pub fn build(self) -> ConverterConfig {
		ConverterConfig {
			converters: self.converters,
			field_converters: self.field_converters,
			editors: self.editors.unwrap_or_default(),
			binder: self
				.binder
				.unwrap_or_else(|| Arc::new(SchemaRegistry::new())),
			introspector: self
				.introspector
				.unwrap_or_else(|| Arc::new(DefaultIntrospector::new())),
			factories: self.factories,
			disabled_types: self.disabled_types,
			output_null: self.output_null.unwrap_or(true),
			escape_unicode: self.escape_unicode.unwrap_or(false),
			ignore_unknown: self.ignore_unknown.unwrap_or(false),
			jsonp: self.jsonp.unwrap_or(false),
			key_case: self.key_case.unwrap_or_default(),
			pretty_print: self.pretty_print,
			emit_schema_metadata: self.emit_schema_metadata.unwrap_or(false),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let config = ConverterConfig::default();

		assert!(config.output_null());
		assert!(!config.escape_unicode());
		assert!(!config.ignore_unknown());
		assert!(!config.jsonp());
		assert_eq!(config.key_case(), KeyCase::Preserve);
		assert!(config.pretty_print().is_none());
		assert!(!config.emit_schema_metadata());
		assert!(config.editors().get(&FieldType::I32).is_some());
	}

	#[rstest]
	fn test_settings_override_builder() {
		// Arrange
		let settings = ConverterSettings::from_toml_str(
			r#"
			output_null = false
			escape_unicode = true
			disabled_types = ["object<Meta>", "timestamp"]
			"#,
		)
		.unwrap();

		// Act
		let config = ConverterConfig::builder()
			.output_null(true)
			.jsonp(true)
			.settings(settings)
			.unwrap()
			.build();

		// Assert
		assert!(!config.output_null());
		assert!(config.escape_unicode());
		assert!(config.jsonp());
		assert!(config.is_disabled(&FieldType::object("Meta")));
		assert!(config.is_disabled(&FieldType::Timestamp));
		assert!(!config.is_disabled(&FieldType::Text));
	}

	#[rstest]
	#[case("unknown_option = true")]
	#[case("key_case = \"camel\"")]
	#[case("[pretty_print]\nwidth = 4")]
	fn test_invalid_settings_rejected(#[case] text: &str) {
		let result = ConverterSettings::from_toml_str(text);

		assert!(matches!(result, Err(ConversionError::Configuration(_))));
	}

	#[rstest]
	fn test_invalid_disabled_type_rejected() {
		let settings = ConverterSettings {
			disabled_types: vec!["list<".to_string()],
			..Default::default()
		};

		let result = ConverterConfig::builder().settings(settings);

		assert!(matches!(result, Err(ConversionError::Configuration(_))));
	}

	#[rstest]
	#[case(KeyCase::Lower, "OrderId", "orderid")]
	#[case(KeyCase::Upper, "OrderId", "ORDERID")]
	#[case(KeyCase::Preserve, "OrderId", "OrderId")]
	#[case(KeyCase::Upper, "été", "éTé")]
	#[case(KeyCase::Lower, "ÉtÉ", "ÉtÉ")]
	fn test_key_case(#[case] case: KeyCase, #[case] key: &str, #[case] expected: &str) {
		assert_eq!(case.apply(key), expected);
	}
}
