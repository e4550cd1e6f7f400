//! Custom converters
//!
//! A [`CustomConverter`] replaces the built-in handling of one declared type
//! in both directions. Converters are looked up by [`FieldType`] in a
//! [`ConverterRegistry`]; the declared type is used when there is one,
//! otherwise the runtime type of the value.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use reinhardt_records::{FieldType, Value};

use crate::error::ScalarError;

/// Two-way text conversion for a declared type.
pub trait CustomConverter: Send + Sync {
	/// Format a value. `None` writes a null.
	fn to_text(&self, value: &Value) -> Result<Option<String>, ScalarError>;

	/// Convert a token read from the input.
	fn from_text(&self, text: &str) -> Result<Value, ScalarError>;
}

struct FnConverter<F, P> {
	format: F,
	parse: P,
}

impl<F, P> CustomConverter for FnConverter<F, P>
where
	F: Fn(&Value) -> Result<Option<String>, ScalarError> + Send + Sync,
	P: Fn(&str) -> Result<Value, ScalarError> + Send + Sync,
{
	fn to_text(&self, value: &Value) -> Result<Option<String>, ScalarError> {
		(self.format)(value)
	}

	fn from_text(&self, text: &str) -> Result<Value, ScalarError> {
		(self.parse)(text)
	}
}

/// Build a converter from a pair of closures.
///
/// # Examples
///
/// ```
/// use reinhardt_json::registry::{converter_fn, CustomConverter};
/// use reinhardt_records::Value;
///
/// let upper = converter_fn(
///     |value| Ok(value.as_str().map(str::to_uppercase)),
///     |text| Ok(Value::text(text.to_lowercase())),
/// );
///
/// assert_eq!(upper.to_text(&Value::text("ab")).unwrap(), Some("AB".to_string()));
/// assert_eq!(upper.from_text("AB").unwrap(), Value::text("ab"));
/// ```
pub fn converter_fn<F, P>(format: F, parse: P) -> Arc<dyn CustomConverter>
where
	F: Fn(&Value) -> Result<Option<String>, ScalarError> + Send + Sync + 'static,
	P: Fn(&str) -> Result<Value, ScalarError> + Send + Sync + 'static,
{
	Arc::new(FnConverter { format, parse })
}

/// Converter table keyed by declared type.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
	converters: HashMap<FieldType, Arc<dyn CustomConverter>>,
}

impl ConverterRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a converter, replacing any previous one for the type.
	pub fn register(&mut self, field_type: FieldType, converter: Arc<dyn CustomConverter>) {
		self.converters.insert(field_type, converter);
	}

	/// Converter registered for exactly this type.
	pub fn lookup(&self, field_type: &FieldType) -> Option<&Arc<dyn CustomConverter>> {
		self.converters.get(field_type)
	}

	/// Converter for a declared type, or for the value's runtime type when
	/// nothing is declared.
	///
	/// A declared `option<T>` falls back to the converter of `T`. The
	/// returned type is the key the converter was found under.
	pub fn resolve(
		&self,
		declared: Option<&FieldType>,
		value: &Value,
	) -> Option<(FieldType, Arc<dyn CustomConverter>)> {
		if self.converters.is_empty() {
			return None;
		}
		match declared {
			Some(declared) if *declared != FieldType::Any => self.resolve_declared(declared),
			_ => {
				let runtime = value.runtime_type();
				self.lookup(&runtime)
					.map(|converter| (runtime, Arc::clone(converter)))
			}
		}
	}

	/// Converter for a declared type, used while parsing.
	pub fn resolve_declared(&self, declared: &FieldType) -> Option<(FieldType, Arc<dyn CustomConverter>)> {
		self.lookup(declared)
			.map(|converter| (declared.clone(), Arc::clone(converter)))
			.or_else(|| {
				let inner = declared.non_optional();
				self.lookup(inner)
					.map(|converter| (inner.clone(), Arc::clone(converter)))
			})
	}

	/// Whether no converter is registered
	pub fn is_empty(&self) -> bool {
		self.converters.is_empty()
	}
}

impl fmt::Debug for ConverterRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let types: Vec<String> = self.converters.keys().map(ToString::to_string).collect();
		f.debug_struct("ConverterRegistry")
			.field("types", &types)
			.finish()
	}
}
