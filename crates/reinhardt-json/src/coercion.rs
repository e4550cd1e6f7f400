//! Primitive coercion
//!
//! Converts between tokens and typed scalar values. Declared boolean,
//! numeric and timestamp types are delegated to a pluggable
//! [`ScalarEditor`] looked up in an [`EditorRegistry`]; untyped tokens are
//! inferred.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use reinhardt_records::{FieldType, Number, Value};

use crate::error::{ConversionError, ConversionResult, ScalarError};

/// Sentinel tokens for the float special values.
pub const NAN: &str = "NaN";
/// Positive infinity sentinel
pub const INFINITY: &str = "Infinity";
/// Negative infinity sentinel
pub const NEG_INFINITY: &str = "-Infinity";

/// Float value of a sentinel token.
pub fn sentinel_value(text: &str) -> Option<f64> {
	match text {
		NAN => Some(f64::NAN),
		INFINITY => Some(f64::INFINITY),
		NEG_INFINITY => Some(f64::NEG_INFINITY),
		_ => None,
	}
}

/// Parses and formats the scalar values of one declared type.
pub trait ScalarEditor: Send + Sync {
	/// Convert a token.
	fn parse(&self, text: &str) -> Result<Value, ScalarError>;

	/// Format a value.
	fn format(&self, value: &Value) -> Result<String, ScalarError>;
}

/// Editor for `bool`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolEditor;

impl ScalarEditor for BoolEditor {
	fn parse(&self, text: &str) -> Result<Value, ScalarError> {
		if text.eq_ignore_ascii_case("true") {
			Ok(Value::Bool(true))
		} else if text.eq_ignore_ascii_case("false") {
			Ok(Value::Bool(false))
		} else {
			Err(ScalarError::new("expected true or false"))
		}
	}

	fn format(&self, value: &Value) -> Result<String, ScalarError> {
		value
			.as_bool()
			.map(|b| b.to_string())
			.ok_or_else(|| ScalarError::new(format!("expected boolean, found {}", value.kind_name())))
	}
}

/// Editor for the fixed width integers, checking the declared range.
#[derive(Debug, Clone, Copy)]
pub struct IntEditor {
	min: i64,
	max: i64,
}

impl IntEditor {
	/// Editor accepting `min..=max`.
	pub fn new(min: i64, max: i64) -> Self {
		Self { min, max }
	}

	fn check(&self, value: i64) -> Result<i64, ScalarError> {
		if (self.min..=self.max).contains(&value) {
			Ok(value)
		} else {
			Err(ScalarError::new(format!(
				"{} out of range {}..={}",
				value, self.min, self.max
			)))
		}
	}
}

impl ScalarEditor for IntEditor {
	fn parse(&self, text: &str) -> Result<Value, ScalarError> {
		let value = text
			.parse::<i64>()
			.map_err(|e| ScalarError::new(e.to_string()))?;
		self.check(value).map(Value::int)
	}

	fn format(&self, value: &Value) -> Result<String, ScalarError> {
		let value = value
			.as_i64()
			.ok_or_else(|| ScalarError::new(format!("expected integer, found {}", value.kind_name())))?;
		self.check(value).map(|v| v.to_string())
	}
}

/// Editor for `f32` and `f64`.
#[derive(Debug, Clone, Copy)]
pub struct FloatEditor {
	single: bool,
}

impl FloatEditor {
	/// Editor for `f64`.
	pub fn double() -> Self {
		Self { single: false }
	}

	/// Editor for `f32`, rejecting finite values beyond its range.
	pub fn single() -> Self {
		Self { single: true }
	}
}

/// Whether `text` has the shape of a numeric literal: an optional leading
/// minus, then digits with at most a fraction and an exponent.
fn is_number_literal(text: &str) -> bool {
	let digits = text.strip_prefix('-').unwrap_or(text);
	digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
		&& digits
			.bytes()
			.all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}

impl ScalarEditor for FloatEditor {
	fn parse(&self, text: &str) -> Result<Value, ScalarError> {
		if !is_number_literal(text) {
			return Err(ScalarError::new("not a numeric literal"));
		}
		let value = text
			.parse::<f64>()
			.map_err(|e| ScalarError::new(e.to_string()))?;
		if self.single && value.is_finite() && value.abs() > f64::from(f32::MAX) {
			return Err(ScalarError::new("out of range for f32"));
		}
		Ok(Value::float(value))
	}

	fn format(&self, value: &Value) -> Result<String, ScalarError> {
		value
			.as_f64()
			.map(|f| Number::Float(f).to_string())
			.ok_or_else(|| ScalarError::new(format!("expected number, found {}", value.kind_name())))
	}
}

/// Editor for arbitrary precision integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigIntEditor;

impl ScalarEditor for BigIntEditor {
	fn parse(&self, text: &str) -> Result<Value, ScalarError> {
		BigInt::from_str(text)
			.map(Value::from)
			.map_err(|e| ScalarError::new(e.to_string()))
	}

	fn format(&self, value: &Value) -> Result<String, ScalarError> {
		match value.as_number() {
			Some(number @ (Number::Int(_) | Number::BigInt(_))) => Ok(number.to_string()),
			_ => Err(ScalarError::new(format!("expected integer, found {}", value.kind_name()))),
		}
	}
}

/// Editor for arbitrary precision decimals.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalEditor;

impl ScalarEditor for DecimalEditor {
	fn parse(&self, text: &str) -> Result<Value, ScalarError> {
		BigDecimal::from_str(text)
			.map(Value::from)
			.map_err(|e| ScalarError::new(e.to_string()))
	}

	fn format(&self, value: &Value) -> Result<String, ScalarError> {
		value
			.as_number()
			.map(ToString::to_string)
			.ok_or_else(|| ScalarError::new(format!("expected number, found {}", value.kind_name())))
	}
}

/// Editor for timestamps: RFC 3339 by default, or a `strftime` pattern
/// interpreted as UTC.
#[derive(Debug, Clone, Default)]
pub struct TimestampEditor {
	pattern: Option<String>,
}

impl TimestampEditor {
	/// RFC 3339 editor.
	pub fn rfc3339() -> Self {
		Self::default()
	}

	/// Editor using a `strftime` pattern.
	pub fn with_pattern(pattern: impl Into<String>) -> Self {
		Self {
			pattern: Some(pattern.into()),
		}
	}
}

impl ScalarEditor for TimestampEditor {
	fn parse(&self, text: &str) -> Result<Value, ScalarError> {
		let parsed = match &self.pattern {
			Some(pattern) => NaiveDateTime::parse_from_str(text, pattern).map(|naive| naive.and_utc()),
			None => DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc)),
		};
		parsed
			.map(Value::Timestamp)
			.map_err(|e| ScalarError::new(e.to_string()))
	}

	fn format(&self, value: &Value) -> Result<String, ScalarError> {
		let timestamp = value
			.as_timestamp()
			.ok_or_else(|| ScalarError::new(format!("expected timestamp, found {}", value.kind_name())))?;
		Ok(match &self.pattern {
			Some(pattern) => timestamp.format(pattern).to_string(),
			None => timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
		})
	}
}

/// Scalar editors keyed by declared type.
#[derive(Clone)]
pub struct EditorRegistry {
	editors: HashMap<FieldType, Arc<dyn ScalarEditor>>,
}

impl Default for EditorRegistry {
	fn default() -> Self {
		Self::with_defaults()
	}
}

impl EditorRegistry {
	/// Registry without any editor.
	pub fn empty() -> Self {
		Self {
			editors: HashMap::new(),
		}
	}

	/// Registry with editors for every scalar type.
	pub fn with_defaults() -> Self {
		let mut registry = Self::empty();
		registry.register(FieldType::Bool, Arc::new(BoolEditor));
		registry.register(
			FieldType::I8,
			Arc::new(IntEditor::new(i8::MIN.into(), i8::MAX.into())),
		);
		registry.register(
			FieldType::I16,
			Arc::new(IntEditor::new(i16::MIN.into(), i16::MAX.into())),
		);
		registry.register(
			FieldType::I32,
			Arc::new(IntEditor::new(i32::MIN.into(), i32::MAX.into())),
		);
		registry.register(FieldType::I64, Arc::new(IntEditor::new(i64::MIN, i64::MAX)));
		registry.register(FieldType::F32, Arc::new(FloatEditor::single()));
		registry.register(FieldType::F64, Arc::new(FloatEditor::double()));
		registry.register(FieldType::BigInt, Arc::new(BigIntEditor));
		registry.register(FieldType::Decimal, Arc::new(DecimalEditor));
		registry.register(FieldType::Timestamp, Arc::new(TimestampEditor::rfc3339()));
		registry
	}

	/// Register an editor, replacing any previous one for the type.
	pub fn register(&mut self, field_type: FieldType, editor: Arc<dyn ScalarEditor>) {
		self.editors.insert(field_type, editor);
	}

	/// Editor for a type.
	pub fn get(&self, field_type: &FieldType) -> Option<&Arc<dyn ScalarEditor>> {
		self.editors.get(field_type)
	}

	fn require(&self, field_type: &FieldType) -> ConversionResult<&Arc<dyn ScalarEditor>> {
		self.get(field_type).ok_or_else(|| {
			ConversionError::Configuration(format!("No scalar editor registered for {}", field_type))
		})
	}

	/// Convert a token to a value of the declared type.
	///
	/// `option<T>` coerces as `T`. Text is taken verbatim. The sentinels
	/// `NaN`, `Infinity` and `-Infinity` become float special values for
	/// numeric and untyped declarations. Untyped tokens are inferred:
	/// booleans, then integers as [`Number::BigInt`], then anything with a
	/// point or exponent as [`Number::Decimal`].
	///
	/// # Errors
	///
	/// A scalar type without an editor is a configuration error; a token the
	/// editor rejects is a coercion error.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_json::coercion::EditorRegistry;
	/// use reinhardt_records::{FieldType, Value};
	///
	/// let editors = EditorRegistry::with_defaults();
	///
	/// assert_eq!(editors.to_scalar("7", &FieldType::I32).unwrap(), Value::int(7));
	/// assert!(editors.to_scalar("NaN", &FieldType::F64).unwrap().as_f64().unwrap().is_nan());
	/// assert_eq!(editors.to_scalar("NaN", &FieldType::Text).unwrap(), Value::text("NaN"));
	/// assert!(editors.to_scalar("300", &FieldType::I8).is_err());
	/// ```
	pub fn to_scalar(&self, text: &str, declared: &FieldType) -> ConversionResult<Value> {
		let declared = declared.non_optional();
		match declared {
			FieldType::Text => return Ok(Value::text(text)),
			FieldType::Any => return infer_scalar(text),
			_ => {}
		}
		if declared.is_numeric()
			&& let Some(special) = sentinel_value(text)
		{
			return Ok(Value::float(special));
		}
		if !declared.is_scalar() {
			return Err(ConversionError::coercion(
				text,
				declared,
				"a scalar cannot be bound to this type",
			));
		}
		self.require(declared)?
			.parse(text)
			.map_err(|e| ConversionError::coercion(text, declared, e.0))
	}

	/// Format a scalar as token text, without quoting or escaping.
	///
	/// Timestamps and values of a declared scalar type go through the
	/// editor; numbers, booleans and text are otherwise written as they are.
	pub fn format(&self, value: &Value, declared: Option<&FieldType>) -> ConversionResult<String> {
		let declared = declared.map(FieldType::non_optional);
		let editor_type = match (value, declared) {
			(Value::Timestamp(_), _) => Some(FieldType::Timestamp),
			(Value::Number(n), Some(ty)) if ty.is_numeric() && !n.is_special() => Some(ty.clone()),
			(Value::Bool(_), Some(FieldType::Bool)) => Some(FieldType::Bool),
			_ => None,
		};
		if let Some(editor_type) = editor_type {
			return self
				.require(&editor_type)?
				.format(value)
				.map_err(|e| ConversionError::coercion(describe(value), &editor_type, e.0));
		}
		match value {
			Value::Bool(b) => Ok(b.to_string()),
			Value::Number(n) => Ok(n.to_string()),
			Value::Text(s) => Ok(s.clone()),
			other => Err(ConversionError::coercion(
				describe(other),
				declared.unwrap_or(&FieldType::Any),
				"not a scalar value",
			)),
		}
	}
}

impl fmt::Debug for EditorRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let types: Vec<String> = self.editors.keys().map(ToString::to_string).collect();
		f.debug_struct("EditorRegistry")
			.field("types", &types)
			.finish()
	}
}

fn describe(value: &Value) -> String {
	match value {
		Value::Number(n) => n.to_string(),
		Value::Text(s) => s.clone(),
		Value::Bool(b) => b.to_string(),
		other => format!("<{}>", other.kind_name()),
	}
}

/// Infer the value of an untyped token.
fn infer_scalar(text: &str) -> ConversionResult<Value> {
	match text {
		"true" => return Ok(Value::Bool(true)),
		"false" => return Ok(Value::Bool(false)),
		_ => {}
	}
	if let Some(special) = sentinel_value(text) {
		return Ok(Value::float(special));
	}
	let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
	if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
		return BigInt::from_str(text)
			.map(Value::from)
			.map_err(|e| ConversionError::coercion(text, &FieldType::BigInt, e.to_string()));
	}
	if text.contains(['.', 'e', 'E']) {
		return BigDecimal::from_str(text)
			.map(Value::from)
			.map_err(|e| ConversionError::coercion(text, &FieldType::Decimal, e.to_string()));
	}
	Err(ConversionError::coercion(
		text,
		&FieldType::Any,
		"not a number or boolean literal",
	))
}
