//! Value classification
//!
//! Decides the structural [`Category`] of a value under an optional declared
//! type, applying custom converters and the null-to-default rule for
//! primitive declarations on the way.

use std::borrow::Cow;
use std::fmt;

use reinhardt_records::{
	BeanRef, DocumentRef, FieldType, KeyedRef, RecordListRef, RecordRef, SequenceRef, Value,
};

use crate::coercion::sentinel_value;
use crate::config::ConverterConfig;
use crate::error::{ConversionError, ConversionResult};
use crate::registry::CustomConverter;

/// Structural category driving both serialization and parsing branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
	/// `null`
	Null,
	/// `true` / `false`
	Boolean,
	/// Bare numeric token, or a quoted float sentinel
	Number,
	/// Quoted string
	Text,
	/// Array
	Sequence,
	/// Free-form object
	Keyed,
	/// Schema-bound object
	Record,
	/// Introspected object
	Opaque,
}

/// A value resolved to its category, carrying what the writer needs.
pub enum Classified<'v> {
	/// Literal null
	Null,
	/// Boolean token
	Boolean(bool),
	/// Numeric token; `quoted` is set for the float sentinels
	Number {
		/// Token text
		token: Cow<'v, str>,
		/// Whether the token is written as a string
		quoted: bool,
	},
	/// Unescaped text
	Text(Cow<'v, str>),
	/// Sequence handle
	Sequence(&'v SequenceRef),
	/// Record list, written as a sequence of records
	RecordList(&'v RecordListRef),
	/// Record handle
	Record(&'v RecordRef),
	/// Document, written as a record of aggregates
	Document(&'v DocumentRef),
	/// Keyed map handle
	Keyed(&'v KeyedRef),
	/// Bean handle
	Opaque(&'v BeanRef),
}

impl Classified<'_> {
	/// Structural category
	pub fn category(&self) -> Category {
		match self {
			Classified::Null => Category::Null,
			Classified::Boolean(_) => Category::Boolean,
			Classified::Number { .. } => Category::Number,
			Classified::Text(_) => Category::Text,
			Classified::Sequence(_) | Classified::RecordList(_) => Category::Sequence,
			Classified::Record(_) | Classified::Document(_) => Category::Record,
			Classified::Keyed(_) => Category::Keyed,
			Classified::Opaque(_) => Category::Opaque,
		}
	}
}

impl fmt::Debug for Classified<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Classified::Number { token, quoted } => f
				.debug_struct("Number")
				.field("token", token)
				.field("quoted", quoted)
				.finish(),
			Classified::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Classified::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
			Classified::Opaque(bean) => f.debug_tuple("Opaque").field(&bean.read().type_name()).finish(),
			other => write!(f, "{:?}", other.category()),
		}
	}
}

/// Whether converter output for this declaration is written as a bare token.
fn is_number_like(declared: &FieldType) -> bool {
	let declared = declared.non_optional();
	declared.is_numeric() || *declared == FieldType::Bool
}

/// Classify converter output text.
pub(crate) fn classify_converted(text: Option<String>, declared: &FieldType) -> Classified<'static> {
	match text {
		None => Classified::Null,
		Some(text) if is_number_like(declared) => {
			let quoted = sentinel_value(&text).is_some();
			Classified::Number {
				token: Cow::Owned(text),
				quoted,
			}
		}
		Some(text) => Classified::Text(Cow::Owned(text)),
	}
}

/// Run a converter, wrapping its failure.
pub(crate) fn invoke_converter(
	converter: &dyn CustomConverter,
	name: &str,
	value: &Value,
) -> ConversionResult<Option<String>> {
	tracing::trace!(converter = name, kind = value.kind_name(), "invoking custom converter");
	converter
		.to_text(value)
		.map_err(|e| ConversionError::ConverterInvocation {
			converter: name.to_string(),
			message: e.0,
		})
}

/// Classify a value.
///
/// Rules, in order: a registered converter for the declared (or runtime)
/// type; null, written as `0`, `0.0` or `false` when the declaration is a
/// non-optional primitive; booleans; numbers, with float sentinels quoted;
/// sequences and record lists; records and documents; keyed maps; text and
/// timestamps; beans.
///
/// # Examples
///
/// ```
/// use reinhardt_json::classify::{classify, Category};
/// use reinhardt_json::ConverterConfig;
/// use reinhardt_records::{FieldType, Value};
///
/// let config = ConverterConfig::default();
///
/// let null_int = classify(&config, Some(&FieldType::I32), &Value::Null).unwrap();
/// assert_eq!(null_int.category(), Category::Number);
///
/// let value = Value::float(f64::NAN);
/// let nan = classify(&config, None, &value).unwrap();
/// assert_eq!(nan.category(), Category::Number);
/// ```
pub fn classify<'v>(
	config: &ConverterConfig,
	declared: Option<&FieldType>,
	value: &'v Value,
) -> ConversionResult<Classified<'v>> {
	if !value.is_null()
		&& let Some((key, converter)) = config.converters().resolve(declared, value)
	{
		let text = invoke_converter(converter.as_ref(), &key.to_string(), value)?;
		return Ok(classify_converted(text, declared.unwrap_or(&key)));
	}

	Ok(match value {
		Value::Null => null_default(declared),
		Value::Bool(b) => Classified::Boolean(*b),
		Value::Number(n) => match n.sentinel() {
			Some(sentinel) => Classified::Number {
				token: Cow::Borrowed(sentinel),
				quoted: true,
			},
			None => Classified::Number {
				token: Cow::Owned(config.editors().format(value, declared)?),
				quoted: false,
			},
		},
		Value::Sequence(h) => Classified::Sequence(h),
		Value::RecordList(h) => Classified::RecordList(h),
		Value::Record(h) => Classified::Record(h),
		Value::Document(h) => Classified::Document(h),
		Value::Keyed(h) => Classified::Keyed(h),
		Value::Text(s) => Classified::Text(Cow::Borrowed(s)),
		Value::Timestamp(_) => Classified::Text(Cow::Owned(config.editors().format(value, declared)?)),
		Value::Opaque(h) => Classified::Opaque(h),
	})
}

fn null_default(declared: Option<&FieldType>) -> Classified<'static> {
	match declared {
		Some(ty) if ty.is_integer() => Classified::Number {
			token: Cow::Borrowed("0"),
			quoted: false,
		},
		Some(ty) if ty.is_float() => Classified::Number {
			token: Cow::Borrowed("0.0"),
			quoted: false,
		},
		Some(FieldType::Bool) => Classified::Boolean(false),
		_ => Classified::Null,
	}
}
