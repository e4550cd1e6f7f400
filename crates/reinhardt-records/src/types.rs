//! Declared field types
//!
//! A [`FieldType`] is what a schema field, a bean attribute or a caller
//! declares about the value it expects. The declared type drives which
//! coercion rule the parser applies and which formatting branch the
//! serializer takes.
//!
//! Every type has a canonical textual form used by inline document metadata
//! and configuration files:
//!
//! | Text               | Type                                    |
//! |--------------------|-----------------------------------------|
//! | `bool`             | [`FieldType::Bool`]                     |
//! | `i8` .. `i64`      | fixed width integers                    |
//! | `f32`, `f64`       | floating point                          |
//! | `bigint`           | arbitrary precision integer             |
//! | `decimal`          | arbitrary precision decimal             |
//! | `string`           | [`FieldType::Text`]                     |
//! | `timestamp`        | [`FieldType::Timestamp`]                |
//! | `map`, `any`       | free-form keyed map / untyped           |
//! | `option<T>`        | nullable `T`                            |
//! | `list<T>`          | sequence of `T`                         |
//! | `record<name>`     | nested record of schema `name`          |
//! | `records<name>`    | nested record list of schema `name`     |
//! | `object<name>`     | introspectable bean of type `name`      |

use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
	/// Boolean
	Bool,
	/// 8-bit signed integer
	I8,
	/// 16-bit signed integer
	I16,
	/// 32-bit signed integer
	I32,
	/// 64-bit signed integer
	I64,
	/// 32-bit floating point
	F32,
	/// 64-bit floating point
	F64,
	/// Arbitrary precision integer
	BigInt,
	/// Arbitrary precision decimal
	Decimal,
	/// Unicode text
	Text,
	/// UTC timestamp
	Timestamp,
	/// Nullable wrapper; the inner type is never primitive
	Optional(Box<FieldType>),
	/// Ordered sequence with a declared element type
	List(Box<FieldType>),
	/// Free-form keyed map
	Map,
	/// Nested record of the named schema
	Record(String),
	/// Nested record list of the named schema
	RecordList(String),
	/// Introspectable bean of the named type
	Object(String),
	/// No declaration; the runtime value decides
	Any,
}

impl FieldType {
	/// Wrap a type as nullable.
	pub fn optional(inner: FieldType) -> Self {
		FieldType::Optional(Box::new(inner))
	}

	/// Declare a sequence of `element`.
	pub fn list(element: FieldType) -> Self {
		FieldType::List(Box::new(element))
	}

	/// Declare a nested record.
	pub fn record(schema: impl Into<String>) -> Self {
		FieldType::Record(schema.into())
	}

	/// Declare a nested record list.
	pub fn record_list(schema: impl Into<String>) -> Self {
		FieldType::RecordList(schema.into())
	}

	/// Declare an introspectable bean.
	pub fn object(type_name: impl Into<String>) -> Self {
		FieldType::Object(type_name.into())
	}

	/// Strip any `option<..>` wrappers.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_records::FieldType;
	///
	/// let ty = FieldType::optional(FieldType::I32);
	/// assert_eq!(ty.non_optional(), &FieldType::I32);
	/// ```
	pub fn non_optional(&self) -> &FieldType {
		match self {
			FieldType::Optional(inner) => inner.non_optional(),
			other => other,
		}
	}

	/// Whether the type is a fixed width integer.
	pub fn is_integer(&self) -> bool {
		matches!(
			self,
			FieldType::I8 | FieldType::I16 | FieldType::I32 | FieldType::I64
		)
	}

	/// Whether the type is a floating point type.
	pub fn is_float(&self) -> bool {
		matches!(self, FieldType::F32 | FieldType::F64)
	}

	/// Whether the type holds a number of any representation.
	pub fn is_numeric(&self) -> bool {
		self.is_integer()
			|| self.is_float()
			|| matches!(self, FieldType::BigInt | FieldType::Decimal)
	}

	/// Whether the type is a non-nullable primitive.
	///
	/// Primitive fields never carry `null` on the wire: a null value is
	/// written as `0`, `0.0` or `false` instead.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_records::FieldType;
	///
	/// assert!(FieldType::I32.is_primitive());
	/// assert!(FieldType::Bool.is_primitive());
	/// assert!(!FieldType::optional(FieldType::I32).is_primitive());
	/// assert!(!FieldType::Decimal.is_primitive());
	/// ```
	pub fn is_primitive(&self) -> bool {
		self.is_integer() || self.is_float() || matches!(self, FieldType::Bool)
	}

	/// Whether a scalar editor is needed to coerce text into this type.
	pub fn is_scalar(&self) -> bool {
		self.is_numeric() || matches!(self, FieldType::Bool | FieldType::Timestamp)
	}

	/// Element type of a `list<T>`.
	pub fn element_type(&self) -> Option<&FieldType> {
		match self.non_optional() {
			FieldType::List(element) => Some(element),
			_ => None,
		}
	}

	/// Schema name of a `record<..>` or `records<..>` declaration.
	pub fn schema_name(&self) -> Option<&str> {
		match self.non_optional() {
			FieldType::Record(name) | FieldType::RecordList(name) => Some(name),
			_ => None,
		}
	}
}

impl fmt::Display for FieldType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FieldType::Bool => f.write_str("bool"),
			FieldType::I8 => f.write_str("i8"),
			FieldType::I16 => f.write_str("i16"),
			FieldType::I32 => f.write_str("i32"),
			FieldType::I64 => f.write_str("i64"),
			FieldType::F32 => f.write_str("f32"),
			FieldType::F64 => f.write_str("f64"),
			FieldType::BigInt => f.write_str("bigint"),
			FieldType::Decimal => f.write_str("decimal"),
			FieldType::Text => f.write_str("string"),
			FieldType::Timestamp => f.write_str("timestamp"),
			FieldType::Optional(inner) => write!(f, "option<{}>", inner),
			FieldType::List(element) => write!(f, "list<{}>", element),
			FieldType::Map => f.write_str("map"),
			FieldType::Record(name) => write!(f, "record<{}>", name),
			FieldType::RecordList(name) => write!(f, "records<{}>", name),
			FieldType::Object(name) => write!(f, "object<{}>", name),
			FieldType::Any => f.write_str("any"),
		}
	}
}

impl FromStr for FieldType {
	type Err = RecordError;

	/// Parse the canonical textual form.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_records::FieldType;
	///
	/// let ty: FieldType = "list<option<i64>>".parse().unwrap();
	/// assert_eq!(ty, FieldType::list(FieldType::optional(FieldType::I64)));
	/// assert!("list<".parse::<FieldType>().is_err());
	/// ```
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		let simple = match s {
			"bool" | "boolean" => Some(FieldType::Bool),
			"i8" | "byte" => Some(FieldType::I8),
			"i16" | "short" => Some(FieldType::I16),
			"i32" | "int" => Some(FieldType::I32),
			"i64" | "long" => Some(FieldType::I64),
			"f32" | "float" => Some(FieldType::F32),
			"f64" | "double" => Some(FieldType::F64),
			"bigint" => Some(FieldType::BigInt),
			"decimal" => Some(FieldType::Decimal),
			"string" | "text" => Some(FieldType::Text),
			"timestamp" => Some(FieldType::Timestamp),
			"map" => Some(FieldType::Map),
			"any" => Some(FieldType::Any),
			_ => None,
		};
		if let Some(ty) = simple {
			return Ok(ty);
		}

		let (head, inner) = split_generic(s).ok_or_else(|| RecordError::InvalidType(s.to_string()))?;
		match head {
			"option" => Ok(FieldType::optional(inner.parse()?)),
			"list" => Ok(FieldType::list(inner.parse()?)),
			"record" if is_identifier(inner) => Ok(FieldType::record(inner)),
			"records" if is_identifier(inner) => Ok(FieldType::record_list(inner)),
			"object" if is_identifier(inner) => Ok(FieldType::object(inner)),
			_ => Err(RecordError::InvalidType(s.to_string())),
		}
	}
}

/// Split `head<inner>` into its parts.
fn split_generic(s: &str) -> Option<(&str, &str)> {
	let open = s.find('<')?;
	let inner = s.strip_suffix('>')?.get(open + 1..)?;
	Some((s[..open].trim(), inner.trim()))
}

fn is_identifier(name: &str) -> bool {
	!name.is_empty()
		&& name
			.chars()
			.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | ':'))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("bool", FieldType::Bool)]
	#[case("int", FieldType::I32)]
	#[case("i64", FieldType::I64)]
	#[case("double", FieldType::F64)]
	#[case("decimal", FieldType::Decimal)]
	#[case("string", FieldType::Text)]
	#[case("option<timestamp>", FieldType::optional(FieldType::Timestamp))]
	#[case("list<list<i8>>", FieldType::list(FieldType::list(FieldType::I8)))]
	#[case("record<order_header>", FieldType::record("order_header"))]
	#[case("records<order_line>", FieldType::record_list("order_line"))]
	#[case("object<app.User>", FieldType::object("app.User"))]
	fn test_parse_type(#[case] text: &str, #[case] expected: FieldType) {
		// Act
		let parsed: FieldType = text.parse().unwrap();

		// Assert
		assert_eq!(parsed, expected);
	}

	#[rstest]
	#[case("")]
	#[case("integer32")]
	#[case("list<>")]
	#[case("record<>")]
	#[case("record<a b>")]
	#[case("option<list<i32>")]
	fn test_parse_type_rejects_malformed(#[case] text: &str) {
		assert!(matches!(
			text.parse::<FieldType>(),
			Err(RecordError::InvalidType(_))
		));
	}

	#[rstest]
	fn test_display_round_trips() {
		let ty = FieldType::list(FieldType::optional(FieldType::record("address")));
		let text = ty.to_string();

		assert_eq!(text, "list<option<record<address>>>");
		assert_eq!(text.parse::<FieldType>().unwrap(), ty);
	}

	#[rstest]
	fn test_primitive_classification() {
		assert!(FieldType::F32.is_primitive());
		assert!(!FieldType::BigInt.is_primitive());
		assert!(!FieldType::Text.is_primitive());
		assert!(FieldType::BigInt.is_numeric());
		assert!(FieldType::Timestamp.is_scalar());
		assert!(!FieldType::Map.is_scalar());
	}

	#[rstest]
	fn test_element_and_schema_name() {
		let list = FieldType::optional(FieldType::list(FieldType::I32));
		assert_eq!(list.element_type(), Some(&FieldType::I32));
		assert_eq!(FieldType::record_list("line").schema_name(), Some("line"));
		assert_eq!(FieldType::Text.schema_name(), None);
	}
}
