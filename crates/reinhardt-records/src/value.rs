//! Runtime values
//!
//! [`Value`] is the in-memory side of the interchange format. Scalars are
//! held inline; aggregates are shared handles (`Arc<RwLock<..>>`) so that a
//! graph may reference the same node from several places, including itself.
//! Identity of an aggregate is the address of its handle, see
//! [`Value::identity`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::bean::Bean;
use crate::record::{Document, Record, RecordList};
use crate::types::FieldType;

/// Shared ordered sequence.
pub type SequenceRef = Arc<RwLock<Vec<Value>>>;
/// Shared keyed map preserving insertion order.
pub type KeyedRef = Arc<RwLock<IndexMap<String, Value>>>;
/// Shared record.
pub type RecordRef = Arc<RwLock<Record>>;
/// Shared record list.
pub type RecordListRef = Arc<RwLock<RecordList>>;
/// Shared document.
pub type DocumentRef = Arc<RwLock<Document>>;
/// Shared introspectable bean.
pub type BeanRef = Arc<RwLock<dyn Bean>>;

/// Numeric value in one of four representations.
///
/// Equality is numeric across the exact representations, so `Int(7)`,
/// `BigInt(7)` and `Decimal(7.0)` are equal. Floats only equal floats.
#[derive(Debug, Clone)]
pub enum Number {
	/// Machine integer
	Int(i64),
	/// IEEE 754 double, including NaN and the infinities
	Float(f64),
	/// Arbitrary precision integer
	BigInt(BigInt),
	/// Arbitrary precision decimal
	Decimal(BigDecimal),
}

impl Number {
	/// Whether this is a NaN or infinite float.
	pub fn is_special(&self) -> bool {
		matches!(self, Number::Float(f) if !f.is_finite())
	}

	/// Sentinel text for NaN and the infinities.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_records::Number;
	///
	/// assert_eq!(Number::Float(f64::NAN).sentinel(), Some("NaN"));
	/// assert_eq!(Number::Float(f64::NEG_INFINITY).sentinel(), Some("-Infinity"));
	/// assert_eq!(Number::Float(1.5).sentinel(), None);
	/// ```
	pub fn sentinel(&self) -> Option<&'static str> {
		match self {
			Number::Float(f) if f.is_nan() => Some("NaN"),
			Number::Float(f) if *f == f64::INFINITY => Some("Infinity"),
			Number::Float(f) if *f == f64::NEG_INFINITY => Some("-Infinity"),
			_ => None,
		}
	}

	/// Lossless conversion to `i64` where possible.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Number::Int(i) => Some(*i),
			Number::Float(f) if f.fract() == 0.0 && f.is_finite() => f.to_i64(),
			Number::Float(_) => None,
			Number::BigInt(b) => b.to_i64(),
			Number::Decimal(d) if d.is_integer() => d.to_i64(),
			Number::Decimal(_) => None,
		}
	}

	/// Conversion to `f64`, possibly lossy.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Number::Int(i) => Some(*i as f64),
			Number::Float(f) => Some(*f),
			Number::BigInt(b) => b.to_f64(),
			Number::Decimal(d) => d.to_f64(),
		}
	}
}

impl Number {
	fn to_decimal(&self) -> Option<BigDecimal> {
		match self {
			Number::Int(i) => Some(BigDecimal::from(*i)),
			Number::BigInt(b) => Some(BigDecimal::from(b.clone())),
			Number::Decimal(d) => Some(d.clone()),
			Number::Float(_) => None,
		}
	}
}

impl PartialEq for Number {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Number::Int(a), Number::Int(b)) => a == b,
			(Number::Float(a), Number::Float(b)) => a == b,
			(Number::BigInt(a), Number::BigInt(b)) => a == b,
			(Number::Float(_), _) | (_, Number::Float(_)) => false,
			_ => self.to_decimal() == other.to_decimal(),
		}
	}
}

impl fmt::Display for Number {
	/// Canonical wire token; floats keep a fractional part so they read back
	/// as floats.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Number::Int(i) => write!(f, "{}", i),
			Number::Float(x) => match self.sentinel() {
				Some(sentinel) => f.write_str(sentinel),
				None => write!(f, "{:?}", x),
			},
			Number::BigInt(b) => write!(f, "{}", b),
			Number::Decimal(d) => write!(f, "{}", d),
		}
	}
}

/// A node of the value graph.
#[derive(Clone, Default)]
pub enum Value {
	/// Absent value
	#[default]
	Null,
	/// Boolean
	Bool(bool),
	/// Number
	Number(Number),
	/// Text
	Text(String),
	/// UTC timestamp
	Timestamp(DateTime<Utc>),
	/// Ordered sequence
	Sequence(SequenceRef),
	/// Keyed map
	Keyed(KeyedRef),
	/// Schema-bound record
	Record(RecordRef),
	/// List of records sharing one schema
	RecordList(RecordListRef),
	/// Named container of records and record lists
	Document(DocumentRef),
	/// Introspectable host object
	Opaque(BeanRef),
}

impl Value {
	/// Integer value.
	pub fn int(value: i64) -> Self {
		Value::Number(Number::Int(value))
	}

	/// Float value.
	pub fn float(value: f64) -> Self {
		Value::Number(Number::Float(value))
	}

	/// Text value.
	pub fn text(value: impl Into<String>) -> Self {
		Value::Text(value.into())
	}

	/// New shared sequence.
	pub fn sequence(items: Vec<Value>) -> Self {
		Value::Sequence(Arc::new(RwLock::new(items)))
	}

	/// New shared keyed map.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_records::Value;
	///
	/// let map = Value::keyed([("id", Value::int(7)), ("name", Value::text("Al"))]);
	/// assert_eq!(map.as_keyed().unwrap().read().len(), 2);
	/// ```
	pub fn keyed<K, I>(entries: I) -> Self
	where
		K: Into<String>,
		I: IntoIterator<Item = (K, Value)>,
	{
		let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
		Value::Keyed(Arc::new(RwLock::new(map)))
	}

	/// Wrap a record in a new shared handle.
	pub fn record(record: Record) -> Self {
		Value::Record(Arc::new(RwLock::new(record)))
	}

	/// Wrap a record list in a new shared handle.
	pub fn record_list(list: RecordList) -> Self {
		Value::RecordList(Arc::new(RwLock::new(list)))
	}

	/// Wrap a document in a new shared handle.
	pub fn document(document: Document) -> Self {
		Value::Document(Arc::new(RwLock::new(document)))
	}

	/// Wrap a bean in a new shared handle.
	pub fn bean<B: Bean + 'static>(bean: B) -> Self {
		let handle: BeanRef = Arc::new(RwLock::new(bean));
		Value::Opaque(handle)
	}

	/// Whether this is [`Value::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Identity of an aggregate node, `None` for scalars.
	///
	/// Two values share an identity exactly when they are handles to the same
	/// allocation.
	pub fn identity(&self) -> Option<usize> {
		match self {
			Value::Sequence(h) => Some(Arc::as_ptr(h) as *const () as usize),
			Value::Keyed(h) => Some(Arc::as_ptr(h) as *const () as usize),
			Value::Record(h) => Some(Arc::as_ptr(h) as *const () as usize),
			Value::RecordList(h) => Some(Arc::as_ptr(h) as *const () as usize),
			Value::Document(h) => Some(Arc::as_ptr(h) as *const () as usize),
			Value::Opaque(h) => Some(Arc::as_ptr(h) as *const () as usize),
			_ => None,
		}
	}

	/// The concrete type of the value, used when nothing was declared.
	pub fn runtime_type(&self) -> FieldType {
		match self {
			Value::Null | Value::Document(_) => FieldType::Any,
			Value::Bool(_) => FieldType::Bool,
			Value::Number(Number::Int(_)) => FieldType::I64,
			Value::Number(Number::Float(_)) => FieldType::F64,
			Value::Number(Number::BigInt(_)) => FieldType::BigInt,
			Value::Number(Number::Decimal(_)) => FieldType::Decimal,
			Value::Text(_) => FieldType::Text,
			Value::Timestamp(_) => FieldType::Timestamp,
			Value::Sequence(_) => FieldType::list(FieldType::Any),
			Value::Keyed(_) => FieldType::Map,
			Value::Record(r) => FieldType::record(r.read_recursive().schema().name()),
			Value::RecordList(l) => FieldType::record_list(l.read_recursive().schema().name()),
			Value::Opaque(b) => FieldType::object(b.read_recursive().type_name()),
		}
	}

	/// Short name of the variant, for messages.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "boolean",
			Value::Number(_) => "number",
			Value::Text(_) => "text",
			Value::Timestamp(_) => "timestamp",
			Value::Sequence(_) => "sequence",
			Value::Keyed(_) => "map",
			Value::Record(_) => "record",
			Value::RecordList(_) => "record list",
			Value::Document(_) => "document",
			Value::Opaque(_) => "object",
		}
	}

	/// Boolean content.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Number content.
	pub fn as_number(&self) -> Option<&Number> {
		match self {
			Value::Number(n) => Some(n),
			_ => None,
		}
	}

	/// Integer content, see [`Number::as_i64`].
	pub fn as_i64(&self) -> Option<i64> {
		self.as_number().and_then(Number::as_i64)
	}

	/// Float content, see [`Number::as_f64`].
	pub fn as_f64(&self) -> Option<f64> {
		self.as_number().and_then(Number::as_f64)
	}

	/// Text content.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Text(s) => Some(s),
			_ => None,
		}
	}

	/// Timestamp content.
	pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
		match self {
			Value::Timestamp(t) => Some(t),
			_ => None,
		}
	}

	/// Sequence handle.
	pub fn as_sequence(&self) -> Option<&SequenceRef> {
		match self {
			Value::Sequence(h) => Some(h),
			_ => None,
		}
	}

	/// Keyed map handle.
	pub fn as_keyed(&self) -> Option<&KeyedRef> {
		match self {
			Value::Keyed(h) => Some(h),
			_ => None,
		}
	}

	/// Record handle.
	pub fn as_record(&self) -> Option<&RecordRef> {
		match self {
			Value::Record(h) => Some(h),
			_ => None,
		}
	}

	/// Record list handle.
	pub fn as_record_list(&self) -> Option<&RecordListRef> {
		match self {
			Value::RecordList(h) => Some(h),
			_ => None,
		}
	}

	/// Document handle.
	pub fn as_document(&self) -> Option<&DocumentRef> {
		match self {
			Value::Document(h) => Some(h),
			_ => None,
		}
	}

	/// Bean handle.
	pub fn as_bean(&self) -> Option<&BeanRef> {
		match self {
			Value::Opaque(h) => Some(h),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	/// Structural equality; aggregates that are the same handle compare equal
	/// without being traversed. Beans compare by identity. A pair of handles
	/// met again while it is being compared counts as equal, so two distinct
	/// cyclic graphs of the same shape compare equal.
	fn eq(&self, other: &Self) -> bool {
		Comparison::default().values(self, other)
	}
}

/// Handle pairs already under comparison.
#[derive(Default)]
struct Comparison {
	pairs: HashSet<(usize, usize)>,
}

impl Comparison {
	fn values(&mut self, a: &Value, b: &Value) -> bool {
		match (a, b) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(x), Value::Bool(y)) => x == y,
			(Value::Number(x), Value::Number(y)) => x == y,
			(Value::Text(x), Value::Text(y)) => x == y,
			(Value::Timestamp(x), Value::Timestamp(y)) => x == y,
			(Value::Opaque(_), Value::Opaque(_)) => a.identity() == b.identity(),
			(Value::Sequence(x), Value::Sequence(y)) => self.nested(a, b, |cmp| {
				let (x, y) = (x.read_recursive(), y.read_recursive());
				x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| cmp.values(p, q))
			}),
			(Value::Keyed(x), Value::Keyed(y)) => self.nested(a, b, |cmp| {
				let (x, y) = (x.read_recursive(), y.read_recursive());
				x.len() == y.len()
					&& x
						.iter()
						.all(|(key, p)| y.get(key).is_some_and(|q| cmp.values(p, q)))
			}),
			(Value::Record(x), Value::Record(y)) => self.nested(a, b, |cmp| {
				let (x, y) = (x.read_recursive(), y.read_recursive());
				x.schema() == y.schema()
					&& x
						.values()
						.iter()
						.zip(y.values().iter())
						.all(|(p, q)| cmp.values(p, q))
			}),
			(Value::RecordList(x), Value::RecordList(y)) => self.nested(a, b, |cmp| {
				let (x, y) = (x.read_recursive(), y.read_recursive());
				x.schema() == y.schema()
					&& x.len() == y.len()
					&& x.iter().zip(y.iter()).all(|(p, q)| {
						cmp.values(&Value::Record(Arc::clone(p)), &Value::Record(Arc::clone(q)))
					})
			}),
			(Value::Document(x), Value::Document(y)) => self.nested(a, b, |cmp| {
				let (x, y) = (x.read_recursive(), y.read_recursive());
				x.name() == y.name()
					&& x.len() == y.len()
					&& x.aggregates().all(|(name, p)| {
						y.get(name)
							.is_some_and(|q| cmp.values(&p.to_value(), &q.to_value()))
					})
			}),
			_ => false,
		}
	}

	/// Compare two aggregates unless they are one handle or already being
	/// compared.
	fn nested(&mut self, a: &Value, b: &Value, compare: impl FnOnce(&mut Self) -> bool) -> bool {
		let (Some(x), Some(y)) = (a.identity(), b.identity()) else {
			return false;
		};
		if x == y || !self.pairs.insert((x, y)) {
			return true;
		}
		compare(self)
	}
}

/// Nesting beyond which `Debug` output is elided, so cyclic graphs print.
const DEBUG_DEPTH: usize = 12;

struct DebugValue<'a> {
	value: &'a Value,
	depth: usize,
}

impl DebugValue<'_> {
	fn child<'v>(&self, value: &'v Value) -> DebugValue<'v> {
		DebugValue {
			value,
			depth: self.depth + 1,
		}
	}
}

impl fmt::Debug for DebugValue<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.depth > DEBUG_DEPTH {
			return f.write_str("..");
		}
		match self.value {
			Value::Null => f.write_str("Null"),
			Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
			Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
			Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
			Value::Timestamp(t) => f.debug_tuple("Timestamp").field(t).finish(),
			Value::Sequence(items) => {
				let items = items.read_recursive();
				f.debug_list()
					.entries(items.iter().map(|v| self.child(v)))
					.finish()
			}
			Value::Keyed(map) => {
				let map = map.read_recursive();
				f.debug_map()
					.entries(map.iter().map(|(k, v)| (k, self.child(v))))
					.finish()
			}
			Value::Record(record) => {
				let record = record.read_recursive();
				let mut s = f.debug_struct(record.schema().name());
				for (def, value) in record.iter() {
					s.field(def.name(), &self.child(value));
				}
				s.finish()
			}
			Value::RecordList(list) => {
				let list = list.read_recursive();
				let records: Vec<Value> = list.iter().cloned().map(Value::Record).collect();
				f.debug_list()
					.entries(records.iter().map(|v| self.child(v)))
					.finish()
			}
			Value::Document(doc) => {
				let doc = doc.read_recursive();
				let aggregates: Vec<(String, Value)> = doc
					.aggregates()
					.map(|(name, aggregate)| (name.to_string(), aggregate.to_value()))
					.collect();
				f.debug_map()
					.entries(aggregates.iter().map(|(k, v)| (k, self.child(v))))
					.finish()
			}
			Value::Opaque(bean) => write!(f, "Opaque({})", bean.read_recursive().type_name()),
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		DebugValue {
			value: self,
			depth: 0,
		}
		.fmt(f)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::int(i64::from(value))
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::int(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Text(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Text(value)
	}
}

impl From<BigInt> for Value {
	fn from(value: BigInt) -> Self {
		Value::Number(Number::BigInt(value))
	}
}

impl From<BigDecimal> for Value {
	fn from(value: BigDecimal) -> Self {
		Value::Number(Number::Decimal(value))
	}
}

impl From<DateTime<Utc>> for Value {
	fn from(value: DateTime<Utc>) -> Self {
		Value::Timestamp(value)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::str::FromStr;

	#[rstest]
	#[case(Number::Int(42), "42")]
	#[case(Number::Int(-7), "-7")]
	#[case(Number::Float(1.0), "1.0")]
	#[case(Number::Float(0.25), "0.25")]
	#[case(Number::Float(f64::NAN), "NaN")]
	#[case(Number::Float(f64::INFINITY), "Infinity")]
	#[case(Number::BigInt(BigInt::from_str("123456789012345678901234567890").unwrap()), "123456789012345678901234567890")]
	#[case(Number::Decimal(BigDecimal::from_str("3.14").unwrap()), "3.14")]
	fn test_number_display(#[case] number: Number, #[case] expected: &str) {
		assert_eq!(number.to_string(), expected);
	}

	#[rstest]
	fn test_number_equality_across_representations() {
		assert_eq!(Number::Int(7), Number::BigInt(BigInt::from(7)));
		assert_eq!(
			Number::BigInt(BigInt::from(7)),
			Number::Decimal(BigDecimal::from_str("7.0").unwrap())
		);
		assert_ne!(Number::Int(7), Number::Float(7.0));
		assert_ne!(Number::Float(f64::NAN), Number::Float(f64::NAN));
	}

	#[rstest]
	fn test_number_conversions() {
		assert_eq!(Number::Float(3.0).as_i64(), Some(3));
		assert_eq!(Number::Float(3.5).as_i64(), None);
		assert_eq!(
			Number::Decimal(BigDecimal::from_str("12").unwrap()).as_i64(),
			Some(12)
		);
		assert_eq!(Number::Int(2).as_f64(), Some(2.0));
	}

	#[rstest]
	fn test_identity_distinguishes_handles() {
		// Arrange
		let a = Value::sequence(vec![Value::int(1)]);
		let b = Value::sequence(vec![Value::int(1)]);
		let a_again = a.clone();

		// Assert
		assert_eq!(a.identity(), a_again.identity());
		assert_ne!(a.identity(), b.identity());
		assert_eq!(a, b);
		assert_eq!(Value::int(1).identity(), None);
	}

	#[rstest]
	fn test_debug_terminates_on_cycle() {
		// Arrange
		let map = Value::keyed([("name", Value::text("loop"))]);
		let handle = map.as_keyed().unwrap().clone();
		handle.write().insert("self".to_string(), map.clone());

		// Act
		let rendered = format!("{:?}", map);

		// Assert
		assert!(rendered.contains("loop"));
		assert!(rendered.contains(".."));
	}

	#[rstest]
	fn test_equality_terminates_on_distinct_cycles() {
		// Arrange
		let cyclic = |label: &str| {
			let map = Value::keyed([("name", Value::text(label))]);
			let handle = map.as_keyed().unwrap().clone();
			handle
				.write()
				.insert("next".to_string(), Value::sequence(vec![map.clone()]));
			map
		};
		let a = cyclic("loop");
		let b = cyclic("loop");
		let c = cyclic("other");

		// Assert
		assert_ne!(a.identity(), b.identity());
		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	#[rstest]
	fn test_runtime_type() {
		assert_eq!(Value::int(1).runtime_type(), FieldType::I64);
		assert_eq!(Value::text("x").runtime_type(), FieldType::Text);
		assert_eq!(Value::keyed::<&str, _>([]).runtime_type(), FieldType::Map);
		assert_eq!(Value::Null.runtime_type(), FieldType::Any);
	}

	#[rstest]
	fn test_option_conversion() {
		assert_eq!(Value::from(None::<i64>), Value::Null);
		assert_eq!(Value::from(Some("x")), Value::text("x"));
	}
}
