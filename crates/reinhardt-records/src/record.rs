//! Records, record lists and documents
//!
//! A [`Record`] holds one value per field of its [`Schema`], in schema order.
//! Field names and order never change after creation. A [`RecordList`] is an
//! ordered list of records sharing a schema, and a [`Document`] is a named
//! container of such aggregates.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{RecordError, RecordResult};
use crate::schema::{FieldDef, Schema};
use crate::value::{RecordListRef, RecordRef, Value};

/// A schema-bound row of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
	schema: Arc<Schema>,
	values: Vec<Value>,
}

impl Record {
	/// Create a record with every field set to [`Value::Null`].
	pub fn new(schema: Arc<Schema>) -> Self {
		let values = vec![Value::Null; schema.len()];
		Self { schema, values }
	}

	/// Schema of the record
	pub fn schema(&self) -> &Arc<Schema> {
		&self.schema
	}

	/// Value of a field by name.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.schema.position(name).map(|position| &self.values[position])
	}

	/// Value of a field by position.
	pub fn get_at(&self, position: usize) -> Option<&Value> {
		self.values.get(position)
	}

	/// Set a field by name.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_records::{FieldType, Record, Schema, Value};
	///
	/// let schema = Schema::builder("person")
	///     .field("id", FieldType::I32)
	///     .build_shared()
	///     .unwrap();
	/// let mut record = Record::new(schema);
	///
	/// record.set("id", Value::int(7)).unwrap();
	/// assert_eq!(record.get("id"), Some(&Value::int(7)));
	/// assert!(record.set("other", Value::Null).is_err());
	/// ```
	pub fn set(&mut self, name: &str, value: Value) -> RecordResult<()> {
		let position = self
			.schema
			.position(name)
			.ok_or_else(|| RecordError::UnknownField {
				schema: self.schema.name().to_string(),
				field: name.to_string(),
			})?;
		self.values[position] = value;
		Ok(())
	}

	/// Set a field by position.
	pub fn set_at(&mut self, position: usize, value: Value) -> RecordResult<()> {
		match self.values.get_mut(position) {
			Some(slot) => {
				*slot = value;
				Ok(())
			}
			None => Err(RecordError::UnknownField {
				schema: self.schema.name().to_string(),
				field: format!("#{}", position),
			}),
		}
	}

	/// Builder-style [`Record::set`].
	pub fn with(mut self, name: &str, value: impl Into<Value>) -> RecordResult<Self> {
		self.set(name, value.into())?;
		Ok(self)
	}

	/// Fields and their values in schema order.
	pub fn iter(&self) -> impl Iterator<Item = (&FieldDef, &Value)> {
		self.schema.fields().iter().zip(self.values.iter())
	}

	/// Values in schema order.
	pub fn values(&self) -> &[Value] {
		&self.values
	}
}

/// An ordered list of records sharing one schema.
#[derive(Debug, Clone)]
pub struct RecordList {
	schema: Arc<Schema>,
	records: Vec<RecordRef>,
}

impl RecordList {
	/// Create an empty list.
	pub fn new(schema: Arc<Schema>) -> Self {
		Self {
			schema,
			records: Vec::new(),
		}
	}

	/// Schema shared by every record of the list
	pub fn schema(&self) -> &Arc<Schema> {
		&self.schema
	}

	/// Append a fresh record and return its handle.
	pub fn new_record(&mut self) -> RecordRef {
		let record = Arc::new(RwLock::new(Record::new(Arc::clone(&self.schema))));
		self.records.push(Arc::clone(&record));
		record
	}

	/// Append an existing record.
	pub fn push(&mut self, record: RecordRef) -> RecordResult<()> {
		{
			let guard = record.read();
			if guard.schema().name() != self.schema.name() {
				return Err(RecordError::SchemaMismatch {
					expected: self.schema.name().to_string(),
					found: guard.schema().name().to_string(),
				});
			}
		}
		self.records.push(record);
		Ok(())
	}

	/// Append an owned record.
	pub fn push_record(&mut self, record: Record) -> RecordResult<()> {
		self.push(Arc::new(RwLock::new(record)))
	}

	/// Record handle at a position.
	pub fn get(&self, position: usize) -> Option<&RecordRef> {
		self.records.get(position)
	}

	/// Number of records
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Whether the list is empty
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Record handles in order
	pub fn iter(&self) -> std::slice::Iter<'_, RecordRef> {
		self.records.iter()
	}
}

impl PartialEq for RecordList {
	fn eq(&self, other: &Self) -> bool {
		self.schema == other.schema
			&& self.records.len() == other.records.len()
			&& self
				.records
				.iter()
				.zip(other.records.iter())
				.all(|(a, b)| Arc::ptr_eq(a, b) || *a.read_recursive() == *b.read_recursive())
	}
}

/// Kind of a document aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
	/// A single record
	Record,
	/// A record list
	List,
}

impl AggregateKind {
	/// Wire name of the kind
	pub fn as_str(&self) -> &'static str {
		match self {
			AggregateKind::Record => "record",
			AggregateKind::List => "list",
		}
	}
}

/// A named sub-aggregate of a [`Document`].
#[derive(Debug, Clone)]
pub enum Aggregate {
	/// A single record
	Record(RecordRef),
	/// A record list
	List(RecordListRef),
}

impl Aggregate {
	/// Kind of the aggregate
	pub fn kind(&self) -> AggregateKind {
		match self {
			Aggregate::Record(_) => AggregateKind::Record,
			Aggregate::List(_) => AggregateKind::List,
		}
	}

	/// Schema of the aggregate
	pub fn schema(&self) -> Arc<Schema> {
		match self {
			Aggregate::Record(record) => Arc::clone(record.read().schema()),
			Aggregate::List(list) => Arc::clone(list.read().schema()),
		}
	}

	/// The aggregate as a value sharing the same handle.
	pub fn to_value(&self) -> Value {
		match self {
			Aggregate::Record(record) => Value::Record(Arc::clone(record)),
			Aggregate::List(list) => Value::RecordList(Arc::clone(list)),
		}
	}
}

impl PartialEq for Aggregate {
	fn eq(&self, other: &Self) -> bool {
		self.to_value() == other.to_value()
	}
}

/// A container of named records and record lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
	name: Option<String>,
	aggregates: IndexMap<String, Aggregate>,
}

impl Document {
	/// Create an anonymous, empty document.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an empty document with a name.
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			aggregates: IndexMap::new(),
		}
	}

	/// Instantiate the aggregates declared by a template.
	pub fn from_template(template: &DocumentTemplate) -> Self {
		let mut document = Self {
			name: template.name.clone(),
			aggregates: IndexMap::new(),
		};
		for entry in &template.entries {
			let aggregate = match entry.kind {
				AggregateKind::Record => Aggregate::Record(Arc::new(RwLock::new(Record::new(
					Arc::clone(&entry.schema),
				)))),
				AggregateKind::List => Aggregate::List(Arc::new(RwLock::new(RecordList::new(
					Arc::clone(&entry.schema),
				)))),
			};
			document.aggregates.insert(entry.name.clone(), aggregate);
		}
		document
	}

	/// Document name
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Rename the document.
	pub fn set_name(&mut self, name: Option<String>) {
		self.name = name;
	}

	/// Insert or replace an aggregate.
	pub fn insert(&mut self, name: impl Into<String>, aggregate: Aggregate) {
		self.aggregates.insert(name.into(), aggregate);
	}

	/// Insert a record and return its handle.
	pub fn insert_record(&mut self, name: impl Into<String>, record: Record) -> RecordRef {
		let handle = Arc::new(RwLock::new(record));
		self.insert(name, Aggregate::Record(Arc::clone(&handle)));
		handle
	}

	/// Insert a record list and return its handle.
	pub fn insert_list(&mut self, name: impl Into<String>, list: RecordList) -> RecordListRef {
		let handle = Arc::new(RwLock::new(list));
		self.insert(name, Aggregate::List(Arc::clone(&handle)));
		handle
	}

	/// Aggregate by name.
	pub fn get(&self, name: &str) -> Option<&Aggregate> {
		self.aggregates.get(name)
	}

	/// Record aggregate by name.
	pub fn record(&self, name: &str) -> RecordResult<RecordRef> {
		match self.aggregates.get(name) {
			Some(Aggregate::Record(record)) => Ok(Arc::clone(record)),
			_ => Err(self.unknown_aggregate(name)),
		}
	}

	/// Record list aggregate by name.
	pub fn list(&self, name: &str) -> RecordResult<RecordListRef> {
		match self.aggregates.get(name) {
			Some(Aggregate::List(list)) => Ok(Arc::clone(list)),
			_ => Err(self.unknown_aggregate(name)),
		}
	}

	/// Aggregates in insertion order.
	pub fn aggregates(&self) -> impl Iterator<Item = (&str, &Aggregate)> {
		self.aggregates
			.iter()
			.map(|(name, aggregate)| (name.as_str(), aggregate))
	}

	/// Number of aggregates
	pub fn len(&self) -> usize {
		self.aggregates.len()
	}

	/// Whether the document has no aggregates
	pub fn is_empty(&self) -> bool {
		self.aggregates.is_empty()
	}

	/// Template describing the shape of this document.
	pub fn template(&self) -> DocumentTemplate {
		DocumentTemplate {
			name: self.name.clone(),
			entries: self
				.aggregates
				.iter()
				.map(|(name, aggregate)| TemplateEntry {
					name: name.clone(),
					kind: aggregate.kind(),
					schema: aggregate.schema(),
				})
				.collect(),
		}
	}

	fn unknown_aggregate(&self, name: &str) -> RecordError {
		RecordError::UnknownAggregate {
			document: self
				.name
				.clone()
				.unwrap_or_else(|| "<anonymous>".to_string()),
			aggregate: name.to_string(),
		}
	}
}

/// One declared aggregate of a [`DocumentTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
	/// Aggregate name
	pub name: String,
	/// Record or list
	pub kind: AggregateKind,
	/// Schema of the aggregate
	pub schema: Arc<Schema>,
}

/// The shape of a document: its name plus ordered aggregate declarations.
///
/// # Examples
///
/// ```
/// use reinhardt_records::{Document, DocumentTemplate, FieldType, Schema};
///
/// let header = Schema::builder("header")
///     .field("id", FieldType::I64)
///     .build_shared()
///     .unwrap();
/// let template = DocumentTemplate::new(Some("order".to_string())).record("header", header);
///
/// let document = Document::from_template(&template);
/// assert_eq!(document.name(), Some("order"));
/// assert!(document.record("header").is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTemplate {
	name: Option<String>,
	entries: Vec<TemplateEntry>,
}

impl DocumentTemplate {
	/// Create an empty template.
	pub fn new(name: Option<String>) -> Self {
		Self {
			name,
			entries: Vec::new(),
		}
	}

	/// Declare a record aggregate.
	pub fn record(self, name: impl Into<String>, schema: Arc<Schema>) -> Self {
		self.entry(name, AggregateKind::Record, schema)
	}

	/// Declare a record list aggregate.
	pub fn list(self, name: impl Into<String>, schema: Arc<Schema>) -> Self {
		self.entry(name, AggregateKind::List, schema)
	}

	/// Declare an aggregate of the given kind.
	pub fn entry(mut self, name: impl Into<String>, kind: AggregateKind, schema: Arc<Schema>) -> Self {
		self.entries.push(TemplateEntry {
			name: name.into(),
			kind,
			schema,
		});
		self
	}

	/// Template name
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Declared aggregates in order
	pub fn entries(&self) -> &[TemplateEntry] {
		&self.entries
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::FieldType;
	use rstest::{fixture, rstest};

	#[fixture]
	fn line_schema() -> Arc<Schema> {
		Schema::builder("line")
			.field("sku", FieldType::Text)
			.field("qty", FieldType::I32)
			.build_shared()
			.unwrap()
	}

	#[rstest]
	fn test_new_record_is_all_null(line_schema: Arc<Schema>) {
		let record = Record::new(line_schema);

		assert!(record.values().iter().all(Value::is_null));
		assert_eq!(record.iter().count(), 2);
	}

	#[rstest]
	fn test_record_list_rejects_foreign_schema(line_schema: Arc<Schema>) {
		// Arrange
		let other = Schema::builder("other").build_shared().unwrap();
		let mut list = RecordList::new(line_schema);

		// Act
		let result = list.push_record(Record::new(other));

		// Assert
		assert!(matches!(result, Err(RecordError::SchemaMismatch { .. })));
		assert!(list.is_empty());
	}

	#[rstest]
	fn test_new_record_appends(line_schema: Arc<Schema>) {
		let mut list = RecordList::new(line_schema);

		let handle = list.new_record();
		handle.write().set("qty", Value::int(3)).unwrap();

		assert_eq!(list.len(), 1);
		assert_eq!(list.get(0).unwrap().read().get("qty"), Some(&Value::int(3)));
	}

	#[rstest]
	fn test_document_template_round_trip(line_schema: Arc<Schema>) {
		// Arrange
		let mut document = Document::named("order");
		document.insert_list("lines", RecordList::new(line_schema));

		// Act
		let template = document.template();
		let rebuilt = Document::from_template(&template);

		// Assert
		assert_eq!(rebuilt, document);
		assert_eq!(template.entries()[0].kind, AggregateKind::List);
	}

	#[rstest]
	fn test_unknown_aggregate(line_schema: Arc<Schema>) {
		let mut document = Document::new();
		document.insert_record("line", Record::new(line_schema));

		assert!(document.record("line").is_ok());
		assert_eq!(
			document.list("line").unwrap_err(),
			RecordError::UnknownAggregate {
				document: "<anonymous>".to_string(),
				aggregate: "line".to_string(),
			}
		);
	}
}
