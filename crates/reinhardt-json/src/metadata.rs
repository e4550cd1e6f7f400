//! Inline document schema metadata
//!
//! A document may carry its own shape under the `@schema` key:
//!
//! ```json
//! {
//!   "@schema": {
//!     "header": {"kind": "record", "schema": "order_header", "fields": {"id": "i64"}},
//!     "lines": {"kind": "list", "schema": "order_line", "fields": {"sku": "string"}},
//!     "address": {"kind": "schema", "fields": {"city": "string"}}
//!   },
//!   "header": {"id": 1},
//!   "lines": []
//! }
//! ```
//!
//! `record` and `list` entries declare aggregates; `schema` entries declare
//! nested schemas referenced from aggregate fields. An entry's schema name
//! defaults to its key.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use reinhardt_records::{
	AggregateKind, Document, DocumentTemplate, FieldDef, FieldType, Schema, SchemaBinder, Value,
};

use crate::error::{ConversionError, ConversionResult};

/// Key of the metadata member.
pub const SCHEMA_KEY: &str = "@schema";
/// Key of the document name member.
pub const NAME_KEY: &str = "@name";

const KIND: &str = "kind";
const SCHEMA: &str = "schema";
const FIELDS: &str = "fields";

/// Name of the schema a declared type nests, through option and list
/// wrappers.
fn nested_schema_name(field_type: &FieldType) -> Option<&str> {
	match field_type {
		FieldType::Optional(inner) | FieldType::List(inner) => nested_schema_name(inner),
		FieldType::Record(name) | FieldType::RecordList(name) => Some(name),
		_ => None,
	}
}

fn describe_fields(schema: &Schema) -> Value {
	Value::keyed(
		schema
			.fields()
			.iter()
			.map(|field| (field.name(), Value::text(field.field_type().to_string()))),
	)
}

/// Collect every schema reachable from the values of a graph.
fn scan_schemas(value: &Value, found: &mut HashMap<String, Arc<Schema>>, visited: &mut HashSet<usize>) {
	if let Some(identity) = value.identity()
		&& !visited.insert(identity)
	{
		return;
	}
	match value {
		Value::Record(record) => {
			let record = record.read();
			found
				.entry(record.schema().name().to_string())
				.or_insert_with(|| Arc::clone(record.schema()));
			for child in record.values() {
				scan_schemas(child, found, visited);
			}
		}
		Value::RecordList(list) => {
			let records: Vec<Value> = {
				let list = list.read();
				found
					.entry(list.schema().name().to_string())
					.or_insert_with(|| Arc::clone(list.schema()));
				list.iter().cloned().map(Value::Record).collect()
			};
			for record in &records {
				scan_schemas(record, found, visited);
			}
		}
		Value::Sequence(items) => {
			for item in items.read().iter() {
				scan_schemas(item, found, visited);
			}
		}
		_ => {}
	}
}

/// Build the `@schema` value describing a document.
///
/// Nested schemas are taken from the record values themselves first and
/// from the binder otherwise; names that resolve nowhere are omitted.
pub(crate) fn describe(document: &Document, binder: &dyn SchemaBinder) -> Value {
	let mut entries: IndexMap<String, Value> = IndexMap::new();
	let mut found = HashMap::new();
	let mut visited = HashSet::new();
	let mut seen = HashSet::new();
	let mut pending = Vec::new();

	for (name, aggregate) in document.aggregates() {
		let schema = aggregate.schema();
		scan_schemas(&aggregate.to_value(), &mut found, &mut visited);
		seen.insert(schema.name().to_string());
		pending.extend(
			schema
				.fields()
				.iter()
				.filter_map(|field| nested_schema_name(field.field_type()).map(str::to_string)),
		);
		entries.insert(
			name.to_string(),
			Value::keyed([
				(KIND, Value::text(aggregate.kind().as_str())),
				(SCHEMA, Value::text(schema.name())),
				(FIELDS, describe_fields(&schema)),
			]),
		);
	}

	let mut next = 0;
	while next < pending.len() {
		let name = pending[next].clone();
		next += 1;
		if !seen.insert(name.clone()) {
			continue;
		}
		let Some(schema) = found.get(&name).cloned().or_else(|| binder.schema(&name)) else {
			continue;
		};
		pending.extend(
			schema
				.fields()
				.iter()
				.filter_map(|field| nested_schema_name(field.field_type()).map(str::to_string)),
		);
		// An aggregate may already hold the schema's name as its entry key.
		let mut key = name.clone();
		while entries.contains_key(&key) {
			key.insert(0, '@');
		}
		entries.insert(
			key,
			Value::keyed([
				(KIND, Value::text(SCHEMA)),
				(SCHEMA, Value::text(name)),
				(FIELDS, describe_fields(&schema)),
			]),
		);
	}

	Value::keyed(entries)
}

/// Shape read from `@schema`.
#[derive(Debug, Clone, Default)]
pub(crate) struct InlineSchemas {
	/// Every schema declared, by name
	pub schemas: HashMap<String, Arc<Schema>>,
	/// Aggregates to instantiate, in declared order
	pub template: DocumentTemplate,
}

/// Interpret a parsed `@schema` value.
pub(crate) fn read(meta: &Value, position: usize) -> ConversionResult<InlineSchemas> {
	let invalid = |message: String| ConversionError::structural(message, position, SCHEMA_KEY);

	let entries = meta
		.as_keyed()
		.ok_or_else(|| invalid(format!("'{}' must be an object", SCHEMA_KEY)))?
		.read()
		.clone();

	let mut inline = InlineSchemas::default();
	let mut aggregates = Vec::new();
	for (entry_name, entry) in &entries {
		let entry = entry
			.as_keyed()
			.ok_or_else(|| invalid(format!("schema entry '{}' must be an object", entry_name)))?
			.read()
			.clone();
		let kind = entry.get(KIND).and_then(Value::as_str).unwrap_or(SCHEMA);
		let schema_name = entry
			.get(SCHEMA)
			.and_then(Value::as_str)
			.unwrap_or(entry_name)
			.to_string();

		let mut fields = Vec::new();
		if let Some(declared) = entry.get(FIELDS) {
			let declared = declared
				.as_keyed()
				.ok_or_else(|| invalid(format!("fields of '{}' must be an object", entry_name)))?
				.read()
				.clone();
			for (field, field_type) in &declared {
				let text = field_type
					.as_str()
					.ok_or_else(|| invalid(format!("type of '{}.{}' must be a string", entry_name, field)))?;
				let field_type = text
					.parse::<FieldType>()
					.map_err(|e| invalid(e.to_string()))?;
				fields.push(FieldDef::new(field.clone(), field_type));
			}
		}
		let schema = Arc::new(Schema::new(schema_name.clone(), fields)?);
		inline.schemas.insert(schema_name, Arc::clone(&schema));

		match kind {
			"record" => aggregates.push((entry_name.clone(), AggregateKind::Record, schema)),
			"list" => aggregates.push((entry_name.clone(), AggregateKind::List, schema)),
			SCHEMA => {}
			other => return Err(invalid(format!("unknown kind '{}' for '{}'", other, entry_name))),
		}
	}

	inline.template = aggregates.into_iter().fold(
		DocumentTemplate::new(None),
		|template, (name, kind, schema)| template.entry(name, kind, schema),
	);
	Ok(inline)
}

#[cfg(test)]
mod tests {
	use super::*;
	use reinhardt_records::{Record, RecordList, SchemaRegistry};
	use rstest::rstest;

	fn order_document() -> Document {
		let address = Schema::builder("address")
			.field("city", FieldType::Text)
			.build_shared()
			.unwrap();
		let header = Schema::builder("header")
			.field("id", FieldType::I64)
			.field("ship_to", FieldType::optional(FieldType::record("address")))
			.build_shared()
			.unwrap();
		let line = Schema::builder("line")
			.field("sku", FieldType::Text)
			.build_shared()
			.unwrap();

		let mut document = Document::named("order");
		let header_record = Record::new(header)
			.with("ship_to", Value::record(Record::new(address)))
			.unwrap();
		document.insert_record("header", header_record);
		document.insert_list("lines", RecordList::new(line));
		document
	}

	#[rstest]
	fn test_describe_then_read() {
		// Arrange
		let document = order_document();
		let binder = SchemaRegistry::new();

		// Act
		let meta = describe(&document, &binder);
		let inline = read(&meta, 0).unwrap();

		// Assert
		let entries: Vec<(&str, AggregateKind)> = inline
			.template
			.entries()
			.iter()
			.map(|entry| (entry.name.as_str(), entry.kind))
			.collect();
		assert_eq!(
			entries,
			vec![("header", AggregateKind::Record), ("lines", AggregateKind::List)]
		);
		assert_eq!(inline.schemas["address"].fields()[0].name(), "city");
		assert_eq!(
			inline.schemas["header"].fields()[1].field_type(),
			&FieldType::optional(FieldType::record("address"))
		);
	}

	#[rstest]
	fn test_nested_schema_from_binder() {
		// Arrange
		let binder = SchemaRegistry::new();
		binder.register(
			Schema::builder("tag")
				.field("label", FieldType::Text)
				.build()
				.unwrap(),
		);
		let holder = Schema::builder("holder")
			.field("tags", FieldType::record_list("tag"))
			.build_shared()
			.unwrap();
		let mut document = Document::new();
		document.insert_record("holder", Record::new(holder));

		// Act
		let meta = describe(&document, &binder);

		// Assert
		let entries = meta.as_keyed().unwrap().read();
		assert!(entries.contains_key("tag"));
	}

	#[rstest]
	fn test_nested_schema_named_like_aggregate() {
		// Arrange
		let other = Schema::builder("other_t")
			.field("note", FieldType::Text)
			.build_shared()
			.unwrap();
		let mut document = order_document();
		document.insert_record("address", Record::new(other));
		let binder = SchemaRegistry::new();

		// Act
		let meta = describe(&document, &binder);
		let inline = read(&meta, 0).unwrap();

		// Assert
		assert_eq!(inline.schemas["address"].fields()[0].name(), "city");
		assert_eq!(inline.schemas["other_t"].fields()[0].name(), "note");
		let address = inline
			.template
			.entries()
			.iter()
			.find(|entry| entry.name == "address")
			.unwrap();
		assert_eq!(address.schema.name(), "other_t");
	}

	#[rstest]
	#[case(Value::text("x"))]
	#[case(Value::keyed([("a", Value::keyed([("kind", Value::text("table"))]))]))]
	#[case(Value::keyed([("a", Value::keyed([("fields", Value::keyed([("f", Value::text("int32"))]))]))]))]
	fn test_read_rejects_malformed(#[case] meta: Value) {
		let error = read(&meta, 3).unwrap_err();

		assert!(error.is_structural());
		assert_eq!(error.position(), Some(3));
	}
}
