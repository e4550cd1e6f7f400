//! Schema binding
//!
//! The [`SchemaBinder`] capability creates and navigates records by schema
//! name. [`SchemaRegistry`] is the in-memory implementation: schemas and
//! document templates are registered once at configuration time and looked up
//! by name afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{RecordError, RecordResult};
use crate::record::{DocumentTemplate, Record, RecordList};
use crate::schema::{FieldDef, Schema};

/// Creates records and resolves fields by schema.
pub trait SchemaBinder: Send + Sync {
	/// Schema by name.
	fn schema(&self, name: &str) -> Option<Arc<Schema>>;

	/// Document template by name.
	fn document_template(&self, name: &str) -> Option<DocumentTemplate>;

	/// Create an empty record of the named schema.
	fn create_nested_record(&self, schema_name: &str) -> RecordResult<Record> {
		self.schema(schema_name)
			.map(Record::new)
			.ok_or_else(|| RecordError::SchemaNotFound(schema_name.to_string()))
	}

	/// Create an empty record list of the named schema.
	fn create_nested_record_list(&self, schema_name: &str) -> RecordResult<RecordList> {
		self.schema(schema_name)
			.map(RecordList::new)
			.ok_or_else(|| RecordError::SchemaNotFound(schema_name.to_string()))
	}

	/// Field of a schema by wire name, exact match first.
	fn resolve_field<'s>(&self, schema: &'s Schema, name: &str) -> Option<(usize, &'s FieldDef)> {
		schema
			.resolve(name)
			.map(|position| (position, &schema.fields()[position]))
	}
}

/// Name-indexed store of schemas and document templates.
///
/// # Examples
///
/// ```
/// use reinhardt_records::{FieldType, Schema, SchemaBinder, SchemaRegistry};
///
/// let registry = SchemaRegistry::new();
/// registry.register(
///     Schema::builder("address")
///         .field("city", FieldType::Text)
///         .build()
///         .unwrap(),
/// );
///
/// let record = registry.create_nested_record("address").unwrap();
/// assert_eq!(record.schema().name(), "address");
/// assert!(registry.create_nested_record("missing").is_err());
/// ```
#[derive(Debug, Default)]
pub struct SchemaRegistry {
	schemas: RwLock<HashMap<String, Arc<Schema>>>,
	templates: RwLock<HashMap<String, DocumentTemplate>>,
}

impl SchemaRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a schema, replacing any schema of the same name.
	pub fn register(&self, schema: Schema) -> Arc<Schema> {
		let schema = Arc::new(schema);
		self.register_shared(Arc::clone(&schema));
		schema
	}

	/// Register an already shared schema.
	pub fn register_shared(&self, schema: Arc<Schema>) {
		tracing::debug!(schema = schema.name(), "registering schema");
		self.schemas
			.write()
			.insert(schema.name().to_string(), schema);
	}

	/// Register a document template under its name.
	///
	/// The schemas of its aggregates are registered as well.
	pub fn register_template(&self, name: impl Into<String>, template: DocumentTemplate) {
		for entry in template.entries() {
			self.register_shared(Arc::clone(&entry.schema));
		}
		self.templates.write().insert(name.into(), template);
	}

	/// Registered schema names
	pub fn schema_names(&self) -> Vec<String> {
		self.schemas.read().keys().cloned().collect()
	}
}

impl SchemaBinder for SchemaRegistry {
	fn schema(&self, name: &str) -> Option<Arc<Schema>> {
		self.schemas.read().get(name).cloned()
	}

	fn document_template(&self, name: &str) -> Option<DocumentTemplate> {
		self.templates.read().get(name).cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record::Document;
	use crate::types::FieldType;
	use rstest::rstest;

	#[rstest]
	fn test_register_template_registers_schemas() {
		// Arrange
		let registry = SchemaRegistry::new();
		let header = Schema::builder("header")
			.field("id", FieldType::I64)
			.build_shared()
			.unwrap();
		let template = DocumentTemplate::new(Some("order".to_string())).record("header", header);

		// Act
		registry.register_template("order", template);

		// Assert
		assert!(registry.schema("header").is_some());
		let document = Document::from_template(&registry.document_template("order").unwrap());
		assert_eq!(document.name(), Some("order"));
	}

	#[rstest]
	fn test_resolve_field() {
		let registry = SchemaRegistry::new();
		let schema = registry.register(
			Schema::builder("line")
				.field("sku", FieldType::Text)
				.field("qty", FieldType::I32)
				.build()
				.unwrap(),
		);

		let (position, field) = registry.resolve_field(&schema, "QTY").unwrap();

		assert_eq!(position, 1);
		assert_eq!(field.field_type(), &FieldType::I32);
		assert!(registry.resolve_field(&schema, "price").is_none());
	}

	#[rstest]
	fn test_create_nested_record_list() {
		let registry = SchemaRegistry::new();
		registry.register(Schema::builder("line").build().unwrap());

		assert!(registry.create_nested_record_list("line").unwrap().is_empty());
		assert_eq!(
			registry.create_nested_record_list("nope").unwrap_err(),
			RecordError::SchemaNotFound("nope".to_string())
		);
	}
}
