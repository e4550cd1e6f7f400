//! Record schemas
//!
//! A [`Schema`] is the ordered field declaration shared by every record of
//! one kind. Schemas are immutable once built and are shared through `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RecordError, RecordResult};
use crate::types::FieldType;

/// A single declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
	name: String,
	field_type: FieldType,
	scalar_override: bool,
}

impl FieldDef {
	/// Create a new field definition.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			scalar_override: false,
		}
	}

	/// Allow a quoted scalar to be bound to this nested-record field.
	///
	/// Without the override, a string token where a nested record or record
	/// list is declared is a parse error.
	pub fn allow_scalar_override(mut self) -> Self {
		self.scalar_override = true;
		self
	}

	/// Field name
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Declared type
	pub fn field_type(&self) -> &FieldType {
		&self.field_type
	}

	/// Whether scalar override is permitted
	pub fn permits_scalar_override(&self) -> bool {
		self.scalar_override
	}
}

/// Ordered field declaration of one record kind.
///
/// # Examples
///
/// ```
/// use reinhardt_records::{FieldType, Schema};
///
/// let schema = Schema::builder("person")
///     .field("id", FieldType::I32)
///     .field("name", FieldType::Text)
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.position("name"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
	name: String,
	fields: Vec<FieldDef>,
	index: HashMap<String, usize>,
}

impl Schema {
	/// Start building a schema.
	pub fn builder(name: impl Into<String>) -> SchemaBuilder {
		SchemaBuilder {
			name: name.into(),
			fields: Vec::new(),
		}
	}

	/// Build a schema from field definitions.
	pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> RecordResult<Self> {
		let name = name.into();
		let mut index = HashMap::with_capacity(fields.len());
		for (position, field) in fields.iter().enumerate() {
			if index.insert(field.name.clone(), position).is_some() {
				return Err(RecordError::DuplicateField {
					schema: name,
					field: field.name.clone(),
				});
			}
		}
		Ok(Self {
			name,
			fields,
			index,
		})
	}

	/// Schema name
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Fields in declared order
	pub fn fields(&self) -> &[FieldDef] {
		&self.fields
	}

	/// Number of fields
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Whether the schema declares no fields
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Position of a field by exact name.
	pub fn position(&self, name: &str) -> Option<usize> {
		self.index.get(name).copied()
	}

	/// Position of a field by exact name, falling back to an ASCII
	/// case-insensitive match.
	pub fn resolve(&self, name: &str) -> Option<usize> {
		self.position(name).or_else(|| {
			self.fields
				.iter()
				.position(|field| field.name.eq_ignore_ascii_case(name))
		})
	}

	/// Field definition by exact name.
	pub fn field(&self, name: &str) -> Option<&FieldDef> {
		self.position(name).map(|position| &self.fields[position])
	}
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
	name: String,
	fields: Vec<FieldDef>,
}

impl SchemaBuilder {
	/// Append a field.
	pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
		self.fields.push(FieldDef::new(name, field_type));
		self
	}

	/// Append a prepared field definition.
	pub fn field_def(mut self, field: FieldDef) -> Self {
		self.fields.push(field);
		self
	}

	/// Finish the schema.
	pub fn build(self) -> RecordResult<Schema> {
		Schema::new(self.name, self.fields)
	}

	/// Finish the schema into a shared handle.
	pub fn build_shared(self) -> RecordResult<Arc<Schema>> {
		self.build().map(Arc::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_duplicate_field_rejected() {
		// Arrange
		let builder = Schema::builder("person")
			.field("id", FieldType::I32)
			.field("id", FieldType::Text);

		// Act
		let result = builder.build();

		// Assert
		assert_eq!(
			result,
			Err(RecordError::DuplicateField {
				schema: "person".to_string(),
				field: "id".to_string(),
			})
		);
	}

	#[rstest]
	#[case("name", Some(1))]
	#[case("NAME", Some(1))]
	#[case("Id", Some(0))]
	#[case("missing", None)]
	fn test_resolve_falls_back_to_case_insensitive(
		#[case] key: &str,
		#[case] expected: Option<usize>,
	) {
		let schema = Schema::builder("person")
			.field("id", FieldType::I32)
			.field("name", FieldType::Text)
			.build()
			.unwrap();

		assert_eq!(schema.resolve(key), expected);
	}

	#[rstest]
	fn test_scalar_override_flag() {
		let field = FieldDef::new("address", FieldType::record("address")).allow_scalar_override();

		assert!(field.permits_scalar_override());
		assert!(!FieldDef::new("id", FieldType::I32).permits_scalar_override());
	}
}
