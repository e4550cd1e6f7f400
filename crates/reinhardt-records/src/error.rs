//! Error types for the record model.

use thiserror::Error;

/// Errors raised while building or mutating records, schemas and documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
	/// A declared type could not be parsed from its textual form.
	#[error("Invalid type declaration: {0}")]
	InvalidType(String),

	/// A schema declares the same field twice.
	#[error("Duplicate field '{field}' in schema '{schema}'")]
	DuplicateField {
		/// Schema being built.
		schema: String,
		/// Repeated field name.
		field: String,
	},

	/// The field is not part of the record's schema.
	#[error("Unknown field '{field}' for schema '{schema}'")]
	UnknownField {
		/// Schema of the record.
		schema: String,
		/// Requested field name.
		field: String,
	},

	/// No schema with this name is known to the binder.
	#[error("Schema not found: {0}")]
	SchemaNotFound(String),

	/// A record was added to a list of a different schema.
	#[error("Schema mismatch: expected '{expected}', found '{found}'")]
	SchemaMismatch {
		/// Schema of the list.
		expected: String,
		/// Schema of the offending record.
		found: String,
	},

	/// The document has no aggregate with this name.
	#[error("Unknown aggregate '{aggregate}' in document '{document}'")]
	UnknownAggregate {
		/// Document name, or `<anonymous>`.
		document: String,
		/// Requested aggregate.
		aggregate: String,
	},
}

/// Errors raised by bean introspection and binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BeanError {
	/// The bean has no attribute of this name.
	#[error("Attribute '{attribute}' not found on '{type_name}'")]
	NotFound {
		/// Bean type.
		type_name: String,
		/// Requested attribute.
		attribute: String,
	},

	/// The attribute exists but cannot be read.
	#[error("Attribute '{attribute}' of '{type_name}' is not readable")]
	NotReadable {
		/// Bean type.
		type_name: String,
		/// Requested attribute.
		attribute: String,
	},

	/// The attribute exists but cannot be written.
	#[error("Attribute '{attribute}' of '{type_name}' is not writable")]
	NotWritable {
		/// Bean type.
		type_name: String,
		/// Requested attribute.
		attribute: String,
	},

	/// The value handed to a setter has the wrong shape.
	#[error("Invalid value for '{attribute}' of '{type_name}': {message}")]
	InvalidValue {
		/// Bean type.
		type_name: String,
		/// Target attribute.
		attribute: String,
		/// What was wrong.
		message: String,
	},

	/// No zero-argument factory is registered for the type.
	#[error("No factory registered for bean type '{0}'")]
	NoFactory(String),
}

impl BeanError {
	/// Convenience constructor for [`BeanError::NotFound`].
	pub fn not_found(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
		BeanError::NotFound {
			type_name: type_name.into(),
			attribute: attribute.into(),
		}
	}

	/// Convenience constructor for [`BeanError::InvalidValue`].
	pub fn invalid_value(
		type_name: impl Into<String>,
		attribute: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		BeanError::InvalidValue {
			type_name: type_name.into(),
			attribute: attribute.into(),
			message: message.into(),
		}
	}
}

/// Result type alias for record operations.
pub type RecordResult<T> = Result<T, RecordError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_unknown_field_display() {
		let error = RecordError::UnknownField {
			schema: "order".to_string(),
			field: "extra".to_string(),
		};
		assert_eq!(error.to_string(), "Unknown field 'extra' for schema 'order'");
	}

	#[rstest]
	fn test_bean_error_display() {
		let error = BeanError::not_found("app.User", "email");
		assert_eq!(error.to_string(), "Attribute 'email' not found on 'app.User'");

		let error = BeanError::invalid_value("app.User", "age", "expected integer");
		assert_eq!(
			error.to_string(),
			"Invalid value for 'age' of 'app.User': expected integer"
		);
	}
}
