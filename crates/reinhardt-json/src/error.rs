//! Error types for JSON conversion.

use reinhardt_records::{BeanError, FieldType, RecordError};
use thiserror::Error;

/// The single error surfaced by a failed `serialize` or `parse` call.
///
/// Output already written to a sink before the failure is not rolled back.
#[derive(Debug, Error)]
pub enum ConversionError {
	/// Malformed delimiters, premature end of input, unquoted key or
	/// trailing content.
	#[error("{message} at position {position} near '{fragment}'")]
	Structural {
		/// What was expected or found
		message: String,
		/// Approximate byte offset into the decoded input
		position: usize,
		/// Input around the offset
		fragment: String,
	},

	/// A key that neither the schema nor the introspected type declares.
	#[error("Unknown field '{field}' for '{owner}' at position {position}")]
	UnknownField {
		/// Offending key
		field: String,
		/// Schema or bean type being bound
		owner: String,
		/// Byte offset of the key
		position: usize,
	},

	/// Text could not be converted to, or a value formatted as, a scalar.
	#[error("Cannot convert '{text}' to {target}: {message}")]
	Coercion {
		/// Offending text
		text: String,
		/// Declared target type
		target: String,
		/// Reason given by the editor
		message: String,
		/// Byte offset of the token, when parsing
		position: Option<usize>,
	},

	/// A custom converter rejected its input.
	#[error("Converter for '{converter}' failed: {message}")]
	ConverterInvocation {
		/// Declared type the converter is registered for
		converter: String,
		/// Reason given by the converter
		message: String,
	},

	/// Missing scalar editor, unresolvable target or invalid settings.
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// A `\u` escape without four hex digits, or an unpaired surrogate.
	#[error("Malformed unicode escape at position {position}: '{fragment}'")]
	MalformedUnicodeEscape {
		/// Byte offset of the backslash
		position: usize,
		/// The escape as written
		fragment: String,
	},

	/// Reading or writing a bean attribute failed.
	#[error("Introspection error: {0}")]
	Introspection(#[from] BeanError),

	/// A record operation failed.
	#[error("Record error: {0}")]
	Record(#[from] RecordError),

	/// The output sink failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl ConversionError {
	/// Build a [`ConversionError::Structural`].
	pub fn structural(message: impl Into<String>, position: usize, fragment: impl Into<String>) -> Self {
		ConversionError::Structural {
			message: message.into(),
			position,
			fragment: fragment.into(),
		}
	}

	/// Build a [`ConversionError::Coercion`] without position.
	pub fn coercion(text: impl Into<String>, target: &FieldType, message: impl Into<String>) -> Self {
		ConversionError::Coercion {
			text: text.into(),
			target: target.to_string(),
			message: message.into(),
			position: None,
		}
	}

	/// Attach a byte offset to a coercion error; other variants are returned
	/// unchanged.
	pub fn at(self, offset: usize) -> Self {
		match self {
			ConversionError::Coercion {
				text,
				target,
				message,
				position: None,
			} => ConversionError::Coercion {
				text,
				target,
				message,
				position: Some(offset),
			},
			other => other,
		}
	}

	/// Whether this is an unknown-field error.
	pub fn is_unknown_field(&self) -> bool {
		matches!(self, ConversionError::UnknownField { .. })
	}

	/// Whether this is a structural error.
	pub fn is_structural(&self) -> bool {
		matches!(self, ConversionError::Structural { .. })
	}

	/// Whether this is a coercion error.
	pub fn is_coercion(&self) -> bool {
		matches!(self, ConversionError::Coercion { .. })
	}

	/// Input offset the error refers to, if any.
	pub fn position(&self) -> Option<usize> {
		match self {
			ConversionError::Structural { position, .. }
			| ConversionError::UnknownField { position, .. }
			| ConversionError::MalformedUnicodeEscape { position, .. } => Some(*position),
			ConversionError::Coercion { position, .. } => *position,
			_ => None,
		}
	}
}

/// Failure reported by a scalar editor or a custom converter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ScalarError(pub String);

impl ScalarError {
	/// Create a failure with a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// Result type alias for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;
