//! Converter facade
//!
//! [`JsonConverter`] pairs a shared configuration snapshot with the
//! serializer and the parser, so that one value can be handed around and
//! used from several threads at once.

use std::io::Write;
use std::sync::Arc;

use reinhardt_records::{FieldType, Value};

use crate::config::ConverterConfig;
use crate::error::ConversionResult;
use crate::parser::{Target, parse};
use crate::serializer::Serializer;

/// Bidirectional converter over one configuration.
#[derive(Debug, Clone, Default)]
pub struct JsonConverter {
	config: Arc<ConverterConfig>,
}

impl JsonConverter {
	/// Create a converter that owns its configuration.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_json::{ConverterConfig, JsonConverter, Target};
	/// use reinhardt_records::Value;
	///
	/// let converter = JsonConverter::new(ConverterConfig::default());
	/// let value = Value::sequence(vec![Value::int(1), Value::text("a")]);
	///
	/// let text = converter.serialize(&value, None).unwrap();
	/// assert_eq!(text, r#"[1,"a"]"#);
	///
	/// let parsed = converter.parse(&text, Target::Generic).unwrap();
	/// assert_eq!(parsed.as_sequence().unwrap().read().len(), 2);
	/// ```
	pub fn new(config: ConverterConfig) -> Self {
		Self {
			config: Arc::new(config),
		}
	}

	/// Create a converter over a configuration shared with others.
	pub fn from_shared(config: Arc<ConverterConfig>) -> Self {
		Self { config }
	}

	/// The configuration snapshot
	pub fn config(&self) -> &Arc<ConverterConfig> {
		&self.config
	}

	/// Serialize a value under an optional declared type.
	pub fn serialize(&self, value: &Value, declared: Option<&FieldType>) -> ConversionResult<String> {
		Serializer::serialize(&self.config, value, declared)
	}

	/// Serialize a value into a sink.
	pub fn serialize_to<W: Write>(
		&self,
		value: &Value,
		declared: Option<&FieldType>,
		sink: W,
	) -> ConversionResult<()> {
		Serializer::serialize_to(&self.config, value, declared, sink)
	}

	/// Parse text into a value.
	pub fn parse(&self, text: &str, target: Target) -> ConversionResult<Value> {
		parse(&self.config, text, target)
	}
}

impl From<ConverterConfig> for JsonConverter {
	fn from(config: ConverterConfig) -> Self {
		Self::new(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::thread;

	#[rstest]
	fn test_shared_across_threads() {
		// Arrange
		let converter = JsonConverter::new(ConverterConfig::default());

		// Act
		let outputs: Vec<String> = thread::scope(|scope| {
			let handles: Vec<_> = (0..4)
				.map(|i| {
					let converter = converter.clone();
					scope.spawn(move || {
						let value = Value::keyed([("n", Value::int(i))]);
						let self_ref = value.clone();
						value
							.as_keyed()
							.unwrap()
							.write()
							.insert("self".to_string(), self_ref);
						converter.serialize(&value, None).unwrap()
					})
				})
				.collect();
			handles.into_iter().map(|h| h.join().unwrap()).collect()
		});

		// Assert
		for (i, output) in outputs.iter().enumerate() {
			assert_eq!(output, &format!(r#"{{"n":{},"self":{{}}}}"#, i));
		}
	}

	#[rstest]
	fn test_from_shared_uses_same_snapshot() {
		let config = Arc::new(ConverterConfig::builder().ignore_unknown(true).build());

		let converter = JsonConverter::from_shared(Arc::clone(&config));

		assert!(Arc::ptr_eq(converter.config(), &config));
	}
}
