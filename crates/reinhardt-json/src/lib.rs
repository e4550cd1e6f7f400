//! Schema-aware JSON conversion for Reinhardt records and beans.
//!
//! Converts between a [`Value`](reinhardt_records::Value) graph and JSON text
//! in both directions:
//!
//! - **Serializing** walks the graph, truncating any aggregate met again on
//!   its own path to `{}` or `[]`
//! - **Parsing** binds members as they are read, into generic maps,
//!   schema-bound records, documents or introspected beans
//! - **Coercion** turns scalar text into typed values through pluggable
//!   editors, and custom converters can take over any declared type
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use reinhardt_json::{ConverterConfig, JsonConverter, Target};
//! use reinhardt_records::{FieldType, Record, Schema, SchemaRegistry, Value};
//!
//! let registry = SchemaRegistry::new();
//! let person = registry.register(
//!     Schema::builder("person")
//!         .field("id", FieldType::I32)
//!         .field("name", FieldType::Text)
//!         .build()
//!         .unwrap(),
//! );
//! let converter = JsonConverter::new(
//!     ConverterConfig::builder().binder(Arc::new(registry)).build(),
//! );
//!
//! let record = Record::new(person).with("id", 7).unwrap().with("name", "Al").unwrap();
//! let text = converter.serialize(&Value::record(record), None).unwrap();
//! assert_eq!(text, r#"{"id":7,"name":"Al"}"#);
//!
//! let parsed = converter.parse(&text, Target::Type("person".to_string())).unwrap();
//! assert_eq!(parsed.as_record().unwrap().read().get("id"), Some(&Value::int(7)));
//! ```
//!
//! # Configuration
//!
//! Plain options can be loaded from TOML:
//!
//! ```
//! use reinhardt_json::{ConverterConfig, ConverterSettings};
//!
//! let settings = ConverterSettings::from_toml_str(
//!     r#"
//!     ignore_unknown = true
//!     key_case = "lower"
//!     disabled_types = ["timestamp"]
//!     "#,
//! )
//! .unwrap();
//!
//! let config = ConverterConfig::builder().settings(settings).unwrap().build();
//! assert!(config.ignore_unknown());
//! ```

#![warn(missing_docs)]

pub mod classify;
pub mod coercion;
pub mod config;
pub mod converter;
pub mod error;
pub mod escape;
pub mod metadata;
pub mod parser;
pub mod registry;
pub mod serializer;

pub use classify::{Category, Classified, classify};
pub use coercion::{EditorRegistry, ScalarEditor};
pub use config::{ConverterConfig, ConverterConfigBuilder, ConverterSettings, KeyCase, PrettyPrint};
pub use converter::JsonConverter;
pub use error::{ConversionError, ConversionResult, ScalarError};
pub use escape::{decode_unicode_escapes, escape, unescape};
pub use parser::{Target, parse};
pub use registry::{ConverterRegistry, CustomConverter, converter_fn};
pub use serializer::{SerializationContext, Serializer};
