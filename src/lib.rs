//! # Reinhardt Interchange
//!
//! Schema-aware conversion between in-memory record graphs and JSON text.
//!
//! Values are either schema-bound records (single records, record lists and
//! documents made of both) or introspectable beans. Both directions honor the
//! declared types: serializing coerces nulls of primitive fields to their
//! defaults and truncates cycles, parsing coerces scalar text through
//! pluggable editors and binds members straight into their targets.
//!
//! ## Feature Flags
//!
//! - `json` (default) - JSON serializer and parser
//!
//! ## Quick Example
//!
//! ```
//! # #[cfg(feature = "json")]
//! # {
//! use reinhardt_interchange::prelude::*;
//!
//! let schema = Schema::builder("person")
//!     .field("id", FieldType::I32)
//!     .field("name", FieldType::Text)
//!     .build_shared()
//!     .unwrap();
//! let record = Record::new(schema).with("id", 7).unwrap().with("name", "Al").unwrap();
//!
//! let converter = JsonConverter::default();
//! let text = converter.serialize(&Value::record(record.clone()), None).unwrap();
//! assert_eq!(text, r#"{"id":7,"name":"Al"}"#);
//!
//! let target = Value::record(Record::new(record.schema().clone()));
//! converter.parse(&text, Target::Into(target.clone())).unwrap();
//! assert_eq!(*target.as_record().unwrap().read(), record);
//! # }
//! ```

// Re-export the object model
pub use reinhardt_records as records;
pub use reinhardt_records::{
	AccessPolicy, AttributeDescriptor, Bean, BeanError, BeanFactories, DefaultIntrospector,
	Document, DocumentTemplate, FieldDef, FieldType, Introspector, Number, Record, RecordError,
	RecordList, Schema, SchemaBinder, SchemaRegistry, Value,
};

// Re-export the JSON converter
#[cfg(feature = "json")]
pub use reinhardt_json as json;
#[cfg(feature = "json")]
pub use reinhardt_json::{
	ConversionError, ConversionResult, ConverterConfig, ConverterConfigBuilder, ConverterSettings,
	CustomConverter, JsonConverter, KeyCase, PrettyPrint, ScalarError, Target, converter_fn,
};

pub mod prelude {
	// Object model - always available
	pub use crate::{
		Bean, Document, FieldType, Record, RecordList, Schema, SchemaBinder, SchemaRegistry, Value,
	};

	// JSON feature
	#[cfg(feature = "json")]
	pub use crate::{ConversionError, ConverterConfig, JsonConverter, Target};
}
