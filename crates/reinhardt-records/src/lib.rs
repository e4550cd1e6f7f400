//! Schema-bound records and introspectable objects for Reinhardt interchange.
//!
//! This crate provides the object model that the interchange converters read
//! from and write into:
//!
//! - **Declared types**: [`FieldType`] and its textual form (`list<i64>`,
//!   `record<address>`, ...)
//! - **Values**: [`Value`], a graph of scalars and shared aggregates that may
//!   reference itself
//! - **Records**: [`Schema`], [`Record`], [`RecordList`] and [`Document`]
//! - **Beans**: the [`Bean`] trait, an [`Introspector`] with per-type access
//!   policies, and [`BeanFactories`]
//! - **Binding**: the [`SchemaBinder`] capability and its in-memory
//!   [`SchemaRegistry`]
//!
//! # Quick Start
//!
//! ```
//! use reinhardt_records::{FieldType, Record, Schema, Value};
//!
//! let schema = Schema::builder("person")
//!     .field("id", FieldType::I32)
//!     .field("name", FieldType::Text)
//!     .build_shared()
//!     .unwrap();
//!
//! let record = Record::new(schema)
//!     .with("id", 7)
//!     .unwrap()
//!     .with("name", "Al")
//!     .unwrap();
//!
//! assert_eq!(record.get("name"), Some(&Value::text("Al")));
//! ```

#![warn(missing_docs)]

pub mod bean;
pub mod binder;
pub mod error;
pub mod record;
pub mod schema;
pub mod types;
pub mod value;

pub use bean::{
	AccessKind, AccessPolicy, AttributeDescriptor, Bean, BeanFactories, DefaultIntrospector,
	Introspector,
};
pub use binder::{SchemaBinder, SchemaRegistry};
pub use error::{BeanError, RecordError, RecordResult};
pub use record::{
	Aggregate, AggregateKind, Document, DocumentTemplate, Record, RecordList, TemplateEntry,
};
pub use schema::{FieldDef, Schema, SchemaBuilder};
pub use types::FieldType;
pub use value::{
	BeanRef, DocumentRef, KeyedRef, Number, RecordListRef, RecordRef, SequenceRef, Value,
};
