//! Property-based tests for escaping and scalar conversion

use proptest::prelude::*;
use reinhardt_json::coercion::EditorRegistry;
use reinhardt_json::escape::{decode_unicode_escapes, escape, unescape};
use reinhardt_json::{ConverterConfig, JsonConverter, Target};
use reinhardt_records::{FieldType, Record, Schema, SchemaRegistry, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Strings made only of characters that never need escaping.
fn plain_text() -> impl Strategy<Value = String> {
	"[ !#-.0-\\[\\]-~]{0,40}"
}

/// Registry with an `outer` schema covering primitives, options, lists and a
/// nested `inner` record.
fn registry() -> Arc<SchemaRegistry> {
	let registry = SchemaRegistry::new();
	registry.register(
		Schema::builder("inner")
			.field("label", FieldType::Text)
			.field("n", FieldType::I32)
			.build()
			.unwrap(),
	);
	registry.register(
		Schema::builder("outer")
			.field("id", FieldType::I32)
			.field("name", FieldType::Text)
			.field("ratio", FieldType::F64)
			.field("total", FieldType::I64)
			.field("limit", FieldType::optional(FieldType::I64))
			.field("ids", FieldType::list(FieldType::I32))
			.field("child", FieldType::optional(FieldType::record("inner")))
			.build()
			.unwrap(),
	);
	Arc::new(registry)
}

/// Scalar members of one generated `outer` record.
#[derive(Debug, Clone)]
struct Outer {
	id: i32,
	name: String,
	ratio: f64,
	limit: Option<i64>,
	ids: Vec<i32>,
	child: Option<(String, i32)>,
}

fn outer() -> impl Strategy<Value = Outer> {
	(
		any::<i32>(),
		any::<String>(),
		any::<f64>().prop_filter("finite", |f| f.is_finite()),
		prop::option::of(any::<i64>()),
		prop::collection::vec(any::<i32>(), 0..6),
		prop::option::of((any::<String>(), any::<i32>())),
	)
		.prop_map(|(id, name, ratio, limit, ids, child)| Outer {
			id,
			name,
			ratio,
			limit,
			ids,
			child,
		})
}

fn build(registry: &SchemaRegistry, outer: &Outer, total: Option<i64>) -> Value {
	use reinhardt_records::SchemaBinder;

	let child = match &outer.child {
		Some((label, n)) => Value::record(
			registry
				.create_nested_record("inner")
				.unwrap()
				.with("label", label.as_str())
				.unwrap()
				.with("n", *n)
				.unwrap(),
		),
		None => Value::Null,
	};
	let record: Record = registry
		.create_nested_record("outer")
		.unwrap()
		.with("id", outer.id)
		.unwrap()
		.with("name", outer.name.as_str())
		.unwrap()
		.with("ratio", outer.ratio)
		.unwrap()
		.with("total", total)
		.unwrap()
		.with("limit", outer.limit)
		.unwrap()
		.with("ids", Value::sequence(outer.ids.iter().map(|&n| Value::from(n)).collect()))
		.unwrap()
		.with("child", child)
		.unwrap();
	Value::record(record)
}

proptest! {
	#[test]
	fn prop_record_graph_round_trips(
		outer in outer(),
		total in prop::option::of(any::<i64>()),
		unicode in any::<bool>(),
	) {
		let registry = registry();
		let converter = JsonConverter::new(
			ConverterConfig::builder()
				.binder(registry.clone())
				.escape_unicode(unicode)
				.build(),
		);
		let value = build(&registry, &outer, total);

		let text = converter.serialize(&value, None).unwrap();
		let parsed = converter.parse(&text, Target::Type("outer".to_string())).unwrap();

		// A null non-optional primitive reads back as its default.
		let expected = build(&registry, &outer, Some(total.unwrap_or(0)));
		prop_assert_eq!(parsed, expected);
	}

	#[test]
	fn prop_unescape_reverses_escape(s in any::<String>(), unicode in any::<bool>()) {
		let escaped = escape(&s, unicode);
		let decoded = decode_unicode_escapes(&escaped).unwrap();
		prop_assert_eq!(unescape(&decoded), s.as_str());
	}

	#[test]
	fn prop_escape_borrows_plain_text(s in plain_text(), unicode in any::<bool>()) {
		let escaped = escape(&s, unicode);
		prop_assert!(matches!(escaped, Cow::Borrowed(_)));
		prop_assert_eq!(escaped, s.as_str());
	}

	#[test]
	fn prop_unicode_escaped_output_is_ascii(s in any::<String>()) {
		prop_assert!(escape(&s, true).is_ascii());
	}

	#[test]
	fn prop_i64_round_trips_through_editor(n in any::<i64>()) {
		let editors = EditorRegistry::with_defaults();
		let value = Value::int(n);

		let text = editors.format(&value, Some(&FieldType::I64)).unwrap();
		let parsed = editors.to_scalar(&text, &FieldType::I64).unwrap();

		prop_assert_eq!(parsed, value);
	}

	#[test]
	fn prop_finite_f64_round_trips_through_editor(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
		let editors = EditorRegistry::with_defaults();
		let value = Value::float(f);

		let text = editors.format(&value, Some(&FieldType::F64)).unwrap();
		let parsed = editors.to_scalar(&text, &FieldType::F64).unwrap();

		prop_assert_eq!(parsed.as_f64(), Some(f));
	}

	#[test]
	fn prop_serialized_text_is_well_formed(
		entries in prop::collection::vec(("[a-z]{1,8}", any::<String>(), any::<i32>()), 0..8),
		unicode in any::<bool>(),
	) {
		let converter = JsonConverter::new(ConverterConfig::builder().escape_unicode(unicode).build());
		let value = Value::sequence(
			entries
				.iter()
				.map(|(key, text, n)| Value::keyed([
					(key.clone(), Value::text(text.clone())),
					("n".to_string(), Value::from(*n)),
				]))
				.collect(),
		);

		let text = converter.serialize(&value, None).unwrap();
		let checked: serde_json::Value = serde_json::from_str(&text).unwrap();
		let parsed = converter.parse(&text, Target::Generic).unwrap();

		prop_assert_eq!(checked.as_array().map(Vec::len), Some(entries.len()));
		prop_assert_eq!(parsed, value);
	}
}
