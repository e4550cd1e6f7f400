//! Introspectable host objects
//!
//! A [`Bean`] is any host object that can enumerate its named, typed
//! attributes and read or write them by name. Beans are reached through an
//! [`Introspector`], which decides which attributes are visible according to
//! a per-type [`AccessPolicy`] and enabled/disabled name filters.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::BeanError;
use crate::types::FieldType;
use crate::value::{BeanRef, Value};

/// How an attribute is reached on the host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
	/// Direct field access
	Field,
	/// Getter/setter pair
	Accessor,
}

/// Which attribute kinds an introspector exposes for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessPolicy {
	/// Only direct fields
	FieldOnly,
	/// Only accessors
	AccessorOnly,
	/// Fields and accessors
	#[default]
	Both,
}

impl AccessPolicy {
	/// Whether the policy admits an attribute of the given kind.
	pub fn permits(&self, kind: AccessKind) -> bool {
		match self {
			AccessPolicy::FieldOnly => kind == AccessKind::Field,
			AccessPolicy::AccessorOnly => kind == AccessKind::Accessor,
			AccessPolicy::Both => true,
		}
	}
}

/// Metadata of one bean attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
	/// Attribute name
	pub name: String,
	/// Declared type
	pub field_type: FieldType,
	/// Whether the attribute can be read
	pub readable: bool,
	/// Whether the attribute can be written
	pub writable: bool,
	/// How the attribute is reached
	pub access: AccessKind,
}

impl AttributeDescriptor {
	/// A readable and writable direct field.
	pub fn field(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			readable: true,
			writable: true,
			access: AccessKind::Field,
		}
	}

	/// A readable and writable accessor pair.
	pub fn accessor(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			access: AccessKind::Accessor,
			..Self::field(name, field_type)
		}
	}

	/// Mark the attribute read-only
	pub fn read_only(mut self) -> Self {
		self.writable = false;
		self
	}

	/// Mark the attribute write-only
	pub fn write_only(mut self) -> Self {
		self.readable = false;
		self
	}
}

/// A host object with named, typed attributes.
///
/// # Examples
///
/// ```
/// use reinhardt_records::{AttributeDescriptor, Bean, BeanError, FieldType, Value};
///
/// #[derive(Default)]
/// struct Point {
///     x: i64,
/// }
///
/// impl Bean for Point {
///     fn type_name(&self) -> &str {
///         "Point"
///     }
///
///     fn attributes(&self) -> Vec<AttributeDescriptor> {
///         vec![AttributeDescriptor::field("x", FieldType::I64)]
///     }
///
///     fn read(&self, name: &str) -> Result<Value, BeanError> {
///         match name {
///             "x" => Ok(Value::int(self.x)),
///             _ => Err(BeanError::not_found("Point", name)),
///         }
///     }
///
///     fn write(&mut self, name: &str, value: Value) -> Result<(), BeanError> {
///         match (name, value.as_i64()) {
///             ("x", Some(x)) => {
///                 self.x = x;
///                 Ok(())
///             }
///             ("x", None) => Err(BeanError::invalid_value("Point", "x", "expected integer")),
///             _ => Err(BeanError::not_found("Point", name)),
///         }
///     }
/// }
///
/// let mut point = Point::default();
/// point.write("x", Value::int(3)).unwrap();
/// assert_eq!(point.read("x").unwrap(), Value::int(3));
/// ```
pub trait Bean: Send + Sync {
	/// Type identifier, used for factories, policies and name filters.
	fn type_name(&self) -> &str;

	/// All attributes in declaration order.
	fn attributes(&self) -> Vec<AttributeDescriptor>;

	/// Read an attribute.
	fn read(&self, name: &str) -> Result<Value, BeanError>;

	/// Write an attribute.
	fn write(&mut self, name: &str, value: Value) -> Result<(), BeanError>;
}

/// Enumerates the visible attributes of a bean.
pub trait Introspector: Send + Sync {
	/// Visible attributes in declaration order.
	fn attributes_of(&self, bean: &dyn Bean) -> Vec<AttributeDescriptor>;

	/// Visible attribute by name: exact match first, then ASCII
	/// case-insensitive.
	fn attribute(&self, bean: &dyn Bean, name: &str) -> Option<AttributeDescriptor> {
		let attributes = self.attributes_of(bean);
		let exact = attributes.iter().position(|a| a.name == name);
		let position =
			exact.or_else(|| attributes.iter().position(|a| a.name.eq_ignore_ascii_case(name)));
		position.map(|p| attributes[p].clone())
	}
}

/// Policy and name-filter driven [`Introspector`].
#[derive(Debug, Clone, Default)]
pub struct DefaultIntrospector {
	default_policy: AccessPolicy,
	policies: HashMap<String, AccessPolicy>,
	enabled: HashMap<String, HashSet<String>>,
	disabled: HashMap<String, HashSet<String>>,
}

impl DefaultIntrospector {
	/// Introspector exposing every attribute.
	pub fn new() -> Self {
		Self::default()
	}

	/// Policy for types without an explicit one.
	pub fn with_default_policy(mut self, policy: AccessPolicy) -> Self {
		self.default_policy = policy;
		self
	}

	/// Policy for one type.
	pub fn with_policy(mut self, type_name: impl Into<String>, policy: AccessPolicy) -> Self {
		self.policies.insert(type_name.into(), policy);
		self
	}

	/// Restrict a type to the listed attribute names.
	pub fn enable<I, S>(mut self, type_name: impl Into<String>, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.enabled
			.entry(type_name.into())
			.or_default()
			.extend(names.into_iter().map(Into::into));
		self
	}

	/// Hide the listed attribute names of a type.
	pub fn disable<I, S>(mut self, type_name: impl Into<String>, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.disabled
			.entry(type_name.into())
			.or_default()
			.extend(names.into_iter().map(Into::into));
		self
	}

	/// Effective policy for a type.
	pub fn policy_for(&self, type_name: &str) -> AccessPolicy {
		self.policies
			.get(type_name)
			.copied()
			.unwrap_or(self.default_policy)
	}

	fn is_visible(&self, type_name: &str, attribute: &AttributeDescriptor) -> bool {
		if !self.policy_for(type_name).permits(attribute.access) {
			return false;
		}
		if let Some(enabled) = self.enabled.get(type_name)
			&& !enabled.contains(&attribute.name)
		{
			return false;
		}
		!self
			.disabled
			.get(type_name)
			.is_some_and(|disabled| disabled.contains(&attribute.name))
	}
}

impl Introspector for DefaultIntrospector {
	fn attributes_of(&self, bean: &dyn Bean) -> Vec<AttributeDescriptor> {
		let type_name = bean.type_name();
		bean.attributes()
			.into_iter()
			.filter(|attribute| self.is_visible(type_name, attribute))
			.collect()
	}
}

type BeanFactory = Arc<dyn Fn() -> BeanRef + Send + Sync>;

/// Zero-argument constructors for bean types, keyed by type name.
#[derive(Clone, Default)]
pub struct BeanFactories {
	factories: HashMap<String, BeanFactory>,
}

impl BeanFactories {
	/// Empty factory table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a factory closure.
	pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
	where
		F: Fn() -> BeanRef + Send + Sync + 'static,
	{
		self.factories.insert(type_name.into(), Arc::new(factory));
	}

	/// Register `B::default` as the factory of a type.
	pub fn register_default<B>(&mut self, type_name: impl Into<String>)
	where
		B: Bean + Default + 'static,
	{
		self.register(type_name, || {
			let bean: BeanRef = Arc::new(RwLock::new(B::default()));
			bean
		});
	}

	/// Whether a factory exists for the type.
	pub fn contains(&self, type_name: &str) -> bool {
		self.factories.contains_key(type_name)
	}

	/// Instantiate a bean.
	pub fn create(&self, type_name: &str) -> Result<BeanRef, BeanError> {
		self.factories
			.get(type_name)
			.map(|factory| factory())
			.ok_or_else(|| BeanError::NoFactory(type_name.to_string()))
	}
}

impl fmt::Debug for BeanFactories {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BeanFactories")
			.field("types", &self.factories.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[derive(Default)]
	struct Account {
		id: i64,
		secret: String,
	}

	impl Bean for Account {
		fn type_name(&self) -> &str {
			"Account"
		}

		fn attributes(&self) -> Vec<AttributeDescriptor> {
			vec![
				AttributeDescriptor::field("id", FieldType::I64),
				AttributeDescriptor::accessor("secret", FieldType::Text),
				AttributeDescriptor::accessor("display", FieldType::Text).read_only(),
			]
		}

		fn read(&self, name: &str) -> Result<Value, BeanError> {
			match name {
				"id" => Ok(Value::int(self.id)),
				"secret" => Ok(Value::text(self.secret.clone())),
				"display" => Ok(Value::text(format!("#{}", self.id))),
				_ => Err(BeanError::not_found("Account", name)),
			}
		}

		fn write(&mut self, name: &str, value: Value) -> Result<(), BeanError> {
			match name {
				"id" => {
					self.id = value
						.as_i64()
						.ok_or_else(|| BeanError::invalid_value("Account", name, "expected integer"))?;
					Ok(())
				}
				"secret" => {
					self.secret = value.as_str().unwrap_or_default().to_string();
					Ok(())
				}
				_ => Err(BeanError::not_found("Account", name)),
			}
		}
	}

	fn names(attributes: Vec<AttributeDescriptor>) -> Vec<String> {
		attributes.into_iter().map(|a| a.name).collect()
	}

	#[rstest]
	#[case(AccessPolicy::Both, vec!["id", "secret", "display"])]
	#[case(AccessPolicy::FieldOnly, vec!["id"])]
	#[case(AccessPolicy::AccessorOnly, vec!["secret", "display"])]
	fn test_access_policy(#[case] policy: AccessPolicy, #[case] expected: Vec<&str>) {
		// Arrange
		let introspector = DefaultIntrospector::new().with_policy("Account", policy);

		// Act
		let visible = names(introspector.attributes_of(&Account::default()));

		// Assert
		assert_eq!(visible, expected);
	}

	#[rstest]
	fn test_name_filters() {
		let introspector = DefaultIntrospector::new()
			.enable("Account", ["id", "secret"])
			.disable("Account", ["secret"]);

		let visible = names(introspector.attributes_of(&Account::default()));

		assert_eq!(visible, vec!["id"]);
	}

	#[rstest]
	fn test_attribute_lookup_case_insensitive() {
		let introspector = DefaultIntrospector::new();

		let attribute = introspector.attribute(&Account::default(), "ID").unwrap();

		assert_eq!(attribute.name, "id");
		assert!(introspector.attribute(&Account::default(), "nope").is_none());
	}

	#[rstest]
	fn test_factories() {
		// Arrange
		let mut factories = BeanFactories::new();
		factories.register_default::<Account>("Account");

		// Act
		let bean = factories.create("Account").unwrap();
		bean.write().write("id", Value::int(5)).unwrap();

		// Assert
		assert_eq!(bean.read().read("display").unwrap(), Value::text("#5"));
		assert_eq!(
			factories.create("Missing").err(),
			Some(BeanError::NoFactory("Missing".to_string()))
		);
	}
}
