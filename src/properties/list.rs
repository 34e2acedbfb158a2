//! The property list family.

use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{PropertyType, Value};
use crate::{Error, Result};

// ============================================================================
// Schema
// ============================================================================

/// Ordered set of typed keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    keys: IndexMap<String, PropertyType>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Schema::add_key`]; a repeated key keeps its first type.
    pub fn with_key(mut self, key: impl Into<String>, ty: PropertyType) -> Self {
        self.keys.entry(key.into()).or_insert(ty);
        self
    }

    pub fn add_key(&mut self, key: &str, ty: PropertyType) -> Result<()> {
        if self.keys.contains_key(key) {
            return Err(Error::DuplicateKey(key.to_string()));
        }
        self.keys.insert(key.to_string(), ty);
        Ok(())
    }

    pub fn remove_key(&mut self, key: &str) -> Result<PropertyType> {
        self.keys
            .shift_remove(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))
    }

    pub fn type_of(&self, key: &str) -> Option<PropertyType> {
        self.keys.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A schema referenced by many property lists.
///
/// Cloning the handle shares the schema. Adding or removing a key is seen
/// at once by every list holding the handle, which for a schema shared by
/// thousands of elements is a population-wide change.
#[derive(Debug, Clone, Default)]
pub struct SharedSchema(Arc<RwLock<Schema>>);

impl SharedSchema {
    pub fn new(schema: Schema) -> Self {
        Self(Arc::new(RwLock::new(schema)))
    }

    pub fn add_key(&self, key: &str, ty: PropertyType) -> Result<()> {
        self.0.write().add_key(key, ty)
    }

    pub fn remove_key(&self, key: &str) -> Result<PropertyType> {
        self.0.write().remove_key(key)
    }

    pub fn type_of(&self, key: &str) -> Option<PropertyType> {
        self.0.read().type_of(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.read().contains(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Snapshot of the current key set.
    pub fn snapshot(&self) -> Schema {
        self.0.read().clone()
    }

    pub fn ptr_eq(&self, other: &SharedSchema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles (lists plus registries).
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

// ============================================================================
// PropertyList
// ============================================================================

/// Which key-set changes a list accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    Fixed,
    Extendable,
    Resizeable,
}

#[derive(Debug, Clone)]
enum Keys {
    Owned(Schema),
    Shared(SharedSchema),
}

/// Typed key → value mapping. Keys unset since creation read as the
/// default value of their type.
#[derive(Debug, Clone)]
pub struct PropertyList {
    kind: ListKind,
    keys: Keys,
    values: HashMap<String, Value>,
    sealed: bool,
}

impl PropertyList {
    fn with(kind: ListKind, keys: Keys) -> Self {
        Self { kind, keys, values: HashMap::new(), sealed: false }
    }

    /// List whose keys never change.
    pub fn fixed(schema: Schema) -> Self {
        Self::with(ListKind::Fixed, Keys::Owned(schema))
    }

    /// Empty list accepting new keys.
    pub fn extendable() -> Self {
        Self::with(ListKind::Extendable, Keys::Owned(Schema::new()))
    }

    /// Empty list accepting new keys and key removal.
    pub fn resizeable() -> Self {
        Self::with(ListKind::Resizeable, Keys::Owned(Schema::new()))
    }

    /// List over a shared schema. `add_key` extends the shared schema.
    pub fn shared(schema: &SharedSchema) -> Self {
        Self::with(ListKind::Extendable, Keys::Shared(schema.clone()))
    }

    /// As [`PropertyList::shared`], also allowing `remove_key` on the shared schema.
    pub fn shared_resizeable(schema: &SharedSchema) -> Self {
        Self::with(ListKind::Resizeable, Keys::Shared(schema.clone()))
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    pub fn shared_schema(&self) -> Option<&SharedSchema> {
        match &self.keys {
            Keys::Shared(s) => Some(s),
            Keys::Owned(_) => None,
        }
    }

    pub fn type_of(&self, key: &str) -> Option<PropertyType> {
        match &self.keys {
            Keys::Owned(s) => s.type_of(key),
            Keys::Shared(s) => s.type_of(key),
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.type_of(key).is_some()
    }

    /// Keys in schema order.
    pub fn keys(&self) -> Vec<String> {
        match &self.keys {
            Keys::Owned(s) => s.keys().map(str::to_string).collect(),
            Keys::Shared(s) => s.keys(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.keys {
            Keys::Owned(s) => s.len(),
            Keys::Shared(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Result<Value> {
        let ty = self.type_of(key).ok_or_else(|| Error::UnknownKey(key.to_string()))?;
        Ok(self.value_of(key, ty))
    }

    /// A value left behind by a shared schema's earlier key of another type
    /// reads as the current type's default.
    fn value_of(&self, key: &str, ty: PropertyType) -> Value {
        self.values
            .get(key)
            .filter(|v| v.fits(ty))
            .cloned()
            .unwrap_or_else(|| ty.default_value())
    }

    /// Like [`PropertyList::get`] but yields `default` for unknown keys.
    pub fn get_or_default(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        if self.sealed {
            return Err(Error::ReadOnly(key.to_string()));
        }
        let value = value.into();
        let ty = self.type_of(key).ok_or_else(|| Error::UnknownKey(key.to_string()))?;
        if !value.fits(ty) {
            return Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: ty.to_string(),
                got: value.type_name(),
            });
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn add_key(&mut self, key: &str, ty: PropertyType) -> Result<()> {
        if self.sealed {
            return Err(Error::ReadOnly(key.to_string()));
        }
        if self.kind == ListKind::Fixed {
            return Err(Error::FixedSchema(key.to_string()));
        }
        match &mut self.keys {
            Keys::Owned(s) => s.add_key(key, ty),
            Keys::Shared(s) => s.add_key(key, ty),
        }
    }

    /// Add a key typed after `value` and set it.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let ty = value.property_type().ok_or_else(|| Error::TypeMismatch {
            key: key.to_string(),
            expected: "a typed value".into(),
            got: value.type_name(),
        })?;
        self.add_key(key, ty)?;
        self.set(key, value)
    }

    /// Remove a key and return its last value.
    pub fn remove_key(&mut self, key: &str) -> Result<Value> {
        if self.sealed {
            return Err(Error::ReadOnly(key.to_string()));
        }
        if self.kind != ListKind::Resizeable {
            return Err(Error::FixedSchema(key.to_string()));
        }
        let last = self.get(key)?;
        match &mut self.keys {
            Keys::Owned(s) => s.remove_key(key)?,
            Keys::Shared(s) => s.remove_key(key)?,
        };
        self.values.remove(key);
        Ok(last)
    }

    /// Make the list read-only.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn unseal(&mut self) {
        self.sealed = false;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// `(key, type, value)` triples in schema order.
    pub fn entries(&self) -> Vec<(String, PropertyType, Value)> {
        self.keys()
            .into_iter()
            .filter_map(|k| {
                let ty = self.type_of(&k)?;
                let v = self.value_of(&k, ty);
                Some((k, ty, v))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (String, PropertyType, Value)> {
        self.entries().into_iter()
    }
}

impl Default for PropertyList {
    fn default() -> Self {
        Self::extendable()
    }
}

/// Lists are equal when they expose the same entries in the same order.
impl PartialEq for PropertyList {
    fn eq(&self, other: &Self) -> bool {
        self.entries() == other.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::ScalarType;

    fn xy() -> Schema {
        Schema::new()
            .with_key("x", PropertyType::Int)
            .with_key("y", PropertyType::Double)
    }

    #[test]
    fn test_unknown_key() {
        let list = PropertyList::fixed(xy());
        assert!(matches!(list.get("z"), Err(Error::UnknownKey(_))));
    }

    #[test]
    fn test_defaults_before_set() {
        let list = PropertyList::fixed(xy());
        assert_eq!(list.get("x").unwrap(), Value::Int(0));
        assert_eq!(list.get("y").unwrap(), Value::Double(0.0));
    }

    #[test]
    fn test_set_and_type_mismatch() {
        let mut list = PropertyList::fixed(xy());
        list.set("x", 7).unwrap();
        assert_eq!(list.get("x").unwrap(), Value::Int(7));
        let err = list.set("x", "seven").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_fixed_rejects_new_keys() {
        let mut list = PropertyList::fixed(xy());
        assert!(matches!(list.add_key("z", PropertyType::String), Err(Error::FixedSchema(_))));
        assert!(matches!(list.remove_key("x"), Err(Error::FixedSchema(_))));
    }

    #[test]
    fn test_extendable_duplicate_key() {
        let mut list = PropertyList::extendable();
        list.add_key("a", PropertyType::Long).unwrap();
        assert!(matches!(list.add_key("a", PropertyType::Long), Err(Error::DuplicateKey(_))));
        assert!(matches!(list.remove_key("a"), Err(Error::FixedSchema(_))));
    }

    #[test]
    fn test_resizeable_remove() {
        let mut list = PropertyList::resizeable();
        list.insert("a", 3i64).unwrap();
        assert_eq!(list.remove_key("a").unwrap(), Value::Long(3));
        assert!(!list.has_key("a"));
        assert!(matches!(list.remove_key("a"), Err(Error::UnknownKey(_))));
    }

    #[test]
    fn test_sealed_list_is_read_only() {
        let mut list = PropertyList::extendable();
        list.insert("name", "ada").unwrap();
        list.seal();
        assert!(matches!(list.set("name", "bob"), Err(Error::ReadOnly(_))));
        assert!(matches!(list.add_key("age", PropertyType::Int), Err(Error::ReadOnly(_))));
        assert_eq!(list.get("name").unwrap(), Value::from("ada"));
        list.unseal();
        list.set("name", "bob").unwrap();
    }

    #[test]
    fn test_shared_schema_is_population_wide() {
        let schema = SharedSchema::new(xy());
        let mut a = PropertyList::shared(&schema);
        let b = PropertyList::shared(&schema);
        a.set("x", 1).unwrap();
        a.add_key("z", PropertyType::String).unwrap();
        assert!(b.has_key("z"));
        assert_eq!(b.get("z").unwrap(), Value::String(String::new()));
        assert_eq!(b.get("x").unwrap(), Value::Int(0));
        assert_eq!(schema.holders(), 3);
    }

    #[test]
    fn test_shared_resizeable_remove() {
        let schema = SharedSchema::new(xy());
        let mut a = PropertyList::shared_resizeable(&schema);
        let b = PropertyList::shared(&schema);
        a.remove_key("y").unwrap();
        assert!(!b.has_key("y"));
        assert_eq!(schema.keys(), vec!["x".to_string()]);
    }

    #[test]
    fn test_shared_key_readded_with_new_type() {
        let schema = SharedSchema::new(xy());
        let mut a = PropertyList::shared_resizeable(&schema);
        let mut b = PropertyList::shared(&schema);
        b.set("x", 5).unwrap();
        a.remove_key("x").unwrap();
        schema.add_key("x", PropertyType::String).unwrap();

        assert_eq!(b.get("x").unwrap(), Value::String(String::new()));
        let x = b.entries().into_iter().find(|(k, _, _)| k == "x").unwrap();
        assert_eq!(x, ("x".to_string(), PropertyType::String, Value::String(String::new())));
        b.set("x", "five").unwrap();
        assert_eq!(b.get("x").unwrap(), Value::from("five"));
    }

    #[test]
    fn test_entries_in_schema_order() {
        let mut list = PropertyList::extendable();
        list.insert("b", true).unwrap();
        list.insert("a", 'c').unwrap();
        list.add_key("t", PropertyType::Table(ScalarType::Int)).unwrap();
        let keys: Vec<_> = list.iter().map(|(k, _, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "t"]);
    }

    #[test]
    fn test_node_ref_accepts_null() {
        let mut list = PropertyList::extendable();
        list.add_key("target", PropertyType::NodeRef).unwrap();
        assert_eq!(list.get("target").unwrap(), Value::Null);
        list.set("target", Value::Null).unwrap();
        assert!(matches!(list.insert("other", Value::Null), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_list_equality_ignores_kind() {
        let mut a = PropertyList::extendable();
        a.insert("x", 1).unwrap();
        let mut b = PropertyList::resizeable();
        b.insert("x", 1).unwrap();
        assert_eq!(a, b);
        b.set("x", 2).unwrap();
        assert_ne!(a, b);
    }
}
