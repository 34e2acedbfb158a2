//! Property types and values.
//!
//! The type set is closed: nine scalar types, a table of each scalar type,
//! and a node reference.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Table;
use crate::model::NodeId;

/// Element type of scalar values and of table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl ScalarType {
    pub const ALL: [ScalarType; 9] = [
        ScalarType::Boolean,
        ScalarType::Byte,
        ScalarType::Char,
        ScalarType::Short,
        ScalarType::Int,
        ScalarType::Long,
        ScalarType::Float,
        ScalarType::Double,
        ScalarType::String,
    ];

    pub fn default_value(self) -> Value {
        match self {
            ScalarType::Boolean => Value::Boolean(false),
            ScalarType::Byte => Value::Byte(0),
            ScalarType::Char => Value::Char('\0'),
            ScalarType::Short => Value::Short(0),
            ScalarType::Int => Value::Int(0),
            ScalarType::Long => Value::Long(0),
            ScalarType::Float => Value::Float(0.0),
            ScalarType::Double => Value::Double(0.0),
            ScalarType::String => Value::String(String::new()),
        }
    }
}

/// Type of a property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Table(ScalarType),
    /// Reference to a node of the same container.
    NodeRef,
}

impl PropertyType {
    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            PropertyType::Boolean => Some(ScalarType::Boolean),
            PropertyType::Byte => Some(ScalarType::Byte),
            PropertyType::Char => Some(ScalarType::Char),
            PropertyType::Short => Some(ScalarType::Short),
            PropertyType::Int => Some(ScalarType::Int),
            PropertyType::Long => Some(ScalarType::Long),
            PropertyType::Float => Some(ScalarType::Float),
            PropertyType::Double => Some(ScalarType::Double),
            PropertyType::String => Some(ScalarType::String),
            PropertyType::Table(_) | PropertyType::NodeRef => None,
        }
    }

    /// Value an unset key of this type reads as.
    pub fn default_value(self) -> Value {
        match self {
            PropertyType::Table(element) => Value::Table(Table::empty(element)),
            PropertyType::NodeRef => Value::Null,
            scalar => match scalar.scalar() {
                Some(s) => s.default_value(),
                None => Value::Null,
            },
        }
    }
}

impl From<ScalarType> for PropertyType {
    fn from(s: ScalarType) -> Self {
        match s {
            ScalarType::Boolean => PropertyType::Boolean,
            ScalarType::Byte => PropertyType::Byte,
            ScalarType::Char => PropertyType::Char,
            ScalarType::Short => PropertyType::Short,
            ScalarType::Int => PropertyType::Int,
            ScalarType::Long => PropertyType::Long,
            ScalarType::Float => PropertyType::Float,
            ScalarType::Double => PropertyType::Double,
            ScalarType::String => PropertyType::String,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Table(element) => write!(f, "{element:?}Table"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Unbound node reference.
    Null,
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Table(Table),
    Node(NodeId),
}

impl Value {
    /// The type this value carries. `Null` has none.
    pub fn property_type(&self) -> Option<PropertyType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(PropertyType::Boolean),
            Value::Byte(_) => Some(PropertyType::Byte),
            Value::Char(_) => Some(PropertyType::Char),
            Value::Short(_) => Some(PropertyType::Short),
            Value::Int(_) => Some(PropertyType::Int),
            Value::Long(_) => Some(PropertyType::Long),
            Value::Float(_) => Some(PropertyType::Float),
            Value::Double(_) => Some(PropertyType::Double),
            Value::String(_) => Some(PropertyType::String),
            Value::Table(t) => Some(PropertyType::Table(t.element_type())),
            Value::Node(_) => Some(PropertyType::NodeRef),
        }
    }

    /// Whether the value may be stored under a key of type `ty`.
    pub fn fits(&self, ty: PropertyType) -> bool {
        match (self, ty) {
            (Value::Null, PropertyType::NodeRef) => true,
            (v, t) => v.property_type() == Some(t),
        }
    }

    pub fn type_name(&self) -> String {
        match self.property_type() {
            Some(t) => t.to_string(),
            None => "Null".to_string(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integral value widened to i64.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Boolean(v) } }
impl From<i8> for Value { fn from(v: i8) -> Self { Value::Byte(v) } }
impl From<char> for Value { fn from(v: char) -> Self { Value::Char(v) } }
impl From<i16> for Value { fn from(v: i16) -> Self { Value::Short(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Long(v) } }
impl From<f32> for Value { fn from(v: f32) -> Self { Value::Float(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Double(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<Table> for Value { fn from(v: Table) -> Self { Value::Table(v) } }
impl From<NodeId> for Value { fn from(v: NodeId) -> Self { Value::Node(v) } }

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Table(t) => write!(f, "{t}"),
            Value::Node(id) => write!(f, "{id}"),
        }
    }
}
