//! # Property Lists
//!
//! Typed key → value containers attached to every element.
//!
//! | Kind | Keys after construction |
//! |------|-------------------------|
//! | Fixed | frozen |
//! | Extendable | may be added |
//! | Resizeable | may be added and removed |
//! | Shared | live in a [`SharedSchema`] referenced by many lists |
//!
//! Any list can be sealed, after which every write fails with
//! [`crate::Error::ReadOnly`].

pub mod value;
pub mod table;
pub mod list;

pub use value::{PropertyType, ScalarType, Value};
pub use table::Table;
pub use list::{ListKind, PropertyList, Schema, SharedSchema};
