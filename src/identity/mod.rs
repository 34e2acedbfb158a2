//! # Identities and Scopes
//!
//! A [`Scope`] is a namespace that mints [`Identity`] labels and guarantees
//! it never hands out the same label twice while it is alive.
//!
//! | Scope | Module | Issuance |
//! |-------|--------|----------|
//! | `CounterScope` | `counter` | `{hint}{n}`, monotonic `n` |
//! | `ResettableScope` | `counter` | as `CounterScope`, plus `reset()` |
//! | `GuidScope` | `guid` | random v4 UUIDs |
//! | `ProcessScope` | `guid` | process id + process-wide counter |
//! | `PairScope` | `pair` | `first:second` from two parent scopes |
//!
//! Scopes holding issuance state take `&mut self`; sharing one across
//! threads needs an outer lock. `GuidScope::mint` is stateless and can be
//! called from anywhere.

pub mod counter;
pub mod guid;
pub mod pair;

use serde::{Deserialize, Serialize};

use crate::Result;

pub use counter::{CounterScope, ResettableScope};
pub use guid::{GuidScope, ProcessScope};
pub use pair::{PairScope, PAIR_SEPARATOR};

// ============================================================================
// Identity
// ============================================================================

/// Immutable label naming one element, unique within the scope that issued it.
///
/// Only scopes construct identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Scope trait
// ============================================================================

/// A namespace issuing unique identities.
pub trait Scope: Send + std::fmt::Debug {
    /// Name of the scope itself.
    fn name(&self) -> &str;

    /// Mint a fresh identity, distinct from everything this scope has issued
    /// or accepted through [`Scope::claim`]. The hint is a naming suggestion
    /// that scopes may ignore.
    fn new_identity(&mut self, hint: Option<&str>) -> Identity;

    /// Register a caller-chosen identity.
    ///
    /// Fails with [`crate::Error::Collision`] if `id` is already known to this scope.
    fn claim(&mut self, id: &str) -> Result<Identity>;

    /// Whether `id` was issued or claimed by this scope.
    fn contains(&self, id: &str) -> bool;
}

impl Scope for Box<dyn Scope> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn new_identity(&mut self, hint: Option<&str>) -> Identity {
        (**self).new_identity(hint)
    }

    fn claim(&mut self, id: &str) -> Result<Identity> {
        (**self).claim(id)
    }

    fn contains(&self, id: &str) -> bool {
        (**self).contains(id)
    }
}

// ============================================================================
// Scope configuration
// ============================================================================

/// Serializable description of a scope, used to build one for a factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScopeConfig {
    Counter { name: String },
    Resettable { name: String },
    Guid { name: String },
    Process { name: String },
}

impl ScopeConfig {
    pub fn counter(name: impl Into<String>) -> Self {
        ScopeConfig::Counter { name: name.into() }
    }

    pub fn build(&self) -> Box<dyn Scope> {
        match self {
            ScopeConfig::Counter { name } => Box::new(CounterScope::new(name.clone())),
            ScopeConfig::Resettable { name } => Box::new(ResettableScope::new(name.clone())),
            ScopeConfig::Guid { name } => Box::new(GuidScope::new(name.clone())),
            ScopeConfig::Process { name } => Box::new(ProcessScope::new(name.clone())),
        }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        ScopeConfig::counter("default")
    }
}
