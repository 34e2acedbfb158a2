//! Counter-based scopes.

use hashbrown::HashSet;
use tracing::warn;

use super::{Identity, Scope};
use crate::{Error, Result};

/// Issues `{hint}{n}` with `n` counting up from zero.
///
/// Values already claimed are skipped, so a minted identity never collides
/// with a caller-chosen one.
#[derive(Debug, Clone)]
pub struct CounterScope {
    name: String,
    next: u64,
    issued: HashSet<String>,
}

impl CounterScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next: 0,
            issued: HashSet::new(),
        }
    }

    /// Number of identities currently known to the scope.
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

impl Scope for CounterScope {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_identity(&mut self, hint: Option<&str>) -> Identity {
        let prefix = hint.unwrap_or("");
        loop {
            let candidate = format!("{prefix}{}", self.next);
            self.next += 1;
            if self.issued.insert(candidate.clone()) {
                return Identity::new(candidate);
            }
        }
    }

    fn claim(&mut self, id: &str) -> Result<Identity> {
        if !self.issued.insert(id.to_string()) {
            return Err(Error::Collision { id: id.to_string(), scope: self.name.clone() });
        }
        Ok(Identity::new(id))
    }

    fn contains(&self, id: &str) -> bool {
        self.issued.contains(id)
    }
}

/// A [`CounterScope`] whose issuance history can be cleared.
///
/// After [`ResettableScope::reset`] previously issued identities may be
/// issued again. Callers must make sure no live element still carries one;
/// the scope does not check.
#[derive(Debug, Clone)]
pub struct ResettableScope {
    inner: CounterScope,
}

impl ResettableScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self { inner: CounterScope::new(name) }
    }

    pub fn reset(&mut self) {
        warn!(scope = %self.inner.name, issued = self.inner.issued.len(), "resetting identity scope");
        self.inner.issued.clear();
        self.inner.next = 0;
    }
}

impl Scope for ResettableScope {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn new_identity(&mut self, hint: Option<&str>) -> Identity {
        self.inner.new_identity(hint)
    }

    fn claim(&mut self, id: &str) -> Result<Identity> {
        self.inner.claim(id)
    }

    fn contains(&self, id: &str) -> bool {
        self.inner.contains(id)
    }
}
