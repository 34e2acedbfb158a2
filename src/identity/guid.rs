//! Scopes drawing from spaces too large to collide in practice.

use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashSet;
use uuid::Uuid;

use super::{Identity, Scope};
use crate::{Error, Result};

/// Random v4 UUID identities.
///
/// The instance remembers what it issued so that `contains` and `claim`
/// behave like every other scope.
#[derive(Debug, Clone)]
pub struct GuidScope {
    name: String,
    known: HashSet<String>,
}

impl GuidScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), known: HashSet::new() }
    }

    /// Stateless issuance, safe from any thread. Not recorded by any instance.
    pub fn mint() -> Identity {
        Identity::new(Uuid::new_v4().to_string())
    }
}

impl Scope for GuidScope {
    fn name(&self) -> &str {
        &self.name
    }

    /// The hint is ignored.
    fn new_identity(&mut self, _hint: Option<&str>) -> Identity {
        let id = Self::mint();
        self.known.insert(id.as_str().to_string());
        id
    }

    fn claim(&mut self, id: &str) -> Result<Identity> {
        if !self.known.insert(id.to_string()) {
            return Err(Error::Collision { id: id.to_string(), scope: self.name.clone() });
        }
        Ok(Identity::new(id))
    }

    fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }
}

static PROCESS_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-unique identities: `{pid:x}.{n:x}` where `n` is shared by every
/// `ProcessScope` in the process.
#[derive(Debug, Clone)]
pub struct ProcessScope {
    name: String,
    known: HashSet<String>,
}

impl ProcessScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), known: HashSet::new() }
    }
}

impl Scope for ProcessScope {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_identity(&mut self, hint: Option<&str>) -> Identity {
        loop {
            let n = PROCESS_COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{}{:x}.{n:x}", hint.unwrap_or(""), std::process::id());
            if self.known.insert(candidate.clone()) {
                return Identity::new(candidate);
            }
        }
    }

    fn claim(&mut self, id: &str) -> Result<Identity> {
        if !self.known.insert(id.to_string()) {
            return Err(Error::Collision { id: id.to_string(), scope: self.name.clone() });
        }
        Ok(Identity::new(id))
    }

    fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }
}
