//! Paired scope: identities composed from two parent scopes.
//!
//! A pair identity reads `first:second`, recording which scopes it came
//! from. Pair identities contain the separator and are therefore not valid
//! element names in the text grammar.

use hashbrown::HashSet;

use super::{Identity, Scope};
use crate::{Error, Result};

pub const PAIR_SEPARATOR: char = ':';

#[derive(Debug)]
pub struct PairScope {
    name: String,
    first: Box<dyn Scope>,
    second: Box<dyn Scope>,
    issued: HashSet<String>,
}

impl PairScope {
    pub fn new(name: impl Into<String>, first: Box<dyn Scope>, second: Box<dyn Scope>) -> Self {
        Self {
            name: name.into(),
            first,
            second,
            issued: HashSet::new(),
        }
    }

    pub fn first(&self) -> &dyn Scope {
        self.first.as_ref()
    }

    pub fn second(&self) -> &dyn Scope {
        self.second.as_ref()
    }

    /// Compose two existing identities. A repeated pair gets a `#n` suffix.
    pub fn pair(&mut self, first: &Identity, second: &Identity) -> Identity {
        let base = format!("{first}{PAIR_SEPARATOR}{second}");
        if self.issued.insert(base.clone()) {
            return Identity::new(base);
        }
        let mut n = 1u64;
        loop {
            let candidate = format!("{base}#{n}");
            if self.issued.insert(candidate.clone()) {
                return Identity::new(candidate);
            }
            n += 1;
        }
    }

    /// Split a pair identity back into its two components.
    pub fn split(id: &Identity) -> Option<(&str, &str)> {
        id.as_str().split_once(PAIR_SEPARATOR)
    }
}

impl Scope for PairScope {
    fn name(&self) -> &str {
        &self.name
    }

    /// Draws from the first scope with the hint, from the second without.
    fn new_identity(&mut self, hint: Option<&str>) -> Identity {
        let a = self.first.new_identity(hint);
        let b = self.second.new_identity(None);
        self.pair(&a, &b)
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
