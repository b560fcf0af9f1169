//! Allowed-collision matrix.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a pair of names is treated by collision checking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllowedCollision {
    /// Collision is never allowed: the pair is always checked.
    Never,
    /// Collision is always allowed: the pair is skipped.
    Always,
    /// Allowance decided by the caller; treated as allowed by the checks here.
    Conditional,
}

/// A symmetric map from unordered name pairs to [`AllowedCollision`].
///
/// Pairs without an entry fall back to per-name default entries, and are
/// checked normally when neither name has one. Entries are only removed
/// explicitly.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowedCollisionMatrix {
    entries: BTreeMap<(String, String), AllowedCollision>,
    default_entries: BTreeMap<String, AllowedCollision>,
}

fn key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_owned(), b.to_owned())
    } else {
        (b.to_owned(), a.to_owned())
    }
}

impl AllowedCollisionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// The explicit entry for a pair, ignoring defaults.
    pub fn get_entry(&self, a: &str, b: &str) -> Option<AllowedCollision> {
        self.entries.get(&key(a, b)).copied()
    }

    pub fn has_entry(&self, a: &str, b: &str) -> bool {
        self.entries.contains_key(&key(a, b))
    }

    /// Sets the pair to [`AllowedCollision::Always`] or [`AllowedCollision::Never`].
    pub fn set_entry(&mut self, a: &str, b: &str, allowed: bool) {
        let tag = if allowed {
            AllowedCollision::Always
        } else {
            AllowedCollision::Never
        };
        self.set_entry_tag(a, b, tag);
    }

    pub fn set_entry_tag(&mut self, a: &str, b: &str, tag: AllowedCollision) {
        self.entries.insert(key(a, b), tag);
    }

    /// Allows (or forbids) `name` against every name in `others`.
    pub fn set_entries(&mut self, name: &str, others: &[String], allowed: bool) {
        for other in others {
            self.set_entry(name, other, allowed);
        }
    }

    pub fn remove_entry(&mut self, a: &str, b: &str) {
        self.entries.remove(&key(a, b));
    }

    /// Removes the entries between `name` and each of `others`.
    pub fn remove_entries(&mut self, name: &str, others: &[String]) {
        for other in others {
            self.remove_entry(name, other);
        }
    }

    /// Removes every entry involving `name`, including its default.
    pub fn remove_name(&mut self, name: &str) {
        self.entries.retain(|(a, b), _| a != name && b != name);
        self.default_entries.remove(name);
    }

    pub fn set_default_entry(&mut self, name: &str, allowed: bool) {
        let tag = if allowed {
            AllowedCollision::Always
        } else {
            AllowedCollision::Never
        };
        self.default_entries.insert(name.to_owned(), tag);
    }

    pub fn remove_default_entry(&mut self, name: &str) {
        self.default_entries.remove(name);
    }

    /// The effective allowance of a pair.
    ///
    /// An explicit entry wins. Otherwise the default entries of both names are
    /// consulted; if either forbids collision the pair is `Never`.
    pub fn get_allowed_collision(&self, a: &str, b: &str) -> Option<AllowedCollision> {
        if let Some(tag) = self.get_entry(a, b) {
            return Some(tag);
        }
        match (self.default_entries.get(a), self.default_entries.get(b)) {
            (Some(AllowedCollision::Never), _) | (_, Some(AllowedCollision::Never)) => {
                Some(AllowedCollision::Never)
            }
            (Some(&tag), _) | (_, Some(&tag)) => Some(tag),
            (None, None) => None,
        }
    }

    /// Whether a pair must go through the narrow phase.
    ///
    /// Unlisted pairs and pairs marked [`AllowedCollision::Never`] are checked.
    pub fn should_check(&self, a: &str, b: &str) -> bool {
        matches!(
            self.get_allowed_collision(a, b),
            None | Some(AllowedCollision::Never)
        )
    }

    /// All explicit entries as `(a, b, tag)` with `a <= b`.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, AllowedCollision)> {
        self.entries
            .iter()
            .map(|((a, b), tag)| (a.as_str(), b.as_str(), *tag))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
