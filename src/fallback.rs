//! Break-glass admin table consulted when the session store has no answer.
//!
//! Loaded once from configuration and never mutated afterwards, so it is
//! shared between requests behind a plain `Arc` with no locking.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::role::Role;

/// One row of the fallback table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FallbackEntry {
    /// Admin id the entry answers for.
    pub admin_id: i64,
    /// Display name.
    pub name: String,
    /// Role granted.
    pub role: Role,
}

/// Immutable mapping from admin id to name and role.
///
/// # Examples
///
/// ```
/// use tutordesk_auth::{FallbackTable, Role};
///
/// let table = FallbackTable::default().with_entry(7, "Tutor", "tutor");
///
/// assert_eq!(table.get(7).map(|e| &e.role), Some(&Role::Tutor));
/// assert!(table.get(8).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackTable {
    entries: BTreeMap<i64, FallbackEntry>,
}

impl FallbackTable {
    /// Builds a table from entries. A later entry for the same id replaces an earlier one.
    pub fn new(entries: impl IntoIterator<Item = FallbackEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.admin_id, e)).collect(),
        }
    }

    /// Adds or replaces one entry.
    pub fn with_entry(mut self, admin_id: i64, name: impl Into<String>, role: impl Into<Role>) -> Self {
        self.entries.insert(
            admin_id,
            FallbackEntry {
                admin_id,
                name: name.into(),
                role: role.into(),
            },
        );
        self
    }

    /// Entry for `admin_id`, if listed.
    pub fn get(&self, admin_id: i64) -> Option<&FallbackEntry> {
        self.entries.get(&admin_id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in admin id order.
    pub fn iter(&self) -> impl Iterator<Item = &FallbackEntry> {
        self.entries.values()
    }
}

impl<'de> Deserialize<'de> for FallbackTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<FallbackEntry>::deserialize(deserializer).map(FallbackTable::new)
    }
}
