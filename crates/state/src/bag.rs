//! Relation databags.

use std::collections::BTreeMap;
use std::collections::btree_map;

/// A relation databag: string keys to string values.
///
/// Besides the current contents the bag remembers every write and removal
/// since it was loaded (or since [`DataBag::take_changes`] was last called).
/// A removal is recorded as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataBag {
    entries: BTreeMap<String, String>,
    changes: BTreeMap<String, Option<String>>,
}

impl DataBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a raw value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        self.changes.insert(key.clone(), Some(value.clone()));
        self.entries.insert(key, value)
    }

    /// Remove a key, returning its value. Removing an absent key records
    /// nothing.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.changes.insert(key.to_string(), None);
        }
        removed
    }

    /// Store every pair from `entries`.
    pub fn update<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    /// Current contents.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Pending changes since load.
    #[must_use]
    pub const fn changes(&self) -> &BTreeMap<String, Option<String>> {
        &self.changes
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Drain the change journal, leaving the contents untouched.
    pub fn take_changes(&mut self) -> BTreeMap<String, Option<String>> {
        std::mem::take(&mut self.changes)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DataBag {
    /// Build a bag as loaded from the agent: contents only, no changes.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            changes: BTreeMap::new(),
        }
    }
}

impl<'a> IntoIterator for &'a DataBag {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
