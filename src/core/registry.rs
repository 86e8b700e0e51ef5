//! # Insertion-ordered registry.
//!
//! [`OrderedRegistry`] maps unique keys to entries and always iterates in
//! registration order, independent of the hash map used for lookups. The
//! supervisor keeps one for units and one per hook phase.
//!
//! ## Rules
//! - `set` on a new key appends it; `set` on an existing key replaces the value in place
//! - `delete` removes the key from both the lookup map and the order list
//! - The order list and the lookup map always hold the same key set
//! - Not synchronized: callers serialize mutation (the supervisor does so under its lock)

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::ControlFlow;

/// Map with deterministic, insertion-ordered traversal.
#[derive(Debug, Clone)]
pub struct OrderedRegistry<K, V> {
    data: HashMap<K, V>,
    order: Vec<K>,
}

impl<K, V> Default for OrderedRegistry<K, V> {
    fn default() -> Self {
        Self {
            data: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K, V> OrderedRegistry<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Inserts `value` under `key`, or replaces the existing value keeping its position.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(slot) = self.data.get_mut(&key) {
            *slot = value;
            return;
        }
        self.order.push(key.clone());
        self.data.insert(key, value);
    }

    /// True if `key` is registered.
    pub fn contains(&self, key: &K) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the entry for `key`, `None` if absent.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.data.get(key)
    }

    /// Returns a clone of the entry for `key`, or `V::default()` if absent.
    ///
    /// Use [`contains`](Self::contains) or [`get`](Self::get) when presence matters.
    pub fn get_or_default(&self, key: &K) -> V
    where
        V: Default + Clone,
    {
        self.data.get(key).cloned().unwrap_or_default()
    }

    /// Removes `key`. Returns whether it was present.
    pub fn delete(&mut self, key: &K) -> bool {
        if self.data.remove(key).is_none() {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        true
    }

    /// Calls `f(index, key, value)` in registration order until it returns `Break`.
    pub fn traverse<F>(&self, mut f: F)
    where
        F: FnMut(usize, &K, &V) -> ControlFlow<()>,
    {
        for (i, key) in self.order.iter().enumerate() {
            if let Some(value) = self.data.get(key) {
                if f(i, key, value).is_break() {
                    break;
                }
            }
        }
    }

    /// Iterates `(key, value)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .iter()
            .filter_map(|k| self.data.get_key_value(k))
    }

    /// Iterates keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Iterates values in registration order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V> IntoIterator for OrderedRegistry<K, V>
where
    K: Eq + Hash,
{
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    /// Consumes the registry, yielding entries in registration order.
    fn into_iter(mut self) -> Self::IntoIter {
        let mut out = Vec::with_capacity(self.order.len());
        for key in self.order {
            if let Some(value) = self.data.remove(&key) {
                out.push((key, value));
            }
        }
        out.into_iter()
    }
}
