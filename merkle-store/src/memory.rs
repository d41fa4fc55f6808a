//! # In-Memory Merkle Store
//!
//! Ordered map with a lazily computed, cached root hash.

use std::collections::BTreeMap;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use crate::hasher::{hash_leaf, merkle_root, Digest};
use crate::traits::MerkleStore;

/// `BTreeMap`-backed [`MerkleStore`].
///
/// The root hash is recomputed on the first `hash()` after a mutation and
/// cached until the next one.
#[derive(Debug, Default)]
pub struct InMemoryMerkleStore {
    entries: BTreeMap<Bytes, Bytes>,
    root_cache: Mutex<Option<Option<Digest>>>,
}

impl InMemoryMerkleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from entries in any order.
    pub fn from_entries(entries: impl IntoIterator<Item = (Bytes, Bytes)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            root_cache: Mutex::new(None),
        }
    }

    /// Copies the entries out in key order.
    pub fn entries(&self) -> Vec<(Bytes, Bytes)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn invalidate(&mut self) {
        *self.root_cache.get_mut() = None;
    }

    fn compute_root(&self) -> Option<Digest> {
        let leaves = self
            .entries
            .iter()
            .map(|(key, value)| hash_leaf(key, value))
            .collect();
        let root = merkle_root(leaves);
        debug!(
            "Root recomputed: entries={}, root={:?}",
            self.entries.len(),
            root
        );
        root
    }
}

impl Clone for InMemoryMerkleStore {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            root_cache: Mutex::new(*self.root_cache.lock()),
        }
    }
}

impl MerkleStore for InMemoryMerkleStore {
    fn set(&mut self, key: Bytes, value: Bytes) {
        self.entries.insert(key, value);
        self.invalidate();
    }

    fn remove(&mut self, key: &[u8]) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.invalidate();
        }
        existed
    }

    fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.entries.get(key).cloned()
    }

    fn get_by_index(&self, index: u64) -> Option<Bytes> {
        let index = usize::try_from(index).ok()?;
        self.entries.keys().nth(index).cloned()
    }

    fn size(&self) -> u64 {
        self.entries.len() as u64
    }

    fn hash(&self) -> Option<Digest> {
        let mut cache = self.root_cache.lock();
        *cache.get_or_insert_with(|| self.compute_root())
    }

    fn iterate(&self, visitor: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> bool {
        for (key, value) in &self.entries {
            if visitor(&key[..], &value[..]) {
                return true;
            }
        }
        false
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.invalidate();
    }
}
