use bytes::Bytes;

use crate::hasher::Digest;

/// Key-value store whose full contents are summarized by one digest.
///
/// Implementations must keep keys unique and ordered, and `hash` must be a
/// pure function of the current contents: the same entries give the same
/// digest no matter which sequence of `set`/`remove` calls produced them.
pub trait MerkleStore: Send + Sync {
    /// Inserts or overwrites `key`.
    fn set(&mut self, key: Bytes, value: Bytes);

    /// Removes `key`, returning whether it was present.
    fn remove(&mut self, key: &[u8]) -> bool;

    fn get(&self, key: &[u8]) -> Option<Bytes>;

    /// Key at ordinal position `index` in key order.
    fn get_by_index(&self, index: u64) -> Option<Bytes>;

    fn size(&self) -> u64;

    /// Root digest of the contents, `None` when the store is empty.
    fn hash(&self) -> Option<Digest>;

    /// Visits entries in key order until the visitor returns `true`.
    ///
    /// Returns `true` if the visitor stopped the walk early.
    fn iterate(&self, visitor: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> bool;

    /// Removes every entry.
    fn clear(&mut self);

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}
