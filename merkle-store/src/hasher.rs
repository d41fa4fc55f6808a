//! # Root Hash Construction
//!
//! Binary Merkle tree over the store's entries in key order. Leaves and
//! inner nodes are hashed under different domain tags so a leaf can never
//! be replayed as an inner node.

use bytes::BytesMut;
use merkle_core::wire::encode_length_prefixed_bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

const LEAF_DOMAIN: &[u8] = b"merkle-kv-leaf-v1:";
const NODE_DOMAIN: &[u8] = b"merkle-kv-node-v1:";

/// A 32-byte BLAKE3 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hashes one key/value entry.
///
/// Both fields are length-prefixed so `("ab", "c")` and `("a", "bc")`
/// produce different leaves.
pub fn hash_leaf(key: &[u8], value: &[u8]) -> Digest {
    let mut encoded = BytesMut::with_capacity(key.len() + value.len() + 18);
    encode_length_prefixed_bytes(&mut encoded, key);
    encode_length_prefixed_bytes(&mut encoded, value);

    let mut hasher = blake3::Hasher::new();
    hasher.update(LEAF_DOMAIN);
    hasher.update(&encoded);
    Digest(*hasher.finalize().as_bytes())
}

fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(&left.0);
    hasher.update(&right.0);
    Digest(*hasher.finalize().as_bytes())
}

/// Folds leaf hashes into a root.
///
/// Returns `None` for no leaves. A single leaf is its own root; an odd node
/// at any level is paired with itself.
pub fn merkle_root(leaves: Vec<Digest>) -> Option<Digest> {
    let mut current = leaves;
    if current.is_empty() {
        return None;
    }

    while current.len() > 1 {
        current = current
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                hash_pair(left, right)
            })
            .collect();
    }

    current.pop()
}
