//! # Merkle Store
//!
//! The storage contract the state machine is written against, plus an
//! in-memory implementation.
//!
//! The state machine only relies on what [`MerkleStore`] promises: unique
//! ordered keys and a root hash that depends on nothing but the current
//! contents. Any balanced or persistent tree honoring that can be swapped
//! in behind the trait.
//!
//! ```rust
//! use bytes::Bytes;
//! use merkle_store::{InMemoryMerkleStore, MerkleStore};
//!
//! let mut store = InMemoryMerkleStore::new();
//! store.set(Bytes::from_static(b"foo"), Bytes::from_static(b"bar"));
//! assert_eq!(store.size(), 1);
//! assert!(store.hash().is_some());
//! ```

pub mod hasher;
pub mod memory;
pub mod traits;

pub use hasher::Digest;
pub use memory::InMemoryMerkleStore;
pub use traits::MerkleStore;
