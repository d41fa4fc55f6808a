//! # Merkle Core
//!
//! Shared building blocks of the Merkle KV state machine.
//!
//! - **Wire Codec**: varints and length-prefixed byte slices, the primitives
//!   of every transaction and query buffer
//! - **Result Envelope**: `{code, data, log}` returned by every operation
//! - **Error Handling**: codec and integration error types
//! - **StateMachine Trait**: the seam to a replication layer, with
//!   checksummed snapshots for state transfer
//!
//! ```rust
//! use bytes::BytesMut;
//! use merkle_core::wire::{decode_length_prefixed_bytes, encode_length_prefixed_bytes};
//!
//! let mut buf = BytesMut::new();
//! encode_length_prefixed_bytes(&mut buf, b"key");
//! let (key, consumed) = decode_length_prefixed_bytes(&buf).unwrap();
//! assert_eq!(key.as_ref(), b"key");
//! assert_eq!(consumed, buf.len());
//! ```

pub mod error;
pub mod smr;
pub mod types;
pub mod wire;

pub use error::*;
pub use smr::{Snapshot, StateMachine};
pub use types::*;
