//! # Merkle Testing
//!
//! A harness that drives several replicas with one ordered transaction
//! stream and reports where they disagree, plus builders for well-formed
//! and deliberately malformed buffers.

pub mod builders;
pub mod replica_set;

pub use builders::{arb_malformed_tx, arb_tx, arb_tx_stream};
pub use replica_set::{Divergence, ReplicaSet, ReplicaSetError};
