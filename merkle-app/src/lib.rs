//! # Merkle App
//!
//! Deterministic state machine of a replicated key-value store.
//!
//! A replication layer hands the app opaque byte buffers in a fixed order.
//! The app decodes them, applies them to a [`MerkleStore`](merkle_store::MerkleStore)
//! and answers with a canonical [`AppResult`](merkle_core::AppResult). Replicas
//! that apply the same buffers in the same order end with byte-identical
//! stores and commit hashes.
//!
//! ## Operations
//!
//! - **CheckTx**: decode-only validation, never mutates
//! - **AppendTx**: decode and apply a Set or Remove
//! - **Query**: Size, GetByKey and (revision V2) GetByIndex
//! - **Commit**: root hash of the current contents
//!
//! ## Example Usage
//!
//! ```rust
//! use merkle_app::{MerkleApp, QueryRequest, Transaction};
//! use merkle_core::ResultCode;
//!
//! let mut app = MerkleApp::new_default();
//!
//! let result = app.append_tx(&Transaction::set("foo", "bar").encode());
//! assert!(result.is_ok());
//!
//! let result = app.query(&QueryRequest::get_by_key("foo").encode());
//! assert_eq!(result.data.as_ref(), b"bar");
//!
//! let result = app.query(&QueryRequest::get_by_key("nope").encode());
//! assert_eq!(result.code, ResultCode::ValueNotFound);
//!
//! assert!(!app.commit().data.is_empty());
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod observer;
pub mod query;
pub mod smr_impl;
pub mod transaction;

pub use app::{MerkleApp, EMPTY_TREE_LOG, NO_OPTIONS_LOG};
pub use config::{MerkleAppConfig, ProtocolRevision};
pub use error::AppError;
pub use observer::{ChangeEvent, ChannelObserver, NoopObserver, TracingObserver, TxObserver};
pub use query::QueryRequest;
pub use smr_impl::MerkleAppState;
pub use transaction::Transaction;

/// Re-export commonly used types for convenience
pub use merkle_core::{AppResult, ResultCode, StateMachine};
pub use merkle_store::{InMemoryMerkleStore, MerkleStore};
