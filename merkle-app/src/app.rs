//! # Merkle Application
//!
//! The state machine proper: validates and applies transactions, answers
//! queries and reports the committed root hash.

use std::sync::Arc;

use bytes::Bytes;
use merkle_core::wire::encode_fixed_u32;
use merkle_core::{AppResult, ResultCode};
use merkle_store::{InMemoryMerkleStore, MerkleStore};
use tracing::{debug, info};

use crate::config::MerkleAppConfig;
use crate::error::AppError;
use crate::observer::{ChangeEvent, NoopObserver, TracingObserver, TxObserver};
use crate::query::QueryRequest;
use crate::transaction::Transaction;

pub const EMPTY_TREE_LOG: &str = "Empty hash for empty tree";
pub const NO_OPTIONS_LOG: &str = "No options are supported yet";

/// Deterministic state machine over an owned [`MerkleStore`].
///
/// `append_tx` is the only mutator and takes `&mut self`; everything else
/// reads through `&self`. Callers that share an app between threads wrap it
/// in their own lock, which gives exactly the single-writer discipline the
/// apply loop needs.
pub struct MerkleApp<S: MerkleStore = InMemoryMerkleStore> {
    pub(crate) store: S,
    pub(crate) config: MerkleAppConfig,
    observer: Arc<dyn TxObserver>,
    pub(crate) applied_txs: u64,
}

impl MerkleApp<InMemoryMerkleStore> {
    /// Creates an app over an empty in-memory store.
    pub fn new(config: MerkleAppConfig) -> Self {
        Self::with_store(InMemoryMerkleStore::new(), config)
    }

    pub fn new_default() -> Self {
        Self::new(MerkleAppConfig::default())
    }
}

impl<S: MerkleStore> MerkleApp<S> {
    /// Creates an app that takes ownership of `store`.
    pub fn with_store(store: S, config: MerkleAppConfig) -> Self {
        let observer: Arc<dyn TxObserver> = if config.trace_sets {
            Arc::new(TracingObserver)
        } else {
            Arc::new(NoopObserver)
        };
        info!(
            "MerkleApp initialized: revision={:?}, size={}",
            config.revision,
            store.size()
        );

        Self {
            store,
            config,
            observer,
            applied_txs: 0,
        }
    }

    /// Replaces the change observer.
    pub fn with_observer(mut self, observer: Arc<dyn TxObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MerkleAppConfig {
        &self.config
    }

    /// Number of transactions applied successfully.
    pub fn applied_txs(&self) -> u64 {
        self.applied_txs
    }

    pub fn info(&self) -> String {
        format!("size:{}", self.store.size())
    }

    /// Options are not configurable at runtime; the returned log says so.
    pub fn set_option(&mut self, key: &str, value: &str) -> String {
        debug!("SetOption ignored: {}={}", key, value);
        NO_OPTIONS_LOG.to_string()
    }

    /// Validates a transaction without touching the store.
    ///
    /// Returns `Ok` exactly when [`append_tx`](Self::append_tx) would decode
    /// the same buffer successfully.
    pub fn check_tx(&self, tx: &[u8]) -> AppResult {
        match Transaction::decode(tx) {
            Ok(_) => AppResult::ok(),
            Err(error) => {
                debug!("CheckTx rejected: {}", error);
                error.into()
            }
        }
    }

    /// Decodes and applies a transaction.
    ///
    /// A buffer that fails to decode never reaches the store; a buffer that
    /// decodes causes exactly one store mutation.
    pub fn append_tx(&mut self, tx: &[u8]) -> AppResult {
        let transaction = match Transaction::decode(tx) {
            Ok(transaction) => transaction,
            Err(error) => {
                debug!("AppendTx rejected: {}", error);
                return error.into();
            }
        };

        let event = match transaction {
            Transaction::Set { key, value } => {
                self.store.set(key.clone(), value.clone());
                ChangeEvent::Set { key, value }
            }
            Transaction::Remove { key } => {
                let existed = self.store.remove(&key);
                ChangeEvent::Removed { key, existed }
            }
        };
        self.applied_txs += 1;
        self.observer.on_change(&event);

        AppResult::ok()
    }

    /// Answers a read-only query.
    pub fn query(&self, query: &[u8]) -> AppResult {
        let request = match QueryRequest::decode(query, self.config.revision) {
            Ok(request) => request,
            Err(error) => {
                debug!("Query rejected: {}", error);
                return error.into();
            }
        };

        match self.execute_query(&request) {
            Ok(result) => result,
            Err(error) => error.into(),
        }
    }

    fn execute_query(&self, request: &QueryRequest) -> Result<AppResult, AppError> {
        let result = match request {
            QueryRequest::Size => {
                let size = self.store.size();
                let size = u32::try_from(size).map_err(|_| AppError::SizeOverflow(size))?;
                AppResult::ok_with(encode_fixed_u32(size), "")
            }
            QueryRequest::GetByKey { key } => match self.store.get(key) {
                Some(value) if !value.is_empty() => AppResult::ok_with(value, ""),
                _ => AppResult::error(
                    ResultCode::ValueNotFound,
                    format!(
                        "Error no value found for query: {}",
                        hex::encode_upper(key)
                    ),
                ),
            },
            QueryRequest::GetByIndex { index } => {
                let key = self.store.get_by_index(*index).unwrap_or_default();
                AppResult::ok_with(key, "")
            }
        };
        Ok(result)
    }

    /// Reports the root hash of the current contents.
    ///
    /// An empty store has no hash: the result is `Ok` with no data and the
    /// log `"Empty hash for empty tree"`.
    pub fn commit(&self) -> AppResult {
        if self.store.is_empty() {
            return AppResult::ok_with(Bytes::new(), EMPTY_TREE_LOG);
        }

        match self.store.hash() {
            Some(root) => {
                debug!(
                    "Commit: root={}, size={}, applied_txs={}",
                    root,
                    self.store.size(),
                    self.applied_txs
                );
                AppResult::ok_with(Bytes::copy_from_slice(root.as_bytes()), "")
            }
            None => AppError::MissingRoot {
                size: self.store.size(),
            }
            .into(),
        }
    }

    /// Walks the store in key order until `visitor` returns `true`.
    pub fn iterate(&self, mut visitor: impl FnMut(&[u8], &[u8]) -> bool) -> bool {
        self.store.iterate(&mut visitor)
    }
}
