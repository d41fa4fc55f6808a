//! # StateMachine Implementation
//!
//! Plugs [`MerkleApp`] into a replication layer: ordered transaction
//! buffers go in, results come out, and a lagging replica can be brought
//! up to date from a snapshot.

use async_trait::async_trait;
use bytes::Bytes;
use merkle_core::{AppResult, MerkleError, Result, Snapshot, StateMachine};
use merkle_store::{Digest, MerkleStore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::MerkleApp;

/// Full image of an app: its entries in key order, the root hash they
/// produce and the number of transactions that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MerkleAppState {
    pub entries: Vec<(Bytes, Bytes)>,
    pub root: Option<Digest>,
    pub applied_txs: u64,
}

impl<S: MerkleStore + Default> MerkleApp<S> {
    fn collect_state(&self) -> MerkleAppState {
        let mut entries = Vec::with_capacity(self.store.size() as usize);
        self.store.iterate(&mut |key, value| {
            entries.push((Bytes::copy_from_slice(key), Bytes::copy_from_slice(value)));
            false
        });

        MerkleAppState {
            entries,
            root: self.store.hash(),
            applied_txs: self.applied_txs,
        }
    }

    /// Rebuilds the store from `state` and swaps it in only if the rebuilt
    /// contents hash to the recorded root.
    fn restore_state(&mut self, state: MerkleAppState) -> Result<()> {
        let expected_len = state.entries.len() as u64;
        let mut store = S::default();
        for (key, value) in state.entries {
            store.set(key, value);
        }

        if store.size() != expected_len {
            return Err(MerkleError::invalid_snapshot(format!(
                "duplicate keys: {} entries produced {} keys",
                expected_len,
                store.size()
            )));
        }
        if store.hash() != state.root {
            return Err(MerkleError::invalid_snapshot("root hash mismatch"));
        }

        self.store = store;
        self.applied_txs = state.applied_txs;
        info!(
            "State restored: size={}, applied_txs={}",
            self.store.size(),
            self.applied_txs
        );
        Ok(())
    }
}

#[async_trait]
impl<S: MerkleStore + Default> StateMachine for MerkleApp<S> {
    type Command = Bytes;
    type Response = AppResult;
    type State = MerkleAppState;

    async fn apply_command(&mut self, command: Self::Command) -> Self::Response {
        self.append_tx(&command)
    }

    fn get_state(&self) -> Self::State {
        self.collect_state()
    }

    fn set_state(&mut self, state: Self::State) -> Result<()> {
        self.restore_state(state)
    }

    fn serialize_state(&self) -> Result<Vec<u8>> {
        let state = self.collect_state();
        let payload = bincode::serialize(&state)?;
        Snapshot::new(state.applied_txs, payload).to_bytes()
    }

    fn deserialize_state(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.config.max_snapshot_bytes {
            return Err(MerkleError::invalid_snapshot(format!(
                "snapshot of {} bytes exceeds limit of {}",
                data.len(),
                self.config.max_snapshot_bytes
            )));
        }

        let snapshot = Snapshot::from_bytes(data)?;
        let state: MerkleAppState = bincode::deserialize(&snapshot.data)?;
        if state.applied_txs != snapshot.version {
            return Err(MerkleError::invalid_snapshot(format!(
                "version {} does not match state at {} txs",
                snapshot.version, state.applied_txs
            )));
        }
        self.restore_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MerkleAppConfig;
    use crate::transaction::Transaction;

    fn quiet_app() -> MerkleApp {
        MerkleApp::new(MerkleAppConfig::default().with_trace_sets(false))
    }

    #[tokio::test]
    async fn test_apply_commands() {
        let mut app = quiet_app();
        let commands = vec![
            Transaction::set("key1", "value1").encode(),
            Transaction::set("key2", "value2").encode(),
            Bytes::from_static(&[0x05]),
            Transaction::remove("key2").encode(),
        ];

        let responses = app.apply_commands(commands).await;
        assert_eq!(responses.len(), 4);
        assert!(responses[0].is_ok());
        assert!(responses[1].is_ok());
        assert!(!responses[2].is_ok());
        assert!(responses[3].is_ok());
        assert_eq!(app.store().size(), 1);
        assert_eq!(app.applied_txs(), 3);
        assert!(app.is_deterministic());
    }

    #[tokio::test]
    async fn test_state_serialization() {
        let mut app = quiet_app();
        app.apply_command(Transaction::set("key1", "value1").encode()).await;
        app.apply_command(Transaction::set("key2", "value2").encode()).await;

        let serialized = app.serialize_state().unwrap();
        assert!(!serialized.is_empty());

        let mut replica = quiet_app();
        replica.deserialize_state(&serialized).unwrap();

        let state = replica.get_state();
        assert_eq!(state.entries.len(), 2);
        assert_eq!(state.applied_txs, 2);
        assert_eq!(replica.commit(), app.commit());
    }

    #[test]
    fn test_empty_state_round_trip() {
        let app = quiet_app();
        let mut replica = quiet_app();
        replica
            .deserialize_state(&app.serialize_state().unwrap())
            .unwrap();
        assert!(replica.store().is_empty());
        assert_eq!(replica.get_state(), MerkleAppState::default());
    }

    #[test]
    fn test_set_state_rejects_wrong_root() {
        let mut app = quiet_app();
        app.append_tx(&Transaction::set("a", "1").encode());

        let mut state = app.get_state();
        state.entries[0].1 = Bytes::from_static(b"2");

        let mut replica = quiet_app();
        let error = replica.set_state(state).unwrap_err();
        assert!(error.is_corruption());
        assert!(replica.store().is_empty());
    }

    #[test]
    fn test_set_state_rejects_duplicate_keys() {
        let mut replica = quiet_app();
        let state = MerkleAppState {
            entries: vec![
                (Bytes::from_static(b"a"), Bytes::from_static(b"1")),
                (Bytes::from_static(b"a"), Bytes::from_static(b"1")),
            ],
            root: None,
            applied_txs: 2,
        };
        assert!(replica.set_state(state).is_err());
    }

    #[test]
    fn test_deserialize_rejects_oversized_snapshot() {
        let mut app = quiet_app();
        app.append_tx(&Transaction::set("a", "1").encode());
        let serialized = app.serialize_state().unwrap();

        let mut replica = MerkleApp::new(
            MerkleAppConfig::default()
                .with_trace_sets(false)
                .with_max_snapshot_bytes(4),
        );
        let error = replica.deserialize_state(&serialized).unwrap_err();
        assert!(matches!(error, MerkleError::InvalidSnapshot { .. }));
    }

    #[test]
    fn test_deserialize_rejects_corrupt_payload() {
        let mut app = quiet_app();
        app.append_tx(&Transaction::set("a", "1").encode());
        let mut serialized = app.serialize_state().unwrap();
        let last = serialized.len() - 1;
        serialized[last] ^= 0xFF;

        let mut replica = quiet_app();
        assert!(replica.deserialize_state(&serialized).is_err());
        assert!(replica.store().is_empty());
    }
}
