//! # State Machine Replication Interface
//!
//! The seam between a replication layer and a deterministic application.
//! The replication layer orders commands; the application applies them and
//! can hand its full state to a lagging replica as a [`Snapshot`].

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{MerkleError, Result};

/// Serialized application state tagged with the number of commands it
/// reflects and a CRC32 of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub data: Bytes,
    pub checksum: u32,
}

impl Snapshot {
    pub fn new(version: u64, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let checksum = crc32fast::hash(&data);
        Self {
            version,
            data,
            checksum,
        }
    }

    pub fn verify_checksum(&self) -> bool {
        crc32fast::hash(&self.data) == self.checksum
    }

    /// Encodes the snapshot for transfer to another replica.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a snapshot and verifies its checksum.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(data)?;
        if !snapshot.verify_checksum() {
            return Err(MerkleError::ChecksumMismatch {
                expected: snapshot.checksum,
                actual: crc32fast::hash(&snapshot.data),
            });
        }
        Ok(snapshot)
    }
}

/// A deterministic application driven by an ordered command stream.
///
/// Every replica applying the same commands in the same order must end in
/// the same state and return the same responses.
#[async_trait]
pub trait StateMachine: Send + Sync {
    type Command: Send + Sync + Clone;
    type Response: Send + Sync + Clone;
    type State: Send + Sync + Clone;

    /// Applies one ordered command.
    async fn apply_command(&mut self, command: Self::Command) -> Self::Response;

    /// Applies commands in order, returning one response per command.
    async fn apply_commands(&mut self, commands: Vec<Self::Command>) -> Vec<Self::Response> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.apply_command(command).await);
        }
        responses
    }

    fn get_state(&self) -> Self::State;

    fn set_state(&mut self, state: Self::State) -> Result<()>;

    fn serialize_state(&self) -> Result<Vec<u8>>;

    fn deserialize_state(&mut self, data: &[u8]) -> Result<()>;

    fn is_deterministic(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tally {
        total: u64,
    }

    #[async_trait]
    impl StateMachine for Tally {
        type Command = u64;
        type Response = u64;
        type State = u64;

        async fn apply_command(&mut self, command: u64) -> u64 {
            self.total += command;
            self.total
        }

        fn get_state(&self) -> u64 {
            self.total
        }

        fn set_state(&mut self, state: u64) -> Result<()> {
            self.total = state;
            Ok(())
        }

        fn serialize_state(&self) -> Result<Vec<u8>> {
            Snapshot::new(0, self.total.to_be_bytes().to_vec()).to_bytes()
        }

        fn deserialize_state(&mut self, data: &[u8]) -> Result<()> {
            let snapshot = Snapshot::from_bytes(data)?;
            let raw: [u8; 8] = snapshot
                .data
                .as_ref()
                .try_into()
                .map_err(|_| MerkleError::invalid_snapshot("expected 8 bytes"))?;
            self.set_state(u64::from_be_bytes(raw))
        }
    }

    #[test]
    fn test_snapshot_checksum() {
        let snapshot = Snapshot::new(3, vec![1, 2, 3]);
        assert!(snapshot.verify_checksum());

        let mut tampered = snapshot.clone();
        tampered.data = Bytes::from_static(&[9, 9, 9]);
        assert!(!tampered.verify_checksum());
    }

    #[test]
    fn test_snapshot_from_bytes_rejects_tampering() {
        let mut snapshot = Snapshot::new(1, vec![7; 16]);
        snapshot.checksum ^= 1;
        let encoded = bincode::serialize(&snapshot).unwrap();

        let error = Snapshot::from_bytes(&encoded).unwrap_err();
        assert!(matches!(error, MerkleError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_apply_commands_in_order() {
        let mut tally = Tally::default();
        let responses = tokio_test::block_on(tally.apply_commands(vec![1, 2, 3]));
        assert_eq!(responses, vec![1, 3, 6]);
        assert!(tally.is_deterministic());
    }

    #[tokio::test]
    async fn test_state_transfer_between_replicas() {
        let mut leader = Tally::default();
        leader.apply_command(40).await;
        leader.apply_command(2).await;

        let mut follower = Tally::default();
        follower
            .deserialize_state(&leader.serialize_state().unwrap())
            .unwrap();
        assert_eq!(follower.get_state(), 42);
    }
}
