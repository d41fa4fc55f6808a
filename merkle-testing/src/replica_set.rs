use bytes::Bytes;
use merkle_app::{MerkleApp, MerkleAppConfig};
use merkle_core::{AppResult, StateMachine};
use thiserror::Error;
use tracing::{debug, warn};

/// A point where replicas stopped agreeing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Divergence {
    /// Replica `replica` answered transaction `tx_index` differently from replica 0
    Result {
        tx_index: usize,
        replica: usize,
        expected: AppResult,
        actual: AppResult,
    },
    /// Replica `replica` committed a different hash from replica 0
    Commit {
        replica: usize,
        expected: AppResult,
        actual: AppResult,
    },
}

#[derive(Error, Debug)]
pub enum ReplicaSetError {
    #[error("Replica set needs at least one replica")]
    Empty,

    #[error("Replica {replica} diverged: {divergence:?}")]
    Diverged {
        replica: usize,
        divergence: Box<Divergence>,
    },

    #[error("State transfer failed: {0}")]
    StateTransfer(#[from] merkle_core::MerkleError),
}

/// A group of independent replicas fed the same transactions in the same order.
pub struct ReplicaSet {
    replicas: Vec<MerkleApp>,
}

impl ReplicaSet {
    /// Creates `count` replicas sharing one configuration.
    pub fn new(count: usize, config: MerkleAppConfig) -> Result<Self, ReplicaSetError> {
        if count == 0 {
            return Err(ReplicaSetError::Empty);
        }
        let replicas = (0..count)
            .map(|_| MerkleApp::new(config.clone()))
            .collect();
        Ok(Self { replicas })
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    pub fn replica(&self, index: usize) -> Option<&MerkleApp> {
        self.replicas.get(index)
    }

    /// Applies one transaction to every replica and returns replica 0's result.
    ///
    /// Every replica receives the transaction even when an earlier one
    /// diverges.
    pub fn append_tx(&mut self, tx_index: usize, tx: &[u8]) -> Result<AppResult, ReplicaSetError> {
        let mut results = self
            .replicas
            .iter_mut()
            .map(|app| app.append_tx(tx))
            .collect::<Vec<_>>()
            .into_iter();
        let expected = results.next().ok_or(ReplicaSetError::Empty)?;

        for (offset, actual) in results.enumerate() {
            if actual != expected {
                let replica = offset + 1;
                warn!("Replica {} diverged at tx {}", replica, tx_index);
                return Err(ReplicaSetError::Diverged {
                    replica,
                    divergence: Box::new(Divergence::Result {
                        tx_index,
                        replica,
                        expected,
                        actual,
                    }),
                });
            }
        }
        Ok(expected)
    }

    /// Applies a stream in order and returns replica 0's results.
    pub fn append_all<I, T>(&mut self, txs: I) -> Result<Vec<AppResult>, ReplicaSetError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        txs.into_iter()
            .enumerate()
            .map(|(index, tx)| self.append_tx(index, tx.as_ref()))
            .collect()
    }

    /// Asks every replica the same query, in replica order.
    pub fn query(&self, query: &[u8]) -> Vec<AppResult> {
        self.replicas.iter().map(|app| app.query(query)).collect()
    }

    /// Commits every replica and checks the hashes agree.
    pub fn commit(&self) -> Result<AppResult, ReplicaSetError> {
        let mut commits = self.replicas.iter().map(|app| app.commit());
        let expected = commits.next().ok_or(ReplicaSetError::Empty)?;

        for (offset, actual) in commits.enumerate() {
            if actual != expected {
                let replica = offset + 1;
                return Err(ReplicaSetError::Diverged {
                    replica,
                    divergence: Box::new(Divergence::Commit {
                        replica,
                        expected,
                        actual,
                    }),
                });
            }
        }
        debug!("{} replicas agree on commit", self.replicas.len());
        Ok(expected)
    }

    /// Adds a replica that catches up from replica 0's serialized state
    /// instead of replaying transactions. Returns its index.
    pub fn join_from_snapshot(&mut self, config: MerkleAppConfig) -> Result<usize, ReplicaSetError> {
        let leader = self.replicas.first().ok_or(ReplicaSetError::Empty)?;
        let snapshot = leader.serialize_state()?;

        let mut joiner = MerkleApp::new(config);
        joiner.deserialize_state(&snapshot)?;
        self.replicas.push(joiner);
        Ok(self.replicas.len() - 1)
    }

    /// Drives an async apply path, for callers that hold replicas behind
    /// the `StateMachine` trait.
    pub async fn apply_commands(&mut self, commands: Vec<Bytes>) -> Vec<Vec<AppResult>> {
        let mut all = Vec::with_capacity(self.replicas.len());
        for app in self.replicas.iter_mut() {
            all.push(app.apply_commands(commands.clone()).await);
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merkle_app::{QueryRequest, Transaction};

    fn quiet() -> MerkleAppConfig {
        MerkleAppConfig::default().with_trace_sets(false)
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(
            ReplicaSet::new(0, quiet()),
            Err(ReplicaSetError::Empty)
        ));
    }

    #[test]
    fn test_replicas_agree() {
        let mut set = ReplicaSet::new(3, quiet()).unwrap();
        let results = set
            .append_all([
                Transaction::set("a", "1").encode(),
                Transaction::set("b", "2").encode(),
                Transaction::remove("a").encode(),
            ])
            .unwrap();
        assert!(results.iter().all(|r| r.is_ok()));

        let sizes = set.query(&QueryRequest::Size.encode());
        assert!(sizes.iter().all(|r| r.data.as_ref() == [0, 0, 0, 1]));
        assert!(set.commit().is_ok());
    }

    #[test]
    fn test_every_replica_receives_each_tx() {
        let mut set = ReplicaSet::new(3, quiet()).unwrap();
        // Replica 1 gets ahead of the others
        set.replicas[1].append_tx(&Transaction::set("extra", "x").encode());

        set.append_tx(0, &Transaction::set("k", "v").encode()).unwrap();
        for (index, expected) in [(0, 1u8), (1, 2), (2, 1)] {
            let size = set.replicas[index].query(&QueryRequest::Size.encode());
            assert_eq!(size.data.as_ref(), &[0, 0, 0, expected]);
            assert_eq!(set.replicas[index].applied_txs(), u64::from(expected));
        }

        let error = set.commit().unwrap_err();
        assert!(matches!(error, ReplicaSetError::Diverged { replica: 1, .. }));
    }

    #[test]
    fn test_join_from_snapshot() {
        let mut set = ReplicaSet::new(2, quiet()).unwrap();
        set.append_all([Transaction::set("k", "v").encode()]).unwrap();

        let index = set.join_from_snapshot(quiet()).unwrap();
        assert_eq!(index, 2);
        assert_eq!(set.len(), 3);
        set.commit().unwrap();

        set.append_all([Transaction::set("k2", "v2").encode()]).unwrap();
        set.commit().unwrap();
    }

    #[tokio::test]
    async fn test_apply_commands_per_replica() {
        let mut set = ReplicaSet::new(2, quiet()).unwrap();
        let all = set
            .apply_commands(vec![Transaction::set("x", "y").encode()])
            .await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], all[1]);
    }
}
