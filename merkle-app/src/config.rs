use serde::{Deserialize, Serialize};
use std::path::Path;

/// Revision of the query protocol a replica speaks.
///
/// All replicas of one network must run the same revision: a query that is
/// `Ok` on one and `UnknownRequest` on another breaks agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolRevision {
    /// Size and GetByKey queries only
    V1,
    /// V1 plus GetByIndex
    #[default]
    V2,
}

impl ProtocolRevision {
    pub fn supports_get_by_index(&self) -> bool {
        matches!(self, ProtocolRevision::V2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerkleAppConfig {
    pub revision: ProtocolRevision,
    /// Emit the advisory trace for every applied Set
    pub trace_sets: bool,
    /// Largest serialized state accepted on restore
    pub max_snapshot_bytes: usize,
}

impl Default for MerkleAppConfig {
    fn default() -> Self {
        Self {
            revision: ProtocolRevision::V2,
            trace_sets: true,
            max_snapshot_bytes: 256 * 1024 * 1024, // 256MB
        }
    }
}

impl MerkleAppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_revision(mut self, revision: ProtocolRevision) -> Self {
        self.revision = revision;
        self
    }

    pub fn with_trace_sets(mut self, enabled: bool) -> Self {
        self.trace_sets = enabled;
        self
    }

    pub fn with_max_snapshot_bytes(mut self, limit: usize) -> Self {
        self.max_snapshot_bytes = limit;
        self
    }

    /// Parses a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents).map_err(std::io::Error::from)
    }
}
