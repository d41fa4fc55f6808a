//! # Error Types
//!
//! Error handling shared by every crate of the Merkle KV state machine.

use thiserror::Error;

/// Failures raised by the wire codec while reading a buffer.
///
/// These never escape to a replica as a panic: the transaction and query
/// decoders turn them into an `EncodingError` result with a log naming the
/// field that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The buffer ended before the header byte of a value
    #[error("EOF while reading varint header")]
    Eof,

    /// Fewer bytes remain than the encoding declares
    #[error("Not enough bytes to read, want {want}, have {have}")]
    Truncated { want: usize, have: usize },

    /// Varint magnitude wider than eight bytes or outside `i64`
    #[error("Varint overflow")]
    VarintOverflow,

    /// A value with more than one possible encoding was not in its canonical form
    #[error("Varint non-canonical encoding")]
    NonCanonical,

    /// A length prefix decoded to a negative number
    #[error("Negative byte slice length {0}")]
    NegativeLength(i64),
}

impl WireError {
    pub fn truncated(want: usize, have: usize) -> Self {
        Self::Truncated { want, have }
    }
}

/// Error types for the state machine outside of request decoding.
///
/// Request decoding failures are reported to callers as result codes, not
/// as `MerkleError`. This type covers the integration surface: snapshots,
/// serialization and invariants that should never break.
///
/// # Examples
///
/// ```rust
/// use merkle_core::MerkleError;
///
/// let error = MerkleError::invalid_snapshot("root hash mismatch");
/// assert!(error.is_corruption());
/// ```
#[derive(Error, Debug)]
pub enum MerkleError {
    /// Snapshot payload failed its checksum
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Snapshot decoded but is not a valid image of a store
    #[error("Invalid snapshot: {details}")]
    InvalidSnapshot { details: String },

    /// Binary serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Type alias for Results in the Merkle KV state machine.
pub type Result<T> = std::result::Result<T, MerkleError>;

impl MerkleError {
    /// Creates a new invalid snapshot error with the given details.
    pub fn invalid_snapshot(details: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            details: details.into(),
        }
    }

    /// Whether the error means replicated state can no longer be trusted.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::ChecksumMismatch { .. } | Self::InvalidSnapshot { .. }
        )
    }
}
