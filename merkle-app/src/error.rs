//! # Request Errors
//!
//! Everything that can reject a transaction or query. Each variant maps to
//! a [`ResultCode`] and renders the log text replicas return to clients.

use merkle_core::{AppResult, ResultCode, WireError};
use thiserror::Error;

/// Rejection of a transaction or query buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Tx length must be greater than zero")]
    EmptyTx,

    #[error("Query cannot be zero length")]
    EmptyQuery,

    #[error("Error getting key: {0}")]
    Key(WireError),

    #[error("Error getting value: {0}")]
    Value(WireError),

    #[error("Error getting index: {0}")]
    Index(WireError),

    #[error("Error getting index: negative index {0}")]
    NegativeIndex(i64),

    #[error("Got bytes left over")]
    LeftoverBytes { remaining: usize },

    #[error("Unexpected tx type byte {0:02X}")]
    UnknownTxType(u8),

    #[error("Unexpected query type byte {0:02X}")]
    UnknownQueryType(u8),

    #[error("Store size {0} does not fit the 4-byte size encoding")]
    SizeOverflow(u64),

    #[error("Store holds {size} keys but has no root hash")]
    MissingRoot { size: u64 },
}

impl AppError {
    /// Result code this error is reported with.
    pub fn code(&self) -> ResultCode {
        match self {
            AppError::UnknownTxType(_) | AppError::UnknownQueryType(_) => {
                ResultCode::UnknownRequest
            }
            AppError::SizeOverflow(_) | AppError::MissingRoot { .. } => {
                ResultCode::InternalError
            }
            _ => ResultCode::EncodingError,
        }
    }

    /// Whether the buffer itself was malformed.
    pub fn is_decode_error(&self) -> bool {
        self.code() == ResultCode::EncodingError
    }

    /// Whether the sender is at fault, as opposed to the state machine.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AppError::SizeOverflow(_) | AppError::MissingRoot { .. }
        )
    }
}

impl From<AppError> for AppResult {
    fn from(error: AppError) -> Self {
        AppResult::error(error.code(), error.to_string())
    }
}
