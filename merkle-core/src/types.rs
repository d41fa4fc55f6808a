//! # Core Types
//!
//! The result envelope returned by every state machine operation and the
//! numeric codes it carries.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status code of an [`AppResult`].
///
/// The numeric values are part of the replicated protocol and never change.
/// `Ok` is zero; every other code names a failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    /// The request succeeded
    Ok,
    /// An invariant of the state machine itself was violated
    InternalError,
    /// The request buffer was malformed
    EncodingError,
    /// The request tag is not part of the protocol revision in use
    UnknownRequest,
    /// A well-formed lookup found no value
    ValueNotFound,
}

impl ResultCode {
    /// Returns the numeric wire value of this code.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use merkle_core::ResultCode;
    ///
    /// assert_eq!(ResultCode::Ok.value(), 0);
    /// assert_eq!(ResultCode::ValueNotFound.value(), 10000);
    /// ```
    pub fn value(&self) -> u32 {
        match self {
            ResultCode::Ok => 0,
            ResultCode::InternalError => 1,
            ResultCode::EncodingError => 2,
            ResultCode::UnknownRequest => 6,
            ResultCode::ValueNotFound => 10000,
        }
    }

    /// Maps a numeric wire value back to a code.
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(ResultCode::Ok),
            1 => Some(ResultCode::InternalError),
            2 => Some(ResultCode::EncodingError),
            6 => Some(ResultCode::UnknownRequest),
            10000 => Some(ResultCode::ValueNotFound),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ResultCode::Ok)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultCode::Ok => "OK",
            ResultCode::InternalError => "InternalError",
            ResultCode::EncodingError => "EncodingError",
            ResultCode::UnknownRequest => "UnknownRequest",
            ResultCode::ValueNotFound => "ValueNotFound",
        };
        write!(f, "{}({})", name, self.value())
    }
}

/// Result of applying a transaction, answering a query or committing.
///
/// `data` is the success payload (hash bytes, value bytes, encoded
/// integers). `log` is diagnostic text and is never parsed by machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppResult {
    pub code: ResultCode,
    pub data: Bytes,
    pub log: String,
}

impl AppResult {
    /// Successful result with empty payload and log.
    pub fn ok() -> Self {
        Self::new(ResultCode::Ok, Bytes::new(), String::new())
    }

    /// Successful result carrying a payload and a log.
    pub fn ok_with(data: impl Into<Bytes>, log: impl Into<String>) -> Self {
        Self::new(ResultCode::Ok, data, log)
    }

    /// Failed result with no payload.
    pub fn error(code: ResultCode, log: impl Into<String>) -> Self {
        Self::new(code, Bytes::new(), log)
    }

    pub fn new(code: ResultCode, data: impl Into<Bytes>, log: impl Into<String>) -> Self {
        Self {
            code,
            data: data.into(),
            log: log.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

impl fmt::Display for AppResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} data={}", self.code, hex::encode_upper(&self.data))?;
        if !self.log.is_empty() {
            write!(f, " log={}", self.log)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_values_round_trip() {
        for code in [
            ResultCode::Ok,
            ResultCode::InternalError,
            ResultCode::EncodingError,
            ResultCode::UnknownRequest,
            ResultCode::ValueNotFound,
        ] {
            assert_eq!(ResultCode::from_value(code.value()), Some(code));
        }
        assert_eq!(ResultCode::from_value(311311), None);
    }

    #[test]
    fn test_app_result_constructors() {
        let result = AppResult::ok();
        assert!(result.is_ok());
        assert!(result.data.is_empty());
        assert!(result.log.is_empty());

        let result = AppResult::ok_with(vec![1, 2], "done");
        assert!(result.is_ok());
        assert_eq!(result.data.as_ref(), &[1, 2]);
        assert_eq!(result.log, "done");

        let result = AppResult::error(ResultCode::EncodingError, "bad");
        assert!(!result.is_ok());
        assert_eq!(result.code.value(), 2);
    }

    #[test]
    fn test_app_result_display() {
        let result = AppResult::ok_with(vec![0xAB], "");
        assert_eq!(result.to_string(), "OK(0) data=AB");

        let result = AppResult::error(ResultCode::UnknownRequest, "nope");
        assert_eq!(result.to_string(), "UnknownRequest(6) data= log=nope");
    }
}
