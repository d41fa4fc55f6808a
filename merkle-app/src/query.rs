//! # Queries
//!
//! Read-only requests against the store.
//!
//! ```text
//! byte   query_tag   0x01 = Size, 0x02 = GetByKey, 0x03 = GetByIndex
//! ...    body        key (length-prefixed) or index (varint), fully consumed
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use merkle_core::wire::{
    decode_length_prefixed_bytes, decode_varint, encode_length_prefixed_bytes, encode_uvarint,
};
use serde::{Deserialize, Serialize};

use crate::config::ProtocolRevision;
use crate::error::AppError;
use crate::transaction::ensure_consumed;

pub const QUERY_SIZE: u8 = 0x01;
pub const QUERY_GET_BY_KEY: u8 = 0x02;
pub const QUERY_GET_BY_INDEX: u8 = 0x03;

/// A decoded query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryRequest {
    /// Number of keys in the store
    Size,
    /// Value stored under a key
    GetByKey { key: Bytes },
    /// Key at an ordinal position in key order
    GetByIndex { index: u64 },
}

impl QueryRequest {
    pub fn get_by_key(key: impl Into<Bytes>) -> Self {
        QueryRequest::GetByKey { key: key.into() }
    }

    /// Parses a query buffer under the given protocol revision.
    ///
    /// `GetByIndex` is only recognized when the revision supports it;
    /// otherwise its tag is as unknown as any other.
    pub fn decode(buf: &[u8], revision: ProtocolRevision) -> Result<Self, AppError> {
        let (&tag, rest) = buf.split_first().ok_or(AppError::EmptyQuery)?;

        match tag {
            QUERY_SIZE => {
                ensure_consumed(rest)?;
                Ok(QueryRequest::Size)
            }
            QUERY_GET_BY_KEY => {
                let (key, consumed) = decode_length_prefixed_bytes(rest).map_err(AppError::Key)?;
                ensure_consumed(&rest[consumed..])?;
                Ok(QueryRequest::GetByKey { key })
            }
            QUERY_GET_BY_INDEX if revision.supports_get_by_index() => {
                let (index, consumed) = decode_varint(rest).map_err(AppError::Index)?;
                ensure_consumed(&rest[consumed..])?;
                let index = u64::try_from(index).map_err(|_| AppError::NegativeIndex(index))?;
                Ok(QueryRequest::GetByIndex { index })
            }
            other => Err(AppError::UnknownQueryType(other)),
        }
    }

    /// Canonical wire form of this query.
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::new();
        match self {
            QueryRequest::Size => out.put_u8(QUERY_SIZE),
            QueryRequest::GetByKey { key } => {
                out.put_u8(QUERY_GET_BY_KEY);
                encode_length_prefixed_bytes(&mut out, key);
            }
            QueryRequest::GetByIndex { index } => {
                out.put_u8(QUERY_GET_BY_INDEX);
                encode_uvarint(&mut out, *index);
            }
        }
        out.freeze()
    }

    pub fn query_type(&self) -> &'static str {
        match self {
            QueryRequest::Size => "SIZE",
            QueryRequest::GetByKey { .. } => "GET_BY_KEY",
            QueryRequest::GetByIndex { .. } => "GET_BY_INDEX",
        }
    }
}
