//! # Transactions
//!
//! Decoding and encoding of the two mutating operations.
//!
//! ```text
//! byte   type_tag   0x01 = Set, 0x02 = Remove
//! bytes  key        length-prefixed
//! bytes  value      length-prefixed, Set only
//! ```
//!
//! Nothing may follow the fields the tag calls for.

use bytes::{BufMut, Bytes, BytesMut};
use merkle_core::wire::{decode_length_prefixed_bytes, encode_length_prefixed_bytes};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const TX_SET: u8 = 0x01;
pub const TX_REMOVE: u8 = 0x02;

/// A decoded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    /// Insert or overwrite a key
    Set { key: Bytes, value: Bytes },
    /// Delete a key; deleting an absent key is not an error
    Remove { key: Bytes },
}

impl Transaction {
    pub fn set(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Transaction::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<Bytes>) -> Self {
        Transaction::Remove { key: key.into() }
    }

    /// Parses a transaction buffer, requiring every byte to be consumed.
    ///
    /// The key is read before the tag is checked, so a buffer with both an
    /// unknown tag and a broken key reports the key.
    pub fn decode(buf: &[u8]) -> Result<Self, AppError> {
        let (&tag, rest) = buf.split_first().ok_or(AppError::EmptyTx)?;

        let (key, consumed) = decode_length_prefixed_bytes(rest).map_err(AppError::Key)?;
        let rest = &rest[consumed..];

        let transaction = match tag {
            TX_SET => {
                let (value, consumed) =
                    decode_length_prefixed_bytes(rest).map_err(AppError::Value)?;
                ensure_consumed(&rest[consumed..])?;
                Transaction::Set { key, value }
            }
            TX_REMOVE => {
                ensure_consumed(rest)?;
                Transaction::Remove { key }
            }
            other => return Err(AppError::UnknownTxType(other)),
        };

        Ok(transaction)
    }

    /// Canonical wire form of this transaction.
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::new();
        match self {
            Transaction::Set { key, value } => {
                out.put_u8(TX_SET);
                encode_length_prefixed_bytes(&mut out, key);
                encode_length_prefixed_bytes(&mut out, value);
            }
            Transaction::Remove { key } => {
                out.put_u8(TX_REMOVE);
                encode_length_prefixed_bytes(&mut out, key);
            }
        }
        out.freeze()
    }

    pub fn key(&self) -> &Bytes {
        match self {
            Transaction::Set { key, .. } => key,
            Transaction::Remove { key } => key,
        }
    }

    /// Get the operation type as a string
    pub fn operation_type(&self) -> &'static str {
        match self {
            Transaction::Set { .. } => "SET",
            Transaction::Remove { .. } => "REMOVE",
        }
    }
}

pub(crate) fn ensure_consumed(rest: &[u8]) -> Result<(), AppError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(AppError::LeftoverBytes {
            remaining: rest.len(),
        })
    }
}
