//! # Wire Codec
//!
//! Length-prefixed byte slices and variable-width integers, the two
//! primitives every transaction and query buffer is built from.
//!
//! A varint is one header byte followed by up to eight big-endian magnitude
//! bytes. The low seven bits of the header give the magnitude width, the
//! high bit marks a negative number. Zero is the lone byte `0x00`.
//!
//! ```text
//!   300  ->  02 01 2C
//!   -1   ->  81 01
//!   0    ->  00
//! ```
//!
//! Every integer has exactly one accepted encoding; a leading zero byte in
//! the magnitude or a negative zero is rejected so that two replicas can
//! never disagree on whether a buffer is well formed.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::WireError;

const NEGATIVE_FLAG: u8 = 0x80;
const MAX_MAGNITUDE_BYTES: usize = 8;

/// Decodes an unsigned varint, returning the value and the bytes consumed.
pub fn decode_uvarint(buf: &[u8]) -> Result<(u64, usize), WireError> {
    let (negative, magnitude, consumed) = decode_magnitude(buf)?;
    if negative {
        return Err(WireError::VarintOverflow);
    }
    Ok((magnitude, consumed))
}

/// Decodes a signed varint, returning the value and the bytes consumed.
pub fn decode_varint(buf: &[u8]) -> Result<(i64, usize), WireError> {
    let (negative, magnitude, consumed) = decode_magnitude(buf)?;
    let value = if negative {
        // i64::MIN has a magnitude one larger than i64::MAX
        if magnitude > i64::MAX as u64 + 1 {
            return Err(WireError::VarintOverflow);
        }
        (magnitude as i64).wrapping_neg()
    } else {
        i64::try_from(magnitude).map_err(|_| WireError::VarintOverflow)?
    };
    Ok((value, consumed))
}

fn decode_magnitude(buf: &[u8]) -> Result<(bool, u64, usize), WireError> {
    let header = *buf.first().ok_or(WireError::Eof)?;
    let negative = header & NEGATIVE_FLAG != 0;
    let size = (header & !NEGATIVE_FLAG) as usize;

    if size > MAX_MAGNITUDE_BYTES {
        return Err(WireError::VarintOverflow);
    }
    if size == 0 {
        if negative {
            return Err(WireError::NonCanonical);
        }
        return Ok((false, 0, 1));
    }

    let body = &buf[1..];
    if body.len() < size {
        return Err(WireError::truncated(size, body.len()));
    }
    if body[0] == 0 {
        return Err(WireError::NonCanonical);
    }

    let magnitude = body[..size]
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
    Ok((negative, magnitude, 1 + size))
}

/// Decodes a varint length followed by that many bytes.
///
/// Returns the slice (sharing no storage with `buf`) and the total number
/// of bytes consumed, prefix included.
pub fn decode_length_prefixed_bytes(buf: &[u8]) -> Result<(Bytes, usize), WireError> {
    let (length, prefix_len) = decode_varint(buf)?;
    if length < 0 {
        return Err(WireError::NegativeLength(length));
    }

    let remaining = &buf[prefix_len..];
    let length = usize::try_from(length).map_err(|_| WireError::VarintOverflow)?;
    if remaining.len() < length {
        return Err(WireError::truncated(length, remaining.len()));
    }

    Ok((
        Bytes::copy_from_slice(&remaining[..length]),
        prefix_len + length,
    ))
}

/// Appends the canonical encoding of `value`.
pub fn encode_uvarint(out: &mut BytesMut, value: u64) {
    put_magnitude(out, false, value);
}

/// Appends the canonical encoding of `value`.
pub fn encode_varint(out: &mut BytesMut, value: i64) {
    put_magnitude(out, value < 0, value.unsigned_abs());
}

fn put_magnitude(out: &mut BytesMut, negative: bool, magnitude: u64) {
    if magnitude == 0 {
        out.put_u8(0);
        return;
    }
    let width = MAX_MAGNITUDE_BYTES - (magnitude.leading_zeros() as usize / 8);
    let header = width as u8 | if negative { NEGATIVE_FLAG } else { 0 };
    out.put_u8(header);
    out.put_slice(&magnitude.to_be_bytes()[MAX_MAGNITUDE_BYTES - width..]);
}

/// Appends a varint length prefix followed by `data`.
pub fn encode_length_prefixed_bytes(out: &mut BytesMut, data: &[u8]) {
    encode_uvarint(out, data.len() as u64);
    out.put_slice(data);
}

/// Encodes `value` as four big-endian bytes.
///
/// This is the response encoding for integer query results such as the
/// store size.
pub fn encode_fixed_u32(value: u32) -> Bytes {
    Bytes::copy_from_slice(&value.to_be_bytes())
}
