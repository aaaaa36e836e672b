//! Recursive length prefix serialisation.
//!
//! Only the subset needed for address derivation (and its tests) is provided: byte strings,
//! unsigned integers as minimal big-endian strings, and nested lists.

use alloy_primitives::{Address, U256};

use crate::errors::EncodingError;

const OFFSET_SHORT_STRING: u8 = 0x80;
const OFFSET_LONG_STRING: u8 = 0xb7;
const OFFSET_SHORT_LIST: u8 = 0xc0;
const OFFSET_LONG_LIST: u8 = 0xf7;

/// Longest payload that still uses the short (single prefix byte) form.
pub const SHORT_PAYLOAD_MAX: usize = 55;

/// Widest big-endian length allowed in a long-form prefix.
const MAX_LENGTH_OF_LENGTH: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self::Bytes(bytes.as_ref().to_vec())
    }

    /// Minimal big-endian form; zero is the empty string.
    pub fn uint(value: u64) -> Self {
        Self::uint_be(&value.to_be_bytes())
    }

    pub fn u256(value: U256) -> Self {
        Self::uint_be(&value.to_be_bytes::<32>())
    }

    /// Integer given as big-endian bytes, with leading zero bytes stripped.
    pub fn uint_be(bytes: &[u8]) -> Self {
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self::Bytes(bytes[first..].to_vec())
    }

    pub fn address(address: Address) -> Self {
        Self::bytes(address.as_slice())
    }
}

/// Encode an item into its canonical RLP form.
pub fn encode(item: &RlpItem) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::new();
    encode_into(item, &mut buf)?;
    Ok(buf)
}

/// Encode a list of items; shorthand for `encode(&RlpItem::List(..))`.
pub fn encode_list(items: &[RlpItem]) -> Result<Vec<u8>, EncodingError> {
    let mut payload = Vec::new();
    for item in items {
        encode_into(item, &mut payload)?;
    }
    let mut buf = Vec::with_capacity(payload.len() + 1 + MAX_LENGTH_OF_LENGTH);
    push_header(&mut buf, payload.len(), OFFSET_SHORT_LIST, OFFSET_LONG_LIST)?;
    buf.extend_from_slice(&payload);
    Ok(buf)
}

fn encode_into(item: &RlpItem, buf: &mut Vec<u8>) -> Result<(), EncodingError> {
    match item {
        RlpItem::Bytes(bytes) => {
            if bytes.len() == 1 && bytes[0] < OFFSET_SHORT_STRING {
                buf.push(bytes[0]);
            } else {
                push_header(buf, bytes.len(), OFFSET_SHORT_STRING, OFFSET_LONG_STRING)?;
                buf.extend_from_slice(bytes);
            }
        }
        RlpItem::List(items) => {
            buf.extend_from_slice(&encode_list(items)?);
        }
    }
    Ok(())
}

fn push_header(
    buf: &mut Vec<u8>,
    len: usize,
    short_offset: u8,
    long_offset: u8,
) -> Result<(), EncodingError> {
    if len <= SHORT_PAYLOAD_MAX {
        buf.push(short_offset + len as u8);
        return Ok(());
    }
    let len_be = u64::try_from(len)
        .map_err(|_| EncodingError::PayloadTooLong(len))?
        .to_be_bytes();
    let first = len_be.iter().position(|b| *b != 0).unwrap_or(len_be.len());
    let len_bytes = &len_be[first..];
    if len_bytes.len() > MAX_LENGTH_OF_LENGTH {
        return Err(EncodingError::PayloadTooLong(len));
    }
    buf.push(long_offset + len_bytes.len() as u8);
    buf.extend_from_slice(len_bytes);
    Ok(())
}
