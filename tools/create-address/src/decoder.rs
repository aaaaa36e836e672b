//! Strict RLP decoder.
//!
//! Accepts exactly the encodings produced by [`crate::rlp::encode`]; anything non-canonical is
//! rejected so that decoding can serve as an injectivity check on the encoder.

use crate::{errors::DecodeError, rlp::RlpItem};

const SHORT_PAYLOAD_MAX: usize = crate::rlp::SHORT_PAYLOAD_MAX;

/// Decode a single top-level item; the whole input must be consumed.
pub fn decode(bytes: &[u8]) -> Result<RlpItem, DecodeError> {
    let mut i = 0usize;
    let item = read_item(bytes, &mut i)?;
    if i != bytes.len() {
        return Err(DecodeError::TrailingBytes(bytes.len() - i));
    }
    Ok(item)
}

fn read_item(bytes: &[u8], i: &mut usize) -> Result<RlpItem, DecodeError> {
    let prefix = *bytes.get(*i).ok_or(DecodeError::Truncated)?;
    *i += 1;

    match prefix {
        0x00..=0x7f => Ok(RlpItem::Bytes(vec![prefix])),
        0x80..=0xb7 => {
            let len = (prefix - 0x80) as usize;
            let payload = read_vec(bytes, i, len)?;
            if len == 1 && payload[0] < 0x80 {
                return Err(DecodeError::NonCanonicalSingleByte);
            }
            Ok(RlpItem::Bytes(payload))
        }
        0xb8..=0xbf => {
            let len = read_long_length(bytes, i, (prefix - 0xb7) as usize)?;
            Ok(RlpItem::Bytes(read_vec(bytes, i, len)?))
        }
        0xc0..=0xf7 => {
            let len = (prefix - 0xc0) as usize;
            read_list(bytes, i, len)
        }
        0xf8..=0xff => {
            let len = read_long_length(bytes, i, (prefix - 0xf7) as usize)?;
            read_list(bytes, i, len)
        }
    }
}

fn read_list(bytes: &[u8], i: &mut usize, len: usize) -> Result<RlpItem, DecodeError> {
    let end = i.checked_add(len).ok_or(DecodeError::LengthOverflow)?;
    if bytes.len() < end {
        return Err(DecodeError::Truncated);
    }
    let payload = &bytes[..end];
    let mut items = Vec::new();
    while *i < end {
        items.push(read_item(payload, i)?);
    }
    Ok(RlpItem::List(items))
}

fn read_long_length(bytes: &[u8], i: &mut usize, width: usize) -> Result<usize, DecodeError> {
    let len_bytes = read_vec(bytes, i, width)?;
    if len_bytes[0] == 0 {
        return Err(DecodeError::NonCanonicalLength);
    }
    let mut len = 0u64;
    for b in len_bytes {
        len = (len << 8) | b as u64;
    }
    let len = usize::try_from(len).map_err(|_| DecodeError::LengthOverflow)?;
    if len <= SHORT_PAYLOAD_MAX {
        return Err(DecodeError::NonCanonicalLength);
    }
    Ok(len)
}

fn read_vec(bytes: &[u8], i: &mut usize, len: usize) -> Result<Vec<u8>, DecodeError> {
    let end = i.checked_add(len).ok_or(DecodeError::LengthOverflow)?;
    if bytes.len() < end {
        return Err(DecodeError::Truncated);
    }
    let out = bytes[*i..end].to_vec();
    *i = end;
    Ok(out)
}
