use alloy_primitives::{Address, FixedBytes};
use sha3::{Digest, Keccak256};

use crate::{
    errors::{InvalidInputError, PredictError},
    rlp::{encode_list, RlpItem},
};

/// Width of an account address in bytes.
pub const ADDRESS_WIDTH: usize = 20;

/// The address is the digest's low-order `ADDRESS_WIDTH` bytes.
const DIGEST_SUFFIX_OFFSET: usize = 32 - ADDRESS_WIDTH;

pub fn keccak256_bytes(bytes: &[u8]) -> FixedBytes<32> {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(out.as_slice());
    FixedBytes(b)
}

/// Predict the address of the contract created by `account` at `nonce`.
///
/// `account` is taken as raw bytes so that identities from untyped sources (CLI input, key
/// material) are width-checked here rather than truncated or padded somewhere upstream.
pub fn predict_create_address(account: &[u8], nonce: u64) -> Result<Address, PredictError> {
    if account.len() != ADDRESS_WIDTH {
        return Err(InvalidInputError::AccountWidth {
            expected: ADDRESS_WIDTH,
            actual: account.len(),
        }
        .into());
    }
    let encoded = encode_list(&[RlpItem::bytes(account), RlpItem::uint(nonce)])?;
    Ok(address_from_digest(&encoded))
}

/// Typed form of [`predict_create_address`].
pub fn create_address(account: Address, nonce: u64) -> Address {
    let encoded = encode_list(&[RlpItem::address(account), RlpItem::uint(nonce)])
        .unwrap_or_else(|_| unreachable!("[address, u64] is at most 30 bytes"));
    address_from_digest(&encoded)
}

fn address_from_digest(encoded: &[u8]) -> Address {
    let digest = keccak256_bytes(encoded);
    Address::from_slice(&digest[DIGEST_SUFFIX_OFFSET..])
}
