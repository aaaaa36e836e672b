//! Off-chain prediction of `CREATE` contract addresses.
//!
//! An account's next contract lands at `keccak256(rlp([sender, nonce]))[12..]`. Everything here
//! is pure and deterministic; the deployer relies on it matching the network bit-for-bit.

pub mod decoder;
pub mod errors;
pub mod predictor;
pub mod rlp;

pub use errors::{DecodeError, EncodingError, InvalidInputError, PredictError};
pub use predictor::{create_address, keccak256_bytes, predict_create_address, ADDRESS_WIDTH};
pub use rlp::{encode, encode_list, RlpItem};
