//! Conversions between alloy primitives (used by the core) and ethers types (used on the wire).

use alloy_primitives::{Address, B256, U256};
use ethers::types::{H160, H256, U256 as EthersU256};

pub fn to_h160(address: Address) -> H160 {
    H160::from_slice(address.as_slice())
}

pub fn from_h160(address: H160) -> Address {
    Address::from_slice(address.as_bytes())
}

pub fn from_h256(hash: H256) -> B256 {
    B256::from_slice(hash.as_bytes())
}

pub fn to_ethers_u256(value: U256) -> EthersU256 {
    EthersU256::from_big_endian(&value.to_be_bytes::<32>())
}

pub fn from_ethers_u256(value: EthersU256) -> U256 {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    U256::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_round_trips() {
        let a = address!("94dea49b71c2325724af7abef02590f967595380");
        assert_eq!(from_h160(to_h160(a)), a);
        let v = U256::from(10u64).pow(U256::from(18u64)) * U256::from(7u64);
        assert_eq!(from_ethers_u256(to_ethers_u256(v)), v);
        assert_eq!(to_ethers_u256(v), EthersU256::exp10(18) * EthersU256::from(7u64));
    }

    #[test]
    fn test_prediction_matches_ethers() {
        let deployer = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        for nonce in [0u64, 1, 6, 127, 128, 255, 256, 1 << 20, u64::MAX] {
            assert_eq!(
                to_h160(create_address::create_address(deployer, nonce)),
                ethers::utils::get_contract_address(to_h160(deployer), nonce),
                "nonce {nonce}"
            );
        }
    }
}
