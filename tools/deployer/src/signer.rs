//! Local key signing.

use alloy_primitives::{Address, Bytes};
use anyhow::{anyhow, bail, Context, Result};
use create_address::keccak256_bytes;
use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer};
use ethers::types::{transaction::eip2718::TypedTransaction, TransactionRequest};
use reward_deploy_types::{AccountSigner, SignedTransaction, SigningError, UnsignedTransaction};

use crate::compat::{from_h160, to_ethers_u256, to_h160};

/// Key material supplied on the command line or via the environment.
#[derive(Clone, Default)]
pub struct Credential {
    pub private_key: Option<String>,
    pub mnemonic: Option<String>,
    pub mnemonic_index: u32,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field("mnemonic_index", &self.mnemonic_index)
            .finish()
    }
}

impl Credential {
    /// Resolve to a single wallet. If both a key and a mnemonic are given they must agree.
    pub fn wallet(&self) -> Result<LocalWallet> {
        let from_key = self.private_key.as_deref().map(wallet_from_key).transpose()?;
        let from_phrase = self
            .mnemonic
            .as_deref()
            .map(|phrase| wallet_from_mnemonic(phrase, self.mnemonic_index))
            .transpose()?;

        match (from_key, from_phrase) {
            (Some(key), Some(phrase)) if key.address() != phrase.address() => bail!(
                "private key ({:?}) and mnemonic ({:?}) resolve to different accounts",
                key.address(),
                phrase.address()
            ),
            (Some(wallet), _) | (None, Some(wallet)) => Ok(wallet),
            (None, None) => Err(anyhow!(
                "missing deployer key: provide --private-key or --mnemonic (or set PRIVATE_KEY/MNEMONIC)"
            )),
        }
    }
}

fn wallet_from_key(key: &str) -> Result<LocalWallet> {
    let key = key.trim();
    key.strip_prefix("0x")
        .unwrap_or(key)
        .parse::<LocalWallet>()
        .context("invalid private key")
}

fn wallet_from_mnemonic(phrase: &str, index: u32) -> Result<LocalWallet> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase.trim())
        .index(index)
        .context("invalid mnemonic derivation index")?
        .build()
        .context("invalid mnemonic")
}

/// `AccountSigner` backed by an in-memory secp256k1 key, producing legacy transactions.
#[derive(Debug, Clone)]
pub struct WalletSigner {
    wallet: LocalWallet,
}

impl WalletSigner {
    pub fn new(wallet: LocalWallet, chain_id: u64) -> Self {
        Self {
            wallet: wallet.with_chain_id(chain_id),
        }
    }
}

impl AccountSigner for WalletSigner {
    fn account_identity(&self) -> Address {
        from_h160(self.wallet.address())
    }

    fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, SigningError> {
        let mut request = TransactionRequest::new()
            .from(self.wallet.address())
            .nonce(tx.nonce)
            .gas(tx.gas_limit)
            .gas_price(to_ethers_u256(tx.gas_price))
            .value(to_ethers_u256(tx.value))
            .data(tx.data.to_vec())
            .chain_id(self.wallet.chain_id());
        if let Some(to) = tx.to {
            request = request.to(to_h160(to));
        }
        let typed: TypedTransaction = request.into();

        let signature = self
            .wallet
            .sign_transaction_sync(&typed)
            .map_err(|e| SigningError(e.to_string()))?;
        let raw = typed.rlp_signed(&signature);

        Ok(SignedTransaction {
            transaction: tx.clone(),
            hash: keccak256_bytes(&raw),
            raw: Bytes::from(raw.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};
    use create_address::decoder::decode;
    use create_address::RlpItem;

    // First account of the well-known development mnemonic.
    const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

    #[test]
    fn test_credential_sources_agree() {
        let by_key = Credential {
            private_key: Some(DEV_KEY.to_string()),
            ..Default::default()
        };
        let by_phrase = Credential {
            mnemonic: Some(DEV_MNEMONIC.to_string()),
            ..Default::default()
        };
        let both = Credential {
            private_key: Some(DEV_KEY.to_string()),
            mnemonic: Some(DEV_MNEMONIC.to_string()),
            mnemonic_index: 0,
        };
        for credential in [by_key, by_phrase, both] {
            assert_eq!(from_h160(credential.wallet().unwrap().address()), DEV_ADDRESS);
        }
    }

    #[test]
    fn test_credential_conflicts() {
        let mismatched = Credential {
            private_key: Some(DEV_KEY.to_string()),
            mnemonic: Some(DEV_MNEMONIC.to_string()),
            mnemonic_index: 1,
        };
        assert!(mismatched.wallet().is_err());
        assert!(Credential::default().wallet().is_err());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential {
            private_key: Some(DEV_KEY.to_string()),
            ..Default::default()
        };
        assert!(!format!("{credential:?}").contains("ac0974"));
    }

    #[test]
    fn test_signs_legacy_transaction() {
        let wallet = Credential {
            private_key: Some(DEV_KEY.to_string()),
            ..Default::default()
        }
        .wallet()
        .unwrap();
        let signer = WalletSigner::new(wallet, 31337);
        assert_eq!(signer.account_identity(), DEV_ADDRESS);

        let tx = UnsignedTransaction {
            nonce: 5,
            to: None,
            value: U256::ZERO,
            data: Bytes::from(vec![0x60, 0x80]),
            gas_limit: 5_000_000,
            gas_price: U256::from(1_000_000_000u64),
        };
        let signed = signer.sign_transaction(&tx).unwrap();
        assert_eq!(signed.nonce(), 5);
        assert_eq!(signed.hash, keccak256_bytes(&signed.raw));

        // [nonce, gasPrice, gas, to, value, data, v, r, s]
        let RlpItem::List(fields) = decode(&signed.raw).unwrap() else {
            panic!("signed legacy transaction is not an RLP list");
        };
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0], RlpItem::uint(5));
        assert_eq!(fields[3], RlpItem::Bytes(vec![]));
        assert_eq!(fields[5], RlpItem::bytes([0x60, 0x80]));
        // EIP-155: v = chain_id * 2 + 35 + parity
        let RlpItem::Bytes(v) = &fields[6] else { panic!("v is not a string") };
        let v = v.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
        assert!(v == 31337 * 2 + 35 || v == 31337 * 2 + 36);
    }
}
