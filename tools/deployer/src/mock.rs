//! In-memory chain used by the orchestrator tests.

use std::sync::Mutex;

use alloy_primitives::{address, Address, Bytes, U256};
use async_trait::async_trait;
use create_address::{create_address, encode_list, keccak256_bytes, RlpItem};
use reward_deploy_types::{
    AccountSigner, ArtifactError, ContractArtifact, DeploymentIntent, Network, NetworkError,
    SignedTransaction, SigningError, TransactionOutcome, UnsignedTransaction,
};

pub const DEPLOYER: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
pub const TOKEN: Address = address!("1111111111111111111111111111111111111111");

/// Signs by hashing the transaction fields; good enough to give every transaction a distinct hash.
pub struct StubSigner {
    pub account: Address,
}

impl AccountSigner for StubSigner {
    fn account_identity(&self) -> Address {
        self.account
    }

    fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, SigningError> {
        let raw = encode_list(&[
            RlpItem::uint(tx.nonce),
            RlpItem::u256(tx.gas_price),
            RlpItem::uint(tx.gas_limit),
            RlpItem::bytes(tx.to.map(|a| a.to_vec()).unwrap_or_default()),
            RlpItem::u256(tx.value),
            RlpItem::bytes(&tx.data),
            RlpItem::address(self.account),
        ])
        .map_err(|e| SigningError(e.to_string()))?;
        Ok(SignedTransaction {
            transaction: tx.clone(),
            hash: keccak256_bytes(&raw),
            raw: Bytes::from(raw),
        })
    }
}

/// Knobs for the stub chain.
#[derive(Default)]
pub struct StubState {
    /// Next nonce the chain expects from the deployer.
    pub nonce: u64,
    pub gas_price: u64,
    pub submitted: Vec<SignedTransaction>,
    pub nonce_reads: usize,
    pub fail_queries: bool,
    pub reject_approval: Option<String>,
    pub revert_approval: bool,
    pub reject_creation: Option<String>,
    pub transport_fail_creation: bool,
    /// The approval reaches the pool, then waiting for its receipt fails.
    pub lose_approval_receipt: bool,
    /// Another transaction from the deployer lands right after the approval.
    pub interleave_after_approval: bool,
    /// Overrides the contract address reported for creations.
    pub report_address: Option<Option<Address>>,
}

pub struct StubNetwork {
    account: Address,
    pub state: Mutex<StubState>,
}

impl StubNetwork {
    pub fn new(account: Address, nonce: u64) -> Self {
        Self {
            account,
            state: Mutex::new(StubState {
                nonce,
                gas_price: 1_000_000_000,
                ..Default::default()
            }),
        }
    }

    pub fn with(self, f: impl FnOnce(&mut StubState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.state.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn sequence_number(&self, account: Address) -> Result<u64, NetworkError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_queries {
            return Err(NetworkError::Transport("connection refused".into()));
        }
        state.nonce_reads += 1;
        Ok(if account == self.account { state.nonce } else { 0 })
    }

    async fn gas_price(&self) -> Result<U256, NetworkError> {
        let state = self.state.lock().unwrap();
        if state.fail_queries {
            return Err(NetworkError::Transport("connection refused".into()));
        }
        Ok(U256::from(state.gas_price))
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TransactionOutcome, NetworkError> {
        let mut state = self.state.lock().unwrap();
        let creation = tx.transaction.is_creation();

        if creation && state.transport_fail_creation {
            return Err(NetworkError::Transport("connection reset".into()));
        }
        let rejection = if creation {
            state.reject_creation.clone()
        } else {
            state.reject_approval.clone()
        };
        if let Some(reason) = rejection {
            return Err(NetworkError::Rejected(reason));
        }
        if tx.nonce() != state.nonce {
            return Err(NetworkError::Rejected(format!(
                "nonce {} does not match account nonce {}",
                tx.nonce(),
                state.nonce
            )));
        }

        state.nonce += 1;
        state.submitted.push(tx.clone());
        if !creation && state.lose_approval_receipt {
            return Err(NetworkError::Transport(format!(
                "transaction {} sent, awaiting receipt failed: limit exceeded",
                tx.hash
            )));
        }
        let confirmed = creation || !state.revert_approval;
        if !creation && state.interleave_after_approval {
            state.nonce += 1;
        }

        let contract_address = if creation {
            state
                .report_address
                .unwrap_or(Some(create_address(self.account, tx.nonce())))
        } else {
            None
        };
        Ok(TransactionOutcome {
            hash: tx.hash,
            confirmed,
            contract_address,
        })
    }
}

pub struct StubArtifact {
    pub broken: bool,
}

impl ContractArtifact for StubArtifact {
    fn creation_code(&self, intent: &DeploymentIntent) -> Result<Vec<u8>, ArtifactError> {
        if self.broken {
            return Err(ArtifactError::MissingBytecode);
        }
        let mut code = vec![0x60, 0x80, 0x60, 0x40, 0x52];
        code.extend_from_slice(&crate::abi::constructor_args(intent));
        Ok(code)
    }
}
