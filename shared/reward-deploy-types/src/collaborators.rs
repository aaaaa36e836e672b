use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::{
    intents::DeploymentIntent,
    transaction::{SignedTransaction, TransactionOutcome, UnsignedTransaction},
};

/// Errors reported by the network collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// The node could not be reached or did not answer.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The node refused the request (insufficient funds, bad nonce, revert, ...).
    #[error("rejected by the network: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("signing failed: {0}")]
pub struct SigningError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact has no bytecode")]
    MissingBytecode,
    #[error("artifact bytecode is not valid hex: {0}")]
    InvalidBytecode(String),
    #[error("artifact bytecode has unresolved library links")]
    UnlinkedBytecode,
}

/// Holder of the deployer key.
pub trait AccountSigner {
    /// Address of the account whose nonces are consumed.
    fn account_identity(&self) -> Address;

    fn sign_transaction(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, SigningError>;
}

/// Chain access, implemented over JSON-RPC in production and by stubs in tests.
#[async_trait]
pub trait Network {
    /// Number of transactions sent from `account`, including pending ones.
    async fn sequence_number(&self, account: Address) -> Result<u64, NetworkError>;

    async fn gas_price(&self) -> Result<U256, NetworkError>;

    /// Broadcast `tx` and wait until it is included (or known to have failed).
    async fn submit(&self, tx: &SignedTransaction) -> Result<TransactionOutcome, NetworkError>;
}

/// Compiled contract that can produce its creation code.
pub trait ContractArtifact {
    /// Bytecode followed by the ABI-encoded constructor arguments.
    fn creation_code(&self, intent: &DeploymentIntent) -> Result<Vec<u8>, ArtifactError>;
}
