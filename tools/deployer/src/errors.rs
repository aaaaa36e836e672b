use alloy_primitives::Address;
use create_address::{EncodingError, InvalidInputError, PredictError};
use reward_deploy_types::{ArtifactError, NetworkError, SigningError};

/// Why a deployment run stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),
    #[error("invalid account identity: {0}")]
    InvalidInput(#[from] InvalidInputError),
    /// Reading chain state (nonce, gas price) failed.
    #[error("query failed: {0}")]
    Query(String),
    /// Submitting a transaction failed without a verdict from the network.
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("rejected: {0}")]
    Rejected(String),
    /// Another transaction from the deployer consumed the nonce reserved for the deployment.
    #[error("nonce drifted: expected {expected}, network reports {found}")]
    SequenceDrift { expected: u64, found: u64 },
    #[error("contract deployed at {actual}, but the allowance was granted to {predicted}")]
    AddressMismatch { predicted: Address, actual: Address },
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl DeployError {
    /// Network failure while reading state.
    pub fn query(err: NetworkError) -> Self {
        match err {
            NetworkError::Transport(msg) | NetworkError::Rejected(msg) => Self::Query(msg),
        }
    }

    /// Network failure while submitting a transaction.
    pub fn submission(err: NetworkError) -> Self {
        match err {
            NetworkError::Transport(msg) => Self::Transport(msg),
            NetworkError::Rejected(msg) => Self::Rejected(msg),
        }
    }
}

impl From<PredictError> for DeployError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::InvalidInput(err) => Self::InvalidInput(err),
            PredictError::Encoding(err) => Self::Encoding(err),
        }
    }
}
