//! Types shared between the address predictor and the deployer.
//!
//! The collaborator traits describe everything the orchestration core needs from the outside
//! world: a signer that knows the deployer account, a network that reports nonces and accepts
//! signed transactions, and a build artifact that produces creation code.

pub mod collaborators;
pub mod intents;
pub mod transaction;

pub use collaborators::{
    AccountSigner, ArtifactError, ContractArtifact, Network, NetworkError, SigningError,
};
pub use intents::{ApprovalIntent, DeploymentIntent};
pub use transaction::{SignedTransaction, TransactionOutcome, UnsignedTransaction};
