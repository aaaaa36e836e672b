//! Per-run state machine.
//!
//! A run only moves forward. Once it fails it stays failed, and the record of what was signed
//! and broadcast is handed to the caller so that orphaned approvals can be cleaned up by hand.

use std::fmt;

use alloy_primitives::{Address, B256};

use crate::errors::DeployError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Init,
    NonceRead,
    AddressPredicted,
    ApprovalSigned,
    ApprovalSubmitted,
    ApprovalConfirmed,
    Deployed,
    Failed,
}

impl RunState {
    /// The only state a successful step may move to.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::NonceRead),
            Self::NonceRead => Some(Self::AddressPredicted),
            Self::AddressPredicted => Some(Self::ApprovalSigned),
            Self::ApprovalSigned => Some(Self::ApprovalSubmitted),
            Self::ApprovalSubmitted => Some(Self::ApprovalConfirmed),
            Self::ApprovalConfirmed => Some(Self::Deployed),
            Self::Deployed | Self::Failed => None,
        }
    }

    /// `Init` may fail too: the first nonce read happens before any state is reached.
    pub fn can_fail(self) -> bool {
        !matches!(self, Self::Deployed | Self::Failed)
    }
}

/// Unit of work inside a run; failures are attributed to one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    ReadNonce,
    PredictAddress,
    SignApproval,
    SubmitApproval,
    RevalidateNonce,
    SignDeployment,
    SubmitDeployment,
    VerifyAddress,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadNonce => "read nonce",
            Self::PredictAddress => "predict address",
            Self::SignApproval => "sign approval",
            Self::SubmitApproval => "submit approval",
            Self::RevalidateNonce => "revalidate nonce",
            Self::SignDeployment => "sign deployment",
            Self::SubmitDeployment => "submit deployment",
            Self::VerifyAddress => "verify deployed address",
        };
        f.write_str(name)
    }
}

/// How far a signed transaction got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Broadcast {
    /// Signed, never handed to the network.
    NotSent,
    /// Submission failed in transit; the node may or may not have it.
    Unknown,
    /// Included, but did not succeed.
    Reverted,
    Confirmed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxRecord {
    pub nonce: u64,
    pub hash: B256,
    pub broadcast: Broadcast,
}

impl TxRecord {
    pub fn signed(nonce: u64, hash: B256) -> Self {
        Self {
            nonce,
            hash,
            broadcast: Broadcast::NotSent,
        }
    }
}

/// Progress of a single run.
#[derive(Debug)]
pub struct Run {
    pub account: Address,
    state: RunState,
    pub predicted: Option<Address>,
    pub approval: Option<TxRecord>,
    pub deployment: Option<TxRecord>,
}

impl Run {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            state: RunState::Init,
            predicted: None,
            approval: None,
            deployment: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Move to `next`, which must be the successor of the current state.
    pub fn advance(&mut self, next: RunState) {
        debug_assert_eq!(self.state.successor(), Some(next), "out of order transition");
        tracing::debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    pub fn fail(self, step: Step, cause: DeployError) -> RunFailure {
        debug_assert!(self.state.can_fail(), "{:?} cannot fail", self.state);
        RunFailure {
            step,
            last_state: self.state,
            cause,
            account: self.account,
            predicted: self.predicted,
            approval: self.approval,
            deployment: self.deployment,
        }
    }
}

/// A stopped run: which step failed, how far it got, and what may already be on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub step: Step,
    /// Last state reached before the run moved to `Failed`.
    pub last_state: RunState,
    pub cause: DeployError,
    pub account: Address,
    pub predicted: Option<Address>,
    pub approval: Option<TxRecord>,
    pub deployment: Option<TxRecord>,
}

impl RunFailure {
    pub fn state(&self) -> RunState {
        RunState::Failed
    }

    /// An allowance exists for an address that holds no reward contract.
    pub fn approval_orphaned(&self) -> bool {
        let approved = self.approval.is_some_and(|tx| tx.broadcast == Broadcast::Confirmed);
        let no_contract = self.step == Step::VerifyAddress
            || self.deployment.map_or(true, |tx| {
                matches!(tx.broadcast, Broadcast::NotSent | Broadcast::Reverted)
            });
        approved && no_contract
    }

    /// Whether anything may have reached the network, so a naive retry could double-submit.
    pub fn broadcast_attempted(&self) -> bool {
        [self.approval, self.deployment]
            .iter()
            .flatten()
            .any(|tx| tx.broadcast != Broadcast::NotSent)
    }

    /// The transaction, if any, that was handed to the node without a known result.
    pub fn in_doubt(&self) -> Option<(Step, TxRecord)> {
        [
            (Step::SubmitApproval, self.approval),
            (Step::SubmitDeployment, self.deployment),
        ]
        .into_iter()
        .find_map(|(step, tx)| {
            tx.filter(|tx| tx.broadcast == Broadcast::Unknown)
                .map(|tx| (step, tx))
        })
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "deployment run failed at step `{}` (after {:?}): {}",
            self.step, self.last_state, self.cause
        )?;
        if let Some(predicted) = self.predicted {
            write!(f, "\n  predicted address: {predicted}")?;
        }
        for (label, tx) in [("approval", self.approval), ("deployment", self.deployment)] {
            if let Some(tx) = tx {
                write!(f, "\n  {label} tx {} (nonce {}): {:?}", tx.hash, tx.nonce, tx.broadcast)?;
            }
        }
        match self.in_doubt() {
            Some((Step::SubmitDeployment, tx)) => write!(
                f,
                "\n  deployment status unknown; check tx {} before revoking the approval",
                tx.hash
            )?,
            Some((_, tx)) => write!(
                f,
                "\n  approval status unknown; check tx {} before restarting",
                tx.hash
            )?,
            None if self.approval_orphaned() => {
                write!(f, "\n  the approval is orphaned and should be revoked manually")?
            }
            None if !self.broadcast_attempted() => {
                write!(f, "\n  nothing was broadcast; the run can be restarted")?
            }
            None => {}
        }
        Ok(())
    }
}

// The cause is already part of the message.
impl std::error::Error for RunFailure {}
