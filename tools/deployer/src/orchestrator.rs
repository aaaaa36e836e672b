//! Approve-then-deploy choreography.
//!
//! The allowance is granted to the address the contract *will* get, which is fixed by the
//! deployer's nonce at creation time. Both transactions are therefore derived from a single
//! nonce read `N`: the approval consumes `N`, the creation consumes `N + 1`. Callers must not
//! send other transactions from the deployer account while a run is in progress.

use alloy_primitives::{Address, Bytes, B256, U256};
use create_address::predict_create_address;
use reward_deploy_types::{
    AccountSigner, ContractArtifact, DeploymentIntent, Network, NetworkError,
    TransactionOutcome, UnsignedTransaction,
};
use tracing::{error, info, warn};

use crate::{
    abi::approve_calldata,
    errors::DeployError,
    nonce::{successor, NonceTracker},
    state::{Broadcast, Run, RunFailure, RunState, Step, TxRecord},
};

/// What the run deploys and how much it approves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardPlan {
    pub token: Address,
    /// Smallest token unit.
    pub reward_amount: U256,
    pub reward_period_days: u64,
}

impl RewardPlan {
    pub fn deployment_intent(&self) -> DeploymentIntent {
        DeploymentIntent {
            reward_period_days: U256::from(self.reward_period_days),
            token: self.token,
            reward_amount: self.reward_amount,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasLimits {
    pub approval: u64,
    pub deployment: u64,
}

/// Outcome of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentReport {
    pub account: Address,
    pub predicted: Address,
    /// Address reported by the network; equal to `predicted` unless the node omitted it.
    pub deployed: Address,
    pub approval_nonce: u64,
    pub approval_tx: B256,
    pub deployment_nonce: u64,
    pub deployment_tx: B256,
}

pub struct Orchestrator<'a, S, N, A> {
    signer: &'a S,
    network: &'a N,
    artifact: &'a A,
    plan: RewardPlan,
    gas: GasLimits,
}

type StepResult<T> = Result<T, (Step, DeployError)>;

fn at<E: Into<DeployError>>(step: Step) -> impl FnOnce(E) -> (Step, DeployError) {
    move |err| (step, err.into())
}

impl<'a, S, N, A> Orchestrator<'a, S, N, A>
where
    S: AccountSigner,
    N: Network + Sync,
    A: ContractArtifact,
{
    pub fn new(
        signer: &'a S,
        network: &'a N,
        artifact: &'a A,
        plan: RewardPlan,
        gas: GasLimits,
    ) -> Self {
        Self {
            signer,
            network,
            artifact,
            plan,
            gas,
        }
    }

    /// Run all steps once. A failed run is not resumable; call `run` again for a fresh attempt.
    pub async fn run(&self) -> Result<DeploymentReport, RunFailure> {
        let mut run = Run::new(self.signer.account_identity());
        match self.drive(&mut run).await {
            Ok(report) => Ok(report),
            Err((step, cause)) => {
                let failure = run.fail(step, cause);
                if let Some((step, tx)) = failure.in_doubt() {
                    error!(
                        step = %step,
                        tx = %tx.hash,
                        nonce = tx.nonce,
                        "transaction handed to the network with unknown outcome; check it before retrying"
                    );
                } else if failure.approval_orphaned() {
                    error!(
                        predicted = ?failure.predicted,
                        approval_tx = ?failure.approval.map(|tx| tx.hash),
                        "approval granted but no contract deployed at the predicted address; revoke it manually"
                    );
                } else {
                    warn!(
                        step = %failure.step,
                        last_state = ?failure.last_state,
                        state = ?failure.state(),
                        "deployment run failed"
                    );
                }
                Err(failure)
            }
        }
    }

    async fn drive(&self, run: &mut Run) -> StepResult<DeploymentReport> {
        let tracker = NonceTracker::new(self.network);
        let account = run.account;

        let approval_nonce = tracker
            .current_sequence_number(account)
            .await
            .map_err(at(Step::ReadNonce))?;
        run.advance(RunState::NonceRead);
        info!(%account, nonce = approval_nonce, "read deployer nonce");

        let deployment_nonce = successor(approval_nonce).map_err(at(Step::PredictAddress))?;
        let predicted = predict_create_address(account.as_slice(), deployment_nonce)
            .map_err(at(Step::PredictAddress))?;
        run.predicted = Some(predicted);
        run.advance(RunState::AddressPredicted);
        info!(%predicted, nonce = deployment_nonce, "predicted contract address");

        let intent = self.plan.deployment_intent();
        let approval = intent.approval_for(predicted);
        let gas_price = self
            .network
            .gas_price()
            .await
            .map_err(|e| (Step::SignApproval, DeployError::query(e)))?;
        let approval_tx = UnsignedTransaction {
            nonce: approval_nonce,
            to: Some(approval.token),
            value: U256::ZERO,
            data: Bytes::from(approve_calldata(&approval)),
            gas_limit: self.gas.approval,
            gas_price,
        };
        let signed = self
            .signer
            .sign_transaction(&approval_tx)
            .map_err(at(Step::SignApproval))?;
        let approval_hash = signed.hash;
        run.approval = Some(TxRecord::signed(approval_nonce, approval_hash));
        run.advance(RunState::ApprovalSigned);

        let outcome = self
            .network
            .submit(&signed)
            .await
            .map_err(|e| submission_failed(&mut run.approval, Step::SubmitApproval, e))?;
        run.advance(RunState::ApprovalSubmitted);
        info!(tx = %outcome.hash, nonce = approval_nonce, "approval submitted");
        require_confirmed(&mut run.approval, &outcome, Step::SubmitApproval)?;
        run.advance(RunState::ApprovalConfirmed);
        info!(spender = %predicted, amount = %approval.amount, "approval confirmed");

        // Anything else sent from the account since the first read has taken our slot.
        tracker
            .ensure_unchanged(account, deployment_nonce)
            .await
            .map_err(|e| {
                if let DeployError::SequenceDrift { expected, found } = &e {
                    warn!(expected, found, "deployer nonce moved during the run");
                }
                (Step::RevalidateNonce, e)
            })?;

        let creation_code = self
            .artifact
            .creation_code(&intent)
            .map_err(at(Step::SignDeployment))?;
        let gas_price = self
            .network
            .gas_price()
            .await
            .map_err(|e| (Step::SignDeployment, DeployError::query(e)))?;
        let deployment_tx = UnsignedTransaction {
            nonce: deployment_nonce,
            to: None,
            value: U256::ZERO,
            data: Bytes::from(creation_code),
            gas_limit: self.gas.deployment,
            gas_price,
        };
        let signed = self
            .signer
            .sign_transaction(&deployment_tx)
            .map_err(at(Step::SignDeployment))?;
        run.deployment = Some(TxRecord::signed(deployment_nonce, signed.hash));

        let outcome = self
            .network
            .submit(&signed)
            .await
            .map_err(|e| submission_failed(&mut run.deployment, Step::SubmitDeployment, e))?;
        require_confirmed(&mut run.deployment, &outcome, Step::SubmitDeployment)?;
        info!(tx = %outcome.hash, nonce = deployment_nonce, "deployment confirmed");

        let deployed = match outcome.contract_address {
            Some(actual) if actual != predicted => {
                return Err((
                    Step::VerifyAddress,
                    DeployError::AddressMismatch { predicted, actual },
                ));
            }
            Some(actual) => actual,
            None => {
                warn!(
                    %predicted,
                    "network did not report a contract address; trusting the prediction"
                );
                predicted
            }
        };
        run.advance(RunState::Deployed);

        Ok(DeploymentReport {
            account,
            predicted,
            deployed,
            approval_nonce,
            approval_tx: approval_hash,
            deployment_nonce,
            deployment_tx: outcome.hash,
        })
    }
}

fn submission_failed(
    record: &mut Option<TxRecord>,
    step: Step,
    err: NetworkError,
) -> (Step, DeployError) {
    let err = DeployError::submission(err);
    if let (Some(tx), DeployError::Transport(_)) = (record.as_mut(), &err) {
        tx.broadcast = Broadcast::Unknown;
    }
    (step, err)
}

fn require_confirmed(
    record: &mut Option<TxRecord>,
    outcome: &TransactionOutcome,
    step: Step,
) -> StepResult<()> {
    let Some(tx) = record.as_mut() else {
        return Ok(());
    };
    if outcome.confirmed {
        tx.broadcast = Broadcast::Confirmed;
        Ok(())
    } else {
        tx.broadcast = Broadcast::Reverted;
        Err((step, DeployError::Rejected(format!("transaction {} reverted", outcome.hash))))
    }
}
