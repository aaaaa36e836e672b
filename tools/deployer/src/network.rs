//! JSON-RPC access to the deployment network.

use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::{BlockId, BlockNumber, Bytes, TransactionReceipt, TxHash, U64};
use reward_deploy_types::{Network, NetworkError, SignedTransaction, TransactionOutcome};

use crate::compat::{from_ethers_u256, from_h160, from_h256, to_h160};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// `Network` over an HTTP JSON-RPC endpoint.
#[derive(Debug)]
pub struct EthersNetwork {
    provider: Provider<Http>,
    confirmations: usize,
}

impl EthersNetwork {
    pub fn connect(endpoint: &str, confirmations: usize) -> Result<Self> {
        let provider = Provider::<Http>::try_from(endpoint)
            .with_context(|| format!("invalid RPC endpoint {endpoint}"))?
            .interval(DEFAULT_POLL_INTERVAL);
        Ok(Self {
            provider,
            confirmations,
        })
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .context("failed querying chain id")?;
        Ok(chain_id.as_u64())
    }
}

/// Error responses from the node are verdicts; everything else is a transport problem.
fn classify(err: ProviderError) -> NetworkError {
    if err.as_error_response().is_some() {
        NetworkError::Rejected(err.to_string())
    } else {
        NetworkError::Transport(err.to_string())
    }
}

/// Like [`classify`], for the reply to `eth_sendRawTransaction`. A node that already holds the
/// transaction answers with an error response, but the transaction is in flight.
fn classify_send(err: ProviderError) -> NetworkError {
    let already_pooled = err.as_error_response().is_some_and(|resp| {
        let message = resp.message.to_ascii_lowercase();
        ALREADY_POOLED.iter().any(|marker| message.contains(marker))
    });
    if already_pooled {
        NetworkError::Transport(format!("node already holds the transaction: {err}"))
    } else {
        classify(err)
    }
}

const ALREADY_POOLED: &[&str] = &["already known", "known transaction", "already imported"];

/// Once the node has accepted the raw transaction, no later error is a verdict on it.
fn after_broadcast(hash: TxHash, err: ProviderError) -> NetworkError {
    NetworkError::Transport(format!("transaction {hash:?} sent, awaiting receipt failed: {err}"))
}

fn outcome_from_receipt(
    hash: TxHash,
    receipt: Option<TransactionReceipt>,
) -> Result<TransactionOutcome, NetworkError> {
    let receipt = receipt.ok_or_else(|| {
        NetworkError::Transport(format!("transaction {hash:?} dropped before inclusion"))
    })?;
    Ok(TransactionOutcome {
        hash: from_h256(receipt.transaction_hash),
        confirmed: receipt.status == Some(U64::from(1u64)),
        contract_address: receipt.contract_address.map(from_h160),
    })
}

#[async_trait]
impl Network for EthersNetwork {
    async fn sequence_number(&self, account: Address) -> Result<u64, NetworkError> {
        // Pending, so that a transaction still in the mempool is not handed out twice.
        let count = self
            .provider
            .get_transaction_count(to_h160(account), Some(BlockId::Number(BlockNumber::Pending)))
            .await
            .map_err(classify)?;
        if count > ethers::types::U256::from(u64::MAX) {
            return Err(NetworkError::Transport(format!("nonce {count} out of range")));
        }
        Ok(count.as_u64())
    }

    async fn gas_price(&self) -> Result<U256, NetworkError> {
        let price = self.provider.get_gas_price().await.map_err(classify)?;
        Ok(from_ethers_u256(price))
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TransactionOutcome, NetworkError> {
        let pending = self
            .provider
            .send_raw_transaction(Bytes::from(tx.raw.to_vec()))
            .await
            .map_err(classify_send)?;
        let hash = pending.tx_hash();
        tracing::debug!(tx = ?hash, confirmations = self.confirmations, "awaiting receipt");

        let receipt = pending
            .confirmations(self.confirmations)
            .await
            .map_err(|e| after_broadcast(hash, e))?;
        outcome_from_receipt(hash, receipt)
    }
}
