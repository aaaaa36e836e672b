//! Deployer nonce bookkeeping.
//!
//! The network owns the counter; this only reads it. Nothing is cached between calls.

use alloy_primitives::Address;
use reward_deploy_types::Network;

use crate::errors::DeployError;

pub struct NonceTracker<'a, N> {
    network: &'a N,
}

impl<'a, N: Network + Sync> NonceTracker<'a, N> {
    pub fn new(network: &'a N) -> Self {
        Self { network }
    }

    /// Nonce the account's next transaction will consume.
    pub async fn current_sequence_number(&self, account: Address) -> Result<u64, DeployError> {
        self.network
            .sequence_number(account)
            .await
            .map_err(DeployError::query)
    }

    /// Nonce of the transaction after the next one.
    ///
    /// Only meaningful if nothing else is sent from `account` in between.
    pub async fn next_sequence_number(&self, account: Address) -> Result<u64, DeployError> {
        successor(self.current_sequence_number(account).await?)
    }

    /// Fail with `SequenceDrift` unless the network still expects `expected` next.
    pub async fn ensure_unchanged(
        &self,
        account: Address,
        expected: u64,
    ) -> Result<(), DeployError> {
        let found = self.current_sequence_number(account).await?;
        if found != expected {
            return Err(DeployError::SequenceDrift { expected, found });
        }
        Ok(())
    }
}

pub fn successor(nonce: u64) -> Result<u64, DeployError> {
    nonce
        .checked_add(1)
        .ok_or_else(|| DeployError::Query(format!("nonce {nonce} has no successor")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{StubNetwork, DEPLOYER};

    #[tokio::test]
    async fn test_next_is_current_plus_one() {
        let network = StubNetwork::new(DEPLOYER, 41);
        let tracker = NonceTracker::new(&network);
        assert_eq!(tracker.current_sequence_number(DEPLOYER).await.unwrap(), 41);
        assert_eq!(tracker.next_sequence_number(DEPLOYER).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_reads_are_not_cached() {
        let network = StubNetwork::new(DEPLOYER, 3);
        let tracker = NonceTracker::new(&network);
        assert!(tracker.ensure_unchanged(DEPLOYER, 3).await.is_ok());
        network.state.lock().unwrap().nonce = 4;
        assert_eq!(
            tracker.ensure_unchanged(DEPLOYER, 3).await,
            Err(DeployError::SequenceDrift { expected: 3, found: 4 })
        );
    }

    #[tokio::test]
    async fn test_query_failure() {
        let network = StubNetwork::new(DEPLOYER, 3).with(|s| s.fail_queries = true);
        let tracker = NonceTracker::new(&network);
        assert!(matches!(
            tracker.current_sequence_number(DEPLOYER).await,
            Err(DeployError::Query(_))
        ));
    }

    #[test]
    fn test_successor_overflow() {
        assert_eq!(successor(6).unwrap(), 7);
        assert!(matches!(successor(u64::MAX), Err(DeployError::Query(_))));
    }
}
