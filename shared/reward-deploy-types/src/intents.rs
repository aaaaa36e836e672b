use alloy_primitives::{Address, U256};

/// Authorisation to be granted to the not-yet-deployed reward contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApprovalIntent {
    /// ERC-20 token the allowance is granted on.
    pub token: Address,
    /// Predicted address of the reward contract.
    pub spender: Address,
    /// Allowance in the token's smallest unit.
    pub amount: U256,
}

/// Constructor arguments of the reward contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentIntent {
    pub reward_period_days: U256,
    pub token: Address,
    pub reward_amount: U256,
}

impl DeploymentIntent {
    /// The allowance the deployed contract needs to pay out its reward.
    pub fn approval_for(&self, spender: Address) -> ApprovalIntent {
        ApprovalIntent {
            token: self.token,
            spender,
            amount: self.reward_amount,
        }
    }
}
