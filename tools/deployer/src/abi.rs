//! ABI surface of the contracts the deployer talks to.

use alloy_sol_types::{sol, SolCall, SolConstructor};
use reward_deploy_types::{ApprovalIntent, DeploymentIntent};

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Reward contract; pulls `rewardAmount` of `token` from the deployer's allowance.
    contract Bank {
        constructor(uint256 timePeriodInDays, address token, uint256 rewardAmount);
    }
}

/// Calldata for `token.approve(spender, amount)`.
pub fn approve_calldata(intent: &ApprovalIntent) -> Vec<u8> {
    IERC20::approveCall {
        spender: intent.spender,
        amount: intent.amount,
    }
    .abi_encode()
}

/// ABI-encoded constructor arguments, appended to the creation bytecode.
pub fn constructor_args(intent: &DeploymentIntent) -> Vec<u8> {
    Bank::constructorCall {
        timePeriodInDays: intent.reward_period_days,
        token: intent.token,
        rewardAmount: intent.reward_amount,
    }
    .abi_encode()
}
