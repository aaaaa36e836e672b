//! Command-line / environment configuration.
//!
//! Everything is resolved once, at start-up, into a [`DeployConfig`]; the orchestrator never
//! reads the environment itself.

use std::path::PathBuf;

use alloy_primitives::{Address, U256};
use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use create_address::{InvalidInputError, ADDRESS_WIDTH};
use ethers::utils::parse_ether;

use crate::{
    compat::from_ethers_u256,
    orchestrator::{GasLimits, RewardPlan},
    signer::Credential,
};

/// Gas limit the approval transaction is sent with.
pub const DEFAULT_APPROVAL_GAS_LIMIT: u64 = 610_000;

/// Known networks and their defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NetworkPreset {
    /// Local node (ganache / anvil / hardhat).
    Development,
    /// Polygon Mumbai testnet.
    Mumbai,
}

impl NetworkPreset {
    pub fn name(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Mumbai => "mumbai",
        }
    }

    pub fn default_endpoint(self) -> Option<&'static str> {
        match self {
            Self::Development => Some("http://localhost:8545"),
            Self::Mumbai => None,
        }
    }

    /// `None` accepts whatever chain the endpoint reports.
    pub fn chain_id(self) -> Option<u64> {
        match self {
            Self::Development => None,
            Self::Mumbai => Some(80001),
        }
    }

    pub fn deployment_gas_limit(self) -> u64 {
        match self {
            Self::Development => 5_000_000,
            Self::Mumbai => 4_000_000,
        }
    }
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Target network preset.
    #[arg(long, value_enum, env = "DEPLOY_NETWORK", default_value = "development")]
    pub network: NetworkPreset,

    /// RPC URL; defaults to the preset's endpoint.
    #[arg(long, env = "RPC_ENDPOINT")]
    pub rpc_url: Option<String>,

    /// ERC-20 token the reward is paid in.
    #[arg(long, env = "TOKEN_ADDRESS")]
    pub token: Address,

    /// Reward in whole tokens (18 decimals), eg `5` or `0.25`.
    #[arg(long, env = "REWARD_AMOUNT")]
    pub reward_amount: String,

    /// Reward period passed to the contract constructor.
    #[arg(long, env = "REWARD_PERIOD_DAYS", default_value_t = 1)]
    pub reward_period_days: u64,

    /// Deployer private key (hex string, 0x...).
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Deployer BIP-39 mnemonic.
    #[arg(long, env = "MNEMONIC", hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Account index under `m/44'/60'/0'/0/`.
    #[arg(long, default_value_t = 0)]
    pub mnemonic_index: u32,

    /// Compiled contract artifact (Truffle or Foundry JSON).
    #[arg(long, default_value = "build/contracts/Bank.json")]
    pub artifact: PathBuf,

    #[arg(long, default_value_t = DEFAULT_APPROVAL_GAS_LIMIT)]
    pub approval_gas_limit: u64,

    /// Defaults to the preset's limit.
    #[arg(long)]
    pub deployment_gas_limit: Option<u64>,

    /// Blocks to wait for after each transaction is included.
    #[arg(long, default_value_t = 1)]
    pub confirmations: usize,

    /// Path to write deployment info (eg, deployments.json).
    #[arg(long, default_value = "deployments.json")]
    pub deployments_path: PathBuf,

    /// Key under `deployments` to store this contract.
    #[arg(long, default_value = "bank")]
    pub contract_key: String,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Deployer address (20 bytes, hex).
    #[arg(long)]
    pub account: String,

    /// Nonce of the creation transaction. Without it the next creation nonce is
    /// read from `--rpc-url` (current nonce + 1, as in a deployment run).
    #[arg(long)]
    pub nonce: Option<u64>,

    #[arg(long, env = "RPC_ENDPOINT")]
    pub rpc_url: Option<String>,
}

impl PredictArgs {
    /// The `--account` bytes as an address; a wrong width is refused before any network access.
    pub fn account(&self) -> Result<Address> {
        let hex_str = self.account.trim();
        let bytes = hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str))
            .with_context(|| format!("account `{}` is not valid hex", self.account))?;
        if bytes.len() != ADDRESS_WIDTH {
            return Err(InvalidInputError::AccountWidth {
                expected: ADDRESS_WIDTH,
                actual: bytes.len(),
            }
            .into());
        }
        Ok(Address::from_slice(&bytes))
    }
}

/// Validated configuration for one deployment run.
#[derive(Clone, Debug)]
pub struct DeployConfig {
    pub network: NetworkPreset,
    pub rpc_url: String,
    pub plan: RewardPlan,
    pub gas: GasLimits,
    pub confirmations: usize,
    pub artifact_path: PathBuf,
    pub deployments_path: PathBuf,
    pub contract_key: String,
}

impl DeployConfig {
    pub fn from_args(args: DeployArgs) -> Result<(Self, Credential)> {
        let rpc_url = match (args.rpc_url, args.network.default_endpoint()) {
            (Some(url), _) => url,
            (None, Some(url)) => url.to_string(),
            (None, None) => bail!(
                "network `{}` has no default endpoint: provide --rpc-url (or set RPC_ENDPOINT)",
                args.network.name()
            ),
        };

        let reward_amount = parse_reward_amount(&args.reward_amount)?;
        if args.reward_period_days == 0 {
            bail!("reward period must be at least one day");
        }
        if args.token == Address::ZERO {
            bail!("token address must not be the zero address");
        }

        let config = Self {
            network: args.network,
            rpc_url,
            plan: RewardPlan {
                token: args.token,
                reward_amount,
                reward_period_days: args.reward_period_days,
            },
            gas: GasLimits {
                approval: args.approval_gas_limit,
                deployment: args
                    .deployment_gas_limit
                    .unwrap_or_else(|| args.network.deployment_gas_limit()),
            },
            confirmations: args.confirmations,
            artifact_path: args.artifact,
            deployments_path: args.deployments_path,
            contract_key: args.contract_key,
        };
        let credential = Credential {
            private_key: args.private_key,
            mnemonic: args.mnemonic,
            mnemonic_index: args.mnemonic_index,
        };
        Ok((config, credential))
    }

    /// Refuse to run against a chain other than the preset's.
    pub fn check_chain_id(&self, reported: u64) -> Result<()> {
        match self.network.chain_id() {
            Some(expected) if expected != reported => bail!(
                "endpoint reports chain id {reported}, but network `{}` is chain {expected}",
                self.network.name()
            ),
            _ => Ok(()),
        }
    }
}

/// Decimal token amount to its 18-decimal base unit.
pub fn parse_reward_amount(amount: &str) -> Result<U256> {
    let wei = parse_ether(amount.trim())
        .with_context(|| format!("invalid reward amount `{amount}`"))?;
    let wei = from_ethers_u256(wei);
    if wei.is_zero() {
        bail!("reward amount must be positive");
    }
    Ok(wei)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        deploy: DeployArgs,
    }

    fn parse(extra: &[&str]) -> DeployArgs {
        let mut argv = vec![
            "reward-deployer",
            "--token",
            "0x1111111111111111111111111111111111111111",
            "--reward-amount",
            "5",
        ];
        argv.extend_from_slice(extra);
        TestCli::parse_from(argv).deploy
    }

    #[test]
    fn test_reward_amount_in_wei() {
        assert_eq!(
            parse_reward_amount("5").unwrap(),
            U256::from(5u64) * U256::from(10u64).pow(U256::from(18u64))
        );
        assert_eq!(
            parse_reward_amount("0.25").unwrap(),
            U256::from(250_000_000_000_000_000u64)
        );
        assert!(parse_reward_amount("0").is_err());
        assert!(parse_reward_amount("five").is_err());
    }

    #[test]
    fn test_development_defaults() {
        let (config, _) = DeployConfig::from_args(parse(&["--network", "development"])).unwrap();
        if std::env::var_os("RPC_ENDPOINT").is_none() {
            assert_eq!(config.rpc_url, "http://localhost:8545");
        }
        assert_eq!(config.gas.approval, DEFAULT_APPROVAL_GAS_LIMIT);
        assert_eq!(config.gas.deployment, 5_000_000);
        assert_eq!(config.plan.reward_period_days, 1);
        assert!(config.check_chain_id(1337).is_ok());
    }

    #[test]
    fn test_mumbai_requires_endpoint_and_chain() {
        if std::env::var_os("RPC_ENDPOINT").is_none() {
            assert!(DeployConfig::from_args(parse(&["--network", "mumbai"])).is_err());
        }

        let (config, _) = DeployConfig::from_args(parse(&[
            "--network",
            "mumbai",
            "--rpc-url",
            "https://rpc.example",
        ]))
        .unwrap();
        assert_eq!(config.rpc_url, "https://rpc.example");
        assert_eq!(config.gas.deployment, 4_000_000);
        assert!(config.check_chain_id(80001).is_ok());
        assert!(config.check_chain_id(137).is_err());
    }

    #[test]
    fn test_overrides() {
        let (config, credential) = DeployConfig::from_args(parse(&[
            "--rpc-url",
            "http://127.0.0.1:9545",
            "--deployment-gas-limit",
            "6000000",
            "--reward-period-days",
            "7",
            "--mnemonic-index",
            "2",
        ]))
        .unwrap();
        assert_eq!(config.rpc_url, "http://127.0.0.1:9545");
        assert_eq!(config.gas.deployment, 6_000_000);
        assert_eq!(config.plan.reward_period_days, 7);
        assert_eq!(credential.mnemonic_index, 2);
    }

    #[test]
    fn test_predict_account_width() {
        let args = |account: &str| PredictArgs {
            account: account.to_string(),
            nonce: None,
            rpc_url: None,
        };

        let expected = Address::repeat_byte(0xaa);
        assert_eq!(args(&format!("0x{}", "aa".repeat(20))).account().unwrap(), expected);
        assert_eq!(args(&format!(" {} ", "AA".repeat(20))).account().unwrap(), expected);

        let err = args(&"aa".repeat(19)).account().unwrap_err();
        assert_eq!(
            err.downcast_ref::<InvalidInputError>(),
            Some(&InvalidInputError::AccountWidth { expected: 20, actual: 19 })
        );
        assert!(args(&"aa".repeat(21)).account().is_err());
        assert!(args("0xnot-hex").account().is_err());
    }

    #[test]
    fn test_rejects_zero_period() {
        assert!(DeployConfig::from_args(parse(&["--reward-period-days", "0"])).is_err());
    }
}
