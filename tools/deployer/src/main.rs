use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use alloy_primitives::Address;
use tracing::info;
use tracing_subscriber::EnvFilter;

use create_address::create_address;
use reward_deploy_types::Network;

mod abi;
mod artifact;
mod compat;
mod config;
mod deployments;
mod errors;
mod network;
mod nonce;
mod orchestrator;
mod signer;
mod state;

#[cfg(test)]
mod mock;

use crate::{
    artifact::JsonArtifact,
    config::{DeployArgs, DeployConfig, PredictArgs},
    deployments::{write_deployment_record, RecordTarget},
    network::EthersNetwork,
    nonce::NonceTracker,
    orchestrator::Orchestrator,
    signer::WalletSigner,
};

/// Approve a token allowance for a reward contract's future address, then deploy the contract
/// at exactly that address.
///
/// The contract address is predicted from the deployer's nonce, so no other transaction may be
/// sent from the deployer account while a deployment is running.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Approve the predicted address, then deploy the reward contract.
    Deploy(DeployArgs),
    /// Print the address a contract created by an account would receive.
    Predict(PredictArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Deploy(args) => deploy(args).await,
        Command::Predict(args) => predict(args).await,
    }
}

async fn deploy(args: DeployArgs) -> Result<()> {
    let (config, credential) = DeployConfig::from_args(args)?;

    let network = EthersNetwork::connect(&config.rpc_url, config.confirmations)?;
    let chain_id = network.chain_id().await?;
    config.check_chain_id(chain_id)?;
    info!(network = config.network.name(), chain_id, "connected");

    let signer = WalletSigner::new(credential.wallet()?, chain_id);
    let artifact = JsonArtifact::load(&config.artifact_path)?;
    info!(
        contract = artifact.contract_name.as_deref().unwrap_or("<unnamed>"),
        bytecode_len = artifact.bytecode().len(),
        "loaded artifact"
    );

    let orchestrator =
        Orchestrator::new(&signer, &network, &artifact, config.plan.clone(), config.gas);
    let report = orchestrator.run().await?;

    // On chain already; print before anything local can fail.
    println!("Approval tx {} (nonce {})", report.approval_tx, report.approval_nonce);
    println!("Deployment tx {} (nonce {})", report.deployment_tx, report.deployment_nonce);
    println!("Deployed `{}` to {}", config.contract_key, report.deployed);

    write_deployment_record(
        &RecordTarget {
            path: &config.deployments_path,
            network: config.network.name(),
            contract_key: &config.contract_key,
            rpc_url: &config.rpc_url,
        },
        &report,
    )
    .with_context(|| {
        format!(
            "deployment succeeded but recording it in {} failed",
            config.deployments_path.display()
        )
    })
}

async fn predict(args: PredictArgs) -> Result<()> {
    let account = args.account()?;

    let nonce = match (args.nonce, args.rpc_url.as_deref()) {
        (Some(nonce), _) => nonce,
        (None, Some(rpc_url)) => {
            let network = EthersNetwork::connect(rpc_url, 0)?;
            creation_nonce(&network, account).await?
        }
        (None, None) => bail!("provide --nonce, or --rpc-url to read it from the network"),
    };

    println!("{} (nonce {nonce})", create_address(account, nonce));
    Ok(())
}

/// Nonce a contract created right after the account's next transaction would be deployed with.
async fn creation_nonce<N: Network + Sync>(network: &N, account: Address) -> Result<u64> {
    Ok(NonceTracker::new(network)
        .next_sequence_number(account)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{StubNetwork, DEPLOYER};
    use alloy_primitives::address;

    #[tokio::test]
    async fn test_predict_matches_deployment_run() {
        let network = StubNetwork::new(DEPLOYER, 5);
        let nonce = creation_nonce(&network, DEPLOYER).await.unwrap();
        assert_eq!(nonce, 6);
        assert_eq!(
            create_address(DEPLOYER, nonce),
            address!("94dea49b71c2325724af7abef02590f967595380")
        );
        assert!(network.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_predict_surfaces_query_failure() {
        let network = StubNetwork::new(DEPLOYER, 5).with(|s| s.fail_queries = true);
        assert!(creation_nonce(&network, DEPLOYER).await.is_err());
    }
}
