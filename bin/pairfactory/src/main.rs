//! pairfactory deploys a DEX pair factory once per network and prints the pair init code hash.

mod cli;

use alloy_core::primitives::Address;
use anyhow::Result;
use clap::Parser;

use cli::{ArtifactArgs, Cli, Command, DeployArgs, SaveConfigArgs, SetFeeToArgs};
use pairfactory_deploy::{
    ContractArtifact, DeployConfig, DeployError, DeploymentWorkflow, EthRpc, HttpRpc,
    configure_fee_to, format_hash, init_code_hash, rpc::DEFAULT_REQUEST_TIMEOUT,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries only the deployment record.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        if let Some(deploy_err) = err.downcast_ref::<DeployError>() {
            tracing::error!(kind = deploy_err.kind(), "Run aborted");
        }
        return Err(err);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => DeployConfig::load_from_file(path)?,
        None => DeployConfig::default(),
    };

    match cli.command {
        Command::Deploy(args) => deploy(config, args).await,
        Command::SetFeeTo(args) => set_fee_to(config, args).await,
        Command::InitCodeHash(args) => print_init_code_hash(config, args),
        Command::SaveConfig(args) => save_config(config, args),
    }
}

async fn deploy(mut config: DeployConfig, args: DeployArgs) -> Result<()> {
    args.network.apply(&mut config);
    args.artifacts.apply(&mut config);
    if args.no_verify {
        config.verify_fee_to_setter = false;
    }

    let client = HttpRpc::new(config.rpc_url()?, DEFAULT_REQUEST_TIMEOUT)?;
    let available = available_accounts(&client, &config).await?;

    let record = DeploymentWorkflow::new(&client, &config)
        .run(&available, args.redeploy)
        .await?;

    println!("{record}");

    Ok(())
}

async fn set_fee_to(mut config: DeployConfig, args: SetFeeToArgs) -> Result<()> {
    args.network.apply(&mut config);

    let client = HttpRpc::new(config.rpc_url()?, DEFAULT_REQUEST_TIMEOUT)?;
    let available = available_accounts(&client, &config).await?;

    let update = configure_fee_to(&client, &config, &available, args.fee_to).await?;

    tracing::info!(
        factory = %update.factory,
        fee_to = %update.fee_to,
        tx_hash = %update.transaction_hash,
        "setFeeTo confirmed"
    );

    Ok(())
}

fn print_init_code_hash(mut config: DeployConfig, args: ArtifactArgs) -> Result<()> {
    args.apply(&mut config);

    let pair = ContractArtifact::load(&config.artifacts.pair)?;
    let hash = init_code_hash(&pair.bytecode)?;

    println!("INIT_CODE_HASH: {}", format_hash(&hash));

    Ok(())
}

fn save_config(mut config: DeployConfig, args: SaveConfigArgs) -> Result<()> {
    args.network.apply(&mut config);
    args.artifacts.apply(&mut config);

    config.save_to_file(&args.output)?;

    Ok(())
}

/// Accounts from the configuration, or the node's unlocked accounts if none are configured.
async fn available_accounts(client: &HttpRpc, config: &DeployConfig) -> Result<Vec<Address>> {
    if !config.accounts.is_empty() {
        return Ok(config.accounts.clone());
    }

    let accounts = client.accounts().await?;
    tracing::debug!(count = accounts.len(), "Fetched node accounts");

    Ok(accounts)
}
