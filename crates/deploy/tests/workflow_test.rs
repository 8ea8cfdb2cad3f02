//! End-to-end tests of the factory deployment workflow against an in-memory node.
//!
//! Run with: cargo test --test workflow_test

use std::path::Path;

use alloy_core::primitives::{Address, keccak256};
use anyhow::{Context, Result};
use pairfactory_deploy::{
    ArtifactPaths, ConfirmationPolicy, DeployConfig, DeployError, DeploymentRegistry,
    DeploymentWorkflow, FactoryContract, format_hash, testing::MockNode,
};
use tempdir::TempDir;

const CHAIN_ID: u64 = 1337;

/// Anvil's first two default accounts.
const ACCOUNT_A: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const ACCOUNT_B: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

const FACTORY_BYTECODE: &str = "0x608060405234801561001057600080fd5b5060405161001d38038061001d833981016040819052";
const PAIR_BYTECODE: &str = "0x60806040526001600c5534801561001557600080fd5b50604051469060200160405180910390";

/// Test setup context containing the artifacts, config and accounts.
struct TestContext {
    _temp_dir: TempDir,
    config: DeployConfig,
    accounts: Vec<Address>,
}

impl TestContext {
    fn new() -> Result<Self> {
        init_test_tracing();

        let temp_dir = TempDir::new("pairfactory-it").context("Failed to create temp dir")?;
        let artifacts = write_artifacts(temp_dir.path())?;

        let config = DeployConfig {
            registry_path: temp_dir.path().join("deployments.json"),
            artifacts,
            confirmation: ConfirmationPolicy {
                timeout_secs: 5,
                poll_interval_ms: 1,
            },
            ..Default::default()
        };

        Ok(Self {
            _temp_dir: temp_dir,
            config,
            accounts: vec![ACCOUNT_A.parse()?, ACCOUNT_B.parse()?],
        })
    }

    fn node(&self) -> MockNode {
        MockNode::new(CHAIN_ID, self.accounts.clone())
    }
}

/// Initialize tracing for tests (idempotent).
fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

fn write_artifacts(dir: &Path) -> Result<ArtifactPaths> {
    let factory = dir.join("UniswapV2Factory.json");
    let pair = dir.join("UniswapV2Pair.json");

    std::fs::write(
        &factory,
        serde_json::json!({ "contractName": "UniswapV2Factory", "bytecode": FACTORY_BYTECODE })
            .to_string(),
    )?;
    std::fs::write(
        &pair,
        serde_json::json!({ "contractName": "UniswapV2Pair", "bytecode": PAIR_BYTECODE }).to_string(),
    )?;

    Ok(ArtifactPaths { factory, pair })
}

fn expected_init_code_hash() -> String {
    let bytecode = hex::decode(PAIR_BYTECODE.trim_start_matches("0x")).unwrap();
    format_hash(&keccak256(bytecode))
}

#[tokio::test]
async fn test_fresh_network_prints_record() -> Result<()> {
    let ctx = TestContext::new()?;
    let node = ctx.node();

    let record = DeploymentWorkflow::new(&node, &ctx.config)
        .run(&ctx.accounts, false)
        .await?;

    let rendered = record.to_string();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(
        lines,
        vec![
            format!("INIT_CODE_HASH: {}", expected_init_code_hash()),
            format!("accounts[0]: {ACCOUNT_A}"),
            format!("feeToSetter: {ACCOUNT_A}"),
        ]
    );
    assert_eq!(node.creation_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_rerun_does_not_redeploy() -> Result<()> {
    let ctx = TestContext::new()?;
    let node = ctx.node();

    DeploymentWorkflow::new(&node, &ctx.config)
        .run(&ctx.accounts, false)
        .await?;
    let first = DeploymentRegistry::load(&ctx.config.registry_path)?
        .get("development")
        .cloned()
        .context("First run should record the factory")?;

    let record = DeploymentWorkflow::new(&node, &ctx.config)
        .run(&ctx.accounts, false)
        .await?;
    let second = DeploymentRegistry::load(&ctx.config.registry_path)?
        .get("development")
        .cloned()
        .context("Second run should keep the record")?;

    assert_eq!(node.creation_count(), 1, "No second construction transaction");
    assert_eq!(first, second);
    assert_eq!(record.fee_to_setter, ctx.accounts[0]);

    Ok(())
}

#[tokio::test]
async fn test_fee_to_setter_matches_constructor_argument() -> Result<()> {
    let ctx = TestContext::new()?;
    let mut config = ctx.config.clone();
    config.roles.fee_to_setter = Some(ctx.accounts[1]);
    let node = ctx.node();

    let record = DeploymentWorkflow::new(&node, &config)
        .run(&ctx.accounts, false)
        .await?;

    let entry = DeploymentRegistry::load(&config.registry_path)?
        .get("development")
        .cloned()
        .context("Factory should be recorded")?;
    let on_chain = FactoryContract::new(entry.address).fee_to_setter(&node).await?;

    assert_eq!(record.deployer, ctx.accounts[0]);
    assert_eq!(on_chain, ctx.accounts[1]);
    assert_eq!(record.fee_to_setter, on_chain);

    Ok(())
}

#[tokio::test]
async fn test_empty_accounts_abort_before_network() -> Result<()> {
    let ctx = TestContext::new()?;
    let node = ctx.node();

    let err = DeploymentWorkflow::new(&node, &ctx.config)
        .run(&[], false)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Configuration(_)));
    assert_eq!(node.request_count(), 0, "No RPC request may be made");

    Ok(())
}

#[tokio::test]
async fn test_rejected_construction_yields_no_record() -> Result<()> {
    let ctx = TestContext::new()?;
    let node = ctx.node().rejecting_transactions("gas required exceeds allowance");

    let result = DeploymentWorkflow::new(&node, &ctx.config)
        .run(&ctx.accounts, false)
        .await;

    assert!(matches!(result, Err(DeployError::Deployment(_))));
    assert!(
        DeploymentRegistry::load(&ctx.config.registry_path)?.is_empty(),
        "Nothing recorded for a failed deployment"
    );

    Ok(())
}

#[tokio::test]
async fn test_unreachable_node() -> Result<()> {
    let ctx = TestContext::new()?;
    let node = ctx.node().unreachable();

    let err = DeploymentWorkflow::new(&node, &ctx.config)
        .run(&ctx.accounts, false)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Network(_)));

    Ok(())
}

#[tokio::test]
async fn test_networks_are_tracked_separately() -> Result<()> {
    let ctx = TestContext::new()?;
    let node = ctx.node();

    let mut staging = ctx.config.clone();
    staging.network = "staging".to_string();

    DeploymentWorkflow::new(&node, &ctx.config)
        .run(&ctx.accounts, false)
        .await?;
    DeploymentWorkflow::new(&node, &staging)
        .run(&ctx.accounts, false)
        .await?;

    let registry = DeploymentRegistry::load(&ctx.config.registry_path)?;
    assert_eq!(registry.len(), 2);
    assert_eq!(node.creation_count(), 2);
    assert_ne!(
        registry.get("development").map(|e| e.address),
        registry.get("staging").map(|e| e.address)
    );

    Ok(())
}
