//! The factory deployment workflow: resolve accounts, hash the pair init code, deploy the
//! factory (once per network) and read back its state for the operator.

use alloy_core::primitives::{Address, B256};

use crate::{
    ContractArtifact, DeployConfig, DeploymentRecord, DeploymentRegistry, DeploymentReporter,
    FactoryContract, FactoryDeployer, NamedAccounts,
    error::{DeployError, Result},
    init_code::{format_hash, init_code_hash},
    rpc::EthRpc,
};

/// Progress of a workflow run. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum WorkflowStage {
    Undeployed,
    Deployed,
    Reported,
}

/// One deployment run against one network.
pub struct DeploymentWorkflow<'a, C> {
    client: &'a C,
    config: &'a DeployConfig,
    stage: WorkflowStage,
}

impl<'a, C: EthRpc> DeploymentWorkflow<'a, C> {
    pub fn new(client: &'a C, config: &'a DeployConfig) -> Self {
        Self {
            client,
            config,
            stage: WorkflowStage::Undeployed,
        }
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    /// Run the workflow with the accounts supplied by the environment.
    ///
    /// Accounts and artifacts are validated before the first network call. The record is
    /// only returned once the factory is deployed and, unless disabled in the config, its
    /// fee-setter is confirmed to be the intended account.
    pub async fn run(&mut self, available: &[Address], force_deploy: bool) -> Result<DeploymentRecord> {
        tracing::info!(network = %self.config.network, "Starting factory deployment...");

        let accounts = NamedAccounts::resolve(&self.config.roles, available)?;

        let pair = ContractArtifact::load(&self.config.artifacts.pair)?;
        let init_code_hash = init_code_hash(&pair.bytecode)?;
        tracing::info!(
            contract = %pair.contract_name,
            init_code_hash = %format_hash(&init_code_hash),
            "Pair init code hash computed"
        );

        let factory_artifact = ContractArtifact::load(&self.config.artifacts.factory)?;

        let mut registry = DeploymentRegistry::load(&self.config.registry_path)?;

        let factory = FactoryDeployer::new(self.client, &factory_artifact.bytecode)
            .gas(self.config.gas)
            .confirmation(self.config.confirmation)
            .ensure_deployed(&mut registry, &self.config.network, &accounts, force_deploy)
            .await?;
        self.advance(WorkflowStage::Deployed);

        let record = DeploymentReporter::new(self.client)
            .report(&factory, accounts.deployer, init_code_hash)
            .await?;

        if self.config.verify_fee_to_setter {
            record.verify_fee_to_setter(accounts.fee_to_setter)?;
        } else {
            tracing::warn!("feeToSetter verification disabled, compare the record manually");
        }
        self.advance(WorkflowStage::Reported);

        Ok(record)
    }

    fn advance(&mut self, stage: WorkflowStage) {
        tracing::debug!(from = %self.stage, to = %stage, "Workflow stage changed");
        self.stage = stage;
    }
}

/// Result of a `setFeeTo` configuration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeToUpdate {
    pub factory: Address,
    pub fee_to: Address,
    pub transaction_hash: B256,
}

/// Point the recorded factory's protocol fee at `fee_to`.
///
/// This is a separate step from the deployment and is never run by it. The transaction is
/// sent from the configured fee-setter, or from the fee-setter recorded at deployment if
/// none is configured, and `feeTo()` is read back to confirm the change.
pub async fn configure_fee_to<C: EthRpc>(
    client: &C,
    config: &DeployConfig,
    available: &[Address],
    fee_to: Address,
) -> Result<FeeToUpdate> {
    let registry = DeploymentRegistry::load(&config.registry_path)?;
    let entry = registry.get(&config.network).ok_or_else(|| {
        DeployError::Deployment(format!(
            "No factory recorded for network '{}' in {}; deploy it first",
            config.network,
            registry.path().display()
        ))
    })?;

    let from = config.roles.fee_to_setter.unwrap_or(entry.fee_to_setter);
    if !available.is_empty() && !available.contains(&from) {
        return Err(DeployError::Configuration(format!(
            "Fee-setter {} is not one of the {} accounts available on the node",
            from.to_checksum(None),
            available.len()
        )));
    }

    let chain_id = client.chain_id().await?;
    if entry.chain_id != chain_id {
        return Err(DeployError::Configuration(format!(
            "Factory recorded for network '{}' is on chain {}, but the node reports chain {chain_id}",
            config.network, entry.chain_id
        )));
    }

    let factory = FactoryContract::new(entry.address);

    tracing::info!(
        factory = %factory,
        from = %from,
        fee_to = %fee_to,
        "Setting factory feeTo..."
    );

    let transaction_hash = factory
        .set_fee_to(client, from, fee_to, config.gas, config.confirmation)
        .await?;

    let current = factory.fee_to(client).await?;
    if current != fee_to {
        return Err(DeployError::InvariantViolation {
            what: "factory feeTo",
            expected: fee_to.to_checksum(None),
            found: current.to_checksum(None),
        });
    }

    tracing::info!(factory = %factory, fee_to = %fee_to, "Factory feeTo updated");

    Ok(FeeToUpdate {
        factory: factory.address(),
        fee_to,
        transaction_hash,
    })
}
