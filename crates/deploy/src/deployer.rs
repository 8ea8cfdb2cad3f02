//! Factory construction, at most once per network.

use alloy_core::primitives::Bytes;

use crate::{
    NamedAccounts, abi,
    error::{DeployError, Result},
    factory::FactoryContract,
    registry::{DeploymentEntry, DeploymentRegistry},
    rpc::{ConfirmationPolicy, EthRpc, TransactionRequest, wait_for_receipt},
};

/// Deploys the pair factory, reusing a deployment already recorded for the network.
pub struct FactoryDeployer<'a, C> {
    client: &'a C,
    bytecode: &'a Bytes,
    gas: Option<u64>,
    confirmation: ConfirmationPolicy,
}

impl<'a, C: EthRpc> FactoryDeployer<'a, C> {
    pub fn new(client: &'a C, bytecode: &'a Bytes) -> Self {
        Self {
            client,
            bytecode,
            gas: None,
            confirmation: ConfirmationPolicy::default(),
        }
    }

    /// Gas limit for the construction transaction. The node estimates it when unset.
    pub fn gas(mut self, gas: Option<u64>) -> Self {
        self.gas = gas;
        self
    }

    pub fn confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// Ensure a factory constructed with `accounts.fee_to_setter` exists on `network`.
    ///
    /// If the registry has an entry for the network and `force_deploy` is false, the recorded
    /// factory is returned without sending a transaction. The entry must match the node's chain
    /// ID and the requested fee-setter, and still have code. Anything else is an error rather
    /// than a silent redeploy.
    pub async fn ensure_deployed(
        &self,
        registry: &mut DeploymentRegistry,
        network: &str,
        accounts: &NamedAccounts,
        force_deploy: bool,
    ) -> Result<FactoryContract> {
        let chain_id = self.client.chain_id().await?;

        if force_deploy {
            tracing::info!(network, chain_id, "Redeploy requested, ignoring recorded factory");
        } else if let Some(entry) = registry.get(network) {
            return self.reuse(entry, network, chain_id, accounts).await;
        }

        tracing::info!(
            network,
            chain_id,
            deployer = %accounts.deployer,
            fee_to_setter = %accounts.fee_to_setter,
            "Deploying factory..."
        );

        let init_code = abi::encode_constructor(self.bytecode, &[accounts.fee_to_setter]);
        let tx = TransactionRequest::create(accounts.deployer, init_code).gas(self.gas);

        let tx_hash = self
            .client
            .send_transaction(tx)
            .await
            .map_err(|err| match err {
                DeployError::Deployment(msg) => {
                    DeployError::Deployment(format!("Construction transaction rejected: {msg}"))
                }
                err => err,
            })?;

        tracing::info!(tx_hash = %tx_hash, "Construction transaction sent, waiting for confirmation...");

        let receipt = wait_for_receipt(self.client, tx_hash, self.confirmation).await?;

        if !receipt.is_success() {
            return Err(DeployError::Deployment(format!(
                "Construction transaction {tx_hash} reverted"
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            DeployError::Deployment(format!(
                "Receipt of construction transaction {tx_hash} has no contract address"
            ))
        })?;

        registry.insert(
            network,
            DeploymentEntry {
                chain_id,
                address,
                transaction_hash: tx_hash,
                deployer: accounts.deployer,
                fee_to_setter: accounts.fee_to_setter,
                deployed_at: chrono::Utc::now().timestamp(),
            },
        );
        registry.save()?;

        tracing::info!(
            network,
            address = %address,
            block_number = ?receipt.block_number,
            "Factory deployed"
        );

        Ok(FactoryContract::new(address))
    }

    async fn reuse(
        &self,
        entry: &DeploymentEntry,
        network: &str,
        chain_id: u64,
        accounts: &NamedAccounts,
    ) -> Result<FactoryContract> {
        if entry.chain_id != chain_id {
            return Err(DeployError::Configuration(format!(
                "Factory recorded for network '{network}' is on chain {}, but the node reports chain {chain_id}",
                entry.chain_id
            )));
        }

        if entry.fee_to_setter != accounts.fee_to_setter {
            return Err(DeployError::Configuration(format!(
                "Factory recorded for network '{network}' was constructed with feeToSetter {}, not {}; pass --redeploy to deploy a new one",
                entry.fee_to_setter.to_checksum(None),
                accounts.fee_to_setter.to_checksum(None)
            )));
        }

        let code = self.client.code_at(entry.address).await?;
        if code.is_empty() {
            return Err(DeployError::Deployment(format!(
                "Factory recorded for network '{network}' at {} has no code (chain reset?); pass --redeploy to deploy a new one",
                entry.address
            )));
        }

        tracing::info!(
            network,
            address = %entry.address,
            tx_hash = %entry.transaction_hash,
            "Factory already deployed, skipping deployment"
        );

        Ok(FactoryContract::new(entry.address))
    }
}
