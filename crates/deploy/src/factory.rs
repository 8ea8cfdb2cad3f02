//! Handle to a deployed pair factory.

use alloy_core::primitives::{Address, B256};

use crate::{
    abi,
    error::{DeployError, Result},
    rpc::{ConfirmationPolicy, EthRpc, TransactionRequest, wait_for_receipt},
};

/// A factory contract deployed at a known address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("{address}")]
pub struct FactoryContract {
    address: Address,
}

impl FactoryContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Read `feeToSetter()`.
    pub async fn fee_to_setter<C: EthRpc>(&self, client: &C) -> Result<Address> {
        self.read_address(client, abi::FEE_TO_SETTER).await
    }

    /// Read `feeTo()`.
    pub async fn fee_to<C: EthRpc>(&self, client: &C) -> Result<Address> {
        self.read_address(client, abi::FEE_TO).await
    }

    /// Send `setFeeTo(fee_to)` from `from` and wait for it to be mined.
    ///
    /// Only the factory's fee-setter may call this; a revert is a deployment error.
    pub async fn set_fee_to<C: EthRpc>(
        &self,
        client: &C,
        from: Address,
        fee_to: Address,
        gas: Option<u64>,
        policy: ConfirmationPolicy,
    ) -> Result<B256> {
        let tx = TransactionRequest::call(
            from,
            self.address,
            abi::encode_call(abi::SET_FEE_TO, &[fee_to]),
        )
        .gas(gas);

        let tx_hash = client
            .send_transaction(tx)
            .await
            .map_err(|err| match err {
                DeployError::Deployment(msg) => {
                    DeployError::Deployment(format!("setFeeTo transaction rejected: {msg}"))
                }
                err => err,
            })?;

        tracing::info!(tx_hash = %tx_hash, factory = %self.address, fee_to = %fee_to, "setFeeTo transaction sent");

        let receipt = wait_for_receipt(client, tx_hash, policy).await?;
        if !receipt.is_success() {
            return Err(DeployError::Deployment(format!(
                "setFeeTo transaction {tx_hash} reverted (is {from} the fee-setter?)"
            )));
        }

        Ok(tx_hash)
    }

    async fn read_address<C: EthRpc>(&self, client: &C, signature: &str) -> Result<Address> {
        let data = client
            .call(self.address, abi::encode_call(signature, &[]))
            .await?;

        abi::decode_address(&data).map_err(|e| {
            DeployError::Network(format!("Failed to decode {signature} of {}: {e}", self.address))
        })
    }
}
