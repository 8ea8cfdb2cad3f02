//! Deployer and fee-setter account selection.

use alloy_core::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, Result};

/// Explicit role assignments. A role left unset falls back to the first available account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoles {
    /// Account that sends the construction transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployer: Option<Address>,
    /// Account passed to the factory constructor as `feeToSetter`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_to_setter: Option<Address>,
}

/// Accounts playing a role in the factory deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedAccounts {
    /// The deployer account. Reported as `accounts[0]`.
    pub deployer: Address,
    /// The intended fee-setter of the factory.
    pub fee_to_setter: Address,
}

impl NamedAccounts {
    /// The first available account plays both roles.
    pub fn first_available(available: &[Address]) -> Result<Self> {
        Self::resolve(&AccountRoles::default(), available)
    }

    /// Resolve roles against the accounts the node can sign for.
    ///
    /// Returns a configuration error if a role is unset and no account is available, or if
    /// an explicit deployer is not among a non-empty list of available accounts.
    pub fn resolve(roles: &AccountRoles, available: &[Address]) -> Result<Self> {
        let first = available.first().copied();

        let deployer = roles.deployer.or(first).ok_or_else(|| {
            DeployError::Configuration(
                "No accounts available and no deployer account configured".to_string(),
            )
        })?;

        let fee_to_setter = roles.fee_to_setter.or(first).ok_or_else(|| {
            DeployError::Configuration(
                "No accounts available and no fee-setter account configured".to_string(),
            )
        })?;

        if !available.is_empty() && !available.contains(&deployer) {
            return Err(DeployError::Configuration(format!(
                "Deployer {} is not one of the {} accounts available on the node",
                deployer.to_checksum(None),
                available.len()
            )));
        }

        tracing::debug!(
            deployer = %deployer,
            fee_to_setter = %fee_to_setter,
            explicit_deployer = roles.deployer.is_some(),
            explicit_fee_to_setter = roles.fee_to_setter.is_some(),
            "Accounts resolved"
        );

        Ok(Self {
            deployer,
            fee_to_setter,
        })
    }
}
