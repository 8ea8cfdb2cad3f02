//! The deployment record shown to the operator.

use std::fmt;

use alloy_core::primitives::{Address, B256};

use crate::{
    error::{DeployError, Result},
    factory::FactoryContract,
    init_code::format_hash,
    rpc::EthRpc,
};

/// Init code hash, deployer and on-chain fee-setter of a factory deployment.
///
/// Displays as the three lines operators compare against their address-derivation setup:
///
/// ```text
/// INIT_CODE_HASH: 0x...
/// accounts[0]: 0x...
/// feeToSetter: 0x...
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub init_code_hash: B256,
    pub deployer: Address,
    pub fee_to_setter: Address,
}

impl DeploymentRecord {
    /// Fails with an invariant violation if the factory's fee-setter is not `expected`.
    pub fn verify_fee_to_setter(&self, expected: Address) -> Result<()> {
        if self.fee_to_setter != expected {
            return Err(DeployError::InvariantViolation {
                what: "factory feeToSetter",
                expected: expected.to_checksum(None),
                found: self.fee_to_setter.to_checksum(None),
            });
        }

        Ok(())
    }
}

impl fmt::Display for DeploymentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INIT_CODE_HASH: {}", format_hash(&self.init_code_hash))?;
        writeln!(f, "accounts[0]: {}", self.deployer.to_checksum(None))?;
        write!(f, "feeToSetter: {}", self.fee_to_setter.to_checksum(None))
    }
}

/// Reads the deployed factory's state into a [`DeploymentRecord`].
pub struct DeploymentReporter<'a, C> {
    client: &'a C,
}

impl<'a, C: EthRpc> DeploymentReporter<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub async fn report(
        &self,
        factory: &FactoryContract,
        deployer: Address,
        init_code_hash: B256,
    ) -> Result<DeploymentRecord> {
        let fee_to_setter = factory.fee_to_setter(self.client).await?;

        tracing::debug!(
            factory = %factory.address(),
            fee_to_setter = %fee_to_setter,
            "Read factory feeToSetter"
        );

        Ok(DeploymentRecord {
            init_code_hash,
            deployer,
            fee_to_setter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DeploymentRecord {
        DeploymentRecord {
            init_code_hash: B256::repeat_byte(0xab),
            deployer: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap(),
            fee_to_setter: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap(),
        }
    }

    #[test]
    fn test_record_lines() {
        let rendered = record().to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("INIT_CODE_HASH: 0x{}", "ab".repeat(32)));
        assert_eq!(lines[1], "accounts[0]: 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(lines[2], "feeToSetter: 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }

    #[test]
    fn test_verify_fee_to_setter() {
        let record = record();
        assert!(record.verify_fee_to_setter(record.deployer).is_ok());

        let err = record.verify_fee_to_setter(Address::ZERO).unwrap_err();
        assert!(matches!(
            err,
            DeployError::InvariantViolation { what: "factory feeToSetter", .. }
        ));
    }
}
