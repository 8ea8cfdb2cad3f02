//! pairfactory-deploy - Deployment library for a DEX pair factory.
//!
//! This crate deploys the pair factory to a network at most once, computes the init code
//! hash of the pair contract used for off-chain pair address derivation, and reads back the
//! factory state so the deployment can be verified.

pub mod abi;
pub mod rpc;

mod accounts;
mod artifact;
mod config;
mod deployer;
mod error;
mod factory;
mod init_code;
mod registry;
mod reporter;
mod workflow;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use accounts::{AccountRoles, NamedAccounts};
pub use artifact::{ContractArtifact, decode_bytecode};
pub use config::{ArtifactPaths, CONFIG_FILENAME, DEFAULT_NETWORK, DEFAULT_RPC_URL, DeployConfig};
pub use deployer::FactoryDeployer;
pub use error::{DeployError, Result};
pub use factory::FactoryContract;
pub use init_code::{format_hash, init_code_hash};
pub use registry::{DeploymentEntry, DeploymentRegistry};
pub use reporter::{DeploymentRecord, DeploymentReporter};
pub use rpc::{ConfirmationPolicy, EthRpc, HttpRpc};
pub use workflow::{DeploymentWorkflow, FeeToUpdate, WorkflowStage, configure_fee_to};
