//! Deployment configuration, stored as `Pairfactory.toml`.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Address;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    AccountRoles,
    error::{DeployError, Result},
    rpc::ConfirmationPolicy,
};

/// The default name for the pairfactory configuration file.
pub const CONFIG_FILENAME: &str = "Pairfactory.toml";

/// The default network name, matching a local development node.
pub const DEFAULT_NETWORK: &str = "development";

/// The default RPC endpoint of a local development node.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Paths to the compiled factory and pair artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub factory: PathBuf,
    pub pair: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            factory: PathBuf::from("build/contracts/UniswapV2Factory.json"),
            pair: PathBuf::from("build/contracts/UniswapV2Pair.json"),
        }
    }
}

/// Everything needed to deploy the factory to one network.
///
/// This struct can be serialized to/from TOML format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Network name; the key of the deployment in the registry.
    pub network: String,
    /// JSON-RPC endpoint of the node.
    pub rpc_url: String,
    /// Path to the deployment registry JSON file.
    pub registry_path: PathBuf,
    /// Assert that the deployed factory reports the intended fee-setter.
    #[serde(default = "default_true")]
    pub verify_fee_to_setter: bool,
    /// Gas limit for transactions. The node estimates it when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    /// Accounts available for the roles. When empty they are fetched with `eth_accounts`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<Address>,

    /// Explicit role assignments.
    #[serde(default)]
    pub roles: AccountRoles,
    /// Compiled contract artifacts.
    #[serde(default)]
    pub artifacts: ArtifactPaths,
    /// Receipt polling settings.
    #[serde(default)]
    pub confirmation: ConfirmationPolicy,
}

fn default_true() -> bool {
    true
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            registry_path: PathBuf::from("deployments.json"),
            verify_fee_to_setter: true,
            gas: None,
            accounts: Vec::new(),
            roles: AccountRoles::default(),
            artifacts: ArtifactPaths::default(),
            confirmation: ConfirmationPolicy::default(),
        }
    }
}

impl DeployConfig {
    /// Parse and validate the RPC endpoint.
    pub fn rpc_url(&self) -> Result<Url> {
        let url = Url::parse(&self.rpc_url).map_err(|e| {
            DeployError::Configuration(format!("Invalid RPC URL '{}': {e}", self.rpc_url))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(DeployError::Configuration(format!(
                "Unsupported RPC URL scheme '{scheme}', expected http or https"
            ))),
        }
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config to TOML")
            .map_err(DeployError::configuration)?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))
            .map_err(DeployError::configuration)?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file, or from `Pairfactory.toml` inside a directory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DeployError::Configuration(format!(
                "Configuration file or directory not found: {}",
                path.display()
            )));
        }

        let config_path = if path.is_dir() {
            path.join(CONFIG_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read config from {}", config_path.display()))
            .map_err(DeployError::configuration)?;
        let config: Self = toml::from_str(&content)
            .context("Failed to parse config file as TOML")
            .map_err(DeployError::configuration)?;
        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new("pairfactory-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(CONFIG_FILENAME);

        let original = DeployConfig {
            network: "sepolia".to_string(),
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            gas: Some(5_000_000),
            accounts: vec!["0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()],
            roles: AccountRoles {
                deployer: None,
                fee_to_setter: Some("0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap()),
            },
            ..Default::default()
        };

        original.save_to_file(&path).expect("Failed to save config");

        // Loading from the directory resolves the default file name.
        let loaded = DeployConfig::load_from_file(temp_dir.path()).expect("Failed to load config");
        assert_eq!(original, loaded, "Loaded config should match original");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: DeployConfig = toml::from_str(
            r#"
            network = "development"
            rpc_url = "http://localhost:8545"
            registry_path = "deployments.json"
            "#,
        )
        .unwrap();

        assert!(config.verify_fee_to_setter);
        assert!(config.accounts.is_empty());
        assert_eq!(config.roles, AccountRoles::default());
        assert_eq!(config.artifacts, ArtifactPaths::default());
        assert_eq!(config.confirmation, ConfirmationPolicy::default());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new("pairfactory-test").expect("Failed to create temp dir");
        let err = DeployConfig::load_from_file(&temp_dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, DeployError::Configuration(_)));
    }

    #[test]
    fn test_rpc_url_validation() {
        let mut config = DeployConfig::default();
        assert!(config.rpc_url().is_ok());

        config.rpc_url = "ws://localhost:8546".to_string();
        assert!(config.rpc_url().is_err());

        config.rpc_url = "not a url".to_string();
        assert!(matches!(config.rpc_url(), Err(DeployError::Configuration(_))));
    }
}
