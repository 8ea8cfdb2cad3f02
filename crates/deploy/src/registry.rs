//! Per-network record of factory deployments.
//!
//! The registry is what makes a rerun reuse the factory instead of constructing a new one.
//! It is a JSON file keyed by network name.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy_core::primitives::{Address, B256};
use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, Result};

/// A factory deployed on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEntry {
    /// Chain ID reported by the node at deployment time.
    pub chain_id: u64,
    /// Factory address.
    pub address: Address,
    /// Construction transaction hash.
    pub transaction_hash: B256,
    /// Account that sent the construction transaction.
    pub deployer: Address,
    /// Fee-setter passed to the constructor.
    pub fee_to_setter: Address,
    /// Unix timestamp of the deployment.
    pub deployed_at: i64,
}

/// Factory deployments indexed by network name, backed by a JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRegistry {
    path: PathBuf,
    entries: BTreeMap<String, DeploymentEntry>,
}

impl DeploymentRegistry {
    /// Load the registry, or start an empty one if the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No deployment registry yet, starting empty");
            return Ok(Self {
                path: path.to_path_buf(),
                entries: BTreeMap::new(),
            });
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployment registry {}", path.display()))
            .map_err(DeployError::configuration)?;

        let entries = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deployment registry {}", path.display()))
            .map_err(DeployError::configuration)?;

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Write the registry back to its file as formatted JSON.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))
                .map_err(DeployError::configuration)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize deployment registry")
            .map_err(DeployError::configuration)?;

        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write deployment registry {}", self.path.display()))
            .map_err(DeployError::configuration)?;

        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "Deployment registry saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, network: &str) -> Option<&DeploymentEntry> {
        self.entries.get(network)
    }

    /// Record a deployment, replacing any previous entry for the network.
    pub fn insert(&mut self, network: &str, entry: DeploymentEntry) -> Option<DeploymentEntry> {
        self.entries.insert(network.to_string(), entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
