//! Compiled contract artifacts.

use std::path::Path;

use alloy_core::primitives::Bytes;
use anyhow::Context;
use serde_json::Value;

use crate::error::{DeployError, Result};

/// Creation bytecode of a compiled contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Load an artifact JSON file.
    ///
    /// Accepts Truffle artifacts (`"bytecode": "0x..."`) and Foundry/Hardhat artifacts
    /// (`"bytecode": { "object": "0x..." }`). The contract name falls back to the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))
            .map_err(DeployError::input)?;

        let fallback_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("contract");

        let artifact = Self::from_json(&content, fallback_name)?;

        tracing::debug!(
            path = %path.display(),
            contract = %artifact.contract_name,
            bytecode_len = artifact.bytecode.len(),
            "Artifact loaded"
        );

        Ok(artifact)
    }

    /// Parse an artifact from its JSON text.
    pub fn from_json(content: &str, fallback_name: &str) -> Result<Self> {
        let data: Value = serde_json::from_str(content)
            .context("Failed to parse artifact JSON")
            .map_err(DeployError::input)?;

        let contract_name = data["contractName"]
            .as_str()
            .unwrap_or(fallback_name)
            .to_string();

        let bytecode_hex = match &data["bytecode"] {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => obj.get("object").and_then(Value::as_str).ok_or_else(|| {
                DeployError::Input(format!("{contract_name}: bytecode object has no 'object' field"))
            })?,
            _ => {
                return Err(DeployError::Input(format!(
                    "{contract_name}: artifact has no bytecode"
                )));
            }
        };

        let bytecode = decode_bytecode(bytecode_hex)
            .map_err(|e| DeployError::Input(format!("{contract_name}: {e}")))?;

        Ok(Self {
            contract_name,
            bytecode,
        })
    }
}

/// Decode hex creation code, rejecting empty code and unlinked libraries.
pub fn decode_bytecode(hex_code: &str) -> Result<Bytes, String> {
    let stripped = hex_code.trim().trim_start_matches("0x");

    if stripped.is_empty() {
        return Err("bytecode is empty (abstract contract or interface?)".to_string());
    }

    // Solidity leaves `__$<hash>$__` or `__Name____` placeholders for unlinked libraries.
    if stripped.contains("__") {
        return Err("bytecode contains unlinked library placeholders".to_string());
    }

    hex::decode(stripped)
        .map(Bytes::from)
        .map_err(|e| format!("bytecode is not valid hex: {e}"))
}
