//! Compiled contract artifacts.
//!
//! Both Truffle (`"bytecode": "0x.."`) and Foundry (`"bytecode": { "object": "0x.." }`) JSON
//! layouts are accepted.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use reward_deploy_types::{ArtifactError, ContractArtifact, DeploymentIntent};
use serde::Deserialize;

use crate::abi::constructor_args;

#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

#[derive(Deserialize)]
struct ArtifactFile {
    #[serde(rename = "contractName", default)]
    contract_name: Option<String>,
    #[serde(default)]
    bytecode: Option<BytecodeField>,
}

/// Creation bytecode of the reward contract, read from a build artifact.
#[derive(Clone, Debug)]
pub struct JsonArtifact {
    pub contract_name: Option<String>,
    bytecode: Vec<u8>,
}

impl JsonArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading artifact {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid artifact {}", path.display()))
    }

    pub fn parse(json: &str) -> Result<Self> {
        let file: ArtifactFile =
            serde_json::from_str(json).context("failed parsing artifact JSON")?;
        let hex_code = match file.bytecode.ok_or(ArtifactError::MissingBytecode)? {
            BytecodeField::Hex(s) | BytecodeField::Object { object: s } => s,
        };
        Ok(Self {
            contract_name: file.contract_name,
            bytecode: decode_bytecode(&hex_code)?,
        })
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }
}

impl ContractArtifact for JsonArtifact {
    fn creation_code(&self, intent: &DeploymentIntent) -> Result<Vec<u8>, ArtifactError> {
        let mut code = self.bytecode.clone();
        code.extend_from_slice(&constructor_args(intent));
        Ok(code)
    }
}

fn decode_bytecode(s: &str) -> Result<Vec<u8>, ArtifactError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Err(ArtifactError::MissingBytecode);
    }
    // Solidity leaves `__$<hash>$__` placeholders for libraries that still need linking.
    if s.contains("__") {
        return Err(ArtifactError::UnlinkedBytecode);
    }
    hex::decode(s).map_err(|e| ArtifactError::InvalidBytecode(e.to_string()))
}
