//! Loading of compiled contract artifacts.
//!
//! Both Hardhat artifacts (`bytecode` as a hex string) and Foundry artifacts
//! (`bytecode` as an object with an `object` field) are accepted.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::json_abi::JsonAbi;
use alloy_primitives::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::{HARDHAT_SOURCES_DIR, JSON_EXTENSION, SOLIDITY_EXTENSION},
    errors::ScriptError,
};

/// The bytecode field of an artifact, in either of the supported layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    /// Hardhat: `"bytecode": "0x..."`
    Hex(Bytes),
    /// Foundry: `"bytecode": { "object": "0x...", ... }`
    Object {
        /// The creation bytecode
        object: Bytes,
    },
}

impl From<ArtifactBytecode> for Bytes {
    fn from(bytecode: ArtifactBytecode) -> Self {
        match bytecode {
            ArtifactBytecode::Hex(bytes) | ArtifactBytecode::Object { object: bytes } => bytes,
        }
    }
}

/// The subset of an artifact file the scripts need
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract ABI
    abi: JsonAbi,
    /// The creation bytecode
    bytecode: ArtifactBytecode,
}

/// A compiled contract, ready to be deployed
#[derive(Debug, Clone)]
pub struct Artifact {
    /// The contract name
    pub name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The contract creation bytecode
    pub bytecode: Bytes,
}

impl Artifact {
    /// Parse an artifact from the contents of an artifact file
    pub fn from_json(name: &str, json: &str) -> Result<Self, ScriptError> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: {e}")))?;

        let bytecode: Bytes = raw.bytecode.into();
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{name} has no creation bytecode, is it abstract or an interface?"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            abi: raw.abi,
            bytecode,
        })
    }

    /// Read an artifact from a file
    pub fn from_file(name: &str, path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;
        Self::from_json(name, &contents)
    }

    /// Ensure the contract's constructor takes exactly `num_args` arguments
    pub fn check_constructor_args(&self, num_args: usize) -> Result<(), ScriptError> {
        let expected = self.abi.constructor.as_ref().map_or(0, |c| c.inputs.len());
        if expected != num_args {
            return Err(ScriptError::CalldataConstruction(format!(
                "{} constructor takes {expected} arguments, got {num_args}",
                self.name
            )));
        }

        Ok(())
    }
}

/// A set of artifacts, keyed by contract name
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    /// The artifacts
    artifacts: HashMap<String, Artifact>,
}

impl Artifacts {
    /// Load the artifacts for the given contracts from `dir`
    pub fn load(dir: &Path, names: &[&str]) -> Result<Self, ScriptError> {
        let mut artifacts = Self::default();
        for name in names {
            let path = find_artifact(dir, name)?;
            debug!("loading {name} artifact from {}", path.display());
            artifacts.insert(Artifact::from_file(name, &path)?);
        }

        Ok(artifacts)
    }

    /// Add an artifact to the set
    pub fn insert(&mut self, artifact: Artifact) {
        self.artifacts.insert(artifact.name.clone(), artifact);
    }

    /// Get the artifact for the given contract
    pub fn get(&self, name: &str) -> Result<&Artifact, ScriptError> {
        self.artifacts
            .get(name)
            .ok_or_else(|| ScriptError::ArtifactParsing(format!("no artifact loaded for {name}")))
    }
}

impl FromIterator<Artifact> for Artifacts {
    fn from_iter<I: IntoIterator<Item = Artifact>>(iter: I) -> Self {
        let mut artifacts = Self::default();
        iter.into_iter().for_each(|a| artifacts.insert(a));
        artifacts
    }
}

/// The locations an artifact for `name` may live at under `dir`
fn candidate_paths(dir: &Path, name: &str) -> [PathBuf; 3] {
    let file = format!("{name}.{JSON_EXTENSION}");
    let source_dir = format!("{name}.{SOLIDITY_EXTENSION}");
    [
        dir.join(&file),
        dir.join(HARDHAT_SOURCES_DIR).join(&source_dir).join(&file),
        dir.join(&source_dir).join(&file),
    ]
}

/// Find the artifact file for `name` under `dir`
fn find_artifact(dir: &Path, name: &str) -> Result<PathBuf, ScriptError> {
    candidate_paths(dir, name)
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| {
            ScriptError::ArtifactParsing(format!(
                "could not find an artifact for {name} under {}",
                dir.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::{Artifact, Artifacts};

    /// A Hardhat artifact with a one-argument constructor
    const HARDHAT_ARTIFACT: &str = r#"{
        "_format": "hh-sol-artifact-1",
        "contractName": "DEX",
        "abi": [
            {
                "type": "constructor",
                "inputs": [{ "name": "token_addr", "type": "address", "internalType": "address" }],
                "stateMutability": "nonpayable"
            }
        ],
        "bytecode": "0x6080604052",
        "deployedBytecode": "0x6080"
    }"#;

    /// A Foundry artifact without a constructor
    const FOUNDRY_ARTIFACT: &str = r#"{
        "abi": [],
        "bytecode": { "object": "0x60806040", "linkReferences": {} },
        "deployedBytecode": { "object": "0x6080", "linkReferences": {} }
    }"#;

    #[test]
    fn test_parse_hardhat_artifact() {
        let artifact = Artifact::from_json("DEX", HARDHAT_ARTIFACT).unwrap();
        assert_eq!(artifact.bytecode.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        assert!(artifact.check_constructor_args(1).is_ok());
        assert!(artifact.check_constructor_args(0).is_err());
    }

    #[test]
    fn test_parse_foundry_artifact() {
        let artifact = Artifact::from_json("Balloons", FOUNDRY_ARTIFACT).unwrap();
        assert_eq!(artifact.bytecode.len(), 4);
        assert!(artifact.check_constructor_args(0).is_ok());
    }

    #[test]
    fn test_rejects_empty_bytecode() {
        let json = r#"{ "abi": [], "bytecode": "0x" }"#;
        assert!(Artifact::from_json("IERC20", json).is_err());
    }

    #[test]
    fn test_load_from_hardhat_layout() {
        let dir = env::temp_dir().join(format!("artifacts-{}", std::process::id()));
        let source_dir = dir.join("contracts").join("DEX.sol");
        fs::create_dir_all(&source_dir).unwrap();
        fs::write(source_dir.join("DEX.json"), HARDHAT_ARTIFACT).unwrap();
        fs::write(dir.join("Balloons.json"), FOUNDRY_ARTIFACT).unwrap();

        let artifacts = Artifacts::load(&dir, &["Balloons", "DEX"]).unwrap();
        assert_eq!(artifacts.get("DEX").unwrap().name, "DEX");
        assert!(artifacts.get("Balloons").is_ok());
        assert!(Artifacts::load(&dir, &["Missing"]).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
