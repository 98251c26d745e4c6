//! Persistent records of deployed contracts.
//!
//! Deployments are kept per chain, in `<dir>/<chain_id>.json`, keyed by
//! contract name. Every insertion is written through to disk so that a run
//! aborted halfway still leaves the contracts it did deploy on record.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{constants::JSON_EXTENSION, environment::DeploymentRecord, errors::ScriptError};

/// The contents of a deployments file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentsFile {
    /// The chain the contracts are deployed on
    pub chain_id: u64,
    /// The deployment records, keyed by contract name
    #[serde(default)]
    pub deployments: BTreeMap<String, DeploymentRecord>,
}

/// The deployments recorded for a single chain
#[derive(Debug, Clone)]
pub struct Deployments {
    /// The file the deployments are persisted to, if any
    path: Option<PathBuf>,
    /// The recorded deployments
    file: DeploymentsFile,
}

impl Deployments {
    /// A deployments store that is never written to disk
    pub fn in_memory(chain_id: u64) -> Self {
        Self {
            path: None,
            file: DeploymentsFile {
                chain_id,
                ..Default::default()
            },
        }
    }

    /// Open the deployments for `chain_id` under `dir`, starting empty if
    /// none have been recorded yet
    pub fn open(dir: &Path, chain_id: u64) -> Result<Self, ScriptError> {
        let path = dir.join(format!("{chain_id}.{JSON_EXTENSION}"));
        let file = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| ScriptError::ReadDeployments(format!("{}: {e}", path.display())))?;
            let file: DeploymentsFile = serde_json::from_str(&contents)
                .map_err(|e| ScriptError::ReadDeployments(format!("{}: {e}", path.display())))?;

            if file.chain_id != chain_id {
                return Err(ScriptError::ReadDeployments(format!(
                    "{} records chain {}, expected {chain_id}",
                    path.display(),
                    file.chain_id
                )));
            }
            file
        } else {
            DeploymentsFile {
                chain_id,
                ..Default::default()
            }
        };

        Ok(Self {
            path: Some(path),
            file,
        })
    }

    /// The chain the deployments belong to
    pub fn chain_id(&self) -> u64 {
        self.file.chain_id
    }

    /// The file the deployments are persisted to, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The deployment record for the given contract, if any
    pub fn get(&self, name: &str) -> Option<&DeploymentRecord> {
        self.file.deployments.get(name)
    }

    /// The address of the given contract
    pub fn address(&self, name: &str) -> Result<Address, ScriptError> {
        self.get(name)
            .map(|record| record.address)
            .ok_or_else(|| ScriptError::MissingDeployment(name.to_string()))
    }

    /// Record a deployment, persisting it immediately
    pub fn insert(&mut self, name: &str, record: DeploymentRecord) -> Result<(), ScriptError> {
        self.file.deployments.insert(name.to_string(), record);
        self.save()
    }

    /// Iterate over the recorded deployments
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeploymentRecord)> {
        self.file.deployments.iter()
    }

    /// Write the deployments to disk
    fn save(&self) -> Result<(), ScriptError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ScriptError::WriteDeployments(format!("{}: {e}", parent.display())))?;
        }

        let contents = serde_json::to_string_pretty(&self.file)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(path, contents)
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {e}", path.display())))?;

        debug!("wrote deployments to {}", path.display());
        Ok(())
    }
}
