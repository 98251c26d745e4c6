//! The seam between the deploy scripts and the ledger they run against.
//!
//! A [`DeployEnvironment`] can create contracts from creation bytecode and
//! send or simulate calls against deployed contracts, always on behalf of a
//! single deployer account. The scripts never talk to a node directly, which
//! lets the same sequence run against a JSON-RPC endpoint or an in-memory
//! ledger.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::errors::ScriptError;

/// A request to deploy a contract from the deployer account
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// The name of the contract being deployed
    pub name: String,
    /// The contract creation bytecode
    pub bytecode: Bytes,
    /// The ABI-encoded constructor arguments, appended to the bytecode
    pub constructor_args: Bytes,
    /// Human-readable renderings of the constructor arguments, kept in the
    /// deployment record
    pub display_args: Vec<String>,
    /// Whether to log the deployment at `info` level
    pub log: bool,
    /// Whether to mine a block right after submitting the deployment.
    /// Only honored on local development networks.
    pub auto_mine: bool,
}

/// The record of a completed deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// The address the contract was deployed at
    pub address: Address,
    /// The hash of the deployment transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// The block the deployment transaction was included in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// The gas used by the deployment transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    /// The constructor arguments the contract was deployed with
    #[serde(default)]
    pub args: Vec<String>,
}

/// A state-changing call against a deployed contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// The contract being called
    pub to: Address,
    /// The calldata
    pub data: Bytes,
    /// The native value attached to the call
    pub value: U256,
    /// An explicit gas limit, estimated by the node when absent
    pub gas_limit: Option<u64>,
}

impl CallRequest {
    /// A call with no value and no explicit gas limit
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            value: U256::ZERO,
            gas_limit: None,
        }
    }

    /// Attach native value to the call
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set an explicit gas limit for the call
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// The outcome of a mined, successful transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    /// The transaction hash
    pub transaction_hash: B256,
    /// The block the transaction was included in
    pub block_number: Option<u64>,
    /// The gas used by the transaction
    pub gas_used: u64,
}

/// A ledger the deploy scripts can deploy to and transact against
#[allow(async_fn_in_trait)]
pub trait DeployEnvironment {
    /// The account that signs and pays for every transaction
    fn deployer(&self) -> Address;

    /// The chain ID of the ledger
    async fn chain_id(&self) -> Result<u64, ScriptError>;

    /// Deploy a contract and wait for the deployment to be mined
    async fn deploy(&self, request: DeployRequest) -> Result<DeploymentRecord, ScriptError>;

    /// Send a transaction and wait for it to be mined successfully
    async fn send(&self, request: CallRequest) -> Result<TxOutcome, ScriptError>;

    /// Simulate a read-only call, returning the raw return data
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError>;

    /// The native balance of an account
    async fn balance(&self, address: Address) -> Result<U256, ScriptError>;

    /// The current gas price, in wei
    async fn gas_price(&self) -> Result<u128, ScriptError>;
}

/// Whether the given chain ID belongs to a local development network
pub fn is_local_chain(chain_id: u64) -> bool {
    crate::constants::LOCAL_CHAIN_IDS.contains(&chain_id)
}
