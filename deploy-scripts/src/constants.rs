//! Constants used in the deploy scripts

use alloy_primitives::{address, Address};

/// The name of the Balloons token contract, as it appears in artifacts and
/// in the deployments file
pub const BALLOONS_CONTRACT_NAME: &str = "Balloons";

/// The name of the DEX contract, as it appears in artifacts and in the
/// deployments file
pub const DEX_CONTRACT_NAME: &str = "DEX";

/// The tags under which the Balloons / DEX deployment unit can be selected
pub const BALLOONS_DEX_TAGS: [&str; 2] = [BALLOONS_CONTRACT_NAME, DEX_CONTRACT_NAME];

/// The address that receives the initial Balloons transfer when no other
/// recipient is configured
pub const DEFAULT_RECIPIENT: Address = address!("5D75528B068890f20E73618057B13739B5AecCCb");

/// The number of Balloons (in whole tokens) sent to the recipient
pub const DEFAULT_RECIPIENT_AMOUNT: &str = "10";

/// The number of Balloons (in whole tokens) the DEX is seeded with
pub const DEFAULT_LIQUIDITY_TOKENS: &str = "0.1";

/// The amount of ether the DEX is seeded with
pub const DEFAULT_LIQUIDITY_VALUE: &str = "0.1";

/// The gas limit attached to the DEX `init` call
pub const DEFAULT_INIT_GAS_LIMIT: u64 = 200_000;

/// The number of decimals used by the Balloons token
pub const TOKEN_DECIMALS: u8 = 18;

/// The number of decimals of the native currency
pub const ETHER_DECIMALS: u8 = 18;

/// The default devnet private key, the first default account of a Hardhat or
/// Anvil node
pub const DEFAULT_DEVNET_PKEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// The default devnet RPC URL
pub const DEFAULT_DEVNET_HOSTPORT: &str = "http://127.0.0.1:8545";

/// The default directory holding compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The default directory the deployments files are written to
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The extension of artifact and deployments files
pub const JSON_EXTENSION: &str = "json";

/// The directory under which Hardhat nests per-source artifacts
pub const HARDHAT_SOURCES_DIR: &str = "contracts";

/// The extension of Solidity source files, used in artifact directory names
pub const SOLIDITY_EXTENSION: &str = "sol";

/// Chain IDs of local development networks, on which auto-mining is honored
pub const LOCAL_CHAIN_IDS: [u64; 2] = [31337, 1337];

/// The JSON-RPC method used to mine a block on a local development network
pub const EVM_MINE_METHOD: &str = "evm_mine";

/// The substring a node uses to report an unfunded transaction
pub const INSUFFICIENT_FUNDS_MESSAGE: &str = "insufficient funds";

/// The gas budgeted for each contract deployment when checking the
/// deployer's funds up front
pub const ESTIMATED_DEPLOY_GAS: u64 = 3_000_000;

/// The gas budgeted for each token `transfer` / `approve` when checking the
/// deployer's funds up front
pub const ESTIMATED_TOKEN_CALL_GAS: u64 = 100_000;
