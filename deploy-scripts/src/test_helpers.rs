//! An in-memory ledger that stands in for a node in tests.
//!
//! The ledger knows how to "deploy" the Balloons token and the DEX by name,
//! and models the parts of their behavior the deployment depends on: ERC20
//! balances and allowances, the one-time `init` of the exchange, native value
//! transfers and gas charges.

use std::{collections::HashMap, sync::Mutex};

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolInterface, SolValue};

use crate::{
    constants::{BALLOONS_CONTRACT_NAME, DEX_CONTRACT_NAME, LOCAL_CHAIN_IDS},
    environment::{CallRequest, DeployEnvironment, DeployRequest, DeploymentRecord, TxOutcome},
    errors::ScriptError,
    solidity::{IBalloons::IBalloonsCalls, IDex::IDexCalls},
    units::TokenAmount,
};

/// The chain ID reported by the mock ledger
pub const MOCK_CHAIN_ID: u64 = LOCAL_CHAIN_IDS[0];

/// The gas price, in wei, charged by the mock ledger
pub const MOCK_GAS_PRICE: u64 = 1_000_000_000;

/// The gas used by a contract deployment
pub const DEPLOY_GAS: u64 = 1_000_000;

/// The gas used by a token method call
pub const TOKEN_CALL_GAS: u64 = 50_000;

/// The gas used by the DEX `init` call
pub const DEX_INIT_GAS: u64 = 120_000;

/// The gas limit applied to calls that do not set one
pub const DEFAULT_CALL_GAS_LIMIT: u64 = 1_000_000;

/// The Balloons minted to the deployer on construction, in whole tokens
pub const BALLOONS_INITIAL_SUPPLY: &str = "1000";

/// A transaction the ledger was asked to execute, whether or not it succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCall {
    /// The contract called
    pub to: Address,
    /// The function selector of the call
    pub selector: [u8; 4],
    /// The native value attached
    pub value: U256,
}

/// A mock ERC20 token
#[derive(Debug, Default)]
struct MockToken {
    /// Token balances
    balances: HashMap<Address, U256>,
    /// Allowances, keyed by (owner, spender)
    allowances: HashMap<(Address, Address), U256>,
}

impl MockToken {
    /// The balance of `owner`
    fn balance(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    /// The amount `spender` may pull from `owner`
    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or_default()
    }

    /// The sum of all balances
    fn total_supply(&self) -> U256 {
        self.balances.values().fold(U256::ZERO, |acc, b| acc + *b)
    }

    /// Move `value` tokens from `from` to `to`
    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), String> {
        let from_balance = self.balance(from);
        if from_balance < value {
            return Err("ERC20: transfer amount exceeds balance".to_string());
        }

        self.balances.insert(from, from_balance - value);
        *self.balances.entry(to).or_default() += value;
        Ok(())
    }

    /// Move `value` tokens from `from` to `to` on behalf of `spender`
    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), String> {
        let allowance = self.allowance(from, spender);
        if allowance < value {
            return Err("ERC20: insufficient allowance".to_string());
        }

        self.transfer(from, to, value)?;
        self.allowances.insert((from, spender), allowance - value);
        Ok(())
    }
}

/// A mock Balloons / ether exchange
#[derive(Debug)]
struct MockDex {
    /// The token the exchange trades
    token: Address,
    /// The total liquidity minted
    total_liquidity: U256,
    /// Liquidity per provider
    liquidity: HashMap<Address, U256>,
}

/// A contract living on the mock ledger
#[derive(Debug)]
enum MockContract {
    /// A Balloons token
    Token(MockToken),
    /// A DEX
    Dex(MockDex),
}

/// The mutable state of the ledger
#[derive(Debug, Default)]
struct LedgerState {
    /// Native balances
    native: HashMap<Address, U256>,
    /// The deployer's nonce
    nonce: u64,
    /// The latest block number
    block: u64,
    /// Deployed contracts
    contracts: HashMap<Address, MockContract>,
    /// Every transaction submitted, in order
    sent: Vec<SentCall>,
}

impl LedgerState {
    /// The native balance of `address`
    fn native_balance(&self, address: Address) -> U256 {
        self.native.get(&address).copied().unwrap_or_default()
    }

    /// Move native value between accounts, the caller having checked funds
    fn move_native(&mut self, from: Address, to: Address, value: U256) {
        let from_balance = self.native_balance(from);
        self.native.insert(from, from_balance - value);
        *self.native.entry(to).or_default() += value;
    }

    /// Burn the gas fee for `gas` units from `payer`
    fn charge_gas(&mut self, payer: Address, gas: u64) {
        let balance = self.native_balance(payer);
        self.native.insert(payer, balance.saturating_sub(gas_cost(gas)));
    }

    /// Include a transaction from `payer`, returning its outcome
    fn include(&mut self, payer: Address, gas: u64) -> TxOutcome {
        self.charge_gas(payer, gas);
        let transaction_hash = tx_hash(self.nonce);
        self.nonce += 1;
        self.block += 1;

        TxOutcome {
            transaction_hash,
            block_number: Some(self.block),
            gas_used: gas,
        }
    }

    /// The mock token at `address`
    fn token_mut(&mut self, address: Address) -> Result<&mut MockToken, String> {
        match self.contracts.get_mut(&address) {
            Some(MockContract::Token(token)) => Ok(token),
            _ => Err(format!("{address} is not a token")),
        }
    }

    /// Execute a state-changing call from `from`, returning the gas it used
    fn execute(&mut self, from: Address, request: &CallRequest) -> Result<u64, String> {
        let is_token = match self.contracts.get(&request.to) {
            Some(MockContract::Token(_)) => true,
            Some(MockContract::Dex(_)) => false,
            None => return Err(format!("{} has no code", request.to)),
        };

        if is_token {
            if !request.value.is_zero() {
                return Err("token methods are not payable".to_string());
            }

            let call = IBalloonsCalls::abi_decode(&request.data).map_err(|e| e.to_string())?;
            let token = self.token_mut(request.to)?;
            match call {
                IBalloonsCalls::transfer(c) => token.transfer(from, c.to, c.value)?,
                IBalloonsCalls::approve(c) => {
                    token.allowances.insert((from, c.spender), c.value);
                }
                IBalloonsCalls::transferFrom(c) => token.transfer_from(from, c.from, c.to, c.value)?,
                _ => return Err("view methods cannot be transacted".to_string()),
            }

            return Ok(TOKEN_CALL_GAS);
        }

        match IDexCalls::abi_decode(&request.data).map_err(|e| e.to_string())? {
            IDexCalls::init(c) => self.dex_init(from, request.to, c.tokens, request.value)?,
            _ => return Err("view methods cannot be transacted".to_string()),
        }

        Ok(DEX_INIT_GAS)
    }

    /// Seed the exchange at `dex` with `tokens` pulled from `from` and `value` ether
    fn dex_init(
        &mut self,
        from: Address,
        dex: Address,
        tokens: U256,
        value: U256,
    ) -> Result<(), String> {
        let token = match self.contracts.get(&dex) {
            Some(MockContract::Dex(d)) if !d.total_liquidity.is_zero() => {
                return Err("DEX: init - already has liquidity".to_string())
            }
            Some(MockContract::Dex(d)) => d.token,
            _ => return Err(format!("{dex} is not an exchange")),
        };

        self.token_mut(token)?.transfer_from(dex, from, dex, tokens)?;

        let liquidity = self.native_balance(dex) + value;
        if let Some(MockContract::Dex(d)) = self.contracts.get_mut(&dex) {
            d.total_liquidity = liquidity;
            d.liquidity.insert(from, liquidity);
        }

        Ok(())
    }

    /// Simulate a view call against `to`
    fn view(&self, to: Address, data: &Bytes) -> Result<Bytes, String> {
        let encoded = match self.contracts.get(&to) {
            Some(MockContract::Token(token)) => {
                match IBalloonsCalls::abi_decode(data).map_err(|e| e.to_string())? {
                    IBalloonsCalls::balanceOf(c) => token.balance(c.account).abi_encode(),
                    IBalloonsCalls::allowance(c) => token.allowance(c.owner, c.spender).abi_encode(),
                    IBalloonsCalls::totalSupply(_) => token.total_supply().abi_encode(),
                    _ => return Err("state-changing methods cannot be called".to_string()),
                }
            }
            Some(MockContract::Dex(dex)) => {
                match IDexCalls::abi_decode(data).map_err(|e| e.to_string())? {
                    IDexCalls::token(_) => dex.token.abi_encode(),
                    IDexCalls::totalLiquidity(_) => dex.total_liquidity.abi_encode(),
                    IDexCalls::liquidity(c) => {
                        dex.liquidity.get(&c.provider).copied().unwrap_or_default().abi_encode()
                    }
                    _ => return Err("state-changing methods cannot be called".to_string()),
                }
            }
            None => return Ok(Bytes::new()),
        };

        Ok(encoded.into())
    }
}

/// The fee for `gas` units at the mock gas price
pub fn gas_cost(gas: u64) -> U256 {
    U256::from(gas) * U256::from(MOCK_GAS_PRICE)
}

/// A deterministic transaction hash for the transaction with `nonce`
fn tx_hash(nonce: u64) -> B256 {
    keccak256(nonce.to_be_bytes())
}

/// An in-memory ledger implementing [`DeployEnvironment`]
#[derive(Debug)]
pub struct MockLedger {
    /// The deployer account
    deployer: Address,
    /// The ledger state
    state: Mutex<LedgerState>,
}

impl MockLedger {
    /// A ledger in which `deployer` holds `funds` wei
    pub fn new(deployer: Address, funds: U256) -> Self {
        let mut state = LedgerState::default();
        state.native.insert(deployer, funds);

        Self {
            deployer,
            state: Mutex::new(state),
        }
    }

    /// A ledger in which `deployer` holds the given amount of ether
    pub fn with_ether(deployer: Address, ether: &str) -> Self {
        let funds = TokenAmount::ether(ether).map(|a| a.as_u256()).unwrap_or_default();
        Self::new(deployer, funds)
    }

    /// Every transaction submitted to the ledger, in order
    pub fn sent_calls(&self) -> Vec<SentCall> {
        self.state.lock().unwrap().sent.clone()
    }

    /// The number of contracts deployed on the ledger
    pub fn num_contracts(&self) -> usize {
        self.state.lock().unwrap().contracts.len()
    }

    /// Lock the ledger state
    fn state(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap()
    }
}

impl DeployEnvironment for MockLedger {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn chain_id(&self) -> Result<u64, ScriptError> {
        Ok(MOCK_CHAIN_ID)
    }

    async fn deploy(&self, request: DeployRequest) -> Result<DeploymentRecord, ScriptError> {
        let mut state = self.state();

        let available = state.native_balance(self.deployer);
        let required = gas_cost(DEPLOY_GAS);
        if available < required {
            return Err(ScriptError::InsufficientFunds(format!(
                "deploying {} requires {required} wei, deployer holds {available}",
                request.name
            )));
        }

        let contract = match request.name.as_str() {
            BALLOONS_CONTRACT_NAME => {
                let supply = TokenAmount::parse(BALLOONS_INITIAL_SUPPLY, 18)?;
                let mut token = MockToken::default();
                token.balances.insert(self.deployer, supply.as_u256());
                MockContract::Token(token)
            }
            DEX_CONTRACT_NAME => {
                let token = Address::abi_decode(&request.constructor_args)
                    .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
                MockContract::Dex(MockDex {
                    token,
                    total_liquidity: U256::ZERO,
                    liquidity: HashMap::new(),
                })
            }
            other => {
                return Err(ScriptError::ContractDeployment(format!("no mock for {other}")))
            }
        };

        let address = self.deployer.create(state.nonce);
        state.contracts.insert(address, contract);
        let outcome = state.include(self.deployer, DEPLOY_GAS);

        Ok(DeploymentRecord {
            address,
            transaction_hash: Some(outcome.transaction_hash),
            block_number: outcome.block_number,
            gas_used: Some(outcome.gas_used),
            args: request.display_args,
        })
    }

    async fn send(&self, request: CallRequest) -> Result<TxOutcome, ScriptError> {
        let mut state = self.state();

        let gas_limit = request.gas_limit.unwrap_or(DEFAULT_CALL_GAS_LIMIT);
        let available = state.native_balance(self.deployer);
        let required = gas_cost(gas_limit) + request.value;
        if available < required {
            return Err(ScriptError::InsufficientFunds(format!(
                "call requires {required} wei, deployer holds {available}"
            )));
        }

        let mut selector = [0u8; 4];
        if let Some(prefix) = request.data.get(..4) {
            selector.copy_from_slice(prefix);
        }
        state.sent.push(SentCall {
            to: request.to,
            selector,
            value: request.value,
        });

        let result = state.execute(self.deployer, &request).and_then(|gas_used| {
            if gas_used > gas_limit {
                Err("out of gas".to_string())
            } else {
                Ok(gas_used)
            }
        });

        match result {
            Ok(gas_used) => {
                state.move_native(self.deployer, request.to, request.value);
                Ok(state.include(self.deployer, gas_used))
            }
            Err(reason) => {
                state.include(self.deployer, gas_limit.min(TOKEN_CALL_GAS));
                Err(ScriptError::ContractInteraction(format!("execution reverted: {reason}")))
            }
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError> {
        self.state()
            .view(to, &data)
            .map_err(|reason| ScriptError::ContractInteraction(format!("call reverted: {reason}")))
    }

    async fn balance(&self, address: Address) -> Result<U256, ScriptError> {
        Ok(self.state().native_balance(address))
    }

    async fn gas_price(&self) -> Result<u128, ScriptError> {
        Ok(MOCK_GAS_PRICE.into())
    }
}
