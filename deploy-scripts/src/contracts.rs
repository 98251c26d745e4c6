//! Typed handles for the deployed contracts.
//!
//! Each handle pairs a contract address with a [`DeployEnvironment`] and
//! encodes its methods' calldata, so the deployment sequence reads like
//! calls on the contract itself.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolType, SolValue};

use crate::{
    environment::{CallRequest, DeployEnvironment, TxOutcome},
    errors::ScriptError,
    solidity::{IBalloons, IDex},
    units::TokenAmount,
};

/// Decode the return data of a view call
fn decode_return<T>(method: &str, data: &Bytes) -> Result<T, ScriptError>
where
    T: SolValue + From<<T::SolType as SolType>::RustType>,
{
    T::abi_decode(data)
        .map_err(|e| ScriptError::ContractInteraction(format!("decoding `{method}` return: {e}")))
}

/// A handle to a deployed Balloons token
pub struct Balloons<'a, E> {
    /// The token address
    address: Address,
    /// The environment calls are sent through
    env: &'a E,
}

impl<'a, E: DeployEnvironment> Balloons<'a, E> {
    /// Create a handle for the token deployed at `address`
    pub fn new(address: Address, env: &'a E) -> Self {
        Self { address, env }
    }

    /// The token address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Transfer `amount` tokens from the deployer to `to`
    pub async fn transfer(
        &self,
        to: Address,
        amount: TokenAmount,
    ) -> Result<TxOutcome, ScriptError> {
        let calldata = IBalloons::transferCall {
            to,
            value: amount.into(),
        }
        .abi_encode();
        self.env.send(CallRequest::new(self.address, calldata)).await
    }

    /// Allow `spender` to pull up to `amount` tokens from the deployer
    pub async fn approve(
        &self,
        spender: Address,
        amount: TokenAmount,
    ) -> Result<TxOutcome, ScriptError> {
        let calldata = IBalloons::approveCall {
            spender,
            value: amount.into(),
        }
        .abi_encode();
        self.env.send(CallRequest::new(self.address, calldata)).await
    }

    /// The token balance of `account`
    pub async fn balance_of(&self, account: Address) -> Result<U256, ScriptError> {
        let calldata = IBalloons::balanceOfCall { account }.abi_encode();
        let ret = self.env.call(self.address, calldata.into()).await?;
        decode_return("balanceOf", &ret)
    }

    /// The amount `spender` may still pull from `owner`
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ScriptError> {
        let calldata = IBalloons::allowanceCall { owner, spender }.abi_encode();
        let ret = self.env.call(self.address, calldata.into()).await?;
        decode_return("allowance", &ret)
    }
}

/// A handle to a deployed DEX
pub struct Dex<'a, E> {
    /// The exchange address
    address: Address,
    /// The environment calls are sent through
    env: &'a E,
}

impl<'a, E: DeployEnvironment> Dex<'a, E> {
    /// Create a handle for the exchange deployed at `address`
    pub fn new(address: Address, env: &'a E) -> Self {
        Self { address, env }
    }

    /// The exchange address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Seed the exchange's pool with `tokens` Balloons and `value` ether.
    ///
    /// The exchange pulls the tokens from the deployer, so they must have been
    /// approved beforehand. Only succeeds once per exchange.
    pub async fn init(
        &self,
        tokens: TokenAmount,
        value: TokenAmount,
        gas_limit: u64,
    ) -> Result<TxOutcome, ScriptError> {
        let calldata = IDex::initCall {
            tokens: tokens.into(),
        }
        .abi_encode();
        let request = CallRequest::new(self.address, calldata)
            .with_value(value.into())
            .with_gas_limit(gas_limit);
        self.env.send(request).await
    }

    /// The token the exchange trades against ether
    pub async fn token(&self) -> Result<Address, ScriptError> {
        let calldata = IDex::tokenCall {}.abi_encode();
        let ret = self.env.call(self.address, calldata.into()).await?;
        decode_return("token", &ret)
    }

    /// The total liquidity minted by the exchange
    pub async fn total_liquidity(&self) -> Result<U256, ScriptError> {
        let calldata = IDex::totalLiquidityCall {}.abi_encode();
        let ret = self.env.call(self.address, calldata.into()).await?;
        decode_return("totalLiquidity", &ret)
    }

    /// The liquidity owned by `provider`
    pub async fn liquidity(&self, provider: Address) -> Result<U256, ScriptError> {
        let calldata = IDex::liquidityCall { provider }.abi_encode();
        let ret = self.env.call(self.address, calldata.into()).await?;
        decode_return("liquidity", &ret)
    }

    /// The exchange's native currency reserve
    pub async fn native_reserve(&self) -> Result<U256, ScriptError> {
        self.env.balance(self.address).await
    }
}
