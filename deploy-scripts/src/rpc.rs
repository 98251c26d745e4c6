//! A [`DeployEnvironment`] backed by a JSON-RPC node

use std::str::FromStr;

use alloy::{
    network::{Ethereum, TransactionBuilder},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{http::reqwest::Url, TransportError},
};
use alloy_primitives::{Address, Bytes, U256};
use tracing::{debug, info, warn};

use crate::{
    constants::{EVM_MINE_METHOD, INSUFFICIENT_FUNDS_MESSAGE},
    environment::{
        is_local_chain, CallRequest, DeployEnvironment, DeployRequest, DeploymentRecord, TxOutcome,
    },
    errors::ScriptError,
};

/// Render an RPC error, including any revert data the node returned
fn describe_rpc_error(err: TransportError) -> String {
    match err {
        TransportError::ErrorResp(payload) => {
            let data = payload.data.map(|d| d.get().to_string()).unwrap_or_default();
            if data.is_empty() {
                payload.message.to_string()
            } else {
                format!("{} (data = {data})", payload.message)
            }
        }
        err => err.to_string(),
    }
}

/// Map an error returned while submitting a transaction, singling out
/// unfunded transactions
fn submission_error(err: TransportError, wrap: fn(String) -> ScriptError) -> ScriptError {
    let msg = describe_rpc_error(err);
    if msg.to_lowercase().contains(INSUFFICIENT_FUNDS_MESSAGE) {
        ScriptError::InsufficientFunds(msg)
    } else {
        wrap(msg)
    }
}

/// A deploy environment talking to a node over HTTP, signing with a local key
pub struct RpcEnvironment {
    /// The provider, with the deployer's wallet attached
    provider: DynProvider<Ethereum>,
    /// The deployer's address
    deployer: Address,
    /// The chain ID of the node
    chain_id: u64,
}

impl RpcEnvironment {
    /// Sets up the provider with which the scripts transact, reading in the
    /// deployer's private key and the RPC URL of the node
    pub async fn connect(priv_key: &str, rpc_url: &str) -> Result<Self, ScriptError> {
        let signer = PrivateKeySigner::from_str(priv_key)
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        let deployer = signer.address();

        let url =
            Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        let provider = ProviderBuilder::new().wallet(signer).connect_http(url);
        let provider = DynProvider::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(describe_rpc_error(e)))?;
        debug!("connected to chain {chain_id} as {deployer:#x}");

        Ok(Self {
            provider,
            deployer,
            chain_id,
        })
    }

    /// Mine a block on a local development network, so that the submitted
    /// transaction is included without waiting for the block interval
    async fn mine(&self) {
        if !is_local_chain(self.chain_id) {
            return;
        }

        let res = self
            .provider
            .raw_request::<_, serde_json::Value>(EVM_MINE_METHOD.into(), ())
            .await;
        if let Err(e) = res {
            warn!("could not auto-mine: {}", describe_rpc_error(e));
        }
    }

    /// Wait for a submitted transaction's receipt, failing if it reverted
    async fn wait_for_success(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
        wrap: fn(String) -> ScriptError,
    ) -> Result<TransactionReceipt, ScriptError> {
        let tx_hash = *pending.tx_hash();
        let receipt = pending.get_receipt().await.map_err(|e| wrap(e.to_string()))?;

        if !receipt.status() {
            return Err(wrap(format!("transaction {tx_hash:#x} reverted")));
        }

        Ok(receipt)
    }
}

impl DeployEnvironment for RpcEnvironment {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn chain_id(&self) -> Result<u64, ScriptError> {
        Ok(self.chain_id)
    }

    async fn deploy(&self, request: DeployRequest) -> Result<DeploymentRecord, ScriptError> {
        let mut code = request.bytecode.to_vec();
        code.extend_from_slice(&request.constructor_args);

        let tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_deploy_code(Bytes::from(code));

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| submission_error(e, ScriptError::ContractDeployment))?;

        let tx_hash = *pending.tx_hash();
        if request.log {
            info!("deploying {} (tx: {tx_hash:#x})...", request.name);
        } else {
            debug!("deploying {} (tx: {tx_hash:#x})...", request.name);
        }

        if request.auto_mine {
            self.mine().await;
        }

        let receipt = self.wait_for_success(pending, ScriptError::ContractDeployment).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractDeployment(format!(
                "receipt for {} has no contract address",
                request.name
            ))
        })?;

        if request.log {
            info!(
                "deployed {} at {address:#x} with {} gas",
                request.name, receipt.gas_used
            );
        }

        Ok(DeploymentRecord {
            address,
            transaction_hash: Some(receipt.transaction_hash),
            block_number: receipt.block_number,
            gas_used: Some(receipt.gas_used),
            args: request.display_args,
        })
    }

    async fn send(&self, request: CallRequest) -> Result<TxOutcome, ScriptError> {
        let mut tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_to(request.to)
            .with_input(request.data)
            .with_value(request.value);
        if let Some(gas_limit) = request.gas_limit {
            tx = tx.with_gas_limit(gas_limit);
        }

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| submission_error(e, ScriptError::ContractInteraction))?;
        let receipt = self.wait_for_success(pending, ScriptError::ContractInteraction).await?;

        Ok(TxOutcome {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_to(to)
            .with_input(data);

        self.provider
            .call(tx)
            .await
            .map_err(|e| ScriptError::ContractInteraction(describe_rpc_error(e)))
    }

    async fn balance(&self, address: Address) -> Result<U256, ScriptError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| ScriptError::ContractInteraction(describe_rpc_error(e)))
    }

    async fn gas_price(&self) -> Result<u128, ScriptError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ScriptError::ContractInteraction(describe_rpc_error(e)))
    }
}

#[cfg(test)]
mod tests {
    use alloy::{rpc::json_rpc::ErrorPayload, transports::TransportError};
    use serde_json::value::RawValue;

    use super::{describe_rpc_error, submission_error};
    use crate::errors::ScriptError;

    /// A JSON-RPC error response with the given message and data
    fn error_response(message: &'static str, data: Option<&str>) -> TransportError {
        TransportError::ErrorResp(ErrorPayload {
            code: -32000,
            message: message.into(),
            data: data.map(|d| RawValue::from_string(d.to_string()).unwrap()),
        })
    }

    #[test]
    fn test_unfunded_submission() {
        let err = error_response("insufficient funds for gas * price + value", None);
        let err = submission_error(err, ScriptError::ContractDeployment);

        assert_eq!(
            err,
            ScriptError::InsufficientFunds("insufficient funds for gas * price + value".to_string())
        );
    }

    #[test]
    fn test_other_submission_errors_are_wrapped() {
        let err = error_response("nonce too low", None);
        let err = submission_error(err, ScriptError::ContractInteraction);

        assert_eq!(err, ScriptError::ContractInteraction("nonce too low".to_string()));
    }

    #[test]
    fn test_revert_data_is_rendered() {
        let err = error_response("execution reverted", Some(r#""0x08c379a0""#));
        let msg = describe_rpc_error(err);

        assert_eq!(msg, r#"execution reverted (data = "0x08c379a0")"#);
    }
}
