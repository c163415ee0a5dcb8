//! QuickNode provider.
//!
//! QuickNode serves each customer from a personal subdomain with the auth
//! token in the path, so the endpoint is resolved from the environment
//! rather than built from a shared API key.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use quicknode_core::{catalog, dispatch};
use quicknode_core::resolver::{CredentialSource, UriResolver};
use quicknode_core::trace::{self, TraceHints, TransactionTrace};
use quicknode_core::vm_error::{self, CallFailure, ExecutionError};
use quicknode_core::{ProviderError, RpcDispatcher, RpcTransport, TransportError};
use quicknode_http::{HttpClientConfig, HttpRpcClient};

use crate::config::ProviderConfig;
use crate::network::NetworkId;
use crate::traits::{RemoteProvider, UpstreamIdentity};
use crate::types::{parse_quantity, AccessListEntry, AccessListResult, BlockId, TransactionReceipt};

/// Builds a transport for a resolved endpoint URI.
pub type Connector =
    Arc<dyn Fn(&str, &HttpClientConfig) -> Result<Arc<dyn RpcTransport>, TransportError> + Send + Sync>;

fn http_connector() -> Connector {
    Arc::new(|uri: &str, config: &HttpClientConfig| -> Result<Arc<dyn RpcTransport>, TransportError> {
        let client = HttpRpcClient::new(uri, config.clone())?;
        Ok(Arc::new(client) as Arc<dyn RpcTransport>)
    })
}

/// A QuickNode-backed provider for one network.
pub struct QuickNode {
    network: NetworkId,
    config: ProviderConfig,
    resolver: UriResolver,
    connector: Connector,
    connection: Option<Arc<RpcDispatcher>>,
}

impl fmt::Debug for QuickNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickNode")
            .field("name", &self.config.name)
            .field("network", &self.network)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl QuickNode {
    /// Provider reading credentials from the process environment.
    pub fn new(network: NetworkId) -> Self {
        Self::with_config(network, ProviderConfig::default())
    }

    pub fn with_config(network: NetworkId, config: ProviderConfig) -> Self {
        Self {
            network,
            config,
            resolver: UriResolver::from_env(),
            connector: http_connector(),
            connection: None,
        }
    }

    /// Read credentials from `source` instead of the environment.
    pub fn with_credentials(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.resolver = UriResolver::new(source);
        self
    }

    /// Replace how `connect` builds its transport.
    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = connector;
        self
    }

    /// Attach an already-open transport, skipping URI resolution.
    pub fn with_transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.connection = Some(Arc::new(RpcDispatcher::new(transport)));
        self
    }

    pub fn network(&self) -> &NetworkId {
        &self.network
    }

    pub fn ecosystem(&self) -> &str {
        &self.network.ecosystem
    }

    /// Whether blocks on this ecosystem carry proof-of-authority extra data.
    pub fn is_poa(&self) -> bool {
        catalog::POA_ECOSYSTEMS.contains(&self.ecosystem())
    }

    fn dispatcher(&self) -> Result<&Arc<RpcDispatcher>, ProviderError> {
        self.connection.as_ref().ok_or(ProviderError::NotConnected)
    }

    fn ensure_fee_methods(&self, method: &'static str) -> Result<(), ProviderError> {
        if catalog::UNSUPPORTED_FEE_ECOSYSTEMS.contains(&self.ecosystem()) {
            return Err(ProviderError::NotImplemented {
                method,
                ecosystem: self.ecosystem().to_string(),
            });
        }
        Ok(())
    }

    /// Trace a transaction. The hash is validated before anything else; the
    /// trace itself is fetched lazily.
    pub fn get_transaction_trace(
        &self,
        transaction_hash: &str,
        hints: TraceHints,
    ) -> Result<TransactionTrace, ProviderError> {
        trace::validate_transaction_hash(transaction_hash)?;
        TransactionTrace::new(transaction_hash, self.dispatcher()?.clone(), hints)
    }

    /// Pre-state trace (`prestateTracer`) of a transaction.
    pub async fn prestate_trace(&self, transaction_hash: &str) -> Result<Value, ProviderError> {
        trace::validate_transaction_hash(transaction_hash)?;
        self.dispatcher()?
            .request(
                "debug_traceTransaction",
                Some(vec![json!(transaction_hash), json!({"tracer": "prestateTracer"})]),
            )
            .await
    }

    /// Translate a failed call into a revert or VM error.
    pub fn get_virtual_machine_error(
        &self,
        failure: &CallFailure,
        txn: Option<&str>,
    ) -> ExecutionError {
        vm_error::classify(failure, txn)
    }

    /// Fetch a receipt.
    ///
    /// With no confirmations and no timeout, the receipt and its transaction
    /// are fetched once. Otherwise the node is polled until the receipt has
    /// `required_confirmations` blocks on top of it, bounded by `timeout`.
    pub async fn get_receipt(
        &self,
        txn_hash: &str,
        required_confirmations: u64,
        timeout: Option<Duration>,
    ) -> Result<TransactionReceipt, ProviderError> {
        if required_confirmations == 0 && timeout.is_none() {
            let receipt = self.fetch_receipt(txn_hash).await?.ok_or_else(|| {
                ProviderError::provider(format!("Transaction '{txn_hash}' not found"))
            })?;
            return self.merge_with_transaction(txn_hash, required_confirmations, receipt).await;
        }

        let wait = self.wait_for_receipt(txn_hash, required_confirmations);
        let receipt = match timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                ProviderError::Timeout {
                    what: format!("receipt of {txn_hash}"),
                    ms: saturating_millis(limit),
                }
            })??,
            None => wait.await?,
        };
        self.merge_with_transaction(txn_hash, required_confirmations, receipt).await
    }

    async fn wait_for_receipt(
        &self,
        txn_hash: &str,
        required_confirmations: u64,
    ) -> Result<Value, ProviderError> {
        loop {
            let receipt = self.fetch_receipt(txn_hash).await?;
            // Pending receipts carry a null blockNumber.
            let mined_at = receipt
                .as_ref()
                .and_then(|r| r.get("blockNumber"))
                .filter(|n| !n.is_null());
            if let (Some(receipt), Some(mined_at)) = (receipt.as_ref(), mined_at) {
                let mined_at = parse_quantity(mined_at, "blockNumber")?;
                let head = u128::from(self.block_number().await?);
                let confirmations = (head + 1).saturating_sub(mined_at);
                if confirmations >= u128::from(required_confirmations) {
                    return Ok(receipt.clone());
                }
                tracing::debug!(
                    tx = txn_hash,
                    confirmations = u64::try_from(confirmations).unwrap_or(u64::MAX),
                    required = required_confirmations,
                    "waiting for confirmations"
                );
            } else {
                tracing::debug!(tx = txn_hash, "receipt not mined yet");
            }
            tokio::time::sleep(self.config.receipt_poll_interval).await;
        }
    }

    async fn fetch_receipt(&self, txn_hash: &str) -> Result<Option<Value>, ProviderError> {
        let receipt: Value = self
            .dispatcher()?
            .request("eth_getTransactionReceipt", Some(vec![json!(txn_hash)]))
            .await?;
        Ok(Some(receipt).filter(|r| !r.is_null()))
    }

    async fn merge_with_transaction(
        &self,
        txn_hash: &str,
        required_confirmations: u64,
        receipt: Value,
    ) -> Result<TransactionReceipt, ProviderError> {
        let transaction: Value = self
            .dispatcher()?
            .request("eth_getTransactionByHash", Some(vec![json!(txn_hash)]))
            .await?;
        Ok(TransactionReceipt::merge(required_confirmations, transaction, receipt))
    }

    /// `eth_createAccessList` for `transaction` at `block_id` (default `latest`).
    pub async fn create_access_list(
        &self,
        transaction: &Value,
        block_id: Option<BlockId>,
    ) -> Result<Vec<AccessListEntry>, ProviderError> {
        self.ensure_fee_methods("create_access_list")?;
        let block = block_id.unwrap_or_default().to_param();
        let result: AccessListResult = self
            .dispatcher()?
            .request("eth_createAccessList", Some(vec![transaction.clone(), block]))
            .await?;
        Ok(result.access_list)
    }

    /// Suggested priority fee in wei.
    pub async fn priority_fee(&self) -> Result<u128, ProviderError> {
        self.ensure_fee_methods("priority_fee")?;
        let fee: Value = self.dispatcher()?.request("eth_maxPriorityFeePerGas", None).await?;
        parse_quantity(&fee, "priority fee")
    }

    /// Legacy gas price in wei (`eth_gasPrice`).
    pub async fn gas_price(&self) -> Result<u128, ProviderError> {
        let price: Value = self.dispatcher()?.request("eth_gasPrice", None).await?;
        parse_quantity(&price, "gas price")
    }

    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.quantity("eth_chainId", None).await
    }

    pub async fn block_number(&self) -> Result<u64, ProviderError> {
        self.quantity("eth_blockNumber", None).await
    }

    /// Gas estimate for `transaction`. Reverts surface as
    /// [`ExecutionError::ContractLogic`].
    pub async fn estimate_gas(&self, transaction: &Value) -> Result<u64, ProviderError> {
        let value = self
            .execute("eth_estimateGas", vec![transaction.clone()], None)
            .await?;
        to_u64(parse_quantity(&value, "gas estimate")?, "gas estimate")
    }

    /// `eth_call`, returning the raw hex result.
    pub async fn call(
        &self,
        transaction: &Value,
        block_id: Option<BlockId>,
    ) -> Result<String, ProviderError> {
        let block = block_id.unwrap_or_default().to_param();
        let value = self
            .execute("eth_call", vec![transaction.clone(), block], None)
            .await?;
        match value {
            Value::String(data) => Ok(data),
            other => Err(ProviderError::provider(format!(
                "unexpected eth_call result: {other}"
            ))),
        }
    }

    /// Broadcast a signed transaction and return its hash.
    pub async fn send_raw_transaction(&self, raw_tx: &str) -> Result<String, ProviderError> {
        let value = self
            .execute("eth_sendRawTransaction", vec![json!(raw_tx)], Some(raw_tx))
            .await?;
        match value {
            Value::String(hash) => Ok(hash),
            other => Err(ProviderError::provider(format!(
                "unexpected eth_sendRawTransaction result: {other}"
            ))),
        }
    }

    /// Like `make_request` but error envelopes from the node go through the
    /// revert translator.
    async fn execute(
        &self,
        method: &str,
        params: Vec<Value>,
        txn: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let value = self.make_request(method, Some(params)).await?;
        match dispatch::classify_error_envelope(&value) {
            Some(ProviderError::Rpc(err)) => {
                let failure = CallFailure::from_rpc_error(&err);
                Err(self.get_virtual_machine_error(&failure, txn).into())
            }
            Some(other) => Err(other),
            None => Ok(dispatch::strip_envelope(value)),
        }
    }

    async fn quantity(&self, method: &str, params: Option<Vec<Value>>) -> Result<u64, ProviderError> {
        let value: Value = self.dispatcher()?.request(method, params).await?;
        to_u64(parse_quantity(&value, method)?, method)
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn to_u64(value: u128, what: &str) -> Result<u64, ProviderError> {
    u64::try_from(value).map_err(|_| ProviderError::provider(format!("{what} {value} overflows u64")))
}

#[async_trait]
impl RemoteProvider for QuickNode {
    fn connect(&mut self) -> Result<(), ProviderError> {
        let uri = self.uri()?;
        let transport = (self.connector)(&uri, &self.config.http).map_err(|err| {
            ProviderError::Provider {
                message: format!("Failed to connect to QuickNode.\n{err}"),
                source: Some(err),
            }
        })?;
        self.connection = Some(Arc::new(RpcDispatcher::new(transport)));
        tracing::info!(network = %self.network, poa = self.is_poa(), "connected to QuickNode");
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            tracing::info!(network = %self.network, "disconnected from QuickNode");
        }
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    async fn make_request(
        &self,
        method: &str,
        params: Option<Vec<Value>>,
    ) -> Result<Value, ProviderError> {
        self.dispatcher()?.make_request(method, params).await
    }
}

impl UpstreamIdentity for QuickNode {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn uri(&self) -> Result<String, ProviderError> {
        self.resolver
            .resolve(&self.network.ecosystem, &self.network.network)
    }

    fn ws_uri(&self) -> Result<String, ProviderError> {
        self.resolver
            .resolve_ws(&self.network.ecosystem, &self.network.network)
    }
}
