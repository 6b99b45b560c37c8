//! JSON-RPC transport with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to a JSON-RPC endpoint over HTTP
//! - Query chain state (block number, chain id, balances, accounts)
//! - Perform contract calls and submit transactions
//! - Map timeouts and transport failures into `ConnectorError`

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use std::fmt::Display;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::blockchain::transaction::{call_request, submit_request, wait_for_confirmation};
use crate::blockchain::transport::{Confirmation, Connect, Transport};
use crate::blockchain::types::{ChainId, ConnectorError, ConnectorResult};
use crate::blockchain::wallet::SigningIdentity;
use crate::config::schema::NetworkConfig;

/// Opens alloy HTTP transports with shared timeout settings.
#[derive(Debug, Clone)]
pub struct HttpConnect {
    rpc_timeout: Duration,
    confirmation_blocks: u64,
    confirmation_timeout: Duration,
}

impl HttpConnect {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            rpc_timeout: Duration::from_secs(config.rpc_timeout_secs),
            confirmation_blocks: config.confirmation_blocks,
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
        }
    }
}

impl Connect for HttpConnect {
    type Transport = RpcTransport;

    fn connect(&self, endpoint: &Url) -> ConnectorResult<RpcTransport> {
        let provider = ProviderBuilder::new().connect_http(endpoint.clone()).erased();

        Ok(RpcTransport {
            provider,
            endpoint: endpoint.clone(),
            sender: None,
            settings: self.clone(),
        })
    }
}

/// Alloy provider bound to one endpoint, optionally with a signer.
#[derive(Clone)]
pub struct RpcTransport {
    provider: DynProvider,
    endpoint: Url,
    /// Set once a signing identity is attached.
    sender: Option<Address>,
    settings: HttpConnect,
}

impl RpcTransport {
    /// Run one RPC round trip under the configured timeout.
    async fn round_trip<F, T, E>(
        &self,
        method: &'static str,
        fut: F,
        on_error: fn(String) -> ConnectorError,
    ) -> ConnectorResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: Display,
    {
        match timeout(self.settings.rpc_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(endpoint = %self.endpoint, method, error = %e, "RPC error");
                Err(on_error(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(endpoint = %self.endpoint, method, "RPC timeout");
                Err(ConnectorError::Timeout(self.settings.rpc_timeout.as_secs()))
            }
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for RpcTransport {
    async fn block_number(&self) -> ConnectorResult<u64> {
        self.round_trip("eth_blockNumber", self.provider.get_block_number(), ConnectorError::Rpc)
            .await
    }

    async fn chain_id(&self) -> ConnectorResult<ChainId> {
        self.round_trip("eth_chainId", self.provider.get_chain_id(), ConnectorError::Rpc)
            .await
            .map(ChainId)
    }

    async fn balance(&self, address: Address) -> ConnectorResult<U256> {
        self.round_trip("eth_getBalance", self.provider.get_balance(address), ConnectorError::Rpc)
            .await
    }

    async fn accounts(&self) -> ConnectorResult<Vec<Address>> {
        self.round_trip("eth_accounts", self.provider.get_accounts(), ConnectorError::Rpc)
            .await
    }

    async fn call(&self, to: Address, input: Bytes) -> ConnectorResult<Bytes> {
        let tx = call_request(to, input);
        self.round_trip("eth_call", self.provider.call(tx), ConnectorError::Remote)
            .await
    }

    async fn submit(&self, to: Option<Address>, input: Bytes) -> ConnectorResult<Confirmation> {
        let from = self.sender.ok_or(ConnectorError::NoWallet)?;
        let tx = submit_request(to, input, Some(from));

        let pending = self
            .round_trip("eth_sendTransaction", self.provider.send_transaction(tx), ConnectorError::Remote)
            .await?;

        tracing::debug!(tx_hash = %pending.tx_hash(), from = %from, "Transaction broadcast");

        wait_for_confirmation(
            pending,
            self.settings.confirmation_blocks,
            self.settings.confirmation_timeout,
        )
        .await
    }

    fn with_signer(&self, identity: &SigningIdentity) -> ConnectorResult<Self> {
        let (provider, endpoint) = match identity {
            SigningIdentity::Local(wallet) => {
                let wallet = EthereumWallet::from(wallet.signer().clone());
                let provider = ProviderBuilder::new()
                    .wallet(wallet)
                    .connect_http(self.endpoint.clone())
                    .erased();
                (provider, self.endpoint.clone())
            }
            // The external node signs, so transactions go through its endpoint.
            SigningIdentity::Delegated { endpoint, .. } => {
                let provider = ProviderBuilder::new().connect_http(endpoint.clone()).erased();
                (provider, endpoint.clone())
            }
        };

        tracing::info!(
            endpoint = %endpoint,
            sender = %identity.address(),
            "Transport bound to signer"
        );

        Ok(Self {
            provider,
            endpoint,
            sender: Some(identity.address()),
            settings: self.settings.clone(),
        })
    }

    fn sender(&self) -> Option<Address> {
        self.sender
    }
}

impl std::fmt::Debug for RpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("sender", &self.sender)
            .field("timeout_secs", &self.settings.rpc_timeout.as_secs())
            .finish()
    }
}
