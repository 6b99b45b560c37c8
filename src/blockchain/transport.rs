//! Transport seam between the connector and a ledger node.
//!
//! `Connect` opens a read-only `Transport` for an endpoint; a transport can be
//! rebound to a signing identity to become writable. The production pair is
//! `HttpConnect`/`RpcTransport` (alloy over HTTP JSON-RPC).

use alloy::primitives::{Address, Bytes, TxHash, U256};
use url::Url;

use crate::blockchain::types::{ChainId, ConnectorResult};
use crate::blockchain::wallet::SigningIdentity;

/// A mined transaction as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// Set for contract creations.
    pub contract_address: Option<Address>,
    /// False when the transaction was mined but reverted.
    pub success: bool,
}

/// One round trip to the ledger per method; no retries.
#[allow(async_fn_in_trait)]
pub trait Transport: Sized {
    /// Latest block number. Also serves as the liveness check.
    async fn block_number(&self) -> ConnectorResult<u64>;

    async fn chain_id(&self) -> ConnectorResult<ChainId>;

    async fn balance(&self, address: Address) -> ConnectorResult<U256>;

    /// Accounts the node can sign for.
    async fn accounts(&self) -> ConnectorResult<Vec<Address>>;

    /// Read-only contract call.
    async fn call(&self, to: Address, input: Bytes) -> ConnectorResult<Bytes>;

    /// Submit a state-changing transaction and wait for its confirmation.
    /// `to == None` creates a contract from `input`.
    async fn submit(&self, to: Option<Address>, input: Bytes) -> ConnectorResult<Confirmation>;

    /// A writable copy of this transport that signs as `identity`.
    fn with_signer(&self, identity: &SigningIdentity) -> ConnectorResult<Self>;

    /// Address transactions are sent from, if a signer is bound.
    fn sender(&self) -> Option<Address>;
}

/// Factory for transports.
pub trait Connect {
    type Transport: Transport;

    fn connect(&self, endpoint: &Url) -> ConnectorResult<Self::Transport>;
}
