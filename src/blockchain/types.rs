//! Connector result types and error definitions.

use alloy::primitives::{Address, TxHash};
use serde::Serialize;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during connector operations.
///
/// Variants fall into four groups: configuration (detected while
/// initializing), connectivity (transport failures), preconditions (checked
/// locally before any I/O) and remote execution (passed through verbatim).
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// No contract address was supplied explicitly or through the environment.
    #[error("Contract address not specified. Please provide a contract address.")]
    MissingContractAddress,

    /// Configuration value could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Build artifact for the contract is missing or unusable.
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Operation attempted before `initialize` succeeded.
    #[error("Contract not initialized")]
    NotInitialized,

    /// State-mutating operation attempted without a signing identity.
    #[error("No wallet connected; state-changing calls require a signer")]
    NoWallet,

    /// Invalid private key, missing signer options or signer lookup failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Caller-supplied argument rejected before any remote call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// ABI encoding or decoding failed.
    #[error("ABI error: {0}")]
    Abi(String),

    /// The remote contract rejected or reverted the call.
    #[error("{0}")]
    Remote(String),

    /// Transaction was mined but reverted.
    ///
    /// Receipts carry no revert reason, so only the hash is reported. Reverts
    /// caught while estimating gas surface as `Remote` with the node's message.
    #[error("Transaction reverted: {0}")]
    Reverted(TxHash),
}

impl ConnectorError {
    /// True when the error was raised locally without touching the network.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ConnectorError::NotInitialized
                | ConnectorError::NoWallet
                | ConnectorError::InvalidArgument(_)
        )
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Outcome of a confirmed state-mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutcome {
    pub transaction_hash: TxHash,
    pub block_number: u64,
}

/// Risk assessment read back from the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub risk_score: u64,
    pub flagged: bool,
    pub transaction_id: String,
}

/// Outcome of a contract deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub contract_address: Address,
    pub transaction_hash: TxHash,
    pub block_number: u64,
}

/// Snapshot of local connector state. Never touches the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorStatus {
    pub connected: bool,
    pub contract_address: String,
    pub network_url: String,
    pub has_wallet: bool,
}

/// Uniform `{success, ...}` envelope for reporting an operation result.
///
/// Serializes `Ok(value)` as `{"success": true, ...value}` and `Err(e)` as
/// `{"success": false, "error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(flatten)]
    pub value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<ConnectorResult<T>> for Outcome<T> {
    fn from(result: ConnectorResult<T>) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                value: Some(value),
                error: None,
            },
            Err(e) => Self {
                success: false,
                value: None,
                error: Some(e.to_string()),
            },
        }
    }
}
