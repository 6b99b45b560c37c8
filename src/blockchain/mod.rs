//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! InitConfig + EnvDefaults
//!     → connector.rs (resolve, bind, liveness check)
//!     → artifact.rs (load ABI, encode/decode calls)
//!     → transport.rs (Connect/Transport seam)
//!     → client.rs (alloy HTTP provider with timeouts)
//!     → transaction.rs (build, broadcast, confirm, deploy)
//! ```
//!
//! # Security Constraints
//! - Private keys only from explicit options or the environment
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod artifact;
pub mod client;
pub mod connector;
pub mod transaction;
pub mod transport;
pub mod types;
pub mod wallet;

pub use artifact::{ContractArtifact, ContractInterface};
pub use client::{HttpConnect, RpcTransport};
pub use connector::BlockchainConnector;
pub use transport::{Confirmation, Connect, Transport};
pub use types::{
    ChainId, ConnectorError, ConnectorResult, ConnectorStatus, Deployment, Outcome, TxOutcome,
    Verification,
};
pub use wallet::{ExternalProvider, SigningIdentity, Wallet, WalletOptions};
