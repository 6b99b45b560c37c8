//! Client for the AegisX transaction risk registry contract.

pub mod blockchain;
pub mod config;
pub mod observability;

pub use blockchain::{BlockchainConnector, ConnectorError, ConnectorResult, Outcome, WalletOptions};
pub use config::{ConnectorSettings, EnvDefaults, InitConfig};
