//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML settings
//! file. Every field has a default so an empty file is a valid config.

use serde::{Deserialize, Serialize};

use crate::config::resolve::InitConfig;

/// Root configuration for the connector and its CLI.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConnectorSettings {
    /// Endpoint, contract and transport settings.
    pub network: NetworkConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network and contract settings.
///
/// `contract_name`, `network_url` and `contract_address` are explicit
/// values in the layered resolution; when unset the environment and then the
/// built-in defaults apply.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Contract build artifact name (e.g. "AegisX", "AegisXLite").
    pub contract_name: Option<String>,

    /// JSON-RPC endpoint URL.
    pub network_url: Option<String>,

    /// Deployed contract address.
    pub contract_address: Option<String>,

    /// Root of the build artifacts (`<dir>/contracts/<Name>.sol/<Name>.json`).
    pub artifacts_dir: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations to wait for after a submission.
    pub confirmation_blocks: u64,

    /// Maximum time to wait for confirmations, in seconds.
    pub confirmation_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            contract_name: None,
            network_url: None,
            contract_address: None,
            artifacts_dir: "artifacts".to_string(),
            rpc_timeout_secs: 30,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 120,
        }
    }
}

impl NetworkConfig {
    /// The explicit layer of the initialize-time resolution.
    pub fn init_config(&self) -> InitConfig {
        InitConfig {
            contract_name: self.contract_name.clone(),
            network_url: self.network_url.clone(),
            contract_address: self.contract_address.clone(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
