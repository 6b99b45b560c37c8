//! Layered resolution of connector settings.
//!
//! ```text
//! value = explicit ?? environment ?? built-in
//! ```
//!
//! The environment is captured once into `EnvDefaults` and injected; nothing
//! reads process environment while an operation is running. Empty strings
//! count as unset at every layer.

use serde::{Deserialize, Serialize};

/// Environment variable providing the default RPC endpoint.
pub const NETWORK_URL_ENV_VAR: &str = "SEPOLIA_URL";

/// Environment variable providing the default contract address.
pub const CONTRACT_ADDRESS_ENV_VAR: &str = "CONTRACT_ADDRESS";

pub const DEFAULT_NETWORK_URL: &str = "http://localhost:8545";
pub const DEFAULT_CONTRACT_NAME: &str = "AegisX";

/// Defaults captured from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub network_url: Option<String>,
    pub contract_address: Option<String>,
}

impl EnvDefaults {
    /// Snapshot `SEPOLIA_URL` and `CONTRACT_ADDRESS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, e.g. a parsed dotenv file.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            network_url: lookup(NETWORK_URL_ENV_VAR),
            contract_address: lookup(CONTRACT_ADDRESS_ENV_VAR),
        }
    }
}

/// Explicit values passed to `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitConfig {
    pub contract_name: Option<String>,
    pub network_url: Option<String>,
    pub contract_address: Option<String>,
}

/// Settings after layering. `contract_address` is empty when no layer
/// supplied one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub contract_name: String,
    pub network_url: String,
    pub contract_address: String,
}

/// Resolve each field as explicit, else environment, else built-in.
pub fn resolve(explicit: &InitConfig, env: &EnvDefaults) -> ResolvedConfig {
    ResolvedConfig {
        contract_name: first_set(&[explicit.contract_name.as_deref()])
            .unwrap_or(DEFAULT_CONTRACT_NAME)
            .to_string(),
        network_url: first_set(&[explicit.network_url.as_deref(), env.network_url.as_deref()])
            .unwrap_or(DEFAULT_NETWORK_URL)
            .to_string(),
        contract_address: first_set(&[
            explicit.contract_address.as_deref(),
            env.contract_address.as_deref(),
        ])
        .unwrap_or_default()
        .to_string(),
    }
}

fn first_set<'a>(layers: &[Option<&'a str>]) -> Option<&'a str> {
    layers
        .iter()
        .copied()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
}
