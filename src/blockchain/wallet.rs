//! Signing identities.
//!
//! # Security
//! - Private keys are never logged or serialized
//! - `WalletOptions` redacts key material in its `Debug` output

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use url::Url;

use crate::blockchain::transport::{Connect, Transport};
use crate::blockchain::types::{ConnectorError, ConnectorResult};

/// Environment variable the CLI reads the private key from.
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// Locally held key used to sign transactions.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> ConnectorResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ConnectorError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(address = %signer.address(), "Wallet loaded");

        Ok(Self { signer })
    }

    /// Load wallet from the `PRIVATE_KEY` environment variable.
    pub fn from_env() -> ConnectorResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            ConnectorError::Wallet(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

/// A node endpoint that holds unlocked accounts and signs on our behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProvider {
    pub endpoint: Url,
    /// Account to send from; the endpoint's first account when unset.
    pub account: Option<Address>,
}

/// Options for `BlockchainConnector::connect_wallet`. Exactly one source
/// must be set.
#[derive(Clone, Default)]
pub struct WalletOptions {
    pub private_key: Option<String>,
    pub external_provider: Option<ExternalProvider>,
}

impl WalletOptions {
    pub fn private_key(key: impl Into<String>) -> Self {
        Self {
            private_key: Some(key.into()),
            external_provider: None,
        }
    }

    pub fn external(provider: ExternalProvider) -> Self {
        Self {
            private_key: None,
            external_provider: Some(provider),
        }
    }
}

impl std::fmt::Debug for WalletOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletOptions")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("external_provider", &self.external_provider)
            .finish()
    }
}

/// Credential able to authorize state-changing calls.
#[derive(Debug, Clone)]
pub enum SigningIdentity {
    /// Key held in this process.
    Local(Wallet),
    /// Signing delegated to an external provider.
    Delegated { address: Address, endpoint: Url },
}

impl SigningIdentity {
    pub fn address(&self) -> Address {
        match self {
            SigningIdentity::Local(wallet) => wallet.address(),
            SigningIdentity::Delegated { address, .. } => *address,
        }
    }
}

impl WalletOptions {
    /// Turn the options into a signing identity.
    ///
    /// An external provider without an explicit account is asked for its
    /// accounts through `connect`, and the first one is used.
    pub async fn into_identity<C: Connect>(self, connect: &C) -> ConnectorResult<SigningIdentity> {
        match (self.private_key, self.external_provider) {
            (Some(key), None) => Ok(SigningIdentity::Local(Wallet::from_private_key(&key)?)),
            (None, Some(external)) => {
                let address = match external.account {
                    Some(account) => account,
                    None => connect
                        .connect(&external.endpoint)?
                        .accounts()
                        .await?
                        .into_iter()
                        .next()
                        .ok_or_else(|| {
                            ConnectorError::Wallet(format!(
                                "External provider at {} exposes no accounts",
                                external.endpoint
                            ))
                        })?,
                };
                Ok(SigningIdentity::Delegated {
                    address,
                    endpoint: external.endpoint,
                })
            }
            (Some(_), Some(_)) => Err(ConnectorError::Wallet(
                "Provide either a private key or an external provider, not both".to_string(),
            )),
            (None, None) => Err(ConnectorError::Wallet(
                "No wallet connection method provided".to_string(),
            )),
        }
    }
}
