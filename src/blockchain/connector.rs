//! Typed client for the risk registry contract.
//!
//! # Lifecycle
//! ```text
//! new() → initialize(config) → [connect_wallet(options)] → operations…
//! ```
//!
//! Every public method returns a `ConnectorResult`; nothing panics and no
//! failure escapes any other way. Precondition failures (not initialized, no
//! signer, bad arguments) are detected before any network I/O.

use alloy::primitives::{Address, Bytes, U256};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use url::Url;

use crate::blockchain::artifact::{artifact_path, ContractArtifact, ContractInterface};
use crate::blockchain::client::HttpConnect;
use crate::blockchain::transport::{Connect, Transport};
use crate::blockchain::types::{
    ChainId, ConnectorError, ConnectorResult, ConnectorStatus, TxOutcome, Verification,
};
use crate::blockchain::wallet::{SigningIdentity, WalletOptions};
use crate::config::resolve::{resolve, EnvDefaults, InitConfig, ResolvedConfig};
use crate::config::schema::NetworkConfig;
use crate::observability::metrics;

/// Contract address + interface + transport.
#[derive(Debug)]
struct BoundContract<T> {
    address: Address,
    interface: ContractInterface,
    transport: T,
}

impl<T: Transport> BoundContract<T> {
    async fn transact(&self, input: Bytes) -> ConnectorResult<TxOutcome> {
        let confirmation = self.transport.submit(Some(self.address), input).await?;
        if !confirmation.success {
            return Err(ConnectorError::Reverted(confirmation.transaction_hash));
        }

        Ok(TxOutcome {
            transaction_hash: confirmation.transaction_hash,
            block_number: confirmation.block_number,
        })
    }
}

/// State that exists only after a successful `initialize`.
#[derive(Debug)]
struct Session<T> {
    contract: BoundContract<T>,
    identity: Option<SigningIdentity>,
}

/// Client for the deployed risk registry contract.
pub struct BlockchainConnector<C: Connect = HttpConnect> {
    connect: C,
    env: EnvDefaults,
    artifacts_dir: PathBuf,
    /// Last resolved endpoint, kept even when initialization failed.
    network_url: String,
    /// Last resolved contract address, kept even when initialization failed.
    contract_address: String,
    session: Option<Session<C::Transport>>,
}

impl BlockchainConnector<HttpConnect> {
    /// Connector over HTTP JSON-RPC using `config` for artifact location and
    /// transport timeouts.
    pub fn new(config: &NetworkConfig, env: EnvDefaults) -> Self {
        Self::with_connect(HttpConnect::new(config), &config.artifacts_dir, env)
    }
}

impl<C: Connect> BlockchainConnector<C> {
    /// Connector over an arbitrary transport factory.
    pub fn with_connect(connect: C, artifacts_dir: impl AsRef<Path>, env: EnvDefaults) -> Self {
        Self {
            connect,
            env,
            artifacts_dir: artifacts_dir.as_ref().to_path_buf(),
            network_url: String::new(),
            contract_address: String::new(),
            session: None,
        }
    }

    /// Resolve configuration, load the contract interface and check the
    /// endpoint.
    ///
    /// Replaces any previous state: on return the connector is either
    /// connected with a read-only contract binding, or disconnected.
    pub async fn initialize(&mut self, config: &InitConfig) -> ConnectorResult<()> {
        self.session = None;

        let resolved = resolve(config, &self.env);
        self.network_url = resolved.network_url.clone();
        self.contract_address = resolved.contract_address.clone();

        match self.bind(&resolved).await {
            Ok(contract) => {
                self.session = Some(Session {
                    contract,
                    identity: None,
                });
                metrics::record_endpoint_health(true);
                tracing::info!(
                    rpc_url = %resolved.network_url,
                    contract = %resolved.contract_name,
                    address = %resolved.contract_address,
                    "Blockchain connector initialized"
                );
                Ok(())
            }
            Err(e) => {
                if matches!(e, ConnectorError::Rpc(_) | ConnectorError::Timeout(_)) {
                    metrics::record_endpoint_health(false);
                }
                tracing::warn!(error = %e, "Failed to initialize blockchain connector");
                Err(e)
            }
        }
    }

    async fn bind(&self, resolved: &ResolvedConfig) -> ConnectorResult<BoundContract<C::Transport>> {
        if resolved.contract_address.is_empty() {
            return Err(ConnectorError::MissingContractAddress);
        }

        let address: Address = resolved.contract_address.parse().map_err(|e| {
            ConnectorError::InvalidConfig(format!(
                "Invalid contract address '{}': {}",
                resolved.contract_address, e
            ))
        })?;

        let endpoint: Url = resolved.network_url.parse().map_err(|e| {
            ConnectorError::InvalidConfig(format!(
                "Invalid RPC URL '{}': {}",
                resolved.network_url, e
            ))
        })?;

        tracing::info!(
            rpc_url = %endpoint,
            contract = %resolved.contract_name,
            address = %address,
            "Connecting to blockchain"
        );

        let artifact = ContractArtifact::load(&artifact_path(&self.artifacts_dir, &resolved.contract_name))?;
        let interface = ContractInterface::new(artifact.abi)?;

        let transport = self.connect.connect(&endpoint)?;
        let block_number = transport.block_number().await?;
        tracing::debug!(block_number, "Liveness check succeeded");

        Ok(BoundContract {
            address,
            interface,
            transport,
        })
    }

    /// Attach a signing identity and rebind the contract to a writable
    /// transport. Returns the address transactions will be sent from.
    pub async fn connect_wallet(&mut self, options: WalletOptions) -> ConnectorResult<Address> {
        let session = self.session.as_mut().ok_or(ConnectorError::NotInitialized)?;

        let identity = options.into_identity(&self.connect).await?;

        let transport = session.contract.transport.with_signer(&identity)?;
        let address = identity.address();
        session.contract.transport = transport;
        session.identity = Some(identity);

        tracing::info!(address = %address, "Wallet connected");
        Ok(address)
    }

    /// Record a risk assessment for a new transaction id.
    pub async fn log_transaction(
        &self,
        transaction_id: &str,
        risk_score: u64,
        flagged: bool,
    ) -> ConnectorResult<TxOutcome> {
        instrumented("logTransaction", async {
            let contract = self.writable()?;
            require_id(transaction_id)?;
            let input = contract.interface.encode_log(transaction_id, risk_score, flagged)?;
            contract.transact(input).await
        })
        .await
    }

    /// Read the stored risk assessment for a transaction id.
    pub async fn verify_transaction(&self, transaction_id: &str) -> ConnectorResult<Verification> {
        instrumented("verifyTransaction", self.read_assessment(transaction_id)).await
    }

    async fn read_assessment(&self, transaction_id: &str) -> ConnectorResult<Verification> {
        let contract = self.readable()?;
        let input = contract.interface.encode_verify(transaction_id)?;
        let output = contract.transport.call(contract.address, input).await?;
        let (risk_score, flagged) = contract.interface.decode_verify(&output)?;

        Ok(Verification {
            risk_score,
            flagged,
            transaction_id: transaction_id.to_string(),
        })
    }

    /// Overwrite the risk assessment of an already logged transaction.
    pub async fn update_risk_assessment(
        &self,
        transaction_id: &str,
        new_risk_score: u64,
        new_flagged_status: bool,
    ) -> ConnectorResult<TxOutcome> {
        instrumented("updateRiskAssessment", async {
            let contract = self.writable()?;
            let input = contract
                .interface
                .encode_update(transaction_id, new_risk_score, new_flagged_status)?;
            contract.transact(input).await
        })
        .await
    }

    /// Log several assessments in one transaction.
    pub async fn batch_log_transactions(
        &self,
        transaction_ids: &[String],
        risk_scores: &[u64],
        flags: &[bool],
    ) -> ConnectorResult<TxOutcome> {
        instrumented("batchLogTransactions", async {
            let contract = self.writable()?;
            if transaction_ids.is_empty() {
                return Err(ConnectorError::InvalidArgument("Batch is empty".to_string()));
            }
            if transaction_ids.len() != risk_scores.len() || transaction_ids.len() != flags.len() {
                return Err(ConnectorError::InvalidArgument(format!(
                    "Batch length mismatch: {} ids, {} scores, {} flags",
                    transaction_ids.len(),
                    risk_scores.len(),
                    flags.len()
                )));
            }
            for id in transaction_ids {
                require_id(id)?;
            }

            let input = contract.interface.encode_batch(transaction_ids, risk_scores, flags)?;
            contract.transact(input).await
        })
        .await
    }

    /// Current local state. Never touches the network.
    pub fn get_status(&self) -> ConnectorStatus {
        ConnectorStatus {
            connected: self.session.is_some(),
            contract_address: self.contract_address.clone(),
            network_url: self.network_url.clone(),
            has_wallet: self
                .session
                .as_ref()
                .map_or(false, |session| session.identity.is_some()),
        }
    }

    /// Address of the attached signing identity, if any.
    pub fn wallet_address(&self) -> Option<Address> {
        self.session
            .as_ref()
            .and_then(|session| session.identity.as_ref())
            .map(SigningIdentity::address)
    }

    pub async fn block_number(&self) -> ConnectorResult<u64> {
        self.readable()?.transport.block_number().await
    }

    pub async fn chain_id(&self) -> ConnectorResult<ChainId> {
        self.readable()?.transport.chain_id().await
    }

    pub async fn balance(&self, address: Address) -> ConnectorResult<U256> {
        self.readable()?.transport.balance(address).await
    }

    fn readable(&self) -> ConnectorResult<&BoundContract<C::Transport>> {
        self.session
            .as_ref()
            .map(|session| &session.contract)
            .ok_or(ConnectorError::NotInitialized)
    }

    fn writable(&self) -> ConnectorResult<&BoundContract<C::Transport>> {
        let session = self.session.as_ref().ok_or(ConnectorError::NotInitialized)?;
        if session.identity.is_none() {
            return Err(ConnectorError::NoWallet);
        }
        Ok(&session.contract)
    }
}

impl<C: Connect> std::fmt::Debug for BlockchainConnector<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainConnector")
            .field("status", &self.get_status())
            .field("artifacts_dir", &self.artifacts_dir)
            .finish()
    }
}

fn require_id(transaction_id: &str) -> ConnectorResult<()> {
    if transaction_id.is_empty() {
        return Err(ConnectorError::InvalidArgument(
            "Transaction id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Run an operation, logging failures and recording metrics.
async fn instrumented<T, F>(operation: &'static str, fut: F) -> ConnectorResult<T>
where
    F: Future<Output = ConnectorResult<T>>,
{
    let started = Instant::now();
    let result = fut.await;
    metrics::record_operation(operation, result.is_ok(), started);

    if let Err(e) = &result {
        tracing::warn!(operation, error = %e, "Contract operation failed");
    }
    result
}
