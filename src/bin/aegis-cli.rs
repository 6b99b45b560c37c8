use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use aegis_connector::blockchain::artifact::artifact_path;
use aegis_connector::blockchain::transaction::deploy_contract;
use aegis_connector::blockchain::wallet::PRIVATE_KEY_ENV_VAR;
use aegis_connector::blockchain::{
    BlockchainConnector, Connect, ConnectorError, ConnectorResult, ConnectorStatus,
    ContractArtifact, Deployment, ExternalProvider, HttpConnect, Outcome, Transport, TxOutcome,
    Verification, Wallet, WalletOptions,
};
use aegis_connector::config::resolve::CONTRACT_ADDRESS_ENV_VAR;
use aegis_connector::config::{load_config, resolve, ConnectorSettings, EnvDefaults, NetworkConfig};
use aegis_connector::config::env_file::{load_env_file, update_env_file};
use aegis_connector::observability::logging::init_logging;
use alloy::primitives::utils::format_ether;
use alloy::primitives::Address;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use url::Url;

#[derive(Parser)]
#[command(name = "aegis-cli")]
#[command(about = "Client for the AegisX transaction risk registry", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dotenv file read at startup and updated by `deploy`
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// JSON-RPC endpoint, overrides SEPOLIA_URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Contract address, overrides CONTRACT_ADDRESS
    #[arg(long)]
    contract: Option<String>,

    /// Contract artifact name
    #[arg(long)]
    contract_name: Option<String>,

    /// External signer endpoint; used instead of PRIVATE_KEY
    #[arg(long)]
    signer_url: Option<Url>,

    /// Account on the external signer
    #[arg(long, requires = "signer_url")]
    from: Option<Address>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the endpoint, chain and wallet balance
    Status,
    /// Print the address derived from PRIVATE_KEY
    Address,
    /// Log a risk assessment
    Log {
        id: String,
        score: u64,
        #[arg(action = ArgAction::Set)]
        flagged: bool,
    },
    /// Read a stored risk assessment
    Verify { id: String },
    /// Overwrite a stored risk assessment
    Update {
        id: String,
        score: u64,
        #[arg(action = ArgAction::Set)]
        flagged: bool,
    },
    /// Log several assessments in one transaction
    BatchLog {
        /// id:score:flagged, repeatable
        #[arg(long = "entry", required = true, value_parser = parse_entry)]
        entries: Vec<BatchEntry>,
    },
    /// Run the log, verify and update walkthrough
    Interact,
    /// Deploy the contract and record its address in the env file
    Deploy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BatchEntry {
    id: String,
    score: u64,
    flagged: bool,
}

fn parse_entry(raw: &str) -> Result<BatchEntry, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(flagged), Some(score), Some(id)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected id:score:flagged, got '{}'", raw));
    };
    if id.is_empty() {
        return Err("transaction id must not be empty".to_string());
    }

    Ok(BatchEntry {
        id: id.to_string(),
        score: score
            .parse()
            .map_err(|e| format!("invalid score '{}': {}", score, e))?,
        flagged: flagged
            .parse()
            .map_err(|e| format!("invalid flag '{}': {}", flagged, e))?,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionReport {
    #[serde(flatten)]
    status: ConnectorStatus,
    chain_id: u64,
    block_number: u64,
    wallet_address: Option<Address>,
    /// Wallet balance in ether.
    balance: Option<String>,
}

#[derive(Serialize)]
struct AddressReport {
    address: Address,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InteractReport {
    logged: TxOutcome,
    verified: Verification,
    logged_low: TxOutcome,
    updated: TxOutcome,
    verified_updated: Verification,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => ConnectorSettings::default(),
    };
    init_logging(&settings.observability.log_level)?;

    // Must run before anything reads the environment.
    if load_env_file(&cli.env_file)? {
        tracing::debug!(path = %cli.env_file.display(), "Loaded env file");
    }

    let mut network = settings.network;
    if cli.rpc_url.is_some() {
        network.network_url = cli.rpc_url.clone();
    }
    if cli.contract.is_some() {
        network.contract_address = cli.contract.clone();
    }
    if cli.contract_name.is_some() {
        network.contract_name = cli.contract_name.clone();
    }
    let env = EnvDefaults::from_env();

    let code = match &cli.command {
        Commands::Address => print_outcome(Wallet::from_env().map(|wallet| AddressReport {
            address: wallet.address(),
        }))?,
        Commands::Deploy => {
            print_outcome(deploy(&network, &env, wallet_options(&cli), &cli.env_file).await)?
        }
        command => {
            let mut connector = BlockchainConnector::new(&network, env);
            match connector.initialize(&network.init_config()).await {
                Ok(()) => run(&mut connector, command, &cli).await?,
                Err(e) => print_outcome(Err::<ConnectorStatus, _>(e))?,
            }
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

async fn run(
    connector: &mut BlockchainConnector,
    command: &Commands,
    cli: &Cli,
) -> Result<i32, serde_json::Error> {
    let writes = matches!(
        command,
        Commands::Log { .. } | Commands::Update { .. } | Commands::BatchLog { .. } | Commands::Interact
    );
    if writes {
        let attached = match wallet_options(cli) {
            Ok(options) => connector.connect_wallet(options).await,
            Err(e) => Err(e),
        };
        if let Err(e) = attached {
            return print_outcome(Err::<TxOutcome, _>(e));
        }
    }

    match command {
        Commands::Status => print_outcome(status(connector, cli).await),
        Commands::Verify { id } => print_outcome(connector.verify_transaction(id).await),
        Commands::Log { id, score, flagged } => {
            print_outcome(connector.log_transaction(id, *score, *flagged).await)
        }
        Commands::Update { id, score, flagged } => {
            print_outcome(connector.update_risk_assessment(id, *score, *flagged).await)
        }
        Commands::BatchLog { entries } => {
            let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
            let scores: Vec<u64> = entries.iter().map(|e| e.score).collect();
            let flags: Vec<bool> = entries.iter().map(|e| e.flagged).collect();
            print_outcome(connector.batch_log_transactions(&ids, &scores, &flags).await)
        }
        Commands::Interact => print_outcome(interact(connector).await),
        Commands::Address | Commands::Deploy => Ok(0),
    }
}

async fn status(connector: &mut BlockchainConnector, cli: &Cli) -> ConnectorResult<ConnectionReport> {
    let chain_id = connector.chain_id().await?;
    let block_number = connector.block_number().await?;
    tracing::info!(chain_id = chain_id.0, block_number, "Connected");

    // A missing wallet is not an error here; the report just omits it.
    let (wallet_address, balance) = match wallet_options(cli) {
        Ok(options) => {
            let address = connector.connect_wallet(options).await?;
            let balance = connector.balance(address).await?;
            (Some(address), Some(format_ether(balance)))
        }
        Err(e) => {
            tracing::debug!(error = %e, "No wallet configured");
            (None, None)
        }
    };

    Ok(ConnectionReport {
        status: connector.get_status(),
        chain_id: chain_id.0,
        block_number,
        wallet_address,
        balance,
    })
}

/// Log a high-risk and a low-risk transaction, escalate the low-risk one and
/// read both back.
async fn interact(connector: &BlockchainConnector) -> ConnectorResult<InteractReport> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let high_risk = format!("tx_{}", millis);
    let low_risk = format!("tx_low_{}", millis);

    let logged = connector.log_transaction(&high_risk, 75, true).await?;
    let verified = connector.verify_transaction(&high_risk).await?;
    let logged_low = connector.log_transaction(&low_risk, 30, false).await?;
    let updated = connector.update_risk_assessment(&low_risk, 90, true).await?;
    let verified_updated = connector.verify_transaction(&low_risk).await?;

    Ok(InteractReport {
        logged,
        verified,
        logged_low,
        updated,
        verified_updated,
    })
}

async fn deploy(
    network: &NetworkConfig,
    env: &EnvDefaults,
    options: ConnectorResult<WalletOptions>,
    env_file: &Path,
) -> ConnectorResult<Deployment> {
    let resolved = resolve(&network.init_config(), env);
    let endpoint: Url = resolved.network_url.parse().map_err(|e| {
        ConnectorError::InvalidConfig(format!("Invalid RPC URL '{}': {}", resolved.network_url, e))
    })?;
    let artifact = ContractArtifact::load(&artifact_path(
        Path::new(&network.artifacts_dir),
        &resolved.contract_name,
    ))?;

    let connect = HttpConnect::new(network);
    let identity = options?.into_identity(&connect).await?;
    let transport = connect.connect(&endpoint)?.with_signer(&identity)?;

    let deployment = deploy_contract(&transport, &artifact).await?;

    let address = deployment.contract_address.to_string();
    match update_env_file(env_file, CONTRACT_ADDRESS_ENV_VAR, &address) {
        Ok(()) => tracing::info!(path = %env_file.display(), "Recorded contract address"),
        Err(e) => tracing::warn!(path = %env_file.display(), error = %e, "Failed to record contract address"),
    }

    Ok(deployment)
}

/// Signer from `--signer-url` when given, otherwise from `PRIVATE_KEY`.
fn wallet_options(cli: &Cli) -> ConnectorResult<WalletOptions> {
    if let Some(endpoint) = &cli.signer_url {
        return Ok(WalletOptions::external(ExternalProvider {
            endpoint: endpoint.clone(),
            account: cli.from,
        }));
    }

    std::env::var(PRIVATE_KEY_ENV_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(WalletOptions::private_key)
        .ok_or_else(|| {
            ConnectorError::Wallet(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })
}

/// Print the JSON envelope. Returns the process exit code.
fn print_outcome<T: Serialize>(result: ConnectorResult<T>) -> Result<i32, serde_json::Error> {
    let code = result.as_ref().err().map_or(0, exit_code);
    let outcome = Outcome::from(result);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(code)
}

/// 2 for failures detected locally before any network I/O, 1 otherwise.
fn exit_code(err: &ConnectorError) -> i32 {
    if err.is_precondition() {
        2
    } else {
        1
    }
}
