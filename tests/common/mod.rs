//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use aegis_connector::blockchain::artifact::artifact_path;
use aegis_connector::blockchain::{
    ChainId, Confirmation, Connect, ConnectorError, ConnectorResult, SigningIdentity, Transport,
};
use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolValue};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// Well-known test private key (Anvil/Hardhat first account).
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Hardhat-style artifact for the registry contract.
pub const REGISTRY_ARTIFACT: &str = r#"{
    "_format": "hh-sol-artifact-1",
    "contractName": "AegisX",
    "sourceName": "contracts/AegisX.sol",
    "abi": [
        {"type": "event", "name": "TransactionLogged", "anonymous": false,
         "inputs": [{"name": "transactionId", "type": "string", "indexed": false}, {"name": "riskScore", "type": "uint256", "indexed": false}, {"name": "flagged", "type": "bool", "indexed": false}]},
        {"type": "function", "name": "logTransaction", "stateMutability": "nonpayable",
         "inputs": [{"name": "transactionId", "type": "string"}, {"name": "riskScore", "type": "uint256"}, {"name": "flagged", "type": "bool"}],
         "outputs": []},
        {"type": "function", "name": "updateRiskAssessment", "stateMutability": "nonpayable",
         "inputs": [{"name": "transactionId", "type": "string"}, {"name": "newRiskScore", "type": "uint256"}, {"name": "newFlaggedStatus", "type": "bool"}],
         "outputs": []},
        {"type": "function", "name": "verifyTransaction", "stateMutability": "view",
         "inputs": [{"name": "transactionId", "type": "string"}],
         "outputs": [{"name": "", "type": "uint256"}, {"name": "", "type": "bool"}]},
        {"type": "function", "name": "batchLogTransactions", "stateMutability": "nonpayable",
         "inputs": [{"name": "transactionIds", "type": "string[]"}, {"name": "riskScores", "type": "uint256[]"}, {"name": "flags", "type": "bool[]"}],
         "outputs": []}
    ],
    "bytecode": "0x6080604052348015600f57600080fd5b50",
    "deployedBytecode": "0x6080",
    "linkReferences": {},
    "deployedLinkReferences": {}
}"#;

sol! {
    interface IAegisX {
        function logTransaction(string transactionId, uint256 riskScore, bool flagged) external;
        function updateRiskAssessment(string transactionId, uint256 newRiskScore, bool newFlaggedStatus) external;
        function verifyTransaction(string transactionId) external view returns (uint256, bool);
        function batchLogTransactions(string[] transactionIds, uint256[] riskScores, bool[] flags) external;
    }
}

/// Write the registry artifact under `dir` with the Hardhat layout.
pub fn write_artifact(dir: &Path, contract_name: &str, content: &str) {
    let path = artifact_path(dir, contract_name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Contract state plus bookkeeping about how the ledger was used.
#[derive(Debug, Default)]
pub struct LedgerState {
    pub records: HashMap<String, (U256, bool)>,
    pub block_number: u64,
    /// Number of transport round trips served.
    pub requests: u32,
    pub unreachable: bool,
    /// Accounts an external provider would report.
    pub accounts: Vec<Address>,
    /// Endpoints transports were opened for.
    pub endpoints: Vec<Url>,
    /// Senders of submitted transactions, in order.
    pub senders: Vec<Address>,
    pub deployed: Vec<Address>,
}

/// In-memory stand-in for a node running the registry contract.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    pub state: Arc<Mutex<LedgerState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u32 {
        self.state.lock().unwrap().requests
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub fn record(&self, id: &str) -> Option<(U256, bool)> {
        self.state.lock().unwrap().records.get(id).copied()
    }

    pub fn senders(&self) -> Vec<Address> {
        self.state.lock().unwrap().senders.clone()
    }
}

impl Connect for MemoryLedger {
    type Transport = MemoryTransport;

    fn connect(&self, endpoint: &Url) -> ConnectorResult<MemoryTransport> {
        self.state.lock().unwrap().endpoints.push(endpoint.clone());
        Ok(MemoryTransport {
            state: self.state.clone(),
            sender: None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryTransport {
    state: Arc<Mutex<LedgerState>>,
    sender: Option<Address>,
}

impl MemoryTransport {
    /// Count a round trip, failing when the node is marked unreachable.
    fn enter(&self) -> ConnectorResult<std::sync::MutexGuard<'_, LedgerState>> {
        let mut state = self.state.lock().unwrap();
        state.requests += 1;
        if state.unreachable {
            return Err(ConnectorError::Rpc("error sending request: connection refused".into()));
        }
        Ok(state)
    }
}

fn revert(reason: &str) -> ConnectorError {
    ConnectorError::Remote(format!("execution reverted: {}", reason))
}

fn execute(state: &mut LedgerState, input: &[u8]) -> ConnectorResult<()> {
    if input.len() < 4 {
        return Err(revert("missing selector"));
    }
    let selector: [u8; 4] = input[..4].try_into().unwrap();

    if selector == IAegisX::logTransactionCall::SELECTOR {
        let call = IAegisX::logTransactionCall::abi_decode(input)
            .map_err(|e| revert(&e.to_string()))?;
        state.records.insert(call.transactionId, (call.riskScore, call.flagged));
    } else if selector == IAegisX::updateRiskAssessmentCall::SELECTOR {
        let call = IAegisX::updateRiskAssessmentCall::abi_decode(input)
            .map_err(|e| revert(&e.to_string()))?;
        match state.records.get_mut(&call.transactionId) {
            Some(record) => *record = (call.newRiskScore, call.newFlaggedStatus),
            None => return Err(revert("Transaction does not exist")),
        }
    } else if selector == IAegisX::batchLogTransactionsCall::SELECTOR {
        let call = IAegisX::batchLogTransactionsCall::abi_decode(input)
            .map_err(|e| revert(&e.to_string()))?;
        for ((id, score), flagged) in call
            .transactionIds
            .into_iter()
            .zip(call.riskScores)
            .zip(call.flags)
        {
            state.records.insert(id, (score, flagged));
        }
    } else {
        return Err(revert("unknown selector"));
    }
    Ok(())
}

impl Transport for MemoryTransport {
    async fn block_number(&self) -> ConnectorResult<u64> {
        Ok(self.enter()?.block_number)
    }

    async fn chain_id(&self) -> ConnectorResult<ChainId> {
        let _state = self.enter()?;
        Ok(ChainId(31337))
    }

    async fn balance(&self, _address: Address) -> ConnectorResult<U256> {
        let _state = self.enter()?;
        Ok(U256::from(10_000u64) * U256::from(10u64).pow(U256::from(18u64)))
    }

    async fn accounts(&self) -> ConnectorResult<Vec<Address>> {
        Ok(self.enter()?.accounts.clone())
    }

    async fn call(&self, _to: Address, input: Bytes) -> ConnectorResult<Bytes> {
        let state = self.enter()?;
        let call = IAegisX::verifyTransactionCall::abi_decode(&input)
            .map_err(|e| revert(&e.to_string()))?;
        let (score, flagged) = state
            .records
            .get(&call.transactionId)
            .copied()
            .ok_or_else(|| revert("Transaction does not exist"))?;
        Ok(Bytes::from((score, flagged).abi_encode_params()))
    }

    async fn submit(&self, to: Option<Address>, input: Bytes) -> ConnectorResult<Confirmation> {
        let sender = self
            .sender
            .ok_or_else(|| ConnectorError::Rpc("no signer for transaction".into()))?;
        let mut state = self.enter()?;

        let contract_address = match to {
            Some(_) => {
                execute(&mut state, &input)?;
                None
            }
            None => {
                let address = Address::from_word(keccak256(&input));
                state.deployed.push(address);
                Some(address)
            }
        };

        state.block_number += 1;
        state.senders.push(sender);
        let mut preimage = input.to_vec();
        preimage.extend_from_slice(&state.block_number.to_be_bytes());

        Ok(Confirmation {
            transaction_hash: TxHash::from(keccak256(&preimage)),
            block_number: state.block_number,
            contract_address,
            success: true,
        })
    }

    fn with_signer(&self, identity: &SigningIdentity) -> ConnectorResult<Self> {
        Ok(Self {
            state: self.state.clone(),
            sender: Some(identity.address()),
        })
    }

    fn sender(&self) -> Option<Address> {
        self.sender
    }
}

/// Hash the mock node assigns to every submitted transaction.
pub const MINED_TX_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

/// Block the mock node reports as latest and mines every transaction in.
pub const MOCK_BLOCK_NUMBER: u64 = 42;

/// How the mock node treats submitted transactions.
#[derive(Debug, Clone, Default)]
pub struct NodeBehavior {
    /// Revert reason returned by `eth_estimateGas`.
    pub estimate_revert: Option<String>,
    /// Mine transactions with a failed status.
    pub mined_revert: bool,
}

struct MockNode {
    behavior: NodeBehavior,
    /// Whether the last submitted transaction created a contract.
    last_was_creation: AtomicBool,
}

/// Start a JSON-RPC node that answers reads and accepts every transaction.
///
/// Returns the bound address and a counter of HTTP requests served.
pub async fn start_rpc_node() -> (SocketAddr, Arc<AtomicU32>) {
    start_programmable_rpc_node(NodeBehavior::default()).await
}

/// Start a JSON-RPC node whose transaction handling follows `behavior`.
pub async fn start_programmable_rpc_node(behavior: NodeBehavior) -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let node = Arc::new(MockNode {
        behavior,
        last_was_creation: AtomicBool::new(false),
    });

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let counter = counter.clone();
                    let node = node.clone();
                    tokio::spawn(async move {
                        let Some(body) = read_http_body(&mut socket).await else {
                            return;
                        };
                        counter.fetch_add(1, Ordering::SeqCst);

                        let response = match serde_json::from_slice::<Value>(&body) {
                            Ok(Value::Array(batch)) => {
                                Value::Array(batch.iter().map(|r| rpc_response(&node, r)).collect())
                            }
                            Ok(request) => rpc_response(&node, &request),
                            Err(_) => json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "parse error"}}),
                        };
                        let payload = response.to_string();
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            payload.len(),
                            payload
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, hits)
}

/// A port with nothing listening on it.
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn rpc_response(node: &MockNode, request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    let gwei = json!("0x3b9aca00");

    let result = match method {
        "eth_blockNumber" => json!(format!("0x{:x}", MOCK_BLOCK_NUMBER)),
        "eth_chainId" => json!("0x7a69"),
        "eth_accounts" => json!([TEST_ADDRESS]),
        "eth_getBalance" => json!("0xde0b6b3a7640000"),
        "eth_call" => {
            let encoded = (U256::from(75u64), true).abi_encode_params();
            json!(format!("0x{}", alloy::primitives::hex::encode(encoded)))
        }
        "eth_getTransactionCount" => json!("0x0"),
        "eth_gasPrice" | "eth_maxPriorityFeePerGas" => gwei,
        "eth_feeHistory" => json!({
            "oldestBlock": format!("0x{:x}", MOCK_BLOCK_NUMBER - 1),
            "baseFeePerGas": [gwei.clone(), gwei.clone()],
            "gasUsedRatio": [0.5],
            "reward": [[gwei]]
        }),
        "eth_estimateGas" => match &node.behavior.estimate_revert {
            Some(reason) => {
                return json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": 3, "message": format!("execution reverted: {}", reason), "data": "0x"}
                })
            }
            None => json!("0x30d40"),
        },
        "eth_sendTransaction" => {
            let creation = request
                .pointer("/params/0/to")
                .map_or(true, Value::is_null);
            node.last_was_creation.store(creation, Ordering::SeqCst);
            json!(MINED_TX_HASH)
        }
        "eth_sendRawTransaction" => {
            node.last_was_creation.store(false, Ordering::SeqCst);
            json!(MINED_TX_HASH)
        }
        "eth_getTransactionReceipt" => receipt(node),
        // Receipt polling keeps a block filter open in the background.
        "eth_newBlockFilter" => json!("0x1"),
        "eth_getFilterChanges" => json!([]),
        "eth_uninstallFilter" => json!(true),
        _ => {
            return json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": format!("method {} not supported", method)}
            })
        }
    };

    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn receipt(node: &MockNode) -> Value {
    let creation = node.last_was_creation.load(Ordering::SeqCst);
    json!({
        "type": "0x2",
        "transactionHash": MINED_TX_HASH,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "22".repeat(32)),
        "blockNumber": format!("0x{:x}", MOCK_BLOCK_NUMBER),
        "from": TEST_ADDRESS,
        "to": if creation { Value::Null } else { json!(CONTRACT_ADDRESS) },
        "contractAddress": if creation { json!(CONTRACT_ADDRESS) } else { Value::Null },
        "cumulativeGasUsed": "0x30d40",
        "gasUsed": "0x30d40",
        "effectiveGasPrice": "0x3b9aca00",
        "status": if node.behavior.mined_revert { "0x0" } else { "0x1" },
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256))
    })
}

async fn read_http_body(socket: &mut tokio::net::TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(buf[header_end..].to_vec())
}
