//! Contract build artifacts and ABI-driven call encoding.
//!
//! Artifacts follow the Hardhat layout:
//! `<artifacts_dir>/contracts/<Name>.sol/<Name>.json`, a JSON object carrying
//! at least `abi` and, for deployable contracts, `bytecode`.
//!
//! Calls are encoded against the loaded ABI rather than a compiled-in
//! binding, so the parameter types declared by the deployed contract decide
//! the wire format.

use alloy::dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Bytes, U256};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::blockchain::types::{ConnectorError, ConnectorResult};

pub const LOG_TRANSACTION: &str = "logTransaction";
pub const VERIFY_TRANSACTION: &str = "verifyTransaction";
pub const UPDATE_RISK_ASSESSMENT: &str = "updateRiskAssessment";
pub const BATCH_LOG_TRANSACTIONS: &str = "batchLogTransactions";

/// Methods the connector cannot work without.
const REQUIRED_METHODS: [&str; 3] = [LOG_TRANSACTION, VERIFY_TRANSACTION, UPDATE_RISK_ASSESSMENT];

/// Location of the artifact for `contract_name` under `artifacts_dir`.
pub fn artifact_path(artifacts_dir: &Path, contract_name: &str) -> PathBuf {
    artifacts_dir
        .join("contracts")
        .join(format!("{}.sol", contract_name))
        .join(format!("{}.json", contract_name))
}

/// A compiled contract as emitted by the build toolchain.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    #[serde(default)]
    pub contract_name: String,
    pub abi: JsonAbi,
    #[serde(default)]
    pub bytecode: Option<Bytes>,
}

impl ContractArtifact {
    /// Read and parse an artifact file.
    pub fn load(path: &Path) -> ConnectorResult<Self> {
        if !path.exists() {
            return Err(ConnectorError::Artifact(format!(
                "ABI file not found at {}. Compile the contracts first (npx hardhat compile)",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::Artifact(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
            .map_err(|e| ConnectorError::Artifact(format!("{}: {}", path.display(), e)))
    }

    /// Parse an artifact from its JSON text.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Creation bytecode, if the artifact carries a non-empty one.
    pub fn deploy_bytecode(&self) -> Option<&Bytes> {
        self.bytecode.as_ref().filter(|code| !code.is_empty())
    }
}

/// Callable surface of the risk registry contract.
#[derive(Debug, Clone)]
pub struct ContractInterface {
    abi: JsonAbi,
}

impl ContractInterface {
    /// Wrap an ABI, rejecting it when a required method is absent.
    pub fn new(abi: JsonAbi) -> ConnectorResult<Self> {
        let missing: Vec<&str> = REQUIRED_METHODS
            .iter()
            .copied()
            .filter(|name| abi.function(name).map_or(true, |f| f.is_empty()))
            .collect();

        if !missing.is_empty() {
            return Err(ConnectorError::Artifact(format!(
                "ABI is missing required method(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self { abi })
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    fn function(&self, name: &str) -> ConnectorResult<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| ConnectorError::Abi(format!("Contract ABI has no method '{}'", name)))
    }

    /// Calldata for `logTransaction(id, score, flagged)`.
    pub fn encode_log(&self, transaction_id: &str, risk_score: u64, flagged: bool) -> ConnectorResult<Bytes> {
        self.encode_assessment(LOG_TRANSACTION, transaction_id, risk_score, flagged)
    }

    /// Calldata for `updateRiskAssessment(id, score, flagged)`.
    pub fn encode_update(&self, transaction_id: &str, risk_score: u64, flagged: bool) -> ConnectorResult<Bytes> {
        self.encode_assessment(UPDATE_RISK_ASSESSMENT, transaction_id, risk_score, flagged)
    }

    /// Calldata for `verifyTransaction(id)`.
    pub fn encode_verify(&self, transaction_id: &str) -> ConnectorResult<Bytes> {
        let function = self.function(VERIFY_TRANSACTION)?;
        encode(function, &[DynSolValue::String(transaction_id.to_string())])
    }

    /// Decode the `(riskScore, flagged)` pair returned by `verifyTransaction`.
    pub fn decode_verify(&self, data: &[u8]) -> ConnectorResult<(u64, bool)> {
        let function = self.function(VERIFY_TRANSACTION)?;
        let values = function
            .abi_decode_output(data)
            .map_err(|e| ConnectorError::Abi(format!("Malformed {} output: {}", VERIFY_TRANSACTION, e)))?;

        match values.as_slice() {
            [DynSolValue::Uint(score, _), DynSolValue::Bool(flagged), ..] => {
                let score = u64::try_from(*score).map_err(|_| {
                    ConnectorError::Abi(format!("Risk score {} does not fit in 64 bits", score))
                })?;
                Ok((score, *flagged))
            }
            other => Err(ConnectorError::Abi(format!(
                "Unexpected {} output: {:?}",
                VERIFY_TRANSACTION, other
            ))),
        }
    }

    /// Calldata for `batchLogTransactions(ids[], scores[], flags[])`.
    pub fn encode_batch(&self, transaction_ids: &[String], risk_scores: &[u64], flags: &[bool]) -> ConnectorResult<Bytes> {
        let function = self.function(BATCH_LOG_TRANSACTIONS)?;
        let score_ty = match param_type(function, 1)? {
            DynSolType::Array(inner) => *inner,
            other => {
                return Err(ConnectorError::Abi(format!(
                    "Expected an array of scores, contract declares {}",
                    other
                )))
            }
        };

        let scores = risk_scores
            .iter()
            .map(|score| score_value(&score_ty, *score))
            .collect::<ConnectorResult<Vec<_>>>()?;

        encode(
            function,
            &[
                DynSolValue::Array(transaction_ids.iter().cloned().map(DynSolValue::String).collect()),
                DynSolValue::Array(scores),
                DynSolValue::Array(flags.iter().copied().map(DynSolValue::Bool).collect()),
            ],
        )
    }

    fn encode_assessment(&self, method: &str, transaction_id: &str, risk_score: u64, flagged: bool) -> ConnectorResult<Bytes> {
        let function = self.function(method)?;
        let score = score_value(&param_type(function, 1)?, risk_score)?;
        encode(
            function,
            &[
                DynSolValue::String(transaction_id.to_string()),
                score,
                DynSolValue::Bool(flagged),
            ],
        )
    }
}

fn encode(function: &Function, values: &[DynSolValue]) -> ConnectorResult<Bytes> {
    function
        .abi_encode_input(values)
        .map(Bytes::from)
        .map_err(|e| ConnectorError::Abi(format!("Cannot encode {}: {}", function.name, e)))
}

fn param_type(function: &Function, index: usize) -> ConnectorResult<DynSolType> {
    let param = function.inputs.get(index).ok_or_else(|| {
        ConnectorError::Abi(format!("{} has no parameter at position {}", function.name, index))
    })?;
    DynSolType::parse(&param.ty)
        .map_err(|e| ConnectorError::Abi(format!("{}: bad parameter type '{}': {}", function.name, param.ty, e)))
}

/// Encode a risk score for the declared unsigned parameter width.
fn score_value(ty: &DynSolType, score: u64) -> ConnectorResult<DynSolValue> {
    match ty {
        DynSolType::Uint(bits) => {
            if *bits < 64 && score >> *bits != 0 {
                return Err(ConnectorError::Abi(format!(
                    "Risk score {} does not fit the contract's uint{} parameter",
                    score, bits
                )));
            }
            Ok(DynSolValue::Uint(U256::from(score), *bits))
        }
        other => Err(ConnectorError::Abi(format!(
            "Unsupported risk score parameter type {}",
            other
        ))),
    }
}
