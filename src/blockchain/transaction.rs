//! Transaction building, confirmation and contract deployment.
//!
//! # Responsibilities
//! - Build call and creation requests
//! - Wait for confirmations with a bounded timeout
//! - Deploy a compiled artifact through any `Transport`
//!
//! Gas, nonce and chain id are filled in by the provider; nothing here
//! retries a failed broadcast.

use alloy::network::{Ethereum, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::PendingTransactionBuilder;
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;

use crate::blockchain::artifact::ContractArtifact;
use crate::blockchain::transport::{Confirmation, Transport};
use crate::blockchain::types::{ConnectorError, ConnectorResult, Deployment};

/// Request for a read-only call.
pub fn call_request(to: Address, input: Bytes) -> TransactionRequest {
    TransactionRequest::default().with_to(to).with_input(input)
}

/// Request for a state-changing call, or a contract creation when `to` is
/// `None`.
pub fn submit_request(to: Option<Address>, input: Bytes, from: Option<Address>) -> TransactionRequest {
    let tx = match to {
        Some(to) => TransactionRequest::default().with_to(to).with_input(input),
        None => TransactionRequest::default().with_deploy_code(input),
    };

    match from {
        Some(from) => tx.with_from(from),
        None => tx,
    }
}

/// Wait for a broadcast transaction to reach `confirmations` blocks.
///
/// # Arguments
/// * `pending` - Handle returned by the provider after broadcast
/// * `confirmations` - Required block depth
/// * `timeout` - Maximum time to wait for the receipt
pub async fn wait_for_confirmation(
    pending: PendingTransactionBuilder<Ethereum>,
    confirmations: u64,
    timeout: Duration,
) -> ConnectorResult<Confirmation> {
    let tx_hash = *pending.tx_hash();
    tracing::debug!(tx_hash = %tx_hash, confirmations, "Waiting for confirmation");

    let receipt = pending
        .with_required_confirmations(confirmations)
        .with_timeout(Some(timeout))
        .get_receipt()
        .await
        .map_err(|e| ConnectorError::Remote(e.to_string()))?;

    Ok(Confirmation {
        transaction_hash: receipt.transaction_hash(),
        block_number: receipt.block_number().unwrap_or_default(),
        contract_address: receipt.contract_address(),
        success: receipt.status(),
    })
}

/// Deploy the artifact's creation bytecode with the transport's signer.
pub async fn deploy_contract<T: Transport>(
    transport: &T,
    artifact: &ContractArtifact,
) -> ConnectorResult<Deployment> {
    let sender = transport.sender().ok_or(ConnectorError::NoWallet)?;
    let bytecode = artifact.deploy_bytecode().cloned().ok_or_else(|| {
        ConnectorError::Artifact(format!(
            "Artifact for {} has no deployable bytecode",
            artifact.contract_name
        ))
    })?;

    tracing::info!(contract = %artifact.contract_name, deployer = %sender, "Deploying contract");

    let confirmation = transport.submit(None, bytecode).await?;
    if !confirmation.success {
        return Err(ConnectorError::Reverted(confirmation.transaction_hash));
    }

    let contract_address = confirmation.contract_address.ok_or_else(|| {
        ConnectorError::Rpc("Deployment receipt carries no contract address".to_string())
    })?;

    tracing::info!(
        contract = %artifact.contract_name,
        address = %contract_address,
        block_number = confirmation.block_number,
        "Contract deployed"
    );

    Ok(Deployment {
        contract_address,
        transaction_hash: confirmation.transaction_hash,
        block_number: confirmation.block_number,
    })
}
