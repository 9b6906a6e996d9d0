//! Transaction snapshot fetching
//!
//! Thin wrapper over the nonblocking `RpcClient` that issues `getTransaction`
//! with JSON encoding and turns the payload into a [`TransactionSnapshot`].
//! Also lists the recent signatures of an account for the account view.

use std::{
    future::Future,
    str::FromStr,
    time::{Duration, Instant},
};

use ixtree::{SnapshotError, TransactionSnapshot};
use serde_json::{json, Value};
use solana_client::{
    client_error::ClientError, nonblocking::rpc_client::RpcClient,
    rpc_client::GetConfirmedSignaturesForAddress2Config, rpc_request::RpcRequest,
    rpc_response::RpcConfirmedTransactionStatusWithSignature,
};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
use thiserror::Error;

use crate::config::Config;

/// Signatures shown per account lookup.
pub const ACCOUNT_SIGNATURE_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("transaction {0} not found")]
    NotFound(Signature),

    #[error("rpc request failed after {attempts} attempts: {message}")]
    Transport { attempts: u32, message: String },

    #[error("failed to decode transaction: {0}")]
    Decode(#[from] SnapshotError),
}

impl FetchError {
    /// Whether issuing the same fetch again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Transport { .. })
    }
}

pub struct SnapshotClient {
    client: RpcClient,
    commitment: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl SnapshotClient {
    pub fn new(config: &Config) -> Self {
        Self::with_client(RpcClient::new(config.rpc_url.clone()), config)
    }

    fn with_client(client: RpcClient, config: &Config) -> Self {
        Self {
            client,
            commitment: config.commitment.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig::from_str(&self.commitment).unwrap_or_else(|_| {
            tracing::warn!(
                commitment = %self.commitment,
                "Unknown commitment level, using confirmed"
            );
            CommitmentConfig::confirmed()
        })
    }

    pub async fn fetch(&self, signature: &str) -> Result<TransactionSnapshot, FetchError> {
        let signature: Signature = signature
            .trim()
            .parse()
            .map_err(|_| FetchError::InvalidSignature(signature.to_string()))?;

        let value = self.get_transaction(&signature).await?;
        if value.is_null() {
            return Err(FetchError::NotFound(signature));
        }
        Ok(TransactionSnapshot::from_rpc_value(value)?)
    }

    /// The most recent signatures that touched `address`, newest first.
    pub async fn recent_signatures(
        &self,
        address: &str,
    ) -> Result<Vec<RpcConfirmedTransactionStatusWithSignature>, FetchError> {
        let address: Pubkey = address
            .trim()
            .parse()
            .map_err(|_| FetchError::InvalidAddress(address.to_string()))?;
        let commitment = self.commitment_config();

        let signatures = self
            .with_retries("getSignaturesForAddress", || {
                self.client.get_signatures_for_address_with_config(
                    &address,
                    GetConfirmedSignaturesForAddress2Config {
                        before: None,
                        until: None,
                        limit: Some(ACCOUNT_SIGNATURE_LIMIT),
                        commitment: Some(commitment),
                    },
                )
            })
            .await?;

        tracing::debug!(
            address = %address,
            count = signatures.len(),
            "getSignaturesForAddress: OK"
        );
        Ok(signatures)
    }

    async fn get_transaction(&self, signature: &Signature) -> Result<Value, FetchError> {
        let params = json!([
            signature.to_string(),
            {
                "encoding": "json",
                "commitment": self.commitment,
                "maxSupportedTransactionVersion": 0
            }
        ]);

        let value: Value = self
            .with_retries("getTransaction", || {
                self.client
                    .send::<Value>(RpcRequest::GetTransaction, params.clone())
            })
            .await?;

        tracing::debug!(
            signature = %signature,
            found = !value.is_null(),
            "getTransaction: OK"
        );
        Ok(value)
    }

    /// Run `call` up to `max_retries + 1` times with a fixed delay between
    /// failed attempts.
    async fn with_retries<T, F, Fut>(
        &self,
        method: &'static str,
        mut call: F,
    ) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let attempts = self.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let start = Instant::now();
            match call().await {
                Ok(value) => {
                    tracing::trace!(
                        method,
                        attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "rpc call succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        method,
                        attempt,
                        max_attempts = attempts,
                        error = %last_error,
                        "rpc call failed"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(FetchError::Transport {
            attempts,
            message: last_error,
        })
    }
}
