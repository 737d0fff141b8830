//! Placeholder handlers for the stock task types.
//!
//! These stand in for the real collaborators (content download, generative
//! text, ledger submission, content-addressed storage). They do just enough
//! real or simulated work to exercise the engine end to end.

use super::{HandlerRegistry, TaskHandler};
use crate::errors::HandlerError;
use async_trait::async_trait;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::info;

/// Tag of the download handler.
pub const DOWNLOAD: &str = "download";
/// Tag of the generative-text handler.
pub const AI: &str = "ai";
/// Tag of the ledger-submission handler.
pub const BLOCKCHAIN: &str = "blockchain";
/// Tag of the content-addressed storage handler.
pub const STORAGE: &str = "storage";

/// Tunables for the built-in handlers.
#[derive(Debug, Clone)]
pub struct BuiltinOptions {
    /// Simulated generation time of the `ai` handler.
    pub ai_latency: Duration,
    /// Simulated confirmation time of the `blockchain` handler.
    pub blockchain_latency: Duration,
    /// Probability in `[0, 1]` that a `blockchain` submission fails.
    pub blockchain_failure_rate: f64,
}

impl Default for BuiltinOptions {
    fn default() -> Self {
        Self {
            ai_latency: Duration::from_millis(500),
            blockchain_latency: Duration::from_millis(300),
            blockchain_failure_rate: 0.2,
        }
    }
}

impl BuiltinOptions {
    /// Options with no simulated latency and no random failures.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            ai_latency: Duration::ZERO,
            blockchain_latency: Duration::ZERO,
            blockchain_failure_rate: 0.0,
        }
    }
}

/// Builds a registry with every built-in handler and default options.
#[must_use]
pub fn default_registry() -> HandlerRegistry {
    registry_with(&BuiltinOptions::default())
}

/// Builds a registry with every built-in handler.
#[must_use]
pub fn registry_with(options: &BuiltinOptions) -> HandlerRegistry {
    let builder = HandlerRegistry::builder()
        .register(AI, AiHandler::new(options.ai_latency))
        .register(
            BLOCKCHAIN,
            BlockchainHandler::new(options.blockchain_latency, options.blockchain_failure_rate),
        )
        .register(STORAGE, StorageHandler);

    #[cfg(feature = "http")]
    let builder = builder.register(DOWNLOAD, DownloadHandler::new());

    builder.build()
}

/// Fetches a URL over HTTP and reports what came back.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct DownloadHandler {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl DownloadHandler {
    /// Creates a handler with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl TaskHandler for DownloadHandler {
    async fn handle(&self, payload: &str) -> Result<String, HandlerError> {
        let response = self.client.get(payload).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(HandlerError::new(format!("download failed: HTTP {status}")));
        }
        let body = response.bytes().await?;
        Ok(format!("{} {} bytes", status.as_u16(), body.len()))
    }
}

/// Simulated generative-text call.
#[derive(Debug, Clone)]
pub struct AiHandler {
    latency: Duration,
}

impl AiHandler {
    /// Creates a handler that takes `latency` per call.
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl TaskHandler for AiHandler {
    async fn handle(&self, payload: &str) -> Result<String, HandlerError> {
        if payload.trim().is_empty() {
            return Err(HandlerError::new("empty prompt"));
        }
        tokio::time::sleep(self.latency).await;
        info!(prompt = %payload, "Generated content");
        Ok(format!("AI generated content for prompt: {payload}"))
    }
}

/// Simulated ledger transaction.
#[derive(Debug, Clone)]
pub struct BlockchainHandler {
    latency: Duration,
    failure_rate: f64,
}

impl BlockchainHandler {
    /// Creates a handler. `failure_rate` is clamped to `[0, 1]`.
    #[must_use]
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        let failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        Self {
            latency,
            failure_rate,
        }
    }
}

#[async_trait]
impl TaskHandler for BlockchainHandler {
    async fn handle(&self, payload: &str) -> Result<String, HandlerError> {
        tokio::time::sleep(self.latency).await;
        let (failed, tx) = {
            let mut rng = rand::thread_rng();
            (rng.gen_bool(self.failure_rate), rng.gen::<u64>())
        };
        if failed {
            return Err(HandlerError::new("blockchain tx failed"));
        }
        let tx_hash = format!("0x{tx:016x}");
        info!(action = %payload, tx_hash = %tx_hash, "Executed contract action");
        Ok(tx_hash)
    }
}

/// Content-addressed storage: hashes the file at the payload path.
///
/// The result is the content address (`sha256:<hex>`) a pinning service
/// would return for the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageHandler;

#[async_trait]
impl TaskHandler for StorageHandler {
    async fn handle(&self, payload: &str) -> Result<String, HandlerError> {
        let bytes = tokio::fs::read(payload).await?;
        let digest = Sha256::digest(&bytes);
        let cid = format!("sha256:{}", hex::encode(digest));
        info!(path = %payload, cid = %cid, size = bytes.len(), "Stored file");
        Ok(cid)
    }
}
