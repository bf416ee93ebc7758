//! # Kernel Client
//!
//! Runs one decision cycle against a remote kernel over HTTP: the input-link
//! document is posted to `<kernel_url>/cycle` and the reply is the
//! output-link document.
//!
//! At most one cycle is in flight per client. A call made while another is
//! outstanding is refused with [`KernelError::Busy`]; it is never queued.
//!
//! ## Configuration (Environment Variables)
//!
//! - `IDEABRIDGE_KERNEL_URL`: base URL of the kernel
//! - `IDEABRIDGE_KERNEL_TIMEOUT_SECS`: per-cycle timeout (default: 10)
//! - `IDEABRIDGE_KERNEL_API_KEY`: optional bearer token sent to the kernel

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Default per-cycle timeout.
pub const DEFAULT_KERNEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the kernel client.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The kernel could not be reached.
    #[error("Cannot connect to kernel at {0}")]
    ConnectionFailed(String),

    /// No reply within the configured timeout.
    #[error("Kernel did not reply within {0:?}")]
    Timeout(Duration),

    /// Another cycle is already in flight.
    #[error("A kernel cycle is already in flight")]
    Busy,

    /// The kernel answered with a non-success status.
    #[error("Kernel error ({0}): {1}")]
    ServerError(u16, String),

    /// The reply body was not JSON.
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// HTTP client for one remote kernel.
#[derive(Debug, Clone)]
pub struct KernelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    permit: Arc<Semaphore>,
}

impl KernelClient {
    /// Create a client for the kernel at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout,
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Send `Authorization: Bearer <key>` with every cycle.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Build a client from the environment. `override_url` and
    /// `override_timeout` take precedence over the variables.
    ///
    /// Returns `None` when no URL is configured.
    pub fn from_env(
        override_url: Option<&str>,
        override_timeout: Option<Duration>,
    ) -> Option<Self> {
        let url = override_url
            .map(str::to_string)
            .or_else(|| std::env::var("IDEABRIDGE_KERNEL_URL").ok())
            .filter(|u| !u.is_empty())?;
        let timeout = override_timeout.unwrap_or_else(get_timeout_from_env);

        let client = Self::new(url, timeout);
        match std::env::var("IDEABRIDGE_KERNEL_API_KEY") {
            Ok(key) if !key.is_empty() => Some(client.with_api_key(key)),
            _ => Some(client),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Post the input-link document and return the output-link document.
    pub async fn cycle(&self, input: &Value) -> Result<Value, KernelError> {
        let Ok(_permit) = self.permit.try_acquire() else {
            tracing::warn!(kernel = %self.base_url, "cycle refused: another is in flight");
            return Err(KernelError::Busy);
        };

        let url = format!("{}/cycle", self.base_url);
        let mut request = self.http.post(&url).json(input);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| KernelError::ConnectionFailed(format!("{url}: {e}")))?;
            Self::handle_response(response).await
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(kernel = %self.base_url, timeout = ?self.timeout, "cycle timed out");
                Err(KernelError::Timeout(self.timeout))
            }
        }
    }

    async fn handle_response(response: reqwest::Response) -> Result<Value, KernelError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KernelError::ServerError(status.as_u16(), body));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| KernelError::ParseError(e.to_string()))
    }
}

/// Read `IDEABRIDGE_KERNEL_TIMEOUT_SECS`, falling back to the default.
pub fn get_timeout_from_env() -> Duration {
    std::env::var("IDEABRIDGE_KERNEL_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(DEFAULT_KERNEL_TIMEOUT, Duration::from_secs)
}

// =============================================================================
// TESTS
// =============================================================================
