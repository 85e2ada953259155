//! HTTP client for the upstream registry, with retry and backoff.
//!
//! Each lookup is a GET of `{base_url}/{dni}` with a bearer credential.
//! Transient failures (HTTP 5xx, connect errors, per-attempt timeouts) are
//! retried with linearly increasing backoff; definitive client errors are
//! not retried and map to the typed failures of the error taxonomy.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::normalize::normalize_payload;
use super::{validate_dni, IdentityData, IdentitySource};
use crate::config::RegistryConfig;
use crate::error::{Result, VaultError};

/// One attempt's failure, tagged with whether another attempt is worth it.
enum AttemptError {
    /// Do not retry; return this error as-is.
    Fatal(VaultError),
    /// Worth another attempt (server error, network failure, timeout).
    Transient(VaultError),
}

/// Client for the external registry API.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
    retries: u32,
    base_delay: Duration,
    timeout: Duration,
}

impl RegistryClient {
    /// Build a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Config` if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dnivault/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VaultError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url,
            token: config.token,
            retries: config.retries,
            base_delay: config.base_delay,
            timeout: config.timeout,
        })
    }

    async fn attempt(&self, dni: &str, attempt: u32) -> std::result::Result<IdentityData, AttemptError> {
        debug!(dni, attempt, "consulting registry");

        let url = format!("{}/{}", self.base_url, dni);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                AttemptError::Transient(VaultError::Upstream(format!(
                    "registry request failed: {}",
                    e
                )))
            })?;

        if let Some(failure) = classify_status(dni, response.status()) {
            return Err(failure);
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            AttemptError::Transient(VaultError::Upstream(format!(
                "invalid registry response body: {}",
                e
            )))
        })?;

        // Malformed-but-successful responses are treated as transient: the
        // upstream is known to misbehave intermittently.
        normalize_payload(dni, &body).map_err(AttemptError::Transient)
    }
}

#[async_trait]
impl IdentitySource for RegistryClient {
    async fn fetch(&self, dni: &str) -> Result<IdentityData> {
        if !validate_dni(dni) {
            return Err(VaultError::Validation(
                "DNI must be exactly 8 numeric digits".to_string(),
            ));
        }

        retry_with_backoff(self.retries, self.base_delay, |attempt| {
            self.attempt(dni, attempt)
        })
        .await
    }
}

/// Map an HTTP status to an attempt outcome; `None` means success.
///
/// 404 and 401/403 are definitive; any other 4xx is a non-retryable
/// upstream failure; 5xx (and anything else non-success) is transient.
fn classify_status(dni: &str, status: StatusCode) -> Option<AttemptError> {
    if status.is_success() {
        return None;
    }

    let failure = match status {
        StatusCode::NOT_FOUND => AttemptError::Fatal(VaultError::DocumentNotFound(dni.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AttemptError::Fatal(VaultError::UpstreamAuth(status.as_u16()))
        }
        _ if status.is_client_error() => AttemptError::Fatal(VaultError::Upstream(format!(
            "registry rejected the request (HTTP {})",
            status.as_u16()
        ))),
        _ => AttemptError::Transient(VaultError::Upstream(format!(
            "registry returned HTTP {}",
            status.as_u16()
        ))),
    };

    Some(failure)
}

/// Run `op` up to `retries + 1` times, sleeping `base_delay * attempt`
/// between transient failures. Fatal failures end the loop immediately.
async fn retry_with_backoff<T, F, Fut>(
    retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, AttemptError>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(err)) => return Err(err),
            Err(AttemptError::Transient(err)) => {
                if attempt > retries {
                    return Err(err);
                }
                let delay = base_delay * attempt;
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "registry attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn transient() -> AttemptError {
        AttemptError::Transient(VaultError::Upstream("boom".to_string()))
    }

    #[tokio::test]
    async fn test_two_transient_failures_then_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = retry_with_backoff(2, Duration::from_millis(1), move |_| {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(transient())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_failure_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<()> = retry_with_backoff(2, Duration::from_millis(1), move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AttemptError::Fatal(VaultError::DocumentNotFound(
                    "12345678".to_string(),
                )))
            }
        })
        .await;

        assert!(matches!(result, Err(VaultError::DocumentNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<()> = retry_with_backoff(2, Duration::from_millis(1), move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            }
        })
        .await;

        assert!(matches!(result, Err(VaultError::Upstream(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<()> = retry_with_backoff(0, Duration::from_millis(1), move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_classify_not_found() {
        let failure = classify_status("12345678", StatusCode::NOT_FOUND);
        assert!(matches!(
            failure,
            Some(AttemptError::Fatal(VaultError::DocumentNotFound(dni))) if dni == "12345678"
        ));
    }

    #[test]
    fn test_classify_credential_rejection() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let failure = classify_status("12345678", status);
            assert!(matches!(
                failure,
                Some(AttemptError::Fatal(VaultError::UpstreamAuth(code))) if code == status.as_u16()
            ));
        }
    }

    #[test]
    fn test_classify_other_client_errors_fatal() {
        let failure = classify_status("12345678", StatusCode::UNPROCESSABLE_ENTITY);
        assert!(matches!(
            failure,
            Some(AttemptError::Fatal(VaultError::Upstream(_)))
        ));
    }

    #[test]
    fn test_classify_server_errors_transient() {
        for status in [StatusCode::INTERNAL_SERVER_ERROR, StatusCode::BAD_GATEWAY] {
            let failure = classify_status("12345678", status);
            assert!(matches!(
                failure,
                Some(AttemptError::Transient(VaultError::Upstream(_)))
            ));
        }
    }

    #[test]
    fn test_classify_success_is_none() {
        assert!(classify_status("12345678", StatusCode::OK).is_none());
    }
}
