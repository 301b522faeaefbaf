//! HTTP client that forwards records with Basic authentication.
//!
//! Each record becomes one POST carrying its canonical JSON encoding. The
//! response body is drained and discarded; only the status is kept for
//! logging and stats.

use std::{fmt, time::Duration};

use base64::prelude::*;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{info_span, Instrument};
use txrelay_core::ValidatedRecord;

use crate::{
    error::{ForwardError, Result},
    forwarder::Forwarder,
};

/// Configuration for the forward client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Absolute URL every record is POSTed to.
    pub destination_url: String,
    /// Basic-auth user name.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Timeout for a single outbound request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            destination_url: crate::DEFAULT_DESTINATION_URL.to_string(),
            username: "username".to_string(),
            password: "password".to_string(),
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECONDS),
            user_agent: concat!("txrelay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("destination_url", &self.destination_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Outcome of a forward attempt that reached the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Total duration of the request.
    pub duration: Duration,
    /// Whether the destination answered with a 2xx status.
    pub is_success: bool,
}

/// Builds the value of an `Authorization` header for Basic authentication.
///
/// ```
/// use txrelay_delivery::basic_auth_header;
///
/// assert_eq!(basic_auth_header("username", "password"), "Basic dXNlcm5hbWU6cGFzc3dvcmQ=");
/// ```
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64_STANDARD.encode(format!("{username}:{password}")))
}

/// HTTP client for forwarding records to a fixed destination.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ForwardClient {
    client: reqwest::Client,
    destination: reqwest::Url,
    authorization: HeaderValue,
    timeout: Duration,
}

impl ForwardClient {
    /// Creates a new forward client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `ForwardError::ConfigurationError` if the destination is not
    /// a valid URL, the credentials cannot form a header, or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let destination = reqwest::Url::parse(&config.destination_url).map_err(|e| {
            ForwardError::configuration(format!(
                "invalid destination url '{}': {e}",
                config.destination_url
            ))
        })?;

        let mut authorization =
            HeaderValue::from_str(&basic_auth_header(&config.username, &config.password))
                .map_err(|e| ForwardError::configuration(format!("invalid credentials: {e}")))?;
        authorization.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ForwardError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, destination, authorization, timeout: config.timeout })
    }

    /// Creates a forward client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// URL records are sent to.
    pub fn destination(&self) -> &str {
        self.destination.as_str()
    }

    /// Forwards a record to the destination.
    ///
    /// A non-2xx status is not an error: the destination was reached and the
    /// response is reported back for logging.
    ///
    /// # Errors
    ///
    /// - `SerializationError` if the record cannot be encoded
    /// - `Timeout` if the request exceeds the configured timeout
    /// - `NetworkError` for connection and transport failures
    pub async fn deliver(&self, record: &ValidatedRecord) -> Result<ForwardResponse> {
        let start_time = std::time::Instant::now();

        let span = info_span!(
            "forward",
            tx_id = %record.tx_id(),
            url = %self.destination,
        );

        async move {
            let body = record.to_canonical_json().map_err(ForwardError::from)?;
            tracing::debug!(body_bytes = body.len(), "Forwarding record");

            let request = self
                .client
                .post(self.destination.clone())
                .header(AUTHORIZATION, self.authorization.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(body);

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let duration = start_time.elapsed();
                    tracing::warn!(duration_ms = duration.as_millis(), "Forward failed: {}", e);

                    if e.is_timeout() {
                        return Err(ForwardError::timeout(self.timeout.as_secs()));
                    }
                    if e.is_connect() {
                        return Err(ForwardError::network(format!("connection failed: {e}")));
                    }
                    return Err(ForwardError::network(e.to_string()));
                },
            };

            let status = response.status();

            // Drain so the connection can return to the pool
            if let Err(e) = response.bytes().await {
                tracing::debug!("Failed to drain response body: {}", e);
            }

            let duration = start_time.elapsed();

            if status.is_success() {
                tracing::info!(
                    status = status.as_u16(),
                    duration_ms = duration.as_millis(),
                    "Record forwarded"
                );
            } else {
                tracing::warn!(
                    status = status.as_u16(),
                    duration_ms = duration.as_millis(),
                    "Destination rejected record"
                );
            }

            Ok(ForwardResponse {
                status_code: status.as_u16(),
                duration,
                is_success: status.is_success(),
            })
        }
        .instrument(span)
        .await
    }
}

#[async_trait::async_trait]
impl Forwarder for ForwardClient {
    async fn forward(&self, record: &ValidatedRecord) -> Result<ForwardResponse> {
        self.deliver(record).await
    }
}
