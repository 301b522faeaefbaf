//! Configuration for the txrelay service.

use std::{fmt, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use txrelay_delivery::{ClientConfig, PoolConfig};

const CONFIG_FILE: &str = "txrelay.toml";
const ENV_PREFIX: &str = "TXRELAY_";

/// Where records are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Newline-delimited records on stdin, ended by `done`.
    #[default]
    Stream,
    /// A single record read from `input_path`.
    File,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream => write!(f, "stream"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables prefixed `TXRELAY_` (highest priority)
/// 2. Configuration file (`txrelay.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// # Example
///
/// ```no_run
/// use txrelay_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Forwarding to {}", config.destination_url);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    // Forwarding
    /// URL every record is POSTed to.
    ///
    /// Environment variable: `TXRELAY_DESTINATION_URL`
    #[serde(default = "default_destination_url")]
    pub destination_url: String,
    /// Basic-auth user name.
    ///
    /// Environment variable: `TXRELAY_USERNAME`
    #[serde(default = "default_username")]
    pub username: String,
    /// Basic-auth password.
    ///
    /// Environment variable: `TXRELAY_PASSWORD`
    #[serde(default = "default_password")]
    pub password: String,
    /// Per-request timeout in seconds.
    ///
    /// Environment variable: `TXRELAY_FORWARD_TIMEOUT_SECONDS`
    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_seconds: u64,
    /// Number of concurrent forward workers.
    ///
    /// Environment variable: `TXRELAY_FORWARD_WORKERS`
    #[serde(default = "default_forward_workers")]
    pub forward_workers: usize,
    /// Records queued before ingestion waits.
    ///
    /// Environment variable: `TXRELAY_FORWARD_QUEUE_SIZE`
    #[serde(default = "default_queue_size")]
    pub forward_queue_size: usize,
    /// Time allowed for queued forwards to drain at shutdown.
    ///
    /// Environment variable: `TXRELAY_SHUTDOWN_TIMEOUT_SECONDS`
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,

    // Input
    /// `stream` (stdin) or `file`.
    ///
    /// Environment variable: `TXRELAY_INPUT_MODE`
    #[serde(default)]
    pub input_mode: InputMode,
    /// Record file used in file mode.
    ///
    /// Environment variable: `TXRELAY_INPUT_PATH`
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,

    // Health server
    /// Whether to run the health-check server.
    ///
    /// Environment variable: `TXRELAY_HEALTH_ENABLED`
    #[serde(default = "default_health_enabled")]
    pub health_enabled: bool,
    /// Health server bind address.
    ///
    /// Environment variable: `TXRELAY_HEALTH_HOST`
    #[serde(default = "default_health_host")]
    pub health_host: String,
    /// Health server bind port.
    ///
    /// Environment variable: `TXRELAY_HEALTH_PORT`
    #[serde(default = "default_health_port")]
    pub health_port: u16,

    // Logging
    /// Log filter used when `RUST_LOG` is unset.
    ///
    /// Environment variable: `TXRELAY_RUST_LOG`
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment
    /// variable overrides.
    ///
    /// # Errors
    ///
    /// Fails if a source cannot be parsed or the result does not validate.
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Self::default()))
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    /// Extracts and validates configuration from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Fails if extraction fails or the result does not validate.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Convert to the forward client's configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            destination_url: self.destination_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: Duration::from_secs(self.forward_timeout_seconds),
            ..ClientConfig::default()
        }
    }

    /// Convert to forward pool sizing.
    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig { worker_count: self.forward_workers, queue_capacity: self.forward_queue_size }
    }

    /// Time allowed for the forward pool to drain at shutdown.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }

    /// Parse the health server socket address.
    ///
    /// # Errors
    ///
    /// Fails if `health_host` is not an IP address.
    pub fn health_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.health_host, self.health_port);
        SocketAddr::from_str(&addr_str).context("Invalid health server address")
    }

    /// Password rendered for logs.
    pub fn password_masked(&self) -> &'static str {
        if self.password.is_empty() {
            "<empty>"
        } else {
            "***"
        }
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.destination_url)
            .with_context(|| format!("destination_url '{}' is not a URL", self.destination_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("destination_url must use http or https, got '{}'", url.scheme());
        }

        if self.forward_workers == 0 {
            anyhow::bail!("forward_workers must be greater than 0");
        }

        if self.forward_queue_size == 0 {
            anyhow::bail!("forward_queue_size must be greater than 0");
        }

        if self.forward_timeout_seconds == 0 {
            anyhow::bail!("forward_timeout_seconds must be greater than 0");
        }

        if self.health_port == 0 {
            anyhow::bail!("health_port must be greater than 0");
        }

        if self.health_enabled {
            self.health_addr()?;
        }

        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("destination_url", &self.destination_url)
            .field("username", &self.username)
            .field("password", &self.password_masked())
            .field("forward_timeout_seconds", &self.forward_timeout_seconds)
            .field("forward_workers", &self.forward_workers)
            .field("forward_queue_size", &self.forward_queue_size)
            .field("shutdown_timeout_seconds", &self.shutdown_timeout_seconds)
            .field("input_mode", &self.input_mode)
            .field("input_path", &self.input_path)
            .field("health_enabled", &self.health_enabled)
            .field("health_host", &self.health_host)
            .field("health_port", &self.health_port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destination_url: default_destination_url(),
            username: default_username(),
            password: default_password(),
            forward_timeout_seconds: default_forward_timeout(),
            forward_workers: default_forward_workers(),
            forward_queue_size: default_queue_size(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
            input_mode: InputMode::default(),
            input_path: default_input_path(),
            health_enabled: default_health_enabled(),
            health_host: default_health_host(),
            health_port: default_health_port(),
            rust_log: default_log_level(),
        }
    }
}

fn default_destination_url() -> String {
    txrelay_delivery::DEFAULT_DESTINATION_URL.to_string()
}

fn default_username() -> String {
    "username".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_forward_timeout() -> u64 {
    txrelay_delivery::DEFAULT_TIMEOUT_SECONDS
}

fn default_forward_workers() -> usize {
    txrelay_delivery::DEFAULT_WORKER_COUNT
}

fn default_queue_size() -> usize {
    txrelay_delivery::DEFAULT_QUEUE_CAPACITY
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_input_path() -> PathBuf {
    PathBuf::from("input.json")
}

fn default_health_enabled() -> bool {
    true
}

fn default_health_host() -> String {
    "0.0.0.0".to_string()
}

fn default_health_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}
