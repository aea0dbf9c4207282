use crate::domain::payment::FrameDefaults;
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Bank connection settings plus the defaults for the fixed frame slots.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BankConfig {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
    pub defaults: FrameDefaults,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            defaults: FrameDefaults::default(),
        }
    }
}

impl BankConfig {
    /// Loads a JSON config file; missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line or environment overrides.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        timeout_ms: Option<u64>,
    ) -> Result<Self> {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(timeout_ms) = timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn endpoint(&self) -> BankEndpoint {
        BankEndpoint {
            host: self.host.clone(),
            port: self.port,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(PaymentError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(PaymentError::Config("port must not be 0".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(PaymentError::Config("timeoutMs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Where and how long to talk to the bank. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankEndpoint {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl BankEndpoint {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
