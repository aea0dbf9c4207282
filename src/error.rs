use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    /// Bad input detected before any I/O.
    #[error("invalid `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("frame integrity violated: {0}")]
    FrameIntegrity(String),
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("could not reach bank at {addr}: {source}")]
    TransportConnect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// The bank did not answer in time. When `frame_sent` is true the bank
    /// may still have processed the frame.
    #[error("bank at {addr} did not respond within {timeout:?} (frame sent: {frame_sent})")]
    TransportTimeout {
        addr: String,
        timeout: Duration,
        frame_sent: bool,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("invalid attempt state: {0}")]
    InvalidState(String),
    #[error("invoicing failed: {0}")]
    Invoicing(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
}

impl PaymentError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// True for failures where the outcome at the bank is unknown.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::TransportConnect { .. } | Self::TransportTimeout { .. } | Self::Protocol(_)
        )
    }

    /// Connect failures never reached the bank, so resending is safe.
    /// Timeouts after the write are not: the caller must rely on the
    /// duplicate status to detect an earlier settlement.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransportConnect { .. } => true,
            Self::TransportTimeout { frame_sent, .. } => !frame_sent,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
