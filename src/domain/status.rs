//! The bank's two-digit status table.
//!
//! This is the only place status codes are interpreted. The payment service,
//! the frame relay and the CLI all go through [`StatusCode`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum StatusCode {
    /// `00`, only valid in outbound frames.
    Pending,
    Approved,
    Rejected,
    SystemUnavailable,
    CancelledByUser,
    InsufficientFunds,
    ClientNotRecognized,
    InvalidCompanyOrBranch,
    InvalidAmount,
    Duplicate,
    /// Any other code, kept verbatim.
    Unknown(String),
}

/// What a status means for the business flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    NotApplicable,
    Success,
    UserCorrectable,
    Transient,
    Informational,
    Configuration,
    /// The reference was already settled; do not retry or re-invoice.
    AlreadySettled,
    Unknown,
}

/// How a status is presented to a storefront user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
    Question,
}

impl StatusCode {
    /// Total over all inputs; unrecognized codes become `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "00" => Self::Pending,
            "01" => Self::Approved,
            "02" => Self::Rejected,
            "03" => Self::SystemUnavailable,
            "04" => Self::CancelledByUser,
            "05" => Self::InsufficientFunds,
            "06" => Self::ClientNotRecognized,
            "07" => Self::InvalidCompanyOrBranch,
            "08" => Self::InvalidAmount,
            "09" => Self::Duplicate,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Pending => "00",
            Self::Approved => "01",
            Self::Rejected => "02",
            Self::SystemUnavailable => "03",
            Self::CancelledByUser => "04",
            Self::InsufficientFunds => "05",
            Self::ClientNotRecognized => "06",
            Self::InvalidCompanyOrBranch => "07",
            Self::InvalidAmount => "08",
            Self::Duplicate => "09",
            Self::Unknown(raw) => raw,
        }
    }

    /// Short label, as stored in the transaction log.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::SystemUnavailable => "System unavailable",
            Self::CancelledByUser => "Cancelled by user",
            Self::InsufficientFunds => "Insufficient funds",
            Self::ClientNotRecognized => "Client not recognized",
            Self::InvalidCompanyOrBranch => "Invalid company/branch",
            Self::InvalidAmount => "Invalid amount",
            Self::Duplicate => "Duplicate transaction",
            Self::Unknown(_) => "Unknown status",
        }
    }

    /// Sentence shown to the customer.
    pub fn message(&self) -> String {
        match self {
            Self::Pending => "Transaction pending".to_string(),
            Self::Approved => "Payment processed successfully".to_string(),
            Self::Rejected => "Transaction rejected by the bank".to_string(),
            Self::SystemUnavailable => "The bank system is unavailable, try again later".to_string(),
            Self::CancelledByUser => "Transaction cancelled by the user".to_string(),
            Self::InsufficientFunds => "The account does not have sufficient funds".to_string(),
            Self::ClientNotRecognized => "Client not recognized".to_string(),
            Self::InvalidCompanyOrBranch => "Invalid company or branch".to_string(),
            Self::InvalidAmount => "Invalid amount".to_string(),
            Self::Duplicate => "Duplicate transaction, already processed".to_string(),
            Self::Unknown(raw) => format!("Unknown bank response (code {raw})"),
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Pending => Outcome::NotApplicable,
            Self::Approved => Outcome::Success,
            Self::Rejected | Self::InsufficientFunds | Self::ClientNotRecognized => {
                Outcome::UserCorrectable
            }
            Self::SystemUnavailable => Outcome::Transient,
            Self::CancelledByUser => Outcome::Informational,
            Self::InvalidCompanyOrBranch | Self::InvalidAmount => Outcome::Configuration,
            Self::Duplicate => Outcome::AlreadySettled,
            Self::Unknown(_) => Outcome::Unknown,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Approved => Severity::Success,
            Self::Rejected | Self::SystemUnavailable => Severity::Error,
            Self::InsufficientFunds
            | Self::ClientNotRecognized
            | Self::InvalidCompanyOrBranch
            | Self::InvalidAmount => Severity::Warning,
            Self::CancelledByUser | Self::Duplicate => Severity::Info,
            Self::Pending | Self::Unknown(_) => Severity::Question,
        }
    }

    pub fn is_approved(&self) -> bool {
        *self == Self::Approved
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<StatusCode> for String {
    fn from(status: StatusCode) -> Self {
        status.code().to_string()
    }
}

impl From<String> for StatusCode {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}
