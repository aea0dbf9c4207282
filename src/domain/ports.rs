use super::payment::{AttemptRecord, Invoice, InvoiceRequest};
use crate::error::Result;
use async_trait::async_trait;

/// Delivers a frame to the bank and returns the raw response frame.
///
/// Implementations must not retry; they fail with `TransportConnect`,
/// `TransportTimeout` or `Protocol` so the caller can tell "the bank said no"
/// apart from "we don't know what happened".
#[async_trait]
pub trait BankTransport: Send + Sync {
    async fn exchange(&self, frame: &str) -> Result<String>;
}

/// Issues an invoice for an approved payment.
#[async_trait]
pub trait Invoicer: Send + Sync {
    async fn issue(&self, request: InvoiceRequest) -> Result<Invoice>;
}

/// Audit trail of every attempt that reached the bank transport.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn record(&self, record: AttemptRecord) -> Result<()>;
    /// All records for a reference, oldest first.
    async fn find_by_reference(&self, reference: &str) -> Result<Vec<AttemptRecord>>;
    async fn reference_exists(&self, reference: &str) -> Result<bool>;
    async fn all(&self) -> Result<Vec<AttemptRecord>>;
}

pub type BankTransportBox = Box<dyn BankTransport>;
pub type InvoicerBox = Box<dyn Invoicer>;
pub type TransactionLogBox = Box<dyn TransactionLog>;
