use super::invoice::invoice_number;
use crate::domain::payment::{AttemptRecord, Invoice, InvoiceRequest};
use crate::domain::ports::{Invoicer, TransactionLog};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory transaction log.
///
/// Uses `Arc<RwLock<Vec<AttemptRecord>>>` so clones share the same records.
/// Suitable for tests and single-run CLI invocations.
#[derive(Default, Clone)]
pub struct InMemoryTransactionLog {
    records: Arc<RwLock<Vec<AttemptRecord>>>,
}

impl InMemoryTransactionLog {
    /// Creates a new, empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn record(&self, record: AttemptRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Vec<AttemptRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.reference == reference)
            .cloned()
            .collect())
    }

    async fn reference_exists(&self, reference: &str) -> Result<bool> {
        let records = self.records.read().await;
        Ok(records.iter().any(|r| r.reference == reference))
    }

    async fn all(&self) -> Result<Vec<AttemptRecord>> {
        let records = self.records.read().await;
        Ok(records.clone())
    }
}

/// Keeps issued invoices in memory instead of rendering documents.
#[derive(Default, Clone)]
pub struct InMemoryInvoicer {
    issued: Arc<RwLock<Vec<(InvoiceRequest, Invoice)>>>,
}

impl InMemoryInvoicer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn issued(&self) -> Vec<(InvoiceRequest, Invoice)> {
        self.issued.read().await.clone()
    }

    pub async fn count_for(&self, reference: &str) -> usize {
        self.issued
            .read()
            .await
            .iter()
            .filter(|(request, _)| request.reference == reference)
            .count()
    }
}

#[async_trait]
impl Invoicer for InMemoryInvoicer {
    async fn issue(&self, request: InvoiceRequest) -> Result<Invoice> {
        let invoice_id = invoice_number(Local::now().naive_local(), &mut rand::thread_rng());
        let invoice = Invoice {
            document: format!("memory://{invoice_id}"),
            invoice_id,
        };
        self.issued.write().await.push((request, invoice.clone()));
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::attempt::PaymentAttempt;
    use crate::domain::payment::Contact;

    fn record(reference: &str) -> AttemptRecord {
        AttemptRecord::from_attempt(&PaymentAttempt::new(reference), Amount::from_cents(100), None)
    }

    #[tokio::test]
    async fn test_in_memory_log_keeps_every_attempt() {
        let log = InMemoryTransactionLog::new();
        log.record(record("111111111111")).await.unwrap();
        log.record(record("111111111111")).await.unwrap();
        log.record(record("222222222222")).await.unwrap();

        assert_eq!(log.find_by_reference("111111111111").await.unwrap().len(), 2);
        assert!(log.reference_exists("222222222222").await.unwrap());
        assert!(!log.reference_exists("333333333333").await.unwrap());
        assert_eq!(log.all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let log = InMemoryTransactionLog::new();
        let other = log.clone();
        log.record(record("1")).await.unwrap();
        assert_eq!(other.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_invoicer() {
        let invoicer = InMemoryInvoicer::new();
        let invoice = invoicer
            .issue(InvoiceRequest {
                reference: "123456789012".to_string(),
                customer: Contact::default(),
                items: Vec::new(),
                amount: Amount::from_cents(1000),
            })
            .await
            .unwrap();

        assert!(invoice.invoice_id.starts_with("FAC-"));
        assert_eq!(invoicer.count_for("123456789012").await, 1);
        assert_eq!(invoicer.count_for("999999999999").await, 0);
    }
}
