use crate::domain::amount::Amount;
use crate::domain::payment::{CartItem, Contact, Invoice, InvoiceRequest};
use crate::domain::ports::Invoicer;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// `FAC-YYYYMMDD-HHMMSS-XXXXXX`, the suffix being 6 uppercase alphanumerics.
pub fn invoice_number<R: Rng>(at: NaiveDateTime, rng: &mut R) -> String {
    let suffix: String = (0..6)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
        .collect();
    format!("FAC-{}-{suffix}", at.format("%Y%m%d-%H%M%S"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceDocument<'a> {
    invoice_id: &'a str,
    reference: &'a str,
    issued_at: String,
    customer_name: String,
    customer: &'a Contact,
    items: &'a [CartItem],
    total: Amount,
}

/// Writes one JSON document per invoice into a directory.
///
/// Rendering (PDF) and delivery (email) belong to the storefront; this
/// adapter only records what was billed.
#[derive(Debug, Clone)]
pub struct FileInvoicer {
    dir: PathBuf,
}

impl FileInvoicer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Invoicer for FileInvoicer {
    async fn issue(&self, request: InvoiceRequest) -> Result<Invoice> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let now = Local::now().naive_local();
        let invoice_id = invoice_number(now, &mut rand::thread_rng());
        let path = self.dir.join(format!("{invoice_id}.json"));
        let document = InvoiceDocument {
            invoice_id: &invoice_id,
            reference: &request.reference,
            issued_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            customer_name: request.customer.full_name(),
            customer: &request.customer,
            items: &request.items,
            total: request.amount,
        };
        let body = serde_json::to_vec_pretty(&document)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| PaymentError::Invoicing(format!("{}: {e}", path.display())))?;

        info!(invoice = %invoice_id, reference = %request.reference, "invoice issued");
        Ok(Invoice {
            invoice_id,
            document: path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_invoice_number_format() {
        let at = NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(9, 3, 7)
            .unwrap();
        let number = invoice_number(at, &mut StdRng::seed_from_u64(7));

        assert!(number.starts_with("FAC-20250514-090307-"));
        let suffix = &number["FAC-20250514-090307-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_file_invoicer_writes_document() {
        let dir = tempdir().unwrap();
        let invoicer = FileInvoicer::new(dir.path().join("invoices"));

        let invoice = invoicer
            .issue(InvoiceRequest {
                reference: "123456789012".to_string(),
                customer: Contact {
                    first_name: Some("Ana".to_string()),
                    ..Default::default()
                },
                items: vec![CartItem {
                    name: "Serum".to_string(),
                    quantity: 1,
                    unit_price: dec!(99.90),
                }],
                amount: Amount::from_cents(9990),
            })
            .await
            .unwrap();

        let body = std::fs::read_to_string(&invoice.document).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["invoiceId"], invoice.invoice_id);
        assert_eq!(json["reference"], "123456789012");
        assert_eq!(json["customerName"], "Ana");
        assert_eq!(json["total"], "99.90");
    }
}
