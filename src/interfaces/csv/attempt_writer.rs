use crate::domain::payment::AttemptRecord;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct AttemptRow<'a> {
    reference: &'a str,
    recorded_at: String,
    state: &'static str,
    status: &'a str,
    description: &'a str,
    amount: String,
    customer: String,
    invoice: &'a str,
    sent_frame: &'a str,
    received_frame: &'a str,
    error: &'a str,
}

impl<'a> From<&'a AttemptRecord> for AttemptRow<'a> {
    fn from(record: &'a AttemptRecord) -> Self {
        Self {
            reference: &record.reference,
            recorded_at: record.recorded_at.to_rfc3339(),
            state: record.state.label(),
            status: record.status().map(|s| s.code()).unwrap_or_default(),
            description: &record.status_description,
            amount: record.amount.to_string(),
            customer: record
                .customer
                .as_ref()
                .map(|c| c.full_name())
                .unwrap_or_default(),
            invoice: record
                .invoice
                .as_ref()
                .map(|i| i.invoice_id.as_str())
                .unwrap_or_default(),
            sent_frame: record.sent_frame.as_deref().unwrap_or_default(),
            received_frame: record.received_frame.as_deref().unwrap_or_default(),
            error: record.error.as_deref().unwrap_or_default(),
        }
    }
}

/// Writes the transaction log as CSV, one row per attempt.
pub struct AttemptWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AttemptWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_records<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a AttemptRecord>,
    ) -> Result<()> {
        for record in records {
            self.writer.serialize(AttemptRow::from(record))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::attempt::PaymentAttempt;
    use crate::domain::frame::TransactionFrame;
    use crate::domain::payment::{Contact, Invoice};
    use crate::domain::status::StatusCode;

    #[test]
    fn test_writer_flattens_records() {
        let raw = "202505140930150104000101019902314950100000010000012345678901200";
        let mut attempt = PaymentAttempt::new("123456789012");
        attempt.frame_built(&TransactionFrame::parse(raw).unwrap()).unwrap();
        attempt.sent().unwrap();
        attempt.responded("reply", StatusCode::Approved).unwrap();

        let record = AttemptRecord::from_attempt(
            &attempt,
            Amount::from_cents(100_000),
            Some(Contact {
                first_name: Some("Ana".to_string()),
                last_name: Some("Lopez".to_string()),
                ..Default::default()
            }),
        )
        .with_invoice(Some(Invoice {
            invoice_id: "FAC-20250514-093015-ABC123".to_string(),
            document: "memory://FAC-20250514-093015-ABC123".to_string(),
        }));

        let mut out = Vec::new();
        AttemptWriter::new(&mut out).write_records([&record]).unwrap();
        let csv = String::from_utf8(out).unwrap();

        assert!(csv.starts_with(
            "reference,recorded_at,state,status,description,amount,customer,invoice,sent_frame,received_frame,error\n"
        ));
        assert!(csv.contains("123456789012,"));
        assert!(csv.contains(",RESPONDED,01,Approved,1000.00,Ana Lopez,FAC-20250514-093015-ABC123,"));
        assert!(csv.contains(raw));
    }

    #[test]
    fn test_writer_empty_log() {
        let mut out = Vec::new();
        AttemptWriter::new(&mut out).write_records([]).unwrap();
        assert!(out.is_empty());
    }
}
