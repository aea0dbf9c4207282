use super::reference::ReferenceIssuer;
use crate::domain::amount::Amount;
use crate::domain::attempt::PaymentAttempt;
use crate::domain::frame::{DecodedFrame, TransactionFrame, pack, unpack_response};
use crate::domain::payment::{
    AttemptRecord, Contact, FrameDefaults, Invoice, InvoiceRequest, PaymentReceipt, PaymentRequest,
    RelayReply,
};
use crate::domain::ports::{
    BankTransport, BankTransportBox, Invoicer, InvoicerBox, TransactionLog, TransactionLogBox,
};
use crate::domain::status::StatusCode;
use crate::error::{PaymentError, Result};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Drives payments from request to receipt.
///
/// `PaymentService` owns the bank transport, the invoicer and the
/// transaction log. Every attempt that reaches the transport is recorded,
/// whatever its outcome, before the result is returned. A log failure is
/// reported in the tracing output but never hides the bank's answer.
pub struct PaymentService {
    transport: BankTransportBox,
    invoicer: InvoicerBox,
    log: TransactionLogBox,
    defaults: FrameDefaults,
    /// Serializes invoice lookup, invoicing and recording.
    settlement: Mutex<()>,
}

impl PaymentService {
    /// Creates a new `PaymentService`.
    ///
    /// # Arguments
    ///
    /// * `transport` - Delivers frames to the bank.
    /// * `invoicer` - Issues invoices for approved payments.
    /// * `log` - Records every attempt.
    /// * `defaults` - Fixed slot values used when a request omits them.
    pub fn new(
        transport: BankTransportBox,
        invoicer: InvoicerBox,
        log: TransactionLogBox,
        defaults: FrameDefaults,
    ) -> Self {
        Self {
            transport,
            invoicer,
            log,
            defaults,
            settlement: Mutex::new(()),
        }
    }

    pub fn transaction_log(&self) -> &dyn TransactionLog {
        self.log.as_ref()
    }

    /// Sends a storefront payment to the bank and settles the outcome.
    ///
    /// Transport failures come back as errors, never as a rejected receipt.
    /// Within one service, an approval is invoiced at most once per
    /// reference; across processes the bank's `09` is the backstop.
    pub async fn process_payment(&self, request: PaymentRequest) -> Result<PaymentReceipt> {
        let frame = self.build_frame(&request).await?;
        let amount = frame.amount();
        let reference = frame.reference().to_string();
        let customer = request.contact.clone();

        let mut attempt = PaymentAttempt::new(reference.as_str());
        let decoded = self
            .exchange(&mut attempt, &frame, amount, customer.clone())
            .await?;
        let status = decoded.status.clone();

        let _settling = self.settlement.lock().await;
        let prior_invoice = match self.recorded_invoice(&reference).await {
            Ok(invoice) => invoice,
            Err(e) => {
                warn!(reference = %reference, error = %e, "could not look up recorded invoices");
                None
            }
        };
        let mut invoicing_error = None;
        let invoice = match &status {
            StatusCode::Approved => match prior_invoice {
                Some(invoice) => {
                    info!(reference = %reference, invoice = %invoice.invoice_id, "reusing recorded invoice");
                    Some(invoice)
                }
                None => {
                    let invoice_request = InvoiceRequest {
                        reference: reference.clone(),
                        customer: customer.clone().unwrap_or_default(),
                        items: request.cart.clone(),
                        amount,
                    };
                    match self.invoicer.issue(invoice_request).await {
                        Ok(invoice) => Some(invoice),
                        Err(e) => {
                            error!(reference = %reference, error = %e, "invoicing failed after approval");
                            invoicing_error = Some(e);
                            None
                        }
                    }
                }
            },
            StatusCode::Duplicate => prior_invoice,
            _ => None,
        };

        let mut record =
            AttemptRecord::from_attempt(&attempt, amount, customer).with_invoice(invoice.clone());
        if let Some(e) = &invoicing_error {
            record = record.with_error(e);
        }
        if let Err(e) = self.log.record(record).await {
            error!(reference = %reference, status = %status, error = %e, "could not record settled attempt");
        }

        info!(reference = %reference, status = %status, "payment settled");
        Ok(PaymentReceipt {
            success: status.is_approved(),
            status_code: status.code().to_string(),
            message: status.message(),
            outcome: status.outcome(),
            severity: status.severity(),
            reference,
            amount,
            amount_display: amount.display_quetzales(),
            sent_frame: frame.into_string(),
            received_frame: decoded.raw,
            invoice,
        })
    }

    /// Forwards an operator-supplied frame and reports the bank's answer.
    pub async fn relay_frame(&self, raw: &str) -> Result<RelayReply> {
        let frame = TransactionFrame::parse(raw.trim())?;
        let amount = frame.amount();

        let mut attempt = PaymentAttempt::new(frame.reference());
        let decoded = self.exchange(&mut attempt, &frame, amount, None).await?;
        if let Err(e) = self
            .log
            .record(AttemptRecord::from_attempt(&attempt, amount, None))
            .await
        {
            error!(reference = %attempt.reference(), error = %e, "could not record relayed attempt");
        }

        info!(reference = %decoded.reference_number, status = %decoded.status, "frame relayed");
        Ok(RelayReply {
            success: decoded.status.is_approved(),
            message: decoded.status.message(),
            severity: decoded.status.severity(),
            amount_display: decoded.amount.display_quetzales(),
            status: decoded.status,
            reference: decoded.reference_number,
            response_frame: decoded.raw,
        })
    }

    async fn build_frame(&self, request: &PaymentRequest) -> Result<TransactionFrame> {
        if let Some(raw) = &request.frame {
            return TransactionFrame::parse(raw.trim());
        }
        let Some(input) = &request.transaction else {
            return Err(PaymentError::validation(
                "transaction",
                "either a frame or transaction fields are required",
            ));
        };

        let total = request.total.map(Amount::from_decimal).transpose()?;
        let reference = match &input.reference_number {
            Some(reference) => reference.clone(),
            None => ReferenceIssuer::new(self.log.as_ref()).issue().await?,
        };
        pack(&input.resolve(&self.defaults, &reference, total)?)
    }

    /// Walks the attempt through the exchange. Failures are recorded here so
    /// callers only record attempts that got a valid answer.
    async fn exchange(
        &self,
        attempt: &mut PaymentAttempt,
        frame: &TransactionFrame,
        amount: Amount,
        customer: Option<Contact>,
    ) -> Result<DecodedFrame> {
        attempt.frame_built(frame)?;
        attempt.sent()?;
        attempt.awaiting_response()?;

        let failure = match self.transport.exchange(frame.as_str()).await {
            Ok(raw) => match unpack_response(&raw) {
                Ok(decoded) => {
                    attempt.responded(&raw, decoded.status.clone())?;
                    return Ok(decoded);
                }
                Err(e) => {
                    attempt.transport_failed(Some(&raw))?;
                    e
                }
            },
            Err(e @ PaymentError::TransportTimeout { .. }) => {
                attempt.timed_out()?;
                e
            }
            Err(e) => {
                attempt.transport_failed(None)?;
                e
            }
        };

        warn!(reference = %attempt.reference(), state = attempt.state().label(), error = %failure, "bank exchange failed");
        let record = AttemptRecord::from_attempt(attempt, amount, customer).with_error(&failure);
        if let Err(e) = self.log.record(record).await {
            error!(reference = %attempt.reference(), error = %e, "could not record failed attempt");
        }
        Err(failure)
    }

    async fn recorded_invoice(&self, reference: &str) -> Result<Option<Invoice>> {
        Ok(self
            .log
            .find_by_reference(reference)
            .await?
            .into_iter()
            .rev()
            .find_map(|record| record.invoice))
    }
}
