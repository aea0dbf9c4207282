use super::amount::Amount;
use super::attempt::{AttemptState, PaymentAttempt};
use super::frame::TransactionFields;
use super::status::{Outcome, Severity, StatusCode};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Values used for the fixed slots when a request leaves them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameDefaults {
    pub transaction_type: String,
    pub terminal_channel: String,
    pub company_id: String,
    pub branch_id: String,
    pub currency_type: String,
}

impl Default for FrameDefaults {
    fn default() -> Self {
        Self {
            transaction_type: "01".to_string(),
            terminal_channel: "04".to_string(),
            company_id: "0001".to_string(),
            branch_id: "01".to_string(),
            currency_type: "01".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DigitsOrNumber {
    Text(String),
    Number(u64),
}

fn digits<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(
        Option::<DigitsOrNumber>::deserialize(deserializer)?.map(|value| match value {
            DigitsOrNumber::Text(text) => text,
            DigitsOrNumber::Number(number) => number.to_string(),
        }),
    )
}

/// Transaction fields as they arrive from the storefront. Each value may be a
/// JSON string or an unsigned number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    #[serde(default, deserialize_with = "digits")]
    pub transaction_type: Option<String>,
    #[serde(default, deserialize_with = "digits")]
    pub terminal_channel: Option<String>,
    #[serde(default, deserialize_with = "digits")]
    pub company_id: Option<String>,
    #[serde(default, deserialize_with = "digits")]
    pub branch_id: Option<String>,
    #[serde(default, deserialize_with = "digits")]
    pub client_code: Option<String>,
    #[serde(default, deserialize_with = "digits")]
    pub currency_type: Option<String>,
    #[serde(default, deserialize_with = "digits")]
    pub amount_integer: Option<String>,
    #[serde(default, deserialize_with = "digits")]
    pub amount_decimal: Option<String>,
    #[serde(default, deserialize_with = "digits")]
    pub reference_number: Option<String>,
}

impl TransactionInput {
    /// Fills the gaps from `defaults`. The amount comes from the explicit
    /// amount fields when present, otherwise from `total`.
    pub fn resolve(
        &self,
        defaults: &FrameDefaults,
        reference: &str,
        total: Option<Amount>,
    ) -> Result<TransactionFields> {
        let pick = |value: &Option<String>, default: &str| {
            value.clone().unwrap_or_else(|| default.to_string())
        };
        let client_code = self
            .client_code
            .clone()
            .ok_or_else(|| PaymentError::validation("clientCode", "is required"))?;

        let mut fields = TransactionFields {
            transaction_type: pick(&self.transaction_type, &defaults.transaction_type),
            terminal_channel: pick(&self.terminal_channel, &defaults.terminal_channel),
            company_id: pick(&self.company_id, &defaults.company_id),
            branch_id: pick(&self.branch_id, &defaults.branch_id),
            client_code,
            currency_type: pick(&self.currency_type, &defaults.currency_type),
            amount_integer: String::new(),
            amount_decimal: String::new(),
            reference_number: reference.to_string(),
        };

        match (&self.amount_integer, total) {
            (Some(integer), _) => {
                fields.amount_integer = integer.clone();
                fields.amount_decimal = pick(&self.amount_decimal, "00");
            }
            (None, Some(total)) => fields.set_amount(total),
            (None, None) => {
                return Err(PaymentError::validation(
                    "amountInteger",
                    "is required when no total is given",
                ));
            }
        }
        Ok(fields)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, alias = "nombre")]
    pub first_name: Option<String>,
    #[serde(default, alias = "apellido")]
    pub last_name: Option<String>,
    #[serde(default, alias = "correo")]
    pub email: Option<String>,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default, alias = "direccion")]
    pub address: Option<String>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let name = name.trim();
        if name.is_empty() {
            "N/A".to_string()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "cantidad")]
    pub quantity: u32,
    #[serde(alias = "precio")]
    pub unit_price: Decimal,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A payment as submitted by the storefront: either structured fields or a
/// ready-made frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(default, alias = "trama")]
    pub frame: Option<String>,
    #[serde(default)]
    pub transaction: Option<TransactionInput>,
    #[serde(default, alias = "montoTotal")]
    pub total: Option<Decimal>,
    #[serde(default, alias = "datosContacto")]
    pub contact: Option<Contact>,
    #[serde(default, alias = "carrito")]
    pub cart: Vec<CartItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub reference: String,
    pub customer: Contact,
    pub items: Vec<CartItem>,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_id: String,
    /// Where the rendered document lives.
    pub document: String,
}

/// One row of the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub reference: String,
    pub recorded_at: DateTime<Utc>,
    pub state: AttemptState,
    pub status_description: String,
    pub sent_frame: Option<String>,
    pub received_frame: Option<String>,
    pub amount: Amount,
    pub customer: Option<Contact>,
    pub invoice: Option<Invoice>,
    pub error: Option<String>,
}

impl AttemptRecord {
    pub fn from_attempt(attempt: &PaymentAttempt, amount: Amount, customer: Option<Contact>) -> Self {
        let state = attempt.state().clone();
        let status_description = match &state {
            AttemptState::Responded(status) => status.description().to_string(),
            AttemptState::TimedOut => "No response from bank".to_string(),
            AttemptState::TransportFailed => "Bank communication failed".to_string(),
            other => other.label().to_string(),
        };
        Self {
            reference: attempt.reference().to_string(),
            recorded_at: Utc::now(),
            state,
            status_description,
            sent_frame: attempt.sent_frame().map(str::to_string),
            received_frame: attempt.received_frame().map(str::to_string),
            amount,
            customer,
            invoice: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: &PaymentError) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_invoice(mut self, invoice: Option<Invoice>) -> Self {
        self.invoice = invoice;
        self
    }

    pub fn status(&self) -> Option<&StatusCode> {
        match &self.state {
            AttemptState::Responded(status) => Some(status),
            _ => None,
        }
    }
}

/// What the payment endpoint hands back to the storefront. The Spanish keys
/// are the ones the storefront's checkout script reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    #[serde(rename = "exitoso")]
    pub success: bool,
    #[serde(rename = "codigoEstado")]
    pub status_code: String,
    #[serde(rename = "mensaje")]
    pub message: String,
    pub outcome: Outcome,
    pub severity: Severity,
    pub reference: String,
    pub amount: Amount,
    pub amount_display: String,
    #[serde(rename = "tramaEnviada")]
    pub sent_frame: String,
    #[serde(rename = "tramaRespuesta")]
    pub received_frame: String,
    pub invoice: Option<Invoice>,
}

/// Reply for a frame relayed from the operator console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReply {
    pub success: bool,
    pub status: StatusCode,
    pub message: String,
    pub severity: Severity,
    pub amount_display: String,
    pub reference: String,
    pub response_frame: String,
}
