//! Fixed-width 63-digit transaction frames.
//!
//! Both directions use the same offset table:
//!
//! ```text
//! offset  0 timestamp        14  YYYYMMDDHHmmss (UTC)
//! offset 14 transactionType   2
//! offset 16 terminalChannel   2
//! offset 18 companyId         4
//! offset 22 branchId          2
//! offset 24 clientCode       11
//! offset 35 currencyType      2
//! offset 37 amountInteger    10  whole units
//! offset 47 amountDecimal     2  cents
//! offset 49 referenceNumber  12
//! offset 61 status            2  always 00 outbound
//! ```

use super::amount::Amount;
use super::status::StatusCode;
use crate::error::{PaymentError, Result};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

pub const FRAME_LEN: usize = 63;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    TransactionType,
    TerminalChannel,
    CompanyId,
    BranchId,
    ClientCode,
    CurrencyType,
    AmountInteger,
    AmountDecimal,
    ReferenceNumber,
    Status,
}

impl Field {
    /// Wire order.
    pub const ALL: [Field; 11] = [
        Field::Timestamp,
        Field::TransactionType,
        Field::TerminalChannel,
        Field::CompanyId,
        Field::BranchId,
        Field::ClientCode,
        Field::CurrencyType,
        Field::AmountInteger,
        Field::AmountDecimal,
        Field::ReferenceNumber,
        Field::Status,
    ];

    pub const fn width(self) -> usize {
        match self {
            Field::Timestamp => 14,
            Field::TransactionType => 2,
            Field::TerminalChannel => 2,
            Field::CompanyId => 4,
            Field::BranchId => 2,
            Field::ClientCode => 11,
            Field::CurrencyType => 2,
            Field::AmountInteger => 10,
            Field::AmountDecimal => 2,
            Field::ReferenceNumber => 12,
            Field::Status => 2,
        }
    }

    pub const fn offset(self) -> usize {
        match self {
            Field::Timestamp => 0,
            Field::TransactionType => 14,
            Field::TerminalChannel => 16,
            Field::CompanyId => 18,
            Field::BranchId => 22,
            Field::ClientCode => 24,
            Field::CurrencyType => 35,
            Field::AmountInteger => 37,
            Field::AmountDecimal => 47,
            Field::ReferenceNumber => 49,
            Field::Status => 61,
        }
    }

    pub const fn range(self) -> Range<usize> {
        self.offset()..self.offset() + self.width()
    }

    /// Name used in validation errors and JSON payloads.
    pub const fn name(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::TransactionType => "transactionType",
            Field::TerminalChannel => "terminalChannel",
            Field::CompanyId => "companyId",
            Field::BranchId => "branchId",
            Field::ClientCode => "clientCode",
            Field::CurrencyType => "currencyType",
            Field::AmountInteger => "amountInteger",
            Field::AmountDecimal => "amountDecimal",
            Field::ReferenceNumber => "referenceNumber",
            Field::Status => "status",
        }
    }
}

/// Resolved outbound fields. Every value is a string of decimal digits no
/// wider than its slot; [`pack`] enforces both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFields {
    pub transaction_type: String,
    pub terminal_channel: String,
    pub company_id: String,
    pub branch_id: String,
    pub client_code: String,
    pub currency_type: String,
    pub amount_integer: String,
    pub amount_decimal: String,
    pub reference_number: String,
}

impl TransactionFields {
    /// Replaces both amount slots from an exact amount.
    pub fn set_amount(&mut self, amount: Amount) {
        self.amount_integer = amount.integer_part().to_string();
        self.amount_decimal = format!("{:02}", amount.decimal_part());
    }

    fn value(&self, field: Field) -> Option<&str> {
        match field {
            Field::TransactionType => Some(self.transaction_type.as_str()),
            Field::TerminalChannel => Some(self.terminal_channel.as_str()),
            Field::CompanyId => Some(self.company_id.as_str()),
            Field::BranchId => Some(self.branch_id.as_str()),
            Field::ClientCode => Some(self.client_code.as_str()),
            Field::CurrencyType => Some(self.currency_type.as_str()),
            Field::AmountInteger => Some(self.amount_integer.as_str()),
            Field::AmountDecimal => Some(self.amount_decimal.as_str()),
            Field::ReferenceNumber => Some(self.reference_number.as_str()),
            Field::Timestamp | Field::Status => None,
        }
    }
}

/// A packed outbound frame. Only [`pack`] and [`TransactionFrame::parse`]
/// construct it, so it always holds 63 digits ending in `00`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionFrame(String);

impl TransactionFrame {
    /// Accepts a frame built elsewhere (storefront, operator console).
    pub fn parse(raw: &str) -> Result<Self> {
        validate_outbound(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn slice(&self, field: Field) -> &str {
        &self.0[field.range()]
    }

    pub fn reference(&self) -> &str {
        self.slice(Field::ReferenceNumber)
    }

    pub fn amount(&self) -> Amount {
        // Digits only, checked at construction.
        Amount::from_cents(
            self.0[Field::AmountInteger.offset()..Field::AmountDecimal.range().end]
                .parse()
                .unwrap_or_default(),
        )
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TransactionFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed frame, usually the bank's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedFrame {
    pub timestamp: String,
    pub transaction_type: u8,
    pub terminal_channel: u8,
    pub company_id: u16,
    pub branch_id: u16,
    pub client_code: u64,
    pub currency_type: u8,
    pub amount: Amount,
    pub reference_number: String,
    pub status: StatusCode,
    pub raw: String,
}

impl DecodedFrame {
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

pub fn is_frame_shaped(raw: &str) -> bool {
    raw.len() == FRAME_LEN && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Precondition for anything about to go on the wire.
pub fn ensure_frame_shape(raw: &str) -> Result<()> {
    if is_frame_shaped(raw) {
        Ok(())
    } else {
        Err(PaymentError::validation(
            "frame",
            format!(
                "expected exactly {FRAME_LEN} digits, got {} characters",
                raw.chars().count()
            ),
        ))
    }
}

/// Checks a raw outbound frame: 63 digits with a pending status.
pub fn validate_outbound(raw: &str) -> Result<()> {
    ensure_frame_shape(raw)?;
    let status = &raw[Field::Status.range()];
    if status != StatusCode::Pending.code() {
        return Err(PaymentError::validation(
            Field::Status.name(),
            format!("outbound frames must carry status 00, found {status}"),
        ));
    }
    Ok(())
}

/// Packs the fields with the current UTC time as timestamp.
pub fn pack(fields: &TransactionFields) -> Result<TransactionFrame> {
    pack_at(fields, Utc::now().naive_utc())
}

pub fn pack_at(fields: &TransactionFields, timestamp: NaiveDateTime) -> Result<TransactionFrame> {
    let mut frame = String::with_capacity(FRAME_LEN);
    frame.push_str(&timestamp.format(TIMESTAMP_FORMAT).to_string());

    for field in Field::ALL {
        let Some(value) = fields.value(field) else {
            continue;
        };
        frame.push_str(&pad_field(field, value)?);
    }
    frame.push_str(StatusCode::Pending.code());

    if !is_frame_shaped(&frame) {
        return Err(PaymentError::FrameIntegrity(format!(
            "packed frame has {} characters: {frame}",
            frame.len()
        )));
    }
    Ok(TransactionFrame(frame))
}

fn pad_field(field: Field, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PaymentError::validation(field.name(), "must not be empty"));
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PaymentError::validation(
            field.name(),
            format!("`{value}` must contain only digits"),
        ));
    }
    let width = field.width();
    if value.len() > width {
        return Err(PaymentError::validation(
            field.name(),
            format!("`{value}` exceeds {width} digits"),
        ));
    }
    Ok(format!("{value:0>width$}"))
}

pub fn unpack(raw: &str) -> Result<DecodedFrame> {
    if raw.len() != FRAME_LEN {
        return Err(PaymentError::MalformedFrame(format!(
            "expected {FRAME_LEN} characters, got {}",
            raw.len()
        )));
    }
    if let Some(pos) = raw.bytes().position(|b| !b.is_ascii_digit()) {
        return Err(PaymentError::MalformedFrame(format!(
            "non-digit character at position {pos}"
        )));
    }

    let amount = Amount::from_parts(
        field_number(raw, Field::AmountInteger)?,
        field_number(raw, Field::AmountDecimal)?,
    )
    .map_err(|e| PaymentError::MalformedFrame(e.to_string()))?;

    Ok(DecodedFrame {
        timestamp: field_str(raw, Field::Timestamp).to_string(),
        transaction_type: field_number(raw, Field::TransactionType)? as u8,
        terminal_channel: field_number(raw, Field::TerminalChannel)? as u8,
        company_id: field_number(raw, Field::CompanyId)? as u16,
        branch_id: field_number(raw, Field::BranchId)? as u16,
        client_code: field_number(raw, Field::ClientCode)?,
        currency_type: field_number(raw, Field::CurrencyType)? as u8,
        amount,
        reference_number: field_str(raw, Field::ReferenceNumber).to_string(),
        status: StatusCode::from_code(field_str(raw, Field::Status)),
        raw: raw.to_string(),
    })
}

/// Unpacks a frame received from the bank. `00` only ever travels outbound,
/// so a reply carrying it (e.g. an echoed request) is not an answer.
pub fn unpack_response(raw: &str) -> Result<DecodedFrame> {
    let decoded = unpack(raw)?;
    if decoded.status == StatusCode::Pending {
        return Err(PaymentError::MalformedFrame(format!(
            "response for {} carries request-only status 00",
            decoded.reference_number
        )));
    }
    Ok(decoded)
}

fn field_str(raw: &str, field: Field) -> &str {
    &raw[field.range()]
}

// Every slot is at most 14 digits wide, so it fits a u64.
fn field_number(raw: &str, field: Field) -> Result<u64> {
    field_str(raw, field)
        .parse()
        .map_err(|e| PaymentError::MalformedFrame(format!("{}: {e}", field.name())))
}
