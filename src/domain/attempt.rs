use super::frame::TransactionFrame;
use super::status::StatusCode;
use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};

/// Lifecycle of a single payment attempt.
///
/// `TimedOut` and `TransportFailed` mean the outcome at the bank is unknown;
/// `Responded` means the bank answered, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptState {
    Initiated,
    FrameBuilt,
    Sent,
    AwaitingResponse,
    Responded(StatusCode),
    TimedOut,
    TransportFailed,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Responded(_) | Self::TimedOut | Self::TransportFailed
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Initiated => "INITIATED",
            Self::FrameBuilt => "FRAME_BUILT",
            Self::Sent => "SENT",
            Self::AwaitingResponse => "AWAITING_RESPONSE",
            Self::Responded(_) => "RESPONDED",
            Self::TimedOut => "TIMED_OUT",
            Self::TransportFailed => "TRANSPORT_FAILED",
        }
    }
}

/// Tracks one exchange with the bank and keeps the raw frames for the
/// transaction log.
#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    reference: String,
    state: AttemptState,
    sent_frame: Option<String>,
    received_frame: Option<String>,
}

impl PaymentAttempt {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            state: AttemptState::Initiated,
            sent_frame: None,
            received_frame: None,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn sent_frame(&self) -> Option<&str> {
        self.sent_frame.as_deref()
    }

    pub fn received_frame(&self) -> Option<&str> {
        self.received_frame.as_deref()
    }

    pub fn frame_built(&mut self, frame: &TransactionFrame) -> Result<()> {
        self.guard(&[AttemptState::Initiated], "FRAME_BUILT")?;
        self.sent_frame = Some(frame.as_str().to_string());
        self.state = AttemptState::FrameBuilt;
        Ok(())
    }

    pub fn sent(&mut self) -> Result<()> {
        self.guard(&[AttemptState::FrameBuilt], "SENT")?;
        self.state = AttemptState::Sent;
        Ok(())
    }

    pub fn awaiting_response(&mut self) -> Result<()> {
        self.guard(&[AttemptState::Sent], "AWAITING_RESPONSE")?;
        self.state = AttemptState::AwaitingResponse;
        Ok(())
    }

    pub fn responded(&mut self, raw: &str, status: StatusCode) -> Result<()> {
        self.guard(
            &[AttemptState::Sent, AttemptState::AwaitingResponse],
            "RESPONDED",
        )?;
        self.received_frame = Some(raw.to_string());
        self.state = AttemptState::Responded(status);
        Ok(())
    }

    pub fn timed_out(&mut self) -> Result<()> {
        self.guard(
            &[AttemptState::Sent, AttemptState::AwaitingResponse],
            "TIMED_OUT",
        )?;
        self.state = AttemptState::TimedOut;
        Ok(())
    }

    /// `received` keeps whatever came back when it could not be decoded.
    pub fn transport_failed(&mut self, received: Option<&str>) -> Result<()> {
        self.guard(
            &[
                AttemptState::FrameBuilt,
                AttemptState::Sent,
                AttemptState::AwaitingResponse,
            ],
            "TRANSPORT_FAILED",
        )?;
        self.received_frame = received.map(str::to_string);
        self.state = AttemptState::TransportFailed;
        Ok(())
    }

    fn guard(&self, allowed: &[AttemptState], target: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PaymentError::InvalidState(format!(
                "attempt {} cannot move from {} to {target}",
                self.reference,
                self.state.label()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::{TransactionFields, pack};

    fn frame() -> TransactionFrame {
        pack(&TransactionFields {
            transaction_type: "01".to_string(),
            terminal_channel: "04".to_string(),
            company_id: "1".to_string(),
            branch_id: "1".to_string(),
            client_code: "42".to_string(),
            currency_type: "01".to_string(),
            amount_integer: "10".to_string(),
            amount_decimal: "00".to_string(),
            reference_number: "123456789012".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_happy_path() {
        let mut attempt = PaymentAttempt::new("123456789012");
        assert_eq!(attempt.state(), &AttemptState::Initiated);

        attempt.frame_built(&frame()).unwrap();
        attempt.sent().unwrap();
        attempt.awaiting_response().unwrap();
        attempt.responded("reply", StatusCode::Approved).unwrap();

        assert_eq!(attempt.state(), &AttemptState::Responded(StatusCode::Approved));
        assert!(attempt.state().is_terminal());
        assert_eq!(attempt.sent_frame().map(str::len), Some(63));
        assert_eq!(attempt.received_frame(), Some("reply"));
    }

    #[test]
    fn test_cannot_send_before_building() {
        let mut attempt = PaymentAttempt::new("1");
        assert!(matches!(attempt.sent(), Err(PaymentError::InvalidState(_))));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut attempt = PaymentAttempt::new("1");
        attempt.frame_built(&frame()).unwrap();
        attempt.sent().unwrap();
        attempt.timed_out().unwrap();

        assert_eq!(attempt.state(), &AttemptState::TimedOut);
        assert!(attempt.responded("late", StatusCode::Approved).is_err());
        assert!(attempt.transport_failed(None).is_err());
    }

    #[test]
    fn test_timeout_is_distinct_from_rejection() {
        let mut rejected = PaymentAttempt::new("1");
        rejected.frame_built(&frame()).unwrap();
        rejected.sent().unwrap();
        rejected.responded("r", StatusCode::Rejected).unwrap();

        let mut timed_out = PaymentAttempt::new("1");
        timed_out.frame_built(&frame()).unwrap();
        timed_out.sent().unwrap();
        timed_out.timed_out().unwrap();

        assert_ne!(rejected.state(), timed_out.state());
        assert_eq!(rejected.state().label(), "RESPONDED");
        assert_eq!(timed_out.state().label(), "TIMED_OUT");
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&AttemptState::Responded(StatusCode::Duplicate)).unwrap();
        assert_eq!(json, r#"{"state":"RESPONDED","status":"09"}"#);
        let json = serde_json::to_string(&AttemptState::TimedOut).unwrap();
        assert_eq!(json, r#"{"state":"TIMED_OUT"}"#);
    }
}
