//! Application layer orchestrating payments.
//!
//! [`payment::PaymentService`] ties the frame codec, the bank transport, the
//! invoicer and the transaction log together. It processes one attempt at a
//! time per call and awaits every port before answering.

pub mod payment;
pub mod reference;
