//! Bank protocol types: the 63-digit frame codec, the status table, exact
//! amounts, the attempt state machine and the ports to the collaborators.

pub mod amount;
pub mod attempt;
pub mod frame;
pub mod payment;
pub mod ports;
pub mod status;
