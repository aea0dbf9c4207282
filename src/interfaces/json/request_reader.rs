use crate::domain::payment::{PaymentRequest, TransactionInput};
use crate::error::Result;
use serde::de::DeserializeOwned;
use std::io::Read;

/// Reads storefront JSON documents from any `Read` source (e.g., File, Stdin).
///
/// Accepts both the English keys and the storefront's Spanish ones
/// (`trama`, `montoTotal`, `datosContacto`, `carrito`).
pub struct RequestReader<R: Read> {
    source: R,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn payment_request(self) -> Result<PaymentRequest> {
        self.read()
    }

    /// Bare transaction fields, as used by `encode`.
    pub fn transaction_input(self) -> Result<TransactionInput> {
        self.read()
    }

    fn read<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_reader(self.source)?)
    }
}
