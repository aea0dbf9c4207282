//! Adapters for the domain ports: TCP transport to the bank, invoicers and
//! transaction logs.

pub mod in_memory;
pub mod invoice;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod tcp;
