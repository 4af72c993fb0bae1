//! `ledgerpost-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the ledger error taxonomy, voucher identifiers and monetary amounts.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use id::VoucherNumber;
pub use value_object::Amount;
