//! Accounting module (double-entry journals, red/black slip corrections).
//!
//! Domain logic and services over persistence ports. No IO beyond what the
//! injected [`TransactionManager`] performs.

pub mod balance;
pub mod command;
pub mod config;
pub mod correction;
pub mod import;
pub mod journal;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;

pub use balance::BalanceTotals;
pub use command::{
    CorrectionResult, CreateJournalCommand, DebitCreditCommand, DebitCreditDetailResponse,
    JournalDetailCommand, JournalDetailResponse, JournalResponse,
};
pub use config::{JournalConfig, ReversalDating};
pub use correction::{CorrectionEngine, JournalStatus};
pub use import::{ImportError, ImportOptions, ImportReport};
pub use journal::{
    DebitCreditType, Journal, JournalDebitCreditDetail, JournalDetail, JournalFlags,
    TaxCalculationType, TaxType, VoucherType,
};
pub use repository::{JournalRepository, TransactionManager};
pub use service::JournalService;
