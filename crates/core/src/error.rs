//! Ledger error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Every business-rule violation is surfaced through this one type and is
/// detected before any write reaches the repository. None of these are
/// transient: callers must not retry them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The voucher number does not resolve to a persisted journal.
    #[error("journal not found: {voucher_number}")]
    NotFound { voucher_number: String },

    /// Debit and credit totals differ.
    #[error("debits must equal credits (debit total: {debit_total}, credit total: {credit_total})")]
    Unbalanced {
        debit_total: Decimal,
        credit_total: Decimal,
    },

    /// The journal has already been reversed by a red slip (or is a red slip itself).
    #[error("journal {voucher_number} is already cancelled")]
    AlreadyCancelled { voucher_number: String },

    /// The journal has already been superseded by a black slip.
    #[error("journal {voucher_number} is already corrected by {black_slip}")]
    AlreadyCorrected {
        voucher_number: String,
        black_slip: String,
    },

    /// Replacement data for a correction is structurally invalid or unbalanced.
    #[error("invalid correction: {0}")]
    InvalidCorrection(String),

    /// A value failed structural validation (e.g. missing lines, non-positive amount).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A debit/credit label from a command did not map to a side.
    #[error("unknown debit/credit type: {0}")]
    UnknownDebitCreditType(String),

    /// Any other command label (voucher type, tax type, ...) that did not map.
    #[error("unknown {field}: {value}")]
    UnknownLabel { field: &'static str, value: String },

    /// Uniqueness violation reported by the repository (e.g. duplicate voucher number).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The persistence adapter failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Coarse classification of [`LedgerError`] for callers that render errors
/// (e.g. an HTTP layer).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Balance,
    AlreadyCancelled,
    InvalidCorrection,
    Validation,
    Conflict,
    Storage,
}

impl ErrorKind {
    /// Suggested HTTP status code for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Balance | ErrorKind::InvalidCorrection | ErrorKind::Validation => 400,
            ErrorKind::AlreadyCancelled | ErrorKind::Conflict => 409,
            ErrorKind::Storage => 500,
        }
    }
}

impl LedgerError {
    pub fn not_found(voucher_number: impl Into<String>) -> Self {
        Self::NotFound {
            voucher_number: voucher_number.into(),
        }
    }

    pub fn unbalanced(debit_total: Decimal, credit_total: Decimal) -> Self {
        Self::Unbalanced {
            debit_total,
            credit_total,
        }
    }

    pub fn already_cancelled(voucher_number: impl Into<String>) -> Self {
        Self::AlreadyCancelled {
            voucher_number: voucher_number.into(),
        }
    }

    pub fn already_corrected(
        voucher_number: impl Into<String>,
        black_slip: impl Into<String>,
    ) -> Self {
        Self::AlreadyCorrected {
            voucher_number: voucher_number.into(),
            black_slip: black_slip.into(),
        }
    }

    pub fn invalid_correction(msg: impl Into<String>) -> Self {
        Self::InvalidCorrection(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_label(field: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownLabel {
            field,
            value: value.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::Unbalanced { .. } => ErrorKind::Balance,
            LedgerError::AlreadyCancelled { .. } | LedgerError::AlreadyCorrected { .. } => {
                ErrorKind::AlreadyCancelled
            }
            LedgerError::InvalidCorrection(_) => ErrorKind::InvalidCorrection,
            LedgerError::Validation(_)
            | LedgerError::UnknownDebitCreditType(_)
            | LedgerError::UnknownLabel { .. } => ErrorKind::Validation,
            LedgerError::Conflict(_) => ErrorKind::Conflict,
            LedgerError::Storage(_) => ErrorKind::Storage,
        }
    }
}
