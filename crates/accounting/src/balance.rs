//! Double-entry balance validation.
//!
//! Balancing is checked at the journal level: the split of entries into
//! lines is presentational, so a journal may carry an all-debit line and an
//! all-credit line as long as the totals agree.

use rust_decimal::Decimal;
use serde::Serialize;

use ledgerpost_core::{LedgerError, LedgerResult};

use crate::journal::{DebitCreditType, Journal, JournalDebitCreditDetail};

/// Debit and credit sums of one journal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceTotals {
    pub debit_total: Decimal,
    pub credit_total: Decimal,
}

impl BalanceTotals {
    /// Exact decimal equality, no rounding tolerance.
    pub fn is_balanced(&self) -> bool {
        self.debit_total == self.credit_total
    }
}

/// Side sums of a journal. Saturates at the decimal range; [`Journal::new`]
/// rejects journals whose sums would overflow, so built journals never hit it.
pub fn totals(journal: &Journal) -> BalanceTotals {
    let mut debit_total = Decimal::ZERO;
    let mut credit_total = Decimal::ZERO;

    for entry in journal.entries() {
        match entry.debit_credit_type() {
            DebitCreditType::Debit => {
                debit_total = debit_total.saturating_add(entry.amount().value())
            }
            DebitCreditType::Credit => {
                credit_total = credit_total.saturating_add(entry.amount().value())
            }
        }
    }

    BalanceTotals {
        debit_total,
        credit_total,
    }
}

/// `None` when either side's sum leaves the decimal range.
pub(crate) fn checked_totals<'a>(
    entries: impl IntoIterator<Item = &'a JournalDebitCreditDetail>,
) -> Option<BalanceTotals> {
    let mut debit_total = Decimal::ZERO;
    let mut credit_total = Decimal::ZERO;

    for entry in entries {
        let sum = match entry.debit_credit_type() {
            DebitCreditType::Debit => &mut debit_total,
            DebitCreditType::Credit => &mut credit_total,
        };
        *sum = sum.checked_add(entry.amount().value())?;
    }

    Some(BalanceTotals {
        debit_total,
        credit_total,
    })
}

/// The single gate every journal passes before it is handed to the repository.
pub fn validate(journal: &Journal) -> LedgerResult<()> {
    let totals = checked_totals(journal.entries())
        .ok_or_else(|| LedgerError::validation(TOTAL_OVERFLOW))?;
    if !totals.is_balanced() {
        return Err(LedgerError::unbalanced(
            totals.debit_total,
            totals.credit_total,
        ));
    }
    Ok(())
}

pub(crate) const TOTAL_OVERFLOW: &str = "debit/credit total overflows";
