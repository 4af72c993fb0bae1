//! Red-black correction engine.
//!
//! Posted journals are never edited. A cancellation posts a red slip (the
//! original with every debit/credit flipped); a correction posts the red slip
//! followed by a black slip carrying the corrected data.
//!
//! ```text
//!            cancel_journal
//!   Active ─────────────────▶ Cancelled   (red slip exists)
//!     │
//!     │      correct_journal
//!     └─────────────────────▶ Corrected   (red slip + black slip exist)
//!
//!   red slip:   Reversal (terminal)
//!   black slip: Active
//! ```
//!
//! All precondition reads and all writes of one operation share a single unit
//! of work; a failure at any step leaves nothing behind.

use serde::Serialize;
use tracing::{info, warn};

use ledgerpost_core::{LedgerError, LedgerResult, VoucherNumber};

use crate::balance;
use crate::command::{CorrectionResult, CreateJournalCommand};
use crate::config::ReversalDating;
use crate::journal::Journal;
use crate::repository::{JournalRepository, TransactionManager};
use crate::service::{JournalService, load_with_details, today};

/// Where a voucher stands in the correction lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum JournalStatus {
    Active,
    #[serde(rename_all = "camelCase")]
    Cancelled { red_slip: VoucherNumber },
    #[serde(rename_all = "camelCase")]
    Corrected {
        red_slip: VoucherNumber,
        black_slip: VoucherNumber,
    },
    /// The voucher is itself a red slip.
    Reversal { of: Option<VoucherNumber> },
}

impl JournalStatus {
    /// Whether the voucher may still be cancelled or corrected.
    pub fn is_active(&self) -> bool {
        matches!(self, JournalStatus::Active)
    }
}

#[derive(Debug)]
pub struct CorrectionEngine<M> {
    journals: JournalService<M>,
}

impl<M> CorrectionEngine<M>
where
    M: TransactionManager,
{
    pub fn new(journals: JournalService<M>) -> Self {
        Self { journals }
    }

    pub fn journals(&self) -> &JournalService<M> {
        &self.journals
    }

    /// Issue a red slip for `voucher_number` and return the red slip's number.
    #[tracing::instrument(skip_all, fields(voucher_number = %voucher_number))]
    pub fn cancel_journal(&self, voucher_number: &VoucherNumber) -> LedgerResult<VoucherNumber> {
        let result = self.journals.transactions().run(|repo| {
            let original = load_with_details(repo, voucher_number)?;
            let red_slip_number = self.ensure_active(repo, &original)?;

            let red_slip = self.derive_red_slip(&original, red_slip_number);
            balance::validate(&red_slip)?;
            repo.save(&red_slip)?;

            Ok(red_slip.voucher_number().clone())
        });

        match &result {
            Ok(red_slip) => info!(red_slip = %red_slip, "journal cancelled"),
            Err(err) => warn!(error = %err, "cancellation rejected"),
        }
        result
    }

    /// Replace `original` by `corrected`: post the original's red slip, then
    /// `corrected` as the black slip. Exactly two journals are written, or none.
    #[tracing::instrument(
        skip_all,
        fields(voucher_number = %original, black_slip = %corrected.voucher_number())
    )]
    pub fn correct_journal(
        &self,
        original: &VoucherNumber,
        corrected: Journal,
    ) -> LedgerResult<CorrectionResult> {
        let result = self.journals.transactions().run(|repo| {
            let original_journal = load_with_details(repo, original)?;

            if let Err(err) = balance::validate(&corrected) {
                return Err(match err {
                    LedgerError::Unbalanced {
                        debit_total,
                        credit_total,
                    } => LedgerError::invalid_correction(format!(
                        "corrected journal is unbalanced (debit total: {debit_total}, credit total: {credit_total})"
                    )),
                    other => other,
                });
            }

            let red_slip_number = self.ensure_active(repo, &original_journal)?;
            if corrected.voucher_number() == original
                || corrected.voucher_number() == &red_slip_number
            {
                return Err(LedgerError::invalid_correction(format!(
                    "black slip must use a new voucher number (got {})",
                    corrected.voucher_number()
                )));
            }

            let red_slip = self
                .derive_red_slip(&original_journal, red_slip_number)
                .with_replaced_by(corrected.voucher_number().clone());
            balance::validate(&red_slip)?;
            repo.save(&red_slip)?;

            let cycle = red_slip.red_black_voucher_number().unwrap_or(1);
            let black_slip = corrected.with_red_black_voucher_number(cycle);
            repo.save(&black_slip)?;

            Ok(CorrectionResult {
                red_slip_number: red_slip.voucher_number().clone(),
                black_slip_number: black_slip.voucher_number().clone(),
            })
        });

        match &result {
            Ok(r) => info!(
                red_slip = %r.red_slip_number,
                black_slip = %r.black_slip_number,
                "journal corrected"
            ),
            Err(err) => warn!(error = %err, "correction rejected"),
        }
        result
    }

    /// Build the black slip from a command and correct `original` with it.
    ///
    /// Structural or label errors in the command are reported as
    /// [`LedgerError::InvalidCorrection`].
    pub fn correct_journal_with_command(
        &self,
        original: &VoucherNumber,
        command: &CreateJournalCommand,
    ) -> LedgerResult<CorrectionResult> {
        let corrected = self.journals.build_journal(command).map_err(|err| match err {
            LedgerError::Validation(_)
            | LedgerError::UnknownDebitCreditType(_)
            | LedgerError::UnknownLabel { .. } => LedgerError::invalid_correction(err.to_string()),
            other => other,
        })?;
        self.correct_journal(original, corrected)
    }

    pub fn status(&self, voucher_number: &VoucherNumber) -> LedgerResult<JournalStatus> {
        self.journals.transactions().run(|repo| {
            let journal = repo
                .find_by_voucher_number(voucher_number)?
                .ok_or_else(|| LedgerError::not_found(voucher_number.as_str()))?;

            if journal.red_slip_flag() {
                return Ok(JournalStatus::Reversal {
                    of: journal.reverses().cloned(),
                });
            }

            let red_slip_number = self.red_slip_number(&journal);
            Ok(match repo.find_by_voucher_number(&red_slip_number)? {
                Some(red) if red.reverses() == Some(voucher_number) => match red.replaced_by() {
                    Some(black) => JournalStatus::Corrected {
                        red_slip: red_slip_number,
                        black_slip: black.clone(),
                    },
                    None => JournalStatus::Cancelled {
                        red_slip: red_slip_number,
                    },
                },
                _ => JournalStatus::Active,
            })
        })
    }

    fn red_slip_number(&self, original: &Journal) -> VoucherNumber {
        original
            .voucher_number()
            .with_suffix(&self.journals.config().red_slip_suffix)
    }

    /// Reject red slips and vouchers that already have a red slip; return the
    /// number the new red slip will take.
    fn ensure_active<R>(&self, repo: &R, original: &Journal) -> LedgerResult<VoucherNumber>
    where
        R: JournalRepository + ?Sized,
    {
        if original.red_slip_flag() {
            return Err(LedgerError::already_cancelled(original.voucher_number().as_str()));
        }

        let red_slip_number = self.red_slip_number(original);
        match repo.find_by_voucher_number(&red_slip_number)? {
            None => Ok(red_slip_number),
            Some(existing) if existing.reverses() == Some(original.voucher_number()) => {
                Err(match existing.replaced_by() {
                    Some(black) => LedgerError::already_corrected(
                        original.voucher_number().as_str(),
                        black.as_str(),
                    ),
                    None => LedgerError::already_cancelled(original.voucher_number().as_str()),
                })
            }
            Some(_) => Err(LedgerError::conflict(format!(
                "voucher number {red_slip_number} is already used by an unrelated journal"
            ))),
        }
    }

    fn derive_red_slip(&self, original: &Journal, red_slip_number: VoucherNumber) -> Journal {
        let config = self.journals.config();
        let cycle = original
            .red_black_voucher_number()
            .unwrap_or(0)
            .saturating_add(1);
        let (posting_date, entry_date) = match config.reversal_dating {
            ReversalDating::Original => (original.posting_date(), original.entry_date()),
            ReversalDating::Today => (today(), today()),
        };

        original.reversal(
            red_slip_number,
            posting_date,
            entry_date,
            &config.reversal_summary_suffix,
            cycle,
        )
    }
}
