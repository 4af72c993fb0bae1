//! Journal service: create, read and delete journals.
//!
//! Every operation runs inside one unit of work obtained from the injected
//! [`TransactionManager`]; every journal passes [`balance::validate`] before it
//! reaches the repository.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use ledgerpost_core::{LedgerError, LedgerResult, VoucherNumber};

use crate::balance;
use crate::command::{CreateJournalCommand, JournalResponse};
use crate::config::JournalConfig;
use crate::journal::Journal;
use crate::repository::{JournalRepository, TransactionManager};

#[derive(Debug)]
pub struct JournalService<M> {
    transactions: M,
    config: JournalConfig,
}

impl<M> JournalService<M> {
    pub fn new(transactions: M) -> Self {
        Self::with_config(transactions, JournalConfig::default())
    }

    pub fn with_config(transactions: M, config: JournalConfig) -> Self {
        Self {
            transactions,
            config,
        }
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn transactions(&self) -> &M {
        &self.transactions
    }

    /// `prefix` + the last 10 hex digits of a UUIDv7 (the random tail), upper-cased.
    pub fn generate_voucher_number(&self) -> LedgerResult<VoucherNumber> {
        let hex = Uuid::now_v7().simple().to_string();
        VoucherNumber::new(format!(
            "{}{}",
            self.config.voucher_prefix,
            hex[hex.len() - 10..].to_ascii_uppercase()
        ))
    }

    /// Build (but do not validate balance or persist) the journal a command describes.
    pub fn build_journal(&self, command: &CreateJournalCommand) -> LedgerResult<Journal> {
        let voucher_number = match command.voucher_number.as_deref() {
            Some(v) => VoucherNumber::new(v)?,
            None => self.generate_voucher_number()?,
        };
        command.to_journal(voucher_number, today())
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn load_with_details<R>(
    repo: &R,
    voucher_number: &VoucherNumber,
) -> LedgerResult<Journal>
where
    R: JournalRepository + ?Sized,
{
    repo.find_with_details(voucher_number)?
        .ok_or_else(|| LedgerError::not_found(voucher_number.as_str()))
}

impl<M> JournalService<M>
where
    M: TransactionManager,
{
    /// Validate and post a new journal.
    ///
    /// An unbalanced command fails with [`LedgerError::Unbalanced`] and nothing is persisted.
    #[tracing::instrument(skip(self, command), fields(posting_date = %command.posting_date))]
    pub fn create_journal(&self, command: &CreateJournalCommand) -> LedgerResult<JournalResponse> {
        let journal = self.build_journal(command)?;

        if let Err(err) = balance::validate(&journal) {
            warn!(voucher_number = %journal.voucher_number(), error = %err, "journal rejected");
            return Err(err);
        }

        self.transactions.run(|repo| repo.save(&journal))?;

        info!(
            voucher_number = %journal.voucher_number(),
            debit_total = %journal.debit_total(),
            "journal posted"
        );

        Ok(JournalResponse::from(&journal))
    }

    #[tracing::instrument(skip_all, fields(voucher_number = %voucher_number))]
    pub fn get_journal(&self, voucher_number: &VoucherNumber) -> LedgerResult<JournalResponse> {
        let journal = self
            .transactions
            .run(|repo| load_with_details(repo, voucher_number))?;
        debug!("journal loaded");
        Ok(JournalResponse::from(&journal))
    }

    /// Inclusive on both ends, ordered by posting date then voucher number.
    pub fn get_journals_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<JournalResponse>> {
        ensure_range(from, to)?;
        let mut journals = self
            .transactions
            .run(|repo| repo.find_by_posting_date_between(from, to))?;
        sort_for_listing(&mut journals);
        debug!(%from, %to, count = journals.len(), "journals loaded by date range");
        Ok(journals.iter().map(JournalResponse::from).collect())
    }

    pub fn get_journals_by_account_code(
        &self,
        account_code: &str,
    ) -> LedgerResult<Vec<JournalResponse>> {
        let mut journals = self
            .transactions
            .run(|repo| repo.find_by_account_code(account_code))?;
        sort_for_listing(&mut journals);
        Ok(journals.iter().map(JournalResponse::from).collect())
    }

    pub fn count_journals_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<u64> {
        ensure_range(from, to)?;
        self.transactions
            .run(|repo| repo.count_by_posting_date_between(from, to))
    }

    /// Hard delete. Operational cleanup only; corrections never delete.
    #[tracing::instrument(skip_all, fields(voucher_number = %voucher_number))]
    pub fn delete_journal(&self, voucher_number: &VoucherNumber) -> LedgerResult<()> {
        self.transactions.run(|repo| {
            repo.find_by_voucher_number(voucher_number)?
                .ok_or_else(|| LedgerError::not_found(voucher_number.as_str()))?;
            repo.delete(voucher_number)
        })?;
        info!("journal deleted");
        Ok(())
    }
}

fn ensure_range(from: NaiveDate, to: NaiveDate) -> LedgerResult<()> {
    if from > to {
        return Err(LedgerError::validation(format!(
            "date range start {from} is after end {to}"
        )));
    }
    Ok(())
}

fn sort_for_listing(journals: &mut [Journal]) {
    journals.sort_by(|a, b| {
        a.posting_date()
            .cmp(&b.posting_date())
            .then_with(|| a.voucher_number().cmp(b.voucher_number()))
    });
}
