//! Persistence ports consumed by the journal service and correction engine.
//!
//! Adapters live in `ledgerpost-infra`; nothing in this crate performs IO.

use std::sync::Arc;

use chrono::NaiveDate;

use ledgerpost_core::{LedgerResult, VoucherNumber};

use crate::journal::Journal;

/// Journal persistence contract.
///
/// Implementations must:
/// - insert the full graph (header + lines + entries) atomically in `save`
/// - reject a second `save` of an existing voucher number with `LedgerError::Conflict`
/// - remove the full graph in `delete`
pub trait JournalRepository {
    fn save(&self, journal: &Journal) -> LedgerResult<()>;

    /// Header lookup. Adapters may return the journal without its detail graph.
    fn find_by_voucher_number(
        &self,
        voucher_number: &VoucherNumber,
    ) -> LedgerResult<Option<Journal>>;

    /// Header plus full line/entry graph.
    fn find_with_details(&self, voucher_number: &VoucherNumber) -> LedgerResult<Option<Journal>>;

    /// Inclusive range on posting date, ordered by posting date then voucher number.
    fn find_by_posting_date_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<Journal>>;

    /// Journals with at least one entry on `account_code`, ordered like the range query.
    fn find_by_account_code(&self, account_code: &str) -> LedgerResult<Vec<Journal>>;

    fn delete(&self, voucher_number: &VoucherNumber) -> LedgerResult<()>;

    fn count_by_posting_date_between(&self, from: NaiveDate, to: NaiveDate) -> LedgerResult<u64> {
        Ok(self.find_by_posting_date_between(from, to)?.len() as u64)
    }
}

impl<R> JournalRepository for Arc<R>
where
    R: JournalRepository + ?Sized,
{
    fn save(&self, journal: &Journal) -> LedgerResult<()> {
        (**self).save(journal)
    }

    fn find_by_voucher_number(
        &self,
        voucher_number: &VoucherNumber,
    ) -> LedgerResult<Option<Journal>> {
        (**self).find_by_voucher_number(voucher_number)
    }

    fn find_with_details(&self, voucher_number: &VoucherNumber) -> LedgerResult<Option<Journal>> {
        (**self).find_with_details(voucher_number)
    }

    fn find_by_posting_date_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<Journal>> {
        (**self).find_by_posting_date_between(from, to)
    }

    fn find_by_account_code(&self, account_code: &str) -> LedgerResult<Vec<Journal>> {
        (**self).find_by_account_code(account_code)
    }

    fn delete(&self, voucher_number: &VoucherNumber) -> LedgerResult<()> {
        (**self).delete(voucher_number)
    }

    fn count_by_posting_date_between(&self, from: NaiveDate, to: NaiveDate) -> LedgerResult<u64> {
        (**self).count_by_posting_date_between(from, to)
    }
}

/// "Run the following unit of work atomically."
///
/// Every read that establishes a precondition and every write that follows it
/// go through the repository handed to `work`. Writes become visible only when
/// `work` returns `Ok`; an `Err` discards all of them.
pub trait TransactionManager {
    type Repository: JournalRepository;

    fn run<T, F>(&self, work: F) -> LedgerResult<T>
    where
        F: FnOnce(&Self::Repository) -> LedgerResult<T>;
}

impl<M> TransactionManager for Arc<M>
where
    M: TransactionManager,
{
    type Repository = M::Repository;

    fn run<T, F>(&self, work: F) -> LedgerResult<T>
    where
        F: FnOnce(&Self::Repository) -> LedgerResult<T>,
    {
        (**self).run(work)
    }
}
