//! In-memory journal store.
//!
//! Units of work are serialized by a mutex. Each unit stages its writes on a
//! copy of the committed rows; the copy replaces the committed rows only when
//! the unit returns `Ok`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use tracing::debug;

use ledgerpost_accounting::{Journal, JournalRepository, TransactionManager};
use ledgerpost_core::{LedgerError, LedgerResult, VoucherNumber};

type Rows = BTreeMap<VoucherNumber, Journal>;

/// Intended for tests/dev. Every read clones.
#[derive(Debug, Default)]
pub struct InMemoryJournalStore {
    committed: Mutex<Rows>,
}

impl InMemoryJournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Rows>> {
        self.committed
            .lock()
            .map_err(|_| LedgerError::storage("journal store lock poisoned"))
    }

    /// Number of committed journals.
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Committed journal, read outside any unit of work.
    pub fn get(&self, voucher_number: &VoucherNumber) -> LedgerResult<Option<Journal>> {
        Ok(self.lock()?.get(voucher_number).cloned())
    }
}

impl TransactionManager for InMemoryJournalStore {
    type Repository = StagedJournals;

    fn run<T, F>(&self, work: F) -> LedgerResult<T>
    where
        F: FnOnce(&Self::Repository) -> LedgerResult<T>,
    {
        let mut committed = self.lock()?;
        let staged = StagedJournals {
            rows: RefCell::new(committed.clone()),
        };

        match work(&staged) {
            Ok(value) => {
                *committed = staged.rows.into_inner();
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "unit of work rolled back");
                Err(err)
            }
        }
    }
}

/// Repository view handed to one unit of work.
#[derive(Debug)]
pub struct StagedJournals {
    rows: RefCell<Rows>,
}

impl StagedJournals {
    fn collect_sorted(&self, keep: impl Fn(&Journal) -> bool) -> Vec<Journal> {
        let mut found: Vec<Journal> = self
            .rows
            .borrow()
            .values()
            .filter(|j| keep(j))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.posting_date()
                .cmp(&b.posting_date())
                .then_with(|| a.voucher_number().cmp(b.voucher_number()))
        });
        found
    }
}

impl JournalRepository for StagedJournals {
    fn save(&self, journal: &Journal) -> LedgerResult<()> {
        let mut rows = self.rows.borrow_mut();
        if rows.contains_key(journal.voucher_number()) {
            return Err(LedgerError::conflict(format!(
                "voucher number {} already exists",
                journal.voucher_number()
            )));
        }
        rows.insert(journal.voucher_number().clone(), journal.clone());
        Ok(())
    }

    fn find_by_voucher_number(
        &self,
        voucher_number: &VoucherNumber,
    ) -> LedgerResult<Option<Journal>> {
        Ok(self.rows.borrow().get(voucher_number).cloned())
    }

    fn find_with_details(&self, voucher_number: &VoucherNumber) -> LedgerResult<Option<Journal>> {
        self.find_by_voucher_number(voucher_number)
    }

    fn find_by_posting_date_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<Journal>> {
        Ok(self.collect_sorted(|j| j.posting_date() >= from && j.posting_date() <= to))
    }

    fn find_by_account_code(&self, account_code: &str) -> LedgerResult<Vec<Journal>> {
        Ok(self.collect_sorted(|j| j.touches_account(account_code)))
    }

    fn delete(&self, voucher_number: &VoucherNumber) -> LedgerResult<()> {
        self.rows.borrow_mut().remove(voucher_number);
        Ok(())
    }

    fn count_by_posting_date_between(&self, from: NaiveDate, to: NaiveDate) -> LedgerResult<u64> {
        Ok(self
            .rows
            .borrow()
            .values()
            .filter(|j| j.posting_date() >= from && j.posting_date() <= to)
            .count() as u64)
    }
}
