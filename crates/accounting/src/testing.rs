//! In-crate test doubles for the persistence ports.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use ledgerpost_core::{LedgerError, LedgerResult, VoucherNumber};

use crate::journal::Journal;
use crate::repository::{JournalRepository, TransactionManager};

/// Map-backed repository that records how often `save` was called and can be
/// told to fail the save of specific voucher numbers.
#[derive(Debug, Default)]
pub struct FakeJournalRepository {
    rows: RefCell<BTreeMap<VoucherNumber, Journal>>,
    save_calls: Cell<usize>,
    failing_saves: RefCell<BTreeSet<VoucherNumber>>,
}

impl JournalRepository for FakeJournalRepository {
    fn save(&self, journal: &Journal) -> LedgerResult<()> {
        self.save_calls.set(self.save_calls.get() + 1);
        if self.failing_saves.borrow().contains(journal.voucher_number()) {
            return Err(LedgerError::storage("injected save failure"));
        }
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
        self.find_with_details(voucher_number)
    }

    fn find_with_details(&self, voucher_number: &VoucherNumber) -> LedgerResult<Option<Journal>> {
        Ok(self.rows.borrow().get(voucher_number).cloned())
    }

    fn find_by_posting_date_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<Journal>> {
        Ok(self
            .rows
            .borrow()
            .values()
            .filter(|j| j.posting_date() >= from && j.posting_date() <= to)
            .cloned()
            .collect())
    }

    fn find_by_account_code(&self, account_code: &str) -> LedgerResult<Vec<Journal>> {
        Ok(self
            .rows
            .borrow()
            .values()
            .filter(|j| j.touches_account(account_code))
            .cloned()
            .collect())
    }

    fn delete(&self, voucher_number: &VoucherNumber) -> LedgerResult<()> {
        self.rows.borrow_mut().remove(voucher_number);
        Ok(())
    }
}

/// Runs work directly against one [`FakeJournalRepository`], restoring the
/// previous rows when the work fails.
#[derive(Debug, Default)]
pub struct FakeTransactions {
    repo: FakeJournalRepository,
}

impl FakeTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_calls(&self) -> usize {
        self.repo.save_calls.get()
    }

    pub fn reset_save_calls(&self) {
        self.repo.save_calls.set(0);
    }

    pub fn fail_save_of(&self, voucher_number: &str) {
        if let Ok(v) = VoucherNumber::new(voucher_number) {
            self.repo.failing_saves.borrow_mut().insert(v);
        }
    }

    pub fn stored(&self, voucher_number: &str) -> Option<Journal> {
        let v = VoucherNumber::new(voucher_number).ok()?;
        self.repo.rows.borrow().get(&v).cloned()
    }

    pub fn stored_count(&self) -> usize {
        self.repo.rows.borrow().len()
    }

    /// Seed a journal directly, bypassing services and the save counter.
    pub fn seed(&self, journal: Journal) {
        self.repo
            .rows
            .borrow_mut()
            .insert(journal.voucher_number().clone(), journal);
    }
}

impl TransactionManager for FakeTransactions {
    type Repository = FakeJournalRepository;

    fn run<T, F>(&self, work: F) -> LedgerResult<T>
    where
        F: FnOnce(&Self::Repository) -> LedgerResult<T>,
    {
        let snapshot = self.repo.rows.borrow().clone();
        let result = work(&self.repo);
        if result.is_err() {
            *self.repo.rows.borrow_mut() = snapshot;
        }
        result
    }
}
