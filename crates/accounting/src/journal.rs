use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerpost_core::{Amount, LedgerError, LedgerResult, VoucherNumber};

use crate::balance;

/// Side of a double-entry line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DebitCreditType {
    Debit,
    Credit,
}

impl DebitCreditType {
    /// The opposite side (used when deriving red slips).
    pub fn flipped(self) -> Self {
        match self {
            DebitCreditType::Debit => DebitCreditType::Credit,
            DebitCreditType::Credit => DebitCreditType::Debit,
        }
    }

    /// Localized display label.
    pub fn label(self) -> &'static str {
        match self {
            DebitCreditType::Debit => "借方",
            DebitCreditType::Credit => "貸方",
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoucherType {
    #[default]
    Normal,
    Auto,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxType {
    Taxable,
    NonTaxable,
    Exempt,
    OutOfScope,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxCalculationType {
    Exclusive,
    Inclusive,
}

/// Header flags carried verbatim from the posting command.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct JournalFlags {
    pub closing_journal: bool,
    pub single_entry: bool,
    pub periodic_posting: bool,
}

/// One debit or credit entry (immutable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalDebitCreditDetail {
    debit_credit_type: DebitCreditType,
    account_code: String,
    sub_account_code: Option<String>,
    department_code: Option<String>,
    project_code: Option<String>,
    amount: Amount,
    currency_code: Option<String>,
    exchange_rate: Option<Decimal>,
    base_currency_amount: Option<Decimal>,
    tax_type: Option<TaxType>,
    tax_rate: Option<u32>,
    tax_calc_type: Option<TaxCalculationType>,
    due_date: Option<NaiveDate>,
    cash_flow_flag: bool,
}

impl JournalDebitCreditDetail {
    pub fn new(
        debit_credit_type: DebitCreditType,
        account_code: impl Into<String>,
        amount: Amount,
    ) -> LedgerResult<Self> {
        let account_code = account_code.into();
        if account_code.trim().is_empty() {
            return Err(LedgerError::validation("account code is required"));
        }
        Ok(Self {
            debit_credit_type,
            account_code,
            sub_account_code: None,
            department_code: None,
            project_code: None,
            amount,
            currency_code: None,
            exchange_rate: None,
            base_currency_amount: None,
            tax_type: None,
            tax_rate: None,
            tax_calc_type: None,
            due_date: None,
            cash_flow_flag: false,
        })
    }

    /// Shorthand for a debit entry.
    pub fn debit(account_code: impl Into<String>, amount: Amount) -> LedgerResult<Self> {
        Self::new(DebitCreditType::Debit, account_code, amount)
    }

    /// Shorthand for a credit entry.
    pub fn credit(account_code: impl Into<String>, amount: Amount) -> LedgerResult<Self> {
        Self::new(DebitCreditType::Credit, account_code, amount)
    }

    pub fn with_sub_account_code(mut self, code: Option<String>) -> Self {
        self.sub_account_code = code;
        self
    }

    pub fn with_department_code(mut self, code: Option<String>) -> Self {
        self.department_code = code;
        self
    }

    pub fn with_project_code(mut self, code: Option<String>) -> Self {
        self.project_code = code;
        self
    }

    /// Attach foreign-currency information. A present exchange rate must be positive.
    pub fn with_foreign_currency(
        mut self,
        currency_code: Option<String>,
        exchange_rate: Option<Decimal>,
        base_currency_amount: Option<Decimal>,
    ) -> LedgerResult<Self> {
        if let Some(rate) = exchange_rate {
            if rate <= Decimal::ZERO {
                return Err(LedgerError::validation(format!(
                    "exchange rate must be positive (got {rate})"
                )));
            }
        }
        self.currency_code = currency_code;
        self.exchange_rate = exchange_rate;
        self.base_currency_amount = base_currency_amount;
        Ok(self)
    }

    pub fn with_tax(
        mut self,
        tax_type: Option<TaxType>,
        tax_rate: Option<u32>,
        tax_calc_type: Option<TaxCalculationType>,
    ) -> Self {
        self.tax_type = tax_type;
        self.tax_rate = tax_rate;
        self.tax_calc_type = tax_calc_type;
        self
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_cash_flow_flag(mut self, flag: bool) -> Self {
        self.cash_flow_flag = flag;
        self
    }

    /// Same entry on the opposite side; every other attribute is kept.
    pub fn reversed(&self) -> Self {
        Self {
            debit_credit_type: self.debit_credit_type.flipped(),
            ..self.clone()
        }
    }

    pub fn debit_credit_type(&self) -> DebitCreditType {
        self.debit_credit_type
    }

    pub fn is_debit(&self) -> bool {
        self.debit_credit_type == DebitCreditType::Debit
    }

    pub fn account_code(&self) -> &str {
        &self.account_code
    }

    pub fn sub_account_code(&self) -> Option<&str> {
        self.sub_account_code.as_deref()
    }

    pub fn department_code(&self) -> Option<&str> {
        self.department_code.as_deref()
    }

    pub fn project_code(&self) -> Option<&str> {
        self.project_code.as_deref()
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn currency_code(&self) -> Option<&str> {
        self.currency_code.as_deref()
    }

    pub fn exchange_rate(&self) -> Option<Decimal> {
        self.exchange_rate
    }

    pub fn base_currency_amount(&self) -> Option<Decimal> {
        self.base_currency_amount
    }

    pub fn tax_type(&self) -> Option<TaxType> {
        self.tax_type
    }

    pub fn tax_rate(&self) -> Option<u32> {
        self.tax_rate
    }

    pub fn tax_calc_type(&self) -> Option<TaxCalculationType> {
        self.tax_calc_type
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn cash_flow_flag(&self) -> bool {
        self.cash_flow_flag
    }
}

/// A presentational line of a journal grouping one or more entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalDetail {
    line_number: u32,
    line_summary: String,
    entries: Vec<JournalDebitCreditDetail>,
}

impl JournalDetail {
    pub fn new(
        line_number: u32,
        line_summary: impl Into<String>,
        entries: Vec<JournalDebitCreditDetail>,
    ) -> LedgerResult<Self> {
        if line_number == 0 {
            return Err(LedgerError::validation("line numbers are 1-based"));
        }
        if entries.is_empty() {
            return Err(LedgerError::validation(format!(
                "line {line_number} must have at least one debit/credit entry"
            )));
        }
        Ok(Self {
            line_number,
            line_summary: line_summary.into(),
            entries,
        })
    }

    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    pub fn line_summary(&self) -> &str {
        &self.line_summary
    }

    pub fn entries(&self) -> &[JournalDebitCreditDetail] {
        &self.entries
    }

    fn reversed(&self, summary_suffix: &str) -> Self {
        Self {
            line_number: self.line_number,
            line_summary: format!("{}{}", self.line_summary, summary_suffix),
            entries: self.entries.iter().map(JournalDebitCreditDetail::reversed).collect(),
        }
    }
}

/// Journal (voucher) aggregate root.
///
/// Construction validates structure only; debit/credit equality is checked
/// separately by [`crate::balance::validate`] so that unbalanced drafts can be
/// reported with their totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journal {
    voucher_number: VoucherNumber,
    posting_date: NaiveDate,
    entry_date: NaiveDate,
    voucher_type: VoucherType,
    flags: JournalFlags,
    department_code: Option<String>,
    employee_code: Option<String>,
    red_slip_flag: bool,
    red_black_voucher_number: Option<u32>,
    reverses: Option<VoucherNumber>,
    replaced_by: Option<VoucherNumber>,
    details: Vec<JournalDetail>,
}

impl Journal {
    pub fn new(
        voucher_number: VoucherNumber,
        posting_date: NaiveDate,
        entry_date: NaiveDate,
        details: Vec<JournalDetail>,
    ) -> LedgerResult<Self> {
        if details.is_empty() {
            return Err(LedgerError::validation(format!(
                "journal {voucher_number} must have at least one line"
            )));
        }

        let mut seen = std::collections::BTreeSet::new();
        for detail in &details {
            if !seen.insert(detail.line_number) {
                return Err(LedgerError::validation(format!(
                    "duplicate line number {} in journal {voucher_number}",
                    detail.line_number
                )));
            }
        }

        let entries = || details.iter().flat_map(|d| d.entries.iter());
        if !entries().any(JournalDebitCreditDetail::is_debit) {
            return Err(LedgerError::validation(format!(
                "journal {voucher_number} has no debit entry"
            )));
        }
        if entries().all(JournalDebitCreditDetail::is_debit) {
            return Err(LedgerError::validation(format!(
                "journal {voucher_number} has no credit entry"
            )));
        }
        if balance::checked_totals(entries()).is_none() {
            return Err(LedgerError::validation(balance::TOTAL_OVERFLOW));
        }

        Ok(Self {
            voucher_number,
            posting_date,
            entry_date,
            voucher_type: VoucherType::Normal,
            flags: JournalFlags::default(),
            department_code: None,
            employee_code: None,
            red_slip_flag: false,
            red_black_voucher_number: None,
            reverses: None,
            replaced_by: None,
            details,
        })
    }

    pub fn with_voucher_type(mut self, voucher_type: VoucherType) -> Self {
        self.voucher_type = voucher_type;
        self
    }

    pub fn with_flags(mut self, flags: JournalFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_department_code(mut self, code: Option<String>) -> Self {
        self.department_code = code;
        self
    }

    pub fn with_employee_code(mut self, code: Option<String>) -> Self {
        self.employee_code = code;
        self
    }

    /// Stamp the correction cycle this journal belongs to.
    pub(crate) fn with_red_black_voucher_number(mut self, cycle: u32) -> Self {
        self.red_black_voucher_number = Some(cycle);
        self
    }

    pub(crate) fn with_replaced_by(mut self, black_slip: VoucherNumber) -> Self {
        self.replaced_by = Some(black_slip);
        self
    }

    /// Derive the red slip of this journal: identical lines with every side flipped.
    pub(crate) fn reversal(
        &self,
        voucher_number: VoucherNumber,
        posting_date: NaiveDate,
        entry_date: NaiveDate,
        summary_suffix: &str,
        cycle: u32,
    ) -> Self {
        Self {
            voucher_number,
            posting_date,
            entry_date,
            voucher_type: self.voucher_type,
            flags: JournalFlags {
                periodic_posting: false,
                ..self.flags
            },
            department_code: self.department_code.clone(),
            employee_code: self.employee_code.clone(),
            red_slip_flag: true,
            red_black_voucher_number: Some(cycle),
            reverses: Some(self.voucher_number.clone()),
            replaced_by: None,
            details: self
                .details
                .iter()
                .map(|d| d.reversed(summary_suffix))
                .collect(),
        }
    }

    pub fn voucher_number(&self) -> &VoucherNumber {
        &self.voucher_number
    }

    pub fn posting_date(&self) -> NaiveDate {
        self.posting_date
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    pub fn voucher_type(&self) -> VoucherType {
        self.voucher_type
    }

    pub fn flags(&self) -> JournalFlags {
        self.flags
    }

    pub fn department_code(&self) -> Option<&str> {
        self.department_code.as_deref()
    }

    pub fn employee_code(&self) -> Option<&str> {
        self.employee_code.as_deref()
    }

    pub fn red_slip_flag(&self) -> bool {
        self.red_slip_flag
    }

    pub fn red_black_voucher_number(&self) -> Option<u32> {
        self.red_black_voucher_number
    }

    /// On a red slip: the voucher it reverses.
    pub fn reverses(&self) -> Option<&VoucherNumber> {
        self.reverses.as_ref()
    }

    /// On a red slip issued by a correction: the black slip that replaced the original.
    pub fn replaced_by(&self) -> Option<&VoucherNumber> {
        self.replaced_by.as_ref()
    }

    pub fn details(&self) -> &[JournalDetail] {
        &self.details
    }

    /// All entries across all lines, in line order.
    pub fn entries(&self) -> impl Iterator<Item = &JournalDebitCreditDetail> {
        self.details.iter().flat_map(|d| d.entries.iter())
    }

    pub fn debit_total(&self) -> Decimal {
        balance::totals(self).debit_total
    }

    pub fn credit_total(&self) -> Decimal {
        balance::totals(self).credit_total
    }

    pub fn is_balanced(&self) -> bool {
        balance::totals(self).is_balanced()
    }

    /// True when any entry references `account_code`.
    pub fn touches_account(&self, account_code: &str) -> bool {
        self.entries().any(|e| e.account_code == account_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(v: i64) -> Amount {
        Amount::new(Decimal::from(v)).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    fn voucher(s: &str) -> VoucherNumber {
        VoucherNumber::new(s).unwrap()
    }

    fn simple_line(debit: i64, credit: i64) -> JournalDetail {
        JournalDetail::new(
            1,
            "sales",
            vec![
                JournalDebitCreditDetail::debit("11110", amount(debit)).unwrap(),
                JournalDebitCreditDetail::credit("41100", amount(credit)).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn journal_without_lines_is_rejected() {
        let err = Journal::new(voucher("J0001"), date(), date(), vec![]).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(msg) if msg.contains("at least one line")));
    }

    #[test]
    fn line_without_entries_is_rejected() {
        assert!(JournalDetail::new(1, "empty", vec![]).is_err());
    }

    #[test]
    fn line_number_zero_is_rejected() {
        let entries = vec![JournalDebitCreditDetail::debit("11110", amount(1)).unwrap()];
        assert!(JournalDetail::new(0, "zero", entries).is_err());
    }

    #[test]
    fn journal_needs_both_sides() {
        let only_debits = JournalDetail::new(
            1,
            "x",
            vec![JournalDebitCreditDetail::debit("11110", amount(100)).unwrap()],
        )
        .unwrap();
        let err = Journal::new(voucher("J0001"), date(), date(), vec![only_debits]).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(msg) if msg.contains("no credit")));

        let only_credits = JournalDetail::new(
            1,
            "x",
            vec![JournalDebitCreditDetail::credit("41100", amount(100)).unwrap()],
        )
        .unwrap();
        let err = Journal::new(voucher("J0001"), date(), date(), vec![only_credits]).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(msg) if msg.contains("no debit")));
    }

    #[test]
    fn sides_may_be_split_across_lines() {
        let debit_line = JournalDetail::new(
            1,
            "debit",
            vec![JournalDebitCreditDetail::debit("11110", amount(100)).unwrap()],
        )
        .unwrap();
        let credit_line = JournalDetail::new(
            2,
            "credit",
            vec![JournalDebitCreditDetail::credit("41100", amount(100)).unwrap()],
        )
        .unwrap();
        let journal =
            Journal::new(voucher("J0001"), date(), date(), vec![debit_line, credit_line]).unwrap();
        assert!(journal.is_balanced());
    }

    #[test]
    fn duplicate_line_numbers_are_rejected() {
        let err = Journal::new(
            voucher("J0001"),
            date(),
            date(),
            vec![simple_line(100, 100), simple_line(50, 50)],
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(msg) if msg.contains("duplicate line")));
    }

    #[test]
    fn empty_account_code_is_rejected() {
        assert!(JournalDebitCreditDetail::debit("  ", amount(1)).is_err());
    }

    #[test]
    fn non_positive_exchange_rate_is_rejected() {
        let entry = JournalDebitCreditDetail::debit("11110", amount(1)).unwrap();
        assert!(
            entry
                .with_foreign_currency(Some("USD".into()), Some(Decimal::ZERO), None)
                .is_err()
        );
    }

    #[test]
    fn reversal_flips_sides_and_keeps_everything_else() {
        let original = Journal::new(voucher("J0001"), date(), date(), vec![simple_line(100, 100)])
            .unwrap()
            .with_employee_code(Some("EMP001".into()))
            .with_flags(JournalFlags {
                closing_journal: true,
                single_entry: false,
                periodic_posting: true,
            });

        let red = original.reversal(voucher("J0001R"), date(), date(), " (reversal)", 1);

        assert_eq!(red.voucher_number().as_str(), "J0001R");
        assert!(red.red_slip_flag());
        assert_eq!(red.red_black_voucher_number(), Some(1));
        assert_eq!(red.reverses(), Some(original.voucher_number()));
        assert_eq!(red.employee_code(), Some("EMP001"));
        assert!(red.flags().closing_journal);
        assert!(!red.flags().periodic_posting);
        assert_eq!(red.details()[0].line_summary(), "sales (reversal)");

        for (orig, rev) in original.entries().zip(red.entries()) {
            assert_eq!(rev.debit_credit_type(), orig.debit_credit_type().flipped());
            assert_eq!(rev.amount(), orig.amount());
            assert_eq!(rev.account_code(), orig.account_code());
        }
    }

    #[test]
    fn labels_are_localized() {
        assert_eq!(DebitCreditType::Debit.label(), "借方");
        assert_eq!(DebitCreditType::Credit.label(), "貸方");
    }
}
