//! Commands accepted from, and responses handed back to, the calling layer.
//!
//! Labels arrive as free strings (the UI speaks "借方"/"貸方"); they are mapped
//! to closed enums here and any label outside the mapping is an error, never a
//! silent default.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerpost_core::{Amount, LedgerError, LedgerResult, VoucherNumber};

use crate::balance;
use crate::journal::{
    DebitCreditType, Journal, JournalDebitCreditDetail, JournalDetail, JournalFlags,
    TaxCalculationType, TaxType, VoucherType,
};

/// Command: post a new journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJournalCommand {
    /// Operator-supplied voucher number; generated when absent.
    #[serde(default)]
    pub voucher_number: Option<String>,
    pub posting_date: NaiveDate,
    /// Defaults to the current date.
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    /// Defaults to `NORMAL`.
    #[serde(default)]
    pub voucher_type: Option<String>,
    #[serde(default)]
    pub closing_journal_flag: bool,
    #[serde(default)]
    pub single_entry_flag: bool,
    #[serde(default)]
    pub periodic_posting_flag: bool,
    #[serde(default)]
    pub department_code: Option<String>,
    #[serde(default)]
    pub employee_code: Option<String>,
    pub details: Vec<JournalDetailCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDetailCommand {
    #[serde(default)]
    pub line_summary: String,
    pub debit_credit_details: Vec<DebitCreditCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitCreditCommand {
    /// Localized side label ("借方" / "貸方", or "debit" / "credit").
    pub debit_credit_type: String,
    pub account_code: String,
    #[serde(default)]
    pub sub_account_code: Option<String>,
    #[serde(default)]
    pub department_code: Option<String>,
    #[serde(default)]
    pub project_code: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    #[serde(default)]
    pub base_currency_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_type: Option<String>,
    #[serde(default)]
    pub tax_rate: Option<u32>,
    #[serde(default)]
    pub tax_calc_type: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub cash_flow_flag: bool,
}

impl DebitCreditCommand {
    /// Minimal entry command: side label, account and amount.
    pub fn new(
        debit_credit_type: impl Into<String>,
        account_code: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            debit_credit_type: debit_credit_type.into(),
            account_code: account_code.into(),
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
        }
    }

    fn to_entry(&self) -> LedgerResult<JournalDebitCreditDetail> {
        let side = parse_debit_credit_type(&self.debit_credit_type)?;
        let amount = Amount::new(self.amount)?;

        JournalDebitCreditDetail::new(side, self.account_code.clone(), amount)?
            .with_sub_account_code(non_blank(&self.sub_account_code))
            .with_department_code(non_blank(&self.department_code))
            .with_project_code(non_blank(&self.project_code))
            .with_tax(
                parse_tax_type(self.tax_type.as_deref())?,
                self.tax_rate,
                parse_tax_calc_type(self.tax_calc_type.as_deref())?,
            )
            .with_due_date(self.due_date)
            .with_cash_flow_flag(self.cash_flow_flag)
            .with_foreign_currency(
                non_blank(&self.currency_code),
                self.exchange_rate,
                self.base_currency_amount,
            )
    }
}

impl CreateJournalCommand {
    /// Build the journal model. Line numbers are assigned 1..n in command order.
    ///
    /// Structural checks run here; balance is left to [`crate::balance::validate`].
    pub fn to_journal(
        &self,
        voucher_number: VoucherNumber,
        today: NaiveDate,
    ) -> LedgerResult<Journal> {
        let mut details = Vec::with_capacity(self.details.len());
        for (idx, detail) in self.details.iter().enumerate() {
            let entries = detail
                .debit_credit_details
                .iter()
                .map(DebitCreditCommand::to_entry)
                .collect::<LedgerResult<Vec<_>>>()?;
            let line_number = u32::try_from(idx + 1)
                .map_err(|_| LedgerError::validation("too many journal lines"))?;
            details.push(JournalDetail::new(line_number, detail.line_summary.clone(), entries)?);
        }

        Ok(Journal::new(
            voucher_number,
            self.posting_date,
            self.entry_date.unwrap_or(today),
            details,
        )?
        .with_voucher_type(parse_voucher_type(self.voucher_type.as_deref())?)
        .with_flags(JournalFlags {
            closing_journal: self.closing_journal_flag,
            single_entry: self.single_entry_flag,
            periodic_posting: self.periodic_posting_flag,
        })
        .with_department_code(non_blank(&self.department_code))
        .with_employee_code(non_blank(&self.employee_code)))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Total mapping from the external side label.
pub fn parse_debit_credit_type(label: &str) -> LedgerResult<DebitCreditType> {
    match label.trim() {
        "借方" => Ok(DebitCreditType::Debit),
        "貸方" => Ok(DebitCreditType::Credit),
        other if other.eq_ignore_ascii_case("debit") => Ok(DebitCreditType::Debit),
        other if other.eq_ignore_ascii_case("credit") => Ok(DebitCreditType::Credit),
        other => Err(LedgerError::UnknownDebitCreditType(other.to_string())),
    }
}

/// Absent or blank means `Normal`.
pub fn parse_voucher_type(code: Option<&str>) -> LedgerResult<VoucherType> {
    match code.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(VoucherType::Normal),
        Some(s) if s.eq_ignore_ascii_case("normal") => Ok(VoucherType::Normal),
        Some(s) if s.eq_ignore_ascii_case("auto") => Ok(VoucherType::Auto),
        Some(s) => Err(LedgerError::unknown_label("voucher type", s)),
    }
}

pub fn parse_tax_type(code: Option<&str>) -> LedgerResult<Option<TaxType>> {
    let Some(code) = code.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match code.to_ascii_uppercase().as_str() {
        "TAXABLE" => Ok(Some(TaxType::Taxable)),
        "NON_TAXABLE" => Ok(Some(TaxType::NonTaxable)),
        "EXEMPT" => Ok(Some(TaxType::Exempt)),
        "OUT_OF_SCOPE" => Ok(Some(TaxType::OutOfScope)),
        _ => Err(LedgerError::unknown_label("tax type", code)),
    }
}

pub fn parse_tax_calc_type(code: Option<&str>) -> LedgerResult<Option<TaxCalculationType>> {
    let Some(code) = code.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match code.to_ascii_uppercase().as_str() {
        "EXCLUSIVE" => Ok(Some(TaxCalculationType::Exclusive)),
        "INCLUSIVE" => Ok(Some(TaxCalculationType::Inclusive)),
        _ => Err(LedgerError::unknown_label("tax calculation type", code)),
    }
}

/// Read model handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalResponse {
    pub voucher_number: String,
    pub posting_date: NaiveDate,
    pub entry_date: NaiveDate,
    pub voucher_type: VoucherType,
    pub closing_journal_flag: bool,
    pub single_entry_flag: bool,
    pub periodic_posting_flag: bool,
    pub department_code: Option<String>,
    pub employee_code: Option<String>,
    pub red_slip_flag: bool,
    pub red_black_voucher_number: Option<u32>,
    pub debit_total: Decimal,
    pub credit_total: Decimal,
    pub details: Vec<JournalDetailResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDetailResponse {
    pub line_number: u32,
    pub line_summary: String,
    pub debit_credit_details: Vec<DebitCreditDetailResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitCreditDetailResponse {
    /// Localized label, mirroring what the command accepted.
    pub debit_credit_type: String,
    pub account_code: String,
    pub sub_account_code: Option<String>,
    pub department_code: Option<String>,
    pub project_code: Option<String>,
    pub amount: Decimal,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub base_currency_amount: Option<Decimal>,
    pub tax_type: Option<TaxType>,
    pub tax_rate: Option<u32>,
    pub tax_calc_type: Option<TaxCalculationType>,
    pub due_date: Option<NaiveDate>,
    pub cash_flow_flag: bool,
}

impl From<&Journal> for JournalResponse {
    fn from(journal: &Journal) -> Self {
        let totals = balance::totals(journal);
        let flags = journal.flags();
        Self {
            voucher_number: journal.voucher_number().to_string(),
            posting_date: journal.posting_date(),
            entry_date: journal.entry_date(),
            voucher_type: journal.voucher_type(),
            closing_journal_flag: flags.closing_journal,
            single_entry_flag: flags.single_entry,
            periodic_posting_flag: flags.periodic_posting,
            department_code: journal.department_code().map(str::to_string),
            employee_code: journal.employee_code().map(str::to_string),
            red_slip_flag: journal.red_slip_flag(),
            red_black_voucher_number: journal.red_black_voucher_number(),
            debit_total: totals.debit_total,
            credit_total: totals.credit_total,
            details: journal
                .details()
                .iter()
                .map(|d| JournalDetailResponse {
                    line_number: d.line_number(),
                    line_summary: d.line_summary().to_string(),
                    debit_credit_details: d
                        .entries()
                        .iter()
                        .map(DebitCreditDetailResponse::from)
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<&JournalDebitCreditDetail> for DebitCreditDetailResponse {
    fn from(e: &JournalDebitCreditDetail) -> Self {
        Self {
            debit_credit_type: e.debit_credit_type().label().to_string(),
            account_code: e.account_code().to_string(),
            sub_account_code: e.sub_account_code().map(str::to_string),
            department_code: e.department_code().map(str::to_string),
            project_code: e.project_code().map(str::to_string),
            amount: e.amount().value(),
            currency_code: e.currency_code().map(str::to_string),
            exchange_rate: e.exchange_rate(),
            base_currency_amount: e.base_currency_amount(),
            tax_type: e.tax_type(),
            tax_rate: e.tax_rate(),
            tax_calc_type: e.tax_calc_type(),
            due_date: e.due_date(),
            cash_flow_flag: e.cash_flow_flag(),
        }
    }
}

/// Voucher numbers produced by a red-black correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionResult {
    pub red_slip_number: VoucherNumber,
    pub black_slip_number: VoucherNumber,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
    }

    fn command(debit_label: &str, credit_label: &str) -> CreateJournalCommand {
        CreateJournalCommand {
            voucher_number: None,
            posting_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            entry_date: None,
            voucher_type: None,
            closing_journal_flag: false,
            single_entry_flag: false,
            periodic_posting_flag: false,
            department_code: Some("  ".to_string()),
            employee_code: Some("EMP001".to_string()),
            details: vec![JournalDetailCommand {
                line_summary: "cash sale".to_string(),
                debit_credit_details: vec![
                    DebitCreditCommand::new(debit_label, "11110", Decimal::from(10_000)),
                    DebitCreditCommand::new(credit_label, "41100", Decimal::from(10_000)),
                ],
            }],
        }
    }

    #[test]
    fn side_labels_map_totally() {
        assert_eq!(parse_debit_credit_type("借方").unwrap(), DebitCreditType::Debit);
        assert_eq!(parse_debit_credit_type("貸方").unwrap(), DebitCreditType::Credit);
        assert_eq!(parse_debit_credit_type("DEBIT").unwrap(), DebitCreditType::Debit);
        assert_eq!(parse_debit_credit_type("credit").unwrap(), DebitCreditType::Credit);
        assert_eq!(
            parse_debit_credit_type("左"),
            Err(LedgerError::UnknownDebitCreditType("左".to_string()))
        );
    }

    #[test]
    fn voucher_type_defaults_to_normal_but_rejects_unknown() {
        assert_eq!(parse_voucher_type(None).unwrap(), VoucherType::Normal);
        assert_eq!(parse_voucher_type(Some("AUTO")).unwrap(), VoucherType::Auto);
        assert!(matches!(
            parse_voucher_type(Some("CLOSING")),
            Err(LedgerError::UnknownLabel { field: "voucher type", .. })
        ));
    }

    #[test]
    fn tax_labels_parse() {
        assert_eq!(parse_tax_type(Some("TAXABLE")).unwrap(), Some(TaxType::Taxable));
        assert_eq!(parse_tax_type(Some("")).unwrap(), None);
        assert!(parse_tax_type(Some("VAT")).is_err());
        assert_eq!(
            parse_tax_calc_type(Some("inclusive")).unwrap(),
            Some(TaxCalculationType::Inclusive)
        );
    }

    #[test]
    fn command_builds_journal_with_numbered_lines() {
        let journal = command("借方", "貸方")
            .to_journal(VoucherNumber::new("J0100").unwrap(), today())
            .unwrap();

        assert_eq!(journal.details()[0].line_number(), 1);
        assert_eq!(journal.entry_date(), today());
        assert_eq!(journal.voucher_type(), VoucherType::Normal);
        assert_eq!(journal.department_code(), None);
        assert_eq!(journal.employee_code(), Some("EMP001"));
        assert!(journal.is_balanced());
    }

    #[test]
    fn unknown_side_label_fails_build() {
        let err = command("借方", "右")
            .to_journal(VoucherNumber::new("J0100").unwrap(), today())
            .unwrap_err();
        assert_eq!(err, LedgerError::UnknownDebitCreditType("右".to_string()));
    }

    #[test]
    fn zero_amount_fails_build() {
        let mut cmd = command("借方", "貸方");
        cmd.details[0].debit_credit_details[0].amount = Decimal::ZERO;
        let err = cmd
            .to_journal(VoucherNumber::new("J0100").unwrap(), today())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(msg) if msg.contains("positive")));
    }

    #[test]
    fn command_deserializes_from_camel_case_json() {
        let json = r#"{
            "postingDate": "2024-04-01",
            "details": [{
                "lineSummary": "rent",
                "debitCreditDetails": [
                    {"debitCreditType": "借方", "accountCode": "62100", "amount": "150000"},
                    {"debitCreditType": "貸方", "accountCode": "11130", "amount": "150000", "taxType": "TAXABLE", "taxRate": 10}
                ]
            }]
        }"#;
        let cmd: CreateJournalCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.details[0].debit_credit_details[1].tax_rate, Some(10));
        assert!(cmd.voucher_number.is_none());
    }

    #[test]
    fn response_exposes_totals_and_labels() {
        let journal = command("debit", "credit")
            .to_journal(VoucherNumber::new("J0100").unwrap(), today())
            .unwrap();
        let response = JournalResponse::from(&journal);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["voucherNumber"], "J0100");
        assert_eq!(json["voucherType"], "NORMAL");
        assert_eq!(json["debitTotal"], "10000");
        assert_eq!(json["creditTotal"], "10000");
        assert_eq!(json["details"][0]["debitCreditDetails"][0]["debitCreditType"], "借方");
    }
}
