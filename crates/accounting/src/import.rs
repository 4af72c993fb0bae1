//! CSV journal import.
//!
//! Row format: `posting date, debit/credit label, account code, sub-account
//! code, department code, amount[, line summary]`. Rows sharing a posting date
//! and summary form one journal; each journal is posted in its own unit of
//! work so one bad group does not block the others.
//!
//! Each physical line is one row: a quoted field cannot span lines. Lines that
//! are not valid UTF-8 are reported and skipped; a read failure aborts the
//! import before anything is posted.

use core::str::FromStr;
use std::collections::HashMap;
use std::io::BufRead;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::command::{CreateJournalCommand, DebitCreditCommand, JournalDetailCommand};
use crate::repository::TransactionManager;
use crate::service::JournalService;

const MIN_COLUMNS: usize = 6;
const MAX_LINE_CONTENT: usize = 100;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub skip_header: bool,
    pub skip_empty_lines: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_header: true,
            skip_empty_lines: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportError {
    /// 1-based line in the input; 0 when the input itself could not be read.
    pub line_number: usize,
    pub message: String,
    pub line_content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Number of journals (row groups) attempted.
    pub total: usize,
    pub succeeded: usize,
    /// Blank lines skipped.
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

#[derive(Debug, Clone)]
struct CsvRow {
    line_number: usize,
    posting_date: NaiveDate,
    debit_credit_type: String,
    account_code: String,
    sub_account_code: String,
    department_code: String,
    amount: Decimal,
    line_summary: String,
}

impl<M> JournalService<M>
where
    M: TransactionManager,
{
    pub fn import_journals_from_csv<Rd: BufRead>(
        &self,
        input: Rd,
        options: ImportOptions,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        let mut rows = Vec::new();

        for (idx, bytes) in input.split(b'\n').enumerate() {
            let line_number = idx + 1;
            let mut bytes = match bytes {
                Ok(bytes) => bytes,
                Err(e) => {
                    // Nothing is posted from a partially read input.
                    warn!(line_number, error = %e, "journal import aborted");
                    return ImportReport {
                        errors: vec![ImportError {
                            line_number: 0,
                            message: format!("failed to read input: {e}"),
                            line_content: String::new(),
                        }],
                        ..ImportReport::default()
                    };
                }
            };
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }

            if options.skip_header && line_number == 1 {
                continue;
            }

            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(e) => {
                    report.errors.push(ImportError {
                        line_number,
                        message: format!("line is not valid UTF-8: {}", e.utf8_error()),
                        line_content: truncate(&String::from_utf8_lossy(e.as_bytes())),
                    });
                    continue;
                }
            };

            if options.skip_empty_lines && line.trim().is_empty() {
                report.skipped += 1;
                continue;
            }

            match parse_row(&line, line_number) {
                Ok(row) => rows.push(row),
                Err(message) => report.errors.push(ImportError {
                    line_number,
                    message,
                    line_content: truncate(&line),
                }),
            }
        }

        let groups = group_rows(rows);
        report.total = groups.len();

        for group in groups {
            let command = command_from_rows(&group);
            match self.create_journal(&command) {
                Ok(_) => report.succeeded += 1,
                Err(err) => {
                    warn!(
                        line_number = group[0].line_number,
                        error = %err,
                        "import group rejected"
                    );
                    report.errors.push(ImportError {
                        line_number: group[0].line_number,
                        message: err.to_string(),
                        line_content: group
                            .iter()
                            .map(|r| format!("line {}", r.line_number))
                            .collect::<Vec<_>>()
                            .join(", "),
                    });
                }
            }
        }

        info!(
            total = report.total,
            succeeded = report.succeeded,
            skipped = report.skipped,
            errors = report.errors.len(),
            "journal import finished"
        );
        report
    }
}

fn parse_row(line: &str, line_number: usize) -> Result<CsvRow, String> {
    let record = read_record(line)?;
    if record.len() < MIN_COLUMNS {
        return Err(format!(
            "expected at least {MIN_COLUMNS} columns, found {}",
            record.len()
        ));
    }

    let field = |i: usize| record.get(i).unwrap_or_default().to_string();

    let posting_date = parse_date(&field(0), line_number)?;
    let account_code = field(2);
    if account_code.is_empty() {
        return Err("account code is required".to_string());
    }
    let amount = parse_amount(&field(5), line_number)?;
    if amount <= Decimal::ZERO {
        return Err("amount must be positive".to_string());
    }

    Ok(CsvRow {
        line_number,
        posting_date,
        debit_credit_type: field(1),
        account_code,
        sub_account_code: field(3),
        department_code: field(4),
        amount,
        line_summary: field(6),
    })
}

fn read_record(line: &str) -> Result<StringRecord, String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(record),
        Ok(false) => Ok(StringRecord::new()),
        Err(e) => Err(format!("malformed CSV: {e}")),
    }
}

/// `yyyy/mm/dd` or `yyyy-mm-dd`.
fn parse_date(value: &str, line_number: usize) -> Result<NaiveDate, String> {
    if value.is_empty() {
        return Err("posting date is required".to_string());
    }
    let format = if value.contains('/') { "%Y/%m/%d" } else { "%Y-%m-%d" };
    NaiveDate::parse_from_str(value, format)
        .map_err(|_| format!("invalid date on line {line_number}: {value}"))
}

/// Thousands separators are accepted (`"1,000"`).
fn parse_amount(value: &str, line_number: usize) -> Result<Decimal, String> {
    if value.is_empty() {
        return Err("amount is required".to_string());
    }
    Decimal::from_str(&value.replace(',', ""))
        .map_err(|_| format!("invalid amount on line {line_number}: {value}"))
}

/// Group by (posting date, summary), keeping first-seen order.
fn group_rows(rows: Vec<CsvRow>) -> Vec<Vec<CsvRow>> {
    let mut index: HashMap<(NaiveDate, String), usize> = HashMap::new();
    let mut groups: Vec<Vec<CsvRow>> = Vec::new();

    for row in rows {
        let key = (row.posting_date, row.line_summary.clone());
        match index.get(&key) {
            Some(&i) => groups[i].push(row),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![row]);
            }
        }
    }
    groups
}

fn command_from_rows(rows: &[CsvRow]) -> CreateJournalCommand {
    let first = &rows[0];
    let optional = |s: &str| (!s.is_empty()).then(|| s.to_string());

    CreateJournalCommand {
        voucher_number: None,
        posting_date: first.posting_date,
        entry_date: None,
        voucher_type: Some("NORMAL".to_string()),
        closing_journal_flag: false,
        single_entry_flag: false,
        periodic_posting_flag: false,
        department_code: None,
        employee_code: None,
        details: vec![JournalDetailCommand {
            line_summary: first.line_summary.clone(),
            debit_credit_details: rows
                .iter()
                .map(|r| {
                    let mut cmd = DebitCreditCommand::new(
                        r.debit_credit_type.clone(),
                        r.account_code.clone(),
                        r.amount,
                    );
                    cmd.sub_account_code = optional(&r.sub_account_code);
                    cmd.department_code = optional(&r.department_code);
                    cmd
                })
                .collect(),
        }],
    }
}

fn truncate(line: &str) -> String {
    if line.chars().count() > MAX_LINE_CONTENT {
        let head: String = line.chars().take(MAX_LINE_CONTENT).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}
