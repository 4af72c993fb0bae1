//! Strongly-typed identifiers used across the ledger.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Identifier of a journal (voucher).
///
/// Immutable once assigned. Leading/trailing whitespace is rejected rather
/// than trimmed so that the stored value is always the value the caller sent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoucherNumber(String);

impl VoucherNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, LedgerError> {
        let value = value.into();
        if value.is_empty() {
            return Err(LedgerError::validation("voucher number must not be empty"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(LedgerError::validation(format!(
                "voucher number must not contain whitespace: {value:?}"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a sibling identifier by appending `suffix`
    /// (e.g. the red slip of `J0001` is `J0001R`).
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix))
    }
}

impl core::fmt::Display for VoucherNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VoucherNumber {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VoucherNumber {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VoucherNumber> for String {
    fn from(value: VoucherNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for VoucherNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(VoucherNumber::new("").is_err());
        assert!(VoucherNumber::new("J 0001").is_err());
        assert!(VoucherNumber::new(" J0001").is_err());
    }

    #[test]
    fn suffix_derives_red_slip_number() {
        let v: VoucherNumber = "J0001".parse().unwrap();
        assert_eq!(v.with_suffix("R").as_str(), "J0001R");
    }

    #[test]
    fn deserialization_validates() {
        let ok: VoucherNumber = serde_json::from_str("\"J0002\"").unwrap();
        assert_eq!(ok.as_str(), "J0002");
        assert!(serde_json::from_str::<VoucherNumber>("\"\"").is_err());
    }
}
