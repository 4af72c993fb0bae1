//! Posting and correction configuration.

use anyhow::{Context, bail};
use serde::Deserialize;

/// Which dates a red slip carries.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReversalDating {
    /// Same posting and entry dates as the reversed journal.
    #[default]
    Original,
    /// Posted and entered on the day of the cancellation.
    Today,
}

impl core::str::FromStr for ReversalDating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(ReversalDating::Original),
            "today" => Ok(ReversalDating::Today),
            other => bail!("unknown reversal dating {other:?} (expected `original` or `today`)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Prefix of generated voucher numbers.
    pub voucher_prefix: String,
    /// Appended to the original voucher number to name its red slip.
    pub red_slip_suffix: String,
    /// Appended to each line summary of a red slip.
    pub reversal_summary_suffix: String,
    pub reversal_dating: ReversalDating,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            voucher_prefix: "J".to_string(),
            red_slip_suffix: "R".to_string(),
            reversal_summary_suffix: " (reversal)".to_string(),
            reversal_dating: ReversalDating::Original,
        }
    }
}

impl JournalConfig {
    pub fn with_voucher_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.voucher_prefix = prefix.into();
        self
    }

    pub fn with_red_slip_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.red_slip_suffix = suffix.into();
        self
    }

    pub fn with_reversal_summary_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.reversal_summary_suffix = suffix.into();
        self
    }

    pub fn with_reversal_dating(mut self, dating: ReversalDating) -> Self {
        self.reversal_dating = dating;
        self
    }

    /// Load from `LEDGERPOST_*` environment variables, falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(prefix) = lookup("LEDGERPOST_VOUCHER_PREFIX") {
            config.voucher_prefix = prefix;
        }
        if let Some(suffix) = lookup("LEDGERPOST_RED_SLIP_SUFFIX") {
            config.red_slip_suffix = suffix;
        }
        if let Some(suffix) = lookup("LEDGERPOST_REVERSAL_SUMMARY_SUFFIX") {
            config.reversal_summary_suffix = suffix;
        }
        if let Some(dating) = lookup("LEDGERPOST_REVERSAL_DATING") {
            config.reversal_dating = dating
                .parse()
                .context("invalid LEDGERPOST_REVERSAL_DATING")?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.voucher_prefix.trim().is_empty() {
            bail!("voucher prefix must not be empty");
        }
        // An empty suffix would make the red slip collide with its original.
        if self.red_slip_suffix.trim().is_empty() {
            bail!("red slip suffix must not be empty");
        }
        if self
            .voucher_prefix
            .chars()
            .chain(self.red_slip_suffix.chars())
            .any(char::is_whitespace)
        {
            bail!("voucher prefix and red slip suffix must not contain whitespace");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_env() {
        let config = JournalConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, JournalConfig::default());
        assert_eq!(config.red_slip_suffix, "R");
    }

    #[test]
    fn env_overrides_are_read() {
        let config = JournalConfig::from_lookup(lookup(&[
            ("LEDGERPOST_VOUCHER_PREFIX", "GL"),
            ("LEDGERPOST_REVERSAL_DATING", "Today"),
        ]))
        .unwrap();
        assert_eq!(config.voucher_prefix, "GL");
        assert_eq!(config.reversal_dating, ReversalDating::Today);
    }

    #[test]
    fn empty_red_slip_suffix_is_rejected() {
        assert!(JournalConfig::from_lookup(lookup(&[("LEDGERPOST_RED_SLIP_SUFFIX", "")])).is_err());
    }

    #[test]
    fn unknown_dating_is_rejected() {
        let err = JournalConfig::from_lookup(lookup(&[("LEDGERPOST_REVERSAL_DATING", "tomorrow")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("tomorrow"));
    }
}
