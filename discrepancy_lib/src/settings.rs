//! Analysis settings: TOML file, environment overrides, defaults.

use std::path::Path;
use std::str::FromStr;

use discrepancy_core::types::{FieldMapping, MatchOptions, DEFAULT_NAME_MATCH_THRESHOLD};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;

pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

pub const ENV_NAME_THRESHOLD: &str = "DISCREPANCY_NAME_THRESHOLD";
pub const ENV_PREMIUM_TOLERANCE: &str = "DISCREPANCY_PREMIUM_TOLERANCE";
pub const ENV_SESSION_TTL_SECS: &str = "DISCREPANCY_SESSION_TTL_SECS";

/// Everything one analysis run can be tuned with.
///
/// Every field has a default, so a partial TOML file is valid:
///
/// ```toml
/// name_match_threshold = 85
/// premium_tolerance = "0.10"
///
/// [payroll_fields]
/// last_name = "Employee Last"
/// first_name = "Employee First"
/// premium = "Deduction"
/// product_type = "Plan"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisSettings {
    pub carrier_fields: FieldMapping,
    pub payroll_fields: FieldMapping,
    pub name_match_threshold: u8,
    pub premium_tolerance: Decimal,
    /// Idle lifetime of a review session.
    pub session_ttl_secs: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            carrier_fields: FieldMapping::carrier(),
            payroll_fields: FieldMapping::payroll(),
            name_match_threshold: DEFAULT_NAME_MATCH_THRESHOLD,
            premium_tolerance: MatchOptions::default_premium_tolerance(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl AnalysisSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, AnalyzerError> {
        toml::from_str(content)
            .map_err(|e| AnalyzerError::Config(format!("failed to parse settings: {}", e)))
    }

    /// Reads a TOML settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies the `DISCREPANCY_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Values that do not parse are ignored
    /// with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(threshold) = parse_override::<u8>(&lookup, ENV_NAME_THRESHOLD) {
            self.name_match_threshold = threshold;
        }
        if let Some(tolerance) = parse_override::<Decimal>(&lookup, ENV_PREMIUM_TOLERANCE) {
            self.premium_tolerance = tolerance;
        }
        if let Some(ttl) = parse_override::<u64>(&lookup, ENV_SESSION_TTL_SECS) {
            self.session_ttl_secs = ttl;
        }
        self
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            carrier_fields: self.carrier_fields.clone(),
            payroll_fields: self.payroll_fields.clone(),
            name_match_threshold: self.name_match_threshold,
            premium_tolerance: self.premium_tolerance,
        }
    }
}

fn parse_override<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let settings = AnalysisSettings::default();
        assert_eq!(settings.name_match_threshold, 80);
        assert_eq!(settings.premium_tolerance, Decimal::new(5, 2));
        assert_eq!(settings.session_ttl_secs, 3600);
        assert_eq!(settings.match_options(), MatchOptions::default());
    }

    #[test]
    fn empty_toml_is_default() {
        let settings = AnalysisSettings::from_toml_str("").unwrap();
        assert_eq!(settings, AnalysisSettings::default());
    }

    #[test]
    fn partial_toml() {
        let settings = AnalysisSettings::from_toml_str(
            r#"
name_match_threshold = 90
premium_tolerance = "0.10"

[payroll_fields]
last_name = "Employee Last"
first_name = "Employee First"
premium = "Deduction"
product_type = "Plan"
"#,
        )
        .unwrap();

        assert_eq!(settings.name_match_threshold, 90);
        assert_eq!(settings.premium_tolerance, Decimal::new(10, 2));
        assert_eq!(settings.payroll_fields.premium, "Deduction");
        assert_eq!(settings.carrier_fields, FieldMapping::carrier());
        assert_eq!(settings.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = AnalysisSettings::from_toml_str("name_match_threshold = \"high\"").unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }

    #[test]
    fn load_missing_file() {
        let err = AnalysisSettings::load("/nonexistent/settings.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn overrides_apply() {
        let settings = AnalysisSettings::default().with_overrides(lookup(&[
            (ENV_NAME_THRESHOLD, "72"),
            (ENV_PREMIUM_TOLERANCE, "0.25"),
            (ENV_SESSION_TTL_SECS, "60"),
        ]));
        assert_eq!(settings.name_match_threshold, 72);
        assert_eq!(settings.premium_tolerance, Decimal::new(25, 2));
        assert_eq!(settings.session_ttl_secs, 60);
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let settings = AnalysisSettings::default().with_overrides(lookup(&[
            (ENV_NAME_THRESHOLD, "300"),
            (ENV_PREMIUM_TOLERANCE, "cheap"),
            (ENV_SESSION_TTL_SECS, "-5"),
        ]));
        assert_eq!(settings, AnalysisSettings::default());
    }
}
