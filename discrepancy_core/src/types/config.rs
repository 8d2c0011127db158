use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::{normalize_product_type, parse_premium, value_text};

/// One flat spreadsheet row as produced by the upstream parser: column header to cell value.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

pub const DEFAULT_NAME_MATCH_THRESHOLD: u8 = 80;

/// Column names used to read one source's rows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub last_name: String,
    pub first_name: String,
    pub premium: String,
    pub product_type: String,
}

impl FieldMapping {
    /// Default columns of a carrier enrollment export.
    pub fn carrier() -> Self {
        Self {
            last_name: "LAST".to_string(),
            first_name: "FIRST".to_string(),
            premium: "Monthly".to_string(),
            product_type: "Product Type".to_string(),
        }
    }

    /// Default columns of a payroll deduction export.
    pub fn payroll() -> Self {
        Self {
            last_name: "Last".to_string(),
            first_name: "First".to_string(),
            premium: "Monthly Premium".to_string(),
            product_type: "Benefit Plan".to_string(),
        }
    }

    /// Reads the mapped columns out of a raw row. Missing cells resolve to
    /// empty text and a zero premium.
    pub fn resolve(&self, raw: &Arc<RawRow>) -> SourceRow {
        let text = |field: &str| raw.get(field).map(value_text).unwrap_or_default();

        SourceRow {
            last_name: text(&self.last_name),
            first_name: text(&self.first_name),
            premium: raw
                .get(&self.premium)
                .map(parse_premium)
                .unwrap_or(Decimal::ZERO),
            product_type: normalize_product_type(&text(&self.product_type)),
            raw: Arc::clone(raw),
        }
    }
}

/// A raw row after column resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub last_name: String,
    pub first_name: String,
    pub premium: Decimal,
    pub product_type: String,
    pub raw: Arc<RawRow>,
}

/// Tunables for one analysis run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MatchOptions {
    pub carrier_fields: FieldMapping,
    pub payroll_fields: FieldMapping,
    /// Minimum weighted name similarity (0-100) for a fuzzy candidate.
    pub name_match_threshold: u8,
    /// Largest premium difference still treated as a match. Absorbs rounding
    /// noise between the two exports.
    pub premium_tolerance: Decimal,
}

impl MatchOptions {
    pub fn default_premium_tolerance() -> Decimal {
        Decimal::new(5, 2)
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            carrier_fields: FieldMapping::carrier(),
            payroll_fields: FieldMapping::payroll(),
            name_match_threshold: DEFAULT_NAME_MATCH_THRESHOLD,
            premium_tolerance: Self::default_premium_tolerance(),
        }
    }
}
