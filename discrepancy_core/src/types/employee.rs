use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RawRow;
use crate::normalize::{normalize_name, round_cents};

/// Normalized `(last, first)` name used for exact lookups.
///
/// Equality is structural, so a literal `|` inside a name never makes two
/// different people share a key even though the display form joins the
/// parts with `|`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey {
    last: String,
    first: String,
}

impl NameKey {
    pub fn new(last: &str, first: &str) -> Self {
        Self {
            last: normalize_name(last),
            first: normalize_name(first),
        }
    }

    pub fn last(&self) -> &str {
        &self.last
    }

    pub fn first(&self) -> &str {
        &self.first
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.last, self.first)
    }
}

/// One premium line item from a source row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductLine {
    pub product_type: String,
    pub premium: Decimal,
    pub original_record: Arc<RawRow>,
}

/// Per-person totals for one data source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EmployeeRecord {
    /// Last name as first seen in the source, trimmed but not normalized.
    pub last_name: String,
    pub first_name: String,
    pub key: NameKey,
    /// Sum of `products` premiums, rounded to cents.
    pub total_premium: Decimal,
    pub products: Vec<ProductLine>,
    pub records: Vec<Arc<RawRow>>,
}

impl EmployeeRecord {
    pub fn new(last_name: &str, first_name: &str) -> Self {
        Self {
            last_name: last_name.to_string(),
            first_name: first_name.to_string(),
            key: NameKey::new(last_name, first_name),
            total_premium: Decimal::ZERO,
            products: Vec::new(),
            records: Vec::new(),
        }
    }

    /// "LAST, FIRST" as shown to reviewers.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Totals saturate at [`Decimal::MAX`] rather than overflow.
    pub(crate) fn push_line(&mut self, line: ProductLine) {
        self.total_premium = self.total_premium.saturating_add(line.premium);
        self.records.push(Arc::clone(&line.original_record));
        self.products.push(line);
    }

    pub(crate) fn round_total(&mut self) {
        self.total_premium = round_cents(self.total_premium);
    }
}

/// Employees of one source keyed by [`NameKey`], iterated in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct EmployeeSet {
    employees: Vec<Arc<EmployeeRecord>>,
    index: HashMap<NameKey, usize>,
}

impl EmployeeSet {
    /// Builds a set from finished records. A later record with an already
    /// seen key is dropped; callers aggregate duplicates before this point.
    pub fn from_records(records: impl IntoIterator<Item = EmployeeRecord>) -> Self {
        let mut set = Self::default();
        for record in records {
            if set.index.contains_key(&record.key) {
                continue;
            }
            set.index.insert(record.key.clone(), set.employees.len());
            set.employees.push(Arc::new(record));
        }
        set
    }

    pub fn get(&self, key: &NameKey) -> Option<&Arc<EmployeeRecord>> {
        self.index.get(key).map(|&slot| &self.employees[slot])
    }

    pub fn contains_key(&self, key: &NameKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EmployeeRecord>> {
        self.employees.iter()
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// Sum of every employee total, rounded to cents. Saturates like
    /// [`EmployeeRecord::total_premium`].
    pub fn total_premium(&self) -> Decimal {
        round_cents(
            self.employees
                .iter()
                .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.total_premium)),
        )
    }
}
