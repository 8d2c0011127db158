//! Grouping of flat product rows into per-employee records.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{Number, Value};

use crate::types::{EmployeeRecord, EmployeeSet, FieldMapping, NameKey, ProductLine, RawRow};

/// Substring (uppercase) to category label. Checked in order, first hit wins.
const PRODUCT_CATEGORIES: &[(&str, &str)] = &[
    ("ACCIDENT", "Accident"),
    ("CANCER", "Cancer"),
    ("CRITICAL", "Critical Illness"),
    ("DISABILITY", "Disability"),
    ("LIFE", "Life"),
    ("HOSPITAL", "Hospital"),
    ("DENTAL", "Dental"),
    ("VISION", "Vision"),
];

/// Groups rows by normalized employee name.
///
/// Rows sharing a [`NameKey`] collapse into one record: premiums are summed
/// and every row is kept as a [`ProductLine`]. Totals are rounded to cents
/// once all rows are in. Employees keep the order in which they were first seen.
pub fn aggregate(rows: &[RawRow], fields: &FieldMapping) -> EmployeeSet {
    let mut employees: Vec<EmployeeRecord> = Vec::new();
    let mut slots: HashMap<NameKey, usize> = HashMap::new();

    for raw in rows {
        let raw = Arc::new(raw.clone());
        let row = fields.resolve(&raw);
        let key = NameKey::new(&row.last_name, &row.first_name);

        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                employees.push(EmployeeRecord::new(&row.last_name, &row.first_name));
                slots.insert(key, employees.len() - 1);
                employees.len() - 1
            }
        };

        employees[slot].push_line(ProductLine {
            product_type: row.product_type,
            premium: row.premium,
            original_record: row.raw,
        });
    }

    for employee in &mut employees {
        employee.round_total();
    }

    tracing::debug!(
        "aggregated {} rows into {} employees",
        rows.len(),
        employees.len()
    );

    EmployeeSet::from_records(employees)
}

/// Parses a premium cell.
///
/// Numbers are taken as-is. Strings have `$` and `,` removed; a complete
/// number (`"$1,052.75"`, `"1.5e2"`) is read whole, otherwise the leading
/// decimal number is read (`"52.75 USD"`). Anything else, including blank or
/// non-numeric text, is zero.
pub fn parse_premium(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => number_to_decimal(n),
        Value::String(s) => parse_currency(s),
        _ => Decimal::ZERO,
    }
}

fn number_to_decimal(n: &Number) -> Decimal {
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .unwrap_or(Decimal::ZERO)
}

fn parse_currency(raw: &str) -> Decimal {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '$' | ',')).collect();
    let text = cleaned.trim();

    if let Ok(value) = Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)) {
        return value;
    }

    let (sign, rest) = match text.as_bytes().first() {
        Some(b'-') => ("-", &text[1..]),
        Some(b'+') => ("", &text[1..]),
        _ => ("", text),
    };

    let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let int_part = &rest[..int_len];
    let frac_part = match rest[int_len..].strip_prefix('.') {
        Some(tail) => &tail[..tail.bytes().take_while(u8::is_ascii_digit).count()],
        None => "",
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Decimal::ZERO;
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = if frac_part.is_empty() { "0" } else { frac_part };
    Decimal::from_str(&format!("{}{}.{}", sign, int_part, frac_part)).unwrap_or(Decimal::ZERO)
}

/// Maps a verbose plan or product name onto a short category label.
/// Unrecognized names pass through unchanged.
pub fn normalize_product_type(product_type: &str) -> String {
    if product_type.is_empty() {
        return String::new();
    }

    let upper = product_type.to_uppercase();
    for (needle, label) in PRODUCT_CATEGORIES {
        if upper.contains(needle) {
            return (*label).to_string();
        }
    }

    product_type.to_string()
}

/// Text content of a cell: strings are trimmed, numbers are printed, and
/// empty, `null`, `false`, and nested values read as empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<RawRow> {
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                _ => panic!("expected object"),
            })
            .collect()
    }

    #[test]
    fn test_parse_premium_number() {
        assert_eq!(parse_premium(&json!(52.75)), Decimal::new(5275, 2));
        assert_eq!(parse_premium(&json!(100)), Decimal::new(100, 0));
    }

    #[test]
    fn test_parse_premium_currency_string() {
        assert_eq!(parse_premium(&json!("$52.75")), Decimal::new(5275, 2));
        assert_eq!(parse_premium(&json!(" $1,234.50 ")), Decimal::new(123450, 2));
        assert_eq!(parse_premium(&json!("-$4.10")), Decimal::new(-410, 2));
    }

    #[test]
    fn test_parse_premium_leading_number_only() {
        assert_eq!(parse_premium(&json!("12.50 USD")), Decimal::new(1250, 2));
        assert_eq!(parse_premium(&json!(".5")), Decimal::new(5, 1));
        assert_eq!(parse_premium(&json!("7.")), Decimal::new(7, 0));
    }

    #[test]
    fn test_parse_premium_garbage_is_zero() {
        assert_eq!(parse_premium(&json!("N/A")), Decimal::ZERO);
        assert_eq!(parse_premium(&json!("")), Decimal::ZERO);
        assert_eq!(parse_premium(&json!(null)), Decimal::ZERO);
        assert_eq!(parse_premium(&json!(true)), Decimal::ZERO);
        assert_eq!(parse_premium(&json!("$")), Decimal::ZERO);
    }

    #[test]
    fn test_parse_premium_exponent_string() {
        assert_eq!(parse_premium(&json!("1.5e2")), Decimal::new(150, 0));
        assert_eq!(parse_premium(&json!("$2E1")), Decimal::new(20, 0));
        assert_eq!(parse_premium(&json!("1.5e2")), parse_premium(&json!(1.5e2)));
    }

    #[test]
    fn test_huge_premiums_saturate() {
        let max = "$79,228,162,514,264,337,593,543,950,335";
        let set = aggregate(
            &rows(vec![
                json!({"LAST": "Smith", "FIRST": "John", "Monthly": max}),
                json!({"LAST": "Smith", "FIRST": "John", "Monthly": "$1"}),
            ]),
            &FieldMapping::carrier(),
        );
        let smith = set.get(&NameKey::new("Smith", "John")).unwrap();
        assert_eq!(smith.total_premium, Decimal::MAX);
        assert_eq!(smith.products.len(), 2);
        assert_eq!(set.total_premium(), Decimal::MAX);
    }

    #[test]
    fn test_huge_source_total_saturates() {
        let big = "50,000,000,000,000,000,000,000,000,000";
        let set = aggregate(
            &rows(vec![
                json!({"LAST": "Smith", "FIRST": "John", "Monthly": big}),
                json!({"LAST": "Doe", "FIRST": "Jane", "Monthly": big}),
            ]),
            &FieldMapping::carrier(),
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_premium(), Decimal::MAX);
    }

    #[test]
    fn test_product_type_categories() {
        assert_eq!(normalize_product_type("Group Accident Plan"), "Accident");
        assert_eq!(normalize_product_type("critical illness 10k"), "Critical Illness");
        assert_eq!(normalize_product_type("Whole Life"), "Life");
        assert_eq!(normalize_product_type("Dental Insurance"), "Dental");
        assert_eq!(normalize_product_type("VISION"), "Vision");
    }

    #[test]
    fn test_product_type_first_match_wins() {
        assert_eq!(normalize_product_type("Accident Hospital Rider"), "Accident");
    }

    #[test]
    fn test_product_type_passthrough() {
        assert_eq!(normalize_product_type("Pet Insurance"), "Pet Insurance");
        assert_eq!(normalize_product_type(""), "");
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("  Smith ")), "Smith");
        assert_eq!(value_text(&json!(42)), "42");
        assert_eq!(value_text(&json!(null)), "");
        assert_eq!(value_text(&json!(false)), "");
    }

    #[test]
    fn test_aggregate_groups_and_sums() {
        let input = rows(vec![
            json!({"LAST": "Smith", "FIRST": "John", "Monthly": "$10.10", "Product Type": "Dental"}),
            json!({"LAST": "SMITH", "FIRST": "JOHN", "Monthly": 5.205, "Product Type": "Vision Plan"}),
            json!({"LAST": "Doe", "FIRST": "Jane", "Monthly": "$7.00", "Product Type": "Accident"}),
        ]);
        let set = aggregate(&input, &FieldMapping::carrier());
        assert_eq!(set.len(), 2);

        let smith = set.get(&NameKey::new("smith", "john")).unwrap();
        assert_eq!(smith.last_name, "Smith");
        assert_eq!(smith.total_premium, Decimal::new(1531, 2));
        assert_eq!(smith.products.len(), 2);
        assert_eq!(smith.products[1].product_type, "Vision");
        assert_eq!(smith.products[1].premium, Decimal::new(5205, 3));
        assert_eq!(smith.records.len(), 2);

        let order: Vec<_> = set.iter().map(|e| e.last_name.as_str()).collect();
        assert_eq!(order, vec!["Smith", "Doe"]);
        assert_eq!(set.total_premium(), Decimal::new(2231, 2));
    }

    #[test]
    fn test_aggregate_missing_columns() {
        let input = rows(vec![json!({"Something": "else"}), json!({})]);
        let set = aggregate(&input, &FieldMapping::carrier());
        assert_eq!(set.len(), 1);
        let blank = set.iter().next().unwrap();
        assert_eq!(blank.key.to_string(), "|");
        assert_eq!(blank.total_premium, Decimal::ZERO);
        assert_eq!(blank.products.len(), 2);
    }

    #[test]
    fn test_aggregate_empty() {
        let set = aggregate(&[], &FieldMapping::payroll());
        assert!(set.is_empty());
        assert_eq!(set.total_premium(), Decimal::ZERO);
    }
}
