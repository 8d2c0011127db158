//! Input validation for user-supplied settings and identifiers.

use discrepancy_core::types::FieldMapping;
use rust_decimal::Decimal;

use crate::error::AnalyzerError;
use crate::settings::AnalysisSettings;

pub const MAX_FIELD_NAME_LENGTH: usize = 100;
pub const MAX_ACCOUNT_LENGTH: usize = 100;
pub const MAX_PERSON_NAME_LENGTH: usize = 100;
pub const MAX_PREMIUM_TOLERANCE: Decimal = Decimal::ONE_THOUSAND;

/// Enforce a byte limit, strip ASCII control characters, and trim.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, AnalyzerError> {
    if input.len() > max_len {
        return Err(AnalyzerError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    Ok(input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string())
}

/// Validate a name match threshold: an integer percentage 0-100.
pub fn validate_threshold(value: i64) -> Result<u8, AnalyzerError> {
    match u8::try_from(value) {
        Ok(threshold) if threshold <= 100 => Ok(threshold),
        _ => Err(AnalyzerError::InvalidInput(format!(
            "name match threshold must be between 0 and 100, got {}",
            value
        ))),
    }
}

/// Validate a premium tolerance: non-negative and at most 1000.
pub fn validate_tolerance(value: Decimal) -> Result<Decimal, AnalyzerError> {
    if value < Decimal::ZERO {
        return Err(AnalyzerError::InvalidInput(format!(
            "premium tolerance cannot be negative, got {}",
            value
        )));
    }
    if value > MAX_PREMIUM_TOLERANCE {
        return Err(AnalyzerError::InvalidInput(format!(
            "premium tolerance must be at most {}, got {}",
            MAX_PREMIUM_TOLERANCE, value
        )));
    }
    Ok(value)
}

/// Validate a session idle timeout in seconds. Zero would expire every
/// session before its first lookup.
pub fn validate_session_ttl(secs: u64) -> Result<u64, AnalyzerError> {
    if secs == 0 {
        return Err(AnalyzerError::InvalidInput(
            "session ttl must be at least 1 second".to_string(),
        ));
    }
    Ok(secs)
}

/// Validate a spreadsheet column name.
pub fn validate_field_name(name: &str) -> Result<String, AnalyzerError> {
    let sanitized = sanitize_text(name, MAX_FIELD_NAME_LENGTH)?;
    if sanitized.is_empty() {
        return Err(AnalyzerError::InvalidInput(
            "column name is empty".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate an employer account name. Empty is allowed and is its own
/// mapping scope.
pub fn validate_account(name: &str) -> Result<String, AnalyzerError> {
    sanitize_text(name, MAX_ACCOUNT_LENGTH)
}

/// Validate one half of an employee name entered by hand.
pub fn validate_person_name(name: &str) -> Result<String, AnalyzerError> {
    let sanitized = sanitize_text(name, MAX_PERSON_NAME_LENGTH)?;
    if sanitized.is_empty() {
        return Err(AnalyzerError::InvalidInput("name is empty".to_string()));
    }
    Ok(sanitized)
}

/// Validate every column of a field mapping. The four columns must be distinct.
pub fn validate_field_mapping(
    source: &str,
    fields: &FieldMapping,
) -> Result<FieldMapping, AnalyzerError> {
    let checked = FieldMapping {
        last_name: validate_field_name(&fields.last_name)?,
        first_name: validate_field_name(&fields.first_name)?,
        premium: validate_field_name(&fields.premium)?,
        product_type: validate_field_name(&fields.product_type)?,
    };

    let columns = [
        &checked.last_name,
        &checked.first_name,
        &checked.premium,
        &checked.product_type,
    ];
    for (i, column) in columns.iter().enumerate() {
        if columns[i + 1..].contains(column) {
            return Err(AnalyzerError::InvalidInput(format!(
                "{} column '{}' is mapped to more than one field",
                source, column
            )));
        }
    }

    Ok(checked)
}

/// Validate a full settings value, returning the sanitized copy.
pub fn validate_settings(settings: &AnalysisSettings) -> Result<AnalysisSettings, AnalyzerError> {
    Ok(AnalysisSettings {
        carrier_fields: validate_field_mapping("carrier", &settings.carrier_fields)?,
        payroll_fields: validate_field_mapping("payroll", &settings.payroll_fields)?,
        name_match_threshold: validate_threshold(i64::from(settings.name_match_threshold))?,
        premium_tolerance: validate_tolerance(settings.premium_tolerance)?,
        session_ttl_secs: validate_session_ttl(settings.session_ttl_secs)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Threshold --

    #[test]
    fn threshold_bounds() {
        assert_eq!(validate_threshold(0).unwrap(), 0);
        assert_eq!(validate_threshold(80).unwrap(), 80);
        assert_eq!(validate_threshold(100).unwrap(), 100);
    }

    #[test]
    fn threshold_out_of_range() {
        assert!(validate_threshold(101).is_err());
        assert!(validate_threshold(-1).is_err());
        assert!(validate_threshold(1000).is_err());
    }

    // -- Tolerance --

    #[test]
    fn tolerance_valid() {
        assert_eq!(validate_tolerance(Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(
            validate_tolerance(Decimal::new(5, 2)).unwrap(),
            Decimal::new(5, 2)
        );
        assert_eq!(
            validate_tolerance(Decimal::new(1000, 0)).unwrap(),
            Decimal::new(1000, 0)
        );
    }

    #[test]
    fn tolerance_invalid() {
        assert!(validate_tolerance(Decimal::new(-1, 2)).is_err());
        assert!(validate_tolerance(Decimal::new(100001, 2)).is_err());
    }

    // -- Field names --

    #[test]
    fn field_name_trims_and_strips_control() {
        assert_eq!(validate_field_name("  Monthly\t ").unwrap(), "Monthly");
        assert_eq!(validate_field_name("Pro\u{7}duct").unwrap(), "Product");
    }

    #[test]
    fn field_name_empty() {
        assert!(validate_field_name("").is_err());
        assert!(validate_field_name("   ").is_err());
    }

    #[test]
    fn field_name_too_long() {
        assert!(validate_field_name(&"x".repeat(101)).is_err());
        assert!(validate_field_name(&"x".repeat(100)).is_ok());
    }

    // -- Accounts --

    #[test]
    fn account_empty_allowed() {
        assert_eq!(validate_account("").unwrap(), "");
        assert_eq!(validate_account(" Acme Health ").unwrap(), "Acme Health");
    }

    #[test]
    fn account_too_long() {
        assert!(validate_account(&"a".repeat(101)).is_err());
    }

    // -- Person names --

    #[test]
    fn person_name() {
        assert_eq!(validate_person_name(" O'Brien ").unwrap(), "O'Brien");
        assert!(validate_person_name("\t").is_err());
        assert!(validate_person_name(&"n".repeat(101)).is_err());
    }

    // -- Field mappings and settings --

    #[test]
    fn duplicate_columns_rejected() {
        let fields = FieldMapping {
            last_name: "Name".to_string(),
            first_name: "Name".to_string(),
            premium: "Monthly".to_string(),
            product_type: "Plan".to_string(),
        };
        let err = validate_field_mapping("carrier", &fields).unwrap_err();
        assert!(err.to_string().contains("more than one field"));
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = AnalysisSettings::default();
        assert_eq!(validate_settings(&settings).unwrap(), settings);
    }

    #[test]
    fn settings_zero_ttl_rejected() {
        let settings = AnalysisSettings {
            session_ttl_secs: 0,
            ..AnalysisSettings::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(AnalyzerError::InvalidInput(_))
        ));
        assert_eq!(validate_session_ttl(1).unwrap(), 1);
    }

    #[test]
    fn settings_threshold_above_100() {
        let settings = AnalysisSettings {
            name_match_threshold: 150,
            ..AnalysisSettings::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(AnalyzerError::InvalidInput(_))
        ));
    }

    #[test]
    fn settings_sanitizes_columns() {
        let mut settings = AnalysisSettings::default();
        settings.carrier_fields.premium = " Monthly ".to_string();
        let checked = validate_settings(&settings).unwrap();
        assert_eq!(checked.carrier_fields.premium, "Monthly");
    }
}
