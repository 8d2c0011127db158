use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ComparisonRecord, EmployeeRecord, MappingCandidate, MatchRecord, ReviewedDiscrepancy};

/// Head counts and premium totals of both sources.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SourceSummary {
    pub carrier_employee_count: usize,
    pub payroll_employee_count: usize,
    pub carrier_total_premium: Decimal,
    pub payroll_total_premium: Decimal,
}

/// Phase 1 output. Every carrier employee is in exactly one of the three match
/// lists or `unmatched_carrier`; every payroll employee is claimed by at most
/// one match or listed in `unmatched_payroll`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NameMatchResults {
    pub exact_matches: Vec<MatchRecord>,
    pub learned_matches: Vec<MatchRecord>,
    /// Candidates awaiting human review.
    pub fuzzy_matches: Vec<MatchRecord>,
    pub unmatched_carrier: Vec<Arc<EmployeeRecord>>,
    pub unmatched_payroll: Vec<Arc<EmployeeRecord>>,
    pub summary: SourceSummary,
}

/// Name review output: the matches Phase 2 operates on.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NameReviewOutcome {
    pub confirmed_matches: Vec<MatchRecord>,
    pub unmatched_carrier: Vec<Arc<EmployeeRecord>>,
    pub unmatched_payroll: Vec<Arc<EmployeeRecord>>,
    /// Approved fuzzy pairings to persist for future runs.
    pub approved_mappings: Vec<MappingCandidate>,
    pub summary: SourceSummary,
}

/// Phase 2 output.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PremiumComparison {
    pub perfect_matches: Vec<ComparisonRecord>,
    /// Discrepancies awaiting human review.
    pub premium_discrepancies: Vec<ComparisonRecord>,
}

/// Premium review output: the final three-way partition.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PremiumReviewOutcome {
    pub perfect_matches: Vec<ComparisonRecord>,
    pub acknowledged_discrepancies: Vec<ReviewedDiscrepancy>,
    pub unresolved_discrepancies: Vec<ReviewedDiscrepancy>,
}
