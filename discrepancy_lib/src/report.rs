//! JSON-ready views handed to reviewers and to the report renderer.

use std::sync::Arc;

use discrepancy_core::premium_difference;
use discrepancy_core::types::{
    ComparisonRecord, EmployeeRecord, MatchId, MatchRecord, MatchType, NameMatchResults,
    NameReviewOutcome, PremiumComparison, PremiumReviewOutcome, ProductLine, ReviewedDiscrepancy,
    SourceSummary,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::session::{SessionId, SessionPhase};

/// Formats a product line the way reviewers read it: `Dental: $52.75`.
pub fn product_label(line: &ProductLine) -> String {
    format!("{}: ${}", line.product_type, money(line.premium))
}

/// Two-decimal money text without the currency sign.
pub fn money(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// One fuzzy pairing awaiting a name decision.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FuzzyCandidate {
    pub match_id: MatchId,
    pub carrier_name: String,
    pub payroll_name: String,
    pub similarity_score: u8,
    pub carrier_premium: Decimal,
    pub payroll_premium: Decimal,
}

impl From<&MatchRecord> for FuzzyCandidate {
    fn from(record: &MatchRecord) -> Self {
        Self {
            match_id: record.id,
            carrier_name: record.carrier.display_name(),
            payroll_name: record.payroll.display_name(),
            similarity_score: record.similarity_score,
            carrier_premium: record.carrier.total_premium,
            payroll_premium: record.payroll.total_premium,
        }
    }
}

/// What the name reviewer sees after Phase 1.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NameReviewView {
    pub session_id: SessionId,
    pub phase: SessionPhase,
    pub summary: SourceSummary,
    pub exact_matches: usize,
    pub learned_matches: usize,
    pub fuzzy_matches: Vec<FuzzyCandidate>,
    pub unmatched_carrier: usize,
    pub unmatched_payroll: usize,
}

impl NameReviewView {
    pub fn new(session_id: SessionId, results: &NameMatchResults) -> Self {
        Self {
            session_id,
            phase: SessionPhase::NameReview,
            summary: results.summary.clone(),
            exact_matches: results.exact_matches.len(),
            learned_matches: results.learned_matches.len(),
            fuzzy_matches: results.fuzzy_matches.iter().map(FuzzyCandidate::from).collect(),
            unmatched_carrier: results.unmatched_carrier.len(),
            unmatched_payroll: results.unmatched_payroll.len(),
        }
    }
}

/// One premium discrepancy awaiting acknowledgement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiscrepancyView {
    pub match_id: MatchId,
    pub name: String,
    pub match_type: MatchType,
    pub carrier_premium: Decimal,
    pub payroll_premium: Decimal,
    pub premium_diff: Decimal,
    pub carrier_products: Vec<String>,
    pub payroll_products: Vec<String>,
}

impl From<&ComparisonRecord> for DiscrepancyView {
    fn from(compared: &ComparisonRecord) -> Self {
        let record = &compared.record;
        Self {
            match_id: record.id,
            name: record.carrier.display_name(),
            match_type: record.match_type,
            carrier_premium: record.carrier.total_premium,
            payroll_premium: record.payroll.total_premium,
            premium_diff: compared.premium_diff,
            carrier_products: record.carrier.products.iter().map(product_label).collect(),
            payroll_products: record.payroll.products.iter().map(product_label).collect(),
        }
    }
}

/// What the premium reviewer sees after Phase 2.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PremiumReviewView {
    pub session_id: SessionId,
    pub phase: SessionPhase,
    pub perfect_matches: usize,
    pub premium_discrepancies: Vec<DiscrepancyView>,
    pub unmatched_carrier: usize,
    pub unmatched_payroll: usize,
}

impl PremiumReviewView {
    pub fn new(
        session_id: SessionId,
        names: &NameReviewOutcome,
        comparison: &PremiumComparison,
    ) -> Self {
        Self {
            session_id,
            phase: SessionPhase::PremiumReview,
            perfect_matches: comparison.perfect_matches.len(),
            premium_discrepancies: comparison
                .premium_discrepancies
                .iter()
                .map(DiscrepancyView::from)
                .collect(),
            unmatched_carrier: names.unmatched_carrier.len(),
            unmatched_payroll: names.unmatched_payroll.len(),
        }
    }
}

/// The final partition of one analysis.
///
/// `unmatched_carrier` are employees missing from payroll, `unmatched_payroll`
/// employees missing from the carrier file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FinalReport {
    pub account: String,
    pub summary: SourceSummary,
    pub perfect_matches: Vec<ComparisonRecord>,
    pub acknowledged_discrepancies: Vec<ReviewedDiscrepancy>,
    pub unresolved_discrepancies: Vec<ReviewedDiscrepancy>,
    pub unmatched_carrier: Vec<Arc<EmployeeRecord>>,
    pub unmatched_payroll: Vec<Arc<EmployeeRecord>>,
}

/// Summary figures of a [`FinalReport`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportCounts {
    pub carrier_employees: usize,
    pub payroll_employees: usize,
    pub carrier_total_premium: Decimal,
    pub payroll_total_premium: Decimal,
    /// Absolute difference of the two source totals.
    pub premium_difference: Decimal,
    pub perfect_matches: usize,
    pub acknowledged_discrepancies: usize,
    pub unresolved_discrepancies: usize,
    pub missing_from_payroll: usize,
    pub missing_from_carrier: usize,
}

impl FinalReport {
    pub fn assemble(account: &str, names: &NameReviewOutcome, premiums: PremiumReviewOutcome) -> Self {
        Self {
            account: account.to_string(),
            summary: names.summary.clone(),
            perfect_matches: premiums.perfect_matches,
            acknowledged_discrepancies: premiums.acknowledged_discrepancies,
            unresolved_discrepancies: premiums.unresolved_discrepancies,
            unmatched_carrier: names.unmatched_carrier.clone(),
            unmatched_payroll: names.unmatched_payroll.clone(),
        }
    }

    pub fn counts(&self) -> ReportCounts {
        ReportCounts {
            carrier_employees: self.summary.carrier_employee_count,
            payroll_employees: self.summary.payroll_employee_count,
            carrier_total_premium: self.summary.carrier_total_premium,
            payroll_total_premium: self.summary.payroll_total_premium,
            premium_difference: premium_difference(
                self.summary.carrier_total_premium,
                self.summary.payroll_total_premium,
            ),
            perfect_matches: self.perfect_matches.len(),
            acknowledged_discrepancies: self.acknowledged_discrepancies.len(),
            unresolved_discrepancies: self.unresolved_discrepancies.len(),
            missing_from_payroll: self.unmatched_carrier.len(),
            missing_from_carrier: self.unmatched_payroll.len(),
        }
    }
}
