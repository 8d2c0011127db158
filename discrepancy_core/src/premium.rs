//! Phase 2: premium comparison of confirmed matches and its review.

use rust_decimal::Decimal;

use crate::errors::Error;
use crate::review::index_decisions;
use crate::types::{
    ComparisonRecord, DiscrepancyStatus, MatchRecord, PremiumComparison, PremiumDecision,
    PremiumReviewOutcome, ReviewedDiscrepancy,
};

/// Absolute difference of two premium amounts, saturating at [`Decimal::MAX`].
pub fn premium_difference(a: Decimal, b: Decimal) -> Decimal {
    a.saturating_sub(b).abs()
}

/// Splits confirmed matches into perfect matches and discrepancies.
///
/// A match is perfect when the absolute difference of the two totals is at
/// most `tolerance`. The difference saturates at [`Decimal::MAX`].
pub fn compare_premiums(confirmed: &[MatchRecord], tolerance: Decimal) -> PremiumComparison {
    let mut comparison = PremiumComparison::default();

    for record in confirmed {
        let premium_diff =
            premium_difference(record.carrier.total_premium, record.payroll.total_premium);
        let premium_match = premium_diff <= tolerance;
        let compared = ComparisonRecord {
            record: record.clone(),
            premium_diff,
            premium_match,
        };

        if premium_match {
            comparison.perfect_matches.push(compared);
        } else {
            comparison.premium_discrepancies.push(compared);
        }
    }

    tracing::debug!(
        "premium comparison: {} perfect, {} discrepancies (tolerance {})",
        comparison.perfect_matches.len(),
        comparison.premium_discrepancies.len(),
        tolerance
    );

    comparison
}

/// Marks each discrepancy acknowledged or unresolved.
///
/// Perfect matches pass through. A discrepancy without an acknowledging
/// decision stays unresolved.
pub fn apply_premium_decisions(
    comparison: &PremiumComparison,
    decisions: &[PremiumDecision],
) -> Result<PremiumReviewOutcome, Error> {
    let verdicts = index_decisions(
        decisions.iter().map(|d| (d.match_id, d.acknowledged)),
        comparison.premium_discrepancies.iter().map(|c| c.id()),
    )?;

    let mut outcome = PremiumReviewOutcome {
        perfect_matches: comparison.perfect_matches.clone(),
        ..PremiumReviewOutcome::default()
    };

    for discrepancy in &comparison.premium_discrepancies {
        let acknowledged = verdicts.get(&discrepancy.id()).copied().unwrap_or(false);
        let reviewed = ReviewedDiscrepancy {
            comparison: discrepancy.clone(),
            status: if acknowledged {
                DiscrepancyStatus::Acknowledged
            } else {
                DiscrepancyStatus::Unresolved
            },
        };

        if acknowledged {
            outcome.acknowledged_discrepancies.push(reviewed);
        } else {
            outcome.unresolved_discrepancies.push(reviewed);
        }
    }

    Ok(outcome)
}
