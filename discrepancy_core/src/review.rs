//! Applying reviewer decisions on fuzzy name matches.

use std::collections::{HashMap, HashSet};

use crate::errors::Error;
use crate::types::{
    MappingCandidate, MatchId, MatchType, NameDecision, NameMatchResults, NameReviewOutcome,
};

/// Confirms or rejects the fuzzy matches of a Phase 1 result.
///
/// Exact and learned matches are confirmed without review. A fuzzy match is
/// confirmed (as `fuzzy_approved`) only when a decision approves it; a
/// missing decision counts as a rejection, and both sides of a rejected
/// match go back to the unmatched lists. Every approval yields a
/// [`MappingCandidate`] for the learning store.
pub fn apply_name_decisions(
    results: &NameMatchResults,
    decisions: &[NameDecision],
) -> Result<NameReviewOutcome, Error> {
    let verdicts = index_decisions(
        decisions.iter().map(|d| (d.match_id, d.approved)),
        results.fuzzy_matches.iter().map(|m| m.id),
    )?;

    let mut outcome = NameReviewOutcome {
        confirmed_matches: results
            .exact_matches
            .iter()
            .chain(&results.learned_matches)
            .cloned()
            .collect(),
        unmatched_carrier: results.unmatched_carrier.clone(),
        unmatched_payroll: results.unmatched_payroll.clone(),
        approved_mappings: Vec::new(),
        summary: results.summary.clone(),
    };

    for candidate in &results.fuzzy_matches {
        if verdicts.get(&candidate.id).copied().unwrap_or(false) {
            let mut confirmed = candidate.clone();
            confirmed.match_type = MatchType::FuzzyApproved;
            outcome.approved_mappings.push(MappingCandidate {
                carrier_last_name: candidate.carrier.last_name.clone(),
                carrier_first_name: candidate.carrier.first_name.clone(),
                payroll_last_name: candidate.payroll.last_name.clone(),
                payroll_first_name: candidate.payroll.first_name.clone(),
            });
            outcome.confirmed_matches.push(confirmed);
        } else {
            outcome.unmatched_carrier.push(candidate.carrier.clone());
            outcome.unmatched_payroll.push(candidate.payroll.clone());
        }
    }

    tracing::debug!(
        "name review: {} confirmed, {} newly approved",
        outcome.confirmed_matches.len(),
        outcome.approved_mappings.len()
    );

    Ok(outcome)
}

/// Collects `(id, verdict)` pairs, rejecting ids outside `known` and repeated ids.
pub(crate) fn index_decisions(
    decisions: impl IntoIterator<Item = (MatchId, bool)>,
    known: impl IntoIterator<Item = MatchId>,
) -> Result<HashMap<MatchId, bool>, Error> {
    let known: HashSet<MatchId> = known.into_iter().collect();
    let mut verdicts = HashMap::new();

    for (id, verdict) in decisions {
        if !known.contains(&id) {
            return Err(Error::UnknownMatch(id));
        }
        if verdicts.insert(id, verdict).is_some() {
            return Err(Error::DuplicateDecision(id));
        }
    }

    Ok(verdicts)
}
