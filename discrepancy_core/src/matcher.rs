//! Phase 1: pairing carrier employees with payroll employees by name.

use std::collections::HashSet;
use std::sync::Arc;

use crate::aggregate::aggregate;
use crate::learned::resolve_learned;
use crate::similarity::name_similarity;
use crate::types::{
    EmployeeRecord, EmployeeSet, MatchOptions, MatchRecord, MatchType, NameKey, NameMapping,
    NameMatchResults, RawRow, SourceSummary,
};

/// Aggregates both row sets and runs the name matching passes.
pub fn find_name_matches(
    carrier_rows: &[RawRow],
    payroll_rows: &[RawRow],
    mappings: &[NameMapping],
    options: &MatchOptions,
) -> NameMatchResults {
    let carrier = aggregate(carrier_rows, &options.carrier_fields);
    let payroll = aggregate(payroll_rows, &options.payroll_fields);
    match_employees(&carrier, &payroll, mappings, options.name_match_threshold)
}

/// Pairs already aggregated employees.
///
/// # Matching tiers
/// 1. Exact: identical name keys (score 100)
/// 2. Learned: a stored mapping points at an unclaimed payroll employee
/// 3. Fuzzy: the best-scoring unclaimed payroll employee with
///    `name_similarity >= threshold`; the first of equal top scores wins
///
/// A payroll employee is claimed by at most one match. Carrier employees with
/// no match end in `unmatched_carrier`, unclaimed payroll employees in
/// `unmatched_payroll`.
pub fn match_employees(
    carrier: &EmployeeSet,
    payroll: &EmployeeSet,
    mappings: &[NameMapping],
    threshold: u8,
) -> NameMatchResults {
    let mut results = NameMatchResults {
        summary: SourceSummary {
            carrier_employee_count: carrier.len(),
            payroll_employee_count: payroll.len(),
            carrier_total_premium: carrier.total_premium(),
            payroll_total_premium: payroll.total_premium(),
        },
        ..NameMatchResults::default()
    };

    let mut claimed: HashSet<NameKey> = HashSet::new();

    // Exact tier
    for carrier_emp in carrier.iter() {
        if let Some(payroll_emp) = payroll.get(&carrier_emp.key) {
            claimed.insert(payroll_emp.key.clone());
            results.exact_matches.push(MatchRecord::new(
                Arc::clone(carrier_emp),
                Arc::clone(payroll_emp),
                MatchType::Exact,
                100,
            ));
        }
    }

    // Learned and fuzzy tiers
    for carrier_emp in carrier.iter() {
        if payroll.contains_key(&carrier_emp.key) {
            continue;
        }

        if let Some(payroll_emp) = resolve_learned(carrier_emp, payroll, mappings, &claimed) {
            claimed.insert(payroll_emp.key.clone());
            let score = pair_similarity(carrier_emp, payroll_emp);
            results.learned_matches.push(MatchRecord::new(
                Arc::clone(carrier_emp),
                Arc::clone(payroll_emp),
                MatchType::Learned,
                score,
            ));
            continue;
        }

        match best_fuzzy_candidate(carrier_emp, payroll, &claimed, threshold) {
            Some((payroll_emp, score)) => {
                claimed.insert(payroll_emp.key.clone());
                results.fuzzy_matches.push(MatchRecord::new(
                    Arc::clone(carrier_emp),
                    Arc::clone(payroll_emp),
                    MatchType::Fuzzy,
                    score,
                ));
            }
            None => results.unmatched_carrier.push(Arc::clone(carrier_emp)),
        }
    }

    results.unmatched_payroll = payroll
        .iter()
        .filter(|e| !claimed.contains(&e.key))
        .cloned()
        .collect();

    tracing::debug!(
        "name matching: {} exact, {} learned, {} fuzzy, {} unmatched carrier, {} unmatched payroll",
        results.exact_matches.len(),
        results.learned_matches.len(),
        results.fuzzy_matches.len(),
        results.unmatched_carrier.len(),
        results.unmatched_payroll.len()
    );

    results
}

fn pair_similarity(carrier: &EmployeeRecord, payroll: &EmployeeRecord) -> u8 {
    name_similarity(
        &carrier.last_name,
        &carrier.first_name,
        &payroll.last_name,
        &payroll.first_name,
    )
}

// Scans every unclaimed payroll employee; O(carrier x payroll) over a run.
fn best_fuzzy_candidate<'a>(
    carrier_emp: &EmployeeRecord,
    payroll: &'a EmployeeSet,
    claimed: &HashSet<NameKey>,
    threshold: u8,
) -> Option<(&'a Arc<EmployeeRecord>, u8)> {
    let mut best: Option<(&'a Arc<EmployeeRecord>, u8)> = None;

    for payroll_emp in payroll.iter() {
        if claimed.contains(&payroll_emp.key) {
            continue;
        }

        let score = pair_similarity(carrier_emp, payroll_emp);
        if score < threshold {
            continue;
        }

        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((payroll_emp, score)),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn employee(last: &str, first: &str, premium: i64) -> EmployeeRecord {
        let mut record = EmployeeRecord::new(last, first);
        record.total_premium = Decimal::new(premium, 2);
        record
    }

    fn set(records: Vec<EmployeeRecord>) -> EmployeeSet {
        EmployeeSet::from_records(records)
    }

    #[test]
    fn exact_tier() {
        let carrier = set(vec![employee("Smith", "John", 1000)]);
        let payroll = set(vec![employee("SMITH", "JOHN", 1000)]);
        let results = match_employees(&carrier, &payroll, &[], 80);

        assert_eq!(results.exact_matches.len(), 1);
        assert_eq!(results.exact_matches[0].similarity_score, 100);
        assert_eq!(results.exact_matches[0].match_type, MatchType::Exact);
        assert!(results.fuzzy_matches.is_empty());
        assert!(results.unmatched_carrier.is_empty());
        assert!(results.unmatched_payroll.is_empty());
    }

    #[test]
    fn fuzzy_tier_picks_best_score() {
        let carrier = set(vec![employee("Smith", "Jonathan", 0)]);
        let payroll = set(vec![
            employee("Smith", "Jonathon", 0),
            employee("Smith", "Jonathan R", 0),
        ]);
        let results = match_employees(&carrier, &payroll, &[], 80);

        assert_eq!(results.fuzzy_matches.len(), 1);
        let m = &results.fuzzy_matches[0];
        assert_eq!(m.payroll.first_name, "Jonathon");
        assert_eq!(m.similarity_score, 95);
        assert_eq!(results.unmatched_payroll.len(), 1);
    }

    #[test]
    fn fuzzy_tie_keeps_first_seen() {
        let carrier = set(vec![employee("Smith", "Jon", 0)]);
        let payroll = set(vec![employee("Smith", "Jan", 0), employee("Smith", "Jen", 0)]);
        let results = match_employees(&carrier, &payroll, &[], 80);

        assert_eq!(results.fuzzy_matches.len(), 1);
        assert_eq!(results.fuzzy_matches[0].payroll.first_name, "Jan");
    }

    #[test]
    fn threshold_is_inclusive() {
        // 0.6 * 100 + 0.4 * 50 = 80
        let carrier = set(vec![employee("Smith", "ABCD", 0)]);
        let payroll = set(vec![employee("Smith", "ABXY", 0)]);

        let at = match_employees(&carrier, &payroll, &[], 80);
        assert_eq!(at.fuzzy_matches.len(), 1);
        assert_eq!(at.fuzzy_matches[0].similarity_score, 80);

        let above = match_employees(&carrier, &payroll, &[], 81);
        assert!(above.fuzzy_matches.is_empty());
        assert_eq!(above.unmatched_carrier.len(), 1);
        assert_eq!(above.unmatched_payroll.len(), 1);
    }

    #[test]
    fn learned_tier_before_fuzzy() {
        let carrier = set(vec![employee("Johnson", "Bob", 0)]);
        let payroll = set(vec![
            employee("Johnson", "Rob", 0),
            employee("Johnson", "Robert", 0),
        ]);
        let mappings = vec![NameMapping {
            carrier_last_name: "Johnson".to_string(),
            carrier_first_name: "Bob".to_string(),
            payroll_last_name: "Johnson".to_string(),
            payroll_first_name: "Robert".to_string(),
            account_scope: String::new(),
        }];
        let results = match_employees(&carrier, &payroll, &mappings, 80);

        assert_eq!(results.learned_matches.len(), 1);
        let m = &results.learned_matches[0];
        assert_eq!(m.payroll.first_name, "Robert");
        assert_eq!(m.match_type, MatchType::Learned);
        assert_eq!(m.similarity_score, name_similarity("Johnson", "Bob", "Johnson", "Robert"));
        assert!(results.fuzzy_matches.is_empty());
        assert_eq!(results.unmatched_payroll.len(), 1);
        assert_eq!(results.unmatched_payroll[0].first_name, "Rob");
    }

    #[test]
    fn payroll_claimed_once() {
        let carrier = set(vec![employee("Smith", "Jon", 0), employee("Smith", "Jonn", 0)]);
        let payroll = set(vec![employee("Smith", "John", 0)]);
        let results = match_employees(&carrier, &payroll, &[], 80);

        assert_eq!(results.fuzzy_matches.len(), 1);
        assert_eq!(results.fuzzy_matches[0].carrier.first_name, "Jon");
        assert_eq!(results.unmatched_carrier.len(), 1);
        assert_eq!(results.unmatched_carrier[0].first_name, "Jonn");
        assert!(results.unmatched_payroll.is_empty());
    }

    #[test]
    fn exact_claims_before_fuzzy() {
        // The exact pair is claimed before the earlier carrier gets a fuzzy pass.
        let carrier = set(vec![employee("Smith", "Jon", 0), employee("Smith", "John", 0)]);
        let payroll = set(vec![employee("Smith", "John", 0)]);
        let results = match_employees(&carrier, &payroll, &[], 80);

        assert_eq!(results.exact_matches.len(), 1);
        assert!(results.fuzzy_matches.is_empty());
        assert_eq!(results.unmatched_carrier.len(), 1);
        assert_eq!(results.unmatched_carrier[0].first_name, "Jon");
    }

    #[test]
    fn summary_totals() {
        let carrier = set(vec![employee("A", "A", 1005), employee("B", "B", 250)]);
        let payroll = set(vec![employee("A", "A", 1000)]);
        let results = match_employees(&carrier, &payroll, &[], 80);

        assert_eq!(results.summary.carrier_employee_count, 2);
        assert_eq!(results.summary.payroll_employee_count, 1);
        assert_eq!(results.summary.carrier_total_premium, Decimal::new(1255, 2));
        assert_eq!(results.summary.payroll_total_premium, Decimal::new(1000, 2));
    }

    #[test]
    fn blank_names_do_not_fuzzy_match() {
        let carrier = set(vec![employee("", "", 100)]);
        let payroll = set(vec![employee("?", "", 100)]);
        let results = match_employees(&carrier, &payroll, &[], 0);

        // Scores 0 but a threshold of 0 still admits it.
        assert_eq!(results.fuzzy_matches.len(), 1);
        assert_eq!(results.fuzzy_matches[0].similarity_score, 0);

        let strict = match_employees(&carrier, &payroll, &[], 1);
        assert!(strict.fuzzy_matches.is_empty());
    }
}
