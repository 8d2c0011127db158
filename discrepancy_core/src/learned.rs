//! Lookup of previously approved name mappings.

use std::collections::HashSet;
use std::sync::Arc;

use crate::types::{EmployeeRecord, EmployeeSet, NameKey, NameMapping};

/// Finds the payroll employee a learned mapping pairs with `carrier`.
///
/// Each mapping is tried in both orientations, since some mappings were
/// stored with the carrier and payroll sides swapped. Payroll employees in
/// `claimed` are skipped. The first usable mapping wins.
pub fn resolve_learned<'a>(
    carrier: &EmployeeRecord,
    payroll: &'a EmployeeSet,
    mappings: &[NameMapping],
    claimed: &HashSet<NameKey>,
) -> Option<&'a Arc<EmployeeRecord>> {
    let available = |key: &NameKey| {
        if claimed.contains(key) {
            None
        } else {
            payroll.get(key)
        }
    };

    for mapping in mappings {
        let carrier_side = mapping.carrier_key();
        let payroll_side = mapping.payroll_key();

        if carrier_side == carrier.key {
            if let Some(found) = available(&payroll_side) {
                return Some(found);
            }
        }

        if payroll_side == carrier.key {
            if let Some(found) = available(&carrier_side) {
                return Some(found);
            }
        }
    }

    None
}
