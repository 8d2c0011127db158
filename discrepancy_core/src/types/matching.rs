use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EmployeeRecord, NameKey};

/// Stable identifier of one carrier/payroll pairing.
///
/// Derived from both name keys, so the same pairing gets the same id when the
/// same data is analyzed again, and decisions can never land on a different
/// record after a reorder.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MatchId(Uuid);

impl MatchId {
    pub fn for_pair(carrier: &NameKey, payroll: &NameKey) -> Self {
        let parts = [carrier.last(), carrier.first(), payroll.last(), payroll.first()];
        let mut name = String::new();
        for part in parts {
            name.push_str(&part.len().to_string());
            name.push(':');
            name.push_str(part);
        }
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// How a pairing was found.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Learned,
    Fuzzy,
    FuzzyApproved,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Learned => "learned",
            Self::Fuzzy => "fuzzy",
            Self::FuzzyApproved => "fuzzy_approved",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A carrier employee paired with a payroll employee.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub id: MatchId,
    pub carrier: Arc<EmployeeRecord>,
    pub payroll: Arc<EmployeeRecord>,
    pub match_type: MatchType,
    /// Weighted name similarity, 0-100.
    pub similarity_score: u8,
}

impl MatchRecord {
    pub fn new(
        carrier: Arc<EmployeeRecord>,
        payroll: Arc<EmployeeRecord>,
        match_type: MatchType,
        similarity_score: u8,
    ) -> Self {
        Self {
            id: MatchId::for_pair(&carrier.key, &payroll.key),
            carrier,
            payroll,
            match_type,
            similarity_score,
        }
    }
}

/// A confirmed match with its premium comparison.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ComparisonRecord {
    #[serde(flatten)]
    pub record: MatchRecord,
    /// Absolute difference of the two totals.
    pub premium_diff: Decimal,
    pub premium_match: bool,
}

impl ComparisonRecord {
    pub fn id(&self) -> MatchId {
        self.record.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyStatus {
    Acknowledged,
    Unresolved,
}

/// A premium discrepancy after human review.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewedDiscrepancy {
    #[serde(flatten)]
    pub comparison: ComparisonRecord,
    pub status: DiscrepancyStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_id_is_deterministic() {
        let carrier = NameKey::new("SMITH", "JOHN");
        let payroll = NameKey::new("SMITH", "JON");
        assert_eq!(
            MatchId::for_pair(&carrier, &payroll),
            MatchId::for_pair(&carrier, &payroll)
        );
    }

    #[test]
    fn match_id_depends_on_orientation() {
        let a = NameKey::new("SMITH", "JOHN");
        let b = NameKey::new("SMITH", "JON");
        assert_ne!(MatchId::for_pair(&a, &b), MatchId::for_pair(&b, &a));
    }

    #[test]
    fn match_id_parts_do_not_bleed() {
        let a = MatchId::for_pair(&NameKey::new("AB", "C"), &NameKey::new("D", "E"));
        let b = MatchId::for_pair(&NameKey::new("A", "BC"), &NameKey::new("D", "E"));
        assert_ne!(a, b);
    }

    #[test]
    fn match_id_round_trips_through_text() {
        let id = MatchId::for_pair(&NameKey::new("A", "B"), &NameKey::new("C", "D"));
        let parsed: MatchId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<MatchId>().is_err());
    }

    #[test]
    fn match_type_serializes_snake_case() {
        let json = serde_json::to_string(&MatchType::FuzzyApproved).unwrap();
        assert_eq!(json, "\"fuzzy_approved\"");
    }
}
