use serde::{Deserialize, Serialize};

use super::{MatchId, MatchRecord};

/// Reviewer verdict on one fuzzy name match.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameDecision {
    pub match_id: MatchId,
    pub approved: bool,
}

impl NameDecision {
    pub fn approve(match_id: MatchId) -> Self {
        Self {
            match_id,
            approved: true,
        }
    }

    pub fn reject(match_id: MatchId) -> Self {
        Self {
            match_id,
            approved: false,
        }
    }

    /// Approves every listed match; used when review is skipped.
    pub fn approve_all(matches: &[MatchRecord]) -> Vec<Self> {
        matches.iter().map(|m| Self::approve(m.id)).collect()
    }
}

/// Reviewer verdict on one premium discrepancy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremiumDecision {
    pub match_id: MatchId,
    pub acknowledged: bool,
}

impl PremiumDecision {
    pub fn acknowledge(match_id: MatchId) -> Self {
        Self {
            match_id,
            acknowledged: true,
        }
    }
}
