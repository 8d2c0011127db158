//! Error types for the review steps.

use crate::types::MatchId;

/// Errors raised while applying human decisions to a phase result.
///
/// Matching itself never fails: malformed rows and unparseable premiums are
/// absorbed as empty names and zero premiums.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A decision names a match that is not part of the reviewed list.
    #[error("decision refers to unknown match {0}")]
    UnknownMatch(MatchId),
    /// More than one decision was submitted for the same match.
    #[error("more than one decision submitted for match {0}")]
    DuplicateDecision(MatchId),
}
