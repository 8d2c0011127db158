//! Error types for the library layer.

use std::fmt;

use crate::db::DbError;
use crate::session::{SessionId, SessionPhase};

/// Errors produced by the library layer, wrapping matcher and storage errors
/// and adding session, validation, and configuration failures.
#[derive(Debug)]
pub enum AnalyzerError {
    /// A reviewer decision was rejected by the matching engine.
    Matcher(discrepancy_core::Error),
    /// The learned-mapping store failed.
    Store(DbError),
    /// No live session with this id (never created, completed, or expired).
    SessionNotFound(SessionId),
    /// The session is not in the phase the operation requires.
    WrongPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    /// User-provided input failed validation.
    InvalidInput(String),
    /// A settings file could not be read or parsed.
    Config(String),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
}

impl fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matcher(e) => write!(f, "Matcher error: {}", e),
            Self::Store(e) => write!(f, "Mapping store error: {}", e),
            Self::SessionNotFound(id) => write!(f, "Session not found or expired: {}", id),
            Self::WrongPhase { expected, actual } => write!(
                f,
                "Session is in phase {} but this step requires {}",
                actual, expected
            ),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::Config(msg) => write!(f, "Config error: {}", msg),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for AnalyzerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Matcher(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<discrepancy_core::Error> for AnalyzerError {
    fn from(e: discrepancy_core::Error) -> Self {
        Self::Matcher(e)
    }
}

impl From<DbError> for AnalyzerError {
    fn from(e: DbError) -> Self {
        Self::Store(e)
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
