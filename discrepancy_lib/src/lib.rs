//! Library layer for the discrepancy analyzer: review sessions, learned-mapping
//! storage, settings, validation, and reviewer-facing views.
//!
//! Wraps the pure `discrepancy_core` matching engine with the state that lives
//! between review steps.

pub mod db;
pub mod error;
pub mod report;
pub mod session;
pub mod settings;
pub mod store;
pub mod validation;
pub mod workflow;

pub use discrepancy_core;
pub use discrepancy_core::types;

pub use db::{AccountSummary, Db, DbError, StoredMapping};
pub use error::AnalyzerError;
pub use report::{
    DiscrepancyView, FinalReport, FuzzyCandidate, NameReviewView, PremiumReviewView, ReportCounts,
};
pub use session::{AnalysisSession, SessionId, SessionPhase, SessionStore};
pub use settings::AnalysisSettings;
pub use store::{MappingStore, MemoryMappingStore};
pub use workflow::{AnalysisRequest, Analyzer, NameStep};
