//! The review workflow: Phase 1, name review, Phase 2, premium review.
//!
//! ```text
//! analyze ──> NameReview ──submit_names──> PremiumReview ──submit_premiums──> Complete
//!                  │  └──submit_names(finish)─────────────────────────────────────┘
//!                  └──skip_review (auto-approve fuzzy)────────────────────────────┘
//! ```
//!
//! Each transition runs with the session locked. A call made in the wrong
//! phase fails with [`AnalyzerError::WrongPhase`] and leaves the session as it
//! was. Completed sessions are dropped from the store.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use discrepancy_core::types::{
    MappingCandidate, NameDecision, NameMapping, NameMatchResults, NameReviewOutcome,
    PremiumComparison, PremiumDecision, RawRow,
};
use discrepancy_core::{
    apply_name_decisions, apply_premium_decisions, compare_premiums, find_name_matches,
};
use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;
use crate::report::{FinalReport, NameReviewView, PremiumReviewView};
use crate::session::{lock_session, AnalysisSession, SessionId, SessionPhase, SessionStore};
use crate::settings::AnalysisSettings;
use crate::store::MappingStore;
use crate::validation::{validate_account, validate_settings};

/// Input of one analysis: both row sets plus who is asking for which account.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub account: String,
    pub created_by: String,
    pub carrier_rows: Vec<RawRow>,
    pub payroll_rows: Vec<RawRow>,
    pub settings: AnalysisSettings,
}

/// Result of submitting name decisions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum NameStep {
    PremiumReview(PremiumReviewView),
    Complete(FinalReport),
}

pub struct Analyzer<S> {
    sessions: SessionStore,
    store: Mutex<S>,
}

impl<S: MappingStore> Analyzer<S> {
    pub fn new(store: S, session_ttl: Duration) -> Self {
        Self {
            sessions: SessionStore::new(session_ttl),
            store: Mutex::new(store),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Exclusive access to the mapping store.
    pub fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn into_store(self) -> S {
        self.store.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs Phase 1 and opens a session awaiting name review.
    pub fn analyze(&self, request: AnalysisRequest) -> Result<NameReviewView, AnalyzerError> {
        let (account, settings, phase1) = self.match_names(&request)?;

        let mut session = AnalysisSession::new(&account, &request.created_by, settings);
        let view = NameReviewView::new(session.id, &phase1);
        session.phase = SessionPhase::NameReview;
        session.phase1 = Some(phase1);
        self.sessions.insert(session);

        tracing::info!(
            "session {} created for account '{}': {} fuzzy matches to review",
            view.session_id,
            account,
            view.fuzzy_matches.len()
        );
        Ok(view)
    }

    /// Applies name decisions and runs Phase 2.
    ///
    /// Approved fuzzy matches are saved as learned mappings. With `finish`
    /// the premium review is skipped: every discrepancy is reported as
    /// unresolved and the session completes.
    pub fn submit_names(
        &self,
        id: SessionId,
        decisions: &[NameDecision],
        finish: bool,
    ) -> Result<NameStep, AnalyzerError> {
        let handle = self.sessions.get(&id)?;
        let mut session = lock_session(&handle);
        session.require_phase(SessionPhase::NameReview)?;

        let (names, comparison) = self.review_names(&session, decisions)?;

        if finish {
            let report = self.complete_unreviewed(&mut session, &names, &comparison)?;
            return Ok(NameStep::Complete(report));
        }

        let view = PremiumReviewView::new(id, &names, &comparison);
        session.name_review = Some(names);
        session.phase2 = Some(comparison);
        session.phase = SessionPhase::PremiumReview;

        tracing::info!(
            "session {} in premium review: {} discrepancies",
            id,
            view.premium_discrepancies.len()
        );
        Ok(NameStep::PremiumReview(view))
    }

    /// Applies premium decisions and completes the session.
    pub fn submit_premiums(
        &self,
        id: SessionId,
        decisions: &[PremiumDecision],
    ) -> Result<FinalReport, AnalyzerError> {
        let handle = self.sessions.get(&id)?;
        let mut session = lock_session(&handle);
        session.require_phase(SessionPhase::PremiumReview)?;

        let (Some(names), Some(comparison)) = (&session.name_review, &session.phase2) else {
            return Err(missing_state(&session));
        };
        let premiums = apply_premium_decisions(comparison, decisions)?;
        let report = FinalReport::assemble(&session.account, names, premiums);

        self.finish(&mut session);
        Ok(report)
    }

    /// Approves every fuzzy match, skips the premium review, and completes.
    pub fn skip_review(&self, id: SessionId) -> Result<FinalReport, AnalyzerError> {
        let handle = self.sessions.get(&id)?;
        let mut session = lock_session(&handle);
        session.require_phase(SessionPhase::NameReview)?;

        let decisions = match &session.phase1 {
            Some(phase1) => NameDecision::approve_all(&phase1.fuzzy_matches),
            None => return Err(missing_state(&session)),
        };
        let (names, comparison) = self.review_names(&session, &decisions)?;
        self.complete_unreviewed(&mut session, &names, &comparison)
    }

    /// One-shot analysis without a session or any review.
    ///
    /// Fuzzy matches are accepted as they are and nothing is learned from
    /// them. Every premium discrepancy is reported as unresolved.
    pub fn run_unattended(&self, request: AnalysisRequest) -> Result<FinalReport, AnalyzerError> {
        let (account, settings, phase1) = self.match_names(&request)?;

        let decisions = NameDecision::approve_all(&phase1.fuzzy_matches);
        let names = apply_name_decisions(&phase1, &decisions)?;
        let comparison = compare_premiums(&names.confirmed_matches, settings.premium_tolerance);
        let premiums = apply_premium_decisions(&comparison, &[])?;

        Ok(FinalReport::assemble(&account, &names, premiums))
    }

    fn match_names(
        &self,
        request: &AnalysisRequest,
    ) -> Result<(String, AnalysisSettings, NameMatchResults), AnalyzerError> {
        let account = validate_account(&request.account)?;
        let settings = validate_settings(&request.settings)?;

        let mappings = self.load_mappings(&account);
        let phase1 = find_name_matches(
            &request.carrier_rows,
            &request.payroll_rows,
            &mappings,
            &settings.match_options(),
        );
        self.record_usage(&account, &used_mappings(&phase1, &mappings));

        tracing::debug!(
            "phase 1 for '{}': {} carrier rows, {} payroll rows, {} learned mappings",
            account,
            request.carrier_rows.len(),
            request.payroll_rows.len(),
            mappings.len()
        );
        Ok((account, settings, phase1))
    }

    fn review_names(
        &self,
        session: &AnalysisSession,
        decisions: &[NameDecision],
    ) -> Result<(NameReviewOutcome, PremiumComparison), AnalyzerError> {
        let Some(phase1) = &session.phase1 else {
            return Err(missing_state(session));
        };
        let names = apply_name_decisions(phase1, decisions)?;
        self.save_mappings(&session.account, &names.approved_mappings, &session.created_by);

        let comparison =
            compare_premiums(&names.confirmed_matches, session.settings.premium_tolerance);
        Ok((names, comparison))
    }

    fn complete_unreviewed(
        &self,
        session: &mut AnalysisSession,
        names: &NameReviewOutcome,
        comparison: &PremiumComparison,
    ) -> Result<FinalReport, AnalyzerError> {
        let premiums = apply_premium_decisions(comparison, &[])?;
        let report = FinalReport::assemble(&session.account, names, premiums);
        self.finish(session);
        Ok(report)
    }

    fn finish(&self, session: &mut AnalysisSession) {
        session.phase = SessionPhase::Complete;
        self.sessions.remove(&session.id);
        tracing::info!("session {} complete", session.id);
    }

    fn load_mappings(&self, account: &str) -> Vec<NameMapping> {
        match self.store().load_mappings(account) {
            Ok(mappings) => mappings,
            Err(e) => {
                tracing::warn!("could not load name mappings for '{}': {}", account, e);
                Vec::new()
            }
        }
    }

    fn save_mappings(&self, account: &str, approved: &[MappingCandidate], created_by: &str) {
        if approved.is_empty() {
            return;
        }
        match self.store().save_mappings(account, approved, created_by) {
            Ok(saved) => tracing::info!("saved {} name mappings for '{}'", saved, account),
            Err(e) => tracing::warn!("could not save name mappings for '{}': {}", account, e),
        }
    }

    fn record_usage(&self, account: &str, used: &[NameMapping]) {
        if used.is_empty() {
            return;
        }
        if let Err(e) = self.store().record_usage(account, used) {
            tracing::warn!("could not record mapping usage for '{}': {}", account, e);
        }
    }
}

/// A session whose phase data is absent is treated as not yet analyzed.
fn missing_state(session: &AnalysisSession) -> AnalyzerError {
    AnalyzerError::WrongPhase {
        expected: session.phase,
        actual: SessionPhase::Uploaded,
    }
}

/// Mappings that produced one of the learned matches, in either orientation.
fn used_mappings(results: &NameMatchResults, mappings: &[NameMapping]) -> Vec<NameMapping> {
    mappings
        .iter()
        .filter(|mapping| {
            let (c, p) = (mapping.carrier_key(), mapping.payroll_key());
            results.learned_matches.iter().any(|m| {
                (m.carrier.key == c && m.payroll.key == p)
                    || (m.carrier.key == p && m.payroll.key == c)
            })
        })
        .cloned()
        .collect()
}
