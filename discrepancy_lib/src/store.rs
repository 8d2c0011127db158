//! Where learned name mappings come from and go to.

use discrepancy_core::types::{MappingCandidate, NameMapping};

use crate::db::{Db, DbError};

/// Persistence for human-approved name pairings, scoped per employer account.
pub trait MappingStore {
    /// Mappings stored for exactly `account`.
    fn load_mappings(&mut self, account: &str) -> Result<Vec<NameMapping>, DbError>;

    /// Persists approved pairings. Storing a pairing twice is not an error.
    /// Returns how many pairings were written.
    fn save_mappings(
        &mut self,
        account: &str,
        candidates: &[MappingCandidate],
        created_by: &str,
    ) -> Result<usize, DbError>;

    /// Notes that `used` produced learned matches in a run.
    fn record_usage(&mut self, _account: &str, _used: &[NameMapping]) -> Result<(), DbError> {
        Ok(())
    }
}

impl MappingStore for Db {
    fn load_mappings(&mut self, account: &str) -> Result<Vec<NameMapping>, DbError> {
        self.get_name_mappings(account)
    }

    fn save_mappings(
        &mut self,
        account: &str,
        candidates: &[MappingCandidate],
        created_by: &str,
    ) -> Result<usize, DbError> {
        self.upsert_name_mappings(account, candidates, created_by)
    }

    fn record_usage(&mut self, account: &str, used: &[NameMapping]) -> Result<(), DbError> {
        self.touch_name_mappings(account, used)?;
        Ok(())
    }
}

/// Process-local mapping store. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryMappingStore {
    mappings: Vec<NameMapping>,
}

impl MemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mappings(mappings: Vec<NameMapping>) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &[NameMapping] {
        &self.mappings
    }
}

impl MappingStore for MemoryMappingStore {
    fn load_mappings(&mut self, account: &str) -> Result<Vec<NameMapping>, DbError> {
        Ok(self
            .mappings
            .iter()
            .filter(|m| m.account_scope == account)
            .cloned()
            .collect())
    }

    fn save_mappings(
        &mut self,
        account: &str,
        candidates: &[MappingCandidate],
        _created_by: &str,
    ) -> Result<usize, DbError> {
        for candidate in candidates {
            let mapping = candidate.clone().scoped(account);
            if !self.mappings.contains(&mapping) {
                self.mappings.push(mapping);
            }
        }
        Ok(candidates.len())
    }
}
