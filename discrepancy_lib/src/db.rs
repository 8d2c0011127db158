//! SQLite storage for learned name mappings.

use std::path::Path;

use chrono::Utc;
use discrepancy_core::types::{MappingCandidate, NameMapping};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub struct Db {
    conn: Connection,
}

/// A `name_mappings` row with its bookkeeping columns.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredMapping {
    pub id: i64,
    pub carrier_last_name: String,
    pub carrier_first_name: String,
    pub payroll_last_name: String,
    pub payroll_first_name: String,
    pub account_name: String,
    pub created_by: Option<String>,
    pub created_at: String,
    pub last_used_at: Option<String>,
}

impl StoredMapping {
    pub fn to_mapping(&self) -> NameMapping {
        NameMapping {
            carrier_last_name: self.carrier_last_name.clone(),
            carrier_first_name: self.carrier_first_name.clone(),
            payroll_last_name: self.payroll_last_name.clone(),
            payroll_first_name: self.payroll_first_name.clone(),
            account_scope: self.account_name.clone(),
        }
    }
}

/// Number of learned mappings per employer account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub account_name: String,
    pub mapping_count: i64,
}

const SELECT_MAPPING_COLUMNS: &str = "SELECT id, carrier_last_name, carrier_first_name,
            payroll_last_name, payroll_first_name, account_name,
            created_by, created_at, last_used_at
     FROM name_mappings";

const UPSERT_MAPPING: &str = "INSERT INTO name_mappings (
       carrier_last_name, carrier_first_name, payroll_last_name, payroll_first_name,
       account_name, created_by, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(carrier_last_name, carrier_first_name, payroll_last_name, payroll_first_name, account_name)
     DO UPDATE SET created_by = COALESCE(excluded.created_by, name_mappings.created_by)";

fn stored_mapping_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMapping> {
    Ok(StoredMapping {
        id: row.get(0)?,
        carrier_last_name: row.get(1)?,
        carrier_first_name: row.get(2)?,
        payroll_last_name: row.get(3)?,
        payroll_first_name: row.get(4)?,
        account_name: row.get(5)?,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
        last_used_at: row.get(8)?,
    })
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.migrate_v1()?;
            self.conn.pragma_update(None, "user_version", 1)?;
        }

        let schema = include_str!("../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        Ok(())
    }

    /// Mapping tables created before usage tracking lack `last_used_at`.
    fn migrate_v1(&self) -> Result<(), DbError> {
        match self
            .conn
            .execute("ALTER TABLE name_mappings ADD COLUMN last_used_at TEXT", [])
        {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(_, Some(ref msg)))
                if msg.contains("duplicate column name") || msg.contains("no such table") => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Inserts approved pairings for `account` in one transaction. Pairings
    /// already stored for the account are left in place.
    pub fn upsert_name_mappings(
        &mut self,
        account: &str,
        candidates: &[MappingCandidate],
        created_by: &str,
    ) -> Result<usize, DbError> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(UPSERT_MAPPING)?;
            for candidate in candidates {
                stmt.execute(params![
                    candidate.carrier_last_name,
                    candidate.carrier_first_name,
                    candidate.payroll_last_name,
                    candidate.payroll_first_name,
                    account,
                    non_empty(created_by),
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(candidates.len())
    }

    /// Stores one mapping and returns its row id.
    pub fn add_name_mapping(
        &mut self,
        mapping: &NameMapping,
        created_by: &str,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            UPSERT_MAPPING,
            params![
                mapping.carrier_last_name,
                mapping.carrier_first_name,
                mapping.payroll_last_name,
                mapping.payroll_first_name,
                mapping.account_scope,
                non_empty(created_by),
                Utc::now().to_rfc3339(),
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM name_mappings
             WHERE carrier_last_name = ?1 AND carrier_first_name = ?2
               AND payroll_last_name = ?3 AND payroll_first_name = ?4
               AND account_name = ?5",
            params![
                mapping.carrier_last_name,
                mapping.carrier_first_name,
                mapping.payroll_last_name,
                mapping.payroll_first_name,
                mapping.account_scope,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Mappings of exactly one account, oldest first.
    pub fn get_name_mappings(&self, account: &str) -> Result<Vec<NameMapping>, DbError> {
        Ok(self
            .list_name_mappings(Some(account))?
            .iter()
            .map(StoredMapping::to_mapping)
            .collect())
    }

    /// Stored rows, optionally restricted to one account, oldest first.
    pub fn list_name_mappings(&self, account: Option<&str>) -> Result<Vec<StoredMapping>, DbError> {
        let mut result = Vec::new();
        match account {
            Some(account) => {
                let sql = format!("{} WHERE account_name = ?1 ORDER BY id", SELECT_MAPPING_COLUMNS);
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map(params![account], stored_mapping_from_row)?;
                for row in rows {
                    result.push(row?);
                }
            }
            None => {
                let sql = format!("{} ORDER BY account_name, id", SELECT_MAPPING_COLUMNS);
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map([], stored_mapping_from_row)?;
                for row in rows {
                    result.push(row?);
                }
            }
        }
        Ok(result)
    }

    pub fn get_name_mapping(&self, id: i64) -> Result<Option<StoredMapping>, DbError> {
        let sql = format!("{} WHERE id = ?1", SELECT_MAPPING_COLUMNS);
        self.conn
            .query_row(&sql, params![id], stored_mapping_from_row)
            .optional()
            .map_err(DbError::from)
    }

    /// Deletes one mapping. Returns whether a row was removed.
    pub fn delete_name_mapping(&self, id: i64) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM name_mappings WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn count_name_mappings(&self, account: Option<&str>) -> Result<i64, DbError> {
        let count = match account {
            Some(account) => self.conn.query_row(
                "SELECT COUNT(1) FROM name_mappings WHERE account_name = ?1",
                params![account],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(1) FROM name_mappings", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    pub fn list_accounts(&self) -> Result<Vec<AccountSummary>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT account_name, COUNT(1) FROM name_mappings
             GROUP BY account_name
             ORDER BY account_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AccountSummary {
                account_name: row.get(0)?,
                mapping_count: row.get(1)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Stamps `last_used_at` on mappings that produced a learned match.
    pub fn touch_name_mappings(
        &mut self,
        account: &str,
        used: &[NameMapping],
    ) -> Result<usize, DbError> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut touched = 0;

        {
            let mut stmt = tx.prepare(
                "UPDATE name_mappings SET last_used_at = ?1
                 WHERE carrier_last_name = ?2 AND carrier_first_name = ?3
                   AND payroll_last_name = ?4 AND payroll_first_name = ?5
                   AND account_name = ?6",
            )?;
            for mapping in used {
                touched += stmt.execute(params![
                    now,
                    mapping.carrier_last_name,
                    mapping.carrier_first_name,
                    mapping.payroll_last_name,
                    mapping.payroll_first_name,
                    account,
                ])?;
            }
        }

        tx.commit()?;
        Ok(touched)
    }
}
