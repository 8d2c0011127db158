//! The `mappings` subcommand: inspect and curate learned name mappings.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use discrepancy_lib::types::NameMapping;
use discrepancy_lib::validation::{validate_account, validate_person_name};
use discrepancy_lib::Db;
use std::path::PathBuf;

use crate::output::{print_accounts, print_mappings, OutputFormat};

/// Arguments for the `mappings` subcommand.
#[derive(Args)]
pub struct MappingsArgs {
    /// SQLite database path (required)
    #[arg(long)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub action: MappingsAction,
}

#[derive(Subcommand)]
pub enum MappingsAction {
    /// List stored mappings, optionally for one account
    List(ListArgs),
    /// Record a carrier-to-payroll name pairing by hand
    Add(AddArgs),
    /// Delete a mapping by id
    Remove(RemoveArgs),
    /// Show mapping counts per account
    Accounts,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only mappings scoped to this account ("" for unscoped)
    #[arg(long)]
    pub account: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(long, default_value = "")]
    pub account: String,

    #[arg(long)]
    pub carrier_last: String,

    #[arg(long)]
    pub carrier_first: String,

    #[arg(long)]
    pub payroll_last: String,

    #[arg(long)]
    pub payroll_first: String,

    /// Recorded as the mapping's author
    #[arg(long, default_value = "")]
    pub user: String,
}

#[derive(Args)]
pub struct RemoveArgs {
    #[arg(long)]
    pub id: i64,
}

pub fn run(args: &MappingsArgs, format: &OutputFormat) -> Result<()> {
    let mut db = Db::open(&args.db)?;
    db.init()?;

    match &args.action {
        MappingsAction::List(list) => {
            let account = match &list.account {
                Some(account) => Some(validate_account(account)?),
                None => None,
            };
            let mappings = db.list_name_mappings(account.as_deref())?;
            eprintln!("{} mappings", mappings.len());
            print_mappings(&mappings, format);
        }
        MappingsAction::Add(add) => {
            let mapping = build_mapping(add)?;
            let id = db.add_name_mapping(&mapping, &add.user)?;
            eprintln!(
                "Stored mapping {}: {}, {} -> {}, {}",
                id,
                mapping.carrier_last_name,
                mapping.carrier_first_name,
                mapping.payroll_last_name,
                mapping.payroll_first_name
            );
        }
        MappingsAction::Remove(remove) => {
            if !db.delete_name_mapping(remove.id)? {
                bail!("no mapping with id {}", remove.id);
            }
            eprintln!("Removed mapping {}", remove.id);
        }
        MappingsAction::Accounts => {
            let accounts = db.list_accounts()?;
            print_accounts(&accounts, format);
        }
    }

    Ok(())
}

fn build_mapping(args: &AddArgs) -> Result<NameMapping> {
    Ok(NameMapping {
        carrier_last_name: validate_person_name(&args.carrier_last)?,
        carrier_first_name: validate_person_name(&args.carrier_first)?,
        payroll_last_name: validate_person_name(&args.payroll_last)?,
        payroll_first_name: validate_person_name(&args.payroll_first)?,
        account_scope: validate_account(&args.account)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_args() -> AddArgs {
        AddArgs {
            account: "Acme".to_string(),
            carrier_last: "Brown".to_string(),
            carrier_first: "Jon".to_string(),
            payroll_last: "Brown".to_string(),
            payroll_first: "John".to_string(),
            user: "alice".to_string(),
        }
    }

    #[test]
    fn test_build_mapping() {
        let mapping = build_mapping(&add_args()).unwrap();
        assert_eq!(mapping.carrier_first_name, "Jon");
        assert_eq!(mapping.payroll_first_name, "John");
        assert_eq!(mapping.account_scope, "Acme");
    }

    #[test]
    fn test_build_mapping_rejects_blank_name() {
        let mut args = add_args();
        args.payroll_first = "   ".to_string();
        assert!(build_mapping(&args).is_err());
    }

    #[test]
    fn test_add_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.db");
        let format = OutputFormat::Json;

        let add = MappingsArgs {
            db: path.clone(),
            action: MappingsAction::Add(add_args()),
        };
        run(&add, &format).unwrap();

        let db = Db::open(&path).unwrap();
        let stored = db.list_name_mappings(Some("Acme")).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].created_by.as_deref(), Some("alice"));

        let remove = MappingsArgs {
            db: path.clone(),
            action: MappingsAction::Remove(RemoveArgs { id: stored[0].id }),
        };
        run(&remove, &format).unwrap();
        assert!(run(&remove, &format).is_err());
        assert_eq!(db.count_name_mappings(None).unwrap(), 0);
    }
}
