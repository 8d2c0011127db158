//! The `analyze` subcommand: run the two-phase reconciliation over JSON row files.
//!
//! Match ids are stable across runs on the same input, so a review can span
//! several invocations: `--review-only` lists the fuzzy candidates, a later
//! run passes the reviewer's verdicts with `--name-decisions`, and a third adds
//! `--premium-decisions`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use discrepancy_lib::types::{NameDecision, PremiumDecision, RawRow};
use discrepancy_lib::validation::{validate_settings, validate_threshold, validate_tolerance};
use discrepancy_lib::{
    AnalysisRequest, AnalysisSettings, Analyzer, Db, MappingStore, MemoryMappingStore, NameStep,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::output::{print_name_review, print_premium_review, print_report, OutputFormat};

/// Arguments for the `analyze` subcommand.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Carrier enrollment rows (JSON array of objects)
    #[arg(long)]
    pub carrier: PathBuf,

    /// Payroll deduction rows (JSON array of objects)
    #[arg(long)]
    pub payroll: PathBuf,

    /// SQLite database of learned name mappings; without it nothing is learned
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Employer account the learned mappings are scoped to
    #[arg(long, default_value = "")]
    pub account: String,

    /// Reviewer name recorded on new mappings
    #[arg(long, default_value = "")]
    pub user: String,

    /// TOML settings file (column names, threshold, tolerance)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum name similarity (0-100) for a fuzzy candidate
    #[arg(long)]
    pub threshold: Option<i64>,

    /// Largest premium difference still treated as a match
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Stop after name matching and list fuzzy candidates for review
    #[arg(long, conflicts_with_all = ["skip_review", "name_decisions"])]
    pub review_only: bool,

    /// Approve every fuzzy match and report all discrepancies as unresolved
    #[arg(long, conflicts_with = "name_decisions")]
    pub skip_review: bool,

    /// Name decisions (JSON array of {match_id, approved})
    #[arg(long)]
    pub name_decisions: Option<PathBuf>,

    /// Premium decisions (JSON array of {match_id, acknowledged})
    #[arg(long, requires = "name_decisions")]
    pub premium_decisions: Option<PathBuf>,

    /// Report right after the name decisions, leaving discrepancies unresolved
    #[arg(long, requires = "name_decisions", conflicts_with = "premium_decisions")]
    pub finish: bool,
}

pub fn run(args: &AnalyzeArgs, format: &OutputFormat) -> Result<()> {
    let settings = resolve_settings(args)?;
    let ttl = Duration::from_secs(settings.session_ttl_secs);

    let request = AnalysisRequest {
        account: args.account.clone(),
        created_by: args.user.clone(),
        carrier_rows: read_json::<Vec<RawRow>>(&args.carrier)?,
        payroll_rows: read_json::<Vec<RawRow>>(&args.payroll)?,
        settings,
    };

    match &args.db {
        Some(path) => {
            let db = Db::open(path)?;
            db.init()?;
            run_with(Analyzer::new(db, ttl), request, args, format)
        }
        None => run_with(
            Analyzer::new(MemoryMappingStore::new(), ttl),
            request,
            args,
            format,
        ),
    }
}

fn run_with<S: MappingStore>(
    analyzer: Analyzer<S>,
    request: AnalysisRequest,
    args: &AnalyzeArgs,
    format: &OutputFormat,
) -> Result<()> {
    let interactive = args.review_only || args.skip_review || args.name_decisions.is_some();
    if !interactive {
        let report = analyzer.run_unattended(request)?;
        print_report(&report, format);
        return Ok(());
    }

    let view = analyzer.analyze(request)?;
    eprintln!(
        "{} exact, {} learned, {} fuzzy; {} carrier and {} payroll employees unmatched",
        view.exact_matches,
        view.learned_matches,
        view.fuzzy_matches.len(),
        view.unmatched_carrier,
        view.unmatched_payroll
    );

    if args.review_only {
        print_name_review(&view, format);
        return Ok(());
    }

    if args.skip_review {
        let report = analyzer.skip_review(view.session_id)?;
        print_report(&report, format);
        return Ok(());
    }

    let name_decisions: Vec<NameDecision> = match &args.name_decisions {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let step = analyzer.submit_names(view.session_id, &name_decisions, args.finish)?;

    let premium_view = match step {
        NameStep::Complete(report) => {
            print_report(&report, format);
            return Ok(());
        }
        NameStep::PremiumReview(premium_view) => premium_view,
    };

    match &args.premium_decisions {
        Some(path) => {
            let decisions: Vec<PremiumDecision> = read_json(path)?;
            let report = analyzer.submit_premiums(view.session_id, &decisions)?;
            print_report(&report, format);
        }
        None => {
            eprintln!(
                "{} premium discrepancies to review; pass --premium-decisions to finish",
                premium_view.premium_discrepancies.len()
            );
            print_premium_review(&premium_view, format);
        }
    }

    Ok(())
}

/// Settings file, then `DISCREPANCY_*` environment, then command-line flags.
fn resolve_settings(args: &AnalyzeArgs) -> Result<AnalysisSettings> {
    let mut settings = match &args.config {
        Some(path) => AnalysisSettings::load(path)?,
        None => AnalysisSettings::default(),
    }
    .with_env_overrides();

    if let Some(threshold) = args.threshold {
        settings.name_match_threshold = validate_threshold(threshold)?;
    }
    if let Some(tolerance) = args.tolerance {
        settings.premium_tolerance = validate_tolerance(tolerance)?;
    }
    Ok(validate_settings(&settings)?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
