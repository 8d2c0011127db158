use std::sync::Arc;

use discrepancy_lib::report::money;
use discrepancy_lib::types::{ComparisonRecord, EmployeeRecord, ReviewedDiscrepancy};
use discrepancy_lib::{
    AccountSummary, FinalReport, NameReviewView, PremiumReviewView, ReportCounts, StoredMapping,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Markdown,
}

#[derive(Tabled, Serialize)]
struct FuzzyRow {
    #[tabled(rename = "Match ID")]
    #[serde(rename = "Match ID")]
    match_id: String,
    #[tabled(rename = "Carrier Name")]
    #[serde(rename = "Carrier Name")]
    carrier_name: String,
    #[tabled(rename = "Payroll Name")]
    #[serde(rename = "Payroll Name")]
    payroll_name: String,
    #[tabled(rename = "Score")]
    #[serde(rename = "Score")]
    score: u8,
    #[tabled(rename = "Carrier Premium")]
    #[serde(rename = "Carrier Premium")]
    carrier_premium: String,
    #[tabled(rename = "Payroll Premium")]
    #[serde(rename = "Payroll Premium")]
    payroll_premium: String,
}

#[derive(Tabled, Serialize)]
struct DiscrepancyRow {
    #[tabled(rename = "Match ID")]
    #[serde(rename = "Match ID")]
    match_id: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Match")]
    #[serde(rename = "Match")]
    match_type: String,
    #[tabled(rename = "Carrier")]
    #[serde(rename = "Carrier")]
    carrier_premium: String,
    #[tabled(rename = "Payroll")]
    #[serde(rename = "Payroll")]
    payroll_premium: String,
    #[tabled(rename = "Difference")]
    #[serde(rename = "Difference")]
    difference: String,
    #[tabled(rename = "Carrier Products")]
    #[serde(rename = "Carrier Products")]
    carrier_products: String,
    #[tabled(rename = "Payroll Products")]
    #[serde(rename = "Payroll Products")]
    payroll_products: String,
}

#[derive(Tabled, Serialize)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    #[serde(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Tabled, Serialize)]
struct MatchRow {
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Match")]
    #[serde(rename = "Match")]
    match_type: String,
    #[tabled(rename = "Carrier")]
    #[serde(rename = "Carrier")]
    carrier_premium: String,
    #[tabled(rename = "Payroll")]
    #[serde(rename = "Payroll")]
    payroll_premium: String,
    #[tabled(rename = "Difference")]
    #[serde(rename = "Difference")]
    difference: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Tabled, Serialize)]
struct MissingRow {
    #[tabled(rename = "Missing From")]
    #[serde(rename = "Missing From")]
    missing_from: &'static str,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Premium")]
    #[serde(rename = "Premium")]
    premium: String,
    #[tabled(rename = "Products")]
    #[serde(rename = "Products")]
    products: String,
}

#[derive(Tabled, Serialize)]
struct MappingRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: i64,
    #[tabled(rename = "Account")]
    #[serde(rename = "Account")]
    account: String,
    #[tabled(rename = "Carrier Name")]
    #[serde(rename = "Carrier Name")]
    carrier_name: String,
    #[tabled(rename = "Payroll Name")]
    #[serde(rename = "Payroll Name")]
    payroll_name: String,
    #[tabled(rename = "Created By")]
    #[serde(rename = "Created By")]
    created_by: String,
    #[tabled(rename = "Last Used")]
    #[serde(rename = "Last Used")]
    last_used: String,
}

#[derive(Tabled, Serialize)]
struct AccountRow {
    #[tabled(rename = "Account")]
    #[serde(rename = "Account")]
    account: String,
    #[tabled(rename = "Mappings")]
    #[serde(rename = "Mappings")]
    mappings: i64,
}

// -- Row builders --

fn dollars(amount: Decimal) -> String {
    format!("${}", money(amount))
}

fn build_fuzzy_rows(view: &NameReviewView) -> Vec<FuzzyRow> {
    view.fuzzy_matches
        .iter()
        .map(|c| FuzzyRow {
            match_id: c.match_id.to_string(),
            carrier_name: c.carrier_name.clone(),
            payroll_name: c.payroll_name.clone(),
            score: c.similarity_score,
            carrier_premium: dollars(c.carrier_premium),
            payroll_premium: dollars(c.payroll_premium),
        })
        .collect()
}

fn build_discrepancy_rows(view: &PremiumReviewView) -> Vec<DiscrepancyRow> {
    view.premium_discrepancies
        .iter()
        .map(|d| DiscrepancyRow {
            match_id: d.match_id.to_string(),
            name: d.name.clone(),
            match_type: d.match_type.to_string(),
            carrier_premium: dollars(d.carrier_premium),
            payroll_premium: dollars(d.payroll_premium),
            difference: dollars(d.premium_diff),
            carrier_products: d.carrier_products.join("; "),
            payroll_products: d.payroll_products.join("; "),
        })
        .collect()
}

fn build_summary_rows(counts: &ReportCounts) -> Vec<SummaryRow> {
    let row = |metric, value: String| SummaryRow { metric, value };
    vec![
        row("Carrier Employees", counts.carrier_employees.to_string()),
        row("Payroll Employees", counts.payroll_employees.to_string()),
        row("Carrier Total Premium", dollars(counts.carrier_total_premium)),
        row("Payroll Total Premium", dollars(counts.payroll_total_premium)),
        row("Premium Difference", dollars(counts.premium_difference)),
        row("Perfect Matches", counts.perfect_matches.to_string()),
        row(
            "Acknowledged Discrepancies",
            counts.acknowledged_discrepancies.to_string(),
        ),
        row(
            "Unresolved Discrepancies",
            counts.unresolved_discrepancies.to_string(),
        ),
        row("Missing from Payroll", counts.missing_from_payroll.to_string()),
        row("Missing from Carrier", counts.missing_from_carrier.to_string()),
    ]
}

fn match_row(compared: &ComparisonRecord, status: &str) -> MatchRow {
    let record = &compared.record;
    MatchRow {
        name: record.carrier.display_name(),
        match_type: record.match_type.to_string(),
        carrier_premium: dollars(record.carrier.total_premium),
        payroll_premium: dollars(record.payroll.total_premium),
        difference: dollars(compared.premium_diff),
        status: status.to_string(),
    }
}

fn build_match_rows(report: &FinalReport) -> Vec<MatchRow> {
    let reviewed = |d: &ReviewedDiscrepancy, status| match_row(&d.comparison, status);
    report
        .perfect_matches
        .iter()
        .map(|c| match_row(c, "Match"))
        .chain(
            report
                .acknowledged_discrepancies
                .iter()
                .map(|d| reviewed(d, "Acknowledged")),
        )
        .chain(
            report
                .unresolved_discrepancies
                .iter()
                .map(|d| reviewed(d, "Needs Review")),
        )
        .collect()
}

fn missing_row(employee: &Arc<EmployeeRecord>, missing_from: &'static str) -> MissingRow {
    MissingRow {
        missing_from,
        name: employee.display_name(),
        premium: dollars(employee.total_premium),
        products: employee
            .products
            .iter()
            .map(discrepancy_lib::report::product_label)
            .collect::<Vec<_>>()
            .join("; "),
    }
}

fn build_missing_rows(report: &FinalReport) -> Vec<MissingRow> {
    report
        .unmatched_carrier
        .iter()
        .map(|e| missing_row(e, "Payroll"))
        .chain(report.unmatched_payroll.iter().map(|e| missing_row(e, "Carrier")))
        .collect()
}

fn build_mapping_rows(mappings: &[StoredMapping]) -> Vec<MappingRow> {
    mappings
        .iter()
        .map(|m| MappingRow {
            id: m.id,
            account: m.account_name.clone(),
            carrier_name: format!("{}, {}", m.carrier_last_name, m.carrier_first_name),
            payroll_name: format!("{}, {}", m.payroll_last_name, m.payroll_first_name),
            created_by: m.created_by.clone().unwrap_or_default(),
            last_used: m.last_used_at.clone().unwrap_or_else(|| "never".to_string()),
        })
        .collect()
}

fn build_account_rows(accounts: &[AccountSummary]) -> Vec<AccountRow> {
    accounts
        .iter()
        .map(|a| AccountRow {
            account: if a.account_name.is_empty() {
                "(unscoped)".to_string()
            } else {
                a.account_name.clone()
            },
            mappings: a.mapping_count,
        })
        .collect()
}

// -- Rendering --

fn render<T: Tabled>(rows: Vec<T>, format: &OutputFormat) -> String {
    let mut table = Table::new(rows);
    if let OutputFormat::Markdown = format {
        table.with(Style::markdown());
    }
    table.to_string()
}

pub fn print_name_review(view: &NameReviewView, format: &OutputFormat) {
    if let OutputFormat::Json = format {
        print_json(view);
        return;
    }
    println!("{}", render(build_fuzzy_rows(view), format));
}

pub fn print_premium_review(view: &PremiumReviewView, format: &OutputFormat) {
    if let OutputFormat::Json = format {
        print_json(view);
        return;
    }
    println!("{}", render(build_discrepancy_rows(view), format));
}

pub fn print_report(report: &FinalReport, format: &OutputFormat) {
    if let OutputFormat::Json = format {
        print_json(&ReportOutput {
            counts: report.counts(),
            report,
        });
        return;
    }

    println!("{}", render(build_summary_rows(&report.counts()), format));
    let matches = build_match_rows(report);
    if !matches.is_empty() {
        println!();
        println!("{}", render(matches, format));
    }
    let missing = build_missing_rows(report);
    if !missing.is_empty() {
        println!();
        println!("{}", render(missing, format));
    }
}

pub fn print_mappings(mappings: &[StoredMapping], format: &OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&mappings),
        _ => println!("{}", render(build_mapping_rows(mappings), format)),
    }
}

pub fn print_accounts(accounts: &[AccountSummary], format: &OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&accounts),
        _ => println!("{}", render(build_account_rows(accounts), format)),
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    counts: ReportCounts,
    #[serde(flatten)]
    report: &'a FinalReport,
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
