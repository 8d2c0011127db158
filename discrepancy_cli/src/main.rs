mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "discrepancy-analyzer")]
#[command(about = "Reconcile carrier enrollment files against payroll deductions")]
struct Cli {
    /// Output format: table, json, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match carrier and payroll rows and report premium discrepancies
    Analyze(Box<commands::analyze::AnalyzeArgs>),
    /// Inspect and edit learned name mappings
    Mappings(commands::mappings::MappingsArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("discrepancy=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "markdown" | "md" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Commands::Analyze(args) => commands::analyze::run(args.as_ref(), &format)?,
        Commands::Mappings(args) => commands::mappings::run(args, &format)?,
    }

    Ok(())
}
