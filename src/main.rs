//! ShootReview - year-end business review for photography shoot ledgers.
//!
//! Fetches a booking ledger, runs revenue, profitability and trend analysis
//! concurrently, asks a local Ollama model for a narrative and writes a
//! Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success (including reports whose insights are unavailable)
//!   1 - Runtime error (invalid arguments, config, output file, etc.)
//!   2 - A pipeline stage failed; no report was written

mod analysis;
mod cli;
mod config;
mod error;
mod ledger;
mod models;
mod parser;
mod pipeline;
mod report;
mod retry;
mod synthesis;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use cli::{Args, OutputFormat};
use config::Config;
use error::ReviewError;
use indicatif::{ProgressBar, ProgressStyle};
use ledger::{CsvFileLedger, LedgerProvider, SampleLedger};
use pipeline::ReviewPipeline;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use synthesis::{DisabledSynthesizer, InsightSynthesizer, OllamaSynthesizer};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config comes first so its `verbose` setting can pick the log level.
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(&args));

    info!("ShootReview v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_review(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Review failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .shootreview.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to customize the ledger source, model and recommendations.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the review and write the report. Returns the exit code (0 or 2).
async fn run_review(args: Args, config: Config) -> Result<i32> {
    let ledger: Arc<dyn LedgerProvider> = match config.ledger.source {
        Some(ref path) => Arc::new(CsvFileLedger::new(path)),
        None => Arc::new(SampleLedger),
    };

    if args.dry_run {
        return handle_dry_run(ledger.as_ref(), &args).await;
    }

    let synthesizer: Arc<dyn InsightSynthesizer> = if config.model.disabled {
        info!("Insight synthesis disabled");
        Arc::new(DisabledSynthesizer)
    } else {
        Arc::new(OllamaSynthesizer::new(config.synthesizer_config())?)
    };

    println!("📊 Running year-end review...");
    println!("   Ledger: {}", ledger.describe());
    println!("   Model: {}", synthesizer.model_name());
    if let Some(year) = args.year {
        println!("   Year: {}", year);
    }

    let pipeline = ReviewPipeline::new(ledger, synthesizer, config.pipeline_options());

    let spinner = (!args.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message("fetching, analyzing, synthesizing...");
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let result = pipeline.run(args.year).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let output = match result {
        Ok(output) => output,
        Err(failure) => {
            eprintln!("\n⛔ {}", failure);
            if let ReviewError::EmptyDataset { .. } = failure.error {
                eprintln!(
                    "   No bookings matched the requested year. Try --year <YEAR> or --no-year-filter."
                );
            }
            eprintln!("   No report was written.");
            return Ok(2);
        }
    };

    let rendered = match args.format {
        OutputFormat::Json => report::generate_json_report(&output)?,
        OutputFormat::Markdown => output.report.clone(),
    };

    let path = config
        .general
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(args.format));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, &rendered)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    let analysis = &output.analysis;
    println!("\n📈 Review Summary ({}):", output.metadata.year);
    println!("   Shoots: {}", analysis.trends.total_shoots);
    println!(
        "   Revenue: {}",
        report::format_money(analysis.revenue.total_revenue)
    );
    println!(
        "   Most profitable: {}",
        analysis
            .profitability
            .most_profitable
            .as_deref()
            .unwrap_or("N/A")
    );
    if !output.insights.is_available() {
        warn!("Report written without narrative insights");
        println!("   ⚠️  Insights unavailable; numeric sections are complete.");
    }
    println!("   Duration: {:.1}s", output.metadata.duration_seconds);
    println!(
        "\n✅ Review complete! Report saved to: {} (generated {})",
        path.display(),
        output.generated_at.to_rfc3339()
    );

    Ok(0)
}

/// Handle --dry-run: fetch and parse the ledger, print what would be analyzed.
async fn handle_dry_run(ledger: &dyn LedgerProvider, args: &Args) -> Result<i32> {
    let year = args.year.unwrap_or_else(|| Utc::now().year());
    println!("\n🔍 Dry run: reading {} (no analysis)...\n", ledger.describe());

    let raw = ledger.fetch(year).await?;
    let records = parser::parse_records(&raw)?;
    let in_year = records.iter().filter(|r| r.date.year() == year).count();

    println!("   Parsed {} bookings ({} dated {})", records.len(), in_year, year);
    println!("\n✅ Dry run complete. No analysis was run.");
    Ok(0)
}

/// reports/year-end-review-<today>.<ext>
fn default_output_path(format: OutputFormat) -> PathBuf {
    PathBuf::from("reports").join(format!(
        "year-end-review-{}.{}",
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    ))
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok(Config::default())
        }
    }
}
