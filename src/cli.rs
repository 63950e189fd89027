//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// ShootReview - year-end business review for photography shoot ledgers
///
/// Analyzes a year of bookings for revenue, per-category profitability and
/// booking trends, then asks a local LLM for a narrative summary.
///
/// Examples:
///   shootreview --year 2024
///   shootreview --year 2024 --ledger bookings.csv --format json
///   shootreview --year 2024 --no-insights
///   shootreview --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Year to review (defaults to the current year)
    ///
    /// The built-in sample ledger is dated 2024: use --year 2024 (or
    /// --no-year-filter) when no --ledger is given.
    #[arg(short, long, value_name = "YEAR")]
    pub year: Option<i32>,

    /// CSV ledger to analyze instead of the built-in sample
    #[arg(short, long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to reports/year-end-review-<date>.md (or .json)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Ollama model used for insights
    ///
    /// Can also be set via SHOOTREVIEW_MODEL env var or .shootreview.toml config.
    #[arg(short, long, env = "SHOOTREVIEW_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Request timeout for the insight model, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Wall-clock budget for each analyzer, in milliseconds
    #[arg(long, value_name = "MS")]
    pub analyzer_timeout_ms: Option<u64>,

    /// Skip insight synthesis; the report notes insights as unavailable
    #[arg(long)]
    pub no_insights: bool,

    /// Analyze every booking in the ledger regardless of --year
    #[arg(long)]
    pub no_year_filter: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .shootreview.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: fetch and parse the ledger, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .shootreview.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(year) = self.year {
            if !(1900..=9999).contains(&year) {
                return Err(format!("Year must be between 1900 and 9999, got {}", year));
            }
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(timeout_ms) = self.analyzer_timeout_ms {
            if timeout_ms == 0 {
                return Err("Analyzer timeout must be at least 1 millisecond".to_string());
            }
        }

        if let Some(ref ledger) = self.ledger {
            if !ledger.is_file() {
                return Err(format!("Ledger file does not exist: {}", ledger.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
