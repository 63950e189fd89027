//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.shootreview.toml` files.

use crate::pipeline::PipelineOptions;
use crate::retry::RetryPolicy;
use crate::synthesis::SynthesizerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".shootreview.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Ledger source settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path. Defaults to `reports/year-end-review-<date>.md`.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where bookings come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// CSV export to read. The built-in sample ledger is used when unset.
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Drop bookings dated outside the requested year.
    #[serde(default = "default_true")]
    pub apply_year_filter: bool,

    /// Number of retries on failure.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Delay before the first retry, doubling afterwards.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            source: None,
            apply_year_filter: true,
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries on failure.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Skip insight synthesis entirely.
    #[serde(default)]
    pub disabled: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            disabled: false,
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

/// Analysis pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Wall-clock ceiling for each analyzer, in milliseconds.
    #[serde(default = "default_analyzer_timeout_ms")]
    pub analyzer_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout_ms: default_analyzer_timeout_ms(),
        }
    }
}

fn default_analyzer_timeout_ms() -> u64 {
    5000
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Fixed recommendations listed at the end of the report.
    #[serde(default = "default_recommendations")]
    pub recommendations: Vec<String>,

    /// Append the synthesis prompt to the report.
    #[serde(default)]
    pub include_prompt: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recommendations: default_recommendations(),
            include_prompt: false,
        }
    }
}

/// The standard recommendations closing every review.
pub fn default_recommendations() -> Vec<String> {
    vec![
        "Focus on most profitable shoot types",
        "Adjust pricing based on hourly rate analysis",
        "Book more shoots during slow months",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref ledger) = args.ledger {
            self.ledger.source = Some(ledger.clone());
        }
        if args.no_year_filter {
            self.ledger.apply_year_filter = false;
        }

        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if args.no_insights {
            self.model.disabled = true;
        }

        if let Some(timeout_ms) = args.analyzer_timeout_ms {
            self.pipeline.analyzer_timeout_ms = timeout_ms;
        }
    }

    /// Log level after merging: `--quiet` wins, then `verbose` from either source.
    pub fn log_level(&self, args: &crate::cli::Args) -> tracing::Level {
        if self.general.verbose && !args.quiet {
            tracing::Level::DEBUG
        } else {
            args.log_level()
        }
    }

    pub fn synthesizer_config(&self) -> SynthesizerConfig {
        SynthesizerConfig {
            ollama_url: self.model.ollama_url.clone(),
            model_name: self.model.name.clone(),
            temperature: self.model.temperature,
            timeout_seconds: self.model.timeout_seconds,
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            analyzer_timeout: Duration::from_millis(self.pipeline.analyzer_timeout_ms),
            apply_year_filter: self.ledger.apply_year_filter,
            ledger_retry: RetryPolicy::new(
                self.ledger.retries,
                Duration::from_millis(self.ledger.retry_delay_ms),
            ),
            synthesis_retry: if self.model.disabled {
                RetryPolicy::none()
            } else {
                RetryPolicy::new(
                    self.model.retries,
                    Duration::from_millis(self.model.retry_delay_ms),
                )
            },
            recommendations: self.report.recommendations.clone(),
            include_prompt: self.report.include_prompt,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert!(config.ledger.apply_year_filter);
        assert_eq!(config.pipeline.analyzer_timeout_ms, 5000);
        assert_eq!(config.report.recommendations.len(), 3);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_review.md"
verbose = true

[ledger]
source = "bookings.csv"
apply_year_filter = false

[model]
name = "qwen2.5:14b"
temperature = 0.2

[pipeline]
analyzer_timeout_ms = 750

[report]
recommendations = ["Raise portrait prices"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(
            config.general.output,
            Some(PathBuf::from("custom_review.md"))
        );
        assert!(config.general.verbose);
        assert_eq!(config.ledger.source, Some(PathBuf::from("bookings.csv")));
        assert!(!config.ledger.apply_year_filter);
        assert_eq!(config.model.name, "qwen2.5:14b");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.model.ollama_url, "http://localhost:11434");
        assert_eq!(config.pipeline.analyzer_timeout_ms, 750);
        assert_eq!(config.report.recommendations, vec!["Raise portrait prices"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nname = \"mistral\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.model.name, "mistral");
        assert_eq!(config.ledger.retries, 2);
    }

    #[test]
    fn test_merge_with_args() {
        let args = crate::cli::Args::parse_from([
            "shootreview",
            "--model",
            "mistral",
            "--ledger",
            "2024.csv",
            "--no-year-filter",
            "--no-insights",
            "--analyzer-timeout-ms",
            "100",
        ]);

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.model.name, "mistral");
        assert_eq!(config.ledger.source, Some(PathBuf::from("2024.csv")));
        assert!(!config.ledger.apply_year_filter);
        assert!(config.model.disabled);

        let options = config.pipeline_options();
        assert_eq!(options.analyzer_timeout, Duration::from_millis(100));
        assert!(!options.apply_year_filter);
        assert_eq!(options.ledger_retry.max_retries, 2);
        assert_eq!(options.synthesis_retry, RetryPolicy::none());
    }

    #[test]
    fn test_verbose_from_config_sets_log_level() {
        let config: Config = toml::from_str("[general]\nverbose = true").unwrap();
        let args = crate::cli::Args::parse_from(["shootreview"]);
        assert_eq!(config.log_level(&args), tracing::Level::DEBUG);

        let quiet = crate::cli::Args::parse_from(["shootreview", "--quiet"]);
        assert_eq!(config.log_level(&quiet), tracing::Level::ERROR);

        assert_eq!(Config::default().log_level(&args), tracing::Level::INFO);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[ledger]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[pipeline]"));
        assert!(toml_str.contains("[report]"));
    }
}
