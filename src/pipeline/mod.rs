//! The review pipeline.
//!
//! One run fetches the ledger, fans the parsed records out to the three
//! analyzers, merges their results, asks the insight synthesizer for a
//! narrative and formats the final report:
//!
//! ```text
//! Idle -> Fetching -> Analyzing -> Merged -> Synthesizing -> Formatting -> Done
//! ```
//!
//! Any stage can fail the run except synthesis, which only degrades it.

pub mod state;

pub use state::{PipelineState, ReviewRun};

use crate::analysis::{profitability, revenue, trends, AnalyzerKind};
use crate::error::{ReviewError, ReviewResult, StageFailure};
use crate::ledger::LedgerProvider;
use crate::models::{AnalysisResult, Insights, ReviewOutput, RunMetadata, ShootRecord};
use crate::parser::{parse_records, retain_year};
use crate::report::{generate_markdown_report, ReportInput};
use crate::retry::{with_retry, RetryPolicy};
use crate::synthesis::{build_prompt, InsightSynthesizer};
use chrono::{Datelike, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Knobs for a review run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Wall-clock ceiling for each analyzer.
    pub analyzer_timeout: Duration,
    /// Drop records dated outside the requested year.
    pub apply_year_filter: bool,
    pub ledger_retry: RetryPolicy,
    pub synthesis_retry: RetryPolicy,
    /// Fixed recommendations printed at the end of the report.
    pub recommendations: Vec<String>,
    /// Append the synthesis prompt to the report.
    pub include_prompt: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            analyzer_timeout: Duration::from_secs(5),
            apply_year_filter: true,
            ledger_retry: RetryPolicy::default(),
            synthesis_retry: RetryPolicy::default(),
            recommendations: crate::config::default_recommendations(),
            include_prompt: false,
        }
    }
}

/// Fixed-topology review pipeline over a ledger and a synthesizer.
pub struct ReviewPipeline {
    ledger: Arc<dyn LedgerProvider>,
    synthesizer: Arc<dyn InsightSynthesizer>,
    options: PipelineOptions,
}

impl ReviewPipeline {
    pub fn new(
        ledger: Arc<dyn LedgerProvider>,
        synthesizer: Arc<dyn InsightSynthesizer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            ledger,
            synthesizer,
            options,
        }
    }

    /// Run the review for `year` (defaults to the current year).
    ///
    /// Each call owns a fresh [`ReviewRun`], so concurrent runs on the same
    /// pipeline do not interfere.
    pub async fn run(&self, year: Option<i32>) -> Result<ReviewOutput, StageFailure> {
        let year = year.unwrap_or_else(|| Utc::now().year());
        let mut run = ReviewRun::new(year);

        match self.execute(&mut run).await {
            Ok(output) => Ok(output),
            Err(e) => {
                let stage = run.fail();
                error!("Review for {} failed during {}: {}", year, stage, e);
                Err(StageFailure::new(stage, e))
            }
        }
    }

    async fn execute(&self, run: &mut ReviewRun) -> ReviewResult<ReviewOutput> {
        let year = run.year;

        run.advance(PipelineState::Fetching)?;
        info!("Fetching {} for {}", self.ledger.describe(), year);
        let ledger = Arc::clone(&self.ledger);
        let raw = with_retry("Ledger fetch", self.options.ledger_retry, || {
            let ledger = Arc::clone(&ledger);
            async move { ledger.fetch(year).await }
        })
        .await?;

        let mut records = parse_records(&raw)?;
        let mut records_filtered = 0;
        if self.options.apply_year_filter {
            let (kept, dropped) = retain_year(records, year);
            if dropped > 0 {
                info!("Year filter dropped {} records outside {}", dropped, year);
            }
            records = kept;
            records_filtered = dropped;
        }
        let records_analyzed = records.len();

        run.advance(PipelineState::Analyzing)?;
        info!("Analyzing {} shoots", records_analyzed);
        let analysis = analyze_records(Arc::new(records), self.options.analyzer_timeout).await?;
        run.advance(PipelineState::Merged)?;

        run.advance(PipelineState::Synthesizing)?;
        let prompt = build_prompt(&analysis, year);
        let insights = self.synthesize(&prompt).await;

        run.advance(PipelineState::Formatting)?;
        let generated_at = Utc::now();
        let metadata = RunMetadata {
            year,
            records_analyzed,
            records_filtered,
            model_used: self.synthesizer.model_name(),
            duration_seconds: run.elapsed_seconds(),
        };
        let report = generate_markdown_report(&ReportInput {
            metadata: &metadata,
            analysis: &analysis,
            insights: &insights,
            recommendations: &self.options.recommendations,
            generated_at,
            prompt: self.options.include_prompt.then_some(prompt.as_str()),
        });

        run.advance(PipelineState::Done)?;
        debug!("Run path: {:?}", run.history());
        info!("Review for {} complete", year);

        Ok(ReviewOutput {
            report,
            generated_at,
            metadata,
            analysis,
            insights,
        })
    }

    /// Ask the synthesizer for a narrative. Failure degrades, never aborts.
    async fn synthesize(&self, prompt: &str) -> Insights {
        info!("Generating insights with {}", self.synthesizer.model_name());
        let synthesizer = Arc::clone(&self.synthesizer);
        let result = with_retry("Insight synthesis", self.options.synthesis_retry, || {
            let synthesizer = Arc::clone(&synthesizer);
            async move { synthesizer.synthesize(prompt).await }
        })
        .await;

        match result {
            Ok(text) => Insights::Available { text },
            Err(e) => {
                warn!("Insights unavailable, continuing without narrative: {}", e);
                Insights::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Run the three analyzers concurrently over the same records.
///
/// Waits for all three; the first failure aborts the siblings and is
/// returned. Each analyzer gets `budget` of wall-clock time.
pub async fn analyze_records(
    records: Arc<Vec<ShootRecord>>,
    budget: Duration,
) -> ReviewResult<AnalysisResult> {
    let (revenue, profitability, trends) = fan_out(
        records,
        budget,
        |records| async move { revenue::analyze(&records) },
        |records| async move { profitability::analyze(&records) },
        |records| async move { trends::analyze(&records) },
    )
    .await?;
    debug!("All analyzers finished, merging results");

    Ok(AnalysisResult {
        revenue,
        profitability,
        trends,
    })
}

/// Spawn one task per analyzer and join them fail-fast.
async fn fan_out<R, P, T, FR, FP, FT, RFut, PFut, TFut>(
    records: Arc<Vec<ShootRecord>>,
    budget: Duration,
    revenue: FR,
    profitability: FP,
    trends: FT,
) -> ReviewResult<(R, P, T)>
where
    R: Send + 'static,
    P: Send + 'static,
    T: Send + 'static,
    FR: FnOnce(Arc<Vec<ShootRecord>>) -> RFut,
    FP: FnOnce(Arc<Vec<ShootRecord>>) -> PFut,
    FT: FnOnce(Arc<Vec<ShootRecord>>) -> TFut,
    RFut: Future<Output = ReviewResult<R>> + Send + 'static,
    PFut: Future<Output = ReviewResult<P>> + Send + 'static,
    TFut: Future<Output = ReviewResult<T>> + Send + 'static,
{
    let revenue = spawn_analyzer(AnalyzerKind::Revenue, revenue(Arc::clone(&records)));
    let profitability = spawn_analyzer(
        AnalyzerKind::Profitability,
        profitability(Arc::clone(&records)),
    );
    let trends = spawn_analyzer(AnalyzerKind::Trends, trends(records));

    let abort_handles = [
        revenue.abort_handle(),
        profitability.abort_handle(),
        trends.abort_handle(),
    ];

    let joined = futures::future::try_join3(
        join_analyzer(AnalyzerKind::Revenue, revenue, budget),
        join_analyzer(AnalyzerKind::Profitability, profitability, budget),
        join_analyzer(AnalyzerKind::Trends, trends, budget),
    )
    .await;

    if let Err(ref e) = joined {
        warn!("Analysis failed, cancelling remaining analyzers: {}", e);
        for handle in &abort_handles {
            handle.abort();
        }
    }

    joined
}

fn spawn_analyzer<T, Fut>(kind: AnalyzerKind, analysis: Fut) -> JoinHandle<ReviewResult<T>>
where
    T: Send + 'static,
    Fut: Future<Output = ReviewResult<T>> + Send + 'static,
{
    tokio::spawn(async move {
        debug!("{} analyzer started", kind);
        analysis.await
    })
}

/// Await one analyzer task within `budget`.
async fn join_analyzer<T>(
    kind: AnalyzerKind,
    handle: JoinHandle<ReviewResult<T>>,
    budget: Duration,
) -> ReviewResult<T> {
    match tokio::time::timeout(budget, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ReviewError::AnalyzerAborted {
            analyzer: kind,
            reason: if join_error.is_panic() {
                "task panicked".to_string()
            } else {
                "task cancelled".to_string()
            },
        }),
        Err(_) => Err(ReviewError::AnalyzerTimeout {
            analyzer: kind,
            budget,
        }),
    }
}
