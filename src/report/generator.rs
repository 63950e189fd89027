//! Markdown report generation.
//!
//! This module renders the merged analysis, the synthesized narrative and
//! the fixed recommendations into the final year-end review document.

use crate::models::{
    AnalysisResult, Insights, ProfitabilitySummary, ReviewOutput, RevenueSummary, RunMetadata,
    TrendSummary,
};
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};

/// Everything the formatter needs for one report.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub metadata: &'a RunMetadata,
    pub analysis: &'a AnalysisResult,
    pub insights: &'a Insights,
    pub recommendations: &'a [String],
    pub generated_at: DateTime<Utc>,
    /// Prompt sent to the synthesizer, appended when present.
    pub prompt: Option<&'a str>,
}

/// Format a dollar amount with thousands separators, e.g. "$12,030.00".
pub fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Format an hourly rate, or "N/A" when it could not be computed.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{}/hr", format_money(rate)),
        None => "N/A".to_string(),
    }
}

/// Generate the complete Markdown report.
pub fn generate_markdown_report(input: &ReportInput<'_>) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# Year-End Business Review {}\n\n",
        input.metadata.year
    ));
    output.push_str(&format!(
        "Generated: {}\n\n",
        input.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));

    output.push_str(&generate_headline_section(input.analysis));
    output.push_str(&generate_revenue_section(&input.analysis.revenue));
    output.push_str(&generate_profitability_section(&input.analysis.profitability));
    output.push_str(&generate_trends_section(&input.analysis.trends));
    output.push_str(&generate_insights_section(input.insights));
    output.push_str(&generate_recommendations_section(input.recommendations));

    if let Some(prompt) = input.prompt {
        output.push_str(&generate_prompt_appendix(prompt));
    }

    output.push_str(&generate_footer(input.metadata));

    output
}

/// Headline metrics across all analyzers.
fn generate_headline_section(analysis: &AnalysisResult) -> String {
    let mut section = String::new();

    section.push_str("## Headline Metrics\n\n");
    section.push_str(&format!(
        "- **Total Revenue:** {}\n",
        format_money(analysis.revenue.total_revenue)
    ));
    section.push_str(&format!(
        "- **Total Shoots:** {}\n",
        analysis.trends.total_shoots
    ));
    section.push_str(&format!(
        "- **Total Hours:** {:.1} hrs\n",
        analysis.profitability.total_hours
    ));
    section.push_str(&format!(
        "- **Average Per Shoot:** {}\n",
        format_money(analysis.revenue.average_per_shoot)
    ));
    section.push_str(&format!(
        "- **Average Hourly Rate:** {}\n",
        format_rate(analysis.profitability.overall_hourly_rate)
    ));
    section.push('\n');

    section
}

fn generate_revenue_section(revenue: &RevenueSummary) -> String {
    let mut section = String::new();

    section.push_str("## Monthly Revenue\n\n");
    section.push_str("| Month | Revenue | Shoots |\n");
    section.push_str("|:---|---:|:---:|\n");
    for month in &revenue.monthly_breakdown {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            month.month,
            format_money(month.revenue),
            month.shoot_count
        ));
    }
    section.push('\n');

    if !revenue.payment_methods.is_empty() {
        section.push_str("### Payment Methods\n\n");
        section.push_str("| Method | Revenue | Shoots |\n");
        section.push_str("|:---|---:|:---:|\n");
        for method in &revenue.payment_methods {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                method.method,
                format_money(method.revenue),
                method.shoot_count
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_profitability_section(profitability: &ProfitabilitySummary) -> String {
    let mut section = String::new();

    section.push_str("## Profitability by Shoot Type\n\n");
    section.push_str("| Shoot Type | Revenue | Shoots | Hours | Hourly Rate |\n");
    section.push_str("|:---|---:|:---:|---:|---:|\n");
    for bucket in &profitability.by_type {
        section.push_str(&format!(
            "| {} | {} | {} | {:.1} | {} |\n",
            bucket.category,
            format_money(bucket.total_revenue),
            bucket.shoot_count,
            bucket.total_hours,
            format_rate(bucket.avg_hourly_rate)
        ));
    }
    section.push('\n');

    match profitability.most_profitable {
        Some(ref category) => section.push_str(&format!(
            "**Most profitable by hourly rate:** {}\n\n",
            category
        )),
        None => section.push_str("**Most profitable by hourly rate:** not computable\n\n"),
    }

    section
}

fn generate_trends_section(trends: &TrendSummary) -> String {
    let mut section = String::new();

    section.push_str("## Booking Trends\n\n");
    section.push_str(&format!(
        "- **Busiest Month:** {}\n",
        trends.busiest_month.as_deref().unwrap_or("N/A")
    ));
    section.push_str(&format!(
        "- **Most Common Start Time:** {}\n",
        trends.most_common_start_time.as_deref().unwrap_or("N/A")
    ));
    section.push('\n');

    section.push_str("| Quarter | Shoots |\n");
    section.push_str("|:---|:---:|\n");
    for quarter in &trends.quarterly_breakdown {
        section.push_str(&format!("| {} | {} |\n", quarter.quarter, quarter.shoots));
    }
    section.push('\n');

    section
}

fn generate_insights_section(insights: &Insights) -> String {
    let mut section = String::new();

    section.push_str("## Insights\n\n");
    match insights {
        Insights::Available { text } => {
            section.push_str(text);
            section.push_str("\n\n");
        }
        Insights::Unavailable { reason } => {
            section.push_str(&format!(
                "> **Insights unavailable:** {}\n>\n> The numeric analysis above is complete.\n\n",
                reason
            ));
        }
    }

    section
}

fn generate_recommendations_section(recommendations: &[String]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");
    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    section.push('\n');

    section
}

fn generate_prompt_appendix(prompt: &str) -> String {
    format!("## Appendix: Synthesis Prompt\n\n```text\n{}\n```\n\n", prompt)
}

fn generate_footer(metadata: &RunMetadata) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*{} shoots analyzed",
        metadata.records_analyzed
    ));
    if metadata.records_filtered > 0 {
        footer.push_str(&format!(
            " ({} outside {} excluded)",
            metadata.records_filtered, metadata.year
        ));
    }
    footer.push_str(&format!(
        " in {:.1}s. Insights by `{}`.*\n",
        metadata.duration_seconds, metadata.model_used
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(output: &ReviewOutput) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{profitability, revenue, trends};
    use crate::config::default_recommendations;
    use crate::ledger::SAMPLE_LEDGER;
    use crate::parser::parse_records;
    use chrono::TimeZone;

    fn sample_analysis() -> AnalysisResult {
        let records = parse_records(SAMPLE_LEDGER).unwrap();
        AnalysisResult {
            revenue: revenue::analyze(&records).unwrap(),
            profitability: profitability::analyze(&records).unwrap(),
            trends: trends::analyze(&records).unwrap(),
        }
    }

    fn metadata() -> RunMetadata {
        RunMetadata {
            year: 2024,
            records_analyzed: 12,
            records_filtered: 0,
            model_used: "test-model".to_string(),
            duration_seconds: 1.5,
        }
    }

    fn render(insights: &Insights) -> String {
        let analysis = sample_analysis();
        let metadata = metadata();
        let recommendations = default_recommendations();
        generate_markdown_report(&ReportInput {
            metadata: &metadata,
            analysis: &analysis,
            insights,
            recommendations: &recommendations,
            generated_at: Utc.with_ymd_and_hms(2024, 12, 31, 18, 0, 0).unwrap(),
            prompt: None,
        })
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(12030.0), "$12,030.00");
        assert_eq!(format_money(1002.5), "$1,002.50");
        assert_eq!(format_money(999.999), "$1,000.00");
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(1234567.0), "$1,234,567.00");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(Some(345.8333)), "$345.83/hr");
        assert_eq!(format_rate(None), "N/A");
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = render(&Insights::Available {
            text: "Weddings drive revenue.".to_string(),
        });

        assert!(report.contains("# Year-End Business Review 2024"));
        assert!(report.contains("Generated: 2024-12-31T18:00:00Z"));
        assert!(report.contains("**Total Revenue:** $12,030.00"));
        assert!(report.contains("| January | $2,800.00 | 2 |"));
        assert!(report.contains("| Wedding | $8,300.00 | 3 | 24.0 | $345.83/hr |"));
        assert!(report.contains("**Most profitable by hourly rate:** Wedding"));
        assert!(report.contains("**Busiest Month:** February"));
        assert!(report.contains("| Q1 | 8 |"));
        assert!(report.contains("Weddings drive revenue."));
        assert!(report.contains("1. Focus on most profitable shoot types"));
        assert!(!report.contains("Appendix"));
    }

    #[test]
    fn test_unavailable_insights_marker() {
        let report = render(&Insights::Unavailable {
            reason: "cannot connect to Ollama".to_string(),
        });

        assert!(report.contains("**Insights unavailable:** cannot connect to Ollama"));
        assert!(report.contains("## Monthly Revenue"));
        assert!(report.contains("## Booking Trends"));
    }

    #[test]
    fn test_not_computable_rate_rendered() {
        let mut analysis = sample_analysis();
        analysis.profitability.by_type[0].avg_hourly_rate = None;
        analysis.profitability.most_profitable = None;

        let section = generate_profitability_section(&analysis.profitability);
        assert!(section.contains("| N/A |"));
        assert!(section.contains("not computable"));
        assert!(!section.contains("$0.00/hr"));
    }

    #[test]
    fn test_footer_mentions_filtered_records() {
        let mut metadata = metadata();
        metadata.records_filtered = 3;
        let footer = generate_footer(&metadata);
        assert!(footer.contains("3 outside 2024 excluded"));
        assert!(footer.contains("`test-model`"));
    }

    #[test]
    fn test_generate_json_report() {
        let analysis = sample_analysis();
        let output = ReviewOutput {
            report: "# Review".to_string(),
            generated_at: Utc::now(),
            metadata: metadata(),
            analysis,
            insights: Insights::Unavailable {
                reason: "disabled".to_string(),
            },
        };
        let json = generate_json_report(&output).unwrap();

        assert!(json.contains("\"generated_at\""));
        assert!(json.contains("\"total_revenue\": 12030.0"));
        assert!(json.contains("\"status\": \"unavailable\""));
    }
}
