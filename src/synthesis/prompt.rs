//! Prompt construction for the insight synthesizer.

use crate::models::AnalysisResult;
use crate::report::{format_money, format_rate};

/// Serialize the merged analysis into the synthesizer prompt.
pub fn build_prompt(analysis: &AnalysisResult, year: i32) -> String {
    let revenue = &analysis.revenue;
    let profitability = &analysis.profitability;
    let trends = &analysis.trends;

    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Based on the following {} photography business data, provide strategic insights and actionable recommendations.\n\n",
        year
    ));

    prompt.push_str("REVENUE DATA:\n");
    prompt.push_str(&format!(
        "- Total Annual Revenue: {}\n",
        format_money(revenue.total_revenue)
    ));
    prompt.push_str(&format!(
        "- Average Per Shoot: {}\n",
        format_money(revenue.average_per_shoot)
    ));
    prompt.push_str("- Monthly breakdown:\n");
    for month in &revenue.monthly_breakdown {
        prompt.push_str(&format!(
            "  - {}: {} ({} shoots)\n",
            month.month,
            format_money(month.revenue),
            month.shoot_count
        ));
    }
    prompt.push_str("- Payment methods:\n");
    for method in &revenue.payment_methods {
        prompt.push_str(&format!(
            "  - {}: {} ({} shoots)\n",
            method.method,
            format_money(method.revenue),
            method.shoot_count
        ));
    }

    prompt.push_str("\nPROFITABILITY BY SHOOT TYPE:\n");
    for bucket in &profitability.by_type {
        prompt.push_str(&format!(
            "- {}: {} ({} shoots, {:.1} hrs, {} total)\n",
            bucket.category,
            format_rate(bucket.avg_hourly_rate),
            bucket.shoot_count,
            bucket.total_hours,
            format_money(bucket.total_revenue)
        ));
    }
    prompt.push_str(&format!(
        "- Most Profitable: {}\n",
        profitability.most_profitable.as_deref().unwrap_or("N/A")
    ));
    prompt.push_str(&format!(
        "- Overall: {} across {:.1} hrs\n",
        format_rate(profitability.overall_hourly_rate),
        profitability.total_hours
    ));

    prompt.push_str("\nTRENDS:\n");
    prompt.push_str(&format!("- Total Shoots: {}\n", trends.total_shoots));
    prompt.push_str(&format!(
        "- Busiest Month: {}\n",
        trends.busiest_month.as_deref().unwrap_or("N/A")
    ));
    prompt.push_str(&format!(
        "- Most Common Start Time: {}\n",
        trends.most_common_start_time.as_deref().unwrap_or("N/A")
    ));
    let quarters: Vec<String> = trends
        .quarterly_breakdown
        .iter()
        .map(|q| format!("{} {}", q.quarter, q.shoots))
        .collect();
    prompt.push_str(&format!("- Quarterly: {}\n", quarters.join(", ")));

    prompt.push_str(
        "\nPlease provide:\n\
         1. Key insights about business performance\n\
         2. Specific recommendations for growth\n\
         3. Pricing strategy suggestions\n\
         4. Areas to focus on or potentially phase out\n\n\
         Keep it concise but actionable.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{profitability, revenue, trends};
    use crate::ledger::SAMPLE_LEDGER;
    use crate::parser::parse_records;

    fn sample_analysis() -> AnalysisResult {
        let records = parse_records(SAMPLE_LEDGER).unwrap();
        AnalysisResult {
            revenue: revenue::analyze(&records).unwrap(),
            profitability: profitability::analyze(&records).unwrap(),
            trends: trends::analyze(&records).unwrap(),
        }
    }

    #[test]
    fn test_prompt_contains_all_sections() {
        let prompt = build_prompt(&sample_analysis(), 2024);

        assert!(prompt.contains("2024 photography business data"));
        assert!(prompt.contains("Total Annual Revenue: $12,030.00"));
        assert!(prompt.contains("January: $2,800.00 (2 shoots)"));
        assert!(prompt.contains("- Wedding: $345.83/hr (3 shoots, 24.0 hrs, $8,300.00 total)"));
        assert!(prompt.contains("Most Profitable: Wedding"));
        assert!(prompt.contains("Busiest Month: February"));
        assert!(prompt.contains("Most Common Start Time: 2:00 PM"));
        assert!(prompt.contains("Quarterly: Q1 8, Q2 4, Q3 0, Q4 0"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let analysis = sample_analysis();
        assert_eq!(build_prompt(&analysis, 2024), build_prompt(&analysis, 2024));
    }
}
