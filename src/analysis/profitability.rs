//! Per-category revenue, booked hours and hourly rate.

use super::{AnalyzerKind, OrderedBuckets};
use crate::error::{ReviewError, ReviewResult};
use crate::models::{CategoryBucket, ProfitabilitySummary, ShootRecord};

#[derive(Default)]
struct Tally {
    revenue: f64,
    count: usize,
    hours: f64,
}

/// Revenue divided by hours, or `None` when nothing was booked.
pub fn hourly_rate(revenue: f64, hours: f64) -> Option<f64> {
    (hours > 0.0).then(|| revenue / hours)
}

pub fn analyze(records: &[ShootRecord]) -> ReviewResult<ProfitabilitySummary> {
    if records.is_empty() {
        return Err(ReviewError::EmptyDataset {
            analyzer: AnalyzerKind::Profitability,
        });
    }

    let mut categories: OrderedBuckets<Tally> = OrderedBuckets::new();

    for record in records {
        let tally = categories.entry(&record.category);
        tally.revenue += record.amount;
        tally.count += 1;
        tally.hours += record.duration_hours();
    }

    let by_type: Vec<CategoryBucket> = categories
        .into_vec()
        .into_iter()
        .map(|(category, tally)| CategoryBucket {
            category,
            total_revenue: tally.revenue,
            shoot_count: tally.count,
            total_hours: tally.hours,
            avg_hourly_rate: hourly_rate(tally.revenue, tally.hours),
        })
        .collect();

    let total_revenue: f64 = by_type.iter().map(|c| c.total_revenue).sum();
    let total_hours: f64 = by_type.iter().map(|c| c.total_hours).sum();

    Ok(ProfitabilitySummary {
        most_profitable: most_profitable(&by_type),
        by_type,
        total_hours,
        overall_hourly_rate: hourly_rate(total_revenue, total_hours),
    })
}

/// First category reaching the highest computable rate.
fn most_profitable(by_type: &[CategoryBucket]) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for bucket in by_type {
        let Some(rate) = bucket.avg_hourly_rate else {
            continue;
        };
        match best {
            Some((_, best_rate)) if rate <= best_rate => {}
            _ => best = Some((bucket.category.as_str(), rate)),
        }
    }
    best.map(|(category, _)| category.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SAMPLE_LEDGER;
    use crate::parser::parse_records;
    use chrono::{NaiveDate, NaiveTime};

    fn shoot(category: &str, start: &str, end: &str, amount: f64) -> ShootRecord {
        ShootRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            client: "Client".to_string(),
            category: category.to_string(),
            start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            amount,
            payment_method: "Cash".to_string(),
        }
    }

    #[test]
    fn test_sample_wedding_most_profitable() {
        let records = parse_records(SAMPLE_LEDGER).unwrap();
        let summary = analyze(&records).unwrap();

        assert_eq!(summary.most_profitable.as_deref(), Some("Wedding"));

        let wedding = summary
            .by_type
            .iter()
            .find(|c| c.category == "Wedding")
            .unwrap();
        assert_eq!(wedding.shoot_count, 3);
        assert_eq!(wedding.total_hours, 24.0);
        assert_eq!(wedding.total_revenue, 8300.0);

        let portrait = summary
            .by_type
            .iter()
            .find(|c| c.category == "Portrait")
            .unwrap();
        assert_eq!(portrait.total_hours, 10.0);
        assert!((portrait.avg_hourly_rate.unwrap() - 143.0).abs() < 1e-9);

        assert_eq!(summary.total_hours, 45.0);
    }

    #[test]
    fn test_rate_matches_revenue_over_hours() {
        let records = parse_records(SAMPLE_LEDGER).unwrap();
        let summary = analyze(&records).unwrap();

        for bucket in &summary.by_type {
            let expected = bucket.total_revenue / bucket.total_hours;
            assert!((bucket.avg_hourly_rate.unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unique_maximum() {
        let records = vec![
            shoot("Portrait", "10:00", "12:00", 200.0),
            shoot("Product", "09:00", "10:30", 600.0),
            shoot("Event", "18:00", "22:00", 800.0),
        ];
        let summary = analyze(&records).unwrap();

        assert_eq!(summary.most_profitable.as_deref(), Some("Product"));
        assert!(summary
            .by_type
            .iter()
            .any(|c| Some(&c.category) == summary.most_profitable.as_ref()));
    }

    #[test]
    fn test_tie_goes_to_first_category() {
        let records = vec![
            shoot("Event", "10:00", "12:00", 200.0),
            shoot("Portrait", "10:00", "11:00", 100.0),
        ];
        let summary = analyze(&records).unwrap();
        assert_eq!(summary.most_profitable.as_deref(), Some("Event"));
    }

    #[test]
    fn test_zero_hours_not_computable() {
        assert_eq!(hourly_rate(500.0, 0.0), None);

        let bucket = CategoryBucket {
            category: "Retainer".to_string(),
            total_revenue: 500.0,
            shoot_count: 1,
            total_hours: 0.0,
            avg_hourly_rate: None,
        };
        assert_eq!(most_profitable(&[bucket]), None);
    }

    #[test]
    fn test_empty_dataset() {
        assert_eq!(
            analyze(&[]),
            Err(ReviewError::EmptyDataset {
                analyzer: AnalyzerKind::Profitability
            })
        );
    }
}
