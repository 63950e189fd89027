//! Revenue totals and month buckets.

use super::{AnalyzerKind, OrderedBuckets};
use crate::error::{ReviewError, ReviewResult};
use crate::models::{MonthlyBucket, PaymentBucket, RevenueSummary, ShootRecord};

#[derive(Default)]
struct Tally {
    revenue: f64,
    count: usize,
}

/// Total revenue, revenue per month and per payment method, and the
/// average charged per shoot.
pub fn analyze(records: &[ShootRecord]) -> ReviewResult<RevenueSummary> {
    if records.is_empty() {
        return Err(ReviewError::EmptyDataset {
            analyzer: AnalyzerKind::Revenue,
        });
    }

    let mut months: OrderedBuckets<Tally> = OrderedBuckets::new();
    let mut methods: OrderedBuckets<Tally> = OrderedBuckets::new();
    let mut total_revenue = 0.0;

    for record in records {
        total_revenue += record.amount;

        let month = months.entry(&record.month_label());
        month.revenue += record.amount;
        month.count += 1;

        let method = methods.entry(&record.payment_method);
        method.revenue += record.amount;
        method.count += 1;
    }

    let monthly_breakdown = months
        .into_vec()
        .into_iter()
        .map(|(month, tally)| MonthlyBucket {
            month,
            revenue: tally.revenue,
            shoot_count: tally.count,
        })
        .collect();

    let payment_methods = methods
        .into_vec()
        .into_iter()
        .map(|(method, tally)| PaymentBucket {
            method,
            revenue: tally.revenue,
            shoot_count: tally.count,
        })
        .collect();

    Ok(RevenueSummary {
        total_revenue,
        monthly_breakdown,
        average_per_shoot: total_revenue / records.len() as f64,
        payment_methods,
    })
}
