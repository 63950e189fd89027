//! Booking frequency by month, start time and quarter.

use super::{first_max, OrderedBuckets};
use crate::error::ReviewResult;
use crate::models::{Quarter, QuarterBucket, ShootRecord, TrendSummary};

/// Busiest month, most common start time and the quarterly split.
///
/// An empty ledger is not an error here: the summary reports zero shoots
/// and no busiest month.
pub fn analyze(records: &[ShootRecord]) -> ReviewResult<TrendSummary> {
    let mut months: OrderedBuckets<usize> = OrderedBuckets::new();
    let mut start_times: OrderedBuckets<usize> = OrderedBuckets::new();
    let mut quarters = [0usize; 4];

    for record in records {
        *months.entry(&record.month_label()) += 1;
        *start_times.entry(&record.start_label()) += 1;
        quarters[record.quarter().index()] += 1;
    }

    let months = months.into_vec();
    let start_times = start_times.into_vec();

    Ok(TrendSummary {
        busiest_month: first_max(&months).map(str::to_string),
        most_common_start_time: first_max(&start_times).map(str::to_string),
        total_shoots: records.len(),
        quarterly_breakdown: Quarter::ALL
            .iter()
            .map(|&quarter| QuarterBucket {
                quarter,
                shoots: quarters[quarter.index()],
            })
            .collect(),
    })
}
