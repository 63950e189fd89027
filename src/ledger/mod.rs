//! Ledger providers.
//!
//! A ledger provider returns the raw delimited booking text for a year.
//! The year is a hint; providers may return bookings from other years.

use crate::error::{ReviewError, ReviewResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

/// The documented sample ledger used when no source is configured.
pub const SAMPLE_LEDGER: &str = "\
Date,Client,Shoot Type,Start Time,End Time,Amount Charged,Payment Method
2024-01-15,Sarah Johnson,Portrait,2:00 PM,4:00 PM,300,Venmo
2024-01-20,Mike & Emma,Wedding,10:00 AM,6:00 PM,2500,Venmo
2024-02-03,TechCorp,Product,1:00 PM,3:00 PM,400,Bank Transfer
2024-02-10,Lisa Chen,Portrait,3:00 PM,5:00 PM,280,Venmo
2024-02-14,David & Rachel,Engagement,11:00 AM,1:00 PM,500,Venmo
2024-03-05,Local Business,Event,5:00 PM,9:00 PM,800,Cash
2024-03-12,Jennifer Smith,Portrait,1:00 PM,3:00 PM,300,Venmo
2024-03-25,Anderson Wedding,Wedding,12:00 PM,8:00 PM,3000,Bank Transfer
2024-04-08,Marcus Brown,Portrait,10:00 AM,12:00 PM,250,Venmo
2024-04-15,StartupXYZ,Product,2:00 PM,5:00 PM,600,Bank Transfer
2024-05-01,Taylor & Jordan,Wedding,11:00 AM,7:00 PM,2800,Venmo
2024-05-20,Emma Wilson,Portrait,4:00 PM,6:00 PM,300,Venmo";

/// Source of raw booking records.
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Fetch the ledger text (header row first) for `year`.
    async fn fetch(&self, year: i32) -> ReviewResult<String>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}

/// Built-in sample bookings.
#[derive(Debug, Clone, Default)]
pub struct SampleLedger;

#[async_trait]
impl LedgerProvider for SampleLedger {
    async fn fetch(&self, year: i32) -> ReviewResult<String> {
        debug!("Serving sample ledger for {}", year);
        Ok(SAMPLE_LEDGER.to_string())
    }

    fn describe(&self) -> String {
        "built-in sample ledger".to_string()
    }
}

/// Bookings exported to a CSV file.
#[derive(Debug, Clone)]
pub struct CsvFileLedger {
    path: PathBuf,
}

impl CsvFileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LedgerProvider for CsvFileLedger {
    async fn fetch(&self, year: i32) -> ReviewResult<String> {
        info!("Reading ledger for {} from {}", year, self.path.display());
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ReviewError::Provider(format!("cannot read {}: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        format!("CSV ledger at {}", self.path.display())
    }
}
