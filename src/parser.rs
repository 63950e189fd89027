//! Ledger parsing.
//!
//! Turns the delimited text returned by a ledger provider into typed
//! shoot records. Every bad row is reported, never coerced.

use crate::error::{ReviewError, ReviewResult};
use crate::models::ShootRecord;
use chrono::{Datelike, NaiveDate, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

/// Columns in ledger order:
/// Date, Client, Shoot Type, Start Time, End Time, Amount Charged, Payment Method.
pub const EXPECTED_FIELDS: usize = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%I:%M %p", "%H:%M"];

/// Parse ledger text (header row first) into records, in source order.
///
/// Rows are numbered from 1 over data rows only: the header and blank or
/// whitespace-only lines do not count. The header itself is row 0.
pub fn parse_records(text: &str) -> ReviewResult<Vec<ShootRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| ReviewError::MalformedRecord {
            row: 0,
            raw: source_line(text, 0),
            reason: e.to_string(),
        })?
        .clone();
    if header.is_empty() {
        return Ok(Vec::new());
    }
    check_header(text, &header)?;

    let mut records = Vec::new();
    let mut row = 0;

    for result in reader.records() {
        let fields = result.map_err(|e| ReviewError::MalformedRecord {
            row: row + 1,
            raw: e
                .position()
                .map(|pos| source_line(text, pos.byte()))
                .unwrap_or_default(),
            reason: e.to_string(),
        })?;

        // Blank lines inside the ledger are not bookings.
        if fields.len() == 1 && fields[0].is_empty() {
            continue;
        }

        row += 1;
        let raw = fields
            .position()
            .map(|pos| source_line(text, pos.byte()))
            .unwrap_or_default();
        records.push(parse_row(row, &raw, &fields)?);
    }

    debug!("Parsed {} shoot records", records.len());
    Ok(records)
}

/// The header must have one column per field and must not be a booking.
fn check_header(text: &str, header: &StringRecord) -> ReviewResult<()> {
    let malformed = |reason: String| ReviewError::MalformedRecord {
        row: 0,
        raw: source_line(text, 0),
        reason,
    };

    if header.len() != EXPECTED_FIELDS {
        return Err(malformed(format!(
            "header has {} columns, expected {}",
            header.len(),
            EXPECTED_FIELDS
        )));
    }
    if NaiveDate::parse_from_str(&header[0], DATE_FORMAT).is_ok() {
        return Err(malformed(
            "missing header row: the first line is a booking".to_string(),
        ));
    }

    Ok(())
}

/// The ledger line of the record starting at `byte`, as written.
///
/// A record's position can sit on the line break or empty lines the reader
/// skipped before it, so those are passed over.
fn source_line(text: &str, byte: u64) -> String {
    let start = usize::try_from(byte).unwrap_or(text.len()).min(text.len());
    text.get(start..)
        .unwrap_or_default()
        .lines()
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn parse_row(row: usize, raw: &str, fields: &StringRecord) -> ReviewResult<ShootRecord> {
    let malformed = |reason: String| ReviewError::MalformedRecord {
        row,
        raw: raw.to_string(),
        reason,
    };

    if fields.len() != EXPECTED_FIELDS {
        return Err(malformed(format!(
            "expected {} fields, found {}",
            EXPECTED_FIELDS,
            fields.len()
        )));
    }

    let date = NaiveDate::parse_from_str(&fields[0], DATE_FORMAT)
        .map_err(|_| malformed(format!("invalid date '{}'", &fields[0])))?;
    let start_time = parse_time(&fields[3])
        .ok_or_else(|| malformed(format!("invalid start time '{}'", &fields[3])))?;
    let end_time = parse_time(&fields[4])
        .ok_or_else(|| malformed(format!("invalid end time '{}'", &fields[4])))?;
    let amount = parse_amount(&fields[5])
        .ok_or_else(|| malformed(format!("invalid amount '{}'", &fields[5])))?;

    if end_time <= start_time {
        return Err(malformed(format!(
            "end time '{}' is not after start time '{}'",
            &fields[4], &fields[3]
        )));
    }

    Ok(ShootRecord {
        date,
        client: fields[1].to_string(),
        category: fields[2].to_string(),
        start_time,
        end_time,
        amount,
        payment_method: fields[6].to_string(),
    })
}

/// Accepts "2:00 PM" style and 24-hour "14:00" style times.
fn parse_time(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
}

/// A finite, non-negative amount, optionally prefixed with '$'.
fn parse_amount(s: &str) -> Option<f64> {
    let amount: f64 = s.strip_prefix('$').unwrap_or(s).trim().parse().ok()?;
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

/// Keep only the records dated in `year`. Returns the kept records and
/// how many were dropped.
pub fn retain_year(records: Vec<ShootRecord>, year: i32) -> (Vec<ShootRecord>, usize) {
    let before = records.len();
    let kept: Vec<ShootRecord> = records
        .into_iter()
        .filter(|r| r.date.year() == year)
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
