//! Timesheet CSV ingestion.
//!
//! Reads the billing export, checks that every required column is present,
//! and coerces each row into a [`TimesheetRecord`]. Structural problems
//! (I/O, CSV syntax, missing columns) fail the whole batch; bad individual
//! fields degrade to defaults.

use crate::models::TimesheetRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const COL_DATE: &str = "Date";
pub const COL_STATUS: &str = "Employee Status";
pub const COL_CONSULTANT: &str = "Consultant";
pub const COL_PROJECT: &str = "Prj Code";
pub const COL_INTERNAL_ID: &str = "Internal ID";
pub const COL_ACTIVITY: &str = "Activity";
pub const COL_RATE: &str = "Cost (Consultant Curr)";
pub const COL_HOURS: &str = "Total Hours";
pub const COL_COST: &str = "Total Cost (Orig Currency)";
pub const COL_CURRENCY: &str = "Consultant Currency";

/// Columns that must appear (exact, whitespace-sensitive) in the header row.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_DATE,
    COL_STATUS,
    COL_CONSULTANT,
    COL_PROJECT,
    COL_INTERNAL_ID,
    COL_ACTIVITY,
    COL_RATE,
    COL_HOURS,
    COL_COST,
    COL_CURRENCY,
];

/// Placeholder for a missing activity label.
pub const DEFAULT_ACTIVITY: &str = "Activity";
/// Placeholder for a blank consultant name or project code.
pub const UNKNOWN: &str = "Unknown";
/// Placeholder for a blank internal identifier.
pub const MISSING_ID: &str = "N/A";

/// Separator between the category path and the label in activity cells.
const ACTIVITY_SEPARATOR: &str = " : ";

const ISO_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DAY_FIRST_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const SHORT_YEAR_FORMATS: [&str; 3] = ["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

/// Fatal ingestion errors.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// A row as it appears in the file, before coercion.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Employee Status")]
    employee_status: Option<String>,
    #[serde(rename = "Consultant")]
    consultant: Option<String>,
    #[serde(rename = "Prj Code")]
    project_code: Option<String>,
    #[serde(rename = "Internal ID")]
    internal_id: Option<String>,
    #[serde(rename = "Activity")]
    activity: Option<String>,
    #[serde(rename = "Cost (Consultant Curr)")]
    rate: Option<String>,
    #[serde(rename = "Total Hours")]
    hours: Option<String>,
    #[serde(rename = "Total Cost (Orig Currency)")]
    cost: Option<String>,
    #[serde(rename = "Consultant Currency")]
    currency: Option<String>,
}

impl RawRow {
    fn into_record(self) -> TimesheetRecord {
        TimesheetRecord {
            date: self.date.as_deref().and_then(parse_date),
            employee_status: text_or(self.employee_status.as_deref(), ""),
            consultant: text_or(self.consultant.as_deref(), UNKNOWN),
            project_code: text_or(self.project_code.as_deref(), UNKNOWN),
            internal_id: text_or(self.internal_id.as_deref(), MISSING_ID),
            activity: activity_label(self.activity.as_deref()),
            rate: parse_or_default::<Decimal>(self.rate.as_deref()),
            hours: parse_or_default::<Decimal>(self.hours.as_deref()),
            cost: parse_or_default::<Decimal>(self.cost.as_deref()),
            currency: text_or(self.currency.as_deref(), ""),
        }
    }
}

/// Read and coerce every row of a timesheet file.
pub fn read_timesheet(path: &Path) -> Result<Vec<TimesheetRecord>> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_timesheet(file)
}

/// Parse timesheet CSV data from any reader.
pub fn parse_timesheet<R: Read>(input: R) -> Result<Vec<TimesheetRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    check_columns(&headers)?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let row: RawRow = result?;
        records.push(row.into_record());
    }

    debug!("Parsed {} timesheet rows", records.len());
    Ok(records)
}

/// Verify that every required column is present in the header row.
fn check_columns(headers: &csv::StringRecord) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestError::MissingColumns(missing))
    }
}

/// Keep only the records whose employment status matches exactly.
pub fn filter_by_status(records: Vec<TimesheetRecord>, status: &str) -> Vec<TimesheetRecord> {
    records
        .into_iter()
        .filter(|r| r.employee_status == status)
        .collect()
}

/// Parse a field, falling back to the type's default when it is blank or
/// cannot be parsed.
pub fn parse_or_default<T>(raw: Option<&str>) -> T
where
    T: FromStr + Default,
{
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return T::default();
    };

    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            debug!("Unparseable value {:?}, using default", value);
            T::default()
        }
    }
}

/// Trimmed text, or `placeholder` when blank.
fn text_or(raw: Option<&str>, placeholder: &str) -> String {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => placeholder.to_string(),
    }
}

/// Keep the part of an activity cell after its last ` : ` separator.
pub fn activity_label(raw: Option<&str>) -> String {
    let label = raw
        .and_then(|value| value.rsplit(ACTIVITY_SEPARATOR).next())
        .map(str::trim)
        .unwrap_or("");

    if label.is_empty() {
        DEFAULT_ACTIVITY.to_string()
    } else {
        label.to_string()
    }
}

/// Parse a date cell, reading ambiguous dates day-first.
///
/// Any time part after a space or `T` is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split([' ', 'T']).next()?;
    if date_part.is_empty() {
        return None;
    }

    let mut segments = date_part.split(['/', '-', '.']);
    let first = segments.next().unwrap_or("");
    let last = segments.last().unwrap_or("");

    let formats: &[&str] = if first.len() == 4 {
        &ISO_DATE_FORMATS
    } else if last.len() == 2 {
        &SHORT_YEAR_FORMATS
    } else {
        &DAY_FIRST_FORMATS
    };

    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}
