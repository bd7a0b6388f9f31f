//! Data models for the invoicing email pipeline.
//!
//! This module contains the parsed timesheet rows, the nested ledger built
//! from them, and the rendered emails.

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// One row of the timesheet export after field coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimesheetRecord {
    /// Work date, if the cell could be parsed.
    pub date: Option<NaiveDate>,
    /// Employment status used by the upstream filter (e.g. `AFNM`).
    pub employee_status: String,
    /// Consultant name, usually `Last, First Middle`.
    pub consultant: String,
    /// Project code.
    pub project_code: String,
    /// Internal identifier of the timesheet line.
    pub internal_id: String,
    /// Activity label.
    pub activity: String,
    /// Hourly rate in the consultant currency.
    pub rate: Decimal,
    /// Hours worked.
    pub hours: Decimal,
    /// Cost in the original currency.
    pub cost: Decimal,
    /// Currency code.
    pub currency: String,
}

/// Language of a rendered email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Default template.
    #[default]
    Spanish,
    /// Alternate template.
    English,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Spanish => write!(f, "Spanish"),
            Locale::English => write!(f, "English"),
        }
    }
}

/// Grouping key of an activity bucket: the exact (label, rate) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub activity: String,
    pub rate: Decimal,
}

impl BucketKey {
    pub fn new(activity: &str, rate: Decimal) -> Self {
        Self {
            activity: activity.to_string(),
            rate,
        }
    }
}

/// Hours accumulated for one activity at one rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityBucket {
    pub activity: String,
    pub rate: Decimal,
    pub hours: Decimal,
    /// Currency of the record that opened the bucket.
    pub currency: String,
}

/// Everything billed by one consultant on one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectLedger {
    /// Activity buckets in first-seen order.
    #[serde(serialize_with = "serialize_buckets")]
    pub activities: IndexMap<BucketKey, ActivityBucket>,
    /// Internal identifiers in insertion order, duplicates kept.
    pub internal_ids: Vec<String>,
    /// Sum of the record costs.
    pub total_cost: Decimal,
    /// Currency of the most recent record.
    pub currency: String,
}

impl ProjectLedger {
    /// Creates an empty project ledger in the given currency.
    pub fn new(currency: &str) -> Self {
        Self {
            activities: IndexMap::new(),
            internal_ids: Vec::new(),
            total_cost: Decimal::ZERO,
            currency: currency.to_string(),
        }
    }

    /// Iterates over the activity buckets in first-seen order.
    pub fn buckets(&self) -> impl Iterator<Item = &ActivityBucket> {
        self.activities.values()
    }

    /// Total hours across all buckets.
    pub fn total_hours(&self) -> Decimal {
        self.buckets().map(|b| b.hours).sum()
    }
}

fn serialize_buckets<S>(
    activities: &IndexMap<BucketKey, ActivityBucket>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(activities.values())
}

/// All projects of one consultant, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsultantLedger {
    pub projects: IndexMap<String, ProjectLedger>,
}

impl ConsultantLedger {
    /// Sum of every project subtotal.
    pub fn grand_total(&self) -> Decimal {
        self.projects.values().map(|p| p.total_cost).sum()
    }

    /// Total hours across all projects.
    pub fn total_hours(&self) -> Decimal {
        self.projects.values().map(ProjectLedger::total_hours).sum()
    }

    /// Currency shown on the grand total line: the last project's.
    pub fn currency(&self) -> &str {
        self.projects
            .values()
            .last()
            .map(|p| p.currency.as_str())
            .unwrap_or("")
    }

    /// Whether the projects disagree on currency.
    pub fn has_mixed_currencies(&self) -> bool {
        let mut currencies = self.projects.values().map(|p| p.currency.as_str());
        match currencies.next() {
            Some(first) => currencies.any(|c| c != first),
            None => false,
        }
    }
}

/// The complete ledger: consultants in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ledger {
    pub consultants: IndexMap<String, ConsultantLedger>,
}

impl Ledger {
    /// Number of distinct consultants.
    pub fn len(&self) -> usize {
        self.consultants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consultants.is_empty()
    }

    /// Looks up a consultant by exact name.
    #[cfg(test)]
    pub fn get(&self, consultant: &str) -> Option<&ConsultantLedger> {
        self.consultants.get(consultant)
    }

    /// Iterates over consultants in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConsultantLedger)> {
        self.consultants.iter()
    }
}

/// A rendered invoicing request for one consultant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    /// Consultant the email is addressed to.
    pub consultant: String,
    /// First name used in the greeting and the file name.
    pub first_name: String,
    /// Template language.
    pub locale: Locale,
    /// Subject line.
    pub subject: String,
    /// Plain-text body (starts with the subject line).
    pub body: String,
}
