//! Record aggregation and ledger statistics.
//!
//! This module groups timesheet records by consultant, project and
//! (activity, rate) bucket, and computes the per-consultant figures shown
//! in summaries.

use crate::models::{
    ActivityBucket, BucketKey, ConsultantLedger, Ledger, ProjectLedger, TimesheetRecord,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

/// Build the ledger from a sequence of records.
///
/// Consultants and projects keep their first-seen order. Never fails.
pub fn aggregate(records: &[TimesheetRecord]) -> Ledger {
    let mut ledger = Ledger::default();

    for record in records {
        add_record(&mut ledger, record);
    }

    debug!(
        "Aggregated {} records into {} consultants",
        records.len(),
        ledger.len()
    );

    ledger
}

/// Fold one record into the ledger.
fn add_record(ledger: &mut Ledger, record: &TimesheetRecord) {
    let consultant = record.consultant.trim();
    let project_code = record.project_code.trim();
    let currency = record.currency.trim();

    let project = ledger
        .consultants
        .entry(consultant.to_string())
        .or_default()
        .projects
        .entry(project_code.to_string())
        .or_insert_with(|| ProjectLedger::new(currency));

    // Last write wins.
    if project.currency != currency {
        warn!(
            "Currency changed from {} to {} for {} on {}",
            project.currency, currency, consultant, project_code
        );
        project.currency = currency.to_string();
    }

    project
        .activities
        .entry(BucketKey::new(&record.activity, record.rate))
        .or_insert_with(|| ActivityBucket {
            activity: record.activity.clone(),
            rate: record.rate,
            hours: Decimal::ZERO,
            currency: currency.to_string(),
        })
        .hours += record.hours;

    project.internal_ids.push(record.internal_id.clone());
    project.total_cost += record.cost;
}

/// Headline figures for one consultant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsultantSummary {
    pub consultant: String,
    pub projects: usize,
    pub hours: Decimal,
    pub total: Decimal,
    pub currency: String,
}

impl ConsultantSummary {
    fn from_ledger(consultant: &str, ledger: &ConsultantLedger) -> Self {
        Self {
            consultant: consultant.to_string(),
            projects: ledger.projects.len(),
            hours: ledger.total_hours(),
            total: ledger.grand_total(),
            currency: ledger.currency().to_string(),
        }
    }
}

/// Summaries for every consultant, in ledger order.
pub fn summarize(ledger: &Ledger) -> Vec<ConsultantSummary> {
    ledger
        .iter()
        .map(|(name, consultant)| ConsultantSummary::from_ledger(name, consultant))
        .collect()
}

/// Number of ledger lines (internal identifiers) across the whole ledger.
pub fn line_count(ledger: &Ledger) -> usize {
    ledger
        .iter()
        .flat_map(|(_, c)| c.projects.values())
        .map(|p| p.internal_ids.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        consultant: &str,
        project: &str,
        id: &str,
        activity: &str,
        rate: i64,
        hours: i64,
        cost: Decimal,
    ) -> TimesheetRecord {
        TimesheetRecord {
            date: None,
            employee_status: "AFNM".to_string(),
            consultant: consultant.to_string(),
            project_code: project.to_string(),
            internal_id: id.to_string(),
            activity: activity.to_string(),
            rate: Decimal::from(rate),
            hours: Decimal::from(hours),
            cost,
            currency: "USD".to_string(),
        }
    }

    const ANA: &str = "Pérez, Ana";
    const ADN_BRASIL: &str = "MER286403207-ADNBRA25";

    fn scenario() -> Vec<TimesheetRecord> {
        vec![
            record(ANA, ADN_BRASIL, "1", "Facilitation", 50, 2, Decimal::new(10025, 2)),
            record(ANA, ADN_BRASIL, "2", "Facilitation", 50, 3, Decimal::new(15010, 2)),
            record(ANA, ADN_BRASIL, "3", "Facilitation", 60, 1, Decimal::new(6001, 2)),
        ]
    }

    #[test]
    fn test_scenario_buckets() {
        let ledger = aggregate(&scenario());
        let project = &ledger.get(ANA).unwrap().projects[ADN_BRASIL];

        let buckets: Vec<_> = project.buckets().collect();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].rate, Decimal::from(50));
        assert_eq!(buckets[0].hours, Decimal::from(5));
        assert_eq!(buckets[1].rate, Decimal::from(60));
        assert_eq!(buckets[1].hours, Decimal::from(1));
        assert_eq!(project.total_cost, Decimal::new(31036, 2));
        assert_eq!(project.currency, "USD");
    }

    #[test]
    fn test_one_consultant_entry_per_name() {
        let mut records = scenario();
        records.push(record("Smith, John", "P1", "9", "Coaching", 10, 1, Decimal::ONE));
        records.push(record(" Pérez, Ana ", "P2", "10", "Coaching", 10, 1, Decimal::ONE));

        let ledger = aggregate(&records);
        assert_eq!(ledger.len(), 2);
        let names: Vec<_> = ledger.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec![ANA, "Smith, John"]);
        let projects: Vec<_> = ledger.get(ANA).unwrap().projects.keys().collect();
        assert_eq!(projects, vec![ADN_BRASIL, "P2"]);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let records = vec![
            record("doe, jane", "p1", "1", "A", 1, 1, Decimal::ONE),
            record("Doe, Jane", "P1", "2", "A", 1, 1, Decimal::ONE),
        ];
        assert_eq!(aggregate(&records).len(), 2);
    }

    #[test]
    fn test_same_activity_different_rate_never_merges() {
        let mut close = record(ANA, ADN_BRASIL, "1", "Coaching", 0, 1, Decimal::ONE);
        close.rate = Decimal::new(5000, 2);
        let mut other = close.clone();
        other.rate = Decimal::new(5001, 2);

        let ledger = aggregate(&[close, other]);
        let project = &ledger.get(ANA).unwrap().projects[ADN_BRASIL];
        assert_eq!(project.activities.len(), 2);
    }

    #[test]
    fn test_shuffled_rows_give_same_totals() {
        let forward = aggregate(&scenario());
        let mut reversed_records = scenario();
        reversed_records.reverse();
        let reversed = aggregate(&reversed_records);

        let a = &forward.get(ANA).unwrap().projects[ADN_BRASIL];
        let b = &reversed.get(ANA).unwrap().projects[ADN_BRASIL];

        assert_eq!(a.total_cost, b.total_cost);
        assert_eq!(a.total_hours(), b.total_hours());

        let mut ids_a = a.internal_ids.clone();
        let mut ids_b = b.internal_ids.clone();
        assert_eq!(ids_b, vec!["3", "2", "1"]);
        ids_a.sort();
        ids_b.sort();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_duplicate_ids_are_kept_in_order() {
        let records = vec![
            record(ANA, ADN_BRASIL, "7", "A", 1, 1, Decimal::ONE),
            record(ANA, ADN_BRASIL, "3", "A", 1, 1, Decimal::ONE),
            record(ANA, ADN_BRASIL, "7", "A", 1, 1, Decimal::ONE),
        ];
        let ledger = aggregate(&records);
        assert_eq!(
            ledger.get(ANA).unwrap().projects[ADN_BRASIL].internal_ids,
            vec!["7", "3", "7"]
        );
    }

    #[test]
    fn test_currency_last_write_wins() {
        let mut second = record(ANA, ADN_BRASIL, "2", "A", 1, 1, Decimal::ONE);
        second.currency = "BRL".to_string();
        let records = vec![record(ANA, ADN_BRASIL, "1", "A", 1, 1, Decimal::ONE), second];

        let ledger = aggregate(&records);
        let project = &ledger.get(ANA).unwrap().projects[ADN_BRASIL];
        assert_eq!(project.currency, "BRL");
        // The bucket keeps the currency it was opened with.
        assert_eq!(project.buckets().next().unwrap().currency, "USD");
    }

    #[test]
    fn test_empty_input() {
        let ledger = aggregate(&[]);
        assert!(ledger.is_empty());
        assert!(summarize(&ledger).is_empty());
    }

    #[test]
    fn test_summarize_and_line_count() {
        let mut records = scenario();
        records.push(record(ANA, "P2", "4", "Design", 20, 4, Decimal::from(80)));

        let ledger = aggregate(&records);
        let summaries = summarize(&ledger);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].projects, 2);
        assert_eq!(summaries[0].hours, Decimal::from(10));
        assert_eq!(summaries[0].total, Decimal::new(39036, 2));
        assert_eq!(line_count(&ledger), 4);
    }
}
