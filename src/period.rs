//! Reporting period inference.
//!
//! The billing month is the most frequent calendar month among the record
//! dates. Month names are looked up per locale.

use crate::models::Locale;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

const SPANISH_MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Month used when nothing better is known.
pub const DEFAULT_MONTH: u32 = 5;

/// The month and year an invoicing run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    /// Calendar month, 1-12.
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }

    /// Month name in the given locale.
    pub fn month_name(&self, locale: Locale) -> &'static str {
        month_name(self.month, locale)
    }

    /// Month name used in file names (always the default locale).
    pub fn display_name(&self) -> &'static str {
        self.month_name(Locale::Spanish)
    }
}

/// Look up a month name. Out-of-range months fall back to May.
pub fn month_name(month: u32, locale: Locale) -> &'static str {
    let names = match locale {
        Locale::Spanish => &SPANISH_MONTHS,
        Locale::English => &ENGLISH_MONTHS,
    };
    let index = if (1..=12).contains(&month) {
        month
    } else {
        DEFAULT_MONTH
    };
    names[(index - 1) as usize]
}

/// Pick the modal month of the given dates.
///
/// Ties go to the smallest month number. The year is the modal year among
/// the dates of that month. Returns `fallback` when no date is present.
pub fn infer_period<I>(dates: I, fallback: Period) -> Period
where
    I: IntoIterator<Item = Option<NaiveDate>>,
{
    let dates: Vec<NaiveDate> = dates.into_iter().flatten().collect();

    let Some(month) = mode(dates.iter().map(|d| d.month())) else {
        return fallback;
    };

    let year = mode(
        dates
            .iter()
            .filter(|d| d.month() == month)
            .map(|d| d.year()),
    )
    .unwrap_or(fallback.year);

    Period { month, year }
}

/// Most frequent value; the smallest one wins a tie.
fn mode<T: Ord>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        let better = best
            .as_ref()
            .map_or(true, |(_, best_count)| count > *best_count);
        if better {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}
