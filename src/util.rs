// Utility helpers for parsing and basic statistics.
//
// This module centralizes the lenient date handling and the small numeric
// helpers so the normalizer and the aggregators can assume typed values.
use crate::types::RawValue;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use std::collections::HashMap;
use std::hash::Hash;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    // Month-first before day-first, falling back when the month is > 12.
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse an oath date cell, coercing anything unreadable to `None`.
///
/// - Workbook date cells are used directly.
/// - Text is trimmed and tried against the usual registry export formats.
/// - A bare four-digit year means 1 January of that year.
/// - Plain numbers and everything else are not dates.
pub fn parse_date_safe(v: &RawValue) -> Option<NaiveDate> {
    match v {
        RawValue::DateTime(dt) => Some(dt.date()),
        RawValue::Text(s) => parse_date_str(s),
        _ => None,
    }
}

pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = s.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Whole years between the oath year and the reference year, never negative.
pub fn years_since(date: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match date {
        Some(d) => (today.year() - d.year()).max(0) as u32,
        None => 0,
    }
}

/// Round to `decimals` places, ties to even (6.25 -> 6.2, 6.35 -> 6.4).
pub fn round_to(x: f64, decimals: i32) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    // `+ 0.0` turns a negative zero into a positive one.
    (x * factor).round_ties_even() / factor + 0.0
}

/// `part / total * 100`, 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Frequency table sorted by descending count. Ties keep the order in which
/// values were first seen, so the output is deterministic.
pub fn value_counts<T, I>(items: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut index: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match index.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item.clone(), counts.len());
                counts.push((item, 1));
            }
        }
    }
    // `sort_by` is stable: equal counts stay in first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
