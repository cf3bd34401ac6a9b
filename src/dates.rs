// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

pub const UNKNOWN_DATE: &str = "Unknown";

static DD_MMM_YY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}-[A-Z]{3}-\d{2}$").expect("valid date regex"));
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const LOOSE_FORMATS: [&str; 6] = [
    "%m/%d/%Y", "%m/%d/%y", "%Y/%m/%d", "%d-%b-%Y", "%d-%b-%y", "%Y-%m-%d",
];

/// Normalizes a raw transaction date into the `DD-MMM-YY` key used by the
/// date table.
///
/// Missing input maps to `"Unknown"`. A time-of-day suffix after the first
/// space is dropped. Input that cannot be read as a date is returned as-is.
pub fn extract_date_key(raw: &str) -> String {
    if raw.is_empty() {
        return UNKNOWN_DATE.to_string();
    }
    let date_part = raw.split(' ').next().unwrap_or(raw);

    if DD_MMM_YY.is_match(date_part) {
        return date_part.to_string();
    }
    if ISO_DATE.is_match(date_part) {
        return match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            Ok(d) => format_key(d),
            Err(_) => date_part.to_string(),
        };
    }
    match parse_loose(date_part) {
        Some(d) => format_key(d),
        None => date_part.to_string(),
    }
}

/// `DD-MMM-YY` with an uppercase month abbreviation.
pub fn format_key(date: NaiveDate) -> String {
    date.format("%d-%b-%y").to_string().to_uppercase()
}

/// Best-effort parse for the shapes seen in exports besides the two
/// canonical ones.
pub fn parse_loose(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    LOOSE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Reads a date-table key back into a calendar date for ordering.
///
/// Two-digit years below 50 are 20xx, the rest 19xx.
pub fn sort_date(key: &str) -> Option<NaiveDate> {
    if DD_MMM_YY.is_match(key) {
        let mut parts = key.split('-');
        let day = parts.next()?.parse::<u32>().ok();
        let month = parts
            .next()
            .and_then(|m| MONTHS.iter().position(|name| *name == m));
        let year = parts.next()?.parse::<i32>().ok();
        if let (Some(day), Some(month), Some(year)) = (day, month, year) {
            let full_year = if year < 50 { 2000 + year } else { 1900 + year };
            if let Some(d) = NaiveDate::from_ymd_opt(full_year, month as u32 + 1, day) {
                return Some(d);
            }
        }
    }
    parse_loose(key)
}

/// Display order for date-table keys: calendar order for anything readable as
/// a date, unreadable keys after them, string order as the tie-break.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (sort_date(a), sort_date(b)) {
        (Some(da), Some(db)) => da.cmp(&db).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
