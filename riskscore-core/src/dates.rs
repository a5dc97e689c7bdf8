//! ISO calendar date helpers shared by scoring, status and validation
//!
//! Records carry dates as `YYYY-MM-DD` strings where empty means "not set".

use chrono::{Months, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

const ISO_FORMAT: &str = "%Y-%m-%d";

fn iso_pattern() -> &'static Regex {
    static ISO_RE: OnceLock<Regex> = OnceLock::new();
    ISO_RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

/// Parse a `YYYY-MM-DD` string; `None` for empty, malformed or impossible dates
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if !iso_pattern().is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, ISO_FORMAT).ok()
}

/// True for the empty string or a well-formed calendar date
pub fn is_empty_or_iso_date(value: &str) -> bool {
    value.trim().is_empty() || parse_iso_date(value).is_some()
}

/// Format a date as `YYYY-MM-DD`
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Add calendar months, keeping the day of month
///
/// When the target month is shorter the result is its last day
/// (2024-01-31 + 1 month = 2024-02-29).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}
