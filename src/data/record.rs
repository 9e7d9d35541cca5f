//! Typed forecast rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const COUNTRY_COL: &str = "Country";
pub const CATEGORY_COL: &str = "Category";
pub const QUARTER_COLS: [&str; 4] = ["q1", "q2", "q3", "q4"];
pub const QUARTER_DATE_COLS: [&str; 4] = ["q1_date", "q2_date", "q3_date", "q4_date"];

/// One (country, category) forecast after it passed the filter boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub country: String,
    pub category: String,
    pub quarters: [f64; 4],
    /// Raw `qN_date` cells; only stock-market rows are expected to carry them.
    pub quarter_dates: [Option<String>; 4],
}

/// Parse a forecast date cell.
///
/// The API emits `2024-03-31T00:00:00`; cached or hand-edited files may carry
/// plain dates or an offset.
pub fn parse_forecast_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Unique countries in first-seen order.
pub fn countries_in_order(rows: &[ForecastRow]) -> Vec<String> {
    let mut countries: Vec<String> = Vec::new();
    for row in rows {
        if !countries.contains(&row.country) {
            countries.push(row.country.clone());
        }
    }
    countries
}
