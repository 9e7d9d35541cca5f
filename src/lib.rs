//! Forecast Charts - quarterly forecast comparison for a fixed set of countries
//!
//! Fetches Trading Economics forecasts (or reads them from a CSV cache) and
//! renders core inflation and stock market comparison charts.

pub mod charts;
pub mod config;
pub mod data;
