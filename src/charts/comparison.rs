//! Country comparison charts built from the forecast dataset.

use super::display::ChartDisplay;
use super::plotter::{Figure, LegendPlacement, Series, XAxis};
use super::renderer::ChartError;
use crate::data::{
    countries_in_order, parse_forecast_date, CategoryMatch, DataProcessor, ForecastRow,
    QUARTER_COLS, QUARTER_DATE_COLS,
};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::info;

pub const CORE_INFLATION_CATEGORY: &str = "Core Inflation Rate";
/// Matched as a case-insensitive substring.
pub const STOCK_MARKET_CATEGORY: &str = "Stock Market";

pub const INFLATION_CANVAS: (u32, u32) = (800, 500);
pub const STOCK_MARKET_CANVAS: (u32, u32) = (1000, 600);

/// Axes-relative anchor for the stock chart's outside legend.
pub const OUTSIDE_LEGEND_ANCHOR: (f64, f64) = (1.05, 1.0);

/// Line chart of core inflation per quarter, one line per country.
///
/// Prints the filtered rows before drawing.
pub fn render_core_inflation_comparison(
    dataset: &DataFrame,
    display: &mut impl ChartDisplay,
) -> Result<(), ChartError> {
    let filtered =
        DataProcessor::filter_by_category(dataset, CategoryMatch::Exact(CORE_INFLATION_CATEGORY))?;
    println!("{}", DataProcessor::preview_table(&filtered)?);

    let rows = DataProcessor::to_rows(&filtered)?;
    let figure = core_inflation_figure(&rows);
    info!(series = figure.series.len(), "rendering core inflation comparison");
    display.show(&figure)
}

/// Stock index per quarter date, four single-quarter series per country.
pub fn render_stock_market_comparison(
    dataset: &DataFrame,
    display: &mut impl ChartDisplay,
) -> Result<(), ChartError> {
    let filtered =
        DataProcessor::filter_by_category(dataset, CategoryMatch::Contains(STOCK_MARKET_CATEGORY))?;

    let rows = DataProcessor::to_rows(&filtered)?;
    let figure = stock_market_figure(&rows)?;
    info!(series = figure.series.len(), "rendering stock market comparison");
    display.show(&figure)
}

pub fn core_inflation_figure(rows: &[ForecastRow]) -> Figure {
    let categories = QUARTER_COLS.iter().map(|q| q.to_string()).collect();
    let mut fig = Figure::new(INFLATION_CANVAS, XAxis::Categories(categories));

    for row in rows {
        fig.plot(Series::categorical(&row.country, row.quarters.to_vec()));
    }

    fig.set_title(format!(
        "Quarterly Core Inflation Rate Comparison: {}",
        countries_in_order(rows).join(", ")
    ));
    fig.set_axis_labels("Quarter", "Core Inflation Rate (%)");
    fig.set_legend(LegendPlacement::Inside);
    fig.tight_layout();
    fig
}

/// Fails on the first missing or unparseable quarter date.
pub fn stock_market_figure(rows: &[ForecastRow]) -> Result<Figure, ChartError> {
    let mut fig = Figure::new(STOCK_MARKET_CANVAS, XAxis::Dates);

    for row in rows {
        let dates = quarter_dates(row)?;
        for (q, (date, value)) in dates.into_iter().zip(row.quarters).enumerate() {
            fig.plot(Series::dated(
                format!("{} Q{}", row.country, q + 1),
                vec![(date, value)],
            ));
        }
    }

    fig.set_title(format!(
        "Quarterly Stock Market Comparison across Countries: {}",
        countries_in_order(rows).join(", ")
    ));
    fig.set_axis_labels("Date", "Stock Market Index");
    fig.set_legend(LegendPlacement::OutsideUpperLeft {
        anchor: OUTSIDE_LEGEND_ANCHOR,
    });
    fig.tight_layout();
    Ok(fig)
}

fn quarter_dates(row: &ForecastRow) -> Result<[NaiveDate; 4], ChartError> {
    let mut dates = [NaiveDate::MIN; 4];
    for (q, raw) in row.quarter_dates.iter().enumerate() {
        let column = QUARTER_DATE_COLS[q];
        let raw = raw.as_deref().ok_or_else(|| ChartError::MissingDate {
            country: row.country.clone(),
            column,
        })?;
        dates[q] = parse_forecast_date(raw).ok_or_else(|| ChartError::InvalidDate {
            country: row.country.clone(),
            column,
            value: raw.to_string(),
        })?;
    }
    Ok(dates)
}
