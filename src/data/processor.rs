//! Data Processor Module
//! Category filtering and the conversion of loosely typed frame rows into
//! [`ForecastRow`]s.

use super::record::{ForecastRow, CATEGORY_COL, COUNTRY_COL, QUARTER_COLS, QUARTER_DATE_COLS};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Dataset has no '{0}' column")]
    MissingColumn(String),
}

/// How a row's `Category` cell is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryMatch<'a> {
    /// Byte-for-byte equality.
    Exact(&'a str),
    /// Case-insensitive substring.
    Contains(&'a str),
}

/// Handles filtering and typed row extraction.
pub struct DataProcessor;

impl DataProcessor {
    /// Rows whose category matches. Null categories never match.
    ///
    /// A frame without a `Category` column (e.g. an empty dataset) matches nothing.
    pub fn filter_by_category(
        df: &DataFrame,
        category: CategoryMatch<'_>,
    ) -> Result<DataFrame, ProcessorError> {
        if df.column(CATEGORY_COL).is_err() {
            return Ok(df.clear());
        }

        match category {
            CategoryMatch::Exact(label) => {
                let filtered = df
                    .clone()
                    .lazy()
                    .filter(col(CATEGORY_COL).cast(DataType::String).eq(lit(label)))
                    .collect()?;
                Ok(filtered)
            }
            CategoryMatch::Contains(needle) => {
                let needle = needle.to_lowercase();
                let categories = df.column(CATEGORY_COL)?.cast(&DataType::String)?;
                let mask: Vec<bool> = categories
                    .str()?
                    .into_iter()
                    .map(|c| c.is_some_and(|c| c.to_lowercase().contains(&needle)))
                    .collect();
                let mask = BooleanChunked::from_slice("mask".into(), &mask);
                Ok(df.filter(&mask)?)
            }
        }
    }

    /// `Country` and `q1..q4` columns, for printing.
    pub fn preview_table(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        if df.height() == 0 {
            return Ok(df.clone());
        }
        let mut selection = vec![COUNTRY_COL];
        selection.extend(QUARTER_COLS);
        for name in &selection {
            Self::require(df, name)?;
        }
        Ok(df.select(selection)?)
    }

    /// Convert filtered rows into typed records.
    ///
    /// Rows with a null country or a null/non-numeric quarter are skipped with a
    /// warning. Only the first row per country is kept.
    pub fn to_rows(df: &DataFrame) -> Result<Vec<ForecastRow>, ProcessorError> {
        if df.height() == 0 {
            return Ok(Vec::new());
        }

        let countries = Self::require(df, COUNTRY_COL)?.cast(&DataType::String)?;
        let countries = countries.str()?;
        let categories = Self::require(df, CATEGORY_COL)?.cast(&DataType::String)?;
        let categories = categories.str()?;

        let quarter_cols = QUARTER_COLS
            .iter()
            .map(|name| Ok(Self::require(df, name)?.cast(&DataType::Float64)?))
            .collect::<Result<Vec<Column>, ProcessorError>>()?;
        let quarter_values = quarter_cols
            .iter()
            .map(|c| c.f64())
            .collect::<PolarsResult<Vec<_>>>()?;

        // Date columns are optional; inflation rows never use them.
        let date_cols = QUARTER_DATE_COLS
            .iter()
            .map(|name| df.column(name).ok().map(|c| c.cast(&DataType::String)).transpose())
            .collect::<PolarsResult<Vec<Option<Column>>>>()?;
        let date_values = date_cols
            .iter()
            .map(|c| c.as_ref().map(|c| c.str()).transpose())
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut rows: Vec<ForecastRow> = Vec::new();

        for i in 0..df.height() {
            let Some(country) = countries.get(i) else {
                warn!(row = i, "skipping forecast row without a country");
                continue;
            };

            let mut quarters = [0.0; 4];
            let mut complete = true;
            for (q, values) in quarter_values.iter().enumerate() {
                match values.get(i) {
                    Some(v) if !v.is_nan() => quarters[q] = v,
                    _ => complete = false,
                }
            }
            if !complete {
                warn!(row = i, country, "skipping forecast row with missing quarterly values");
                continue;
            }

            if rows.iter().any(|r| r.country == country) {
                debug!(row = i, country, "duplicate country row ignored; first match wins");
                continue;
            }

            let quarter_dates: [Option<String>; 4] = std::array::from_fn(|q| {
                date_values[q]
                    .and_then(|values| values.get(i))
                    .map(str::to_string)
            });

            rows.push(ForecastRow {
                country: country.to_string(),
                category: categories.get(i).unwrap_or_default().to_string(),
                quarters,
                quarter_dates,
            });
        }

        Ok(rows)
    }

    fn require<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, ProcessorError> {
        df.column(name)
            .map_err(|_| ProcessorError::MissingColumn(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "Country" => ["Mexico", "Sweden", "New Zealand", "Mexico"],
            "Category" => [Some("Core Inflation Rate"), Some("Stock Market"), None, Some("stock market index")],
            "q1" => [1.0, 2300.0, 3.0, 57000.0],
            "q2" => [1.1, 2310.0, 3.1, 57100.0],
            "q3" => [1.2, 2320.0, 3.2, 57200.0],
            "q4" => [1.3, 2330.0, 3.3, 57300.0]
        )
        .unwrap()
    }

    #[test]
    fn exact_filter_matches_only_the_label() {
        let filtered =
            DataProcessor::filter_by_category(&sample(), CategoryMatch::Exact("Core Inflation Rate"))
                .unwrap();
        let rows = DataProcessor::to_rows(&filtered).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "Mexico");
        assert_eq!(rows[0].quarters, [1.0, 1.1, 1.2, 1.3]);
    }

    #[test]
    fn contains_filter_ignores_case_and_nulls() {
        let filtered =
            DataProcessor::filter_by_category(&sample(), CategoryMatch::Contains("Stock Market"))
                .unwrap();
        assert_eq!(filtered.height(), 2);
        let countries: Vec<_> = DataProcessor::to_rows(&filtered)
            .unwrap()
            .into_iter()
            .map(|r| r.country)
            .collect();
        assert_eq!(countries, vec!["Sweden", "Mexico"]);
    }

    #[test]
    fn frame_without_category_matches_nothing() {
        let empty = DataFrame::empty();
        let filtered =
            DataProcessor::filter_by_category(&empty, CategoryMatch::Contains("stock")).unwrap();
        assert_eq!(filtered.height(), 0);
        assert!(DataProcessor::to_rows(&filtered).unwrap().is_empty());
        assert_eq!(DataProcessor::preview_table(&filtered).unwrap().width(), 0);
    }

    #[test]
    fn rows_with_missing_quarters_are_rejected() {
        let df = df!(
            "Country" => [Some("Mexico"), None, Some("Sweden")],
            "Category" => ["Core Inflation Rate"; 3],
            "q1" => [None, Some(1.0), Some(2.0)],
            "q2" => [Some(1.0), Some(1.0), Some(2.0)],
            "q3" => [Some(1.0), Some(1.0), Some(2.0)],
            "q4" => [Some(1.0), Some(1.0), Some(2.0)]
        )
        .unwrap();
        let rows = DataProcessor::to_rows(&df).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "Sweden");
    }

    #[test]
    fn first_row_per_country_wins() {
        let df = df!(
            "Country" => ["Mexico", "Mexico"],
            "Category" => ["Core Inflation Rate", "Core Inflation Rate"],
            "q1" => [1.0, 9.0],
            "q2" => [1.0, 9.0],
            "q3" => [1.0, 9.0],
            "q4" => [1.0, 9.0]
        )
        .unwrap();
        let rows = DataProcessor::to_rows(&df).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quarters, [1.0; 4]);
    }

    #[test]
    fn missing_quarter_column_is_reported() {
        let df = df!(
            "Country" => ["Mexico"],
            "Category" => ["Core Inflation Rate"],
            "q1" => [1.0]
        )
        .unwrap();
        assert!(matches!(
            DataProcessor::to_rows(&df),
            Err(ProcessorError::MissingColumn(name)) if name == "q2"
        ));
    }

    #[test]
    fn preview_keeps_country_and_quarters() {
        let table = DataProcessor::preview_table(&sample()).unwrap();
        let names: Vec<&str> = table.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["Country", "q1", "q2", "q3", "q4"]);
    }
}
