//! Data module - forecast acquisition, CSV cache and row filtering

mod loader;
mod processor;
mod provider;
mod record;

pub use loader::{DataLoader, LoaderError};
pub use processor::{CategoryMatch, DataProcessor, ProcessorError};
pub use provider::{BlockingHttpClient, ForecastProvider, HttpClient, ProviderError};
pub use record::{
    countries_in_order, parse_forecast_date, ForecastRow, CATEGORY_COL, COUNTRY_COL, QUARTER_COLS,
    QUARTER_DATE_COLS,
};
