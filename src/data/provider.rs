//! Forecast provider: cached CSV first, Trading Economics API otherwise.
//!
//! The HTTP transport sits behind [`HttpClient`] so the cache logic can be
//! exercised without a network.

use super::loader::{DataLoader, LoaderError};
use crate::config::Config;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("forecast API returned HTTP {status}")]
    Status { status: u16 },

    #[error("parse error: {0}")]
    Parse(#[from] LoaderError),

    #[error("failed to write cache file {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: LoaderError,
    },
}

/// Minimal blocking GET used by the provider.
pub trait HttpClient {
    /// Fetch `url` and return the body of a 2xx response.
    fn get(&self, url: &str) -> Result<String, ProviderError>;
}

/// reqwest-backed client. Relies on reqwest's own timeout; no retries.
pub struct BlockingHttpClient {
    client: reqwest::blocking::Client,
}

impl BlockingHttpClient {
    pub fn new() -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for BlockingHttpClient {
    fn get(&self, url: &str) -> Result<String, ProviderError> {
        // without_url: the query string carries the API key
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProviderError::Fetch(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        resp.text()
            .map_err(|e| ProviderError::Fetch(e.without_url().to_string()))
    }
}

/// Resolves the forecast dataset for the configured countries.
pub struct ForecastProvider<C = BlockingHttpClient> {
    config: Config,
    client: C,
}

impl ForecastProvider<BlockingHttpClient> {
    pub fn new(config: Config) -> Result<Self, ProviderError> {
        Ok(Self::with_client(config, BlockingHttpClient::new()?))
    }
}

impl<C: HttpClient> ForecastProvider<C> {
    pub fn with_client(config: Config, client: C) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read `cache_path` if it exists, otherwise fetch from the API and
    /// write the result there.
    #[instrument(skip_all, fields(cache = %cache_path.display()))]
    pub fn load_or_fetch(&self, cache_path: &Path) -> Result<DataFrame, ProviderError> {
        if cache_path.exists() {
            let df = DataLoader::read_csv(cache_path)?;
            info!(rows = df.height(), "loaded forecasts from cache");
            return Ok(df);
        }

        let mut df = self.fetch()?;
        DataLoader::write_csv(&mut df, cache_path).map_err(|source| ProviderError::CacheWrite {
            path: cache_path.to_path_buf(),
            source,
        })?;
        info!(rows = df.height(), "cached fetched forecasts");
        Ok(df)
    }

    /// One GET against the forecast endpoint, decoded into a DataFrame.
    pub fn fetch(&self) -> Result<DataFrame, ProviderError> {
        let url = self.config.forecast_url()?;
        info!(url = %self.config.redacted_forecast_url(), "fetching forecasts");

        let body = self.client.get(&url)?;
        debug!(bytes = body.len(), "forecast response received");

        Ok(DataLoader::from_json(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    enum Reply {
        Body(&'static str),
        Status(u16),
        Unreachable,
    }

    struct FakeClient {
        reply: Reply,
        calls: RefCell<Vec<String>>,
    }

    impl FakeClient {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl HttpClient for FakeClient {
        fn get(&self, url: &str) -> Result<String, ProviderError> {
            self.calls.borrow_mut().push(url.to_string());
            match self.reply {
                Reply::Body(body) => Ok(body.to_string()),
                Reply::Status(status) => Err(ProviderError::Status { status }),
                Reply::Unreachable => Err(ProviderError::Fetch("connection refused".into())),
            }
        }
    }

    const RESPONSE: &str = r#"{
        "Country": ["Mexico"],
        "Category": ["Core Inflation Rate"],
        "q1": [1.0], "q2": [1.1], "q3": [1.2], "q4": [1.3]
    }"#;

    fn provider(reply: Reply) -> ForecastProvider<FakeClient> {
        ForecastProvider::with_client(
            Config::default().with_api_key("dummy_api_key"),
            FakeClient::new(reply),
        )
    }

    #[test]
    fn cache_hit_makes_no_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.csv");
        fs::write(
            &path,
            "Country,Category,q1,q2,q3,q4\nMexico,Core Inflation Rate,1.0,1.1,1.2,1.3\n",
        )
        .unwrap();

        let provider = provider(Reply::Unreachable);
        let df = provider.load_or_fetch(&path).unwrap();

        assert!(provider.client.calls().is_empty());
        assert!(df.equals_missing(&DataLoader::from_json(RESPONSE).unwrap()));
    }

    #[test]
    fn cache_miss_fetches_once_and_writes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.csv");

        let provider = provider(Reply::Body(RESPONSE));
        let df = provider.load_or_fetch(&path).unwrap();

        assert_eq!(
            provider.client.calls(),
            vec!["https://api.tradingeconomics.com/forecast/country/Mexico,New Zealand,Sweden?c=dummy_api_key"]
        );
        assert!(df.equals_missing(&DataLoader::from_json(RESPONSE).unwrap()));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Country,Category,q1,q2,q3,q4\n"));
        assert!(DataLoader::read_csv(&path).unwrap().equals_missing(&df));
    }

    #[test]
    fn second_call_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.csv");

        let provider = provider(Reply::Body(RESPONSE));
        provider.load_or_fetch(&path).unwrap();
        provider.load_or_fetch(&path).unwrap();

        assert_eq!(provider.client.calls().len(), 1);
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.csv");

        let provider =
            ForecastProvider::with_client(Config::default(), FakeClient::new(Reply::Body(RESPONSE)));
        let err = provider.load_or_fetch(&path).unwrap_err();

        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(provider.client.calls().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn http_errors_propagate_without_caching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.csv");

        let err = provider(Reply::Status(403)).load_or_fetch(&path).unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 403 }));

        let err = provider(Reply::Unreachable).load_or_fetch(&path).unwrap_err();
        assert!(matches!(err, ProviderError::Fetch(_)));

        assert!(!path.exists());
    }

    #[test]
    fn malformed_response_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.csv");

        let err = provider(Reply::Body("<html>quota exceeded</html>"))
            .load_or_fetch(&path)
            .unwrap_err();

        assert!(matches!(err, ProviderError::Parse(_)));
        assert!(!path.exists());
    }

    #[test]
    fn empty_cache_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.csv");
        fs::write(&path, "").unwrap();

        let provider = provider(Reply::Body(RESPONSE));
        let err = provider.load_or_fetch(&path).unwrap_err();

        assert!(matches!(err, ProviderError::Parse(_)));
        assert!(provider.client.calls().is_empty());
    }
}
