//! Process configuration.
//! Built once in `main` from the environment and handed to the data provider.

use crate::data::ProviderError;
use std::path::{Path, PathBuf};

/// Environment variable holding the Trading Economics API key.
pub const API_KEY_VAR: &str = "API_KEY";

/// Countries requested from the forecast API, in request order.
pub const DEFAULT_COUNTRIES: [&str; 3] = ["Mexico", "New Zealand", "Sweden"];

pub const DEFAULT_API_BASE: &str = "https://api.tradingeconomics.com";

/// Cache file the forecast response is persisted to.
pub const DEFAULT_CACHE_FILE: &str = "mexico_new_zealand_sweden_forecast.csv";

/// Directory rendered chart images are written to.
pub const DEFAULT_CHART_DIR: &str = "charts";

/// Optional env file read at startup, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Load `path` into the process environment.
///
/// Variables already present keep their values. Returns `false` when the file
/// is missing or unreadable; that is not an error.
pub fn load_env_file(path: &Path) -> bool {
    dotenvy::from_path(path).is_ok()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub countries: Vec<String>,
    pub api_base: String,
    pub cache_path: PathBuf,
    pub chart_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            api_base: DEFAULT_API_BASE.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            chart_dir: PathBuf::from(DEFAULT_CHART_DIR),
        }
    }
}

impl Config {
    /// Read the API key from the environment; everything else uses the defaults.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_VAR).ok(),
            ..Self::default()
        }
        .normalized()
    }

    /// Replace the API key (used by tests and embedding code).
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self.normalized()
    }

    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = countries.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    // Blank keys count as absent.
    fn normalized(mut self) -> Self {
        if self.api_key.as_deref().map(str::trim).is_some_and(str::is_empty) {
            self.api_key = None;
        }
        self
    }

    /// The configured API key, or a configuration error naming the variable.
    pub fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Configuration(format!(
                "{API_KEY_VAR} is not set; export it before fetching forecasts"
            ))
        })
    }

    /// Forecast endpoint for the configured countries.
    pub fn forecast_url(&self) -> Result<String, ProviderError> {
        let key = self.api_key()?;
        Ok(format!(
            "{}/forecast/country/{}?c={}",
            self.api_base.trim_end_matches('/'),
            self.countries.join(","),
            key
        ))
    }

    /// Same as [`Config::forecast_url`] with the key masked, for logging.
    pub fn redacted_forecast_url(&self) -> String {
        format!(
            "{}/forecast/country/{}?c=***",
            self.api_base.trim_end_matches('/'),
            self.countries.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_url_matches_documented_endpoint() {
        let config = Config::default().with_api_key("dummy_api_key");
        assert_eq!(
            config.forecast_url().unwrap(),
            "https://api.tradingeconomics.com/forecast/country/Mexico,New Zealand,Sweden?c=dummy_api_key"
        );
    }

    #[test]
    fn country_list_is_injectable() {
        let config = Config::default()
            .with_api_key("k")
            .with_countries(["Chile", "Peru"])
            .with_api_base("http://localhost:8080/");
        assert_eq!(
            config.forecast_url().unwrap(),
            "http://localhost:8080/forecast/country/Chile,Peru?c=k"
        );
    }

    #[test]
    fn blank_key_is_a_configuration_error() {
        let config = Config::default().with_api_key("   ");
        assert!(matches!(
            config.forecast_url(),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[test]
    fn redacted_url_hides_key() {
        let config = Config::default().with_api_key("secret");
        assert!(!config.redacted_forecast_url().contains("secret"));
    }

    #[test]
    fn env_file_fills_unset_variables_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "FORECAST_CHARTS_TEST_FILE_ONLY=from_file\nPATH=from_file\n",
        )
        .unwrap();

        assert!(load_env_file(&path));
        assert_eq!(
            std::env::var("FORECAST_CHARTS_TEST_FILE_ONLY").as_deref(),
            Ok("from_file")
        );
        assert_ne!(std::env::var("PATH").as_deref(), Ok("from_file"));
    }

    #[test]
    fn missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!load_env_file(&dir.path().join(".env")));
    }
}
