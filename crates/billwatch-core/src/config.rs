//! YAML configuration with a default for every key.
//!
//! ```yaml
//! legislative:
//!   session: "2025-2026"
//!   lookback_days: 30
//! keywords:
//!   housing: [housing, zoning, "accessory dwelling"]
//! data_source:
//!   use_leginfo_fallback: true
//! paths:
//!   bills_file: data/bills/tracked_bills.json
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::retry::RetryPolicy;
use crate::selection::offset_day;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub legislative: LegislativeConfig,
    pub keywords: KeywordConfig,
    pub data_source: DataSourceConfig,
    pub http: HttpConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LegislativeConfig {
    /// Session label stamped on records from sources that don't report one.
    pub session: String,
    pub lookback_days: i64,
}

impl Default for LegislativeConfig {
    fn default() -> Self {
        Self {
            session: "2025-2026".into(),
            lookback_days: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub housing: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let housing = [
            "housing",
            "zoning",
            "land use",
            "accessory dwelling",
            "density",
            "affordable housing",
            "general plan",
            "ceqa",
            "streamlined",
            "ministerial",
            "local control",
            "permit",
        ];
        Self {
            housing: housing.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    pub legiscan_api_key: String,
    pub openstates_api_key: String,
    /// Explicit dataset archive; empty means "newest `CA_*.zip` in `dataset_dir`".
    pub legiscan_dataset_zip: String,
    pub dataset_dir: PathBuf,
    pub use_leginfo_fallback: bool,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            legiscan_api_key: String::new(),
            openstates_api_key: String::new(),
            legiscan_dataset_zip: String::new(),
            dataset_dir: PathBuf::from("data/legiscan"),
            use_leginfo_fallback: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Attempts in total, not retries.
    pub max_retries: u32,
    pub retry_delay_secs: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_secs: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub bills_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            bills_file: PathBuf::from("data/bills/tracked_bills.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub model: String,
    pub rate_limit_delay_secs: f64,
    pub text_fetch_delay_secs: f64,
    pub max_retries: u32,
    pub retry_base_delay_secs: f64,
    pub retry_max_delay_secs: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-6".into(),
            rate_limit_delay_secs: 1.0,
            text_fetch_delay_secs: 2.0,
            max_retries: 5,
            retry_base_delay_secs: 5.0,
            retry_max_delay_secs: 120.0,
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

impl Config {
    /// Read and parse a config file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// First day of the lookback window.
    pub fn since(&self, today: NaiveDate) -> NaiveDate {
        offset_day(today, -self.legislative.lookback_days.max(0))
    }

    /// Lowercased keyword list.
    pub fn keywords(&self) -> Vec<String> {
        self.keywords
            .housing
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Policy for provider GETs: `max_retries` attempts in total, delay doubling
    /// from `retry_delay_secs`.
    pub fn http_retry(&self) -> RetryPolicy {
        RetryPolicy::doubling(
            self.http.max_retries.saturating_sub(1),
            secs(self.http.retry_delay_secs),
        )
    }

    /// Policy for scoring calls.
    pub fn scoring_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.analysis.max_retries,
            base_delay: secs(self.analysis.retry_base_delay_secs),
            max_delay: secs(self.analysis.retry_max_delay_secs),
            ..Default::default()
        }
    }

    pub fn rate_limit_delay(&self) -> Duration {
        secs(self.analysis.rate_limit_delay_secs)
    }

    pub fn text_fetch_delay(&self) -> Duration {
        secs(self.analysis.text_fetch_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = Config::from_yaml_str("").unwrap();
        assert_eq!(cfg.legislative.session, "2025-2026");
        assert_eq!(cfg.legislative.lookback_days, 30);
        assert_eq!(cfg.http.max_retries, 3);
        assert_eq!(cfg.analysis.model, "claude-sonnet-4-6");
        assert!(!cfg.data_source.use_leginfo_fallback);
        assert!(!cfg.keywords.housing.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::from_yaml_str(
            "legislative:\n  lookback_days: 7\nkeywords:\n  housing: [\"Zoning\", \" ADU \"]\n",
        )
        .unwrap();
        assert_eq!(cfg.legislative.lookback_days, 7);
        assert_eq!(cfg.legislative.session, "2025-2026");
        assert_eq!(cfg.keywords(), vec!["zoning", "adu"]);
        assert_eq!(
            cfg.paths.bills_file,
            PathBuf::from("data/bills/tracked_bills.json")
        );
    }

    #[test]
    fn since_subtracts_lookback() {
        let cfg = Config::default();
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(cfg.since(today), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn huge_lookback_saturates() {
        let mut cfg = Config::default();
        cfg.legislative.lookback_days = i64::MAX;
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(cfg.since(today), NaiveDate::MIN);
    }

    #[test]
    fn http_retry_counts_total_attempts() {
        let cfg = Config::default();
        let policy = cfg.http_retry();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff(0), Duration::from_secs(2));
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
    }

    #[test]
    fn scoring_retry_from_analysis_section() {
        let policy = Config::default().scoring_retry();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(5));
        assert_eq!(policy.max_delay, Duration::from_secs(120));
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(Config::load_or_default(&dir.path().join("nope.yaml")).is_ok());
    }

    #[test]
    fn bad_yaml_is_error() {
        let err = Config::from_yaml_str("legislative: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
