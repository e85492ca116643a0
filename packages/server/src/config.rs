//! Server configuration from environment variables and an optional TOML
//! tuning file.

use std::path::{Path, PathBuf};

use safepath_reports::ReportPolicy;
use safepath_route::ScoringConfig;
use safepath_source::registry::DEFAULT_FEED_ID;
use serde::Deserialize;

/// Default directory for persisted community reports.
pub const DEFAULT_DATA_DIR: &str = "data/reports";

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The tuning file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path of the tuning file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The tuning file is not valid TOML for [`Tuning`].
    #[error("invalid tuning file: {0}")]
    Toml(#[from] toml::de::Error),

    /// `PORT` is not a valid port number.
    #[error("invalid PORT {0:?}")]
    Port(String),
}

/// Scoring and report-store tunables, as read from the tuning file.
///
/// Every key is optional:
///
/// ```toml
/// [scoring]
/// proximity_radius_meters = 120.0
///
/// [reports]
/// retention_days = 14
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Route scoring tunables.
    pub scoring: ScoringConfig,
    /// Report store tunables.
    pub reports: ReportPolicy,
}

impl Tuning {
    /// Parses a tuning file's contents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the contents are not valid.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads and parses a tuning file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Google Maps API key. Route planning is disabled without one.
    pub google_maps_api_key: Option<String>,
    /// Directory for persisted community reports.
    pub data_dir: PathBuf,
    /// Incident feed to load at startup.
    pub feed_id: String,
    /// Scoring and report-store tunables.
    pub tuning: Tuning,
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `GOOGLE_MAPS_API_KEY`,
    /// `SAFEPATH_DATA_DIR`, `SAFEPATH_FEED`, and `SAFEPATH_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `PORT` is malformed or the tuning file
    /// named by `SAFEPATH_CONFIG` cannot be loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading variables through `var`.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(p) => p.trim().parse().map_err(|_| ConfigError::Port(p))?,
            None => 8080,
        };

        let tuning = match non_empty("SAFEPATH_CONFIG") {
            Some(path) => {
                log::info!("Loading tuning from {path}");
                Tuning::load(Path::new(&path))?
            }
            None => Tuning::default(),
        };

        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            google_maps_api_key: non_empty("GOOGLE_MAPS_API_KEY"),
            data_dir: non_empty("SAFEPATH_DATA_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
            feed_id: non_empty("SAFEPATH_FEED").unwrap_or_else(|| DEFAULT_FEED_ID.to_string()),
            tuning,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.google_maps_api_key, None);
        assert_eq!(config.data_dir, PathBuf::from("data/reports"));
        assert_eq!(config.feed_id, "nyc_bronx");
        assert_eq!(config.tuning, Tuning::default());
    }

    #[test]
    fn reads_environment() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "9000"),
            ("GOOGLE_MAPS_API_KEY", "key"),
            ("SAFEPATH_DATA_DIR", "/var/lib/safepath"),
            ("SAFEPATH_FEED", "nyc_queens"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.google_maps_api_key.as_deref(), Some("key"));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/safepath"));
        assert_eq!(config.feed_id, "nyc_queens");
    }

    #[test]
    fn blank_api_key_is_none() {
        let config = ServerConfig::from_lookup(lookup(&[("GOOGLE_MAPS_API_KEY", "  ")])).unwrap();
        assert_eq!(config.google_maps_api_key, None);
    }

    #[test]
    fn rejects_bad_port() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])),
            Err(ConfigError::Port(_))
        ));
    }

    #[test]
    fn loads_partial_tuning_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("safepath.toml");
        std::fs::write(
            &path,
            "[scoring]\nproximity_radius_meters = 120.0\n\n[reports]\nretention_days = 14\n",
        )
        .unwrap();

        let config = ServerConfig::from_lookup(lookup(&[(
            "SAFEPATH_CONFIG",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        let tuning = config.tuning;
        assert!((tuning.scoring.proximity_radius_meters - 120.0).abs() < f64::EPSILON);
        assert_eq!(tuning.scoring.felony_weight, 3);
        assert_eq!(tuning.reports.retention_days, 14);
        assert_eq!(tuning.reports.max_reports, 1_000);
    }

    #[test]
    fn missing_tuning_file_is_an_error() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("SAFEPATH_CONFIG", "/nonexistent/safepath.toml")])),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn rejects_malformed_tuning() {
        assert!(matches!(
            Tuning::parse("[scoring]\nfelony_weight = \"high\"\n"),
            Err(ConfigError::Toml(_))
        ));
    }
}
