use std::path::PathBuf;

use crate::{
    clients::omdb_client::DEFAULT_BASE_URL,
    matching::fuzzy_resolver::{
        MatchThresholds, ThresholdError, DEFAULT_DESTRUCTIVE_THRESHOLD,
        DEFAULT_SEARCH_THRESHOLD,
    },
    persisters::StorageKind,
};

pub const DEFAULT_WEB_FILE: &str = "movie_web.html";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number between 0 and 100, got {value:?}")]
    InvalidThreshold { var: &'static str, value: String },
    #[error(transparent)]
    InvalidThresholds(#[from] ThresholdError),
    #[error("{0}")]
    InvalidStorage(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub storage_kind: StorageKind,
    pub data_file: PathBuf,
    pub web_file: PathBuf,
    pub thresholds: MatchThresholds,
}

impl Config {
    /// Reads configuration from the process environment, after loading a
    /// `.env` file from the working directory if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Config::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_kind = match var("MOVIE_STORAGE") {
            Some(kind) => kind.parse().map_err(ConfigError::InvalidStorage)?,
            None => StorageKind::Json,
        };

        let data_file = var("MOVIE_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(storage_kind.default_file_name()));

        let destructive = threshold(
            &var,
            "MOVIE_DELETE_THRESHOLD",
            DEFAULT_DESTRUCTIVE_THRESHOLD,
        )?;
        let search = threshold(&var, "MOVIE_SEARCH_THRESHOLD", DEFAULT_SEARCH_THRESHOLD)?;
        let thresholds = MatchThresholds::new(destructive, search)?;

        Ok(Config {
            api_key: var("OMDB_API_KEY").filter(|key| !key.trim().is_empty()),
            api_base_url: var("OMDB_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            storage_kind,
            data_file,
            web_file: var("MOVIE_WEB_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WEB_FILE)),
            thresholds,
        })
    }

    pub fn with_data_file(mut self, data_file: Option<String>) -> Self {
        if let Some(path) = data_file {
            self.data_file = PathBuf::from(path);
        }
        self
    }
}

fn threshold<F>(var: &F, name: &'static str, default: u8) -> Result<u8, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u8>() {
            Ok(parsed) if parsed <= 100 => Ok(parsed),
            _ => Err(ConfigError::InvalidThreshold { var: name, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.api_key, None);
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.storage_kind, StorageKind::Json);
        assert_eq!(config.data_file, PathBuf::from("data.json"));
        assert_eq!(config.web_file, PathBuf::from(DEFAULT_WEB_FILE));
        assert_eq!(config.thresholds, MatchThresholds::default());
    }

    #[test]
    fn csv_backend_changes_default_file() {
        let config = config_from(&[("MOVIE_STORAGE", "CSV")]).unwrap();

        assert_eq!(config.storage_kind, StorageKind::Csv);
        assert_eq!(config.data_file, PathBuf::from("movies.csv"));
    }

    #[test]
    fn thresholds_are_overridable() {
        let config = config_from(&[
            ("MOVIE_DELETE_THRESHOLD", "80"),
            ("MOVIE_SEARCH_THRESHOLD", "80"),
        ])
        .unwrap();

        assert_eq!(config.thresholds, MatchThresholds::new(80, 80).unwrap());
    }

    #[test]
    fn rejects_invalid_thresholds() {
        assert!(matches!(
            config_from(&[("MOVIE_SEARCH_THRESHOLD", "120")]),
            Err(ConfigError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            config_from(&[("MOVIE_DELETE_THRESHOLD", "90")]),
            Err(ConfigError::InvalidThresholds(_))
        ));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = config_from(&[("OMDB_API_KEY", "  ")]).unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn positional_argument_overrides_data_file() {
        let config = config_from(&[])
            .unwrap()
            .with_data_file(Some("/tmp/movies.json".to_string()));
        assert_eq!(config.data_file, PathBuf::from("/tmp/movies.json"));
    }
}
