use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration for the application
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Database connection URL. Without one the catalog runs in memory.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Fallback filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables from a `.env` file are loaded first if one exists.
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Build a configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(vars)?)
    }

    /// Get the database URL, if one is configured
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    Config::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.database_url(), None);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn reads_database_settings() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("MAX_CONNECTIONS", "12"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.database_url(), Some("postgres://localhost/catalog"));
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", " ")])).unwrap();
        assert_eq!(config.database_url(), None);
    }

    #[test]
    fn rejects_non_numeric_pool_size() {
        assert!(Config::from_vars(vars(&[("MAX_CONNECTIONS", "many")])).is_err());
    }
}
