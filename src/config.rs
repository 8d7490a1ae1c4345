use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "PillScan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RECENT_LIMIT: usize = crate::records::DEFAULT_RECENT_LIMIT;

const DATABASE_FILE: &str = "pillscan.db";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,pillscan_lib=debug"
}

/// Get the application data directory
/// ~/PillScan/ when a home directory is known, `./PillScan` otherwise
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the local SQLite database
pub fn database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    /// Signed-in user's token; records are anonymous without it.
    pub supabase_access_token: Option<String>,
    pub google_vision_api_key: Option<String>,
    pub google_vision_endpoint: String,
    pub database_path: PathBuf,
    pub http_timeout_secs: u64,
    pub recent_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            supabase_access_token: None,
            google_vision_api_key: None,
            google_vision_endpoint: crate::pipeline::recognition::DEFAULT_VISION_ENDPOINT.to_string(),
            database_path: database_path(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let config = Self {
            supabase_url: get("SUPABASE_URL"),
            supabase_anon_key: get("SUPABASE_ANON_KEY"),
            supabase_access_token: get("SUPABASE_ACCESS_TOKEN"),
            google_vision_api_key: get("GOOGLE_VISION_API_KEY"),
            google_vision_endpoint: get("GOOGLE_VISION_ENDPOINT")
                .unwrap_or(defaults.google_vision_endpoint),
            database_path: get("PILLSCAN_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            http_timeout_secs: parse_or("PILLSCAN_HTTP_TIMEOUT_SECS", get("PILLSCAN_HTTP_TIMEOUT_SECS"), defaults.http_timeout_secs)?,
            recent_limit: parse_or("PILLSCAN_RECENT_LIMIT", get("PILLSCAN_RECENT_LIMIT"), defaults.recent_limit)?,
        };

        if config.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "PILLSCAN_HTTP_TIMEOUT_SECS",
                value: "0".into(),
            });
        }

        for key in config.missing_supabase() {
            tracing::warn!(key, "Supabase configuration missing; records stay in the local database");
        }
        Ok(config)
    }

    /// Supabase URL and anon key, when both are configured.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        Some((self.supabase_url.as_deref()?, self.supabase_anon_key.as_deref()?))
    }

    /// Names of the unset Supabase variables.
    pub fn missing_supabase(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.supabase_url.is_none() {
            missing.push("SUPABASE_URL");
        }
        if self.supabase_anon_key.is_none() {
            missing.push("SUPABASE_ANON_KEY");
        }
        missing
    }

    pub fn vision_api_key(&self) -> Result<&str, ConfigError> {
        self.google_vision_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("GOOGLE_VISION_API_KEY"))
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}
