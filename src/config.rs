//! Client configuration.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    pub api_url: String,
    pub request_timeout_secs: u64,
    /// Refetch invalidated keys that hold a value right after an intent is
    /// confirmed, instead of waiting for the next query.
    pub eager_refetch: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            eager_refetch: false,
        }
    }
}

impl ClientConfig {
    /// Read `VALWERA_API_URL`, `VALWERA_REQUEST_TIMEOUT_SECS` and
    /// `VALWERA_EAGER_REFETCH`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: try_load("VALWERA_API_URL", defaults.api_url),
            request_timeout_secs: try_load(
                "VALWERA_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
            eager_refetch: try_load("VALWERA_EAGER_REFETCH", defaults.eager_refetch),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_eager_refetch(mut self, eager: bool) -> Self {
        self.eager_refetch = eager;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Absolute URL for an endpoint path such as `/posts`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
