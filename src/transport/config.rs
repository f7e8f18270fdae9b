use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_BATCH_PATH: &str = "/api/subrequests";

pub const ENV_BASE_URL: &str = "SUBREQUESTS_BASE_URL";
pub const ENV_BATCH_PATH: &str = "SUBREQUESTS_BATCH_PATH";
pub const ENV_AUTH_TOKEN: &str = "SUBREQUESTS_AUTH_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "SUBREQUESTS_TIMEOUT_SECS";

/// Where and how batches are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportConfig {
    pub base_url: String,
    #[serde(default = "default_batch_path")]
    pub batch_path: String,
    /// Bearer token of an already authorized session.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_batch_path() -> String {
    DEFAULT_BATCH_PATH.to_string()
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            batch_path: default_batch_path(),
            auth_token: None,
            timeout_secs: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_batch_path(mut self, path: impl Into<String>) -> Self {
        self.batch_path = path.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Loads the configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TransportError::Config(format!("could not read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, TransportError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| TransportError::Config(format!("invalid transport config: {}", e)))?;
        config.validated()
    }

    /// Reads the `SUBREQUESTS_*` environment variables.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TransportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL)
            .ok_or_else(|| TransportError::Config(format!("{} is not set", ENV_BASE_URL)))?;

        let timeout_secs = lookup(ENV_TIMEOUT_SECS)
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| {
                    TransportError::Config(format!("{} must be an integer: {}", ENV_TIMEOUT_SECS, e))
                })
            })
            .transpose()?;

        Self {
            base_url,
            batch_path: lookup(ENV_BATCH_PATH).unwrap_or_else(default_batch_path),
            auth_token: lookup(ENV_AUTH_TOKEN),
            timeout_secs,
        }
        .validated()
    }

    /// Full URL batches are POSTed to.
    pub fn batch_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.batch_path.starts_with('/') {
            format!("{}{}", base, self.batch_path)
        } else {
            format!("{}/{}", base, self.batch_path)
        }
    }

    fn validated(self) -> Result<Self, TransportError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(TransportError::Config(format!(
                "base URL '{}' must start with http:// or https://",
                self.base_url
            )));
        }
        Ok(self)
    }
}
