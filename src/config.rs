// src/config.rs

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::error::HrError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8001";
pub const DEFAULT_SESSION_FILE: &str = "hrportal_session.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const ENV_PREFIX: &str = "HRPORTAL_";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from(DEFAULT_SESSION_FILE)
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Runtime configuration, read from `HRPORTAL_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            session_file: default_session_file(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, HrError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<AppConfig>()
            .map_err(|e| HrError::Config(e.to_string()))?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        api_base_url: Option<String>,
        session_file: Option<PathBuf>,
        request_timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(url) = api_base_url {
            self.api_base_url = url;
        }
        if let Some(path) = session_file {
            self.session_file = path;
        }
        if let Some(secs) = request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        self
    }
}
