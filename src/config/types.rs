use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const SESSION_STORAGE_NAME: &str = "affiliate-auth-storage";

/// On-disk configuration. Every field is optional so files can be layered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub session_file: Option<String>,
}

impl DashConfig {
    /// Fill any unset field from `lower`. Fields already set win.
    pub fn merge_from(&mut self, lower: DashConfig) {
        if self.api_base_url.is_none() {
            self.api_base_url = lower.api_base_url;
        }
        if self.timeout_ms.is_none() {
            self.timeout_ms = lower.timeout_ms;
        }
        if self.session_file.is_none() {
            self.session_file = lower.session_file;
        }
    }
}

/// Fully resolved settings the client is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub timeout: Duration,
    pub session_file: PathBuf,
}

impl Settings {
    pub fn new(api_base_url: impl Into<String>, session_file: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            session_file: session_file.into(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub fn default_session_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".partnerdash")
        .join(format!("{SESSION_STORAGE_NAME}.json"))
}
