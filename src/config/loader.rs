use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ClientError;

use super::env::apply_env;
use super::types::{default_session_file, DashConfig, Settings, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_MS};

/// Discover config files in precedence order (highest first).
///
/// Precedence:
/// 1. `--config` CLI flag
/// 2. `PARTNERDASH_CONFIG` env var
/// 3. `./config/partnerdash.json` (project-level)
/// 4. `~/.partnerdash/config.json` (home-level)
pub fn discover_config_files(cli_config: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = cli_config {
        candidates.push(PathBuf::from(path));
    }
    if let Ok(env_path) = std::env::var("PARTNERDASH_CONFIG") {
        candidates.push(PathBuf::from(env_path));
    }
    candidates.push(PathBuf::from("./config/partnerdash.json"));
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".partnerdash").join("config.json"));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for path in candidates {
        if path.exists() && !files.contains(&path) {
            files.push(path);
        }
    }
    files
}

pub fn load_config_file(path: &Path) -> Result<DashConfig, ClientError> {
    let content = std::fs::read_to_string(path).map_err(|e| ClientError::Config {
        path: path.to_path_buf(),
        detail: format!("Failed to read: {e}"),
    })?;
    serde_json::from_str(&content).map_err(|e| ClientError::Config {
        path: path.to_path_buf(),
        detail: format!("Invalid JSON: {e}"),
    })
}

/// Load, merge and resolve settings from every config source.
///
/// A `--config` path that does not exist is an error; the implicit locations
/// are simply skipped when absent.
pub fn load_settings(cli_config: Option<&str>) -> Result<Settings, ClientError> {
    if let Some(path) = cli_config {
        if !Path::new(path).exists() {
            return Err(ClientError::Config {
                path: PathBuf::from(path),
                detail: "File not found".to_string(),
            });
        }
    }

    let mut merged = DashConfig::default();
    for path in discover_config_files(cli_config) {
        tracing::debug!("Loading config from {}", path.display());
        merged.merge_from(load_config_file(&path)?);
    }
    apply_env(&mut merged)?;
    resolve_settings(merged)
}

/// Apply defaults and validate a merged config.
pub fn resolve_settings(config: DashConfig) -> Result<Settings, ClientError> {
    let api_base_url = config
        .api_base_url
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    validate_base_url(&api_base_url)?;

    let timeout_ms = config.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(ClientError::Config {
            path: PathBuf::from("<settings>"),
            detail: "timeoutMs must be greater than zero".to_string(),
        });
    }

    let session_file = config
        .session_file
        .map(PathBuf::from)
        .unwrap_or_else(default_session_file);

    Ok(Settings {
        api_base_url: api_base_url.trim_end_matches('/').to_string(),
        timeout: Duration::from_millis(timeout_ms),
        session_file,
    })
}

fn validate_base_url(base_url: &str) -> Result<(), ClientError> {
    let url = reqwest::Url::parse(base_url).map_err(|e| ClientError::Config {
        path: PathBuf::from("<settings>"),
        detail: format!("Invalid API base URL '{base_url}': {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ClientError::Config {
            path: PathBuf::from("<settings>"),
            detail: format!("Unsupported URL scheme '{scheme}' in '{base_url}'"),
        }),
    }
}
