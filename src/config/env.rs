use std::path::PathBuf;

use crate::error::ClientError;

use super::types::DashConfig;

pub const ENV_API_BASE_URL: &str = "PARTNERDASH_API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "PARTNERDASH_TIMEOUT_MS";
pub const ENV_SESSION_FILE: &str = "PARTNERDASH_SESSION_FILE";

/// Expand environment variable references in a string.
///
/// Supported syntaxes:
/// - `${VAR}` - replaced with env var value; error if unset
/// - `${VAR:-fallback}` - replaced with env var value, or fallback if unset or empty
pub fn expand_env_vars(input: &str) -> Result<String, ClientError> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut expr = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            expr.push(c);
        }
        if !closed {
            return Err(env_error(format!("Unclosed variable reference: ${{{expr}")));
        }

        match expr.split_once(":-") {
            Some((name, fallback)) => match std::env::var(name) {
                Ok(val) if !val.is_empty() => result.push_str(&val),
                _ => result.push_str(fallback),
            },
            None => {
                let val = std::env::var(&expr).map_err(|_| {
                    env_error(format!("Environment variable '{expr}' is not set"))
                })?;
                result.push_str(&val);
            }
        }
    }

    Ok(result)
}

/// Expand references in string fields, then layer `PARTNERDASH_*` overrides on top.
pub fn apply_env(config: &mut DashConfig) -> Result<(), ClientError> {
    if let Some(ref mut url) = config.api_base_url {
        *url = expand_env_vars(url)?;
    }
    if let Some(ref mut file) = config.session_file {
        *file = expand_env_vars(file)?;
    }

    if let Some(url) = non_empty_var(ENV_API_BASE_URL) {
        config.api_base_url = Some(url);
    }
    if let Some(raw) = non_empty_var(ENV_TIMEOUT_MS) {
        let ms = raw.parse::<u64>().map_err(|_| {
            env_error(format!("{ENV_TIMEOUT_MS} must be a number of milliseconds, got '{raw}'"))
        })?;
        config.timeout_ms = Some(ms);
    }
    if let Some(file) = non_empty_var(ENV_SESSION_FILE) {
        config.session_file = Some(file);
    }
    Ok(())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_error(detail: String) -> ClientError {
    ClientError::Config {
        path: PathBuf::from("<env>"),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_dollar_brace_var() {
        std::env::set_var("PARTNERDASH_TEST_HOST", "api.example.com");
        let result = expand_env_vars("https://${PARTNERDASH_TEST_HOST}/api").unwrap();
        assert_eq!(result, "https://api.example.com/api");
        std::env::remove_var("PARTNERDASH_TEST_HOST");
    }

    #[test]
    fn expand_unset_errors() {
        std::env::remove_var("PARTNERDASH_TEST_UNSET_XYZ");
        let err = expand_env_vars("${PARTNERDASH_TEST_UNSET_XYZ}").unwrap_err();
        assert!(err.to_string().contains("PARTNERDASH_TEST_UNSET_XYZ"));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn expand_fallback_when_unset() {
        std::env::remove_var("PARTNERDASH_TEST_FB_UNSET");
        let result = expand_env_vars("${PARTNERDASH_TEST_FB_UNSET:-http://localhost:3000/api}").unwrap();
        assert_eq!(result, "http://localhost:3000/api");
    }

    #[test]
    fn expand_fallback_when_empty() {
        std::env::set_var("PARTNERDASH_TEST_FB_EMPTY", "");
        let result = expand_env_vars("${PARTNERDASH_TEST_FB_EMPTY:-fallback}").unwrap();
        assert_eq!(result, "fallback");
        std::env::remove_var("PARTNERDASH_TEST_FB_EMPTY");
    }

    #[test]
    fn unclosed_reference_errors() {
        let err = expand_env_vars("${OPEN").unwrap_err();
        assert!(err.to_string().contains("Unclosed"));
    }

    #[test]
    fn lone_dollar_is_literal() {
        assert_eq!(expand_env_vars("cost $5").unwrap(), "cost $5");
    }
}
