pub mod client;
pub mod envelope;
pub mod refresh;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::config::Settings;
use crate::error::ClientError;

pub use client::{ApiClient, ApiRequest};

/// Build the one `reqwest::Client` shared by the auth service and the API client.
pub fn build_http_client(settings: &Settings) -> Result<reqwest::Client, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("application/json"),
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(concat!("partnerdash/", env!("CARGO_PKG_VERSION")))
        .timeout(settings.timeout)
        .build()
        .map_err(|e| ClientError::Transport {
            path: settings.api_base_url.clone(),
            source: Box::new(e),
        })
}
