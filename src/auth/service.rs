use serde::Serialize;
use serde_json::json;

use crate::error::{AuthError, ClientError};
use crate::http::envelope::{decode_body, decode_data};

use super::types::{AuthResponse, SigninRequest};

/// Sign-in and refresh-token exchange against the remote API.
///
/// Holds no session state. Shares the process-wide `reqwest::Client` but is
/// not routed through [`crate::ApiClient`]: a refresh never queues behind itself.
#[derive(Debug, Clone)]
pub struct AuthService {
    http: reqwest::Client,
    base_url: String,
}

impl AuthService {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `POST /auth/login`.
    pub async fn signin(&self, credentials: &SigninRequest) -> Result<AuthResponse, AuthError> {
        self.exchange("/auth/login", credentials, AuthError::InvalidCredentials)
            .await
    }

    /// `POST /auth/refresh`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        self.exchange(
            "/auth/refresh",
            &json!({ "refreshToken": refresh_token }),
            AuthError::InvalidRefreshToken,
        )
        .await
    }

    async fn exchange<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        rejected: fn(String) -> AuthError,
    ) -> Result<AuthResponse, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {path}");

        let response = self.http.post(&url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                AuthError::Network(format!("Timed out calling {path}"))
            } else {
                AuthError::Network(format!("{path} request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuthError::Network(format!("Failed to read {path} response: {e}")))?;

        match decode_body(status, &bytes) {
            Ok(data) => decode_data::<AuthResponse>(data)
                .map_err(|e| AuthError::Network(format!("Unexpected {path} response: {e}"))),
            Err(ClientError::Api(api)) if api.status_code < 500 => Err(rejected(api.message)),
            Err(ClientError::Api(api)) => Err(AuthError::Network(format!(
                "{path} failed with HTTP {}: {}",
                api.status_code, api.message
            ))),
            Err(other) => Err(AuthError::Network(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_payload(access: &str, refresh: Option<&str>) -> serde_json::Value {
        json!({
            "success": true,
            "message": "ok",
            "data": {
                "user": {
                    "id": "u1",
                    "email": "partner@example.com",
                    "firstName": "Pat",
                    "lastName": "Partner",
                    "fullName": "Pat Partner",
                    "userType": "AFFILIATE",
                    "status": "ACTIVE"
                },
                "accessToken": access,
                "refreshToken": refresh,
                "expiresIn": 900
            }
        })
    }

    #[tokio::test]
    async fn signin_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "partner@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_payload("at-1", Some("rt-1"))))
            .expect(1)
            .mount(&server)
            .await;

        let service = AuthService::new(reqwest::Client::new(), &server.uri());
        let resp = service
            .signin(&SigninRequest::new("partner@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(resp.access_token, "at-1");
        assert_eq!(resp.refresh_token.as_deref(), Some("rt-1"));
    }

    #[tokio::test]
    async fn signin_rejected_maps_to_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid email or password"})),
            )
            .mount(&server)
            .await;

        let service = AuthService::new(reqwest::Client::new(), &server.uri());
        let err = service
            .signin(&SigninRequest::new("partner@example.com", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::InvalidCredentials("Invalid email or password".into())
        );
    }

    #[tokio::test]
    async fn refresh_sends_token_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({"refreshToken": "rt-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_payload("at-2", None)))
            .expect(1)
            .mount(&server)
            .await;

        let service = AuthService::new(reqwest::Client::new(), &server.uri());
        let resp = service.refresh("rt-1").await.unwrap();
        assert_eq!(resp.access_token, "at-2");
        assert!(resp.refresh_token.is_none());
    }

    #[tokio::test]
    async fn refresh_rejected_maps_to_invalid_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token revoked"})))
            .mount(&server)
            .await;

        let service = AuthService::new(reqwest::Client::new(), &server.uri());
        let err = service.refresh("rt-old").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidRefreshToken("Token revoked".into()));
    }

    #[tokio::test]
    async fn server_error_maps_to_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let service = AuthService::new(reqwest::Client::new(), &server.uri());
        let err = service.refresh("rt").await.unwrap_err();
        assert!(matches!(err, AuthError::Network(ref msg) if msg.contains("503")), "got: {err:?}");
    }

    #[tokio::test]
    async fn unreachable_host_maps_to_network() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let service = AuthService::new(reqwest::Client::new(), "http://127.0.0.1:9");
        let err = service
            .signin(&SigninRequest::new("a@b.c", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
    }
}
