use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wrap `data` in the API's success envelope.
pub fn envelope(data: Value) -> Value {
    json!({ "success": true, "message": "ok", "data": data })
}

pub fn user_json(user_type: &str) -> Value {
    json!({
        "id": "u1",
        "email": "partner@example.com",
        "firstName": "Pat",
        "lastName": "Partner",
        "fullName": "Pat Partner",
        "userType": user_type,
        "status": "ACTIVE",
        "affiliateId": "aff-1",
        "isActive": true,
        "isAffiliate": user_type == "AFFILIATE",
        "canAccessDashboard": true
    })
}

pub fn auth_data(access: &str, refresh: Option<&str>, user_type: &str) -> Value {
    json!({
        "user": user_json(user_type),
        "accessToken": access,
        "refreshToken": refresh,
        "expiresIn": 900
    })
}

pub fn affiliate_json() -> Value {
    json!({
        "id": "aff-1",
        "name": "Pat",
        "businessName": "Pat Partners LLC",
        "primaryContactEmail": "partner@example.com",
        "defaultCommissionRate": 0.15,
        "accountBalance": 420.0,
        "status": "ACTIVE",
        "createdAt": "2023-05-01T00:00:00Z",
        "updatedAt": "2024-05-01T00:00:00Z"
    })
}

/// Mount `POST /auth/login` answering with the given tokens.
#[allow(dead_code)]
pub async fn mount_login(server: &MockServer, access: &str, refresh: Option<&str>, user_type: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(auth_data(access, refresh, user_type))),
        )
        .mount(server)
        .await;
}

/// Mount `POST /auth/refresh` for `refresh_token`, asserting it is called `expected` times.
#[allow(dead_code)]
pub async fn mount_refresh(
    server: &MockServer,
    refresh_token: &str,
    response: ResponseTemplate,
    delay: Duration,
    expected: u64,
) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": refresh_token })))
        .respond_with(response.set_delay(delay))
        .expect(expected)
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn refresh_ok(access: &str, refresh: Option<&str>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(envelope(auth_data(access, refresh, "AFFILIATE")))
}

#[allow(dead_code)]
pub fn unauthorized(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({ "message": message, "statusCode": 401 }))
}
