use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const API_VERSION: &str = "v1";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// The envelope every endpoint answers with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub api_ver: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status_code: status.as_u16(),
            api_ver: API_VERSION,
            message: message.into(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, Some(data))
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// IANA zone requested via the `x-timezone` header, for response date
/// formatting only.
pub fn requested_timezone(headers: &HeaderMap) -> &str {
    headers
        .get("x-timezone")
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_TIMEZONE)
}

/// Push-notification handle passed verbatim in the `fcm-token` header.
pub fn fcm_token(headers: &HeaderMap) -> Option<&str> {
    headers.get("fcm-token").and_then(|v| v.to_str().ok())
}
