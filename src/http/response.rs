//! JSON response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Body shape shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `{"status": .., "data": ..}` with the given status code.
pub fn json<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = ApiResponse {
        status: status.as_u16(),
        data: Some(data),
        error: None,
    };
    (status, Json(body)).into_response()
}

/// `{"status": .., "error": ..}` with the given status code.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse::<()> {
        status: status.as_u16(),
        data: None,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}
