//! JSON response envelope and error mapping.
//!
//! Every endpoint answers with
//! `{"success": bool, "data": ..., "message": "...", "error": "<kind>"}`,
//! `data` only on success and `error` only on failure.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tourney::TourneyError;

use crate::logging::log_api_error;

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>, kind: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            error: Some(kind.to_string()),
        }
    }
}

/// Handler result: status plus envelope, or an error rendered as one
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// `200 OK` with `data`
pub fn ok<T: Serialize>(data: T, message: impl Into<String>) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::ok(data, message))))
}

/// `201 Created` with `data`
pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(data, message))))
}

/// Domain error on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub TourneyError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(TourneyError::Validation(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TourneyError::Validation(_)
            | TourneyError::InvalidReference(_)
            | TourneyError::State(_)
            | TourneyError::Capacity { .. }
            | TourneyError::Conflict(_) => StatusCode::BAD_REQUEST,
            TourneyError::NotFound { .. } => StatusCode::NOT_FOUND,
            TourneyError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.0.kind()
    }
}

impl From<TourneyError> for ApiError {
    fn from(err: TourneyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        log_api_error(kind, &self.0.to_string());

        let body = ApiResponse::failure(self.0.client_message(), kind);
        (self.status(), Json(body)).into_response()
    }
}
