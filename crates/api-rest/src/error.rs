//! Uniform JSON error envelope for every failure path.

use std::any::Any;
use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use countries_core::CountryError;

use crate::dto::ErrorRes;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed request parameters, keyed by field.
    Validation(BTreeMap<String, String>),
    NotFound(&'static str),
    SourceUnavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(BTreeMap::from([(field.to_string(), message.into())]))
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorRes {
        match self {
            ApiError::Validation(fields) => ErrorRes {
                error: "Validation failed".into(),
                details: Some(serde_json::json!(fields)),
            },
            ApiError::NotFound(message) => ErrorRes {
                error: message.into(),
                details: None,
            },
            ApiError::SourceUnavailable(cause) => ErrorRes {
                error: "External data source unavailable".into(),
                details: Some(serde_json::Value::String(cause)),
            },
            ApiError::Internal(message) => ErrorRes {
                error: "Internal server error".into(),
                details: Some(serde_json::Value::String(message)),
            },
        }
    }
}

impl From<CountryError> for ApiError {
    fn from(err: CountryError) -> Self {
        if err.is_source_unavailable() {
            tracing::warn!("refresh aborted: {}", err);
            ApiError::SourceUnavailable(err.to_string())
        } else {
            tracing::error!("request failed: {:?}", err);
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}

/// Turn a handler panic into the generic 500 envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!("handler panicked: {}", message);
    ApiError::Internal(message).into_response()
}
