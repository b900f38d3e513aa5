use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;
use crate::timocom::{problem::ProblemDetails, request::AdapterError, TimocomError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        details: Option<Value>,
    },
    #[error("{0}")]
    GatewayTimeout(String),
    #[error("{message}")]
    UpstreamUnreachable { message: String, cause: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { status, .. } => *status,
            AppError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::UpstreamUnreachable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({ "success": false, "error": self.to_string() });
        let details = match self {
            AppError::Upstream { details, .. } => details,
            AppError::UpstreamUnreachable { cause, .. } => Some(json!({ "cause": cause })),
            _ => None,
        };
        if let Some(details) = details {
            body["details"] = details;
        }
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            other => {
                error!(error = %other, "Database operation failed.");
                AppError::Storage(other.to_string())
            }
        }
    }
}

impl From<AdapterError> for AppError {
    fn from(err: AdapterError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<TimocomError> for AppError {
    fn from(err: TimocomError) -> Self {
        match err {
            TimocomError::Api { status, body, text } => upstream_error(status, body, text),
            TimocomError::Timeout(limit) => AppError::GatewayTimeout(format!(
                "The freight exchange did not respond within {} seconds",
                limit.as_secs_f32()
            )),
            TimocomError::Transport(e) => AppError::UpstreamUnreachable {
                message: "No response received from the freight exchange".to_string(),
                cause: e.to_string(),
            },
            TimocomError::InvalidPath(path) => {
                AppError::InvalidInput(format!("Proxy path '{path}' is not allowed"))
            }
            TimocomError::InvalidResponse(msg) => {
                AppError::InternalServerError(format!("Unreadable freight exchange response: {msg}"))
            }
        }
    }
}

fn upstream_error(status: StatusCode, body: Option<Value>, text: String) -> AppError {
    let problem = body.as_ref().and_then(ProblemDetails::from_body);

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        if let Some(problem) = problem.as_ref().filter(|p| !p.invalid_params.is_empty()) {
            let messages = problem.messages();
            return AppError::Upstream {
                status,
                message: format!("Validation failed: {}", messages.join("; ")),
                details: Some(json!({ "messages": messages, "upstream": body })),
            };
        }
    }

    let message = problem
        .and_then(|p| p.summary())
        .unwrap_or_else(|| format!("Freight exchange request failed with status {}", status.as_u16()));
    let details = body.or_else(|| (!text.trim().is_empty()).then(|| Value::String(text)));

    AppError::Upstream {
        status,
        message,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_422_invalid_params_become_messages() {
        let body = json!({
            "title": "Unprocessable Entity",
            "invalid-params": [
                {"name": "destinationLocation", "reason": "must not be null"},
                {"name": "maxResults", "reason": "must be at most 100"}
            ]
        });

        let err = AppError::from(TimocomError::Api {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: Some(body),
            text: String::new(),
        });

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        match err {
            AppError::Upstream { message, details, .. } => {
                assert!(message.contains("Invalid parameter 'destinationLocation': must not be null"));
                assert!(message.contains("Invalid parameter 'maxResults': must be at most 100"));
                assert_eq!(details.unwrap()["messages"].as_array().unwrap().len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_upstream_status_is_mirrored_with_text_body() {
        let err = AppError::from(TimocomError::Api {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: None,
            text: "maintenance".to_string(),
        });

        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        match err {
            AppError::Upstream { message, details, .. } => {
                assert_eq!(message, "Freight exchange request failed with status 503");
                assert_eq!(details, Some(json!("maintenance")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_maps_to_504() {
        let err = AppError::from(TimocomError::Timeout(Duration::from_secs(15)));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err = AppError::from(StoreError::NotFound("Agent x not found".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Agent x not found");
    }
}
