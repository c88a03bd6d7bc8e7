//! Dispatch error types

use crate::error::BeanError;
use axum::{
    Json,
    http::{StatusCode, header::InvalidHeaderValue},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors raised while building the handler table or dispatching a request
#[derive(Debug, Error)]
pub enum MvcError {
    #[error("No handler found for {method} {path}")]
    HandlerNotFound { method: String, path: String },

    #[error("Unsupported request method: {method}")]
    UnsupportedMethod { method: String },

    /// No resolver in the chain accepts the parameter
    #[error("No argument resolver supports parameter {index} of {handler}")]
    UnsupportedParameter { handler: String, index: usize },

    #[error("Required request parameter '{name}' is not present")]
    MissingParameter { name: String },

    #[error("Path variable '{name}' is not present")]
    MissingPathVariable { name: String },

    /// A handler read an argument with the wrong accessor
    #[error("Argument {index} is not a {expected}")]
    ArgumentMismatch { index: usize, expected: &'static str },

    #[error("Handler target is not a {expected}")]
    TargetMismatch { expected: String },

    #[error("Handler failed: {0}")]
    Handler(anyhow::Error),

    #[error("Failed to render model: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Invalid response header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Bean(#[from] BeanError),
}

impl MvcError {
    /// Keep dispatch errors raised inside a handler, wrap everything else.
    pub fn from_handler(error: anyhow::Error) -> Self {
        match error.downcast::<MvcError>() {
            Ok(mvc) => mvc,
            Err(other) => Self::Handler(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::HandlerNotFound { .. } => StatusCode::NOT_FOUND,
            Self::UnsupportedMethod { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingParameter { .. } | Self::MissingPathVariable { .. } => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MvcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({
                "statusCode": status.as_u16(),
                "message": message,
            })),
        )
            .into_response()
    }
}

/// A specialized Result type for dispatch operations
pub type Result<T> = std::result::Result<T, MvcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = MvcError::HandlerNotFound {
            method: "GET".into(),
            path: "/missing".into(),
        };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "No handler found for GET /missing");

        let missing = MvcError::MissingParameter { name: "id".into() };
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let failed = MvcError::Handler(anyhow::anyhow!("boom"));
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_handler_keeps_dispatch_errors() {
        let error = anyhow::Error::new(MvcError::MissingPathVariable { name: "id".into() });
        assert!(matches!(
            MvcError::from_handler(error),
            MvcError::MissingPathVariable { .. }
        ));

        let error = anyhow::anyhow!("database down");
        assert!(matches!(MvcError::from_handler(error), MvcError::Handler(_)));
    }
}
