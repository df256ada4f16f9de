//! Typed errors and HTTP mapping.

use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Boot-time configuration failures. None of these are recoverable; the server must not start.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to register resource '{resource}': model missing")]
    MissingModel { resource: String },
    #[error(
        "unable to register nested resource '{resource}': unknown parent '{parent}' \
         (declare it with disable_routing set to true if its routes are not needed)"
    )]
    UnknownParent { resource: String, parent: String },
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),
    #[error("resource '{resource}' references unregistered request '{request}'")]
    UnknownRequest { resource: String, request: String },
    #[error("resource '{0}' requires authorization but no gate was configured")]
    MissingGate(String),
    #[error("resource '{resource}' binds route parameter '{parameter}' more than once")]
    DuplicateParameter { resource: String, parameter: String },
    #[error("config load: {0}")]
    Load(String),
}

/// Field-level validation messages, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Route identifier or resource key that the boot-time registration never produced.
    #[error("misconfigured route: {0}")]
    Misconfigured(String),
    #[error("validation: {0}")]
    Validation(ValidationErrors),
    /// A validated request declined its own authorize step.
    #[error("this action is unauthorized")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Misconfigured(_) => (StatusCode::INTERNAL_SERVER_ERROR, "misconfigured"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let details = match &self {
            AppError::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "title is required");
        errors.add("title", "title must be at least 3 characters");
        errors.add("body", "body is required");

        assert_eq!(errors.field("title").map(<[String]>::len), Some(2));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["body", "title"]);
        assert_eq!(errors.to_string(), "invalid fields: body, title");
        assert!(errors.into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn unknown_parent_message_names_the_parent() {
        let err = ConfigError::UnknownParent {
            resource: "user.foo".into(),
            parent: "user".into(),
        };
        assert!(err.to_string().contains("unknown parent 'user'"));
    }

    #[test]
    fn validation_error_maps_to_422() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "email must be a valid email");
        let response = AppError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::Forbidden.into_response().status(), StatusCode::FORBIDDEN);
    }
}
