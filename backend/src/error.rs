use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::ErrorResponse;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

pub const SIMULATOR_FORBIDDEN: &str = "You are not authorized to use this resource!";

// Define a custom error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Database error")]
    DatabaseError(sqlx::Error),

    #[error("Session token error")]
    JwtError(jsonwebtoken::errors::Error),

    #[error("Password hashing error")]
    PasswordError(bcrypt::BcryptError),

    #[error("Template error")]
    TemplateError(askama::Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Resource not found")]
    NotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_)
            | AppError::DatabaseError(_)
            | AppError::JwtError(_)
            | AppError::PasswordError(_)
            | AppError::TemplateError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

// Implement IntoResponse to convert AppError into an HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_msg = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::JwtError(e) => {
                tracing::error!("Session token error: {}", e);
                "Session error".to_string()
            }
            AppError::PasswordError(e) => {
                tracing::error!("Password hashing error: {}", e);
                "Password hashing error".to_string()
            }
            AppError::TemplateError(e) => {
                tracing::error!("Template rendering error: {}", e);
                "Template error".to_string()
            }
            AppError::BadRequest(msg) | AppError::Forbidden(msg) => msg,
            AppError::Unauthorized => "You have to be logged in".to_string(),
            AppError::NotFound => "Resource not found".to_string(),
        };

        let body = Json(ErrorResponse {
            status: status.as_u16(),
            error_msg,
        });
        (status, body).into_response()
    }
}

/// Runs `validator` checks and reports the first failing field, walking
/// `field_order` so messages come out in a stable, user-facing order.
pub fn validate_in_order<T: Validate>(value: &T, field_order: &[&str]) -> Result<(), String> {
    match value.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(first_validation_message(&errors, field_order)),
    }
}

fn first_validation_message(errors: &ValidationErrors, field_order: &[&str]) -> String {
    let fields = errors.field_errors();
    field_order
        .iter()
        .filter_map(|field| {
            fields.iter().find_map(|(name, errs)| {
                let name: &str = name.as_ref();
                (name == *field).then(|| errs.first()).flatten()
            })
        })
        .chain(fields.values().filter_map(|errs| errs.first()))
        .next()
        .map(|err| {
            err.message
                .as_ref()
                .map(|msg| msg.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", err.code))
        })
        .unwrap_or_else(|| "Invalid input".to_string())
}

// Add From implementations for easy '?' conversion in handlers
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::DatabaseError(e)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::JwtError(e)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::PasswordError(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::TemplateError(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
