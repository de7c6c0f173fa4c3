use std::fmt;
use std::time::Duration;

use actix_web::{
    error::ResponseError,
    http::{header::{self, ContentType}, StatusCode},
    HttpResponse
};
use serde::Serialize;
use validator::ValidationErrors;

pub const VALIDATION_FAILED: &str = "Ошибка валидации";
pub const TOO_MANY_REQUESTS: &str = "Слишком много запросов. Попробуйте позже.";
pub const INTERNAL_ERROR: &str = "Внутренняя ошибка сервера";
pub const LEAD_NOT_FOUND: &str = "Заявка не найдена";

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    BadRequest(String),
    NotFound(String),
    RateLimited { retry_after: Duration },
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::RateLimited { retry_after } => {
                write!(f, "Rate limited, retry after {}s", retry_after.as_secs())
            }
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": VALIDATION_FAILED,
                    "details": errors
                })
            }
            AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                serde_json::json!({"error": msg})
            }
            AppError::RateLimited { .. } => {
                serde_json::json!({"error": TOO_MANY_REQUESTS})
            }
            AppError::InternalError(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                serde_json::json!({"error": INTERNAL_ERROR})
            }
        };

        let mut builder = HttpResponse::build(self.status_code());
        builder.insert_header(ContentType::json());

        if let AppError::RateLimited { retry_after } = self {
            builder.insert_header((header::RETRY_AFTER, retry_after.as_secs().max(1).to_string()));
        }

        builder.json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Некорректное значение".to_string()),
                })
            })
            .collect();

        // Field order from the validator is unspecified.
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError(field_errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound(LEAD_NOT_FOUND.into()),
            _ => AppError::InternalError(format!("Database error: {}", err))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
