use crate::models::plans::AmountOutOfRange;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use anyhow::Error;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq)]
pub enum AppErrorType {
    NotFoundError,
    DbError,
    AuthError,
    VerificationRequired { email: String },
    PayloadValidationError,
    ConflictError,
    ExpiredTokenError,
    InvalidTokenError,
    InternalServerError,
    ForbiddenError,
    HashingFailed,
    EmailError,
}

#[derive(Debug, PartialEq)]
pub struct AppError {
    pub error_type: AppErrorType,
    pub message: Option<String>,
    pub cause: Option<String>,
}

#[derive(Serialize)]
pub struct AppErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            AppError {
                message: Some(message),
                ..
            } => message.clone(),

            AppError {
                message: None,
                error_type: AppErrorType::NotFoundError,
                ..
            } => "The requested item was not found".to_string(),
            _ => "An unexpected error has occurred".to_string(),
        }
    }

    fn with_type(error_type: AppErrorType, message: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type,
            message: Some(message.to_string()),
        }
    }

    pub fn db_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::DbError,
            message: Some(error.to_string()),
        }
    }

    pub fn not_found(message: impl ToString) -> AppError {
        Self::with_type(AppErrorType::NotFoundError, message)
    }

    pub fn bad_request(message: impl ToString) -> AppError {
        Self::with_type(AppErrorType::PayloadValidationError, message)
    }

    pub fn conflict(message: impl ToString) -> AppError {
        Self::with_type(AppErrorType::ConflictError, message)
    }

    pub fn expired_token(message: impl ToString) -> AppError {
        Self::with_type(AppErrorType::ExpiredTokenError, message)
    }

    pub fn invalid_token(message: impl ToString) -> AppError {
        Self::with_type(AppErrorType::InvalidTokenError, message)
    }

    pub fn verification_required(email: &str) -> AppError {
        Self::with_type(
            AppErrorType::VerificationRequired {
                email: email.to_string(),
            },
            "Your account has not been verified yet. Please check your email to activate it.",
        )
    }

    pub fn forbidden_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::ForbiddenError,
            message: Some(error.to_string()),
        }
    }

    pub fn unauthorized(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::AuthError,
            message: Some(error.to_string()),
        }
    }

    pub fn internal_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::InternalServerError,
            message: Some(error.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: Error) -> Self {
        AppError {
            message: None,
            cause: Some(error.to_string()),
            error_type: AppErrorType::InternalServerError,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                return AppError {
                    cause: Some(error.to_string()),
                    error_type: AppErrorType::ConflictError,
                    message: Some("The record conflicts with an existing one".to_string()),
                };
            }
        }
        if let sqlx::Error::RowNotFound = error {
            return AppError {
                cause: Some(error.to_string()),
                error_type: AppErrorType::NotFoundError,
                message: None,
            };
        }
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::DbError,
            message: Some(error.to_string()),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError {
            error_type: AppErrorType::PayloadValidationError,
            message: Some(errors.to_string()),
            cause: None,
        }
    }
}

impl From<AmountOutOfRange> for AppError {
    fn from(error: AmountOutOfRange) -> Self {
        AppError::bad_request(error)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.error_type {
            AppErrorType::AuthError | AppErrorType::VerificationRequired { .. } => {
                StatusCode::UNAUTHORIZED
            }
            AppErrorType::DbError
            | AppErrorType::InternalServerError
            | AppErrorType::HashingFailed
            | AppErrorType::EmailError => StatusCode::INTERNAL_SERVER_ERROR,
            AppErrorType::NotFoundError => StatusCode::NOT_FOUND,
            AppErrorType::PayloadValidationError
            | AppErrorType::ExpiredTokenError
            | AppErrorType::InvalidTokenError => StatusCode::BAD_REQUEST,
            AppErrorType::ConflictError => StatusCode::CONFLICT,
            AppErrorType::ForbiddenError => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (requires_verification, email) = match &self.error_type {
            AppErrorType::VerificationRequired { email } => (Some(true), Some(email.clone())),
            _ => (None, None),
        };

        HttpResponse::build(self.status_code()).json(AppErrorResponse {
            success: false,
            message: self.message(),
            requires_verification,
            email,
        })
    }
}

#[derive(Serialize)]
pub struct AppSuccessResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> AppSuccessResponse<T> {
    pub fn new(data: T, message: impl ToString) -> Self {
        Self {
            success: true,
            data,
            message: message.to_string(),
        }
    }
}
