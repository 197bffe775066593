/// Error Handling Module
///
/// Domain-specific error types for validation, authentication, persistence and
/// configuration, unified under `AppError`, which is what handlers return and
/// what actix-web turns into a JSON error response.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use crate::store::StoreError;

// ============================================================================
// 1. DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Validation errors for registration input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} bytes)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
    #[error("{0} contains suspicious content")]
    SuspiciousContent(&'static str),
    #[error("password must contain at least one {0}")]
    WeakPassword(&'static str),
}

/// Credential lifecycle failures.
///
/// None of these is retryable: each one is a terminal rejection of the
/// request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Registration conflict on an already used email
    #[error("Email is already registered")]
    EmailTaken,
    /// Unknown email or wrong password; the two are indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Malformed, wrongly signed, wrong issuer/audience or wrong algorithm
    #[error("Invalid token")]
    InvalidToken,
    /// Refresh secret expired, mismatched, or already rotated away
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Missing authentication token")]
    MissingToken,
}

/// Configuration errors raised while loading settings at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load error: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

// ============================================================================
// 2. UNIFIED APPLICATION ERROR TYPE
// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The authentication failure this error represents, if any
    pub fn auth_error(&self) -> Option<AuthError> {
        match self {
            AppError::Auth(e) => Some(*e),
            _ => None,
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID, also present in the server log line
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: &str, status: StatusCode) -> Self {
        Self {
            error_id,
            message,
            code: code.to_string(),
            status: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Status, machine-readable code and client-safe message.
    ///
    /// Infrastructure failures never expose their internal detail.
    fn describe(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::Auth(e) => {
                let (status, code) = match e {
                    AuthError::EmailTaken => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
                    AuthError::InvalidCredentials => {
                        (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
                    }
                    AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
                    AuthError::InvalidRefreshToken => {
                        (StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN")
                    }
                    AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
                };
                (status, code, e.to_string())
            }
            AppError::Store(StoreError::Database(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Account storage temporarily unavailable".to_string(),
            ),
            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Account storage error".to_string(),
            ),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Server configuration error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::info!(error_id, error = %e, "Validation error");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id, error = %e, "Authentication rejected");
            }
            AppError::Store(e) => {
                tracing::error!(error_id, error = %e, "Account store error");
            }
            AppError::Config(e) => {
                tracing::error!(error_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let (status, code, message) = self.describe();
        HttpResponse::build(status).json(ErrorResponse::new(error_id, message, code, status))
    }

    fn status_code(&self) -> StatusCode {
        self.describe().0
    }
}
