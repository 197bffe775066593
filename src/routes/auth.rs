/// Authentication Routes
///
/// Handles account registration, login and token refresh.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CredentialService;
use crate::error::AppError;

/// Account registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    /// The last access token issued, typically already expired
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub account_id: Uuid,
    pub email: String,
    pub name: String,
}

/// POST /auth/register
///
/// # Errors
/// - 400: Validation errors (invalid email/password/name)
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn register(
    form: web::Json<RegisterRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    let account = service
        .register(&form.name, &form.email, &form.password)
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        account_id: account.id,
        email: account.email,
        name: account.name,
    }))
}

/// POST /auth/login
///
/// Returns access token and refresh token on success. Any previous refresh
/// token of the account stops working.
///
/// # Errors
/// - 401: Invalid credentials (same response for unknown email and wrong password)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    let pair = service.login(&form.email, &form.password).await?;
    Ok(HttpResponse::Ok().json(pair))
}

/// POST /auth/refresh
///
/// Exchanges the last access token (expired or not) and the current refresh
/// token for a new pair. The presented refresh token is rotated away.
///
/// # Errors
/// - 401 `INVALID_TOKEN`: access token is forged or malformed
/// - 401 `INVALID_REFRESH_TOKEN`: refresh token expired, reused or unknown
/// - 500: Internal server error
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    let pair = service
        .refresh(&form.access_token, &form.refresh_token)
        .await?;
    Ok(HttpResponse::Ok().json(pair))
}
