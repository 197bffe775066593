/// Routes for the authenticated account. Mounted behind `JwtMiddleware`.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{CredentialService, Principal};
use crate::error::AppError;

#[derive(Serialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

/// GET /api/me
pub async fn get_current_account(
    principal: web::ReqData<Principal>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    let account = service.current_account(&principal).await?;

    Ok(HttpResponse::Ok().json(AccountResponse {
        account_id: account.id,
        email: account.email,
        name: account.name,
        created_at: account.created_at.to_rfc3339(),
    }))
}

/// POST /api/logout
///
/// Clears the account's refresh session. Access tokens already issued stay
/// valid until they expire.
pub async fn logout(
    principal: web::ReqData<Principal>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    service.logout(&principal).await?;
    Ok(HttpResponse::NoContent().finish())
}
