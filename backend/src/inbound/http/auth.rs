//! Authentication handlers.
//!
//! ```text
//! POST /auth/login {"email":"ada@example.com","password":"..."}
//! ```

use actix_web::{post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::LoginCredentials;
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ApiError;
use crate::inbound::http::schemas::{TokenGrant, UserSummary};
use crate::inbound::http::state::HttpState;

/// Login request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Account email; matched case-insensitively.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Login response body.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct LoginResponse {
    /// The minted session credential.
    #[serde(flatten)]
    pub token: TokenGrant,
    /// The authenticated account.
    pub user: UserSummary,
}

/// Authenticate and mint a 30-day session token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 400, description = "Malformed credentials", body = ApiError),
        (status = 401, description = "Unknown email or wrong password", body = ApiError),
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let body = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&body.email, &body.password)
        .map_err(ApiError::from_domain)?;
    let outcome = state
        .gate
        .login(&credentials)
        .await
        .map_err(ApiError::from_domain)?;
    Ok(web::Json(LoginResponse {
        token: TokenGrant::bearer(&outcome.token),
        user: UserSummary::from(&outcome.user),
    }))
}
