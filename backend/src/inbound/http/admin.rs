//! Admin handlers: impersonation and the user listing.
//!
//! ```text
//! POST /admin/impersonate {"target_user_id":"..."}
//! POST /admin/stop-impersonation
//! GET  /admin/users
//! ```
//!
//! Every route re-reads the operator's record through the gate and checks
//! the privilege flag on that fresh state; the token's own claim never
//! grants access here.

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AuthenticatedUser, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::BearerToken;
use crate::inbound::http::error::ApiError;
use crate::inbound::http::schemas::{TokenGrant, UserSummary};
use crate::inbound::http::state::HttpState;

/// Impersonation request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImpersonateRequest {
    /// Identifier of the user to impersonate.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub target_user_id: String,
}

/// Impersonation response: a short-lived credential for the target.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImpersonateResponse {
    /// Credential whose subject is the target user.
    #[serde(flatten)]
    pub token: TokenGrant,
    /// The impersonated account.
    pub target: UserSummary,
}

/// Stop-impersonation response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StopImpersonationResponse {
    /// Always `true`; the session is over.
    pub ended: bool,
    /// When the session was stopped.
    pub ended_at: Option<DateTime<Utc>>,
}

/// Resolve and privilege-check the calling operator.
async fn require_operator(
    state: &HttpState,
    bearer: &BearerToken,
) -> Result<AuthenticatedUser, ApiError> {
    let token = bearer.required().map_err(ApiError::from_domain)?;
    let authenticated = state
        .gate
        .authenticate(token)
        .await
        .map_err(ApiError::from_domain)?;
    state
        .gate
        .require_superuser(authenticated)
        .map_err(ApiError::from_domain)
}

/// Assume another user's identity for a bounded window.
#[utoipa::path(
    post,
    path = "/admin/impersonate",
    request_body = ImpersonateRequest,
    responses(
        (status = 200, description = "Short-lived token for the target", body = ImpersonateResponse),
        (status = 401, description = "Missing or invalid credential", body = ApiError),
        (status = 403, description = "Caller is not a superuser", body = ApiError),
        (status = 404, description = "Target does not exist", body = ApiError),
        (status = 409, description = "Target is a superuser, or a session is already active", body = ApiError),
    ),
    tags = ["admin"],
    operation_id = "impersonate"
)]
#[post("/impersonate")]
pub async fn impersonate(
    state: web::Data<HttpState>,
    bearer: BearerToken,
    payload: web::Json<ImpersonateRequest>,
) -> ApiResult<web::Json<ImpersonateResponse>> {
    let operator = require_operator(&state, &bearer).await?;
    let target_id =
        UserId::parse(&payload.target_user_id).map_err(ApiError::from_domain)?;
    let grant = state
        .impersonation
        .start(operator.user(), target_id)
        .await
        .map_err(ApiError::from_domain)?;
    Ok(web::Json(ImpersonateResponse {
        token: TokenGrant::bearer(&grant.token),
        target: UserSummary::from(&grant.target),
    }))
}

/// End the caller's active impersonation session.
#[utoipa::path(
    post,
    path = "/admin/stop-impersonation",
    responses(
        (status = 200, description = "Session ended", body = StopImpersonationResponse),
        (status = 401, description = "Missing or invalid credential", body = ApiError),
        (status = 403, description = "Caller is not a superuser", body = ApiError),
        (status = 404, description = "No active session", body = ApiError),
    ),
    tags = ["admin"],
    operation_id = "stopImpersonation"
)]
#[post("/stop-impersonation")]
pub async fn stop_impersonation(
    state: web::Data<HttpState>,
    bearer: BearerToken,
) -> ApiResult<web::Json<StopImpersonationResponse>> {
    let operator = require_operator(&state, &bearer).await?;
    let ended = state
        .impersonation
        .stop(operator.user())
        .await
        .map_err(ApiError::from_domain)?;
    Ok(web::Json(StopImpersonationResponse {
        ended: true,
        ended_at: ended.ended_at,
    }))
}

/// List all registered accounts.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Account summaries, newest first", body = [UserSummary]),
        (status = 401, description = "Missing or invalid credential", body = ApiError),
        (status = 403, description = "Caller is not a superuser", body = ApiError),
    ),
    tags = ["admin"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    bearer: BearerToken,
) -> ApiResult<web::Json<Vec<UserSummary>>> {
    require_operator(&state, &bearer).await?;
    let users = state
        .users
        .list()
        .await
        .map_err(|e| ApiError::from_domain(crate::domain::gate::map_store_error(e)))?;
    Ok(web::Json(users.iter().map(UserSummary::from).collect()))
}

#[cfg(test)]
mod tests {
    //! Handler-level admin coverage; full scenarios live in the
    //! integration tests.
    use crate::inbound::http::test_support::{
        TestHarness, bearer_header, login_fixture_user, register_fixture_user, seed_superuser,
    };
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn ordinary_users_are_forbidden() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;
        register_fixture_user(&harness, "ada@example.com", "correct horse battery staple").await;
        let token =
            login_fixture_user(&harness, "ada@example.com", "correct horse battery staple").await;

        let request = test::TestRequest::get()
            .uri("/admin/users")
            .insert_header(bearer_header(&token))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn superusers_can_list_accounts() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;
        seed_superuser(&harness, "root@example.com", "rootpassword99").await;
        register_fixture_user(&harness, "ada@example.com", "correct horse battery staple").await;
        let token = login_fixture_user(&harness, "root@example.com", "rootpassword99").await;

        let request = test::TestRequest::get()
            .uri("/admin/users")
            .insert_header(bearer_header(&token))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = test::read_body_json(response).await;
        let list = body.as_array().expect("array body");
        assert_eq!(list.len(), 2);
    }

    #[actix_web::test]
    async fn impersonation_token_is_scoped_to_the_target() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;
        seed_superuser(&harness, "root@example.com", "rootpassword99").await;
        let target =
            register_fixture_user(&harness, "ada@example.com", "correct horse battery staple")
                .await;
        let token = login_fixture_user(&harness, "root@example.com", "rootpassword99").await;

        let request = test::TestRequest::post()
            .uri("/admin/impersonate")
            .insert_header(bearer_header(&token))
            .set_json(serde_json::json!({ "target_user_id": target.id().to_string() }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = test::read_body_json(response).await;
        assert_eq!(
            body.pointer("/target/email").and_then(Value::as_str),
            Some("ada@example.com")
        );
        let impersonation_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .expect("token present")
            .to_owned();

        // The minted credential authenticates as the target, an ordinary
        // user, so it cannot reach admin routes.
        let request = test::TestRequest::get()
            .uri("/admin/users")
            .insert_header(bearer_header(&impersonation_token))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
