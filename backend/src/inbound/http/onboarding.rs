//! Onboarding handlers: registration and portfolio creation.
//!
//! ```text
//! POST /onboarding/register {"email","password","full_name","invite_code"}
//! POST /onboarding/create-portfolio  (authenticated, multipart CSV)
//! ```

use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    BatchOutcome, DomainError, ErrorCode, OnboardingOutcome, PortfolioUpload, RegistrationRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::BearerToken;
use crate::inbound::http::error::ApiError;
use crate::inbound::http::schemas::UserSummary;
use crate::inbound::http::state::HttpState;

/// Registration request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Candidate email address.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Candidate password; checked against the strength policy.
    pub password: String,
    /// Display name.
    #[schema(example = "Ada Lovelace")]
    pub full_name: String,
    /// Invite code gating self-service registration.
    pub invite_code: String,
}

/// Wire shape of the batch outcome attached to a committed portfolio.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchStatus {
    /// `completed`, `failed`, or `timed_out`.
    #[schema(example = "completed")]
    pub status: String,
    /// Taxonomy code when the batch did not complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    /// Number of positions priced, when the engine reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions_priced: Option<usize>,
}

impl From<&BatchOutcome> for BatchStatus {
    fn from(outcome: &BatchOutcome) -> Self {
        match outcome {
            BatchOutcome::Completed(report) => Self {
                status: "completed".to_owned(),
                error_code: None,
                positions_priced: Some(report.positions_priced),
            },
            BatchOutcome::Failed => Self {
                status: "failed".to_owned(),
                error_code: Some(ErrorCode::BatchFailed),
                positions_priced: None,
            },
            BatchOutcome::TimedOut => Self {
                status: "timed_out".to_owned(),
                error_code: Some(ErrorCode::BatchTimeout),
                positions_priced: None,
            },
        }
    }
}

/// Response body for a committed portfolio.
///
/// Commit and batch are separate failure domains: `batch.status` may be
/// `failed` or `timed_out` while the portfolio below it is durably
/// committed.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePortfolioResponse {
    /// Identifier of the committed portfolio.
    pub portfolio_id: String,
    /// Number of committed position rows.
    pub positions_committed: usize,
    /// Outcome of the synchronous batch trigger.
    pub batch: BatchStatus,
}

impl From<&OnboardingOutcome> for CreatePortfolioResponse {
    fn from(outcome: &OnboardingOutcome) -> Self {
        Self {
            portfolio_id: outcome.portfolio.id.to_string(),
            positions_committed: outcome.portfolio.positions.len(),
            batch: BatchStatus::from(&outcome.batch),
        }
    }
}

/// Register an account behind the invite gate.
#[utoipa::path(
    post,
    path = "/onboarding/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserSummary),
        (status = 400, description = "Invite, email, name, or password rejected", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError),
    ),
    tags = ["onboarding"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let user = state
        .registration
        .register(RegistrationRequest {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            invite_code: body.invite_code,
        })
        .await
        .map_err(ApiError::from_domain)?;
    Ok(HttpResponse::Created().json(UserSummary::from(&user)))
}

/// Ingest the caller's portfolio CSV and trigger the analytics batch.
#[utoipa::path(
    post,
    path = "/onboarding/create-portfolio",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Portfolio committed; batch outcome attached", body = CreatePortfolioResponse),
        (status = 400, description = "Structural or row validation failure", body = ApiError),
        (status = 401, description = "Missing or invalid credential", body = ApiError),
        (status = 409, description = "User already owns a portfolio", body = ApiError),
    ),
    tags = ["onboarding"],
    operation_id = "createPortfolio"
)]
#[post("/create-portfolio")]
pub async fn create_portfolio(
    state: web::Data<HttpState>,
    bearer: BearerToken,
    payload: Multipart,
) -> ApiResult<web::Json<CreatePortfolioResponse>> {
    let token = bearer.required().map_err(ApiError::from_domain)?;
    let authenticated = state
        .gate
        .authenticate(token)
        .await
        .map_err(ApiError::from_domain)?;

    let upload = read_file_part(payload, state.onboarding.max_upload_bytes())
        .await
        .map_err(ApiError::from_domain)?;

    let outcome = state
        .onboarding
        .create_portfolio(authenticated.user().id(), upload)
        .await
        .map_err(ApiError::from_domain)?;
    Ok(web::Json(CreatePortfolioResponse::from(&outcome)))
}

/// Drain the multipart stream into the upload shape.
///
/// Accepts the first file-bearing part; reading stops with `FileTooLarge`
/// as soon as the ceiling is crossed rather than buffering the excess.
async fn read_file_part(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<PortfolioUpload, DomainError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| DomainError::invalid_request(format!("unreadable multipart body: {e}")))?
    {
        let disposition = field.content_disposition().clone();
        let filename = disposition.get_filename().map(ToOwned::to_owned);
        if filename.is_none() && disposition.get_name() != Some("file") {
            // Skip stray form fields; the route only wants the file.
            continue;
        }
        let content_type = field.content_type().map(ToString::to_string);

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| DomainError::invalid_request(format!("unreadable file part: {e}")))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(DomainError::new(
                    ErrorCode::FileTooLarge,
                    format!("upload exceeds the {max_bytes}-byte ceiling"),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(PortfolioUpload {
            filename,
            content_type,
            bytes,
        });
    }
    Err(DomainError::invalid_request(
        "multipart body contains no file part",
    ))
}

#[cfg(test)]
mod tests {
    //! Handler-level onboarding coverage; full scenarios live in the
    //! integration tests.
    use crate::inbound::http::test_support::{
        TEST_INVITE, TestHarness, bearer_header, login_fixture_user, multipart_csv,
        register_fixture_user,
    };
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn register_returns_created_summary() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;

        let request = test::TestRequest::post()
            .uri("/onboarding/register")
            .set_json(serde_json::json!({
                "email": "ada@example.com",
                "password": "correct horse battery staple",
                "full_name": "Ada Lovelace",
                "invite_code": TEST_INVITE,
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(response).await;
        assert_eq!(
            body.get("email").and_then(Value::as_str),
            Some("ada@example.com")
        );
        assert_eq!(body.get("is_superuser").and_then(Value::as_bool), Some(false));
        assert!(body.get("id").and_then(Value::as_str).is_some());
    }

    #[actix_web::test]
    async fn register_with_wrong_invite_is_rejected() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;

        let request = test::TestRequest::post()
            .uri("/onboarding/register")
            .set_json(serde_json::json!({
                "email": "ada@example.com",
                "password": "correct horse battery staple",
                "full_name": "Ada Lovelace",
                "invite_code": "definitely-wrong",
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(response).await;
        assert_eq!(
            body.get("code").and_then(Value::as_str),
            Some("invalid_invite")
        );
    }

    #[actix_web::test]
    async fn create_portfolio_requires_a_credential() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;

        let (content_type, body) = multipart_csv("portfolio.csv", "symbol\nVTI\n");
        let request = test::TestRequest::post()
            .uri("/onboarding/create-portfolio")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json: Value = test::read_body_json(response).await;
        assert_eq!(
            json.get("code").and_then(Value::as_str),
            Some("missing_token")
        );
    }

    #[actix_web::test]
    async fn create_portfolio_commits_and_reports_batch() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;
        register_fixture_user(&harness, "ada@example.com", "correct horse battery staple").await;
        let token =
            login_fixture_user(&harness, "ada@example.com", "correct horse battery staple").await;

        let csv = "symbol,quantity,price,trade_date,equity_balance\n\
                   VTI,10,220.35,2026-01-15,25000\n";
        let (content_type, body) = multipart_csv("portfolio.csv", csv);
        let request = test::TestRequest::post()
            .uri("/onboarding/create-portfolio")
            .insert_header(bearer_header(&token))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json: Value = test::read_body_json(response).await;
        assert_eq!(
            json.get("positions_committed").and_then(Value::as_u64),
            Some(1)
        );
        assert_eq!(
            json.pointer("/batch/status").and_then(Value::as_str),
            Some("completed")
        );
    }

    #[actix_web::test]
    async fn row_errors_are_surfaced_as_a_list() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;
        register_fixture_user(&harness, "ada@example.com", "correct horse battery staple").await;
        let token =
            login_fixture_user(&harness, "ada@example.com", "correct horse battery staple").await;

        let csv = "symbol,quantity,price,trade_date,equity_balance\n\
                   VTI,10,220.35,2026-01-15,25000\n\
                   BND,zero,72.10,2026-01-16,25000\n";
        let (content_type, body) = multipart_csv("portfolio.csv", csv);
        let request = test::TestRequest::post()
            .uri("/onboarding/create-portfolio")
            .insert_header(bearer_header(&token))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: Value = test::read_body_json(response).await;
        assert_eq!(
            json.get("code").and_then(Value::as_str),
            Some("position_validation_failed")
        );
        let rows = json
            .pointer("/details/rows")
            .and_then(Value::as_array)
            .expect("row error list");
        assert_eq!(rows.len(), 1);
    }
}
