//! End-to-end onboarding scenario: register, log in, upload, re-upload.

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;

use backend::inbound::http::test_support::{
    TEST_INVITE, TestHarness, bearer_header, multipart_csv,
};

const PASSWORD: &str = "correct horse battery staple";

const VALID_CSV: &str = "symbol,quantity,price,trade_date,equity_balance\n\
                         VTI,10,220.35,2026-01-15,25000\n\
                         BND,25,72.10,2026-01-16,25000\n\
                         VXUS,12,61.80,2026-01-20,25000\n";

async fn register_alice<S, B>(app: &S) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
    B::Error: std::fmt::Debug,
{
    let request = test::TestRequest::post()
        .uri("/onboarding/register")
        .set_json(serde_json::json!({
            "email": "alice@example.com",
            "password": PASSWORD,
            "full_name": "Alice Example",
            "invite_code": TEST_INVITE,
        }))
        .to_request();
    let response = test::call_service(app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    test::read_body_json(response).await
}

async fn login_alice<S, B>(app: &S, password: &str) -> actix_web::dev::ServiceResponse<B>
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
{
    let request = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({
            "email": "alice@example.com",
            "password": password,
        }))
        .to_request();
    test::call_service(app, request).await
}

#[actix_web::test]
async fn full_onboarding_journey() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;

    // Register with the correct invite code and a strong password.
    let created = register_alice(&app).await;
    assert_eq!(
        created.get("email").and_then(Value::as_str),
        Some("alice@example.com")
    );
    assert_eq!(
        created.get("is_superuser").and_then(Value::as_bool),
        Some(false)
    );

    // Wrong password is unauthorised.
    let response = login_alice(&app, "not the password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct password yields an ordinary-session token.
    let response = login_alice(&app, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = test::read_body_json(response).await;
    let token = body
        .get("access_token")
        .and_then(Value::as_str)
        .expect("token present")
        .to_owned();
    assert_eq!(
        body.pointer("/user/is_superuser").and_then(Value::as_bool),
        Some(false)
    );

    // A three-row valid CSV commits and carries the batch result.
    let (content_type, payload) = multipart_csv("portfolio.csv", VALID_CSV);
    let request = test::TestRequest::post()
        .uri("/onboarding/create-portfolio")
        .insert_header(bearer_header(&token))
        .insert_header(("content-type", content_type))
        .set_payload(payload)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(
        body.get("positions_committed").and_then(Value::as_u64),
        Some(3)
    );
    assert_eq!(
        body.pointer("/batch/status").and_then(Value::as_str),
        Some("completed")
    );
    assert_eq!(
        body.pointer("/batch/positions_priced").and_then(Value::as_u64),
        Some(3)
    );

    // A second upload conflicts without mutating anything.
    let (content_type, payload) = multipart_csv("portfolio.csv", VALID_CSV);
    let request = test::TestRequest::post()
        .uri("/onboarding/create-portfolio")
        .insert_header(bearer_header(&token))
        .insert_header(("content-type", content_type))
        .set_payload(payload)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(
        body.get("code").and_then(Value::as_str),
        Some("portfolio_exists")
    );
}

#[actix_web::test]
async fn duplicate_registration_conflicts() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;

    register_alice(&app).await;
    let request = test::TestRequest::post()
        .uri("/onboarding/register")
        .set_json(serde_json::json!({
            "email": "ALICE@example.com",
            "password": PASSWORD,
            "full_name": "Alice Again",
            "invite_code": TEST_INVITE,
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(
        body.get("code").and_then(Value::as_str),
        Some("email_exists")
    );
}

#[actix_web::test]
async fn weak_password_registration_is_rejected() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;

    let request = test::TestRequest::post()
        .uri("/onboarding/register")
        .set_json(serde_json::json!({
            "email": "alice@example.com",
            "password": "short",
            "full_name": "Alice Example",
            "invite_code": TEST_INVITE,
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(
        body.get("code").and_then(Value::as_str),
        Some("weak_password")
    );
}

#[actix_web::test]
async fn structural_file_failures_fail_fast_without_row_detail() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    register_alice(&app).await;
    let response = login_alice(&app, PASSWORD).await;
    let body: Value = test::read_body_json(response).await;
    let token = body
        .get("access_token")
        .and_then(Value::as_str)
        .expect("token present")
        .to_owned();

    // Missing headers: no row-level validation is attempted.
    let (content_type, payload) = multipart_csv("portfolio.csv", "symbol,quantity\nVTI,10\n");
    let request = test::TestRequest::post()
        .uri("/onboarding/create-portfolio")
        .insert_header(bearer_header(&token))
        .insert_header(("content-type", content_type))
        .set_payload(payload)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(
        body.get("code").and_then(Value::as_str),
        Some("missing_headers")
    );
    assert!(body.pointer("/details/rows").is_none());
}

#[actix_web::test]
async fn batch_failure_still_reports_the_committed_portfolio() {
    use backend::outbound::batch::FixtureBatchEngine;
    use std::sync::Arc;

    let harness = TestHarness::with_batch(Arc::new(FixtureBatchEngine::failing("quota")));
    let app = test::init_service(harness.app()).await;
    register_alice(&app).await;
    let response = login_alice(&app, PASSWORD).await;
    let body: Value = test::read_body_json(response).await;
    let token = body
        .get("access_token")
        .and_then(Value::as_str)
        .expect("token present")
        .to_owned();

    let (content_type, payload) = multipart_csv("portfolio.csv", VALID_CSV);
    let request = test::TestRequest::post()
        .uri("/onboarding/create-portfolio")
        .insert_header(bearer_header(&token))
        .insert_header(("content-type", content_type))
        .set_payload(payload)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(
        body.get("positions_committed").and_then(Value::as_u64),
        Some(3)
    );
    assert_eq!(
        body.pointer("/batch/status").and_then(Value::as_str),
        Some("failed")
    );
    assert_eq!(
        body.pointer("/batch/error_code").and_then(Value::as_str),
        Some("batch_failed")
    );
}
