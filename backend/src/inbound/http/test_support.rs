//! Test wiring over the in-memory adapters.
//!
//! Shared by `#[cfg(test)]` handler tests and, behind the `test-support`
//! feature, by the integration tests, so every harness serves the exact
//! surface `main` does.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, web};
use mockable::DefaultClock;

use crate::domain::ingest::UploadLimits;
use crate::domain::ports::{BatchEngine, UserStore};
use crate::domain::{
    AuthorizationGate, ImpersonationService, InviteCode, LoginCredentials, NewUser,
    OnboardingService, RegistrationService, TokenIssuer, User,
};
use crate::domain::password::hash_password;
use crate::domain::user::{EmailAddress, FullName};
use crate::inbound::http::health::HealthState;
use crate::inbound::http::state::HttpState;
use crate::middleware::Trace;
use crate::outbound::batch::FixtureBatchEngine;
use crate::outbound::memory::{
    InMemoryImpersonationRegistry, InMemoryPortfolioStore, InMemoryUserStore,
};

/// Invite secret every harness is configured with.
pub const TEST_INVITE: &str = "winter-2026-friends";

/// Signing secret every harness is configured with.
pub const TEST_TOKEN_SECRET: &[u8] = b"harness-signing-secret-0123456789";

/// Fully wired in-memory application state for tests.
pub struct TestHarness {
    /// Handler state bundle, as injected into the app.
    pub state: web::Data<HttpState>,
    /// Probe state, marked ready.
    pub health: web::Data<HealthState>,
    /// Direct handle on the user store for seeding and mutation.
    pub users: Arc<InMemoryUserStore>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness with a batch engine that always completes.
    pub fn new() -> Self {
        Self::with_batch(Arc::new(FixtureBatchEngine::completing()))
    }

    /// Harness with an explicit batch engine, for failure-path coverage.
    pub fn with_batch(batch: Arc<dyn BatchEngine>) -> Self {
        let users = Arc::new(InMemoryUserStore::default());
        let issuer = Arc::new(TokenIssuer::with_default_lifetimes(TEST_TOKEN_SECRET));
        let clock = Arc::new(DefaultClock);
        let invite = Arc::new(InviteCode::new(TEST_INVITE).expect("non-empty invite"));

        let gate = AuthorizationGate::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::clone(&issuer),
            clock.clone(),
        );
        let registration = RegistrationService::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            invite,
            clock.clone(),
        );
        let onboarding = OnboardingService::new(
            Arc::new(InMemoryPortfolioStore::default()),
            batch,
            UploadLimits::default(),
            Duration::from_secs(5),
            clock.clone(),
        );
        let impersonation = ImpersonationService::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::new(InMemoryImpersonationRegistry::default()),
            issuer,
            clock,
        );

        let state = web::Data::new(HttpState::new(
            gate,
            registration,
            onboarding,
            impersonation,
            Arc::clone(&users) as Arc<dyn UserStore>,
        ));
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        Self {
            state,
            health,
            users,
        }
    }

    /// Build an app serving the full route surface.
    pub fn app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new().wrap(Trace).configure(crate::inbound::http::configure(
            self.state.clone(),
            self.health.clone(),
        ))
    }
}

/// Register an ordinary account through the real registration service.
pub async fn register_fixture_user(harness: &TestHarness, email: &str, password: &str) -> User {
    harness
        .state
        .registration
        .register(crate::domain::RegistrationRequest {
            email: email.to_owned(),
            password: password.to_owned(),
            full_name: "Fixture User".to_owned(),
            invite_code: TEST_INVITE.to_owned(),
        })
        .await
        .expect("fixture registration succeeds")
}

/// Seed a superuser directly in the store, modelling the operator
/// bootstrap path.
pub async fn seed_superuser(harness: &TestHarness, email: &str, password: &str) -> User {
    harness
        .users
        .create(NewUser {
            email: EmailAddress::new(email).expect("valid email"),
            full_name: FullName::new("Fixture Operator").expect("valid name"),
            password_hash: hash_password(password).expect("hashing succeeds"),
            is_superuser: true,
            created_at: chrono::Utc::now(),
        })
        .await
        .expect("superuser seeded")
}

/// Log in through the real gate and return the bearer token value.
pub async fn login_fixture_user(harness: &TestHarness, email: &str, password: &str) -> String {
    let credentials =
        LoginCredentials::try_from_parts(email, password).expect("valid credentials");
    harness
        .state
        .gate
        .login(&credentials)
        .await
        .expect("fixture login succeeds")
        .token
        .value
}

/// Header pair for an `Authorization: Bearer` credential.
pub fn bearer_header(token: &str) -> (&'static str, String) {
    ("authorization", format!("Bearer {token}"))
}

/// Encode one CSV file as a multipart body.
///
/// Returns the `content-type` header value and the raw body.
pub fn multipart_csv(filename: &str, csv: &str) -> (String, Vec<u8>) {
    let boundary = "----folio-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );
    (
        format!("multipart/form-data; boundary={boundary}"),
        body.into_bytes(),
    )
}
