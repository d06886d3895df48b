//! Backend entry point: settings, key material, bootstrap, and server wiring.

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use backend::ApiDoc;
use backend::Trace;
use backend::config::AppSettings;
use backend::domain::ingest::UploadLimits;
use backend::domain::password::hash_password;
use backend::domain::ports::{BatchEngine, UserStore};
use backend::domain::{
    AuthorizationGate, EmailAddress, FullName, ImpersonationService, InviteCode, NewUser,
    OnboardingService, RegistrationService, TokenIssuer,
};
use backend::inbound::http::health::HealthState;
use backend::inbound::http;
use backend::inbound::http::state::HttpState;
use backend::outbound::batch::{FixtureBatchEngine, HttpBatchEngine};
use backend::outbound::memory::{
    InMemoryImpersonationRegistry, InMemoryPortfolioStore, InMemoryUserStore,
};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter([OsString::from("backend")])
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;

    let secret = load_signing_secret(&settings)?;
    let invite = settings
        .invite_code
        .as_deref()
        .ok_or_else(|| std::io::Error::other("FOLIO_INVITE_CODE must be set"))
        .and_then(|code| {
            InviteCode::new(code).map_err(|e| std::io::Error::other(e.to_string()))
        })?;

    let issuer = Arc::new(TokenIssuer::new(
        &secret,
        settings.session_ttl(),
        settings.impersonation_ttl(),
    ));
    let clock = Arc::new(DefaultClock);
    let users = Arc::new(InMemoryUserStore::default());
    let batch = build_batch_engine(&settings)?;

    let state = web::Data::new(HttpState::new(
        AuthorizationGate::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::clone(&issuer),
            clock.clone(),
        ),
        RegistrationService::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::new(invite),
            clock.clone(),
        ),
        OnboardingService::new(
            Arc::new(InMemoryPortfolioStore::default()),
            batch,
            UploadLimits {
                max_bytes: settings.upload_ceiling_bytes(),
            },
            settings.batch_timeout(),
            clock.clone(),
        ),
        ImpersonationService::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::new(InMemoryImpersonationRegistry::default()),
            issuer,
            clock,
        ),
        Arc::clone(&users) as Arc<dyn UserStore>,
    ));

    bootstrap_superuser(&settings, users.as_ref()).await?;

    let health = web::Data::new(HealthState::new());
    let server_state = state.clone();
    let server_health = health.clone();
    let server = HttpServer::new(move || {
        let app = App::new().wrap(Trace).configure(http::configure(
            server_state.clone(),
            server_health.clone(),
        ));
        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
        app
    })
    .bind(settings.bind_addr())?;

    info!(bind_addr = settings.bind_addr(), "control plane listening");
    health.mark_ready();
    server.run().await
}

/// Read the HS256 signing secret, with a dev-only ephemeral fallback.
fn load_signing_secret(settings: &AppSettings) -> std::io::Result<Vec<u8>> {
    let path = settings.token_secret_file();
    match std::fs::read(&path) {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        Ok(_) => Err(std::io::Error::other(format!(
            "signing secret at {} is empty",
            path.display()
        ))),
        Err(e) => {
            if cfg!(debug_assertions) || settings.allow_ephemeral_secret {
                warn!(path = %path.display(), error = %e, "using ephemeral signing secret (dev only)");
                let mut secret = vec![0u8; 32];
                getrandom::getrandom(&mut secret)
                    .map_err(|err| std::io::Error::other(err.to_string()))?;
                Ok(secret)
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read signing secret at {}: {e}",
                    path.display()
                )))
            }
        }
    }
}

/// Build the batch-engine adapter the settings call for.
fn build_batch_engine(settings: &AppSettings) -> std::io::Result<Arc<dyn BatchEngine>> {
    match settings.batch_endpoint.as_deref() {
        Some(endpoint) => {
            let url = reqwest::Url::parse(endpoint)
                .map_err(|e| std::io::Error::other(format!("bad batch endpoint: {e}")))?;
            // Transport timeout slightly above the orchestrator deadline so
            // the deadline, not the socket, decides the outcome.
            let engine = HttpBatchEngine::new(url, settings.batch_timeout() + Duration::from_secs(5))
                .map_err(|e| std::io::Error::other(format!("batch client: {e}")))?;
            Ok(Arc::new(engine))
        }
        None => {
            warn!("no batch endpoint configured; using the fixture engine");
            Ok(Arc::new(FixtureBatchEngine::completing()))
        }
    }
}

/// The out-of-band promotion path: create or promote the configured
/// superuser before the server takes traffic.
async fn bootstrap_superuser(
    settings: &AppSettings,
    users: &InMemoryUserStore,
) -> std::io::Result<()> {
    let Some(email) = settings.bootstrap_email.as_deref() else {
        return Ok(());
    };
    let email = EmailAddress::new(email).map_err(|e| std::io::Error::other(e.to_string()))?;

    let existing = users
        .find_by_email(&email)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    match existing {
        Some(user) if user.is_superuser() => {}
        Some(user) => {
            users
                .set_superuser(user.id(), true)
                .await
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            info!(user = %user.id(), "bootstrap promoted existing account to superuser");
        }
        None => {
            let password = settings.bootstrap_password.as_deref().ok_or_else(|| {
                std::io::Error::other("FOLIO_BOOTSTRAP_PASSWORD must be set to create the bootstrap superuser")
            })?;
            let user = users
                .create(NewUser {
                    email,
                    full_name: FullName::new("Operator")
                        .map_err(|e| std::io::Error::other(e.to_string()))?,
                    password_hash: hash_password(password)
                        .map_err(|e| std::io::Error::other(e.to_string()))?,
                    is_superuser: true,
                    created_at: chrono::Utc::now(),
                })
                .await
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            info!(user = %user.id(), "bootstrap superuser created");
        }
    }
    Ok(())
}
