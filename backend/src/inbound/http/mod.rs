//! HTTP inbound adapter exposing the REST surface.
//!
//! Route map:
//!
//! ```text
//! POST /auth/login
//! POST /onboarding/register
//! POST /onboarding/create-portfolio   (bearer)
//! POST /admin/impersonate             (bearer, superuser)
//! POST /admin/stop-impersonation      (bearer, superuser)
//! GET  /admin/users                   (bearer, superuser)
//! GET  /health/live, /health/ready
//! ```

pub mod admin;
pub mod auth;
pub mod bearer;
pub mod error;
pub mod health;
pub mod onboarding;
pub mod schemas;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{ApiError, ApiResult};

use actix_web::web;

use self::health::HealthState;
use self::state::HttpState;

/// Wire every route and its state into an app.
///
/// Shared between `main` and the test harnesses so both serve the exact
/// same surface.
pub fn configure(
    state: web::Data<HttpState>,
    health: web::Data<HealthState>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(state)
            .app_data(health)
            .service(web::scope("/auth").service(auth::login))
            .service(
                web::scope("/onboarding")
                    .service(onboarding::register)
                    .service(onboarding::create_portfolio),
            )
            .service(
                web::scope("/admin")
                    .service(admin::impersonate)
                    .service(admin::stop_impersonation)
                    .service(admin::list_users),
            )
            .service(health::ready)
            .service(health::live);
    }
}
