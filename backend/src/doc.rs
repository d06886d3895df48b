//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] aggregates every HTTP endpoint and wire schema. Swagger UI
//! serves the document in debug builds only; release deployments expose
//! the routes without the explorer.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{ErrorCategory, ErrorCode};
use crate::inbound::http::admin::{
    ImpersonateRequest, ImpersonateResponse, StopImpersonationResponse,
};
use crate::inbound::http::auth::{LoginRequest, LoginResponse};
use crate::inbound::http::error::ApiError;
use crate::inbound::http::onboarding::{BatchStatus, CreatePortfolioResponse, RegisterRequest};
use crate::inbound::http::schemas::{TokenGrant, UserSummary};

/// Enrich the generated document with the bearer security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Session token issued by POST /auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the control plane's REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "folio control plane API",
        description = "Identity, authorisation, and onboarding surface of the folio portfolio service."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::onboarding::register,
        crate::inbound::http::onboarding::create_portfolio,
        crate::inbound::http::admin::impersonate,
        crate::inbound::http::admin::stop_impersonation,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        ErrorCategory,
        LoginRequest,
        LoginResponse,
        RegisterRequest,
        CreatePortfolioResponse,
        BatchStatus,
        ImpersonateRequest,
        ImpersonateResponse,
        StopImpersonationResponse,
        TokenGrant,
        UserSummary,
    )),
    tags(
        (name = "auth", description = "Session issuance"),
        (name = "onboarding", description = "Registration and portfolio ingestion"),
        (name = "admin", description = "Superuser-gated operations"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Document-level sanity checks.
    use super::*;

    #[rstest::rstest]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/auth/login",
            "/onboarding/register",
            "/onboarding/create-portfolio",
            "/admin/impersonate",
            "/admin/stop-impersonation",
            "/admin/users",
            "/health/ready",
            "/health/live",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {expected}"
            );
        }
    }

    #[rstest::rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components present");
        assert!(components.security_schemes.contains_key("BearerToken"));
    }
}
