//! Identity, authorisation, and onboarding control plane for the folio
//! portfolio service.
//!
//! Layout follows the hexagon: `domain` holds the transport-agnostic core
//! and ports, `inbound::http` the REST adapter, `outbound` the driven
//! adapters, and `middleware` the request-scoped plumbing.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Trace middleware re-exported for app wiring.
pub use middleware::Trace;
