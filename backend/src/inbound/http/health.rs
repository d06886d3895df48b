//! Health endpoints: liveness and readiness probes.

use actix_web::{HttpResponse, get, http::header, web};
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared probe state.
///
/// Readiness flips on only after bootstrap completes; liveness flips off
/// ahead of a graceful shutdown so orchestrators drain the instance.
#[derive(Default)]
pub struct HealthState {
    ready: AtomicBool,
}

impl HealthState {
    /// Create a probe state that is live but not yet ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready to take traffic.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };
        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Readiness probe: 200 once bootstrap finished, 503 before.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is still starting"),
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe: 200 while the process is serving.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
    )
)]
#[get("/health/live")]
pub async fn live() -> HttpResponse {
    HealthState::probe_response(true)
}
