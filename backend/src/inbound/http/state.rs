//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle via `actix_web::web::Data` so they depend
//! only on domain services and ports, never on concrete adapters.

use std::sync::Arc;

use crate::domain::ports::UserStore;
use crate::domain::{
    AuthorizationGate, ImpersonationService, OnboardingService, RegistrationService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Token resolution and privilege enforcement.
    pub gate: AuthorizationGate,
    /// Invite-gated account creation.
    pub registration: RegistrationService,
    /// Portfolio ingestion plus batch trigger.
    pub onboarding: OnboardingService,
    /// Impersonation state machine.
    pub impersonation: ImpersonationService,
    /// Direct store access for admin read routes.
    pub users: Arc<dyn UserStore>,
}

impl HttpState {
    /// Bundle the wired services for injection into the app.
    pub fn new(
        gate: AuthorizationGate,
        registration: RegistrationService,
        onboarding: OnboardingService,
        impersonation: ImpersonationService,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            gate,
            registration,
            onboarding,
            impersonation,
            users,
        }
    }
}
