//! Impersonation manager: bounded identity override for support work.
//!
//! State machine per operator: `NONE -> ACTIVE -> ENDED`. A session ends
//! through an explicit stop or silently at its expiry instant; expiry
//! needs no sweeper because every read is evaluated against the injected
//! clock. Nesting is blocked twice over: superusers cannot be targets, and
//! an impersonated identity is an ordinary user that can never pass the
//! superuser gate to reach `start`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::info;

use crate::domain::error::{DomainError, ErrorCode};
use crate::domain::gate::map_store_error;
use crate::domain::ports::{ImpersonationRegistry, ImpersonationRegistryError, UserStore};
use crate::domain::token::{SignedToken, TokenIssuer, TokenKind};
use crate::domain::user::{User, UserId};

/// Lifecycle state of an [`ImpersonationSession`] at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpersonationState {
    /// Session is live: not stopped and not past expiry.
    Active,
    /// Session was stopped explicitly or lapsed at its expiry instant.
    Ended,
}

/// One bounded identity override, keyed by operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationSession {
    /// Superuser driving the session.
    pub operator: UserId,
    /// Ordinary user whose identity is assumed.
    pub target: UserId,
    /// Start instant.
    pub started_at: DateTime<Utc>,
    /// Hard expiry; the session is over at this instant even without a stop.
    pub expires_at: DateTime<Utc>,
    /// Explicit stop instant, when one happened.
    pub ended_at: Option<DateTime<Utc>>,
}

impl ImpersonationSession {
    /// State of the session as observed at `now`.
    pub fn state(&self, now: DateTime<Utc>) -> ImpersonationState {
        if self.ended_at.is_some() || now >= self.expires_at {
            ImpersonationState::Ended
        } else {
            ImpersonationState::Active
        }
    }

    /// Whether the session is live at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == ImpersonationState::Active
    }
}

/// Result of a successful `start` call.
#[derive(Debug, Clone)]
pub struct ImpersonationGrant {
    /// Short-lived token whose subject is the target.
    pub token: SignedToken,
    /// The recorded session.
    pub session: ImpersonationSession,
    /// The target account, for the response summary.
    pub target: User,
}

/// Drives the per-operator impersonation state machine.
#[derive(Clone)]
pub struct ImpersonationService {
    users: Arc<dyn UserStore>,
    registry: Arc<dyn ImpersonationRegistry>,
    issuer: Arc<TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl ImpersonationService {
    /// Build the service over its collaborators.
    pub fn new(
        users: Arc<dyn UserStore>,
        registry: Arc<dyn ImpersonationRegistry>,
        issuer: Arc<TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            registry,
            issuer,
            clock,
        }
    }

    /// Start impersonating `target_id` on behalf of `operator`.
    ///
    /// The caller must already have passed the superuser gate; this method
    /// enforces the target-side rules and the one-active-session
    /// invariant, then mints the short-lived token. Issuance is logged
    /// against the operator, never the target.
    pub async fn start(
        &self,
        operator: &User,
        target_id: UserId,
    ) -> Result<ImpersonationGrant, DomainError> {
        let target = self
            .users
            .find_by_id(target_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::TargetNotFound, "target user does not exist")
            })?;

        if target.is_superuser() {
            return Err(DomainError::new(
                ErrorCode::TargetIsSuperuser,
                "superusers cannot be impersonated",
            ));
        }

        let now = self.clock.utc();
        let session = ImpersonationSession {
            operator: operator.id(),
            target: target.id(),
            started_at: now,
            expires_at: now + self.issuer.lifetime(TokenKind::Impersonation),
            ended_at: None,
        };
        self.registry
            .begin(session.clone(), now)
            .await
            .map_err(map_registry_error)?;

        let token = match self.issuer.mint(&target, TokenKind::Impersonation, now) {
            Ok(token) => token,
            Err(e) => {
                // Release the registry claim so the operator is not stuck
                // holding a session with no token.
                let _released = self.registry.end(operator.id(), now).await;
                return Err(DomainError::internal(format!(
                    "failed to mint impersonation token: {e}"
                )));
            }
        };

        info!(
            operator = %operator.id(),
            target = %target.id(),
            expires_at = %session.expires_at,
            "impersonation session started"
        );
        Ok(ImpersonationGrant {
            token,
            session,
            target,
        })
    }

    /// Stop the operator's active session.
    pub async fn stop(&self, operator: &User) -> Result<ImpersonationSession, DomainError> {
        let now = self.clock.utc();
        let ended = self
            .registry
            .end(operator.id(), now)
            .await
            .map_err(map_registry_error)?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::NoActiveSession,
                    "no active impersonation session",
                )
            })?;
        info!(
            operator = %operator.id(),
            target = %ended.target,
            "impersonation session ended"
        );
        Ok(ended)
    }

    /// Whether the operator has a live session right now.
    ///
    /// An expired session counts as not active even when no stop call was
    /// ever made.
    pub async fn is_active(&self, operator: UserId) -> Result<bool, DomainError> {
        let now = self.clock.utc();
        let session = self
            .registry
            .active(operator, now)
            .await
            .map_err(map_registry_error)?;
        Ok(session.is_some_and(|s| s.is_active(now)))
    }
}

fn map_registry_error(error: ImpersonationRegistryError) -> DomainError {
    match error {
        ImpersonationRegistryError::AlreadyActive => DomainError::new(
            ErrorCode::AlreadyImpersonating,
            "operator already has an active impersonation session",
        ),
        ImpersonationRegistryError::Backend { message } => DomainError::internal(message),
    }
}
