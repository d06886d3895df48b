//! Authorisation gate: token resolution and privilege enforcement.
//!
//! The gate owns the two trust decisions every authenticated route makes:
//! resolving a bearer credential into a *fresh* store record, and gating
//! admin routes on the privilege flag of that fresh record rather than the
//! token's snapshot. Re-reading the store bounds the staleness window a
//! stateless token otherwise opens: promotion takes effect on the next
//! request, and so does demotion.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use crate::domain::auth::LoginCredentials;
use crate::domain::error::{DomainError, ErrorCode};
use crate::domain::password::verify_password;
use crate::domain::ports::{UserStore, UserStoreError};
use crate::domain::token::{SessionClaims, SignedToken, TokenError, TokenIssuer, TokenKind};
use crate::domain::user::{User, UserId};

/// A request identity resolved through the gate.
///
/// Carries the freshly resolved store record alongside the verified
/// claims; privilege checks read the record, never the claims.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user: User,
    claims: SessionClaims,
}

impl AuthenticatedUser {
    /// The fresh store record for the token's subject.
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// Verified claims from the presented token.
    pub const fn claims(&self) -> &SessionClaims {
        &self.claims
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The minted session credential.
    pub token: SignedToken,
    /// The account the credential was minted for.
    pub user: User,
}

/// Token verification plus store-backed identity resolution.
#[derive(Clone)]
pub struct AuthorizationGate {
    users: Arc<dyn UserStore>,
    issuer: Arc<TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl AuthorizationGate {
    /// Build a gate over the credential store, token issuer, and a clock.
    pub fn new(
        users: Arc<dyn UserStore>,
        issuer: Arc<TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            issuer,
            clock,
        }
    }

    /// Verify credentials and mint an ordinary session token.
    ///
    /// Unknown email and wrong password both yield
    /// [`ErrorCode::InvalidCredentials`]; callers cannot tell which.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, DomainError> {
        let user = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_store_error)?
            .ok_or_else(DomainError::invalid_credentials)?;

        if !verify_password(user.password_hash(), credentials.password()) {
            warn!(user = %user.id(), "login rejected: password mismatch");
            return Err(DomainError::invalid_credentials());
        }

        let token = self
            .issuer
            .mint(&user, TokenKind::Session, self.clock.utc())
            .map_err(|e| DomainError::internal(format!("failed to mint session token: {e}")))?;
        info!(user = %user.id(), "session token issued");
        Ok(LoginOutcome { token, user })
    }

    /// Resolve a bearer token into a fresh identity.
    ///
    /// Verification is stateless; the subsequent store read covers
    /// deletion (`UserNotFound`) but deliberately not downgrade, which
    /// only [`Self::require_superuser`] re-checks.
    pub async fn authenticate(&self, bearer: &str) -> Result<AuthenticatedUser, DomainError> {
        let claims = self.issuer.verify(bearer).map_err(map_token_error)?;
        let subject = UserId::parse(&claims.sub)
            .map_err(|_| DomainError::new(ErrorCode::TokenInvalid, "token subject is malformed"))?;
        let user = self
            .users
            .find_by_id(subject)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UserNotFound,
                    "token subject no longer resolves to an account",
                )
            })?;
        Ok(AuthenticatedUser { user, claims })
    }

    /// Enforce the privilege flag on the freshly resolved record.
    ///
    /// The token's `is_superuser` claim is ignored here by design; only
    /// current store state grants admin access.
    pub fn require_superuser(
        &self,
        authenticated: AuthenticatedUser,
    ) -> Result<AuthenticatedUser, DomainError> {
        if authenticated.user().is_superuser() {
            Ok(authenticated)
        } else {
            Err(DomainError::forbidden("superuser privileges are required"))
        }
    }
}

fn map_token_error(error: TokenError) -> DomainError {
    match error {
        TokenError::Expired => DomainError::new(ErrorCode::TokenExpired, "token has expired"),
        TokenError::Invalid => DomainError::new(ErrorCode::TokenInvalid, "token is not valid"),
        TokenError::Signing(message) => DomainError::internal(message),
    }
}

/// Translate store failures into the closed taxonomy.
pub(crate) fn map_store_error(error: UserStoreError) -> DomainError {
    match error {
        UserStoreError::DuplicateEmail => DomainError::new(
            ErrorCode::EmailExists,
            "an account with this email already exists",
        ),
        UserStoreError::NotFound => {
            DomainError::new(ErrorCode::UserNotFound, "user does not exist")
        }
        UserStoreError::Connection { message } | UserStoreError::Query { message } => {
            DomainError::internal(message)
        }
    }
}
