//! Invite-gated registration service.
//!
//! Registration and superuser promotion are fully decoupled: every account
//! created here has the privilege flag unset, and no field of the request
//! can influence it. Email uniqueness is enforced by the store port's
//! atomic create, not by a lookup racing the insert.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::auth::PasswordPolicy;
use crate::domain::error::DomainError;
use crate::domain::gate::map_store_error;
use crate::domain::invite::InviteCode;
use crate::domain::password::hash_password;
use crate::domain::ports::UserStore;
use crate::domain::user::{EmailAddress, FullName, NewUser, User};

/// Raw registration payload as received by the inbound adapter.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Candidate email address.
    pub email: String,
    /// Candidate plaintext password.
    pub password: String,
    /// Candidate display name.
    pub full_name: String,
    /// Invite code presented by the caller.
    pub invite_code: String,
}

/// Creates accounts behind the invite gate.
#[derive(Clone)]
pub struct RegistrationService {
    users: Arc<dyn UserStore>,
    invite: Arc<InviteCode>,
    policy: PasswordPolicy,
    clock: Arc<dyn Clock>,
}

impl RegistrationService {
    /// Build the service over the store, the configured invite secret,
    /// and a clock.
    pub fn new(users: Arc<dyn UserStore>, invite: Arc<InviteCode>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            invite,
            policy: PasswordPolicy,
            clock,
        }
    }

    /// Validate the invite and inputs, then create the account.
    ///
    /// Check order is fixed: invite first (cheapest, gates everything),
    /// then field validation, then the strength policy, then the slow
    /// hash, and only then the store write.
    pub async fn register(&self, request: RegistrationRequest) -> Result<User, DomainError> {
        self.invite.validate(&request.invite_code)?;

        let email = EmailAddress::new(&request.email)?;
        let full_name = FullName::new(&request.full_name)?;
        self.policy.check(&request.password)?;

        let password_hash = hash_password(&request.password)
            .map_err(|e| DomainError::internal(format!("failed to hash credential: {e}")))?;

        let user = self
            .users
            .create(NewUser {
                email,
                full_name,
                password_hash,
                is_superuser: false,
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_store_error)?;

        info!(
            user = %user.id(),
            invite = %self.invite.display_hint(user.email()),
            "account registered"
        );
        Ok(user)
    }
}
