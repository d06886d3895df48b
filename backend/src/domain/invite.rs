//! Invite-code validation.
//!
//! Registration is gated by one process-wide secret. Validation is a
//! constant-time byte comparison; rotating the configured value invalidates
//! every outstanding unused code atomically. The derived display hint is
//! presentational only and carries no authorisation weight.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::domain::error::{DomainError, ErrorCode};
use crate::domain::user::EmailAddress;

/// Length of the cosmetic fingerprint suffix, in hex characters.
const HINT_HEX_LEN: usize = 8;

/// The process-wide registration secret.
///
/// ## Invariants
/// - Non-empty once trimmed; configured at process start.
/// - Comparison never branches on the position of the first mismatched
///   byte ([`subtle::ConstantTimeEq`]).
pub struct InviteCode(Zeroizing<String>);

impl InviteCode {
    /// Wrap a configured secret, rejecting blank values.
    pub fn new(secret: impl Into<String>) -> Result<Self, DomainError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(DomainError::internal("invite secret must not be empty"));
        }
        Ok(Self(Zeroizing::new(secret)))
    }

    /// Constant-time equality check against a candidate code.
    ///
    /// Candidates of a different length are rejected without inspecting
    /// content; only the length itself is observable.
    pub fn matches(&self, candidate: &str) -> bool {
        bool::from(self.0.as_bytes().ct_eq(candidate.as_bytes()))
    }

    /// Validate a candidate, mapping a mismatch to [`ErrorCode::InvalidInvite`].
    pub fn validate(&self, candidate: &str) -> Result<(), DomainError> {
        if self.matches(candidate) {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::InvalidInvite,
                "invite code is not valid",
            ))
        }
    }

    /// Derive the cosmetic per-email display hint.
    ///
    /// Deterministic over (secret, canonical email); shown in operator
    /// tooling so invitations can be told apart without revealing the
    /// secret. Never used for authorisation.
    pub fn display_hint(&self, email: &EmailAddress) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hasher.update(b"\x00");
        hasher.update(email.as_str().as_bytes());
        let digest = hex::encode(hasher.finalize());
        let prefix: String = digest.chars().take(HINT_HEX_LEN).collect();
        format!("INV-{}", prefix.to_uppercase())
    }
}
