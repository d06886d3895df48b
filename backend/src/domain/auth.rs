//! Authentication primitives: login credentials and the password policy.
//!
//! Constructors validate raw strings so handlers never pass unchecked
//! input to services. Passwords are held in [`Zeroizing`] wrappers so the
//! plaintext is wiped when the request finishes.

use zeroize::Zeroizing;

use crate::domain::error::{DomainError, ErrorCode};
use crate::domain::user::EmailAddress;

/// Validated login payload.
///
/// ## Invariants
/// - `email` is canonical (see [`EmailAddress`]).
/// - `password` is non-empty; caller-provided whitespace is preserved to
///   avoid surprising credential comparisons.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, DomainError> {
        let email = EmailAddress::new(email)?;
        if password.is_empty() {
            return Err(DomainError::invalid_request("password must not be empty"));
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the account lookup.
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Plaintext password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Minimum accepted password length, in characters.
pub const PASSWORD_MIN: usize = 8;
/// Maximum accepted password length, in characters.
pub const PASSWORD_MAX: usize = 128;

/// Minimum-strength policy applied at registration.
///
/// Deliberately small: length bounds plus a requirement that the password
/// is not a single repeated character. Anything stricter belongs in an
/// operator-tunable policy, which is a documented extension point.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordPolicy;

impl PasswordPolicy {
    /// Check a candidate password, returning [`ErrorCode::WeakPassword`]
    /// with the failed requirement on rejection.
    pub fn check(self, password: &str) -> Result<(), DomainError> {
        let length = password.chars().count();
        if length < PASSWORD_MIN {
            return Err(Self::weak(format!(
                "password must be at least {PASSWORD_MIN} characters"
            )));
        }
        if length > PASSWORD_MAX {
            return Err(Self::weak(format!(
                "password must be at most {PASSWORD_MAX} characters"
            )));
        }
        let mut chars = password.chars();
        if let Some(first) = chars.next()
            && chars.all(|c| c == first)
        {
            return Err(Self::weak(
                "password must not be a single repeated character",
            ));
        }
        Ok(())
    }

    fn weak(message: impl Into<String>) -> DomainError {
        DomainError::new(ErrorCode::WeakPassword, message)
    }
}
