//! User identity types.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate raw strings before a handler talks to a port or service.
//! The [`User`] aggregate deliberately has no serde implementation: it
//! carries the credential hash, which must never be serialised. Adapters
//! build their own DTOs from the accessor methods.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{DomainError, ErrorCode};

/// Stable opaque user identifier backed by a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its canonical string form.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| DomainError::new(ErrorCode::InvalidRequest, "user id must be a UUID"))
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Case-insensitive email address.
///
/// ## Invariants
/// - Stored in lowercased, trimmed canonical form, so equality and hashing
///   are case-insensitive by construction.
/// - Contains exactly one `@` with a non-empty local part and a domain part
///   containing at least one dot.
/// - At most 254 bytes long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

/// Upper bound on accepted email length, per RFC 5321 transport limits.
pub const EMAIL_MAX_BYTES: usize = 254;

impl EmailAddress {
    /// Validate and canonicalise a raw email string.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let canonical = raw.as_ref().trim().to_lowercase();
        if canonical.is_empty() {
            return Err(Self::invalid("email must not be empty"));
        }
        if canonical.len() > EMAIL_MAX_BYTES {
            return Err(Self::invalid("email is too long"));
        }
        if canonical.chars().any(char::is_whitespace) {
            return Err(Self::invalid("email must not contain whitespace"));
        }
        let Some((local, domain)) = canonical.split_once('@') else {
            return Err(Self::invalid("email must contain an @ sign"));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Self::invalid("email must have a local part and a domain"));
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(Self::invalid("email domain is not valid"));
        }
        Ok(Self(canonical))
    }

    fn invalid(message: &str) -> DomainError {
        DomainError::new(ErrorCode::InvalidEmail, message)
    }

    /// Canonical (lowercased) form used for storage and comparison.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Display name supplied at registration.
///
/// ## Invariants
/// - Non-empty once trimmed; surrounding whitespace is stripped.
/// - At most 120 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullName(String);

/// Maximum accepted length of a full name, in characters.
pub const FULL_NAME_MAX: usize = 120;

impl FullName {
    /// Validate and construct a full name from raw input.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::new(
                ErrorCode::InvalidFullName,
                "full name must not be empty",
            ));
        }
        if trimmed.chars().count() > FULL_NAME_MAX {
            return Err(DomainError::new(
                ErrorCode::InvalidFullName,
                format!("full name must be at most {FULL_NAME_MAX} characters"),
            ));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FullName> for String {
    fn from(value: FullName) -> Self {
        value.0
    }
}

impl TryFrom<String> for FullName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A registered account as resolved from the credential store.
///
/// ## Invariants
/// - `email` is unique store-wide (enforced atomically by the store port).
/// - `is_superuser` never changes through a request path; only the
///   operator bootstrap procedure may flip it.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    email: EmailAddress,
    full_name: FullName,
    password_hash: String,
    is_superuser: bool,
    created_at: DateTime<Utc>,
}

impl User {
    /// Assemble a user from already-validated parts.
    ///
    /// Used by store adapters when materialising a record; services create
    /// users through [`NewUser`] and the store port instead.
    pub const fn from_parts(
        id: UserId,
        email: EmailAddress,
        full_name: FullName,
        password_hash: String,
        is_superuser: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            full_name,
            password_hash,
            is_superuser,
            created_at,
        }
    }

    /// Stable identifier.
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Canonical email address.
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Display name.
    pub const fn full_name(&self) -> &FullName {
        &self.full_name
    }

    /// PHC-formatted credential hash.
    pub fn password_hash(&self) -> &str {
        self.password_hash.as_str()
    }

    /// Privilege flag granting admin-gated operations.
    pub const fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    /// Creation timestamp.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Payload handed to the store port when creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Canonical email address; uniqueness is enforced by the store.
    pub email: EmailAddress,
    /// Validated display name.
    pub full_name: FullName,
    /// PHC-formatted credential hash.
    pub password_hash: String,
    /// Privilege flag; always `false` for request-path registration.
    pub is_superuser: bool,
    /// Creation timestamp supplied by the caller's clock.
    pub created_at: DateTime<Utc>,
}
