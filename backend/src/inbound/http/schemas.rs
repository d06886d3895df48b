//! Wire DTOs shared across HTTP handlers.
//!
//! Field names are snake_case on the wire. The summary deliberately
//! exposes no credential material; it is the only shape in which account
//! data leaves the service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::User;

/// Public account summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    /// Stable user identifier.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: Uuid,
    /// Canonical email address.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Display name.
    #[schema(example = "Ada Lovelace")]
    pub full_name: String,
    /// Privilege flag.
    pub is_superuser: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            email: user.email().to_string(),
            full_name: user.full_name().to_string(),
            is_superuser: user.is_superuser(),
            created_at: user.created_at(),
        }
    }
}

/// Bearer credential payload returned by login and impersonation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenGrant {
    /// Compact JWT for the `Authorization: Bearer` header.
    pub access_token: String,
    /// Always `bearer`.
    #[schema(example = "bearer")]
    pub token_type: String,
    /// Instant after which the credential stops verifying.
    pub expires_at: DateTime<Utc>,
}

impl TokenGrant {
    /// Wrap a minted token in the wire shape.
    pub fn bearer(token: &crate::domain::SignedToken) -> Self {
        Self {
            access_token: token.value.clone(),
            token_type: "bearer".to_owned(),
            expires_at: token.expires_at,
        }
    }
}
