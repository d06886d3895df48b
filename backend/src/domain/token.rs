//! Signed session credentials.
//!
//! Tokens are stateless HS256 JWTs. Verification checks the signature and
//! expiry only; it never consults the credential store, so a downgraded or
//! deleted user stays token-valid until expiry. Admin routes compensate by
//! re-reading store state in the authorisation gate. Rotating the signing
//! secret invalidates every outstanding token; that is the documented
//! rotation procedure, not a failure.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::user::User;

/// Claims embedded in every credential minted by the issuer.
///
/// `is_superuser` is a snapshot taken at issuance; privileged routes must
/// not trust it and re-read the store instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user's opaque identifier.
    pub sub: String,
    /// Subject's canonical email at issuance time.
    pub email: String,
    /// Privilege snapshot at issuance time.
    pub is_superuser: bool,
    /// Issued-at, epoch seconds.
    pub iat: i64,
    /// Expiry, epoch seconds; strictly enforced on verification.
    pub exp: i64,
}

/// Which lifetime a minted token receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Ordinary login session.
    Session,
    /// Short-lived impersonation session.
    Impersonation,
}

/// A minted credential plus its expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    /// Compact JWT for the `Authorization: Bearer` header.
    pub value: String,
    /// Instant after which verification fails with [`TokenError::Expired`].
    pub expires_at: DateTime<Utc>,
}

/// Failures raised by [`TokenIssuer`].
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature or structure is invalid.
    #[error("token is not valid")]
    Invalid,
    /// The token was valid once but has expired.
    #[error("token has expired")]
    Expired,
    /// The signing backend rejected the claims during minting.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Default ordinary-session lifetime, in days.
pub const SESSION_TTL_DAYS: i64 = 30;
/// Default impersonation-session lifetime, in hours.
pub const IMPERSONATION_TTL_HOURS: i64 = 8;

/// Mints and verifies signed session credentials.
///
/// One issuer per process; the signing secret is process-wide
/// configuration.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
    impersonation_ttl: Duration,
}

impl TokenIssuer {
    /// Build an issuer over an HMAC secret with the given lifetimes.
    pub fn new(secret: &[u8], session_ttl: Duration, impersonation_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            session_ttl,
            impersonation_ttl,
        }
    }

    /// Build an issuer with the default 30-day / 8-hour lifetimes.
    pub fn with_default_lifetimes(secret: &[u8]) -> Self {
        Self::new(
            secret,
            Duration::days(SESSION_TTL_DAYS),
            Duration::hours(IMPERSONATION_TTL_HOURS),
        )
    }

    /// Lifetime applied to tokens of `kind`.
    pub const fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Session => self.session_ttl,
            TokenKind::Impersonation => self.impersonation_ttl,
        }
    }

    /// Mint a credential for `user`, expiring `lifetime(kind)` after `now`.
    pub fn mint(
        &self,
        user: &User,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<SignedToken, TokenError> {
        let expires_at = now + self.lifetime(kind);
        let claims = SessionClaims {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            is_superuser: user.is_superuser(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(SignedToken { value, expires_at })
    }

    /// Verify a compact token and return its claims.
    ///
    /// Checks signature and expiry only; the store is never consulted.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    //! Round-trip and expiry coverage for the issuer.
    use super::*;
    use crate::domain::user::{EmailAddress, FullName, UserId};
    use rstest::rstest;

    const TEST_SECRET: &[u8] = b"issuer-test-secret-0123456789";

    fn fixture_user(is_superuser: bool) -> User {
        User::from_parts(
            UserId::random(),
            EmailAddress::new("ada@example.com").expect("valid email"),
            FullName::new("Ada Lovelace").expect("valid name"),
            "$argon2id$fixture".to_owned(),
            is_superuser,
            Utc::now(),
        )
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn verify_returns_minted_claims(#[case] is_superuser: bool) {
        let issuer = TokenIssuer::with_default_lifetimes(TEST_SECRET);
        let user = fixture_user(is_superuser);
        let minted = issuer
            .mint(&user, TokenKind::Session, Utc::now())
            .expect("minting succeeds");

        let claims = issuer.verify(&minted.value).expect("verifies");
        assert_eq!(claims.sub, user.id().to_string());
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.is_superuser, is_superuser);
        assert_eq!(claims.exp, minted.expires_at.timestamp());
    }

    #[rstest]
    fn impersonation_tokens_are_short_lived() {
        let issuer = TokenIssuer::with_default_lifetimes(TEST_SECRET);
        let user = fixture_user(false);
        let now = Utc::now();
        let minted = issuer
            .mint(&user, TokenKind::Impersonation, now)
            .expect("minting succeeds");
        assert_eq!(
            minted.expires_at,
            now + Duration::hours(IMPERSONATION_TTL_HOURS)
        );
    }

    #[rstest]
    fn expired_tokens_fail_with_expired() {
        let issuer = TokenIssuer::with_default_lifetimes(TEST_SECRET);
        let user = fixture_user(false);
        let past = Utc::now() - Duration::days(SESSION_TTL_DAYS) - Duration::hours(1);
        let minted = issuer
            .mint(&user, TokenKind::Session, past)
            .expect("minting succeeds");

        let err = issuer.verify(&minted.value).expect_err("must be expired");
        assert!(matches!(err, TokenError::Expired));
    }

    #[rstest]
    fn tampered_tokens_fail_with_invalid() {
        let issuer = TokenIssuer::with_default_lifetimes(TEST_SECRET);
        let other = TokenIssuer::with_default_lifetimes(b"a-different-secret-entirely");
        let user = fixture_user(false);
        let minted = other
            .mint(&user, TokenKind::Session, Utc::now())
            .expect("minting succeeds");

        let err = issuer.verify(&minted.value).expect_err("wrong key");
        assert!(matches!(err, TokenError::Invalid));
    }

    #[rstest]
    #[case("")]
    #[case("not-a-jwt")]
    #[case("aaaa.bbbb.cccc")]
    fn malformed_tokens_fail_with_invalid(#[case] raw: &str) {
        let issuer = TokenIssuer::with_default_lifetimes(TEST_SECRET);
        let err = issuer.verify(raw).expect_err("malformed");
        assert!(matches!(err, TokenError::Invalid));
    }
}
