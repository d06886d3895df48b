//! Application settings loaded via OrthoConfig.
//!
//! Every knob reads from the `FOLIO_*` environment. Values that have a
//! sensible default are optional fields with accessor methods; the invite
//! code has no default on purpose, so a deployment cannot start with a
//! guessable gate.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

/// Default bind address for the HTTP server.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
/// Default path of the token-signing secret file.
const DEFAULT_SECRET_FILE: &str = "/var/run/secrets/token_key";
/// Default ordinary-session lifetime, in days.
const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
/// Default impersonation lifetime, in hours.
const DEFAULT_IMPERSONATION_TTL_HOURS: i64 = 8;
/// Default upload ceiling, in bytes.
const DEFAULT_UPLOAD_CEILING_BYTES: usize = 1_048_576;
/// Default deadline for the synchronous batch call, in seconds.
const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 45;

/// Configuration values controlling the control plane at startup.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FOLIO")]
pub struct AppSettings {
    /// Socket address the HTTP server binds.
    pub bind_addr: Option<String>,
    /// File holding the HS256 token-signing secret.
    pub token_secret_file: Option<PathBuf>,
    /// Allow an ephemeral signing secret when the file is unreadable.
    /// Development convenience only; every restart invalidates all tokens.
    #[ortho_config(default = false)]
    pub allow_ephemeral_secret: bool,
    /// The process-wide invite code; required.
    pub invite_code: Option<String>,
    /// Ordinary-session token lifetime override, in days.
    pub session_ttl_days: Option<i64>,
    /// Impersonation token lifetime override, in hours.
    pub impersonation_ttl_hours: Option<i64>,
    /// Portfolio upload byte ceiling override.
    pub upload_ceiling_bytes: Option<usize>,
    /// Batch engine compute endpoint; the fixture engine serves when unset.
    pub batch_endpoint: Option<String>,
    /// Deadline for the synchronous batch call override, in seconds.
    pub batch_timeout_secs: Option<u64>,
    /// Bootstrap superuser email; created or promoted at startup.
    pub bootstrap_email: Option<String>,
    /// Bootstrap superuser password; only used when the account is created.
    pub bootstrap_password: Option<String>,
}

impl AppSettings {
    /// Bind address, falling back to the default.
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Signing-secret file path, falling back to the default.
    pub fn token_secret_file(&self) -> PathBuf {
        self.token_secret_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRET_FILE))
    }

    /// Ordinary-session lifetime.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days.unwrap_or(DEFAULT_SESSION_TTL_DAYS))
    }

    /// Impersonation lifetime.
    pub fn impersonation_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(
            self.impersonation_ttl_hours
                .unwrap_or(DEFAULT_IMPERSONATION_TTL_HOURS),
        )
    }

    /// Upload byte ceiling.
    pub fn upload_ceiling_bytes(&self) -> usize {
        self.upload_ceiling_bytes
            .unwrap_or(DEFAULT_UPLOAD_CEILING_BYTES)
    }

    /// Batch call deadline.
    pub fn batch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.batch_timeout_secs.unwrap_or(DEFAULT_BATCH_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    //! Defaulting behaviour for settings accessors.
    use super::*;

    fn empty_settings() -> AppSettings {
        AppSettings {
            bind_addr: None,
            token_secret_file: None,
            allow_ephemeral_secret: false,
            invite_code: None,
            session_ttl_days: None,
            impersonation_ttl_hours: None,
            upload_ceiling_bytes: None,
            batch_endpoint: None,
            batch_timeout_secs: None,
            bootstrap_email: None,
            bootstrap_password: None,
        }
    }

    #[rstest::rstest]
    fn defaults_apply_when_fields_are_unset() {
        let settings = empty_settings();
        assert_eq!(settings.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(settings.token_secret_file(), PathBuf::from(DEFAULT_SECRET_FILE));
        assert_eq!(settings.session_ttl(), chrono::Duration::days(30));
        assert_eq!(settings.impersonation_ttl(), chrono::Duration::hours(8));
        assert_eq!(settings.upload_ceiling_bytes(), 1_048_576);
        assert_eq!(settings.batch_timeout().as_secs(), 45);
    }

    #[rstest::rstest]
    fn overrides_are_respected() {
        let settings = AppSettings {
            bind_addr: Some("127.0.0.1:9999".to_owned()),
            session_ttl_days: Some(1),
            impersonation_ttl_hours: Some(2),
            upload_ceiling_bytes: Some(64),
            batch_timeout_secs: Some(3),
            ..empty_settings()
        };
        assert_eq!(settings.bind_addr(), "127.0.0.1:9999");
        assert_eq!(settings.session_ttl(), chrono::Duration::days(1));
        assert_eq!(settings.impersonation_ttl(), chrono::Duration::hours(2));
        assert_eq!(settings.upload_ceiling_bytes(), 64);
        assert_eq!(settings.batch_timeout().as_secs(), 3);
    }
}
