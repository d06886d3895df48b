//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the core expects to talk to driven adapters: the
//! credential store, the portfolio store, the impersonation registry, and
//! the external batch engine. Each trait exposes strongly typed errors so
//! adapters map their failures into predictable variants instead of
//! returning `anyhow::Result`, and so services can translate them into the
//! closed error taxonomy without leaking adapter internals.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::impersonation::ImpersonationSession;
use crate::domain::portfolio::{Portfolio, Position};
use crate::domain::user::{EmailAddress, NewUser, User, UserId};

/// Failures raised by [`UserStore`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserStoreError {
    /// Another account already holds the (case-insensitive) email.
    ///
    /// Adapters must detect this atomically (unique constraint or
    /// single-writer check-and-insert), never by a separate lookup racing
    /// the insert.
    #[error("email is already registered")]
    DuplicateEmail,
    /// The referenced user does not exist.
    #[error("user does not exist")]
    NotFound,
    /// Store connectivity failed.
    #[error("user store connection failed: {message}")]
    Connection {
        /// Adapter-provided description, logged but never surfaced.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("user store query failed: {message}")]
    Query {
        /// Adapter-provided description, logged but never surfaced.
        message: String,
    },
}

impl UserStoreError {
    /// Helper for connection-oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for user accounts.
///
/// The store owns User persistence; the core never caches records beyond
/// one request.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account, enforcing email uniqueness atomically.
    async fn create(&self, new_user: NewUser) -> Result<User, UserStoreError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserStoreError>;

    /// Fetch an account by canonical email.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserStoreError>;

    /// List all accounts, newest first.
    async fn list(&self) -> Result<Vec<User>, UserStoreError>;

    /// Flip the privilege flag.
    ///
    /// Reachable only from the operator bootstrap procedure; no request
    /// handler may call this.
    async fn set_superuser(&self, id: UserId, is_superuser: bool) -> Result<User, UserStoreError>;
}

/// Failures raised by [`PortfolioStore`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortfolioStoreError {
    /// The owner already has a portfolio; nothing was written.
    ///
    /// Must be detected atomically with the insert (unique constraint on
    /// owner), so two concurrent commits cannot both succeed.
    #[error("user already owns a portfolio")]
    AlreadyExists,
    /// Store connectivity failed.
    #[error("portfolio store connection failed: {message}")]
    Connection {
        /// Adapter-provided description, logged but never surfaced.
        message: String,
    },
    /// Write failed after the uniqueness check; no partial rows remain.
    #[error("portfolio store write failed: {message}")]
    Write {
        /// Adapter-provided description, logged but never surfaced.
        message: String,
    },
}

impl PortfolioStoreError {
    /// Helper for connection-oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for write failures.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }
}

/// Persistence port for committed portfolios.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// Commit a full position set as the owner's single portfolio.
    ///
    /// All-or-nothing: on any failure, zero rows persist.
    async fn create(
        &self,
        owner: UserId,
        positions: Vec<Position>,
        created_at: DateTime<Utc>,
    ) -> Result<Portfolio, PortfolioStoreError>;

    /// Fetch the owner's portfolio, if one has been committed.
    async fn find_by_owner(&self, owner: UserId) -> Result<Option<Portfolio>, PortfolioStoreError>;
}

/// Failures raised by [`ImpersonationRegistry`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImpersonationRegistryError {
    /// The operator already has an active session; nothing was recorded.
    #[error("operator already has an active impersonation session")]
    AlreadyActive,
    /// Registry backend failed.
    #[error("impersonation registry failure: {message}")]
    Backend {
        /// Adapter-provided description, logged but never surfaced.
        message: String,
    },
}

impl ImpersonationRegistryError {
    /// Helper for backend failures.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Keyed registry tracking at most one active impersonation session per
/// operator.
///
/// Exclusivity must hold under concurrent `begin` calls for the same
/// operator: adapters use a unique constraint or a single-writer lock
/// keyed by operator id, never a check-then-insert race. Sessions whose
/// expiry has passed count as ended even without an explicit `end` call.
#[async_trait]
pub trait ImpersonationRegistry: Send + Sync {
    /// Record `session` as the operator's active session.
    ///
    /// Atomically replaces an expired or ended leftover; fails with
    /// [`ImpersonationRegistryError::AlreadyActive`] when a live session
    /// exists at `now`.
    async fn begin(
        &self,
        session: ImpersonationSession,
        now: DateTime<Utc>,
    ) -> Result<(), ImpersonationRegistryError>;

    /// Fetch the operator's session if it is still active at `now`.
    async fn active(
        &self,
        operator: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<ImpersonationSession>, ImpersonationRegistryError>;

    /// End the operator's active session, stamping `ended_at`.
    ///
    /// Returns `None` when no session is active at `ended_at` (including
    /// the already-expired case).
    async fn end(
        &self,
        operator: UserId,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<ImpersonationSession>, ImpersonationRegistryError>;
}

/// Derived-analytics report returned by a successful batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of positions the engine priced.
    pub positions_priced: usize,
    /// Engine-side completion instant.
    pub completed_at: DateTime<Utc>,
}

/// Failures raised by [`BatchEngine`] adapters.
///
/// Retries and fallback providers are the engine's own concern; by the
/// time an error reaches this port the engine has given up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchEngineError {
    /// The engine ran and reported failure.
    #[error("batch computation failed: {message}")]
    Failed {
        /// Engine-provided description, logged but never surfaced.
        message: String,
    },
    /// The engine could not be reached at all.
    #[error("batch engine unavailable: {message}")]
    Unavailable {
        /// Adapter-provided description, logged but never surfaced.
        message: String,
    },
}

impl BatchEngineError {
    /// Helper for reported computation failures.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Helper for transport-level unavailability.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Port to the external market-data/computation batch engine.
#[async_trait]
pub trait BatchEngine: Send + Sync {
    /// Compute derived analytics for a committed portfolio.
    ///
    /// Invoked synchronously at the end of onboarding; the orchestrator
    /// bounds the call with its own deadline.
    async fn run(&self, portfolio: &Portfolio) -> Result<BatchReport, BatchEngineError>;
}
