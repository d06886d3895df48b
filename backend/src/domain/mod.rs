//! Domain core: entities, services, ports, and the error taxonomy.
//!
//! Everything here is transport-agnostic. Inbound adapters translate
//! [`DomainError`] into HTTP envelopes; outbound adapters implement the
//! traits in [`ports`]. Types are immutable and validate their invariants
//! in constructors.

pub mod auth;
pub mod error;
pub mod gate;
pub mod impersonation;
pub mod ingest;
pub mod invite;
pub mod onboarding;
pub mod password;
pub mod portfolio;
pub mod ports;
pub mod registration;
pub mod token;
pub mod user;

pub use self::auth::LoginCredentials;
pub use self::error::{DomainError, ErrorCategory, ErrorCode};
pub use self::gate::{AuthenticatedUser, AuthorizationGate, LoginOutcome};
pub use self::impersonation::{ImpersonationService, ImpersonationSession, ImpersonationState};
pub use self::invite::InviteCode;
pub use self::onboarding::{BatchOutcome, OnboardingOutcome, OnboardingService, PortfolioUpload};
pub use self::portfolio::{Portfolio, Position, RowError};
pub use self::registration::{RegistrationRequest, RegistrationService};
pub use self::token::{SessionClaims, SignedToken, TokenIssuer, TokenKind};
pub use self::user::{EmailAddress, FullName, NewUser, User, UserId};
