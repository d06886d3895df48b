//! Domain-level error taxonomy.
//!
//! The taxonomy is closed and small by design: every failure the control
//! plane can surface maps to exactly one stable [`ErrorCode`], one
//! [`ErrorCategory`], and one HTTP status class (applied by the inbound
//! adapter). Store and batch-engine internals are always translated into
//! these codes and never leak to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Category grouping for [`ErrorCode`] values.
///
/// The set is closed; new codes must join one of these six groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Account, credential, and token failures.
    User,
    /// Invite-code failures.
    Invite,
    /// Structural failures of an uploaded portfolio file.
    File,
    /// Row-level validation failures inside a structurally valid file.
    Position,
    /// Portfolio lifecycle conflicts.
    Portfolio,
    /// Admin operations and downstream batch outcomes.
    Admin,
}

/// Stable machine-readable code identifying a failure.
///
/// Codes are wire-stable across releases; renaming a variant is a breaking
/// API change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // -- User / credential --
    /// Request body failed basic shape validation.
    InvalidRequest,
    /// Email or password did not match a known account.
    InvalidCredentials,
    /// No bearer credential was supplied on an authenticated route.
    MissingToken,
    /// Bearer credential was malformed or its signature did not verify.
    TokenInvalid,
    /// Bearer credential has passed its expiry instant.
    TokenExpired,
    /// Authenticated but lacking the privilege the route requires.
    Forbidden,
    /// Token subject no longer resolves to a stored user.
    UserNotFound,
    /// Registration email collides with an existing account.
    EmailExists,
    /// Registration password fails the minimum-strength policy.
    WeakPassword,
    /// Email address is not syntactically acceptable.
    InvalidEmail,
    /// Full name is empty or too long.
    InvalidFullName,

    // -- Invite --
    /// Invite code does not match the configured secret.
    InvalidInvite,

    // -- File (structural) --
    /// Upload exceeds the configured byte ceiling.
    FileTooLarge,
    /// Upload is not a CSV file.
    WrongFileType,
    /// Upload contains no data rows.
    EmptyFile,
    /// Header row does not match the required column set.
    MissingHeaders,

    // -- Position (row-level) --
    /// Row has a different column count than the header.
    MalformedRow,
    /// Symbol is empty, too long, or contains invalid characters.
    InvalidSymbol,
    /// Quantity is unparseable or not a positive finite number.
    InvalidQuantity,
    /// Quantity magnitude exceeds the accepted bound.
    QuantityOutOfRange,
    /// Price is unparseable or non-finite.
    InvalidPrice,
    /// Price is zero or negative.
    PriceNotPositive,
    /// Trade date is not an ISO-8601 calendar date.
    InvalidDate,
    /// Equity-balance field is empty.
    MissingEquityBalance,
    /// Equity-balance field is unparseable or negative.
    InvalidEquityBalance,
    /// One or more rows failed validation; details carry the full list.
    PositionValidationFailed,

    // -- Portfolio --
    /// The user already owns a portfolio.
    PortfolioExists,

    // -- Admin / batch --
    /// Impersonation target id does not resolve.
    TargetNotFound,
    /// Impersonation target holds the privilege flag.
    TargetIsSuperuser,
    /// Operator already has an active impersonation session.
    AlreadyImpersonating,
    /// No active impersonation session to stop.
    NoActiveSession,
    /// Downstream batch engine reported failure after exhausting retries.
    BatchFailed,
    /// Downstream batch engine did not answer within the deadline.
    BatchTimeout,
    /// Unexpected internal failure; details are never sent to callers.
    Internal,
}

impl ErrorCode {
    /// Category this code belongs to.
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::InvalidRequest
            | Self::InvalidCredentials
            | Self::MissingToken
            | Self::TokenInvalid
            | Self::TokenExpired
            | Self::Forbidden
            | Self::UserNotFound
            | Self::EmailExists
            | Self::WeakPassword
            | Self::InvalidEmail
            | Self::InvalidFullName => ErrorCategory::User,
            Self::InvalidInvite => ErrorCategory::Invite,
            Self::FileTooLarge | Self::WrongFileType | Self::EmptyFile | Self::MissingHeaders => {
                ErrorCategory::File
            }
            Self::MalformedRow
            | Self::InvalidSymbol
            | Self::InvalidQuantity
            | Self::QuantityOutOfRange
            | Self::InvalidPrice
            | Self::PriceNotPositive
            | Self::InvalidDate
            | Self::MissingEquityBalance
            | Self::InvalidEquityBalance
            | Self::PositionValidationFailed => ErrorCategory::Position,
            Self::PortfolioExists => ErrorCategory::Portfolio,
            Self::TargetNotFound
            | Self::TargetIsSuperuser
            | Self::AlreadyImpersonating
            | Self::NoActiveSession
            | Self::BatchFailed
            | Self::BatchTimeout
            | Self::Internal => ErrorCategory::Admin,
        }
    }
}

/// Domain error payload carried to inbound adapters.
///
/// ## Invariants
/// - `message` is non-empty once trimmed of whitespace.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DomainError {
    #[schema(example = "invalid_invite")]
    code: ErrorCode,
    #[schema(example = "invite code is not valid")]
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl DomainError {
    /// Create a new error for `code` with a human-readable `message`.
    ///
    /// Falls back to the code's own name when the supplied message is
    /// blank, so the non-empty invariant holds without panicking.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            format!("{code:?} error")
        } else {
            message
        };
        Self {
            code,
            message,
            details: None,
        }
    }

    /// Stable machine-readable error code.
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Category of the underlying code.
    pub const fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Human-readable message surfaced to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary structured details, when present.
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidCredentials`].
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "invalid email or password")
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::Internal`].
    ///
    /// The message is logged by the adapter but redacted from responses.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    //! Taxonomy stability checks.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorCode::EmailExists, ErrorCategory::User)]
    #[case(ErrorCode::InvalidInvite, ErrorCategory::Invite)]
    #[case(ErrorCode::MissingHeaders, ErrorCategory::File)]
    #[case(ErrorCode::PriceNotPositive, ErrorCategory::Position)]
    #[case(ErrorCode::PortfolioExists, ErrorCategory::Portfolio)]
    #[case(ErrorCode::BatchTimeout, ErrorCategory::Admin)]
    fn codes_map_to_their_category(#[case] code: ErrorCode, #[case] category: ErrorCategory) {
        assert_eq!(code.category(), category);
    }

    #[rstest]
    fn wire_names_are_snake_case() {
        let encoded = serde_json::to_string(&ErrorCode::TargetIsSuperuser).expect("serialises");
        assert_eq!(encoded, "\"target_is_superuser\"");
    }

    #[rstest]
    fn blank_messages_fall_back_to_code_name() {
        let err = DomainError::new(ErrorCode::EmptyFile, "   ");
        assert!(err.message().contains("EmptyFile"));
    }

    #[rstest]
    fn details_round_trip() {
        let err = DomainError::invalid_request("bad payload")
            .with_details(serde_json::json!({ "field": "email" }));
        assert_eq!(
            err.details()
                .and_then(|d| d.get("field"))
                .and_then(Value::as_str),
            Some("email")
        );
    }
}
