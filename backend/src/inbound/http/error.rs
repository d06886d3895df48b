//! HTTP error envelope and status mapping for the closed taxonomy.
//!
//! Keeps the domain free of transport concerns: [`DomainError`] values are
//! translated here into JSON envelopes with the taxonomy's fixed status
//! classes. Internal errors are logged with their real message and
//! redacted from the wire.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;

use crate::domain::{DomainError, ErrorCategory, ErrorCode};
use crate::middleware::trace::{TRACE_ID_HEADER, TraceId};

/// Standard error envelope returned by every route.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    #[schema(example = "portfolio_exists")]
    code: ErrorCode,
    #[schema(example = "user already owns a portfolio")]
    message: String,
    category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "7b7f2f3a-52c1-4df2-9d6b-1f1f0e9b2a11")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    /// Translate a domain failure, capturing the ambient trace id.
    pub fn from_domain(error: DomainError) -> Self {
        Self {
            code: error.code(),
            category: error.category(),
            message: error.message().to_owned(),
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: error.details().cloned(),
        }
    }

    /// Stable machine-readable error code.
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Fixed status class for the wrapped code.
    fn to_status_code(&self) -> StatusCode {
        status_for(self.code)
    }
}

/// Fixed HTTP status class for each taxonomy code.
///
/// Exactly one class per code: 400 validation, 401 authentication, 403
/// authorisation, 404 missing target, 409 conflicting state, 502/504
/// downstream batch, 500 internal.
pub const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest
        | ErrorCode::WeakPassword
        | ErrorCode::InvalidEmail
        | ErrorCode::InvalidFullName
        | ErrorCode::InvalidInvite
        | ErrorCode::FileTooLarge
        | ErrorCode::WrongFileType
        | ErrorCode::EmptyFile
        | ErrorCode::MissingHeaders
        | ErrorCode::MalformedRow
        | ErrorCode::InvalidSymbol
        | ErrorCode::InvalidQuantity
        | ErrorCode::QuantityOutOfRange
        | ErrorCode::InvalidPrice
        | ErrorCode::PriceNotPositive
        | ErrorCode::InvalidDate
        | ErrorCode::MissingEquityBalance
        | ErrorCode::InvalidEquityBalance
        | ErrorCode::PositionValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::InvalidCredentials
        | ErrorCode::MissingToken
        | ErrorCode::TokenInvalid
        | ErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::UserNotFound | ErrorCode::TargetNotFound | ErrorCode::NoActiveSession => {
            StatusCode::NOT_FOUND
        }
        ErrorCode::EmailExists
        | ErrorCode::PortfolioExists
        | ErrorCode::TargetIsSuperuser
        | ErrorCode::AlreadyImpersonating => StatusCode::CONFLICT,
        ErrorCode::BatchFailed => StatusCode::BAD_GATEWAY,
        ErrorCode::BatchTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        Self::from_domain(value)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.to_status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = &self.trace_id {
            builder.insert_header((TRACE_ID_HEADER, id.clone()));
        }
        if matches!(self.code, ErrorCode::Internal) {
            error!(message = %self.message, "internal error redacted from response");
            let mut redacted = self.clone();
            redacted.message = "internal server error".to_owned();
            redacted.details = None;
            return builder.json(redacted);
        }
        builder.json(self)
    }
}

/// Convenience alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;
