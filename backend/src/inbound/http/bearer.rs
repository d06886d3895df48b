//! Bearer-credential extraction.
//!
//! A thin `FromRequest` wrapper that pulls the `Authorization` header
//! apart without judging it; handlers decide whether a missing credential
//! is fatal by calling [`BearerToken::required`]. Verification and store
//! resolution stay in the authorisation gate.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header};
use futures_util::future::{Ready, ready};

use crate::domain::{DomainError, ErrorCode};

/// Scheme prefix expected on the `Authorization` header.
const BEARER_PREFIX: &str = "Bearer ";

/// The raw bearer credential presented on a request, if any.
#[derive(Debug, Clone)]
pub struct BearerToken(Option<String>);

impl BearerToken {
    /// Extract from a request's headers.
    ///
    /// Only a syntactically well-formed `Authorization: Bearer <token>`
    /// header yields a value; anything else reads as absent and fails
    /// later with `MissingToken`, keeping one error path for "no usable
    /// credential".
    pub fn from_headers(req: &HttpRequest) -> Self {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned);
        Self(token)
    }

    /// The credential, or [`ErrorCode::MissingToken`] when absent.
    pub fn required(&self) -> Result<&str, DomainError> {
        self.0.as_deref().ok_or_else(|| {
            DomainError::new(
                ErrorCode::MissingToken,
                "a bearer credential is required on this route",
            )
        })
    }
}

impl FromRequest for BearerToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_headers(req)))
    }
}
