//! Batch-engine adapters.
//!
//! [`HttpBatchEngine`] owns transport details only: request serialisation,
//! HTTP error mapping, and JSON decoding of the engine's report. Retries
//! and provider fallback live inside the engine itself, so by the time an
//! error surfaces here the engine has given up. [`FixtureBatchEngine`]
//! backs local serving and tests.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::portfolio::Portfolio;
use crate::domain::ports::{BatchEngine, BatchEngineError, BatchReport};

/// Request body sent to the engine's compute endpoint.
#[derive(Debug, Serialize)]
struct BatchRequestDto {
    portfolio_id: String,
    owner_id: String,
    position_count: usize,
}

/// Report body returned by the engine on success.
#[derive(Debug, Deserialize)]
struct BatchReportDto {
    #[serde(default)]
    positions_priced: Option<usize>,
}

/// Reqwest-backed adapter calling the external computation engine.
pub struct HttpBatchEngine {
    client: Client,
    endpoint: Url,
}

impl HttpBatchEngine {
    /// Build an adapter with an explicit per-request transport timeout.
    ///
    /// The orchestrator applies its own overall deadline on top; the
    /// transport timeout here only guards connection-level hangs.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, transport_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(transport_timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl BatchEngine for HttpBatchEngine {
    async fn run(&self, portfolio: &Portfolio) -> Result<BatchReport, BatchEngineError> {
        let body = BatchRequestDto {
            portfolio_id: portfolio.id.to_string(),
            owner_id: portfolio.owner.to_string(),
            position_count: portfolio.positions.len(),
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| BatchEngineError::unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            let report: BatchReportDto = response
                .json()
                .await
                .map_err(|e| BatchEngineError::failed(format!("unreadable report: {e}")))?;
            Ok(BatchReport {
                positions_priced: report
                    .positions_priced
                    .unwrap_or(portfolio.positions.len()),
                completed_at: Utc::now(),
            })
        } else {
            Err(BatchEngineError::failed(format!(
                "engine answered {status}"
            )))
        }
    }
}

/// How a [`FixtureBatchEngine`] behaves when invoked.
enum FixtureBehaviour {
    Complete,
    Fail(String),
    Hang,
}

/// In-memory engine standing in for the external computation pipeline.
pub struct FixtureBatchEngine {
    behaviour: FixtureBehaviour,
}

impl FixtureBatchEngine {
    /// Engine that prices every position immediately.
    pub const fn completing() -> Self {
        Self {
            behaviour: FixtureBehaviour::Complete,
        }
    }

    /// Engine that reports failure with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behaviour: FixtureBehaviour::Fail(message.into()),
        }
    }

    /// Engine that never answers, for deadline coverage.
    pub const fn hanging() -> Self {
        Self {
            behaviour: FixtureBehaviour::Hang,
        }
    }
}

#[async_trait]
impl BatchEngine for FixtureBatchEngine {
    async fn run(&self, portfolio: &Portfolio) -> Result<BatchReport, BatchEngineError> {
        match &self.behaviour {
            FixtureBehaviour::Complete => Ok(BatchReport {
                positions_priced: portfolio.positions.len(),
                completed_at: Utc::now(),
            }),
            FixtureBehaviour::Fail(message) => Err(BatchEngineError::failed(message.clone())),
            FixtureBehaviour::Hang => {
                futures_util::future::pending::<()>().await;
                Err(BatchEngineError::unavailable("unreachable"))
            }
        }
    }
}
