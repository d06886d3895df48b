//! Onboarding orchestrator: portfolio ingestion plus batch trigger.
//!
//! Commit and batch-trigger are two separate failure domains on purpose.
//! The batch engine only runs once a valid, non-empty portfolio has been
//! committed, and a batch failure never rolls the commit back; the caller
//! is told about both outcomes. The request blocks for the duration of
//! the batch call, bounded by the configured deadline.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::{info, warn};

use crate::domain::error::{DomainError, ErrorCode};
use crate::domain::ingest::{UploadLimits, check_file_type, parse_portfolio_csv};
use crate::domain::ports::{
    BatchEngine, BatchEngineError, BatchReport, PortfolioStore, PortfolioStoreError,
};
use crate::domain::portfolio::Portfolio;
use crate::domain::user::UserId;

/// Default ceiling on the synchronous batch call.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(45);

/// Raw upload as received by the inbound adapter.
#[derive(Debug, Clone)]
pub struct PortfolioUpload {
    /// Client-declared file name, when present.
    pub filename: Option<String>,
    /// Client-declared content type, when present.
    pub content_type: Option<String>,
    /// The file bytes.
    pub bytes: Vec<u8>,
}

/// Terminal batch outcome attached to a committed portfolio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The engine completed and returned a report.
    Completed(BatchReport),
    /// The engine ran and failed after its own retries.
    Failed,
    /// The engine did not answer within the deadline.
    TimedOut,
}

impl BatchOutcome {
    /// The taxonomy code describing a non-success outcome, if any.
    pub const fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Completed(_) => None,
            Self::Failed => Some(ErrorCode::BatchFailed),
            Self::TimedOut => Some(ErrorCode::BatchTimeout),
        }
    }
}

/// Result of a create-portfolio call: always a committed portfolio, plus
/// whichever way the batch went.
#[derive(Debug, Clone)]
pub struct OnboardingOutcome {
    /// The committed portfolio.
    pub portfolio: Portfolio,
    /// How the downstream batch ended.
    pub batch: BatchOutcome,
}

/// Orchestrates file validation, the atomic commit, and the batch call.
#[derive(Clone)]
pub struct OnboardingService {
    portfolios: Arc<dyn PortfolioStore>,
    batch: Arc<dyn BatchEngine>,
    limits: UploadLimits,
    batch_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl OnboardingService {
    /// Build the service over its collaborators.
    pub fn new(
        portfolios: Arc<dyn PortfolioStore>,
        batch: Arc<dyn BatchEngine>,
        limits: UploadLimits,
        batch_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            portfolios,
            batch,
            limits,
            batch_timeout,
            clock,
        }
    }

    /// Ceiling applied to uploads; inbound adapters use it to stop
    /// reading oversized bodies early.
    pub const fn max_upload_bytes(&self) -> usize {
        self.limits.max_bytes
    }

    /// Validate and commit an uploaded portfolio, then trigger the batch.
    ///
    /// Terminal states are exactly two: no portfolio (any validation or
    /// commit failure), or committed portfolio with a batch outcome. A
    /// timed-out batch still leaves the commit in place.
    pub async fn create_portfolio(
        &self,
        owner: UserId,
        upload: PortfolioUpload,
    ) -> Result<OnboardingOutcome, DomainError> {
        check_file_type(upload.filename.as_deref(), upload.content_type.as_deref())?;
        let positions = parse_portfolio_csv(&upload.bytes, self.limits)?;

        let portfolio = self
            .portfolios
            .create(owner, positions, self.clock.utc())
            .await
            .map_err(map_portfolio_error)?;
        info!(
            owner = %owner,
            portfolio = %portfolio.id,
            positions = portfolio.positions.len(),
            "portfolio committed"
        );

        let batch = self.trigger_batch(&portfolio).await;
        Ok(OnboardingOutcome { portfolio, batch })
    }

    /// Run the batch engine under the configured deadline.
    async fn trigger_batch(&self, portfolio: &Portfolio) -> BatchOutcome {
        match tokio::time::timeout(self.batch_timeout, self.batch.run(portfolio)).await {
            Ok(Ok(report)) => {
                info!(
                    portfolio = %portfolio.id,
                    positions_priced = report.positions_priced,
                    "batch completed"
                );
                BatchOutcome::Completed(report)
            }
            Ok(Err(error)) => {
                let message = match &error {
                    BatchEngineError::Failed { message }
                    | BatchEngineError::Unavailable { message } => message.as_str(),
                };
                warn!(
                    portfolio = %portfolio.id,
                    error = message,
                    "batch failed; portfolio remains committed"
                );
                BatchOutcome::Failed
            }
            Err(_elapsed) => {
                warn!(
                    portfolio = %portfolio.id,
                    deadline_secs = self.batch_timeout.as_secs(),
                    "batch timed out; portfolio remains committed"
                );
                BatchOutcome::TimedOut
            }
        }
    }
}

fn map_portfolio_error(error: PortfolioStoreError) -> DomainError {
    match error {
        PortfolioStoreError::AlreadyExists => DomainError::new(
            ErrorCode::PortfolioExists,
            "user already owns a portfolio",
        ),
        PortfolioStoreError::Connection { message } | PortfolioStoreError::Write { message } => {
            DomainError::internal(message)
        }
    }
}
