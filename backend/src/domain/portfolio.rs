//! Portfolio and position types with row-level validation.
//!
//! A position row is only constructed through [`Position::from_fields`],
//! which applies every semantic check the ingestion pipeline relies on:
//! symbol shape, quantity sign and magnitude, price positivity, date
//! parseability, and equity-balance presence. Structural file checks live
//! in the ingestion module; this module assumes it is handed one row's
//! already-split fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::error::ErrorCode;
use crate::domain::user::UserId;

/// Maximum accepted symbol length, in characters.
pub const SYMBOL_MAX: usize = 12;
/// Upper bound on the magnitude of a position quantity.
pub const QUANTITY_MAX: f64 = 1_000_000_000.0;
/// Trade dates must be ISO-8601 calendar dates.
pub const TRADE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Identifier of a committed portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PortfolioId(Uuid);

impl PortfolioId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One validated position row.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// Instrument symbol, uppercased.
    pub symbol: String,
    /// Units held; strictly positive and bounded by [`QUANTITY_MAX`].
    pub quantity: f64,
    /// Cost basis per unit; strictly positive.
    pub price: f64,
    /// Trade date of the opening transaction.
    pub trade_date: NaiveDate,
    /// Account equity balance reported alongside the row; non-negative.
    pub equity_balance: f64,
}

/// A committed portfolio: one per user, positions in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    /// Stable portfolio identifier.
    pub id: PortfolioId,
    /// Owning user; unique store-wide.
    pub owner: UserId,
    /// Committed positions, in upload order.
    pub positions: Vec<Position>,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}

/// One row's validation failure, reported with its 1-based data-row number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based index of the offending data row (the header is row 0).
    pub row: usize,
    /// Taxonomy code for the failure.
    pub code: ErrorCode,
    /// Human-readable description including the offending value.
    pub message: String,
}

impl RowError {
    fn new(row: usize, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            row,
            code,
            message: message.into(),
        }
    }
}

/// Field values of one data row, split and trimmed by the parser.
#[derive(Debug, Clone)]
pub struct RowFields<'a> {
    /// Instrument symbol as uploaded.
    pub symbol: &'a str,
    /// Quantity field as uploaded.
    pub quantity: &'a str,
    /// Price field as uploaded.
    pub price: &'a str,
    /// Trade-date field as uploaded.
    pub trade_date: &'a str,
    /// Equity-balance field as uploaded.
    pub equity_balance: &'a str,
}

impl Position {
    /// Validate one row's fields, collecting **all** failures.
    ///
    /// Returns the constructed position only when every field passes;
    /// otherwise returns every error the row exhibits, not just the first.
    pub fn from_fields(row: usize, fields: &RowFields<'_>) -> Result<Self, Vec<RowError>> {
        let mut errors = Vec::new();

        let symbol = match validate_symbol(fields.symbol) {
            Ok(symbol) => Some(symbol),
            Err((code, message)) => {
                errors.push(RowError::new(row, code, message));
                None
            }
        };
        let quantity = match validate_quantity(fields.quantity) {
            Ok(quantity) => Some(quantity),
            Err((code, message)) => {
                errors.push(RowError::new(row, code, message));
                None
            }
        };
        let price = match validate_price(fields.price) {
            Ok(price) => Some(price),
            Err((code, message)) => {
                errors.push(RowError::new(row, code, message));
                None
            }
        };
        let trade_date = match validate_trade_date(fields.trade_date) {
            Ok(date) => Some(date),
            Err((code, message)) => {
                errors.push(RowError::new(row, code, message));
                None
            }
        };
        let equity_balance = match validate_equity_balance(fields.equity_balance) {
            Ok(balance) => Some(balance),
            Err((code, message)) => {
                errors.push(RowError::new(row, code, message));
                None
            }
        };

        match (symbol, quantity, price, trade_date, equity_balance) {
            (Some(symbol), Some(quantity), Some(price), Some(trade_date), Some(equity_balance))
                if errors.is_empty() =>
            {
                Ok(Self {
                    symbol,
                    quantity,
                    price,
                    trade_date,
                    equity_balance,
                })
            }
            _ => Err(errors),
        }
    }
}

type FieldResult<T> = Result<T, (ErrorCode, String)>;

fn validate_symbol(raw: &str) -> FieldResult<String> {
    if raw.is_empty() {
        return Err((ErrorCode::InvalidSymbol, "symbol must not be empty".into()));
    }
    if raw.chars().count() > SYMBOL_MAX {
        return Err((
            ErrorCode::InvalidSymbol,
            format!("symbol {raw:?} is longer than {SYMBOL_MAX} characters"),
        ));
    }
    let upper = raw.to_uppercase();
    let acceptable = |c: char| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-';
    if !upper.chars().all(acceptable) {
        return Err((
            ErrorCode::InvalidSymbol,
            format!("symbol {raw:?} contains invalid characters"),
        ));
    }
    Ok(upper)
}

fn validate_quantity(raw: &str) -> FieldResult<f64> {
    let parsed: f64 = raw.parse().map_err(|_| {
        (
            ErrorCode::InvalidQuantity,
            format!("quantity {raw:?} is not a number"),
        )
    })?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err((
            ErrorCode::InvalidQuantity,
            format!("quantity {raw:?} must be a positive number"),
        ));
    }
    if parsed > QUANTITY_MAX {
        return Err((
            ErrorCode::QuantityOutOfRange,
            format!("quantity {raw:?} exceeds the accepted bound"),
        ));
    }
    Ok(parsed)
}

fn validate_price(raw: &str) -> FieldResult<f64> {
    let parsed: f64 = raw.parse().map_err(|_| {
        (
            ErrorCode::InvalidPrice,
            format!("price {raw:?} is not a number"),
        )
    })?;
    if !parsed.is_finite() {
        return Err((
            ErrorCode::InvalidPrice,
            format!("price {raw:?} is not a finite number"),
        ));
    }
    if parsed <= 0.0 {
        return Err((
            ErrorCode::PriceNotPositive,
            format!("price {raw:?} must be positive"),
        ));
    }
    Ok(parsed)
}

fn validate_trade_date(raw: &str) -> FieldResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, TRADE_DATE_FORMAT).map_err(|_| {
        (
            ErrorCode::InvalidDate,
            format!("trade date {raw:?} is not a YYYY-MM-DD date"),
        )
    })
}

fn validate_equity_balance(raw: &str) -> FieldResult<f64> {
    if raw.is_empty() {
        return Err((
            ErrorCode::MissingEquityBalance,
            "equity balance is required".into(),
        ));
    }
    let parsed: f64 = raw.parse().map_err(|_| {
        (
            ErrorCode::InvalidEquityBalance,
            format!("equity balance {raw:?} is not a number"),
        )
    })?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err((
            ErrorCode::InvalidEquityBalance,
            format!("equity balance {raw:?} must be a non-negative number"),
        ));
    }
    Ok(parsed)
}
