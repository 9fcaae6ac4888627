//! Error types for the returns/simulation/selection core.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, FrontierError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrontierError {
    /// Not enough price observations to form a single return.
    #[error("Insufficient data for {context}: need at least {required} observations, got {available}")]
    InsufficientData {
        context: String,
        required: usize,
        available: usize,
    },

    /// Frontier selection over zero simulated portfolios.
    #[error("Cannot select a frontier from an empty portfolio set")]
    EmptyPortfolioSet,

    /// Weight vector and statistics were built for different ticker universes.
    #[error("Ticker mismatch: weights cover {weights:?}, statistics cover {stats:?}")]
    TickerMismatch {
        weights: Vec<String>,
        stats: Vec<String>,
    },

    #[error("No price series loaded for ticker {0}")]
    UnknownTicker(String),

    #[error("Duplicate observation for {ticker} on {date}")]
    DuplicateObservation { ticker: String, date: NaiveDate },

    #[error("Invalid price {price} for {ticker} on {date}")]
    InvalidPrice {
        ticker: String,
        date: NaiveDate,
        price: f64,
    },

    #[error("Row {row} has {actual} prices, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FrontierError {
    pub fn insufficient_data(context: impl Into<String>, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            required,
            available,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
