//! Dispatch error taxonomy
//!
//! Every error is scoped to a single (alert, account) pair and lands in that
//! pair's `OrderReport`. No variant aborts the batch or the process.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while turning one alert into one order on one account.
/// Serializable because rejected outcomes carry the error in their report.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DispatchError {
    /// The alert payload is malformed or fails a field constraint.
    #[error("Invalid alert: {0}")]
    Validation(String),

    /// No configured account trades this (exchange, symbol) route.
    #[error("No account for exchange '{exchange}' trades {symbol}")]
    UnsupportedRoute { exchange: String, symbol: String },

    /// The sized order rounds to zero contracts, nothing to send.
    #[error("Sized quantity is zero after precision flooring")]
    InsufficientSize,

    /// The simulated swap output falls outside the tolerated band
    /// around the alert's expected output.
    #[error("Simulated output {simulated} outside tolerance of expected {expected}")]
    SlippageExceeded { expected: Decimal, simulated: Decimal },

    /// The wallet cannot cover the estimated gas for the swap.
    #[error("Native balance {available} below estimated gas cost {required}")]
    InsufficientGas { available: Decimal, required: Decimal },

    /// The venue refused or failed the request.
    #[error("Venue error: {0}")]
    Venue(String),

    /// Post-trade bookkeeping disagrees with the cached account state.
    #[error("State inconsistency: {0}")]
    Consistency(String),
}

impl DispatchError {
    /// True for rejections that protected the account from a bad order,
    /// as opposed to infrastructure or bookkeeping failures.
    pub fn is_protective(&self) -> bool {
        matches!(
            self,
            DispatchError::UnsupportedRoute { .. }
                | DispatchError::InsufficientSize
                | DispatchError::SlippageExceeded { .. }
                | DispatchError::InsufficientGas { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
