//! # Forecast Math
//!
//! Numeric building blocks for seasonal ARIMA models.
//! This crate provides lag polynomial arithmetic, regular and seasonal
//! differencing, the ARMA recursions used for estimation and forecasting,
//! and the parameter transform that keeps fitted coefficients stationary.
//!
//! All polynomials are stored as coefficient vectors in the lag operator `B`,
//! lowest power first, with a leading `1.0`: `1 - 0.5B` is `[1.0, -0.5]`.

use thiserror::Error;

pub mod arma;
pub mod differencing;
pub mod polynomial;
pub mod transform;

/// Errors that can occur in time series calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecast math operations
pub type Result<T> = std::result::Result<T, MathError>;
