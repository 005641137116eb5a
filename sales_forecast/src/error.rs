//! Error types for the sales_forecast crate

use crate::filters::Dimension;
use polars::prelude::PolarsError;
use std::time::Duration;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required settings are missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The database could not be reached or refused the credentials
    #[error("Connection error: {0}")]
    Connection(String),

    /// Too few observations matched the filters to fit a seasonal model
    #[error(
        "Insufficient data for forecast. Found only {rows} data points with filters:\n{}\nNeed at least {required} monthly data points for reliable forecasting.",
        describe_filters(.filters)
    )]
    InsufficientData {
        /// Rows returned by the query
        rows: usize,
        /// Minimum rows needed
        required: usize,
        /// Active filters, in canonical dimension order
        filters: Vec<(Dimension, String)>,
    },

    /// The model failed to converge or produced a degenerate fit
    #[error("Forecasting error: {0}")]
    Forecast(String),

    /// A bounded operation exceeded its deadline
    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The database accepted the connection but rejected the query
    #[error("Query error: {0}")]
    Query(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    Data(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error writing JSON output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, PipelineError>;

fn describe_filters(filters: &[(Dimension, String)]) -> String {
    if filters.is_empty() {
        return "- (no filters)".to_string();
    }

    filters
        .iter()
        .map(|(dimension, value)| format!("- {}: {}", dimension.label(), value))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<PolarsError> for PipelineError {
    fn from(err: PolarsError) -> Self {
        PipelineError::Data(err.to_string())
    }
}

impl From<forecast_math::MathError> for PipelineError {
    fn from(err: forecast_math::MathError) -> Self {
        PipelineError::Forecast(err.to_string())
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => PipelineError::Connection(err.to_string()),
            other => PipelineError::Query(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message_lists_filters() {
        let err = PipelineError::InsufficientData {
            rows: 23,
            required: 24,
            filters: vec![
                (Dimension::Country, "Germany".to_string()),
                (Dimension::ProductLine, "Bikes".to_string()),
            ],
        };
        let message = err.to_string();

        assert!(message.contains("Found only 23 data points"));
        assert!(message.contains("- Country: Germany"));
        assert!(message.contains("- Product Line: Bikes"));
        assert!(message.contains("at least 24"));
    }

    #[test]
    fn test_insufficient_data_without_filters() {
        let err = PipelineError::InsufficientData {
            rows: 3,
            required: 24,
            filters: Vec::new(),
        };
        assert!(err.to_string().contains("(no filters)"));
    }

    #[test]
    fn test_timeout_display() {
        let err = PipelineError::Timeout {
            operation: "model fit",
            limit: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "model fit timed out after 2s");
    }

    #[test]
    fn test_pool_timeout_is_a_connection_error() {
        let err = PipelineError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, PipelineError::Connection(_)));

        let err = PipelineError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, PipelineError::Query(_)));
    }

    #[test]
    fn test_math_error_becomes_forecast_error() {
        let err = PipelineError::from(forecast_math::MathError::InsufficientData(
            "too short".to_string(),
        ));
        assert!(matches!(err, PipelineError::Forecast(msg) if msg.contains("too short")));
    }
}
