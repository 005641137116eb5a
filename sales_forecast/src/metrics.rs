//! Metrics for evaluating forecast performance

use crate::error::{PipelineError, Result};
use serde::Serialize;

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, over non-zero actuals
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

/// Compare forecast values against actual values of the same length.
///
/// Zero-filled months carry no revenue, so they are left out of MAPE instead
/// of dividing by zero; MAPE is 0 when every actual is zero. sMAPE counts a
/// month where both values are zero as a perfect match.
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(PipelineError::InvalidParameter(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut pct_sum = 0.0;
    let mut pct_months = 0usize;
    let mut sym_sum = 0.0;

    for (&f, &a) in forecast.iter().zip(actual) {
        let error = (a - f).abs();
        abs_sum += error;
        sq_sum += error * error;
        if a != 0.0 {
            pct_sum += 100.0 * error / a.abs();
            pct_months += 1;
        }
        let magnitude = a.abs() + f.abs();
        if magnitude > 0.0 {
            sym_sum += 200.0 * error / magnitude;
        }
    }

    let n = forecast.len() as f64;
    let mse = sq_sum / n;

    Ok(ForecastAccuracy {
        mae: abs_sum / n,
        mse,
        rmse: mse.sqrt(),
        mape: if pct_months == 0 {
            0.0
        } else {
            pct_sum / pct_months as f64
        },
        smape: sym_sum / n,
    })
}
