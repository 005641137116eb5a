//! Regular and seasonal differencing
//!
//! `difference` removes trend and seasonality before an ARMA fit;
//! `integrate` undoes it for values forecast on the differenced scale.

use crate::polynomial::{degree, differencing_polynomial};
use crate::{MathError, Result};

/// Apply `(1 - B)^d (1 - B^s)^D` to a series.
///
/// The result is `d + s * D` observations shorter than the input.
pub fn difference(series: &[f64], d: usize, seasonal_d: usize, period: usize) -> Result<Vec<f64>> {
    if seasonal_d > 0 && period < 2 {
        return Err(MathError::InvalidInput(
            "Seasonal differencing requires a period of at least 2".to_string(),
        ));
    }

    let lost = d + seasonal_d * period;
    if series.len() <= lost {
        return Err(MathError::InsufficientData(format!(
            "Differencing of order ({}, {}) with period {} needs more than {} observations, have {}",
            d,
            seasonal_d,
            period,
            lost,
            series.len()
        )));
    }

    let mut current = series.to_vec();
    for _ in 0..d {
        current = lagged_difference(&current, 1);
    }
    for _ in 0..seasonal_d {
        current = lagged_difference(&current, period);
    }

    Ok(current)
}

fn lagged_difference(values: &[f64], lag: usize) -> Vec<f64> {
    values[lag..]
        .iter()
        .zip(values.iter())
        .map(|(current, previous)| current - previous)
        .collect()
}

/// Turn forecasts of the differenced series back into levels.
///
/// `history` is the undifferenced series the forecasts continue from. Each
/// level is `y_t = w_t - sum_k delta_k * y_(t-k)` for the differencing
/// operator `delta`.
pub fn integrate(
    history: &[f64],
    differenced_forecasts: &[f64],
    d: usize,
    seasonal_d: usize,
    period: usize,
) -> Result<Vec<f64>> {
    let delta = differencing_polynomial(d, seasonal_d, period);
    let order = degree(&delta);
    if history.len() < order {
        return Err(MathError::InsufficientData(format!(
            "Integration needs at least {} past observations, have {}",
            order,
            history.len()
        )));
    }

    let mut levels = history.to_vec();
    let mut forecasts = Vec::with_capacity(differenced_forecasts.len());

    for &w in differenced_forecasts {
        let t = levels.len();
        let mut level = w;
        for k in 1..=order {
            level -= delta[k] * levels[t - k];
        }
        levels.push(level);
        forecasts.push(level);
    }

    Ok(forecasts)
}
