//! Seasonal forecasting of a prepared monthly series

use crate::config::ForecastConfig;
use crate::error::{PipelineError, Result};
use crate::models::sarima::SarimaModel;
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::series::MonthlySeries;
use tracing::info;

/// Longest horizon accepted, in months
pub const MAX_HORIZON: usize = 120;
/// Lowest confidence level accepted, in percent
pub const MIN_CONFIDENCE_PCT: f64 = 50.0;

/// Fits a fresh seasonal ARIMA model for every request
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(ForecastConfig::default())
    }
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast `horizon` months past the end of `series` with intervals
    /// covering `confidence_pct` percent.
    pub fn forecast(
        &self,
        series: &MonthlySeries,
        horizon: usize,
        confidence_pct: f64,
    ) -> Result<ForecastResult> {
        validate_request(horizon, confidence_pct)?;

        let model = SarimaModel::new(self.config.order, self.config.seasonal_order)?
            .with_time_limit(self.config.fit_timeout);
        let fitted = model.train(series)?;
        let result = fitted.forecast(horizon, confidence_pct)?;

        info!(
            model = %result.model,
            months = series.len(),
            horizon,
            confidence_pct,
            sigma2 = result.diagnostics.sigma2,
            "Forecast complete"
        );

        Ok(result)
    }
}

fn validate_request(horizon: usize, confidence_pct: f64) -> Result<()> {
    if horizon == 0 || horizon > MAX_HORIZON {
        return Err(PipelineError::InvalidParameter(format!(
            "Forecast horizon must be between 1 and {} months, got {}",
            MAX_HORIZON, horizon
        )));
    }
    if !(MIN_CONFIDENCE_PCT..100.0).contains(&confidence_pct) {
        return Err(PipelineError::InvalidParameter(format!(
            "Confidence level must be at least {} and below 100 percent, got {}",
            MIN_CONFIDENCE_PCT, confidence_pct
        )));
    }
    Ok(())
}
