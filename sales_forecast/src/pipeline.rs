//! Retrieval, preparation and forecasting in one call

use crate::error::{PipelineError, Result};
use crate::filters::FilterCriteria;
use crate::forecaster::Forecaster;
use crate::models::ForecastResult;
use crate::retriever::Retriever;
use crate::series::{self, MonthlySeries};
use tracing::info;

/// Everything produced for one forecast request
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Rows that matched the filters
    pub rows: usize,
    pub series: MonthlySeries,
    pub forecast: ForecastResult,
}

/// Filter-driven forecasting over a shared connection pool
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    retriever: Retriever,
    forecaster: Forecaster,
}

impl ForecastPipeline {
    pub fn new(retriever: Retriever, forecaster: Forecaster) -> Self {
        Self {
            retriever,
            forecaster,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Fetch the rows matching `criteria`, build the monthly series and
    /// forecast `horizon` months ahead.
    pub async fn run(
        &self,
        criteria: &FilterCriteria,
        horizon: usize,
        confidence_pct: f64,
    ) -> Result<PipelineOutput> {
        let dataset = self.retriever.fetch(criteria).await?;
        let rows = dataset.len();
        let series = series::prepare(&dataset)?;

        info!(
            rows,
            months = series.len(),
            start = %series.start(),
            end = %series.end(),
            "Prepared series for forecasting"
        );

        // Model fitting is CPU bound
        let forecaster = self.forecaster.clone();
        let training = series.clone();
        let forecast = tokio::task::spawn_blocking(move || {
            forecaster.forecast(&training, horizon, confidence_pct)
        })
        .await
        .map_err(|e| PipelineError::Forecast(format!("Forecast task failed: {}", e)))??;

        Ok(PipelineOutput {
            rows,
            series,
            forecast,
        })
    }
}
