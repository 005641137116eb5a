//! Forecasting models for monthly series

use crate::error::{PipelineError, Result};
use crate::metrics::ForecastAccuracy;
use crate::series::MonthlySeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::{self, Debug};

/// Non-seasonal order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArimaOrder {
    /// Autoregressive order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// Moving-average order
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Seasonal order `(P, D, Q, s)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    /// Season length in months
    pub period: usize,
}

impl SeasonalOrder {
    pub const fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// True when the order adds no seasonal terms
    pub fn is_empty(&self) -> bool {
        self.p == 0 && self.d == 0 && self.q == 0
    }
}

impl Default for SeasonalOrder {
    fn default() -> Self {
        Self::new(1, 1, 1, 12)
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.p, self.d, self.q, self.period)
    }
}

/// One forecast month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Month end the value is forecast for
    pub month: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Fitted coefficients, in the sign convention of the lag operators
/// `1 - ar(B)` and `1 + ma(B)`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Coefficients {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

/// How well a model fits its training series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitDiagnostics {
    pub coefficients: Coefficients,
    /// Innovation variance
    pub sigma2: f64,
    /// Sum of squared one-step residuals
    pub sse: f64,
    /// Observations left after differencing
    pub observations: usize,
    /// Akaike information criterion; absent for a perfect fit
    pub aic: Option<f64>,
    /// Residual evaluations spent by the optimiser
    pub evaluations: usize,
    pub termination: String,
    /// One-step in-sample accuracy on the level scale
    pub accuracy: Option<ForecastAccuracy>,
}

/// Forecast with a symmetric confidence interval per month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Model description, e.g. `SARIMA(1,1,1)(1,1,1,12)`
    pub model: String,
    /// Interval coverage in percent
    pub confidence_pct: f64,
    pub points: Vec<ForecastPoint>,
    pub diagnostics: FitDiagnostics,
}

impl ForecastResult {
    pub fn new(
        model: impl Into<String>,
        confidence_pct: f64,
        points: Vec<ForecastPoint>,
        diagnostics: FitDiagnostics,
    ) -> Result<Self> {
        if let Some(bad) = points.iter().find(|p| {
            !(p.point.is_finite() && p.lower.is_finite() && p.upper.is_finite())
                || p.lower > p.point
                || p.point > p.upper
        }) {
            return Err(PipelineError::Forecast(format!(
                "Degenerate forecast for {}: point {}, interval [{}, {}]",
                bad.month, bad.point, bad.lower, bad.upper
            )));
        }

        Ok(Self {
            model: model.into(),
            confidence_pct,
            points,
            diagnostics,
        })
    }

    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.month).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.point).collect()
    }

    pub fn intervals(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.lower, p.upper)).collect()
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Forecast `horizon` months past the training series
    fn forecast(&self, horizon: usize, confidence_pct: f64) -> Result<ForecastResult>;

    /// One-step predictions for the training months that have them
    fn fitted_values(&self) -> Vec<(NaiveDate, f64)>;

    fn diagnostics(&self) -> &FitDiagnostics;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a monthly series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a monthly series
    fn train(&self, series: &MonthlySeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod sarima;
