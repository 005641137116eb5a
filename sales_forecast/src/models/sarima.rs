//! Multiplicative seasonal ARIMA model
//!
//! Coefficients are estimated by conditional sum of squares: the series is
//! differenced, residuals are computed with zero presample values, and
//! Levenberg-Marquardt minimises their squared sum. The optimiser works on
//! unconstrained values that are mapped onto stationary AR and invertible
//! MA operators, so every trial point is a valid model.

use crate::error::{PipelineError, Result};
use crate::metrics::forecast_accuracy;
use crate::models::{
    ArimaOrder, Coefficients, FitDiagnostics, ForecastModel, ForecastPoint, ForecastResult,
    SeasonalOrder, TrainedForecastModel,
};
use crate::series::MonthlySeries;
use chrono::NaiveDate;
use forecast_math::polynomial::{ar_polynomial, differencing_polynomial, ma_polynomial, multiply};
use forecast_math::transform::{constrain_invertible, constrain_stationary};
use forecast_math::{arma, differencing};
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{DMatrix, DVector, Dyn, Owned};
use statrs::distribution::{ContinuousCDF, Normal};
use std::cell::Cell;
use std::time::{Duration, Instant};
use tracing::debug;

const MAX_ORDER: usize = 3;
const OPTIMISER_PATIENCE: usize = 200;
/// Relative change in the scaled sum of squares and in the parameters
/// below which the optimiser stops
const OPTIMISER_TOLERANCE: f64 = 1e-10;

/// Untrained SARIMA(p,d,q)(P,D,Q,s) model
#[derive(Debug, Clone)]
pub struct SarimaModel {
    name: String,
    order: ArimaOrder,
    seasonal: SeasonalOrder,
    time_limit: Option<Duration>,
}

impl SarimaModel {
    /// Create a model with the given orders.
    ///
    /// Each AR and MA order is limited to 3, and seasonal terms need a
    /// period of at least 2.
    pub fn new(order: ArimaOrder, seasonal: SeasonalOrder) -> Result<Self> {
        let orders = [order.p, order.q, seasonal.p, seasonal.q];
        if orders.iter().any(|&o| o > MAX_ORDER) {
            return Err(PipelineError::InvalidParameter(format!(
                "AR and MA orders must not exceed {}",
                MAX_ORDER
            )));
        }
        if order.d > 2 || seasonal.d > 1 {
            return Err(PipelineError::InvalidParameter(
                "Differencing order must be at most 2 and seasonal differencing at most 1"
                    .to_string(),
            ));
        }
        if !seasonal.is_empty() && seasonal.period < 2 {
            return Err(PipelineError::InvalidParameter(
                "Seasonal terms require a period of at least 2".to_string(),
            ));
        }

        Ok(Self {
            name: format!("SARIMA{}{}", order, seasonal),
            order,
            seasonal,
            time_limit: None,
        })
    }

    /// Abandon training with a `Timeout` error once `limit` has passed.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn seasonal_order(&self) -> SeasonalOrder {
        self.seasonal
    }

    fn period(&self) -> usize {
        if self.seasonal.is_empty() {
            1
        } else {
            self.seasonal.period
        }
    }

    fn parameter_count(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    /// Map unconstrained optimiser values onto coefficients.
    fn coefficients(&self, params: &[f64]) -> Coefficients {
        let (ar, rest) = params.split_at(self.order.p);
        let (ma, rest) = rest.split_at(self.order.q);
        let (seasonal_ar, seasonal_ma) = rest.split_at(self.seasonal.p);

        Coefficients {
            ar: constrain_stationary(ar),
            ma: constrain_invertible(ma),
            seasonal_ar: constrain_stationary(seasonal_ar),
            seasonal_ma: constrain_invertible(seasonal_ma),
        }
    }

    /// Full AR and MA operators of the differenced series
    fn operators(&self, coefficients: &Coefficients) -> (Vec<f64>, Vec<f64>) {
        let period = self.period();
        let ar = multiply(
            &ar_polynomial(&coefficients.ar, 1),
            &ar_polynomial(&coefficients.seasonal_ar, period),
        );
        let ma = multiply(
            &ma_polynomial(&coefficients.ma, 1),
            &ma_polynomial(&coefficients.seasonal_ma, period),
        );
        (ar, ma)
    }

    fn initial_params(&self) -> Vec<f64> {
        // Opposite signs keep AR and MA factors from cancelling at the start
        let mut params = Vec::with_capacity(self.parameter_count());
        params.extend(std::iter::repeat(0.1).take(self.order.p));
        params.extend(std::iter::repeat(-0.1).take(self.order.q));
        params.extend(std::iter::repeat(0.1).take(self.seasonal.p));
        params.extend(std::iter::repeat(-0.1).take(self.seasonal.q));
        params
    }
}

impl ForecastModel for SarimaModel {
    type Trained = FittedSarima;

    fn train(&self, series: &MonthlySeries) -> Result<FittedSarima> {
        let started = Instant::now();
        let deadline = self.time_limit.map(|limit| (started + limit, limit));

        let history = series.values();
        let period = self.period();
        let w = differencing::difference(history, self.order.d, self.seasonal.d, period)?;

        let n_params = self.parameter_count();
        if w.len() <= n_params {
            return Err(PipelineError::Forecast(format!(
                "{} needs more than {} differenced observations, have {}",
                self.name,
                n_params,
                w.len()
            )));
        }

        check_deadline(deadline)?;

        let scale = w.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let (params, evaluations, termination) = if scale == 0.0 || n_params == 0 {
            (vec![0.0; n_params], 0, "not required".to_string())
        } else {
            let scaled: Vec<f64> = w.iter().map(|v| v / scale).collect();
            let problem = CssProblem {
                model: self,
                w: scaled,
                params: DVector::from_vec(self.initial_params()),
                deadline: deadline.map(|(at, _)| at),
                expired: Cell::new(false),
            };

            let (problem, report) = LevenbergMarquardt::new()
                .with_ftol(OPTIMISER_TOLERANCE)
                .with_xtol(OPTIMISER_TOLERANCE)
                .with_patience(OPTIMISER_PATIENCE)
                .minimize(problem);

            if problem.expired.get() {
                check_deadline(deadline)?;
            }
            if !report.termination.was_successful() {
                return Err(PipelineError::Forecast(format!(
                    "{} failed to converge: {:?} after {} evaluations",
                    self.name, report.termination, report.number_of_evaluations
                )));
            }

            (
                problem.params.iter().copied().collect(),
                report.number_of_evaluations,
                format!("{:?}", report.termination),
            )
        };

        let coefficients = if scale == 0.0 {
            Coefficients {
                ar: vec![0.0; self.order.p],
                ma: vec![0.0; self.order.q],
                seasonal_ar: vec![0.0; self.seasonal.p],
                seasonal_ma: vec![0.0; self.seasonal.q],
            }
        } else {
            self.coefficients(&params)
        };
        let (ar, ma) = self.operators(&coefficients);

        let residuals = arma::residuals(&w, &ar, &ma);
        if residuals.iter().any(|e| !e.is_finite()) {
            return Err(PipelineError::Forecast(format!(
                "{} produced non-finite residuals",
                self.name
            )));
        }

        let sse: f64 = residuals.iter().map(|e| e * e).sum();
        let observations = w.len();
        let sigma2 = sse / observations as f64;
        let aic = (sigma2 > 0.0)
            .then(|| observations as f64 * sigma2.ln() + 2.0 * (n_params as f64 + 1.0));

        let lost = history.len() - w.len();
        let fitted: Vec<f64> = history[lost..]
            .iter()
            .zip(residuals.iter())
            .map(|(y, e)| y - e)
            .collect();
        let accuracy = forecast_accuracy(&fitted, &history[lost..]).ok();

        debug!(
            model = %self.name,
            observations,
            sigma2,
            evaluations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Trained seasonal ARIMA"
        );

        Ok(FittedSarima {
            name: self.name.clone(),
            order: self.order,
            seasonal: self.seasonal,
            series: series.clone(),
            w,
            residuals,
            ar,
            ma,
            fitted,
            diagnostics: FitDiagnostics {
                coefficients,
                sigma2,
                sse,
                observations,
                aic,
                evaluations,
                termination,
                accuracy,
            },
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn check_deadline(deadline: Option<(Instant, Duration)>) -> Result<()> {
    match deadline {
        Some((at, limit)) if Instant::now() >= at => Err(PipelineError::Timeout {
            operation: "model fit",
            limit,
        }),
        _ => Ok(()),
    }
}

/// Conditional sum of squares objective for the optimiser
struct CssProblem<'a> {
    model: &'a SarimaModel,
    w: Vec<f64>,
    params: DVector<f64>,
    deadline: Option<Instant>,
    expired: Cell<bool>,
}

impl CssProblem<'_> {
    fn residuals_at(&self, params: &[f64]) -> Option<DVector<f64>> {
        if let Some(at) = self.deadline {
            if Instant::now() >= at {
                self.expired.set(true);
                return None;
            }
        }

        let coefficients = self.model.coefficients(params);
        let (ar, ma) = self.model.operators(&coefficients);
        let e = arma::residuals(&self.w, &ar, &ma);
        if e.iter().all(|v| v.is_finite()) {
            Some(DVector::from_vec(e))
        } else {
            None
        }
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for CssProblem<'_> {
    type ParameterStorage = Owned<f64, Dyn>;
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;

    fn set_params(&mut self, p: &DVector<f64>) {
        self.params.copy_from(p);
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        self.residuals_at(self.params.as_slice())
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        // Forward differences
        let base = self.residuals()?;
        let mut jacobian = DMatrix::zeros(base.len(), self.params.len());
        let mut shifted: Vec<f64> = self.params.iter().copied().collect();

        for j in 0..shifted.len() {
            let original = shifted[j];
            let step = 1e-6 * original.abs().max(1.0);
            shifted[j] = original + step;
            let moved = self.residuals_at(&shifted)?;
            shifted[j] = original;

            jacobian.set_column(j, &((moved - &base) / step));
        }

        Some(jacobian)
    }
}

/// SARIMA model with estimated coefficients
#[derive(Debug, Clone)]
pub struct FittedSarima {
    name: String,
    order: ArimaOrder,
    seasonal: SeasonalOrder,
    series: MonthlySeries,
    w: Vec<f64>,
    residuals: Vec<f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
    fitted: Vec<f64>,
    diagnostics: FitDiagnostics,
}

impl FittedSarima {
    pub fn coefficients(&self) -> &Coefficients {
        &self.diagnostics.coefficients
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn period(&self) -> usize {
        if self.seasonal.is_empty() {
            1
        } else {
            self.seasonal.period
        }
    }
}

impl TrainedForecastModel for FittedSarima {
    fn forecast(&self, horizon: usize, confidence_pct: f64) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(PipelineError::InvalidParameter(
                "Forecast horizon must be at least one month".to_string(),
            ));
        }
        if !(confidence_pct > 0.0 && confidence_pct < 100.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "Confidence level must be between 0 and 100 percent, got {}",
                confidence_pct
            )));
        }

        let period = self.period();
        let differenced = arma::forecast(&self.w, &self.residuals, &self.ar, &self.ma, horizon);
        let levels = differencing::integrate(
            self.series.values(),
            &differenced,
            self.order.d,
            self.seasonal.d,
            period,
        )?;

        let integrated_ar = multiply(
            &self.ar,
            &differencing_polynomial(self.order.d, self.seasonal.d, period),
        );
        let psi = arma::psi_weights(&integrated_ar, &self.ma, horizon);

        let alpha = 1.0 - confidence_pct / 100.0;
        let z = Normal::new(0.0, 1.0)
            .map_err(|e| PipelineError::Forecast(e.to_string()))?
            .inverse_cdf(1.0 - alpha / 2.0);

        let mut cumulative = 0.0;
        let points = self
            .series
            .next_months(horizon)
            .into_iter()
            .zip(levels)
            .zip(psi)
            .map(|((month, point), weight)| {
                cumulative += weight * weight;
                let margin = z * (self.diagnostics.sigma2 * cumulative).sqrt();
                ForecastPoint {
                    month,
                    point,
                    lower: point - margin,
                    upper: point + margin,
                }
            })
            .collect::<Vec<_>>();

        ForecastResult::new(
            self.name.clone(),
            confidence_pct,
            points,
            self.diagnostics.clone(),
        )
    }

    fn fitted_values(&self) -> Vec<(NaiveDate, f64)> {
        let skip = self.series.len() - self.fitted.len();
        self.series
            .months()
            .into_iter()
            .skip(skip)
            .zip(self.fitted.iter().copied())
            .collect()
    }

    fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    fn name(&self) -> &str {
        &self.name
    }
}
