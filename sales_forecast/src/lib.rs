//! # Sales Forecast
//!
//! A Rust library for filter-driven forecasting of monthly sales revenue.
//!
//! ## Features
//!
//! - Environment-based settings for the sales database (`.env` supported)
//! - Pooled, lazily connecting database access with scoped connections
//! - Retrieval of sales rows by organisation, geography and product filters
//! - Gapless month-end revenue series with zero-filled missing months
//! - Seasonal ARIMA forecasts with normal-theory confidence intervals
//! - CSV and JSON export of forecast results
//!
//! ## Minimum history
//!
//! Fewer than 24 matching rows is reported as
//! [`PipelineError::InsufficientData`], listing the active filters, before any
//! model is fitted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sales_forecast::config::{ConnectorOptions, DatabaseSettings, ForecastConfig};
//! use sales_forecast::filters::{Dimension, FilterCriteria};
//! use sales_forecast::{Connector, ForecastPipeline, Forecaster, Retriever};
//!
//! # async fn run() -> sales_forecast::error::Result<()> {
//! let settings = DatabaseSettings::resolve()?;
//! let connector = Connector::connect_lazy(&settings, &ConnectorOptions::resolve()?)?;
//!
//! let pipeline = ForecastPipeline::new(
//!     Retriever::new(connector),
//!     Forecaster::new(ForecastConfig::resolve()?),
//! );
//!
//! let criteria = FilterCriteria::new()
//!     .with(Dimension::Country, "Germany")
//!     .with(Dimension::ProductLine, "Bikes");
//!
//! // Twelve months ahead with 95% intervals
//! let output = pipeline.run(&criteria, 12, 95.0).await?;
//! for point in &output.forecast.points {
//!     println!("{} {:.0} [{:.0}, {:.0}]", point.month, point.point, point.lower, point.upper);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod filters;
pub mod forecaster;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod retriever;
pub mod series;
pub mod store;

// Re-export commonly used types
pub use crate::data::{FilteredDataset, SalesRecord, MIN_OBSERVATIONS};
pub use crate::error::PipelineError;
pub use crate::filters::{Dimension, FilterCriteria};
pub use crate::forecaster::Forecaster;
pub use crate::models::{ForecastModel, ForecastPoint, ForecastResult, TrainedForecastModel};
pub use crate::pipeline::{ForecastPipeline, PipelineOutput};
pub use crate::retriever::Retriever;
pub use crate::series::MonthlySeries;
pub use crate::store::Connector;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
