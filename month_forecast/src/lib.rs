//! # Month Forecast
//!
//! Multi-month inventory forecasts built from a single-step prediction
//! service.
//!
//! ## Features
//!
//! - UTC calendar-month normalization of irregular date strings
//! - Three-lag feature extraction from short or gappy monthly series
//! - Autoregressive stepping: each prediction becomes history for the next
//! - Cancellable runs that never publish results of superseded inputs
//! - Display windows (6, 12, 18, 24 months or everything)
//! - HTTP predictor and history clients, plus CSV history files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use month_forecast::mock_predictor::MockPredictor;
//! use month_forecast::{forecast_series, filter_by_range, MonthPoint, Series, TimeRange};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let base = Series::new(vec![
//!     MonthPoint::actual("2025-01-01", 100),
//!     MonthPoint::actual("2025-02-01", 120),
//! ]);
//!
//! // Forecast three months past February
//! let forecast = forecast_series(&base, 3, MockPredictor::persistence()).await?;
//! assert_eq!(forecast.len(), 5);
//!
//! // Trim for display
//! let visible = filter_by_range(&forecast, TimeRange::SixMonths)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod data;
pub mod dates;
pub mod error;
pub mod history;
pub mod hooks;
pub mod lags;
pub mod logging;
pub mod mock_predictor;
pub mod predictor;
pub mod stepper;
pub mod window;

// Re-export commonly used types
pub use crate::client::{ApiClient, ForecastTarget, HttpPredictor};
pub use crate::config::{ClientConfig, DashboardDefaults};
pub use crate::data::{MonthPoint, MonthlyQuantity, Series, Upsert};
pub use crate::error::{ForecastError, Result};
pub use crate::hooks::{InventoryForecast, SkuForecast};
pub use crate::lags::{compute_lags, LagFeatures};
pub use crate::predictor::{ForecastRequest, ForecastResponse, Predictor};
pub use crate::stepper::{
    forecast_series, ForecastHandle, ForecastState, PartialForecast, RunOutcome, Stepper,
};
pub use crate::window::{filter_by_range, filter_by_token, TimeRange};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
