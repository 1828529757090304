//! # Stockcast
//!
//! Workspace facade for the inventory dashboard's forecasting core.
//!
//! ## Example
//!
//! ```
//! use stockcast_workspace::month_forecast::{filter_by_token, MonthPoint, Series};
//!
//! let series = Series::new(vec![
//!     MonthPoint::actual("2025-01-01", 4),
//!     MonthPoint::actual("2025-09-01", 9),
//! ]);
//! let visible = filter_by_token(&series, "6m").unwrap();
//! assert_eq!(visible.len(), 1);
//! ```

pub use month_forecast;

pub use month_forecast::{
    filter_by_range, forecast_series, ForecastError, ForecastHandle, ForecastState,
    InventoryForecast, MonthPoint, Series, SkuForecast, TimeRange,
};
