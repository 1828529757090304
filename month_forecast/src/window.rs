//! Display windows over a finished series

use crate::data::Series;
use crate::dates::{add_months_utc, to_utc_month};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time range selectable on the charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    /// Last 6 months
    #[serde(rename = "6m")]
    SixMonths,
    /// Last 12 months
    #[serde(rename = "12m")]
    TwelveMonths,
    /// Last 18 months
    #[serde(rename = "18m")]
    EighteenMonths,
    /// Last 24 months
    #[serde(rename = "24m")]
    TwentyFourMonths,
    /// Everything
    #[serde(rename = "max")]
    Max,
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::SixMonths
    }
}

impl TimeRange {
    /// All ranges from narrowest to widest
    pub const ALL: [TimeRange; 5] = [
        TimeRange::SixMonths,
        TimeRange::TwelveMonths,
        TimeRange::EighteenMonths,
        TimeRange::TwentyFourMonths,
        TimeRange::Max,
    ];

    /// Window length in months, `None` for [`TimeRange::Max`]
    pub fn months(&self) -> Option<u32> {
        match self {
            TimeRange::SixMonths => Some(6),
            TimeRange::TwelveMonths => Some(12),
            TimeRange::EighteenMonths => Some(18),
            TimeRange::TwentyFourMonths => Some(24),
            TimeRange::Max => None,
        }
    }

    /// Token used by the chart controls
    pub fn token(&self) -> &'static str {
        match self {
            TimeRange::SixMonths => "6m",
            TimeRange::TwelveMonths => "12m",
            TimeRange::EighteenMonths => "18m",
            TimeRange::TwentyFourMonths => "24m",
            TimeRange::Max => "max",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for TimeRange {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        TimeRange::ALL
            .into_iter()
            .find(|range| range.token() == s.trim())
            .ok_or_else(|| ForecastError::InvalidParameter(format!("unknown time range '{s}'")))
    }
}

/// First month inside the window, anchored on the latest month of the data.
///
/// The anchor is the data's own latest month, which may be a forecast month,
/// not the current calendar month. `None` for [`TimeRange::Max`] or an empty
/// series.
pub fn cutoff_month(series: &Series, range: TimeRange) -> Result<Option<DateTime<Utc>>> {
    let Some(months) = range.months() else {
        return Ok(None);
    };
    let Some(latest) = series.latest_month()? else {
        return Ok(None);
    };
    add_months_utc(latest, -(months as i32 - 1)).map(Some)
}

/// Keep the points whose month is on or after the window's cutoff.
///
/// Storage order is preserved. [`TimeRange::Max`] and empty series come back
/// unchanged.
pub fn filter_by_range(series: &Series, range: TimeRange) -> Result<Series> {
    let Some(cutoff) = cutoff_month(series, range)? else {
        return Ok(series.clone());
    };

    let mut kept = Vec::with_capacity(series.len());
    for point in series {
        if to_utc_month(&point.date)? >= cutoff {
            kept.push(point.clone());
        }
    }
    Ok(Series::new(kept))
}

/// [`filter_by_range`] taking the raw control token
pub fn filter_by_token(series: &Series, token: &str) -> Result<Series> {
    filter_by_range(series, token.parse()?)
}
