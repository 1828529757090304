//! Lag features for the single-step predictor

use crate::data::Series;
use crate::dates::to_utc_month;
use crate::error::Result;
use crate::predictor::ForecastRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-lag feature vector taken from the tail of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagFeatures {
    /// Label of the last month with a known value, `None` when there is none
    pub last_month: Option<String>,
    /// Value of the last known month
    pub lag_1: f64,
    /// Value of the month before that
    pub lag_2: f64,
    /// Value two months before the last
    pub lag_3: f64,
}

impl LagFeatures {
    /// Whether no usable month was found
    pub fn is_insufficient(&self) -> bool {
        self.last_month.is_none()
    }

    /// Wire request for these lags, or `None` when `last_month` is unknown
    pub fn to_request(&self) -> Option<ForecastRequest> {
        let last_month = self.last_month.clone()?;
        Some(ForecastRequest {
            last_month,
            lag_1: Some(self.lag_1),
            lag_2: Some(self.lag_2),
            lag_3: Some(self.lag_3),
        })
    }
}

/// Compute lag features from an arbitrary, possibly short or gappy series.
///
/// Each point contributes its prediction if it has one, otherwise its
/// quantity; points with neither or with an empty date are skipped. The
/// remaining points are ordered by month and the last three values become
/// `lag_1..lag_3`. Missing, negative or non-finite lags are 0. An empty
/// result is reported through `last_month: None`, not an error.
///
/// # Errors
///
/// Only a malformed date on a point with a value fails the extraction.
pub fn compute_lags(series: &Series) -> Result<LagFeatures> {
    let mut known: Vec<(DateTime<Utc>, &str, f64)> = Vec::with_capacity(series.len());
    for point in series.iter().filter(|p| !p.date.is_empty()) {
        if let Some(value) = point.known_value() {
            known.push((to_utc_month(&point.date)?, point.date.as_str(), value));
        }
    }
    known.sort_by_key(|(month, _, _)| *month);

    let mut tail = known.iter().rev();
    let last = tail.next();
    let prev1 = tail.next();
    let prev2 = tail.next();

    Ok(LagFeatures {
        last_month: last.map(|(_, date, _)| date.to_string()),
        lag_1: clamp(last.map(|(_, _, v)| *v)),
        lag_2: clamp(prev1.map(|(_, _, v)| *v)),
        lag_3: clamp(prev2.map(|(_, _, v)| *v)),
    })
}

fn clamp(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}
