//! Monthly series handling for forecasting

use crate::dates::{month_iso, to_utc_month};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One calendar month of data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPoint {
    /// First day of the month in UTC, formatted `YYYY-MM-DD`
    pub date: String,
    /// Observed quantity for the month
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    /// Model estimate for the month
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<f64>,
}

impl MonthPoint {
    /// A month with an observed quantity
    pub fn actual(date: impl Into<String>, quantity: u64) -> Self {
        Self {
            date: date.into(),
            quantity: Some(quantity),
            prediction: None,
        }
    }

    /// A month that only carries a prediction
    pub fn predicted(date: impl Into<String>, prediction: f64) -> Self {
        Self {
            date: date.into(),
            quantity: None,
            prediction: Some(prediction),
        }
    }

    /// Value used as model history: the prediction when present, else the quantity
    pub fn known_value(&self) -> Option<f64> {
        self.prediction.or(self.quantity.map(|q| q as f64))
    }
}

/// Monthly quantity record as delivered by the history source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyQuantity {
    /// Any date inside the month, usually `YYYY-MM-DD`
    pub date: String,
    /// Units for the month
    pub quantity: u64,
}

/// Outcome of [`Series::upsert_prediction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// An existing month had its prediction overwritten
    Updated,
    /// A new month was appended
    Appended,
}

/// Sequence of monthly points
///
/// Storage order is whatever the caller supplied; consumers that depend on
/// chronology sort by parsed month first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series {
    points: Vec<MonthPoint>,
}

impl Series {
    /// Wrap points as given
    pub fn new(points: Vec<MonthPoint>) -> Self {
        Self { points }
    }

    /// Build a chronologically sorted series from raw history records.
    ///
    /// Dates are collapsed to the UTC first of their month. Records that land
    /// in the same month are merged by summing their quantities.
    pub fn from_monthly_quantities(records: &[MonthlyQuantity]) -> Result<Self> {
        let mut by_month: BTreeMap<DateTime<Utc>, u64> = BTreeMap::new();
        for record in records {
            let month = to_utc_month(&record.date)?;
            let total = by_month.entry(month).or_insert(0);
            *total = total.checked_add(record.quantity).ok_or_else(|| {
                ForecastError::DataError(format!("quantity overflow for {}", month_iso(month)))
            })?;
        }

        Ok(by_month
            .into_iter()
            .map(|(month, quantity)| MonthPoint::actual(month_iso(month), quantity))
            .collect())
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series holds no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in storage order
    pub fn points(&self) -> &[MonthPoint] {
        &self.points
    }

    /// Iterate over points in storage order
    pub fn iter(&self) -> std::slice::Iter<'_, MonthPoint> {
        self.points.iter()
    }

    /// Consume the series into its points
    pub fn into_points(self) -> Vec<MonthPoint> {
        self.points
    }

    /// Point whose label equals `date`
    pub fn get(&self, date: &str) -> Option<&MonthPoint> {
        self.points.iter().find(|p| p.date == date)
    }

    /// Copy of the series sorted by month, ties kept in storage order
    pub fn sorted(&self) -> Result<Self> {
        let mut keyed = self
            .points
            .iter()
            .map(|p| -> Result<(DateTime<Utc>, MonthPoint)> {
                Ok((to_utc_month(&p.date)?, p.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by_key(|(month, _)| *month);
        Ok(keyed.into_iter().map(|(_, p)| p).collect())
    }

    /// Copy with every label collapsed to the `YYYY-MM-01` of its UTC month.
    ///
    /// Points that land in an already seen month are merged into the first
    /// one: quantities are summed and the first prediction wins. Storage
    /// order of first occurrence is kept. Points with an empty date are
    /// passed through untouched.
    pub fn normalized(&self) -> Result<Self> {
        let mut points: Vec<MonthPoint> = Vec::with_capacity(self.points.len());
        let mut slots: HashMap<String, usize> = HashMap::new();

        for point in &self.points {
            if point.date.is_empty() {
                points.push(point.clone());
                continue;
            }

            let label = month_iso(to_utc_month(&point.date)?);
            match slots.get(&label).copied() {
                Some(slot) => {
                    let merged = &mut points[slot];
                    merged.quantity = match (merged.quantity, point.quantity) {
                        (Some(a), Some(b)) => Some(a.checked_add(b).ok_or_else(|| {
                            ForecastError::DataError(format!("quantity overflow for {label}"))
                        })?),
                        (a, b) => a.or(b),
                    };
                    merged.prediction = merged.prediction.or(point.prediction);
                }
                None => {
                    slots.insert(label.clone(), points.len());
                    points.push(MonthPoint {
                        date: label,
                        ..point.clone()
                    });
                }
            }
        }

        Ok(Self { points })
    }

    /// Latest month present in the series, if any
    pub fn latest_month(&self) -> Result<Option<DateTime<Utc>>> {
        let mut latest = None;
        for point in &self.points {
            let month = to_utc_month(&point.date)?;
            if latest.map_or(true, |l| month > l) {
                latest = Some(month);
            }
        }
        Ok(latest)
    }

    /// Set the prediction for `date`, appending a new month if it is absent.
    ///
    /// Matching is exact label equality, so `date` must already be a
    /// normalized month label. Only the first matching point is touched.
    pub fn upsert_prediction(&mut self, date: &str, prediction: f64) -> Upsert {
        match self.points.iter_mut().find(|p| p.date == date) {
            Some(point) => {
                point.prediction = Some(prediction);
                Upsert::Updated
            }
            None => {
                self.points.push(MonthPoint::predicted(date, prediction));
                Upsert::Appended
            }
        }
    }
}

impl From<Vec<MonthPoint>> for Series {
    fn from(points: Vec<MonthPoint>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<MonthPoint> for Series {
    fn from_iter<I: IntoIterator<Item = MonthPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Series {
    type Item = MonthPoint;
    type IntoIter = std::vec::IntoIter<MonthPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a MonthPoint;
    type IntoIter = std::slice::Iter<'a, MonthPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
