//! Forecast orchestration for the dashboard charts
//!
//! Thin owners of a [`ForecastHandle`] that remember the current inputs and
//! restart the forecast only when one of them actually changes.

use crate::client::{ApiClient, ForecastTarget};
use crate::data::Series;
use crate::error::Result;
use crate::history::{load_history, HistorySource};
use crate::predictor::Predictor;
use crate::stepper::{ForecastHandle, ForecastState};
use crate::window::{filter_by_range, TimeRange};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct Inputs {
    handle: ForecastHandle,
    base: Series,
    horizon: usize,
    started: bool,
}

impl Inputs {
    fn new(predictor: Arc<dyn Predictor>, horizon: usize) -> Self {
        Self {
            handle: ForecastHandle::new(predictor),
            base: Series::default(),
            horizon,
            started: false,
        }
    }

    fn apply(&mut self, base: Series, horizon: usize) -> u64 {
        if self.started && self.base == base && self.horizon == horizon {
            return self.handle.generation();
        }
        self.base = base;
        self.horizon = horizon;
        self.started = true;
        self.handle.update(self.base.clone(), self.horizon)
    }
}

/// Aggregate forecast over the whole inventory
#[derive(Debug)]
pub struct InventoryForecast {
    inputs: Inputs,
}

impl InventoryForecast {
    /// Create with an explicit predictor and initial horizon
    pub fn new(predictor: Arc<dyn Predictor>, horizon: usize) -> Self {
        Self {
            inputs: Inputs::new(predictor, horizon),
        }
    }

    /// Create against the inventory forecast route
    pub fn from_client(api: &ApiClient, horizon: usize) -> Self {
        Self::new(Arc::new(api.predictor(ForecastTarget::Inventory)), horizon)
    }

    /// Replace the base series, restarting when it differs
    pub fn set_base(&mut self, base: Series) -> u64 {
        let horizon = self.inputs.horizon;
        self.inputs.apply(base, horizon)
    }

    /// Change the horizon, restarting when it differs
    pub fn set_horizon(&mut self, horizon: usize) -> u64 {
        let base = self.inputs.base.clone();
        self.inputs.apply(base, horizon)
    }

    /// Current horizon
    pub fn horizon(&self) -> usize {
        self.inputs.horizon
    }

    /// Snapshot of the forecast state
    pub fn state(&self) -> ForecastState {
        self.inputs.handle.state()
    }

    /// Wait for the current run to finish
    pub async fn settled(&self) -> ForecastState {
        self.inputs.handle.settled().await
    }

    /// Current data trimmed to a display window
    pub fn windowed(&self, range: TimeRange) -> Result<Series> {
        filter_by_range(&self.state().data, range)
    }

    /// Underlying handle
    pub fn handle(&self) -> &ForecastHandle {
        &self.inputs.handle
    }
}

/// Forecast for a single SKU
///
/// Without a SKU id or without history the effective horizon is 0, so no
/// request is made and the (empty) history is shown as is.
#[derive(Debug)]
pub struct SkuForecast {
    sku_id: String,
    history: Series,
    horizon: usize,
    inputs: Inputs,
}

impl SkuForecast {
    /// Create with an explicit predictor and initial horizon
    pub fn new(sku_id: impl Into<String>, predictor: Arc<dyn Predictor>, horizon: usize) -> Self {
        Self {
            sku_id: sku_id.into(),
            history: Series::default(),
            horizon,
            inputs: Inputs::new(predictor, 0),
        }
    }

    /// Create against the per-SKU forecast route
    pub fn from_client(api: &ApiClient, sku_id: impl Into<String>, horizon: usize) -> Self {
        let sku_id = sku_id.into();
        let predictor = Arc::new(api.predictor(ForecastTarget::Sku(sku_id.clone())));
        Self::new(sku_id, predictor, horizon)
    }

    /// SKU this forecast is for
    pub fn sku_id(&self) -> &str {
        &self.sku_id
    }

    /// Whether a forecast can run at all
    pub fn has_history(&self) -> bool {
        !self.sku_id.is_empty() && !self.history.is_empty()
    }

    /// Horizon actually sent to the stepper
    pub fn effective_horizon(&self) -> usize {
        if self.has_history() {
            self.horizon
        } else {
            0
        }
    }

    /// Replace the history, restarting when it differs
    pub fn set_history(&mut self, history: Series) -> u64 {
        self.history = history;
        self.sync()
    }

    /// Fetch the item's history and restart the forecast from it
    pub async fn load_history<S>(&mut self, source: &S, item_id: u64) -> Result<u64>
    where
        S: HistorySource + ?Sized,
    {
        let history = load_history(source, item_id).await?;
        debug!(sku = %self.sku_id, item_id, months = history.len(), "history loaded");
        Ok(self.set_history(history))
    }

    /// Change the requested horizon, restarting when the effective one differs
    pub fn set_horizon(&mut self, horizon: usize) -> u64 {
        self.horizon = horizon;
        self.sync()
    }

    /// Requested horizon
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Snapshot of the forecast state
    pub fn state(&self) -> ForecastState {
        self.inputs.handle.state()
    }

    /// Wait for the current run to finish
    pub async fn settled(&self) -> ForecastState {
        self.inputs.handle.settled().await
    }

    /// Current data trimmed to a display window; empty without history
    pub fn windowed(&self, range: TimeRange) -> Result<Series> {
        if !self.has_history() {
            return Ok(Series::default());
        }
        filter_by_range(&self.state().data, range)
    }

    /// Underlying handle
    pub fn handle(&self) -> &ForecastHandle {
        &self.inputs.handle
    }

    fn sync(&mut self) -> u64 {
        let horizon = self.effective_horizon();
        self.inputs.apply(self.history.clone(), horizon)
    }
}
