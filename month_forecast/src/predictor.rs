//! Boundary to the single-step prediction service

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request for one month ahead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Label of the last known month, `YYYY-MM-DD`
    pub last_month: String,
    /// Value of the last known month
    pub lag_1: Option<f64>,
    /// Value one month earlier
    pub lag_2: Option<f64>,
    /// Value two months earlier
    pub lag_3: Option<f64>,
}

/// Prediction for the month following `last_month`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    /// Identifier of the model that answered
    pub model: String,
    /// Month the prediction is for; may be an end-of-month date
    pub forecast_month: String,
    /// Predicted units, possibly fractional
    pub predicted_quantity: f64,
    /// SKU echoed back by the per-SKU endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// Something that can predict the next month's quantity from three lags
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Predict one step ahead
    async fn predict(&self, request: &ForecastRequest) -> Result<ForecastResponse>;
}

#[async_trait]
impl<P: Predictor + ?Sized> Predictor for Arc<P> {
    async fn predict(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        (**self).predict(request).await
    }
}
