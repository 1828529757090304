//! HTTP access to the dashboard API

use crate::config::ClientConfig;
use crate::data::MonthlyQuantity;
use crate::error::{ForecastError, Result};
use crate::history::HistorySource;
use crate::predictor::{ForecastRequest, ForecastResponse, Predictor};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt::Display;
use tracing::{debug, warn};

/// Which forecast model family a request goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastTarget {
    /// Whole-inventory model
    Inventory,
    /// Model for a single SKU
    Sku(String),
}

/// Shared HTTP client for forecast and history routes
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a client with the configured timeout
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL of the forecast route for `target`
    ///
    /// A SKU is pushed as a single path segment, so `/`, spaces and other
    /// reserved characters in it are percent-encoded.
    pub fn forecast_url(&self, target: &ForecastTarget) -> Result<Url> {
        let base = self.config.url("/forecast/");
        let mut url = Url::parse(&base)
            .map_err(|e| ForecastError::InvalidParameter(format!("invalid API URL '{base}': {e}")))?;

        if let ForecastTarget::Sku(sku) = target {
            url.path_segments_mut()
                .map_err(|_| ForecastError::InvalidParameter(format!("'{base}' cannot take a path")))?
                .pop_if_empty()
                .push(sku);
        }
        Ok(url)
    }

    /// URL of the monthly quantity history for an item
    pub fn history_url(&self, item_id: u64) -> String {
        self.config
            .url(&format!("/order_item/monthly/quantity/{item_id}"))
    }

    /// POST one forecast request
    pub async fn post_forecast(
        &self,
        target: &ForecastTarget,
        request: &ForecastRequest,
    ) -> Result<ForecastResponse> {
        let url = self.forecast_url(target)?;
        debug!(%url, last_month = %request.last_month, "posting forecast request");
        let response = self.client.post(url).json(request).send().await?;
        read_json(response).await
    }

    /// GET the monthly quantities recorded for an item
    pub async fn get_monthly_quantities(&self, item_id: u64) -> Result<Vec<MonthlyQuantity>> {
        let url = self.history_url(item_id);
        debug!(%url, "fetching monthly quantities");
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }

    /// Predictor bound to one forecast target
    pub fn predictor(&self, target: ForecastTarget) -> HttpPredictor {
        HttpPredictor {
            api: self.clone(),
            target,
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = upstream_body(status, response.text().await);
        return Err(ForecastError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Error text for a non-success response; the body as sent, or why it could not be read
fn upstream_body<E: Display>(status: StatusCode, body: std::result::Result<String, E>) -> String {
    match body {
        Ok(body) => body,
        Err(e) => {
            warn!(%status, error = %e, "failed to read error response body");
            format!("HTTP {status}: failed to read response body: {e}")
        }
    }
}

/// [`Predictor`] backed by the forecast HTTP routes
#[derive(Debug, Clone)]
pub struct HttpPredictor {
    api: ApiClient,
    target: ForecastTarget,
}

impl HttpPredictor {
    /// Target this predictor posts to
    pub fn target(&self) -> &ForecastTarget {
        &self.target
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn predict(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        self.api.post_forecast(&self.target, request).await
    }
}

#[async_trait]
impl HistorySource for ApiClient {
    async fn monthly_quantities(&self, item_id: u64) -> Result<Vec<MonthlyQuantity>> {
        self.get_monthly_quantities(item_id).await
    }
}
