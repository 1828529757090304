//! In-process predictor for demos and tests
//!
//! Either replays a script of responses or, once the script runs out, falls
//! back to a persistence forecast (next month = `lag_1`). Every request is
//! recorded so callers can assert on the lags that were sent.

use crate::dates::{add_months_utc, month_iso, to_utc_month};
use crate::error::{ForecastError, Result};
use crate::predictor::{ForecastRequest, ForecastResponse, Predictor};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with this month and quantity
    Respond {
        /// Month label returned to the caller
        forecast_month: String,
        /// Quantity returned to the caller
        predicted_quantity: f64,
    },
    /// Fail like a non-success HTTP response
    Fail {
        /// Status code
        status: u16,
        /// Response text
        body: String,
    },
}

impl MockReply {
    /// Successful reply
    pub fn respond(forecast_month: &str, predicted_quantity: f64) -> Self {
        MockReply::Respond {
            forecast_month: forecast_month.to_string(),
            predicted_quantity,
        }
    }

    /// Failing reply
    pub fn fail(status: u16, body: &str) -> Self {
        MockReply::Fail {
            status,
            body: body.to_string(),
        }
    }
}

/// Scripted predictor that records its calls
#[derive(Debug, Default)]
pub struct MockPredictor {
    model: String,
    script: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<ForecastRequest>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockPredictor {
    /// Persistence forecast for every request
    pub fn persistence() -> Self {
        Self {
            model: "mock_persistence".to_string(),
            ..Self::default()
        }
    }

    /// Replay `replies` in order, then fall back to persistence
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            model: "mock_scripted".to_string(),
            script: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn calls(&self) -> Vec<ForecastRequest> {
        self.calls.lock().clone()
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Highest number of calls that were running at the same time
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn reply_for(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(MockReply::Respond {
                forecast_month,
                predicted_quantity,
            }) => Ok(ForecastResponse {
                model: self.model.clone(),
                forecast_month,
                predicted_quantity,
                sku: None,
            }),
            Some(MockReply::Fail { status, body }) => Err(ForecastError::Upstream { status, body }),
            None => {
                let next = add_months_utc(to_utc_month(&request.last_month)?, 1)?;
                Ok(ForecastResponse {
                    model: self.model.clone(),
                    forecast_month: month_iso(next),
                    predicted_quantity: request.lag_1.unwrap_or(0.0),
                    sku: None,
                })
            }
        }
    }
}

#[async_trait]
impl Predictor for MockPredictor {
    async fn predict(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        self.calls.lock().push(request.clone());
        let guard = InFlight::enter(&self.in_flight);
        self.max_in_flight.fetch_max(guard.running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.reply_for(request)
    }
}

/// Counts one running call; released on drop, including when the caller
/// abandons the future mid-delay
struct InFlight<'a> {
    counter: &'a AtomicUsize,
    running: usize,
}

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        let running = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Self { counter, running }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
