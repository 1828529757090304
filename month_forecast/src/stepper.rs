//! Autoregressive multi-month forecasting
//!
//! A single-step predictor only knows how to forecast the month after the
//! last known one. [`Stepper`] chains it: every prediction is merged back
//! into the working series and becomes `lag_1` of the next request, so the
//! steps are strictly sequential.
//!
//! [`ForecastHandle`] wraps the stepper for callers whose inputs change while
//! a run is in flight. Each call to [`ForecastHandle::update`] starts a new
//! run with a higher generation number; a run only publishes while its
//! generation is still the current one, so a superseded run never becomes
//! visible, whether it finishes, fails or hangs.

use crate::data::{Series, Upsert};
use crate::dates::normalize_to_month_iso;
use crate::error::{ForecastError, Result};
use crate::lags::compute_lags;
use crate::predictor::Predictor;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};

/// Message published when a failure has no text of its own
pub const FALLBACK_ERROR: &str = "Forecast failed";

/// A run that stopped early, with everything accumulated before the failure
#[derive(Debug, Error)]
#[error("forecast stopped after {completed_steps} step(s): {error}")]
pub struct PartialForecast {
    /// Base series plus the predictions merged before the failure
    pub data: Series,
    /// Steps that completed
    pub completed_steps: usize,
    /// Why the run stopped
    #[source]
    pub error: ForecastError,
}

/// How a cancellable run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Every step succeeded
    Completed(Series),
    /// A step failed; the remaining steps were not attempted
    Failed(PartialForecast),
    /// A newer run took over between steps
    Superseded {
        /// Steps that completed before the run noticed
        completed_steps: usize,
    },
}

/// Drives repeated single-step predictions
#[derive(Debug, Clone)]
pub struct Stepper<P> {
    predictor: P,
}

impl<P: Predictor> Stepper<P> {
    /// Create a stepper around a predictor
    pub fn new(predictor: P) -> Self {
        Self { predictor }
    }

    /// The wrapped predictor
    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Forecast `horizon` months past the end of `base`.
    ///
    /// A horizon of 0 returns `base` unchanged without calling the predictor.
    /// Otherwise the working copy starts from [`Series::normalized`], so
    /// predictions for a month already in `base` land on that month's point.
    pub async fn run(
        &self,
        base: &Series,
        horizon: usize,
    ) -> std::result::Result<Series, PartialForecast> {
        match self.run_while(base, horizon, || true).await {
            RunOutcome::Completed(data) => Ok(data),
            RunOutcome::Failed(partial) => Err(partial),
            RunOutcome::Superseded { .. } => unreachable!("run is always live"),
        }
    }

    /// Like [`Stepper::run`], checking `is_live` before every step.
    ///
    /// A request already sent is never interrupted; the check happens at
    /// step boundaries only. A base with an unparseable date fails before
    /// the first step, with `base` itself as the partial data.
    pub async fn run_while<F>(&self, base: &Series, horizon: usize, is_live: F) -> RunOutcome
    where
        F: Fn() -> bool + Send + Sync,
    {
        if horizon == 0 {
            return RunOutcome::Completed(base.clone());
        }

        let mut working = match base.normalized() {
            Ok(working) => working,
            Err(error) => {
                return RunOutcome::Failed(PartialForecast {
                    data: base.clone(),
                    completed_steps: 0,
                    error,
                })
            }
        };

        for step in 0..horizon {
            if !is_live() {
                return RunOutcome::Superseded {
                    completed_steps: step,
                };
            }

            if let Err(error) = self.step(&mut working).await {
                return RunOutcome::Failed(PartialForecast {
                    data: working,
                    completed_steps: step,
                    error,
                });
            }
        }

        RunOutcome::Completed(working)
    }

    /// Predict the month after the last known one and merge it into `working`.
    ///
    /// `working` is expected to carry normalized month labels already, as the
    /// run methods guarantee.
    ///
    /// The forecast month is reduced to its `YYYY-MM-01` label and the
    /// quantity rounded to whole units. An existing point for that month
    /// keeps its quantity and gets the prediction; otherwise a point is
    /// appended.
    pub async fn step(&self, working: &mut Series) -> Result<Upsert> {
        let lags = compute_lags(working)?;
        let request = lags.to_request().ok_or(ForecastError::InsufficientHistory)?;
        debug!(
            last_month = %request.last_month,
            lag_1 = lags.lag_1,
            lag_2 = lags.lag_2,
            lag_3 = lags.lag_3,
            "requesting next month"
        );

        let response = self.predictor.predict(&request).await?;
        let month = normalize_to_month_iso(&response.forecast_month)?;
        let value = response.predicted_quantity.round();
        debug!(model = %response.model, %month, value, "merged prediction");

        Ok(working.upsert_prediction(&month, value))
    }
}

/// Run the stepper once over `base`
pub async fn forecast_series<P: Predictor>(
    base: &Series,
    horizon: usize,
    predictor: P,
) -> std::result::Result<Series, PartialForecast> {
    Stepper::new(predictor).run(base, horizon).await
}

/// Externally visible forecast state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastState {
    /// Latest published series
    pub data: Series,
    /// Whether a run is in flight
    pub loading: bool,
    /// Failure message of the latest run; `data` may then be incomplete
    pub error: Option<String>,
}

struct Shared {
    generation: Mutex<u64>,
    tx: watch::Sender<ForecastState>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        *self.generation.lock() == generation
    }

    /// Publish `state` if `generation` is still current
    fn publish(&self, generation: u64, state: ForecastState) -> bool {
        let current = self.generation.lock();
        if *current != generation {
            return false;
        }
        self.tx.send_replace(state);
        true
    }
}

/// Cancellable forecast for one entity
///
/// Dropping the handle supersedes any run still in flight.
pub struct ForecastHandle {
    predictor: Arc<dyn Predictor>,
    shared: Arc<Shared>,
    rx: watch::Receiver<ForecastState>,
}

impl ForecastHandle {
    /// Create an idle handle with an empty series
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        let (tx, rx) = watch::channel(ForecastState::default());
        Self {
            predictor,
            shared: Arc::new(Shared {
                generation: Mutex::new(0),
                tx,
            }),
            rx,
        }
    }

    /// Restart the forecast for new inputs and return the run's generation.
    ///
    /// State resets to `data = base`, no error. With `horizon == 0` the state
    /// settles immediately; otherwise a task is spawned, so this must be
    /// called from within a Tokio runtime.
    pub fn update(&self, base: Series, horizon: usize) -> u64 {
        let generation = {
            let mut current = self.shared.generation.lock();
            *current += 1;
            self.shared.tx.send_replace(ForecastState {
                data: base.clone(),
                loading: horizon > 0,
                error: None,
            });
            *current
        };

        if horizon == 0 {
            debug!(generation, "horizon 0, nothing to forecast");
            return generation;
        }

        let shared = Arc::clone(&self.shared);
        let stepper = Stepper::new(Arc::clone(&self.predictor));
        let span = info_span!("forecast_run", generation, horizon);

        tokio::spawn(
            async move {
                let outcome = stepper
                    .run_while(&base, horizon, || shared.is_current(generation))
                    .await;

                let state = match outcome {
                    RunOutcome::Completed(data) => {
                        info!(points = data.len(), "forecast completed");
                        ForecastState {
                            data,
                            loading: false,
                            error: None,
                        }
                    }
                    RunOutcome::Failed(partial) => {
                        warn!(
                            completed_steps = partial.completed_steps,
                            error = %partial.error,
                            "forecast failed"
                        );
                        ForecastState {
                            data: partial.data,
                            loading: false,
                            error: Some(error_message(&partial.error)),
                        }
                    }
                    RunOutcome::Superseded { completed_steps } => {
                        debug!(completed_steps, "run superseded between steps");
                        return;
                    }
                };

                if !shared.publish(generation, state) {
                    debug!("discarding result of stale run");
                }
            }
            .instrument(span),
        );

        generation
    }

    /// Supersede the run in flight and stop reporting it as loading.
    ///
    /// The published series and error are left as they are.
    pub fn cancel(&self) {
        let mut current = self.shared.generation.lock();
        *current += 1;
        self.shared.tx.send_if_modified(|state| {
            let was_loading = state.loading;
            state.loading = false;
            was_loading
        });
    }

    /// Generation of the most recent run
    pub fn generation(&self) -> u64 {
        *self.shared.generation.lock()
    }

    /// Snapshot of the published state
    pub fn state(&self) -> ForecastState {
        self.rx.borrow().clone()
    }

    /// Receiver that observes every publish
    pub fn subscribe(&self) -> watch::Receiver<ForecastState> {
        self.rx.clone()
    }

    /// Wait until no run is loading and return that state
    pub async fn settled(&self) -> ForecastState {
        let mut rx = self.rx.clone();
        let settled = rx.wait_for(|state| !state.loading).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.state())
    }
}

impl Drop for ForecastHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ForecastHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastHandle")
            .field("generation", &self.generation())
            .field("state", &*self.rx.borrow())
            .finish()
    }
}

fn error_message(error: &ForecastError) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        FALLBACK_ERROR.to_string()
    } else {
        message
    }
}
