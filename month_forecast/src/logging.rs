//! Tracing initialization

use crate::error::{ForecastError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install a formatted stdout subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Calling this more than once
/// is a no-op.
pub fn init_tracing(default_level: &str) -> Result<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let filter = match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level)) {
        Ok(filter) => filter,
        Err(e) => {
            TRACING_INITIALIZED.store(false, Ordering::SeqCst);
            return Err(ForecastError::InvalidParameter(format!("log level: {e}")));
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| ForecastError::InvalidParameter(format!("tracing: {e}")))
}
