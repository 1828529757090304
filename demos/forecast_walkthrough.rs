//! Walk through a forecast the way the dashboard drives it.
//!
//! Uses the in-process mock predictor by default. Set `FORECAST_API_DOMAIN`
//! to post to a running forecast service instead.

use month_forecast::logging::init_tracing;
use month_forecast::mock_predictor::MockPredictor;
use month_forecast::{
    ApiClient, ClientConfig, DashboardDefaults, ForecastTarget, InventoryForecast, MonthlyQuantity,
    Predictor, Series, TimeRange,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("info")?;

    let predictor: Arc<dyn Predictor> = if std::env::var("FORECAST_API_DOMAIN").is_ok() {
        let api = ApiClient::new(ClientConfig::from_env()?)?;
        Arc::new(api.predictor(ForecastTarget::Inventory))
    } else {
        Arc::new(MockPredictor::persistence())
    };

    let history = [
        ("2025-04-30", 298),
        ("2025-05-31", 310),
        ("2025-06-30", 367),
        ("2025-07-31", 410),
        ("2025-08-31", 547),
        ("2025-09-30", 99),
    ]
    .into_iter()
    .map(|(date, quantity)| MonthlyQuantity {
        date: date.to_string(),
        quantity,
    })
    .collect::<Vec<_>>();
    let base = Series::from_monthly_quantities(&history)?;

    let defaults = DashboardDefaults::default();
    let mut forecast = InventoryForecast::new(predictor, defaults.horizon);
    forecast.set_base(base);

    // The user drags the horizon slider before the first run finishes
    forecast.set_horizon(defaults.clamp_horizon(4));

    let state = forecast.settled().await;
    if let Some(error) = &state.error {
        println!("Forecast error: {error}");
    }

    for range in [TimeRange::SixMonths, TimeRange::Max] {
        println!("== {range}");
        for point in forecast.windowed(range)?.iter() {
            println!(
                "{}  actual={:>6}  forecast={:>6}",
                point.date,
                point.quantity.map(|q| q.to_string()).unwrap_or_default(),
                point.prediction.map(|p| p.to_string()).unwrap_or_default(),
            );
        }
    }

    Ok(())
}
