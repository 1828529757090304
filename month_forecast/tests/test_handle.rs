use month_forecast::data::{MonthPoint, Series};
use month_forecast::mock_predictor::{MockPredictor, MockReply};
use month_forecast::stepper::ForecastHandle;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const CALL_DELAY: Duration = Duration::from_millis(100);

fn series(points: &[(&str, u64)]) -> Series {
    points
        .iter()
        .map(|(date, quantity)| MonthPoint::actual(*date, *quantity))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_completed_run_publishes_forecast() {
    let predictor = Arc::new(MockPredictor::persistence().with_delay(CALL_DELAY));
    let handle = ForecastHandle::new(predictor.clone());
    let base = series(&[("2025-01-01", 10), ("2025-02-01", 12)]);

    handle.update(base.clone(), 2);
    let running = handle.state();
    assert!(running.loading);
    assert_eq!(running.data, base);
    assert_eq!(running.error, None);

    let done = handle.settled().await;
    assert!(!done.loading);
    assert_eq!(done.error, None);
    assert_eq!(done.data.len(), 4);
    assert_eq!(done.data.get("2025-04-01").unwrap().prediction, Some(12.0));
    assert_eq!(predictor.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_end_of_month_base_gets_one_point_per_month() {
    let predictor = Arc::new(MockPredictor::scripted(vec![
        MockReply::respond("2025-02-28", 30.0),
        MockReply::respond("2025-03-31", 31.0),
    ]));
    let handle = ForecastHandle::new(predictor.clone());
    let base = series(&[("2025-01-31", 10), ("2025-02-28", 20)]);

    handle.update(base.clone(), 2);
    assert_eq!(handle.state().data, base);

    let done = handle.settled().await;
    assert_eq!(done.error, None);
    assert_eq!(
        done.data.points(),
        &[
            MonthPoint::actual("2025-01-01", 10),
            MonthPoint {
                date: "2025-02-01".to_string(),
                quantity: Some(20),
                prediction: Some(30.0),
            },
            MonthPoint::predicted("2025-03-01", 31.0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_horizon_settles_immediately() {
    let predictor = Arc::new(MockPredictor::persistence());
    let handle = ForecastHandle::new(predictor.clone());
    let base = series(&[("2025-01-01", 10)]);

    handle.update(base.clone(), 0);

    let state = handle.state();
    assert!(!state.loading);
    assert_eq!(state.data, base);
    assert_eq!(handle.settled().await.data, base);
    assert_eq!(predictor.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failure_publishes_partial_data_and_message() {
    let predictor = Arc::new(MockPredictor::scripted(vec![
        MockReply::respond("2025-02-28", 20.0),
        MockReply::fail(503, "service unavailable"),
    ]));
    let handle = ForecastHandle::new(predictor);

    handle.update(series(&[("2025-01-01", 10)]), 4);
    let state = handle.settled().await;

    assert_eq!(state.error.as_deref(), Some("service unavailable"));
    assert_eq!(state.data.len(), 2);
    assert_eq!(state.data.get("2025-02-01").unwrap().prediction, Some(20.0));
}

#[tokio::test(start_paused = true)]
async fn test_empty_base_reports_insufficient_history() {
    let predictor = Arc::new(MockPredictor::persistence());
    let handle = ForecastHandle::new(predictor.clone());

    handle.update(Series::default(), 1);
    let state = handle.settled().await;

    assert_eq!(
        state.error.as_deref(),
        Some("Insufficient history to compute lags")
    );
    assert!(state.data.is_empty());
    assert_eq!(predictor.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_newer_inputs_win_over_in_flight_run() {
    let predictor = Arc::new(MockPredictor::persistence().with_delay(CALL_DELAY));
    let handle = ForecastHandle::new(predictor.clone());

    let old_base = series(&[("2024-01-01", 500)]);
    let new_base = series(&[("2025-06-01", 7)]);

    let first = handle.update(old_base, 5);
    // let the first run get a request in flight
    tokio::time::sleep(CALL_DELAY / 2).await;
    let second = handle.update(new_base.clone(), 1);
    assert!(second > first);

    let state = handle.settled().await;
    // give the superseded run every chance to publish
    tokio::time::sleep(CALL_DELAY * 10).await;
    let later = handle.state();

    let expected: Series = new_base
        .iter()
        .cloned()
        .chain(std::iter::once(MonthPoint::predicted("2025-07-01", 7.0)))
        .collect();
    assert_eq!(state.data, expected);
    assert_eq!(later, state);
    assert!(later.data.iter().all(|p| !p.date.starts_with("2024")));
    // the old run stopped after its in-flight request
    assert_eq!(predictor.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_failure_is_not_observable() {
    let predictor = Arc::new(
        MockPredictor::scripted(vec![
            MockReply::fail(500, "stale failure"),
            MockReply::respond("2025-03-31", 42.0),
        ])
        .with_delay(CALL_DELAY),
    );
    let handle = ForecastHandle::new(predictor);

    handle.update(series(&[("2025-01-01", 1)]), 3);
    tokio::time::sleep(CALL_DELAY / 2).await;
    handle.update(series(&[("2025-02-01", 2)]), 1);

    let state = handle.settled().await;
    tokio::time::sleep(CALL_DELAY * 10).await;

    assert_eq!(state.error, None);
    assert_eq!(handle.state().error, None);
    assert_eq!(
        handle.state().data.get("2025-03-01").unwrap().prediction,
        Some(42.0)
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_loading_and_further_calls() {
    let predictor = Arc::new(MockPredictor::persistence().with_delay(CALL_DELAY));
    let handle = ForecastHandle::new(predictor.clone());
    let base = series(&[("2025-01-01", 3)]);

    handle.update(base.clone(), 4);
    tokio::time::sleep(CALL_DELAY / 2).await;
    handle.cancel();

    assert!(!handle.state().loading);
    tokio::time::sleep(CALL_DELAY * 10).await;

    assert_eq!(handle.state().data, base);
    assert_eq!(predictor.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_the_reset_before_the_result() {
    let predictor = Arc::new(MockPredictor::persistence().with_delay(CALL_DELAY));
    let handle = ForecastHandle::new(predictor);
    let mut rx = handle.subscribe();
    let base = series(&[("2025-01-01", 3)]);

    handle.update(base.clone(), 1);
    rx.changed().await.unwrap();
    {
        let seen = rx.borrow_and_update();
        assert!(seen.loading);
        assert_eq!(seen.data, base);
    }

    rx.changed().await.unwrap();
    let seen = rx.borrow_and_update().clone();
    assert!(!seen.loading);
    assert_eq!(seen.data.len(), 2);
}
