use month_forecast::data::{MonthPoint, Series};
use month_forecast::mock_predictor::{MockPredictor, MockReply};
use month_forecast::stepper::{forecast_series, RunOutcome, Stepper};
use month_forecast::ForecastError;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn january() -> Series {
    Series::new(vec![MonthPoint::actual("2025-01-01", 100)])
}

#[tokio::test]
async fn test_overlapping_month_is_updated_and_next_step_chains() {
    let predictor = Arc::new(MockPredictor::scripted(vec![
        MockReply::respond("2025-01-31", 105.4),
        MockReply::respond("2025-02-29", 110.6),
    ]));

    let result = forecast_series(&january(), 2, Arc::clone(&predictor))
        .await
        .unwrap();

    assert_eq!(
        result.points(),
        &[
            MonthPoint {
                date: "2025-01-01".to_string(),
                quantity: Some(100),
                prediction: Some(105.0),
            },
            MonthPoint::predicted("2025-02-01", 111.0),
        ]
    );

    let calls = predictor.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].last_month, "2025-01-01");
    assert_eq!(calls[0].lag_1, Some(100.0));
    // the January prediction replaced the actual as history
    assert_eq!(calls[1].lag_1, Some(105.0));
}

#[tokio::test]
async fn test_zero_horizon_makes_no_calls() {
    let predictor = Arc::new(MockPredictor::persistence());
    let base = Series::new(vec![
        MonthPoint::actual("2025-02-01", 3),
        MonthPoint::actual("2025-01-01", 2),
    ]);

    let result = forecast_series(&base, 0, Arc::clone(&predictor)).await.unwrap();

    assert_eq!(result, base);
    assert_eq!(predictor.call_count(), 0);
}

#[tokio::test]
async fn test_zero_horizon_on_empty_base_is_not_an_error() {
    let predictor = MockPredictor::persistence();
    let result = forecast_series(&Series::default(), 0, predictor).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_empty_base_fails_without_calls() {
    let predictor = Arc::new(MockPredictor::persistence());

    let partial = forecast_series(&Series::default(), 1, Arc::clone(&predictor))
        .await
        .unwrap_err();

    assert!(matches!(partial.error, ForecastError::InsufficientHistory));
    assert_eq!(partial.error.to_string(), "Insufficient history to compute lags");
    assert_eq!(partial.completed_steps, 0);
    assert!(partial.data.is_empty());
    assert_eq!(predictor.call_count(), 0);
}

#[tokio::test]
async fn test_exactly_horizon_sequential_calls() {
    let predictor = Arc::new(
        MockPredictor::persistence().with_delay(std::time::Duration::from_millis(5)),
    );
    let base = Series::new(vec![
        MonthPoint::actual("2024-10-01", 7),
        MonthPoint::actual("2024-11-01", 8),
        MonthPoint::actual("2024-12-01", 9),
    ]);

    let result = forecast_series(&base, 6, Arc::clone(&predictor)).await.unwrap();

    assert_eq!(predictor.call_count(), 6);
    assert_eq!(predictor.max_concurrent_calls(), 1);
    assert_eq!(result.len(), 9);

    let months: Vec<String> = predictor.calls().into_iter().map(|c| c.last_month).collect();
    assert_eq!(
        months,
        vec![
            "2024-12-01",
            "2025-01-01",
            "2025-02-01",
            "2025-03-01",
            "2025-04-01",
            "2025-05-01"
        ]
    );
}

#[tokio::test]
async fn test_upstream_failure_keeps_partial_series() {
    let predictor = Arc::new(MockPredictor::scripted(vec![
        MockReply::respond("2025-02-28", 90.0),
        MockReply::fail(500, "model not found"),
        MockReply::respond("2025-04-30", 1.0),
    ]));

    let partial = forecast_series(&january(), 3, Arc::clone(&predictor))
        .await
        .unwrap_err();

    assert_eq!(partial.completed_steps, 1);
    assert_eq!(partial.data.len(), 2);
    assert_eq!(partial.data.get("2025-02-01").unwrap().prediction, Some(90.0));
    assert_eq!(partial.error.to_string(), "model not found");
    // the third reply was never requested
    assert_eq!(predictor.call_count(), 2);
}

#[tokio::test]
async fn test_malformed_forecast_month_fails_the_run() {
    let predictor = MockPredictor::scripted(vec![MockReply::respond("next month", 10.0)]);

    let partial = forecast_series(&january(), 2, predictor).await.unwrap_err();

    assert!(matches!(partial.error, ForecastError::DateError(_)));
    assert_eq!(partial.data, january());
}

#[tokio::test]
async fn test_predictions_are_rounded_to_whole_units() {
    let predictor = MockPredictor::scripted(vec![
        MockReply::respond("2025-02-01", 2.5),
        MockReply::respond("2025-03-01", 0.49),
    ]);

    let result = forecast_series(&january(), 2, predictor).await.unwrap();

    assert_eq!(result.get("2025-02-01").unwrap().prediction, Some(3.0));
    assert_eq!(result.get("2025-03-01").unwrap().prediction, Some(0.0));
}

#[tokio::test]
async fn test_run_while_stops_between_steps() {
    let stepper = Stepper::new(MockPredictor::persistence());
    let checks = AtomicUsize::new(0);

    let outcome = stepper
        .run_while(&january(), 5, || checks.fetch_add(1, Ordering::SeqCst) < 2)
        .await;

    match outcome {
        RunOutcome::Superseded { completed_steps } => assert_eq!(completed_steps, 2),
        other => panic!("Expected Superseded, got {:?}", other),
    }
    assert_eq!(stepper.predictor().call_count(), 2);
}

#[tokio::test]
async fn test_step_reports_upsert_kind() {
    let stepper = Stepper::new(MockPredictor::scripted(vec![
        MockReply::respond("2025-01-31", 1.0),
        MockReply::respond("2025-02-28", 2.0),
    ]));
    let mut working = january();

    assert_eq!(
        stepper.step(&mut working).await.unwrap(),
        month_forecast::Upsert::Updated
    );
    assert_eq!(working.len(), 1);
    assert_eq!(
        stepper.step(&mut working).await.unwrap(),
        month_forecast::Upsert::Appended
    );
    assert_eq!(working.len(), 2);
}

#[tokio::test]
async fn test_mid_month_base_is_collapsed_before_merging() {
    let predictor = Arc::new(MockPredictor::scripted(vec![
        MockReply::respond("2025-01-31", 105.4),
        MockReply::respond("2025-02-28", 110.6),
    ]));
    let base = Series::new(vec![MonthPoint::actual("2025-01-15", 100)]);

    let result = forecast_series(&base, 2, Arc::clone(&predictor))
        .await
        .unwrap();

    assert_eq!(
        result.points(),
        &[
            MonthPoint {
                date: "2025-01-01".to_string(),
                quantity: Some(100),
                prediction: Some(105.0),
            },
            MonthPoint::predicted("2025-02-01", 111.0),
        ]
    );

    let calls = predictor.calls();
    assert_eq!(calls[0].last_month, "2025-01-01");
    assert_eq!(calls[1].last_month, "2025-01-01");
    assert_eq!(calls[1].lag_1, Some(105.0));
    // January is counted once
    assert_eq!(calls[1].lag_2, Some(0.0));
}

#[tokio::test]
async fn test_duplicate_base_months_are_merged() {
    let predictor = Arc::new(MockPredictor::persistence());
    let base = Series::new(vec![
        MonthPoint::actual("2025-01-31T12:00:00Z", 40),
        MonthPoint::actual("2024-12-01", 10),
        MonthPoint::actual("2025-01-02", 60),
    ]);

    let result = forecast_series(&base, 1, Arc::clone(&predictor))
        .await
        .unwrap();

    assert_eq!(
        result.points(),
        &[
            MonthPoint::actual("2025-01-01", 100),
            MonthPoint::actual("2024-12-01", 10),
            MonthPoint::predicted("2025-02-01", 100.0),
        ]
    );
    assert_eq!(predictor.calls()[0].lag_1, Some(100.0));
    assert_eq!(predictor.calls()[0].lag_2, Some(10.0));
}

#[tokio::test]
async fn test_unparseable_base_date_fails_before_any_call() {
    let predictor = Arc::new(MockPredictor::persistence());
    let base = Series::new(vec![MonthPoint::actual("sometime", 5)]);

    let partial = forecast_series(&base, 2, Arc::clone(&predictor))
        .await
        .unwrap_err();

    assert!(matches!(partial.error, ForecastError::DateError(_)));
    assert_eq!(partial.completed_steps, 0);
    assert_eq!(partial.data, base);
    assert_eq!(predictor.call_count(), 0);
}
