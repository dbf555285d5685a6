use chrono::{Duration, Utc};
use quota_meter::{QuotaMeter, QuotaUnit, DEFAULT_WINDOW_DAYS};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_reservations_never_exceed_cap() {
	let meter = Arc::new(QuotaMeter::new("speech", QuotaUnit::Minutes, 60));

	let mut handles = Vec::new();
	for i in 0..200_u64 {
		let meter = Arc::clone(&meter);
		let amount = (i % 7) + 1;
		handles.push(tokio::spawn(async move { meter.try_reserve(amount).await.then_some(amount) }));
	}

	let mut granted = 0;
	for handle in handles {
		if let Some(amount) = handle.await.unwrap() {
			granted += amount;
		}
	}

	assert!(granted <= 60, "granted {granted} exceeds cap");
	assert_eq!(meter.used().await, granted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exactly_cap_worth_of_unit_reservations_granted() {
	let meter = Arc::new(QuotaMeter::new("translation", QuotaUnit::Characters, 100));

	let handles: Vec<_> = (0..500)
		.map(|_| {
			let meter = Arc::clone(&meter);
			tokio::spawn(async move { meter.try_reserve(1).await })
		})
		.collect();

	let mut granted = 0;
	for handle in handles {
		if handle.await.unwrap() {
			granted += 1;
		}
	}

	assert_eq!(granted, 100);
	assert_eq!(meter.used().await, 100);
}

#[tokio::test]
async fn test_reset_happens_before_evaluating_reservation() {
	let meter = QuotaMeter::new("speech", QuotaUnit::Minutes, 60);
	assert!(meter.try_reserve(59).await);

	let after_expiry = Utc::now() + Duration::hours(24 * DEFAULT_WINDOW_DAYS) + Duration::minutes(1);
	assert!(meter.try_reserve_at(60, after_expiry).await);
	assert_eq!(meter.used().await, 60);
}

#[tokio::test]
async fn test_custom_window_length() {
	let meter = QuotaMeter::with_window("speech", QuotaUnit::Minutes, 10, Duration::days(1));
	assert!(meter.try_reserve(10).await);

	let tomorrow = Utc::now() + Duration::days(1) + Duration::seconds(5);
	assert!(meter.try_reserve_at(10, tomorrow).await);
}
