use crate::pipeline::Stage;
use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec, IntCounterVec, IntGaugeVec};
use quota_meter::QuotaSnapshot;
use std::time::Duration;

lazy_static! {
	static ref PIPELINE_JOBS_TOTAL: IntCounterVec =
		register_int_counter_vec!("pipeline_jobs_total", "Pipeline runs by terminal outcome", &["outcome"]).expect("Failed to register PIPELINE_JOBS_TOTAL");
	static ref PIPELINE_STAGE_DURATION: HistogramVec = register_histogram_vec!(
		"pipeline_stage_duration_seconds",
		"Time spent in each pipeline stage",
		&["stage"],
		vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]
	)
	.expect("Failed to register PIPELINE_STAGE_DURATION");
	static ref QUOTA_USED: IntGaugeVec =
		register_int_gauge_vec!("quota_used", "Units consumed in the current quota window", &["resource"]).expect("Failed to register QUOTA_USED");
}

pub fn record_job(outcome: &str) {
	PIPELINE_JOBS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn observe_stage(stage: Stage, elapsed: Duration) {
	PIPELINE_STAGE_DURATION.with_label_values(&[stage.as_str()]).observe(elapsed.as_secs_f64());
}

pub fn observe_quota(snapshot: &QuotaSnapshot) {
	let used = i64::try_from(snapshot.used).unwrap_or(i64::MAX);
	QUOTA_USED.with_label_values(&[&snapshot.name]).set(used);
}
