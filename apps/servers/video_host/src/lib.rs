use axum::extract::FromRef;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod service;
pub mod stages;
pub mod store;

pub use config::*;
pub use error::VideoHostError;
pub use health::perform_health_check;
pub use pipeline::{Pipeline, PipelineError, PipelineHandle, Quotas, Stage};
pub use service::VideoService;
pub use stages::StageSet;
pub use store::{JobStore, StoreError};

/// Core: settings and the process-wide shutdown signal
#[derive(Clone)]
pub struct CoreContext {
	pub config: Arc<Config>,
	pub cancel_token: CancellationToken,
}

#[derive(Clone)]
pub struct AppState {
	pub core: CoreContext,
	pub videos: Arc<VideoService>,
}

impl AppState {
	/// Build the service graph with the production collaborators
	pub fn build(config: Arc<Config>, cancel_token: CancellationToken) -> anyhow::Result<Self> {
		config.validate().map_err(anyhow::Error::msg)?;
		std::fs::create_dir_all(&config.work_dir)?;

		let stages = StageSet::from_config(&config);
		Ok(Self::with_stages(config, cancel_token, stages))
	}

	/// Build the service graph around the given collaborators
	#[must_use]
	pub fn with_stages(config: Arc<Config>, cancel_token: CancellationToken, stages: StageSet) -> Self {
		let store = JobStore::new();
		let pipeline = Pipeline::new(store.clone(), Quotas::from_config(&config), stages).with_stage_timeout(config.stage_timeout());
		let videos = Arc::new(VideoService::new(store, pipeline, cancel_token.child_token()));

		Self {
			core: CoreContext { config, cancel_token },
			videos,
		}
	}
}

impl FromRef<AppState> for Arc<Config> {
	fn from_ref(state: &AppState) -> Self {
		state.core.config.clone()
	}
}

impl FromRef<AppState> for Arc<VideoService> {
	fn from_ref(state: &AppState) -> Self {
		state.videos.clone()
	}
}

impl FromRef<AppState> for CancellationToken {
	fn from_ref(state: &AppState) -> Self {
		state.core.cancel_token.clone()
	}
}

/// Every route the server exposes, with request metrics applied.
pub fn app(state: AppState) -> Router {
	let cors_origin = state.core.config.cors_origin.clone();

	Router::new()
		.merge(routes::videos::videos(&cors_origin))
		.merge(routes::health::get_health())
		.route("/metrics", get(metrics::http::metrics_handler))
		.route_layer(axum::middleware::from_fn(metrics::http::metrics_middleware))
		.with_state(state)
}
