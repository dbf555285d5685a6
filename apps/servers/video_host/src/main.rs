use anyhow::Result;
use axum::error_handling::HandleErrorLayer;
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, time::Duration};
use tokio_util::sync::CancellationToken;
use tower::{limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{filter::EnvFilter, fmt::format::JsonFields, util::SubscriberInitExt, Layer};
use video_host::{app, perform_health_check, AppState, Config, VideoHostError};

async fn handle_tower_error(error: BoxError) -> VideoHostError {
	if error.is::<tower::timeout::error::Elapsed>() {
		tracing::warn!("Request timeout: {}", error);
		VideoHostError::RequestTimeout
	} else if error.is::<tower::load_shed::error::Overloaded>() {
		tracing::warn!("Service overloaded: {}", error);
		VideoHostError::ServiceOverloaded
	} else {
		tracing::error!("Unhandled tower error: {}", error);
		VideoHostError::TowerError(error)
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	dotenv::dotenv().ok();
	let config = Config::parse();

	// Handle health check flag
	if config.health_check {
		return perform_health_check(&config).await;
	}

	init_tracing(&config)?;

	let config = Arc::new(config);
	let shutdown_token = CancellationToken::new();

	let app_state = AppState::build(config.clone(), shutdown_token.clone())?;
	let videos = app_state.videos.clone();

	let app = app(app_state).layer(
		ServiceBuilder::new()
			.layer(TraceLayer::new_for_http())
			.layer(HandleErrorLayer::new(|error: BoxError| async move { handle_tower_error(error).await }))
			.layer(RequestBodyLimitLayer::new(config.max_request_size * 1024 * 1024))
			.layer(TimeoutLayer::new(config.request_timeout()))
			.layer(LoadShedLayer::new())
			.layer(ConcurrencyLimitLayer::new(config.max_concurrent_req)),
	);

	let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
	tracing::info!("listening on {}", listener.local_addr()?);

	let signal_shutdown_token = shutdown_token.clone();
	tokio::spawn(async move {
		tokio::signal::ctrl_c().await.ok();
		tracing::info!("Received Ctrl+C, initiating shutdown...");
		signal_shutdown_token.cancel();
	});

	let server_token = shutdown_token.clone();
	axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
		.with_graceful_shutdown(async move {
			server_token.cancelled().await;
		})
		.await?;
	tracing::info!("Server stopped");

	if videos.shutdown(Duration::from_secs(5)).await {
		tracing::info!("Graceful shutdown completed");
	} else {
		tracing::error!("Shutdown timeout - abandoning in-flight jobs");
	}

	tracing::info!("Shutdown complete");
	Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
	use std::str::FromStr;
	use tracing_subscriber::layer::SubscriberExt;

	let filter = EnvFilter::from_str(&config.rust_log)?;

	tracing_subscriber::registry()
		.with(if config.log_json {
			Box::new(
				tracing_subscriber::fmt::layer()
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_filter(filter),
			) as Box<dyn Layer<_> + Send + Sync>
		} else {
			Box::new(
				tracing_subscriber::fmt::layer()
					.event_format(tracing_subscriber::fmt::format().pretty())
					.with_filter(filter),
			)
		})
		.init();
	Ok(())
}
