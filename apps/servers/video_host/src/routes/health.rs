use crate::handlers::health::health;
use axum::{routing::get, Router};

pub fn get_health<S>() -> Router<S>
where
	S: Clone + Send + Sync + 'static,
{
	Router::new().route("/health", get(health))
}
