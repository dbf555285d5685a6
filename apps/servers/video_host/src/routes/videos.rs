use crate::handlers::videos as routes;
use crate::AppState;
use axum::routing::{get, put};
use axum::{
	extract::FromRef,
	http::{header::CONTENT_TYPE, HeaderValue, Method},
	Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

pub fn videos<S>(cors_origin: &str) -> Router<S>
where
	S: Clone + Send + Sync + 'static,
	AppState: FromRef<S>,
{
	Router::new()
		.route("/videos", get(routes::list_videos).post(routes::create_video))
		.route("/videos/:id", get(routes::get_video))
		.route("/videos/:id/status", put(routes::update_status))
		.route("/videos/:id/transcript", get(routes::get_transcript))
		.route("/videos/:id/translation", get(routes::get_translation))
		.layer(cors(cors_origin))
}

fn cors(origin: &str) -> CorsLayer {
	let layer = CorsLayer::new()
		.allow_methods([Method::GET, Method::POST, Method::PUT])
		.allow_headers([CONTENT_TYPE]);

	match origin.parse::<HeaderValue>() {
		Ok(origin) => layer.allow_origin(origin),
		Err(e) => {
			warn!(origin, error = %e, "Ignoring invalid CORS origin");
			layer
		}
	}
}
