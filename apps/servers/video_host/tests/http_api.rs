mod common;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use clap::Parser;
use common::{MockExtractor, Mocks, FIFTY_CHARS};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use video_host::{app, AppState, Config};

fn state(mocks: &Mocks) -> AppState {
	let config = Config::parse_from(["video_host"]);
	AppState::with_stages(Arc::new(config), CancellationToken::new(), mocks.stages())
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
	let mut request = Request::builder().method(method).uri(uri);
	if body.is_some() {
		request = request.header(CONTENT_TYPE, "application/json");
	}
	let request = request.body(body.map_or_else(Body::empty, |b| Body::from(b.to_string()))).unwrap();

	let response = router.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };

	(status, value)
}

async fn wait_for_status(router: &Router, id: &str, expected: &str) -> Value {
	for _ in 0..200 {
		let (status, body) = send(router, Method::GET, &format!("/videos/{id}"), None).await;
		assert_eq!(status, StatusCode::OK);
		if body["status"] == expected {
			return body;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	panic!("job {id} never reached {expected}");
}

#[tokio::test]
async fn test_submit_then_poll_until_completed() {
	let mocks = Mocks::succeeding(2, FIFTY_CHARS);
	let state = state(&mocks);
	let router = app(state.clone());

	let (status, job) = send(&router, Method::POST, "/videos", Some(r#"{"youtube_url":"https://y/abc"}"#)).await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(job["status"], "processing");
	assert_eq!(job["youtube_url"], "https://y/abc");
	assert!(job["update_at"].is_string());

	let id = job["id"].as_str().unwrap().to_string();
	wait_for_status(&router, &id, "completed").await;

	let (status, transcript) = send(&router, Method::GET, &format!("/videos/{id}/transcript"), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(transcript["transcript_srt"], FIFTY_CHARS);
	assert_eq!(transcript["segments"].as_array().unwrap().len(), 2);
	assert_eq!(transcript["video_id"], id.as_str());

	let (status, translation) = send(&router, Method::GET, &format!("/videos/{id}/translation"), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(translation["target_lang"], "ja");
	assert_eq!(translation["translated_srt"], format!("[ja] {FIFTY_CHARS}"));
	assert_eq!(translation["transcript_id"], transcript["id"]);

	let quotas = state.videos.quotas();
	assert_eq!(quotas.speech.used().await, 2);
	assert_eq!(quotas.translation.used().await, 50);
}

#[tokio::test]
async fn test_missing_url_is_rejected_and_nothing_is_created() {
	let mocks = Mocks::succeeding(2, FIFTY_CHARS);
	let state = state(&mocks);
	let router = app(state.clone());

	let (status, body) = send(&router, Method::POST, "/videos", Some("{}")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["error"].is_string());

	let (status, body) = send(&router, Method::POST, "/videos", Some(r#"{"youtube_url":""}"#)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["error"].is_string());

	let (status, _) = send(&router, Method::POST, "/videos", Some("{not json")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, list) = send(&router, Method::GET, "/videos", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(list, json!([]));
	assert!(state.videos.store().is_empty().await);
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
	let router = app(state(&Mocks::succeeding(2, FIFTY_CHARS)));

	let (status, body) = send(&router, Method::GET, "/videos/does-not-exist", None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body, json!({ "error": "Video not found" }));

	let (status, body) = send(&router, Method::GET, "/videos/does-not-exist/transcript", None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body, json!({ "error": "Transcript not found" }));

	let (status, body) = send(&router, Method::GET, "/videos/does-not-exist/translation", None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body, json!({ "error": "Translation not found" }));
}

#[tokio::test]
async fn test_status_update_on_unknown_id_is_a_no_op() {
	let router = app(state(&Mocks::succeeding(2, FIFTY_CHARS)));

	let (status, body) = send(&router, Method::PUT, "/videos/ghost/status", Some(r#"{"status":"completed"}"#)).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!({ "message": "Status updated" }));

	let (status, body) = send(&router, Method::GET, "/videos/ghost", None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body, json!({ "error": "Video not found" }));
}

#[tokio::test]
async fn test_status_update_validates_body() {
	let router = app(state(&Mocks::succeeding(2, FIFTY_CHARS)));

	let (status, _) = send(&router, Method::PUT, "/videos/any/status", Some("{}")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, body) = send(&router, Method::PUT, "/videos/any/status", Some(r#"{"status":"paused"}"#)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["error"].as_str().unwrap().contains("paused"));
}

#[tokio::test]
async fn test_status_override_applies_to_existing_job() {
	let mut mocks = Mocks::succeeding(2, FIFTY_CHARS);
	mocks.extractor = Arc::new(MockExtractor {
		fail: true,
		..Default::default()
	});
	let router = app(state(&mocks));

	let (_, job) = send(&router, Method::POST, "/videos", Some(r#"{"youtube_url":"https://y/gone"}"#)).await;
	let id = job["id"].as_str().unwrap().to_string();
	wait_for_status(&router, &id, "error").await;

	let (status, _) = send(&router, Method::PUT, &format!("/videos/{id}/status"), Some(r#"{"status":"processing"}"#)).await;
	assert_eq!(status, StatusCode::OK);

	let (_, job) = send(&router, Method::GET, &format!("/videos/{id}"), None).await;
	assert_eq!(job["status"], "processing");
}

#[tokio::test]
async fn test_list_returns_jobs_in_submission_order() {
	let router = app(state(&Mocks::succeeding(1, "hi")));

	for url in ["https://y/1", "https://y/2", "https://y/3"] {
		let (status, _) = send(&router, Method::POST, "/videos", Some(&json!({ "youtube_url": url }).to_string())).await;
		assert_eq!(status, StatusCode::CREATED);
	}

	let (status, list) = send(&router, Method::GET, "/videos", None).await;
	assert_eq!(status, StatusCode::OK);
	let urls: Vec<&str> = list.as_array().unwrap().iter().map(|job| job["youtube_url"].as_str().unwrap()).collect();
	assert_eq!(urls, ["https://y/1", "https://y/2", "https://y/3"]);
}

#[tokio::test]
async fn test_health_and_metrics_endpoints() {
	let router = app(state(&Mocks::succeeding(1, "hi")));

	let (status, body) = send(&router, Method::GET, "/health", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "healthy");

	send(&router, Method::GET, "/videos/abc", None).await;

	let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
	let response = router.clone().oneshot(request).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let text = String::from_utf8(response.into_body().collect().await.unwrap().to_bytes().to_vec()).unwrap();
	assert!(text.contains("http_requests_total"));
	assert!(text.contains("/videos/:id"));
}
