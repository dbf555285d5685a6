use crate::models::{Job, JobId, JobStatus, Transcript, Translation};
use crate::{AppState, VideoHostError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVideoRequest {
	#[garde(length(min = 1, max = 2048))]
	pub youtube_url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
	#[garde(length(min = 1, max = 32))]
	pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
	pub message: &'static str,
}

/// Unwrap a JSON body and run its field validation.
fn validated<T: Validate<Context = ()>>(body: Result<Json<T>, JsonRejection>) -> Result<T, VideoHostError> {
	let Json(request) = body?;
	request.validate()?;
	Ok(request)
}

#[axum::debug_handler]
#[instrument(name = "list_videos", skip(state))]
pub async fn list_videos(State(state): State<AppState>) -> Json<Vec<Job>> {
	Json(state.videos.list().await)
}

#[axum::debug_handler]
#[instrument(name = "create_video", skip_all)]
pub async fn create_video(State(state): State<AppState>, body: Result<Json<CreateVideoRequest>, JsonRejection>) -> Result<(StatusCode, Json<Job>), VideoHostError> {
	let request = validated(body)?;
	let (job, _handle) = state.videos.submit(&request.youtube_url).await?;

	Ok((StatusCode::CREATED, Json(job)))
}

#[axum::debug_handler]
#[instrument(name = "get_video", skip(state))]
pub async fn get_video(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Job>, VideoHostError> {
	let job = state.videos.get(&JobId::from(id)).await?;
	Ok(Json(job))
}

#[axum::debug_handler]
#[instrument(name = "update_status", skip(state, body))]
pub async fn update_status(
	State(state): State<AppState>,
	Path(id): Path<String>,
	body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, VideoHostError> {
	let request = validated(body)?;
	let status = request.status.parse::<JobStatus>().map_err(|e| VideoHostError::Validation(e.to_string()))?;

	state.videos.set_status(&JobId::from(id), status).await;

	Ok(Json(MessageResponse { message: "Status updated" }))
}

#[axum::debug_handler]
#[instrument(name = "get_transcript", skip(state))]
pub async fn get_transcript(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Transcript>, VideoHostError> {
	let transcript = state.videos.transcript(&JobId::from(id)).await?;
	Ok(Json(transcript))
}

#[axum::debug_handler]
#[instrument(name = "get_translation", skip(state))]
pub async fn get_translation(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Translation>, VideoHostError> {
	let translation = state.videos.translation(&JobId::from(id)).await?;
	Ok(Json(translation))
}
