use crate::store::StoreError;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum VideoHostError {
	#[error("{0}")]
	Validation(String),

	#[error("Video not found")]
	VideoNotFound,

	#[error("Transcript not found")]
	TranscriptNotFound,

	#[error("Translation not found")]
	TranslationNotFound,

	#[error("{0}")]
	Store(#[from] StoreError),

	#[error("Request timeout")]
	RequestTimeout,

	#[error("Service temporarily overloaded")]
	ServiceOverloaded,

	#[error("Unexpected Tower Service error: {0}")]
	TowerError(#[from] tower::BoxError),

	#[error("I/O error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("an internal server error occurred")]
	Anyhow(#[from] anyhow::Error),
}

impl VideoHostError {
	const fn status_code(&self) -> StatusCode {
		match self {
			Self::Validation(_) => StatusCode::BAD_REQUEST,
			Self::VideoNotFound | Self::TranscriptNotFound | Self::TranslationNotFound => StatusCode::NOT_FOUND,
			Self::Store(_) => StatusCode::CONFLICT,
			Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
			Self::ServiceOverloaded => StatusCode::SERVICE_UNAVAILABLE,
			Self::TowerError(_) | Self::IoError(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<JsonRejection> for VideoHostError {
	fn from(rejection: JsonRejection) -> Self {
		Self::Validation(rejection.body_text())
	}
}

impl From<garde::Report> for VideoHostError {
	fn from(report: garde::Report) -> Self {
		Self::Validation(report.to_string())
	}
}

#[derive(Serialize)]
struct ErrorBody {
	error: String,
}

impl IntoResponse for VideoHostError {
	fn into_response(self) -> Response<Body> {
		let status = self.status_code();
		let error = match self {
			Self::Anyhow(ref e) => {
				tracing::error!("Generic error: {:?}", e);
				"Internal Server Error".to_string()
			}
			Self::TowerError(ref e) => {
				tracing::error!("Tower error: {}", e);
				self.to_string()
			}
			Self::IoError(ref e) => {
				tracing::error!("I/O error: {}", e);
				self.to_string()
			}
			_ => self.to_string(),
		};

		(status, Json(ErrorBody { error })).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::JobId;

	#[test]
	fn test_not_found_messages() {
		assert_eq!(VideoHostError::VideoNotFound.to_string(), "Video not found");
		assert_eq!(VideoHostError::TranscriptNotFound.to_string(), "Transcript not found");
		assert_eq!(VideoHostError::TranslationNotFound.to_string(), "Translation not found");
	}

	#[test]
	fn test_status_codes() {
		assert_eq!(VideoHostError::Validation("bad".into()).status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(VideoHostError::VideoNotFound.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(VideoHostError::Store(StoreError::DuplicateJob(JobId::from("a"))).status_code(), StatusCode::CONFLICT);
		assert_eq!(VideoHostError::RequestTimeout.status_code(), StatusCode::REQUEST_TIMEOUT);
		assert_eq!(VideoHostError::ServiceOverloaded.status_code(), StatusCode::SERVICE_UNAVAILABLE);
	}

	#[test]
	fn test_internal_errors_hide_details() {
		let response = VideoHostError::Anyhow(anyhow::anyhow!("db password wrong")).into_response();
		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
