//! Contracts for the external collaborators a job is driven through, plus
//! the implementations the server wires up in production.
//!
//! The pipeline only ever sees the traits. Every call here may be slow
//! (a subprocess or a network round trip); callers must not hold any shared
//! lock while awaiting one.

mod duration;
mod extractor;
mod speech;
mod translator;

pub use duration::FileSizeEstimator;
pub use extractor::YtDlpExtractor;
pub use speech::{GoogleSpeechTranscriber, SpeechConfig};
pub use translator::GeminiTranslator;

use crate::models::{JobId, Segment};
use crate::Config;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Local audio produced by extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioHandle {
	pub path: PathBuf,
}

impl AudioHandle {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	#[must_use]
	pub fn file_name(&self) -> String {
		self.path.file_name().map_or_else(|| "audio".to_string(), |name| name.to_string_lossy().into_owned())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOutput {
	pub language: String,
	pub full_text: String,
	pub segments: Vec<Segment>,
}

#[derive(Debug, Error)]
pub enum StageError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("{program} exited with {status}: {stderr}")]
	Command { program: String, status: String, stderr: String },

	#[error("HTTP error: {0}")]
	Http(reqwest::Error),

	#[error("API returned {status}: {body}")]
	Api { status: u16, body: String },

	#[error("missing configuration: {0}")]
	MissingConfig(&'static str),

	#[error("invalid response: {0}")]
	InvalidResponse(String),

	#[error("authentication failed: {0}")]
	Auth(String),

	#[error("audio file too large ({size_mb}MB > {limit_mb}MB limit)")]
	TooLarge { size_mb: u64, limit_mb: u64 },
}

/// Request URLs can carry credentials, so they never travel with the error.
impl From<reqwest::Error> for StageError {
	fn from(error: reqwest::Error) -> Self {
		Self::Http(error.without_url())
	}
}

#[async_trait]
pub trait Extractor: Send + Sync {
	/// Fetch the audio track of `source_url` to local storage.
	async fn extract(&self, job_id: &JobId, source_url: &str) -> Result<AudioHandle, StageError>;
}

#[async_trait]
pub trait DurationEstimator: Send + Sync {
	/// Billable whole minutes of `audio`.
	async fn estimate(&self, audio: &AudioHandle) -> Result<u64, StageError>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
	async fn transcribe(&self, audio: &AudioHandle) -> Result<TranscriptionOutput, StageError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
	async fn translate(&self, text: &str) -> Result<String, StageError>;

	/// Model identifier recorded on persisted translations.
	fn model(&self) -> &str;

	fn target_language(&self) -> &str;
}

/// The full set of collaborators one pipeline drives.
#[derive(Clone)]
pub struct StageSet {
	pub extractor: Arc<dyn Extractor>,
	pub estimator: Arc<dyn DurationEstimator>,
	pub transcriber: Arc<dyn Transcriber>,
	pub translator: Arc<dyn Translator>,
}

impl StageSet {
	/// Production collaborators. Missing credentials are not checked here;
	/// the affected stage fails when a job reaches it.
	#[must_use]
	pub fn from_config(config: &Config) -> Self {
		let client = reqwest::Client::new();

		Self {
			extractor: Arc::new(YtDlpExtractor::new(&config.yt_dlp_bin, &config.work_dir, &config.audio_format)),
			estimator: Arc::new(FileSizeEstimator::default()),
			transcriber: Arc::new(GoogleSpeechTranscriber::new(client.clone(), SpeechConfig::from(config))),
			translator: Arc::new(GeminiTranslator::new(
				client,
				config.gemini_api_key.clone(),
				&config.gemini_model,
				&config.target_language,
			)),
		}
	}
}
