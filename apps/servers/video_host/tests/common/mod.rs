#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use video_host::models::{JobId, Segment};
use video_host::stages::{AudioHandle, DurationEstimator, Extractor, StageError, StageSet, Transcriber, TranscriptionOutput, Translator};

/// Fifty characters of source text.
pub const FIFTY_CHARS: &str = "The quick brown fox jumps over the lazy dog today.";

#[derive(Default)]
pub struct MockExtractor {
	pub fail: bool,
	pub calls: AtomicUsize,
}

#[async_trait]
impl Extractor for MockExtractor {
	async fn extract(&self, job_id: &JobId, _source_url: &str) -> Result<AudioHandle, StageError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.fail {
			return Err(StageError::Command {
				program: "yt-dlp".to_string(),
				status: "exit status: 1".to_string(),
				stderr: "ERROR: Video unavailable".to_string(),
			});
		}
		Ok(AudioHandle::new(format!("/tmp/{job_id}.mp3")))
	}
}

/// Writes a real audio file per job into `dir`.
pub struct FileExtractor {
	pub dir: PathBuf,
}

impl FileExtractor {
	pub fn path_for(&self, job_id: &JobId) -> PathBuf {
		self.dir.join(format!("{job_id}.mp3"))
	}
}

#[async_trait]
impl Extractor for FileExtractor {
	async fn extract(&self, job_id: &JobId, _source_url: &str) -> Result<AudioHandle, StageError> {
		let path = self.path_for(job_id);
		tokio::fs::write(&path, vec![0_u8; 4096]).await?;
		Ok(AudioHandle::new(path))
	}
}

pub struct MockEstimator {
	pub minutes: u64,
}

#[async_trait]
impl DurationEstimator for MockEstimator {
	async fn estimate(&self, _audio: &AudioHandle) -> Result<u64, StageError> {
		Ok(self.minutes)
	}
}

pub struct MockTranscriber {
	pub text: String,
	pub fail: bool,
	pub delay: Option<Duration>,
	pub calls: AtomicUsize,
}

impl MockTranscriber {
	pub fn new(text: &str) -> Self {
		Self {
			text: text.to_string(),
			fail: false,
			delay: None,
			calls: AtomicUsize::new(0),
		}
	}
}

#[async_trait]
impl Transcriber for MockTranscriber {
	async fn transcribe(&self, _audio: &AudioHandle) -> Result<TranscriptionOutput, StageError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		if self.fail {
			return Err(StageError::Api {
				status: 503,
				body: "speech backend unavailable".to_string(),
			});
		}

		Ok(TranscriptionOutput {
			language: "en".to_string(),
			full_text: self.text.clone(),
			segments: vec![
				Segment {
					start_time: 0.0,
					end_time: 1.5,
					text: "The quick brown fox".to_string(),
				},
				Segment {
					start_time: 1.5,
					end_time: 3.0,
					text: "jumps over the lazy dog today.".to_string(),
				},
			],
		})
	}
}

#[derive(Default)]
pub struct MockTranslator {
	pub fail: bool,
	pub calls: AtomicUsize,
}

#[async_trait]
impl Translator for MockTranslator {
	async fn translate(&self, text: &str) -> Result<String, StageError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.fail {
			return Err(StageError::InvalidResponse("no candidates".to_string()));
		}
		Ok(format!("[ja] {text}"))
	}

	fn model(&self) -> &str {
		"mock-model"
	}

	fn target_language(&self) -> &str {
		"ja"
	}
}

/// Mocks that can be inspected after a run.
pub struct Mocks {
	pub extractor: Arc<MockExtractor>,
	pub estimator: Arc<MockEstimator>,
	pub transcriber: Arc<MockTranscriber>,
	pub translator: Arc<MockTranslator>,
}

impl Mocks {
	/// Every stage succeeds with the given duration and transcript.
	pub fn succeeding(minutes: u64, text: &str) -> Self {
		Self {
			extractor: Arc::new(MockExtractor::default()),
			estimator: Arc::new(MockEstimator { minutes }),
			transcriber: Arc::new(MockTranscriber::new(text)),
			translator: Arc::new(MockTranslator::default()),
		}
	}

	pub fn stages(&self) -> StageSet {
		StageSet {
			extractor: self.extractor.clone(),
			estimator: self.estimator.clone(),
			transcriber: self.transcriber.clone(),
			translator: self.translator.clone(),
		}
	}
}

pub fn calls(counter: &AtomicUsize) -> usize {
	counter.load(Ordering::SeqCst)
}
