//! Drives one job through extraction, transcription and translation.
//!
//! Stages run strictly in order. Metered stages reserve quota first; a
//! denied reservation, a failing collaborator, a blown time budget or a
//! cancellation ends the job in `error` with nothing refunded.

mod error;
mod task;

pub use error::{PipelineError, Stage};
pub use task::PipelineHandle;

use crate::metrics::pipeline as pipeline_metrics;
use crate::models::{Job, JobStatus, Transcript, Translation};
use crate::stages::{AudioHandle, StageError, StageSet};
use crate::store::JobStore;
use crate::Config;
use chrono::Duration as WindowLength;
use quota_meter::{QuotaMeter, QuotaUnit};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn};

/// The two metered resources a job consumes.
#[derive(Clone, Debug)]
pub struct Quotas {
	pub speech: Arc<QuotaMeter>,
	pub translation: Arc<QuotaMeter>,
}

impl Quotas {
	#[must_use]
	pub fn new(speech_minute_cap: u64, translation_char_cap: u64) -> Self {
		Self {
			speech: Arc::new(QuotaMeter::new("speech", QuotaUnit::Minutes, speech_minute_cap)),
			translation: Arc::new(QuotaMeter::new("translation", QuotaUnit::Characters, translation_char_cap)),
		}
	}

	#[must_use]
	pub fn from_config(config: &Config) -> Self {
		let length = WindowLength::days(config.quota_window_days);
		Self {
			speech: Arc::new(QuotaMeter::with_window("speech", QuotaUnit::Minutes, config.speech_minute_cap, length)),
			translation: Arc::new(QuotaMeter::with_window(
				"translation",
				QuotaUnit::Characters,
				config.translation_char_cap,
				length,
			)),
		}
	}
}

pub struct Pipeline {
	store: JobStore,
	quotas: Quotas,
	stages: StageSet,
	stage_timeout: Option<Duration>,
}

impl Pipeline {
	#[must_use]
	pub const fn new(store: JobStore, quotas: Quotas, stages: StageSet) -> Self {
		Self {
			store,
			quotas,
			stages,
			stage_timeout: None,
		}
	}

	#[must_use]
	pub fn with_stage_timeout(mut self, stage_timeout: Option<Duration>) -> Self {
		self.stage_timeout = stage_timeout;
		self
	}

	#[must_use]
	pub const fn quotas(&self) -> &Quotas {
		&self.quotas
	}

	/// Start a run for `job` on `tracker`. The job must already be in the store.
	pub fn spawn(self: &Arc<Self>, job: Job, cancel: CancellationToken, tracker: &TaskTracker) -> PipelineHandle {
		let pipeline = Arc::clone(self);
		let token = cancel.clone();
		let job_id = job.id.clone();

		let join = tracker.spawn(async move { pipeline.run(&job, &token).await });

		PipelineHandle::new(job_id, cancel, join)
	}

	/// Run every stage and apply the terminal status. Returns the status the
	/// run produced, even if an earlier override kept it from being applied.
	#[instrument(name = "pipeline", skip_all, fields(job_id = %job.id))]
	pub async fn run(&self, job: &Job, cancel: &CancellationToken) -> JobStatus {
		info!(url = %job.youtube_url, "Pipeline started");
		let started = Instant::now();

		let (status, outcome) = match self.execute(job, cancel).await {
			Ok(()) => {
				info!(elapsed_ms = started.elapsed().as_millis(), "Pipeline completed");
				(JobStatus::Completed, "completed")
			}
			Err(e @ (PipelineError::QuotaExceeded { .. } | PipelineError::Cancelled { .. })) => {
				warn!(error = %e, "Pipeline stopped");
				(JobStatus::Error, e.outcome())
			}
			Err(e) => {
				error!(error = %e, "Pipeline failed");
				(JobStatus::Error, e.outcome())
			}
		};

		if !self.store.finish(&job.id, status).await {
			warn!(%status, "Job left processing outside the pipeline, terminal status not applied");
		}
		pipeline_metrics::record_job(outcome);

		status
	}

	async fn execute(&self, job: &Job, cancel: &CancellationToken) -> Result<(), PipelineError> {
		let audio = self
			.guarded(Stage::Extraction, cancel, self.stages.extractor.extract(&job.id, &job.youtube_url))
			.await?;

		let result = self.process(job, &audio, cancel).await;
		discard(&audio).await;

		result
	}

	async fn process(&self, job: &Job, audio: &AudioHandle, cancel: &CancellationToken) -> Result<(), PipelineError> {
		let minutes = self
			.guarded(Stage::DurationEstimate, cancel, self.stages.estimator.estimate(audio))
			.await?
			.max(1);

		self.reserve(&self.quotas.speech, minutes, Stage::Transcription, cancel).await?;
		let output = self.guarded(Stage::Transcription, cancel, self.stages.transcriber.transcribe(audio)).await?;

		let chars = u64::try_from(output.full_text.chars().count()).unwrap_or(u64::MAX);
		self.reserve(&self.quotas.translation, chars, Stage::Translation, cancel).await?;
		let translated = self
			.guarded(Stage::Translation, cancel, self.stages.translator.translate(&output.full_text))
			.await?;

		let transcript = Transcript::new(job.id.clone(), output.language, output.full_text, output.segments);
		let translation = Translation::new(
			transcript.id.clone(),
			transcript.language.clone(),
			self.stages.translator.target_language(),
			translated,
			self.stages.translator.model(),
		);

		self.store.add_transcript(transcript).await;
		self.store.add_translation(translation).await;
		debug!("Artifacts persisted");

		Ok(())
	}

	async fn reserve(&self, meter: &QuotaMeter, amount: u64, stage: Stage, cancel: &CancellationToken) -> Result<(), PipelineError> {
		if cancel.is_cancelled() {
			return Err(PipelineError::Cancelled { stage });
		}

		let granted = meter.try_reserve(amount).await;
		let snapshot = meter.snapshot().await;
		pipeline_metrics::observe_quota(&snapshot);

		if granted {
			return Ok(());
		}

		Err(PipelineError::QuotaExceeded {
			resource: snapshot.name,
			requested: amount,
			used: snapshot.used,
			cap: snapshot.cap,
		})
	}

	/// Await one collaborator call under the stage's time budget, giving up
	/// as soon as `cancel` fires.
	async fn guarded<T, F>(&self, stage: Stage, cancel: &CancellationToken, work: F) -> Result<T, PipelineError>
	where
		F: Future<Output = Result<T, StageError>>,
	{
		debug!(%stage, "Stage started");
		let started = Instant::now();

		let bounded = async {
			let result = match self.stage_timeout {
				Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| PipelineError::TimedOut { stage })?,
				None => work.await,
			};
			result.map_err(|source| PipelineError::Stage { stage, source })
		};

		let result = tokio::select! {
			biased;
			() = cancel.cancelled() => Err(PipelineError::Cancelled { stage }),
			result = bounded => result,
		};

		pipeline_metrics::observe_stage(stage, started.elapsed());
		if result.is_ok() {
			debug!(%stage, elapsed_ms = started.elapsed().as_millis(), "Stage finished");
		}

		result
	}
}

/// Remove extracted audio once a run is done with it, whatever the outcome.
async fn discard(audio: &AudioHandle) {
	match tokio::fs::remove_file(&audio.path).await {
		Ok(()) => debug!(path = %audio.path.display(), "Extracted audio removed"),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => debug!(path = %audio.path.display(), "Extracted audio already gone"),
		Err(e) => warn!(path = %audio.path.display(), error = %e, "Failed to remove extracted audio"),
	}
}
