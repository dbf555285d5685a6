use crate::error::VideoHostError;
use crate::models::{Job, JobId, JobStatus, Transcript, Translation};
use crate::pipeline::{Pipeline, PipelineHandle, Quotas};
use crate::store::JobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, instrument, warn};

/// Entry point the HTTP layer talks to. Owns the store and the pipeline and
/// tracks every run it starts.
pub struct VideoService {
	store: JobStore,
	pipeline: Arc<Pipeline>,
	shutdown: CancellationToken,
	tasks: TaskTracker,
}

impl VideoService {
	#[must_use]
	pub fn new(store: JobStore, pipeline: Pipeline, shutdown: CancellationToken) -> Self {
		Self {
			store,
			pipeline: Arc::new(pipeline),
			shutdown,
			tasks: TaskTracker::new(),
		}
	}

	/// Create a job in `processing` and start its pipeline. Returns as soon as
	/// the job is stored.
	#[instrument(skip(self))]
	pub async fn submit(&self, youtube_url: &str) -> Result<(Job, PipelineHandle), VideoHostError> {
		let youtube_url = youtube_url.trim();
		if youtube_url.is_empty() {
			return Err(VideoHostError::Validation("youtube_url must not be empty".to_string()));
		}

		let job = Job::new(youtube_url);
		self.store.create(job.clone()).await?;
		info!(job_id = %job.id, "Job submitted");

		let handle = self.pipeline.spawn(job.clone(), self.shutdown.child_token(), &self.tasks);
		Ok((job, handle))
	}

	pub async fn get(&self, id: &JobId) -> Result<Job, VideoHostError> {
		self.store.get(id).await.ok_or(VideoHostError::VideoNotFound)
	}

	pub async fn list(&self) -> Vec<Job> {
		self.store.list().await
	}

	/// Administrative override. Unknown ids are ignored.
	#[instrument(skip(self))]
	pub async fn set_status(&self, id: &JobId, status: JobStatus) {
		if !self.store.set_status(id, status).await {
			info!("Status override for unknown job ignored");
		}
	}

	pub async fn transcript(&self, id: &JobId) -> Result<Transcript, VideoHostError> {
		self.store.transcript_by_job(id).await.ok_or(VideoHostError::TranscriptNotFound)
	}

	pub async fn translation(&self, id: &JobId) -> Result<Translation, VideoHostError> {
		self.store.translation_by_job(id).await.ok_or(VideoHostError::TranslationNotFound)
	}

	#[must_use]
	pub fn quotas(&self) -> &Quotas {
		self.pipeline.quotas()
	}

	#[must_use]
	pub const fn store(&self) -> &JobStore {
		&self.store
	}

	#[must_use]
	pub fn in_flight(&self) -> usize {
		self.tasks.len()
	}

	/// Cancel every run and wait up to `grace` for them to settle. Returns
	/// false if some runs were still going when the wait ran out.
	pub async fn shutdown(&self, grace: Duration) -> bool {
		self.tasks.close();
		self.shutdown.cancel();

		let remaining = self.tasks.len();
		if remaining > 0 {
			info!(remaining, "Draining pipeline runs");
		}

		if tokio::time::timeout(grace, self.tasks.wait()).await.is_ok() {
			true
		} else {
			warn!(remaining = self.tasks.len(), "Pipeline runs still active after grace period");
			false
		}
	}
}
