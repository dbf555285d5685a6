use crate::models::{Job, JobId, JobStatus, Transcript, TranscriptId, Translation};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
	#[error("job {0} already exists")]
	DuplicateJob(JobId),
}

#[derive(Default)]
struct Tables {
	jobs: Vec<Job>,
	index: HashMap<JobId, usize>,
	transcripts: Vec<Transcript>,
	translations: Vec<Translation>,
}

impl Tables {
	fn job_mut(&mut self, id: &JobId) -> Option<&mut Job> {
		let slot = *self.index.get(id)?;
		self.jobs.get_mut(slot)
	}
}

/// In-memory table set for jobs and their artifacts.
///
/// One lock covers every table. It is held for a single read or write and
/// never across an await on anything else.
#[derive(Clone, Default)]
pub struct JobStore {
	tables: Arc<Mutex<Tables>>,
}

impl JobStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn create(&self, job: Job) -> Result<(), StoreError> {
		let mut tables = self.tables.lock().await;
		if tables.index.contains_key(&job.id) {
			return Err(StoreError::DuplicateJob(job.id));
		}

		let slot = tables.jobs.len();
		tables.index.insert(job.id.clone(), slot);
		tables.jobs.push(job);
		Ok(())
	}

	pub async fn get(&self, id: &JobId) -> Option<Job> {
		let tables = self.tables.lock().await;
		tables.index.get(id).and_then(|&slot| tables.jobs.get(slot)).cloned()
	}

	/// All jobs in insertion order.
	pub async fn list(&self) -> Vec<Job> {
		self.tables.lock().await.jobs.clone()
	}

	pub async fn len(&self) -> usize {
		self.tables.lock().await.jobs.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	/// Unconditional override. Unknown ids are ignored; the return value only
	/// reports whether a job was touched.
	pub async fn set_status(&self, id: &JobId, status: JobStatus) -> bool {
		let mut tables = self.tables.lock().await;
		match tables.job_mut(id) {
			Some(job) => {
				job.set_status(status);
				true
			}
			None => false,
		}
	}

	/// Move a job from `processing` into `status`. Returns false, changing
	/// nothing, if the job is unknown or has already left `processing`.
	pub async fn finish(&self, id: &JobId, status: JobStatus) -> bool {
		let mut tables = self.tables.lock().await;
		match tables.job_mut(id) {
			Some(job) if job.status == JobStatus::Processing => {
				job.set_status(status);
				true
			}
			Some(job) => {
				debug!(job_id = %id, current = %job.status, requested = %status, "Job already left processing");
				false
			}
			None => false,
		}
	}

	pub async fn add_transcript(&self, transcript: Transcript) {
		self.tables.lock().await.transcripts.push(transcript);
	}

	pub async fn add_translation(&self, translation: Translation) {
		self.tables.lock().await.translations.push(translation);
	}

	pub async fn transcript_by_job(&self, job_id: &JobId) -> Option<Transcript> {
		let tables = self.tables.lock().await;
		tables.transcripts.iter().find(|t| &t.job_id == job_id).cloned()
	}

	pub async fn translation_by_transcript(&self, transcript_id: &TranscriptId) -> Option<Translation> {
		let tables = self.tables.lock().await;
		tables.translations.iter().find(|t| &t.transcript_id == transcript_id).cloned()
	}

	/// Resolve a job's translation through its transcript under one lock.
	pub async fn translation_by_job(&self, job_id: &JobId) -> Option<Translation> {
		let tables = self.tables.lock().await;
		let transcript = tables.transcripts.iter().find(|t| &t.job_id == job_id)?;
		tables.translations.iter().find(|t| t.transcript_id == transcript.id).cloned()
	}
}
