use crate::models::{JobId, JobStatus};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

/// Handle to one spawned pipeline run.
///
/// Dropping the handle detaches the run; it keeps going to a terminal state.
#[derive(Debug)]
pub struct PipelineHandle {
	job_id: JobId,
	cancel: CancellationToken,
	join: JoinHandle<JobStatus>,
}

impl PipelineHandle {
	pub(crate) const fn new(job_id: JobId, cancel: CancellationToken, join: JoinHandle<JobStatus>) -> Self {
		Self { job_id, cancel, join }
	}

	#[must_use]
	pub const fn job_id(&self) -> &JobId {
		&self.job_id
	}

	/// Ask the run to stop. The job ends in `error` at the next stage boundary
	/// or immediately if a stage is in flight.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	#[must_use]
	pub fn cancellation_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	#[must_use]
	pub fn is_finished(&self) -> bool {
		self.join.is_finished()
	}

	/// Wait for the run and return the terminal status it produced.
	pub async fn wait(self) -> Result<JobStatus, JoinError> {
		self.join.await
	}
}
