use super::string_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

string_id!(
	/// Identifier of a [`Job`], assigned once at submission.
	JobId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
	Processing,
	Completed,
	Error,
}

impl JobStatus {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Processing => "processing",
			Self::Completed => "completed",
			Self::Error => "error",
		}
	}

	#[must_use]
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Completed | Self::Error)
	}
}

impl fmt::Display for JobStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown status '{0}', expected one of: processing, completed, error")]
pub struct ParseStatusError(pub String);

impl FromStr for JobStatus {
	type Err = ParseStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"processing" => Ok(Self::Processing),
			"completed" => Ok(Self::Completed),
			"error" => Ok(Self::Error),
			_ => Err(ParseStatusError(s.to_string())),
		}
	}
}

/// One request to run a media source through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
	pub id: JobId,
	pub youtube_url: String,
	pub status: JobStatus,
	pub created_at: DateTime<Utc>,
	#[serde(rename = "update_at")]
	pub updated_at: DateTime<Utc>,
}

impl Job {
	#[must_use]
	pub fn new(youtube_url: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: JobId::generate(),
			youtube_url: youtube_url.into(),
			status: JobStatus::Processing,
			created_at: now,
			updated_at: now,
		}
	}

	pub(crate) fn set_status(&mut self, status: JobStatus) {
		self.status = status;
		self.updated_at = Utc::now();
	}
}
