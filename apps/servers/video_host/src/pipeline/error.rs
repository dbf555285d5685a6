use crate::stages::StageError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
	Extraction,
	DurationEstimate,
	Transcription,
	Translation,
}

impl Stage {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Extraction => "extraction",
			Self::DurationEstimate => "duration_estimate",
			Self::Transcription => "transcription",
			Self::Translation => "translation",
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Why a pipeline run ended in `error`. Only ever logged and counted; the
/// submitting request has already returned.
#[derive(Debug, Error)]
pub enum PipelineError {
	#[error("{stage} failed: {source}")]
	Stage {
		stage: Stage,
		#[source]
		source: StageError,
	},

	#[error("{resource} quota exceeded: requested {requested}, used {used} of {cap}")]
	QuotaExceeded { resource: String, requested: u64, used: u64, cap: u64 },

	#[error("{stage} exceeded its time budget")]
	TimedOut { stage: Stage },

	#[error("cancelled during {stage}")]
	Cancelled { stage: Stage },
}

impl PipelineError {
	#[must_use]
	pub const fn outcome(&self) -> &'static str {
		match self {
			Self::Stage { .. } => "stage_failed",
			Self::QuotaExceeded { .. } => "quota_exceeded",
			Self::TimedOut { .. } => "timed_out",
			Self::Cancelled { .. } => "cancelled",
		}
	}
}
