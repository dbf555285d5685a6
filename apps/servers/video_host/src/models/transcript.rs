use super::{string_id, JobId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_id!(TranscriptId);

/// A timed span of recognised speech, in seconds from the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
	pub start_time: f64,
	pub end_time: f64,
	pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
	pub id: TranscriptId,
	#[serde(rename = "video_id")]
	pub job_id: JobId,
	pub language: String,
	#[serde(rename = "transcript_srt")]
	pub full_text: String,
	pub segments: Vec<Segment>,
	pub created_at: DateTime<Utc>,
}

impl Transcript {
	/// Segments are ordered by start time and any segment ending before it
	/// starts is clamped to a zero-length span.
	#[must_use]
	pub fn new(job_id: JobId, language: impl Into<String>, full_text: impl Into<String>, mut segments: Vec<Segment>) -> Self {
		for segment in &mut segments {
			if segment.end_time < segment.start_time {
				segment.end_time = segment.start_time;
			}
		}
		segments.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

		Self {
			id: TranscriptId::generate(),
			job_id,
			language: language.into(),
			full_text: full_text.into(),
			segments,
			created_at: Utc::now(),
		}
	}
}
