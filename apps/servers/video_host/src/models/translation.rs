use super::{string_id, TranscriptId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_id!(TranslationId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
	pub id: TranslationId,
	pub transcript_id: TranscriptId,
	pub source_lang: String,
	pub target_lang: String,
	#[serde(rename = "translated_srt")]
	pub translated_text: String,
	pub model_used: String,
	pub created_at: DateTime<Utc>,
}

impl Translation {
	#[must_use]
	pub fn new(
		transcript_id: TranscriptId,
		source_lang: impl Into<String>,
		target_lang: impl Into<String>,
		translated_text: impl Into<String>,
		model_used: impl Into<String>,
	) -> Self {
		Self {
			id: TranslationId::generate(),
			transcript_id,
			source_lang: source_lang.into(),
			target_lang: target_lang.into(),
			translated_text: translated_text.into(),
			model_used: model_used.into(),
			created_at: Utc::now(),
		}
	}
}
