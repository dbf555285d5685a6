mod job;
mod transcript;
mod translation;

pub use job::{Job, JobId, JobStatus, ParseStatusError};
pub use transcript::{Segment, Transcript, TranscriptId};
pub use translation::{Translation, TranslationId};

/// Declares an opaque string identifier backed by a v4 UUID.
macro_rules! string_id {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			#[must_use]
			pub fn generate() -> Self {
				Self(uuid::Uuid::new_v4().to_string())
			}

			#[must_use]
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl From<String> for $name {
			fn from(value: String) -> Self {
				Self(value)
			}
		}

		impl From<&str> for $name {
			fn from(value: &str) -> Self {
				Self(value.to_string())
			}
		}

		impl std::fmt::Display for $name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				f.write_str(&self.0)
			}
		}
	};
}

pub(crate) use string_id;
