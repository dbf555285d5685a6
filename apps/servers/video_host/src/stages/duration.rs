use super::{AudioHandle, DurationEstimator, StageError};
use async_trait::async_trait;

const MIB: u64 = 1024 * 1024;

/// Rough duration proxy: a fixed number of bytes per minute of audio.
/// Anything non-empty bills at least one minute.
pub struct FileSizeEstimator {
	bytes_per_minute: u64,
}

impl FileSizeEstimator {
	#[must_use]
	pub fn new(bytes_per_minute: u64) -> Self {
		Self {
			bytes_per_minute: bytes_per_minute.max(1),
		}
	}

	#[must_use]
	pub const fn minutes_for(&self, size: u64) -> u64 {
		let minutes = size / self.bytes_per_minute;
		if minutes == 0 {
			1
		} else {
			minutes
		}
	}
}

impl Default for FileSizeEstimator {
	fn default() -> Self {
		Self::new(MIB)
	}
}

#[async_trait]
impl DurationEstimator for FileSizeEstimator {
	async fn estimate(&self, audio: &AudioHandle) -> Result<u64, StageError> {
		let metadata = tokio::fs::metadata(&audio.path).await?;
		Ok(self.minutes_for(metadata.len()))
	}
}
