use super::{AudioHandle, Extractor, StageError};
use crate::models::JobId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Extracts audio with `yt-dlp -x`, one file per job in `work_dir`.
pub struct YtDlpExtractor {
	program: String,
	work_dir: PathBuf,
	audio_format: String,
}

impl YtDlpExtractor {
	pub fn new(program: impl Into<String>, work_dir: impl AsRef<Path>, audio_format: impl Into<String>) -> Self {
		Self {
			program: program.into(),
			work_dir: work_dir.as_ref().to_path_buf(),
			audio_format: audio_format.into(),
		}
	}

	fn output_path(&self, job_id: &JobId) -> PathBuf {
		self.work_dir.join(format!("{job_id}.{}", self.audio_format))
	}
}

#[async_trait]
impl Extractor for YtDlpExtractor {
	#[instrument(skip(self), fields(program = %self.program))]
	async fn extract(&self, job_id: &JobId, source_url: &str) -> Result<AudioHandle, StageError> {
		let path = self.output_path(job_id);

		let output = Command::new(&self.program)
			.arg("-x")
			.arg("--audio-format")
			.arg(&self.audio_format)
			.arg("-o")
			.arg(&path)
			.arg("--")
			.arg(source_url)
			.kill_on_drop(true)
			.output()
			.await?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			return Err(StageError::Command {
				program: self.program.clone(),
				status: output.status.to_string(),
				stderr: last_lines(&stderr, 5),
			});
		}

		debug!(path = %path.display(), "Audio extracted");
		Ok(AudioHandle::new(path))
	}
}

fn last_lines(text: &str, count: usize) -> String {
	let lines: Vec<&str> = text.trim().lines().collect();
	lines[lines.len().saturating_sub(count)..].join("\n")
}
