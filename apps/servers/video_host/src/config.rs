use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about = "Video transcription and translation job server", long_about = None)]
pub struct Config {
	/// Use JSON formatting for tracing
	#[arg(long, env = "LOG_JSON", default_value = "false")]
	pub log_json: bool,

	/// Log filter directive
	#[arg(long, env = "RUST_LOG", default_value = "info")]
	pub rust_log: String,

	/// Server host
	#[arg(long, env = "HOST", default_value = "0.0.0.0")]
	pub host: String,

	/// Server port
	#[arg(long, env = "PORT", default_value = "8080")]
	pub port: u16,

	/// Probe the running server's /health endpoint and exit
	#[arg(long, env = "HEALTH_CHECK", default_value = "false")]
	pub health_check: bool,

	/// Browser origin allowed by CORS
	#[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:5173")]
	pub cors_origin: String,

	/// Max request body size in MiB
	#[arg(long, env = "MAX_REQUEST_SIZE", default_value = "1")]
	pub max_request_size: usize,

	/// Max concurrent HTTP requests
	#[arg(long, env = "MAX_CONCURRENT_REQ", default_value = "256")]
	pub max_concurrent_req: usize,

	/// HTTP request timeout in milliseconds
	#[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
	pub request_timeout_ms: u64,

	/// Monthly speech-to-text allowance in minutes
	#[arg(long, env = "SPEECH_MINUTE_CAP", default_value = "60")]
	pub speech_minute_cap: u64,

	/// Monthly translation allowance in characters
	#[arg(long, env = "TRANSLATION_CHAR_CAP", default_value = "400000")]
	pub translation_char_cap: u64,

	/// Length of a quota accounting window in days
	#[arg(long, env = "QUOTA_WINDOW_DAYS", default_value = "30")]
	pub quota_window_days: i64,

	/// Optional time budget for each pipeline stage in seconds
	#[arg(long, env = "STAGE_TIMEOUT_SECS")]
	pub stage_timeout_secs: Option<u64>,

	/// Directory extracted audio is written to
	#[arg(long, env = "WORK_DIR", default_value = ".")]
	pub work_dir: PathBuf,

	/// Audio extractor executable
	#[arg(long, env = "YT_DLP_BIN", default_value = "yt-dlp")]
	pub yt_dlp_bin: String,

	/// Extracted audio format
	#[arg(long, env = "AUDIO_FORMAT", default_value = "mp3")]
	pub audio_format: String,

	/// Gemini API key for translation
	#[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
	pub gemini_api_key: Option<String>,

	/// Gemini model used for translation
	#[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash-latest")]
	pub gemini_model: String,

	/// Translation target language
	#[arg(long, env = "TARGET_LANGUAGE", default_value = "ja")]
	pub target_language: String,

	/// Google service account credentials JSON
	#[arg(long, env = "GOOGLE_CREDENTIALS_JSON", hide_env_values = true)]
	pub google_credentials_json: Option<String>,

	/// Cloud Storage bucket used to stage audio for recognition
	#[arg(long, env = "GCS_BUCKET_NAME")]
	pub gcs_bucket_name: Option<String>,

	/// Speech recognition language code
	#[arg(long, env = "SPEECH_LANGUAGE_CODE", default_value = "en-US")]
	pub speech_language_code: String,

	/// Sample rate of extracted audio
	#[arg(long, env = "SPEECH_SAMPLE_RATE", default_value = "44100")]
	pub speech_sample_rate: u32,

	/// Largest audio file accepted for transcription in MiB
	#[arg(long, env = "MAX_AUDIO_MB", default_value = "100")]
	pub max_audio_mb: u64,

	/// Poll interval for long-running recognition in milliseconds
	#[arg(long, env = "SPEECH_POLL_INTERVAL_MS", default_value = "2000")]
	pub speech_poll_interval_ms: u64,
}

impl Config {
	/// Validate configuration values
	pub fn validate(&self) -> Result<(), String> {
		if self.speech_minute_cap == 0 {
			return Err("speech_minute_cap must be greater than 0".to_string());
		}

		if self.translation_char_cap == 0 {
			return Err("translation_char_cap must be greater than 0".to_string());
		}

		if self.quota_window_days < 1 {
			return Err("quota_window_days must be at least 1".to_string());
		}

		if self.speech_poll_interval_ms == 0 {
			return Err("speech_poll_interval_ms must be greater than 0".to_string());
		}

		if self.stage_timeout_secs == Some(0) {
			return Err("stage_timeout_secs must be greater than 0 when set".to_string());
		}

		Ok(())
	}

	#[must_use]
	pub fn stage_timeout(&self) -> Option<Duration> {
		self.stage_timeout_secs.map(Duration::from_secs)
	}

	#[must_use]
	pub const fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}
