use super::{AudioHandle, StageError, TranscriptionOutput, Transcriber};
use crate::models::Segment;
use crate::Config;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::io::ReaderStream;
use yup_oauth2::authenticator::DefaultAuthenticator;
use tracing::{debug, info, instrument, warn};

const MIB: u64 = 1024 * 1024;
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const STORAGE_API: &str = "https://storage.googleapis.com/storage/v1/";
const STORAGE_UPLOAD_API: &str = "https://storage.googleapis.com/upload/storage/v1/";
const SPEECH_API: &str = "https://speech.googleapis.com/v1/";

#[derive(Debug, Clone)]
pub struct SpeechConfig {
	pub credentials_json: Option<String>,
	pub bucket: Option<String>,
	pub language_code: String,
	pub sample_rate_hertz: u32,
	pub max_audio_mb: u64,
	pub poll_interval: Duration,
}

impl From<&Config> for SpeechConfig {
	fn from(config: &Config) -> Self {
		Self {
			credentials_json: config.google_credentials_json.clone(),
			bucket: config.gcs_bucket_name.clone(),
			language_code: config.speech_language_code.clone(),
			sample_rate_hertz: config.speech_sample_rate,
			max_audio_mb: config.max_audio_mb,
			poll_interval: Duration::from_millis(config.speech_poll_interval_ms),
		}
	}
}

/// Long-running recognition through Google Speech-to-Text.
///
/// Audio is staged in Cloud Storage for the duration of the request and
/// removed afterwards. The service account authenticator is built on first
/// use and reused, so access tokens are cached until they expire.
pub struct GoogleSpeechTranscriber {
	client: reqwest::Client,
	config: SpeechConfig,
	auth: OnceCell<DefaultAuthenticator>,
}

#[derive(Debug, Deserialize)]
struct Operation {
	name: String,
	#[serde(default)]
	done: bool,
	error: Option<OperationError>,
	response: Option<RecognizeResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
	#[serde(default)]
	code: i32,
	#[serde(default)]
	message: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
	#[serde(default)]
	results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
	#[serde(default)]
	alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Alternative {
	#[serde(default)]
	transcript: String,
	#[serde(default)]
	words: Vec<WordInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WordInfo {
	start_time: Option<String>,
	end_time: Option<String>,
}

impl GoogleSpeechTranscriber {
	#[must_use]
	pub fn new(client: reqwest::Client, config: SpeechConfig) -> Self {
		Self {
			client,
			config,
			auth: OnceCell::new(),
		}
	}

	fn language(&self) -> String {
		primary_language(&self.config.language_code)
	}

	async fn authenticator(&self, credentials_json: &str) -> Result<&DefaultAuthenticator, StageError> {
		self.auth
			.get_or_try_init(|| async {
				let repaired = repair_private_key(credentials_json)?;
				let key = yup_oauth2::parse_service_account_key(repaired).map_err(|e| StageError::Auth(format!("invalid service account key: {e}")))?;

				debug!("Building service account authenticator");
				yup_oauth2::ServiceAccountAuthenticator::builder(key)
					.build()
					.await
					.map_err(|e| StageError::Auth(e.to_string()))
			})
			.await
	}

	async fn access_token(&self, credentials_json: &str) -> Result<String, StageError> {
		let auth = self.authenticator(credentials_json).await?;

		let token = auth.token(&[CLOUD_PLATFORM_SCOPE]).await.map_err(|e| StageError::Auth(e.to_string()))?;
		token
			.token()
			.map(str::to_owned)
			.ok_or_else(|| StageError::Auth("token response carried no access token".to_string()))
	}

	async fn upload(&self, token: &str, bucket: &str, object: &str, audio: &AudioHandle) -> Result<(), StageError> {
		let url = api_url(STORAGE_UPLOAD_API, &["b", bucket, "o"])?;
		let file = tokio::fs::File::open(&audio.path).await?;
		let length = file.metadata().await?.len();

		let response = self
			.client
			.post(url)
			.bearer_auth(token)
			.query(&[("uploadType", "media"), ("name", object)])
			.header(reqwest::header::CONTENT_TYPE, "audio/mpeg")
			.header(reqwest::header::CONTENT_LENGTH, length)
			.body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
			.send()
			.await?;

		ensure_success(response).await.map(drop)
	}

	async fn delete(&self, token: &str, bucket: &str, object: &str) -> Result<(), StageError> {
		let url = api_url(STORAGE_API, &["b", bucket, "o", object])?;
		let response = self.client.delete(url).bearer_auth(token).send().await?;
		ensure_success(response).await.map(drop)
	}

	async fn recognize(&self, token: &str, gcs_uri: &str) -> Result<RecognizeResponse, StageError> {
		let request = json!({
			"config": {
				"encoding": "MP3",
				"sampleRateHertz": self.config.sample_rate_hertz,
				"languageCode": self.config.language_code,
				"enableWordTimeOffsets": true,
			},
			"audio": { "uri": gcs_uri },
		});

		let url = format!("{SPEECH_API}speech:longrunningrecognize");
		let response = self.client.post(url).bearer_auth(token).json(&request).send().await?;
		let mut operation: Operation = decode(ensure_success(response).await?)?;
		debug!(operation = %operation.name, "Recognition started");

		while !operation.done {
			tokio::time::sleep(self.config.poll_interval).await;
			let url = api_url(SPEECH_API, &["operations", &operation.name])?;
			let response = self.client.get(url).bearer_auth(token).send().await?;
			operation = decode(ensure_success(response).await?)?;
		}

		if let Some(error) = operation.error {
			return Err(StageError::Api {
				status: u16::try_from(error.code).unwrap_or(500),
				body: error.message,
			});
		}

		Ok(operation.response.unwrap_or_default())
	}
}

#[async_trait]
impl Transcriber for GoogleSpeechTranscriber {
	#[instrument(skip(self), fields(path = %audio.path.display()))]
	async fn transcribe(&self, audio: &AudioHandle) -> Result<TranscriptionOutput, StageError> {
		let credentials = self.config.credentials_json.as_deref().ok_or(StageError::MissingConfig("GOOGLE_CREDENTIALS_JSON"))?;
		let bucket = self.config.bucket.as_deref().ok_or(StageError::MissingConfig("GCS_BUCKET_NAME"))?;

		let size_mb = tokio::fs::metadata(&audio.path).await?.len() / MIB;
		if size_mb > self.config.max_audio_mb {
			return Err(StageError::TooLarge {
				size_mb,
				limit_mb: self.config.max_audio_mb,
			});
		}
		info!(size_mb, "Audio accepted for recognition");

		let token = self.access_token(credentials).await?;
		let object = format!("audio/{}", audio.file_name());

		self.upload(&token, bucket, &object, audio).await?;
		let gcs_uri = format!("gs://{bucket}/{object}");
		debug!(%gcs_uri, "Audio staged");

		let recognized = self.recognize(&token, &gcs_uri).await;

		if let Err(e) = self.delete(&token, bucket, &object).await {
			warn!(%gcs_uri, error = %e, "Failed to delete staged audio, continuing");
		}

		Ok(assemble(recognized?, self.language()))
	}
}

fn api_url(base: &str, segments: &[&str]) -> Result<Url, StageError> {
	let mut url = Url::parse(base).map_err(|e| StageError::InvalidResponse(format!("bad API base url: {e}")))?;
	url.path_segments_mut()
		.map_err(|()| StageError::InvalidResponse(format!("API base url cannot carry a path: {base}")))?
		.pop_if_empty()
		.extend(segments);
	Ok(url)
}

async fn ensure_success(response: reqwest::Response) -> Result<String, StageError> {
	let status = response.status();
	let body = response.text().await?;
	if status.is_success() {
		Ok(body)
	} else {
		Err(StageError::Api { status: status.as_u16(), body })
	}
}

fn decode<T: serde::de::DeserializeOwned>(body: String) -> Result<T, StageError> {
	serde_json::from_str(&body).map_err(|e| StageError::InvalidResponse(format!("undecodable body: {e}")))
}

/// Service account JSON pasted into an environment variable often carries
/// the private key's newlines as literal `\n` sequences.
fn repair_private_key(credentials_json: &str) -> Result<String, StageError> {
	let mut raw: serde_json::Value = serde_json::from_str(credentials_json).map_err(|e| StageError::Auth(format!("credentials are not valid JSON: {e}")))?;

	if let Some(key) = raw.get_mut("private_key") {
		if let Some(pem) = key.as_str() {
			*key = serde_json::Value::String(pem.replace("\\n", "\n"));
		}
	}

	serde_json::to_string(&raw).map_err(|e| StageError::Auth(e.to_string()))
}

fn primary_language(language_code: &str) -> String {
	language_code.split(['-', '_']).next().unwrap_or(language_code).to_ascii_lowercase()
}

/// Offsets come back as protobuf JSON durations, e.g. `"1.300s"`.
fn parse_offset(value: Option<&str>) -> Option<f64> {
	value?.strip_suffix('s')?.parse().ok()
}

fn assemble(response: RecognizeResponse, language: String) -> TranscriptionOutput {
	let mut full_text = String::new();
	let mut segments = Vec::new();

	for alternative in response.results.into_iter().flat_map(|r| r.alternatives) {
		full_text.push_str(&alternative.transcript);
		full_text.push(' ');

		if let (Some(first), Some(last)) = (alternative.words.first(), alternative.words.last()) {
			segments.push(Segment {
				start_time: parse_offset(first.start_time.as_deref()).unwrap_or(0.0),
				end_time: parse_offset(last.end_time.as_deref()).unwrap_or(0.0),
				text: alternative.transcript.trim().to_string(),
			});
		}
	}

	TranscriptionOutput {
		language,
		full_text,
		segments,
	}
}
