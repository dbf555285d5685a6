use super::{StageError, Translator};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Translation through the Gemini `generateContent` endpoint.
pub struct GeminiTranslator {
	client: reqwest::Client,
	api_key: Option<String>,
	model: String,
	target_language: String,
	base_url: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
	candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
	content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
	parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
	text: Option<String>,
}

impl GeminiTranslator {
	pub fn new(client: reqwest::Client, api_key: Option<String>, model: impl Into<String>, target_language: impl Into<String>) -> Self {
		Self {
			client,
			api_key,
			model: model.into(),
			target_language: target_language.into(),
			base_url: GEMINI_BASE_URL.to_string(),
		}
	}

	#[must_use]
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	fn prompt(&self, text: &str) -> String {
		format!(
			"You are a professional translator. Translate the following text to {}:\n{text}",
			language_name(&self.target_language)
		)
	}
}

#[async_trait]
impl Translator for GeminiTranslator {
	#[instrument(skip(self, text), fields(model = %self.model, chars = text.chars().count()))]
	async fn translate(&self, text: &str) -> Result<String, StageError> {
		let api_key = self.api_key.as_deref().ok_or(StageError::MissingConfig("GEMINI_API_KEY"))?;

		let payload = json!({
			"contents": [{
				"parts": [{ "text": self.prompt(text) }]
			}]
		});

		let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
		let response = self.client.post(url).header(API_KEY_HEADER, api_key).json(&payload).send().await?;

		let status = response.status();
		let body = response.text().await?;
		if !status.is_success() {
			return Err(StageError::Api { status: status.as_u16(), body });
		}

		let translated = extract_text(&body)?;
		debug!(translated_chars = translated.chars().count(), "Translation received");
		Ok(translated)
	}

	fn model(&self) -> &str {
		&self.model
	}

	fn target_language(&self) -> &str {
		&self.target_language
	}
}

fn extract_text(body: &str) -> Result<String, StageError> {
	let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| StageError::InvalidResponse(format!("undecodable body: {e}")))?;

	let candidate = response
		.candidates
		.and_then(|c| c.into_iter().next())
		.ok_or_else(|| StageError::InvalidResponse("response carried no candidates".to_string()))?;

	let part = candidate
		.content
		.and_then(|c| c.parts)
		.and_then(|p| p.into_iter().next())
		.ok_or_else(|| StageError::InvalidResponse("candidate carried no content parts".to_string()))?;

	part.text.ok_or_else(|| StageError::InvalidResponse("content part carried no text".to_string()))
}

fn language_name(code: &str) -> &str {
	match code {
		"ja" => "Japanese",
		"en" => "English",
		"zh" => "Chinese",
		"ko" => "Korean",
		"es" => "Spanish",
		"fr" => "French",
		"de" => "German",
		other => other,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_extract_text_from_first_candidate() {
		let body = r#"{"candidates":[{"content":{"parts":[{"text":"こんにちは"}],"role":"model"}},{"content":{"parts":[{"text":"other"}]}}]}"#;

		assert_eq!(extract_text(body).unwrap(), "こんにちは");
	}

	#[test]
	fn test_extract_text_rejects_missing_pieces() {
		for body in [r"{}", r#"{"candidates":[]}"#, r#"{"candidates":[{}]}"#, r#"{"candidates":[{"content":{"parts":[{}]}}]}"#, "not json"] {
			assert!(matches!(extract_text(body), Err(StageError::InvalidResponse(_))), "accepted {body}");
		}
	}

	#[test]
	fn test_prompt_names_target_language() {
		let translator = GeminiTranslator::new(reqwest::Client::new(), None, "gemini-1.5-flash-latest", "ja");

		assert_eq!(
			translator.prompt("hello"),
			"You are a professional translator. Translate the following text to Japanese:\nhello"
		);
	}

	#[tokio::test]
	async fn test_missing_api_key_fails_before_request() {
		let translator = GeminiTranslator::new(reqwest::Client::new(), None, "m", "ja").with_base_url("http://127.0.0.1:9");

		let err = translator.translate("hello").await.unwrap_err();
		assert!(matches!(err, StageError::MissingConfig("GEMINI_API_KEY")));
	}

	#[tokio::test]
	async fn test_transport_errors_do_not_expose_api_key() {
		let key = "SECRET-KEY-123";
		let translator = GeminiTranslator::new(reqwest::Client::new(), Some(key.to_string()), "m", "ja").with_base_url("http://127.0.0.1:9");

		let err = translator.translate("hello").await.unwrap_err();
		assert!(matches!(err, StageError::Http(_)));

		let logged = crate::PipelineError::Stage {
			stage: crate::Stage::Translation,
			source: err,
		};
		assert!(!logged.to_string().contains(key), "{logged}");
		assert!(!format!("{logged:?}").contains(key), "{logged:?}");
	}
}
