//! LLM provider adapters.
//!
//! A [`ProviderEndpoint`] is resolved from [`Settings`] right before a request is queued. The
//! endpoint decides between the Gemini `generateContent` format and the OpenAI-compatible
//! `chat/completions` format based on the base URL, and [`ProviderEndpoint::complete`] performs
//! one call through any [`CompletionHttpClient`].

pub mod gemini;
pub mod openai;

// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProviderError},
	http::{CompletionHttpClient, CompletionRequest, CompletionResponse},
	settings::{ApiKey, Settings},
};

const GEMINI_HOST_MARKER: &str = "generativelanguage.googleapis.com";

/// Sampling temperature used for every completion.
pub const TEMPERATURE: f64 = 0.7;
/// Output token cap used for every completion.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Wire format spoken by the configured endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
	/// Google Gemini `models/<model>:generateContent` with a `key` query parameter.
	Gemini,
	/// OpenAI-style `chat/completions` with bearer authentication.
	OpenAiCompatible,
}
impl ProviderKind {
	/// Detects the wire format from a base URL.
	pub fn detect(base_url: &str) -> Self {
		if base_url.contains(GEMINI_HOST_MARKER) { Self::Gemini } else { Self::OpenAiCompatible }
	}

	/// Label used in user-facing error messages.
	pub const fn label(self) -> &'static str {
		match self {
			ProviderKind::Gemini => "Gemini API",
			ProviderKind::OpenAiCompatible => "API",
		}
	}
}

/// Validated provider coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoint {
	/// Wire format.
	pub kind: ProviderKind,
	/// Base URL without a trailing slash.
	pub base_url: String,
	/// Model identifier.
	pub model: String,
	/// Credential.
	pub api_key: ApiKey,
}
impl ProviderEndpoint {
	/// Resolves the endpoint from settings, checking the key, base URL, and model in that order.
	pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
		let api_key =
			settings.api_key.clone().filter(|key| !key.is_blank()).ok_or(ConfigError::MissingApiKey)?;
		let base_url = non_blank(settings.base_url.as_deref()).ok_or(ConfigError::MissingBaseUrl)?;
		let model = non_blank(settings.model.as_deref()).ok_or(ConfigError::MissingModel)?;
		let base_url = base_url.strip_suffix('/').unwrap_or(base_url);

		Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Ok(Self {
			kind: ProviderKind::detect(base_url),
			base_url: base_url.to_owned(),
			model: model.to_owned(),
			api_key,
		})
	}

	/// Builds the outbound request for `prompt`.
	pub fn request(&self, prompt: &str) -> Result<CompletionRequest> {
		match self.kind {
			ProviderKind::Gemini => gemini::request(self, prompt),
			ProviderKind::OpenAiCompatible => openai::request(self, prompt),
		}
	}

	/// Extracts the answer text from a raw response.
	pub fn parse(&self, response: CompletionResponse) -> Result<String, ProviderError> {
		let label = self.kind.label();

		if !response.is_success() {
			return Err(ProviderError::Status { label, status: response.status, body: response.body });
		}

		match self.kind {
			ProviderKind::Gemini => gemini::parse(&response.body),
			ProviderKind::OpenAiCompatible => openai::parse(&response.body),
		}
	}

	/// Sends `prompt` through `http` and returns the answer text.
	pub async fn complete<C>(&self, http: &C, prompt: &str) -> Result<String>
	where
		C: ?Sized + CompletionHttpClient,
	{
		let request = self.request(prompt)?;
		let response = http.post_json(request).await?;

		Ok(self.parse(response)?)
	}

	fn join(&self, path: &str) -> Result<Url, ConfigError> {
		Url::parse(&format!("{}/{path}", self.base_url))
			.map_err(|source| ConfigError::InvalidBaseUrl { source })
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}

fn decode<T>(label: &'static str, body: &str) -> Result<T, ProviderError>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_str(body);
	let value = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ProviderError::ResponseParse { label, source })?;

	deserializer.end().map_err(|source| ProviderError::TrailingData { label, source })?;

	Ok(value)
}

fn encode<T>(label: &'static str, body: &T) -> Result<serde_json::Value, ProviderError>
where
	T: Serialize,
{
	serde_json::to_value(body).map_err(|source| ProviderError::RequestEncode { label, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn settings(base_url: &str) -> Settings {
		Settings {
			api_key: Some(ApiKey::new("key")),
			base_url: Some(base_url.into()),
			model: Some("model-x".into()),
			..Settings::default()
		}
	}

	#[test]
	fn detects_kind_and_trims_trailing_slash() {
		let endpoint =
			ProviderEndpoint::from_settings(&settings("https://generativelanguage.googleapis.com/v1beta/"))
				.expect("Gemini settings should resolve.");

		assert_eq!(endpoint.kind, ProviderKind::Gemini);
		assert_eq!(endpoint.base_url, "https://generativelanguage.googleapis.com/v1beta");

		let endpoint = ProviderEndpoint::from_settings(&settings("https://api.openai.com/v1"))
			.expect("OpenAI settings should resolve.");

		assert_eq!(endpoint.kind, ProviderKind::OpenAiCompatible);
	}

	#[test]
	fn missing_fields_are_reported_in_order() {
		let err = ProviderEndpoint::from_settings(&Settings::default())
			.expect_err("Empty settings must be rejected.");

		assert!(matches!(err, ConfigError::MissingApiKey));

		let err = ProviderEndpoint::from_settings(&Settings {
			api_key: Some(ApiKey::new("key")),
			base_url: Some("  ".into()),
			..Settings::default()
		})
		.expect_err("Blank base URL must be rejected.");

		assert_eq!(err.to_string(), "Base URL not configured. Please set it in the extension options.");

		let err = ProviderEndpoint::from_settings(&Settings {
			model: None,
			..settings("https://api.openai.com/v1")
		})
		.expect_err("Missing model must be rejected.");

		assert!(matches!(err, ConfigError::MissingModel));

		let err = ProviderEndpoint::from_settings(&settings("not a url"))
			.expect_err("Unparseable base URL must be rejected.");

		assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
	}

	#[test]
	fn non_success_status_keeps_code_and_body() {
		let endpoint = ProviderEndpoint::from_settings(&settings("https://api.openai.com/v1"))
			.expect("OpenAI settings should resolve.");
		let err = endpoint
			.parse(CompletionResponse { status: 401, body: "{\"error\":\"bad key\"}".into() })
			.expect_err("401 must fail.");

		assert_eq!(err.status(), Some(401));
		assert_eq!(err.to_string(), "API error (401): {\"error\":\"bad key\"}");
	}

	#[test]
	fn trailing_bytes_after_json_are_rejected() {
		let endpoint = ProviderEndpoint::from_settings(&settings("https://api.openai.com/v1"))
			.expect("OpenAI settings should resolve.");
		let body = r#"{"choices":[{"message":{"content":"ok"}}]} <html>"#;
		let err = endpoint
			.parse(CompletionResponse { status: 200, body: body.into() })
			.expect_err("Trailing garbage must fail.");

		assert!(matches!(err, ProviderError::TrailingData { label: "API", .. }));

		let answer = endpoint
			.parse(CompletionResponse {
				status: 200,
				body: "{\"choices\":[{\"message\":{\"content\":\"ok\"}}]}\n".into(),
			})
			.expect("Trailing whitespace should be accepted.");

		assert_eq!(answer, "ok");
	}

	#[test]
	fn request_bodies_are_encoded_without_panicking() {
		for base_url in ["https://api.openai.com/v1", "https://generativelanguage.googleapis.com/v1beta"]
		{
			let endpoint =
				ProviderEndpoint::from_settings(&settings(base_url)).expect("Settings should resolve.");
			let request = endpoint.request("q").expect("Request body should encode.");

			assert!(request.body.is_object());
		}
	}
}
