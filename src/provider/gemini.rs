//! Gemini `generateContent` request and response shapes.

// self
use crate::{
	_prelude::*,
	error::ProviderError,
	http::CompletionRequest,
	provider::{self, MAX_OUTPUT_TOKENS, ProviderEndpoint, ProviderKind, TEMPERATURE},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
	contents: [RequestContent<'a>; 1],
	generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
	parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
	text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
	temperature: f64,
	max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
	#[serde(default)]
	candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
	content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
	#[serde(default)]
	parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
	text: Option<String>,
}

pub(crate) fn request(
	endpoint: &ProviderEndpoint,
	prompt: &str,
) -> Result<CompletionRequest> {
	let mut url = endpoint.join(&format!("models/{}:generateContent", endpoint.model))?;

	url.query_pairs_mut().append_pair("key", endpoint.api_key.expose());

	let body = GenerateContentRequest {
		contents: [RequestContent { parts: [RequestPart { text: prompt }] }],
		generation_config: GenerationConfig {
			temperature: TEMPERATURE,
			max_output_tokens: MAX_OUTPUT_TOKENS,
		},
	};

	let body = provider::encode(ProviderKind::Gemini.label(), &body)?;

	Ok(CompletionRequest { url, bearer: None, body })
}

pub(crate) fn parse(body: &str) -> Result<String, ProviderError> {
	let label = ProviderKind::Gemini.label();
	let response: GenerateContentResponse = provider::decode(label, body)?;

	response
		.candidates
		.into_iter()
		.next()
		.and_then(|candidate| candidate.content)
		.and_then(|content| content.parts.into_iter().next())
		.and_then(|part| part.text)
		.ok_or(ProviderError::UnexpectedResponse { label })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::settings::ApiKey;

	fn endpoint() -> ProviderEndpoint {
		ProviderEndpoint {
			kind: ProviderKind::Gemini,
			base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
			model: "gemini-2.0-flash".into(),
			api_key: ApiKey::new("secret"),
		}
	}

	#[test]
	fn request_targets_generate_content_with_key() {
		let request = request(&endpoint(), "hi").expect("Gemini request should build.");

		assert_eq!(
			request.url.as_str(),
			"https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent?key=secret"
		);
		assert!(request.bearer.is_none());
		assert_eq!(
			request.body,
			serde_json::json!({
				"contents": [{ "parts": [{ "text": "hi" }] }],
				"generationConfig": { "temperature": 0.7, "maxOutputTokens": 1000 }
			})
		);
	}

	#[test]
	fn parse_reads_first_candidate_text() {
		let answer = parse(r#"{"candidates":[{"content":{"parts":[{"text":"answer"}]}}]}"#)
			.expect("Well-formed response should parse.");

		assert_eq!(answer, "answer");
	}

	#[test]
	fn parse_rejects_missing_candidates_and_bad_json() {
		let err = parse(r#"{"promptFeedback":{}}"#).expect_err("Missing candidates must fail.");

		assert_eq!(err.to_string(), "Unexpected response format from Gemini API");

		let err = parse(r#"{"candidates":[{"content":{"parts":[]}}]}"#)
			.expect_err("Empty parts must fail.");

		assert!(matches!(err, ProviderError::UnexpectedResponse { .. }));

		let err = parse("{\"candidates\":7}").expect_err("Malformed JSON must fail.");

		match err {
			ProviderError::ResponseParse { source, .. } =>
				assert_eq!(source.path().to_string(), "candidates"),
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
