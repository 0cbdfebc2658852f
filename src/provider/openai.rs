//! OpenAI-compatible `chat/completions` request and response shapes.

// self
use crate::{
	_prelude::*,
	error::ProviderError,
	http::CompletionRequest,
	provider::{self, MAX_OUTPUT_TOKENS, ProviderEndpoint, ProviderKind, TEMPERATURE},
};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
	model: &'a str,
	messages: [ChatMessage<'a>; 1],
	temperature: f64,
	max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
	role: &'static str,
	content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
	#[serde(default)]
	choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
	message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
	content: Option<String>,
}

pub(crate) fn request(
	endpoint: &ProviderEndpoint,
	prompt: &str,
) -> Result<CompletionRequest> {
	let url = endpoint.join("chat/completions")?;
	let body = ChatCompletionRequest {
		model: &endpoint.model,
		messages: [ChatMessage { role: "user", content: prompt }],
		temperature: TEMPERATURE,
		max_tokens: MAX_OUTPUT_TOKENS,
	};

	Ok(CompletionRequest {
		url,
		bearer: Some(endpoint.api_key.clone()),
		body: provider::encode(ProviderKind::OpenAiCompatible.label(), &body)?,
	})
}

pub(crate) fn parse(body: &str) -> Result<String, ProviderError> {
	let label = ProviderKind::OpenAiCompatible.label();
	let response: ChatCompletionResponse = provider::decode(label, body)?;

	response
		.choices
		.into_iter()
		.next()
		.and_then(|choice| choice.message)
		.and_then(|message| message.content)
		.ok_or(ProviderError::UnexpectedResponse { label })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::settings::ApiKey;

	fn endpoint() -> ProviderEndpoint {
		ProviderEndpoint {
			kind: ProviderKind::OpenAiCompatible,
			base_url: "https://openrouter.ai/api/v1".into(),
			model: "gpt-4o-mini".into(),
			api_key: ApiKey::new("secret"),
		}
	}

	#[test]
	fn request_uses_bearer_and_chat_shape() {
		let request = request(&endpoint(), "hi").expect("Chat request should build.");

		assert_eq!(request.url.as_str(), "https://openrouter.ai/api/v1/chat/completions");
		assert_eq!(request.bearer.as_ref().map(ApiKey::expose), Some("secret"));
		assert_eq!(
			request.body,
			serde_json::json!({
				"model": "gpt-4o-mini",
				"messages": [{ "role": "user", "content": "hi" }],
				"temperature": 0.7,
				"max_tokens": 1000
			})
		);
	}

	#[test]
	fn parse_reads_first_choice() {
		let answer = parse(r#"{"choices":[{"message":{"role":"assistant","content":"yes"}}]}"#)
			.expect("Well-formed response should parse.");

		assert_eq!(answer, "yes");

		let err = parse(r#"{"choices":[]}"#).expect_err("Empty choices must fail.");

		assert_eq!(err.to_string(), "Unexpected response format from API");
	}
}
