//! Transport primitives for LLM completion calls.
//!
//! [`CompletionHttpClient`] is the service's only dependency on an HTTP stack. Provider adapters
//! build a [`CompletionRequest`] and interpret the returned [`CompletionResponse`] themselves, so
//! a transport only has to POST JSON and hand back the status code and body text.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError, settings::ApiKey};

/// Boxed future returned by [`CompletionHttpClient::post_json`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<CompletionResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of issuing provider completion requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared (behind
/// `Arc`) by every queued work item. Non-success statuses are not transport errors: return them
/// in [`CompletionResponse`] and let the provider adapter describe the failure.
pub trait CompletionHttpClient
where
	Self: 'static + Send + Sync,
{
	/// POSTs `request.body` as JSON to `request.url`.
	fn post_json(&self, request: CompletionRequest) -> HttpFuture<'_>;
}

/// Outbound JSON request prepared by a provider adapter.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
	/// Fully qualified endpoint URL (including any query-string credentials).
	pub url: Url,
	/// Bearer credential for the `Authorization` header, when the provider uses one.
	pub bearer: Option<ApiKey>,
	/// JSON payload.
	pub body: serde_json::Value,
}

/// Raw response captured by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body as text.
	pub body: String,
}
impl CompletionResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl CompletionHttpClient for ReqwestHttpClient {
	fn post_json(&self, request: CompletionRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let mut builder = self.0.post(request.url).json(&request.body);

			if let Some(key) = &request.bearer {
				builder = builder.bearer_auth(key.expose());
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.text().await?;

			Ok(CompletionResponse { status, body })
		})
	}
}
