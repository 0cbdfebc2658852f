//! Service-level error types shared across the queue, providers, and settings stores.

// self
use crate::{_prelude::*, ids::OriginTag, queue::CancelReason};

/// Service-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for caller-supplied work failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Settings could not be read or written.
	#[error("{0}")]
	Settings(#[from] crate::settings::SettingsError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// LLM provider rejected the request or answered with an unexpected payload.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Caller-supplied work failed; the message is surfaced unchanged.
	#[error("{0}")]
	Work(BoxError),

	/// Item was removed from the queue before it was dispatched.
	#[error("Request for `{tag}` was {reason}.")]
	Cancelled {
		/// Origin tag the item was enqueued under.
		tag: OriginTag,
		/// Why the origin went away.
		reason: CancelReason,
	},
	/// The drain loop stopped before this item settled (panic or runtime shutdown).
	#[error("Request queue stopped before the request completed.")]
	DrainAborted,
	/// No Tokio runtime was available to drive the queue or the cleanup task.
	#[error("A running Tokio runtime is required.")]
	NoRuntime,
	/// No posts or comments are cached for the user.
	#[error("No data loaded for this user. Please load posts or comments first.")]
	NoProfileData,
}
impl Error {
	/// Wraps an arbitrary failure produced by queued work.
	pub fn work(src: impl Into<BoxError>) -> Self {
		Self::Work(src.into())
	}

	/// Returns `true` when the item was cancelled before dispatch.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled { .. })
	}
}

/// Configuration and validation failures raised before any request is issued.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The API key is not configured.
	#[error("API key not configured. Please set it in the extension options.")]
	MissingApiKey,
	/// The provider base URL is not configured.
	#[error("Base URL not configured. Please set it in the extension options.")]
	MissingBaseUrl,
	/// The model name is not configured.
	#[error("Model not configured. Please set it in the extension options.")]
	MissingModel,
	/// The configured base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The extension is switched off.
	#[error("Extension is disabled.")]
	Disabled,
}

/// Upstream LLM provider failures.
#[derive(Debug, ThisError)]
pub enum ProviderError {
	/// Provider answered with a non-success HTTP status.
	#[error("{label} error ({status}): {body}")]
	Status {
		/// Provider label used in the message (`Gemini API` or `API`).
		label: &'static str,
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// Provider answered 2xx but the payload lacks the expected answer fields.
	#[error("Unexpected response format from {label}")]
	UnexpectedResponse {
		/// Provider label used in the message.
		label: &'static str,
	},
	/// Provider answered 2xx with malformed JSON.
	#[error("{label} returned malformed JSON.")]
	ResponseParse {
		/// Provider label used in the message.
		label: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Provider answered 2xx with a JSON document followed by extra bytes.
	#[error("{label} returned malformed JSON.")]
	TrailingData {
		/// Provider label used in the message.
		label: &'static str,
		/// Decoder failure at the first trailing byte.
		#[source]
		source: serde_json::Error,
	},
	/// The request body could not be encoded.
	#[error("Failed to encode the {label} request.")]
	RequestEncode {
		/// Provider label used in the message.
		label: &'static str,
		/// Encoder failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ProviderError {
	/// HTTP status code, when the failure came from a non-success response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the LLM provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the LLM provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
