//! Service facade tying the profile cache, settings, providers, and the request queue together.
//!
//! [`Analyzer`] plays the role of the extension's background worker: content scripts store
//! scraped posts and comments, the popup asks questions, and tab lifecycle events cancel queued
//! questions for tabs that navigated away. Every provider call goes through the analyzer's single
//! [`RateLimitedQueue`].

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::CompletionHttpClient,
	ids::{OriginTag, Username},
	obs::QueueSpan,
	profile::{self, Comment, Post, ProfileCache, StoredData},
	provider::ProviderEndpoint,
	queue::{CancelReason, RateLimitedQueue},
	settings::SettingsStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Analyzer specialized for the crate's default reqwest transport.
pub type ReqwestAnalyzer = Analyzer<ReqwestHttpClient>;

/// Question about a cached profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
	/// Profile the question is about.
	pub username: Username,
	/// Free-form question from the user.
	pub question: String,
	/// Tab (or other origin) that asked; queued work is cancelled when it goes away.
	pub origin: Option<OriginTag>,
}
impl AnalyzeRequest {
	/// Creates an untagged request.
	pub fn new(username: Username, question: impl Into<String>) -> Self {
		Self { username, question: question.into(), origin: None }
	}

	/// Attaches the origin tag used for cancellation.
	pub fn with_origin(mut self, origin: OriginTag) -> Self {
		self.origin = Some(origin);

		self
	}
}

/// Owns the profile cache and the request queue for one provider transport.
pub struct Analyzer<C>
where
	C: ?Sized + CompletionHttpClient,
{
	/// HTTP transport used for every provider call.
	pub http_client: Arc<C>,
	/// Settings source shared with the queue.
	pub settings: Arc<dyn SettingsStore>,
	/// Queue serializing provider calls.
	pub queue: RateLimitedQueue,
	/// Scraped data per user.
	pub profiles: ProfileCache,
	settings_guard: Arc<AsyncMutex<()>>,
}
impl<C> Analyzer<C>
where
	C: ?Sized + CompletionHttpClient,
{
	/// Interval between stale-profile sweeps.
	pub const CLEANUP_PERIOD: StdDuration = StdDuration::from_secs(60 * 60);

	/// Creates an analyzer that reuses the caller-provided transport.
	pub fn with_http_client(settings: Arc<dyn SettingsStore>, http_client: impl Into<Arc<C>>) -> Self {
		Self {
			http_client: http_client.into(),
			queue: RateLimitedQueue::new(settings.clone()),
			settings,
			profiles: ProfileCache::default(),
			settings_guard: Default::default(),
		}
	}

	/// Replaces the cached posts for `username`, returning how many were stored.
	pub fn store_posts(&self, username: &Username, posts: Vec<Post>) -> usize {
		let count = self.profiles.store_posts(username, posts, OffsetDateTime::now_utc());

		#[cfg(feature = "tracing")]
		tracing::debug!(%username, count, "Stored posts.");

		count
	}

	/// Replaces the cached comments for `username`, returning how many were stored.
	pub fn store_comments(&self, username: &Username, comments: Vec<Comment>) -> usize {
		let count = self.profiles.store_comments(username, comments, OffsetDateTime::now_utc());

		#[cfg(feature = "tracing")]
		tracing::debug!(%username, count, "Stored comments.");

		count
	}

	/// Returns what is cached for `username`.
	pub fn stored_data(&self, username: &str) -> StoredData {
		self.profiles.snapshot(username)
	}

	/// Answers a question about a cached profile through the rate-limited queue.
	///
	/// Settings and cached data are validated before anything is queued, so configuration
	/// mistakes fail fast without consuming a slot in the queue.
	///
	/// Fails with [`ConfigError::Disabled`] while `extension_enabled` is switched off.
	pub async fn analyze_profile(&self, request: AnalyzeRequest) -> Result<String> {
		let span = QueueSpan::new("analyze_profile");

		span.instrument(async move {
			let settings = self.settings.load().await?;

			if !settings.extension_enabled {
				return Err(ConfigError::Disabled.into());
			}

			let endpoint = ProviderEndpoint::from_settings(&settings)?;
			let data = self
				.profiles
				.get(&request.username)
				.filter(|data| !data.is_empty())
				.ok_or(Error::NoProfileData)?;
			let prompt = profile::build_prompt(&request.username, &data, &request.question);
			let http_client = self.http_client.clone();

			self.queue
				.enqueue(
					move || async move { endpoint.complete(&*http_client, &prompt).await },
					request.origin,
				)
				.await
		})
		.await
	}

	/// Cancels queued questions from `origin` (tab navigation, unload, or shutdown).
	pub fn cancel_origin(&self, origin: &OriginTag, reason: CancelReason) -> usize {
		self.queue.cancel_by_tag_with(origin, reason)
	}

	/// Flips and persists the master switch, returning the new state.
	pub async fn toggle_enabled(&self) -> Result<bool> {
		let _guard = self.settings_guard.lock().await;
		let mut settings = self.settings.load().await?;

		settings.extension_enabled = !settings.extension_enabled;

		let enabled = settings.extension_enabled;

		self.settings.save(settings).await?;

		Ok(enabled)
	}

	/// Spawns the hourly sweep that drops profiles loaded more than an hour ago.
	pub fn spawn_cleanup(&self) -> Result<JoinHandle<()>> {
		self.profiles.spawn_cleanup(Self::CLEANUP_PERIOD, ProfileCache::DEFAULT_MAX_AGE)
	}
}
#[cfg(feature = "reqwest")]
impl Analyzer<ReqwestHttpClient> {
	/// Creates an analyzer that provisions its own reqwest-backed transport.
	pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
		Self::with_http_client(settings, ReqwestHttpClient::default())
	}
}
impl<C> Clone for Analyzer<C>
where
	C: ?Sized + CompletionHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			settings: self.settings.clone(),
			queue: self.queue.clone(),
			profiles: self.profiles.clone(),
			settings_guard: self.settings_guard.clone(),
		}
	}
}
impl<C> Debug for Analyzer<C>
where
	C: ?Sized + CompletionHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Analyzer")
			.field("queue", &self.queue)
			.field("profiles", &self.profiles.len())
			.finish()
	}
}
