//! Scraped profile data cache and prompt construction.

pub mod prompt;

pub use prompt::build_prompt;

// crates.io
use tokio::{runtime::Handle, task::JoinHandle};
// self
use crate::{_prelude::*, ids::Username};

/// A submission scraped from the profile's posts tab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
	/// Post title.
	pub title: String,
	/// Community the post was made in.
	pub subreddit: String,
	/// Net score.
	pub score: i64,
	/// Self-text body, when present.
	#[serde(default)]
	pub body: Option<String>,
}

/// A comment scraped from the profile's comments tab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
	/// Community the comment was made in.
	pub subreddit: String,
	/// Comment text.
	pub body: String,
	/// Net score.
	pub score: i64,
}

/// Everything cached for one user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
	/// Posts from the most recent load, if any.
	pub posts: Option<Vec<Post>>,
	/// Comments from the most recent load, if any.
	pub comments: Option<Vec<Comment>>,
	/// When posts were last stored.
	#[serde(with = "time::serde::rfc3339::option")]
	pub posts_loaded_at: Option<OffsetDateTime>,
	/// When comments were last stored.
	#[serde(with = "time::serde::rfc3339::option")]
	pub comments_loaded_at: Option<OffsetDateTime>,
}
impl ProfileData {
	/// Returns `true` when neither posts nor comments have been loaded.
	pub fn is_empty(&self) -> bool {
		self.posts.is_none() && self.comments.is_none()
	}

	// A missing timestamp counts as infinitely old.
	fn is_stale(&self, cutoff: OffsetDateTime) -> bool {
		let older = |at: Option<OffsetDateTime>| at.is_none_or(|at| at < cutoff);

		older(self.posts_loaded_at) && older(self.comments_loaded_at)
	}
}

/// Flattened view returned to callers asking what is cached for a user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredData {
	/// Cached posts (empty when none).
	pub posts: Vec<Post>,
	/// Cached comments (empty when none).
	pub comments: Vec<Comment>,
	/// When posts were last stored.
	#[serde(with = "time::serde::rfc3339::option")]
	pub posts_loaded_at: Option<OffsetDateTime>,
	/// When comments were last stored.
	#[serde(with = "time::serde::rfc3339::option")]
	pub comments_loaded_at: Option<OffsetDateTime>,
}

type ProfileMap = Arc<RwLock<HashMap<Username, ProfileData>>>;

/// Thread-safe in-process cache keyed by username.
#[derive(Clone, Debug, Default)]
pub struct ProfileCache(ProfileMap);
impl ProfileCache {
	/// Default age after which an entry is evicted.
	pub const DEFAULT_MAX_AGE: Duration = Duration::hours(1);

	/// Replaces the cached posts for `user`, returning how many were stored.
	pub fn store_posts(&self, user: &Username, posts: Vec<Post>, now: OffsetDateTime) -> usize {
		let count = posts.len();
		let mut guard = self.0.write();
		let entry = guard.entry(user.clone()).or_default();

		entry.posts = Some(posts);
		entry.posts_loaded_at = Some(now);

		count
	}

	/// Replaces the cached comments for `user`, returning how many were stored.
	pub fn store_comments(
		&self,
		user: &Username,
		comments: Vec<Comment>,
		now: OffsetDateTime,
	) -> usize {
		let count = comments.len();
		let mut guard = self.0.write();
		let entry = guard.entry(user.clone()).or_default();

		entry.comments = Some(comments);
		entry.comments_loaded_at = Some(now);

		count
	}

	/// Returns a copy of the cached data for `user`.
	pub fn get(&self, user: &str) -> Option<ProfileData> {
		self.0.read().get(user).cloned()
	}

	/// Returns the cached data for `user`, with empty lists when nothing is cached.
	pub fn snapshot(&self, user: &str) -> StoredData {
		let Some(data) = self.get(user) else {
			return StoredData::default();
		};

		StoredData {
			posts: data.posts.unwrap_or_default(),
			comments: data.comments.unwrap_or_default(),
			posts_loaded_at: data.posts_loaded_at,
			comments_loaded_at: data.comments_loaded_at,
		}
	}

	/// Number of cached users.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Drops users whose posts and comments were both loaded before `now - max_age`.
	pub fn evict_stale(&self, now: OffsetDateTime, max_age: Duration) -> Vec<Username> {
		let cutoff = now - max_age;
		let mut evicted = Vec::new();

		self.0.write().retain(|user, data| {
			let stale = data.is_stale(cutoff);

			if stale {
				evicted.push(user.clone());
			}

			!stale
		});

		evicted
	}

	/// Spawns a task on the current runtime that evicts stale entries every `period`.
	///
	/// Fails with [`Error::NoRuntime`] when called outside a Tokio runtime.
	pub fn spawn_cleanup(
		&self,
		period: std::time::Duration,
		max_age: Duration,
	) -> Result<JoinHandle<()>> {
		let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
		let cache = self.clone();

		Ok(handle.spawn(async move {
			let mut ticker = tokio::time::interval(period);

			// The first tick completes immediately.
			ticker.tick().await;

			loop {
				ticker.tick().await;

				let evicted = cache.evict_stale(OffsetDateTime::now_utc(), max_age);

				#[cfg(feature = "tracing")]
				for user in &evicted {
					tracing::debug!(%user, "Cleaned up old profile data.");
				}
				#[cfg(not(feature = "tracing"))]
				let _ = evicted;
			}
		}))
	}
}
