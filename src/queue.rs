//! Rate-limited FIFO queue that serializes outbound LLM calls.
//!
//! [`RateLimitedQueue`] owns the pending items, a `draining` flag, and the instant of the most
//! recently started dispatch. Enqueueing spawns a drain loop on the current Tokio runtime when
//! none is running. Each drain cycle first refreshes the requests-per-minute budget from the
//! [`SettingsStore`], then dispatches items one at a time, spacing dispatch starts by at least
//! `60000 / rate` milliseconds. Work that fails settles only its own ticket.
//!
//! Cancellation is scoped to queued items: [`RateLimitedQueue::cancel_by_tag`] removes every
//! pending item carrying the tag and rejects its ticket, while an item whose work already started
//! always runs to completion.
//!
//! If the settings read fails, or the drain task dies, every pending item is rejected with that
//! cause and the queue returns to idle; the next `enqueue` starts a fresh cycle.

mod job;
mod metrics;

pub use job::QueueTicket;
pub use metrics::QueueMetrics;

// std
use std::{
	mem,
	sync::atomic::{AtomicU64, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use tokio::{runtime::Handle, time::Instant};
// self
use crate::{
	_prelude::*,
	ids::OriginTag,
	obs::{QueueOutcome, QueueSpan, queue_event},
	queue::job::Job,
	settings::{RatePerMinute, SettingsStore},
};

/// Why queued items for an origin were cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelReason {
	/// The origin navigated to another page.
	Navigation,
	/// The origin was closed or unloaded.
	Unload,
	/// The owning service is shutting down.
	Shutdown,
}
impl CancelReason {
	/// Human-readable description used in cancellation errors.
	pub const fn as_str(self) -> &'static str {
		match self {
			CancelReason::Navigation => "cancelled due to navigation",
			CancelReason::Unload => "cancelled because the page was unloaded",
			CancelReason::Shutdown => "cancelled because the service is shutting down",
		}
	}
}
impl Display for CancelReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

struct QueueItem {
	tag: Option<OriginTag>,
	job: Box<dyn Job>,
}

struct QueueState {
	pending: VecDeque<QueueItem>,
	draining: bool,
	last_dispatch_at: Option<Instant>,
	rate: RatePerMinute,
}

struct QueueInner {
	settings: Arc<dyn SettingsStore>,
	state: Mutex<QueueState>,
	next_id: AtomicU64,
	metrics: QueueMetrics,
}
impl QueueInner {
	async fn drain(self: Arc<Self>) {
		let span = QueueSpan::new("drain");

		span.instrument(async move {
			let mut guard = DrainGuard { inner: self.clone(), armed: true };

			match self.settings.load().await {
				Ok(settings) => {
					let rate = settings.rate_per_minute();

					self.state.lock().rate = rate;

					queue_event!(debug, rate = rate.get(), "Refreshed request budget.");
				},
				Err(e) => {
					queue_event!(warn, error = %e, "Failed to read settings; rejecting pending requests.");

					guard.armed = false;
					self.abort_cycle(|| Error::Settings(e.clone()));

					return;
				},
			}

			while let Some(item) = self.next_item() {
				let wait = self.throttle_delay();

				if !wait.is_zero() {
					tokio::time::sleep(wait).await;
				}

				self.state.lock().last_dispatch_at = Some(Instant::now());
				self.metrics.record(QueueOutcome::Dispatched);

				queue_event!(debug, tag = ?item.tag, "Dispatching request.");

				let outcome = item.job.run().await;

				self.metrics.record(outcome);
			}

			guard.armed = false;
		})
		.await
	}

	// Pops the head, or flips back to idle in the same critical section when nothing is left.
	fn next_item(&self) -> Option<QueueItem> {
		let mut state = self.state.lock();
		let item = state.pending.pop_front();

		if item.is_none() {
			state.draining = false;
		}

		item
	}

	fn throttle_delay(&self) -> StdDuration {
		let state = self.state.lock();

		match state.last_dispatch_at {
			Some(last) => state.rate.min_interval().saturating_sub(last.elapsed()),
			None => StdDuration::ZERO,
		}
	}

	// Rejects everything still pending and returns to idle.
	fn abort_cycle(&self, cause: impl Fn() -> Error) {
		let items = {
			let mut state = self.state.lock();

			state.draining = false;

			mem::take(&mut state.pending)
		};

		for item in items {
			item.job.reject(cause());
			self.metrics.record(QueueOutcome::Rejected);
		}
	}
}

// Fires only when the drain future is dropped before finishing (panic in work, runtime shutdown).
struct DrainGuard {
	inner: Arc<QueueInner>,
	armed: bool,
}
impl Drop for DrainGuard {
	fn drop(&mut self) {
		if self.armed {
			queue_event!(warn, "Drain loop stopped unexpectedly; rejecting pending requests.");

			self.inner.abort_cycle(|| Error::DrainAborted);
		}
	}
}

/// Single-flight request queue with a dynamically configured minimum dispatch interval.
///
/// Cloning yields another handle to the same queue. Construct one per owning service; nothing
/// is global.
#[derive(Clone)]
pub struct RateLimitedQueue {
	inner: Arc<QueueInner>,
}
impl RateLimitedQueue {
	/// Creates an idle queue that reads its budget from `settings` at the start of each cycle.
	pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
		Self {
			inner: Arc::new(QueueInner {
				settings,
				state: Mutex::new(QueueState {
					pending: VecDeque::new(),
					draining: false,
					last_dispatch_at: None,
					rate: RatePerMinute::DEFAULT,
				}),
				next_id: AtomicU64::new(0),
				metrics: QueueMetrics::default(),
			}),
		}
	}

	/// Appends `work` to the tail of the queue and returns a ticket for its result.
	///
	/// `work` is invoked only when the item is dispatched. Items without a `tag` are never
	/// targeted by [`RateLimitedQueue::cancel_by_tag`]. Must be called from within a Tokio
	/// runtime; otherwise every pending item settles with [`Error::NoRuntime`].
	pub fn enqueue<T, F, Fut>(&self, work: F, tag: Option<OriginTag>) -> QueueTicket<T>
	where
		T: 'static + Send,
		F: 'static + Send + FnOnce() -> Fut,
		Fut: 'static + Send + Future<Output = Result<T>>,
	{
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
		let (job, ticket) = job::pending(id, work);
		let start = {
			let mut state = self.inner.state.lock();

			state.pending.push_back(QueueItem { tag, job });

			!mem::replace(&mut state.draining, true)
		};

		self.inner.metrics.record(QueueOutcome::Enqueued);

		if start {
			self.start_drain();
		}

		ticket
	}

	/// Cancels every queued item tagged `tag` because the origin navigated away.
	///
	/// Returns the number of items removed. See [`RateLimitedQueue::cancel_by_tag_with`].
	pub fn cancel_by_tag(&self, tag: &OriginTag) -> usize {
		self.cancel_by_tag_with(tag, CancelReason::Navigation)
	}

	/// Removes every queued item tagged `tag` and rejects its ticket with
	/// [`Error::Cancelled`].
	///
	/// The relative order of the remaining items is preserved. Work that already started is not
	/// interrupted, and a tag with no queued items is a no-op.
	pub fn cancel_by_tag_with(&self, tag: &OriginTag, reason: CancelReason) -> usize {
		let cancelled = {
			let mut state = self.inner.state.lock();
			let (cancelled, kept): (VecDeque<_>, VecDeque<_>) = mem::take(&mut state.pending)
				.into_iter()
				.partition(|item: &QueueItem| item.tag.as_ref() == Some(tag));

			state.pending = kept;

			cancelled
		};
		let count = cancelled.len();

		for item in cancelled {
			item.job.reject(Error::Cancelled { tag: tag.clone(), reason });
			self.inner.metrics.record(QueueOutcome::Cancelled);
		}

		if count > 0 {
			queue_event!(debug, tag = %tag, count, %reason, "Cancelled queued requests.");
		}

		count
	}

	/// Number of items waiting for dispatch (excluding the one in flight).
	pub fn pending_len(&self) -> usize {
		self.inner.state.lock().pending.len()
	}

	/// Returns `true` while a drain loop is running.
	pub fn is_draining(&self) -> bool {
		self.inner.state.lock().draining
	}

	/// Budget applied by the current (or most recent) drain cycle.
	pub fn rate(&self) -> RatePerMinute {
		self.inner.state.lock().rate
	}

	/// Counters describing every transition the queue has made.
	pub fn metrics(&self) -> &QueueMetrics {
		&self.inner.metrics
	}

	fn start_drain(&self) {
		match Handle::try_current() {
			Ok(handle) => {
				handle.spawn(self.inner.clone().drain());
			},
			Err(_) => self.inner.abort_cycle(|| Error::NoRuntime),
		}
	}
}
impl Debug for RateLimitedQueue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("RateLimitedQueue")
			.field("pending", &state.pending.len())
			.field("draining", &state.draining)
			.field("rate", &state.rate)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::settings::{MemorySettings, Settings};

	fn queue_with_rate(rate_limit: Option<i64>) -> RateLimitedQueue {
		let settings = MemorySettings::new(Settings { rate_limit, ..Settings::default() });

		RateLimitedQueue::new(Arc::new(settings))
	}

	#[test]
	fn enqueue_without_runtime_rejects() {
		let queue = queue_with_rate(None);
		let ticket = queue.enqueue(|| async { Ok::<_, Error>(1) }, None);

		assert!(!queue.is_draining());
		assert_eq!(queue.pending_len(), 0);
		assert_eq!(queue.metrics().rejected(), 1);

		let result = tokio::runtime::Builder::new_current_thread()
			.build()
			.expect("Test runtime should build.")
			.block_on(ticket);

		assert!(matches!(result, Err(Error::NoRuntime)));
	}

	#[tokio::test(start_paused = true)]
	async fn cancel_preserves_order_of_remaining_items() {
		let queue = queue_with_rate(Some(600));
		let keep = OriginTag::tab(1);
		let drop_tag = OriginTag::tab(2);
		let order = Arc::new(Mutex::new(Vec::new()));
		let mut tickets = Vec::new();

		for (label, tag) in [("a", &keep), ("b", &drop_tag), ("c", &keep), ("d", &drop_tag)] {
			let order = order.clone();

			tickets.push(queue.enqueue(
				move || async move {
					order.lock().push(label);

					Ok::<_, Error>(label)
				},
				Some(tag.clone()),
			));
		}

		assert_eq!(queue.cancel_by_tag(&drop_tag), 2);
		assert_eq!(queue.cancel_by_tag(&drop_tag), 0);

		let mut results = Vec::new();

		for ticket in tickets {
			results.push(ticket.await);
		}

		assert_eq!(*order.lock(), vec!["a", "c"]);
		assert!(matches!(results[0], Ok("a")));
		assert!(matches!(results[1], Err(Error::Cancelled { reason: CancelReason::Navigation, .. })));
		assert!(matches!(results[2], Ok("c")));
		assert!(results[3].as_ref().is_err_and(Error::is_cancelled));
		assert_eq!(queue.metrics().cancelled(), 2);
		assert_eq!(queue.metrics().dispatched(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn rate_is_refreshed_per_cycle() {
		let settings = Arc::new(MemorySettings::new(Settings {
			rate_limit: Some(120),
			..Settings::default()
		}));
		let queue = RateLimitedQueue::new(settings.clone());

		queue.enqueue(|| async { Ok::<_, Error>(()) }, None).await.expect("Work should succeed.");

		assert_eq!(queue.rate().get(), 120);

		settings.update(|settings| settings.rate_limit = Some(-1));
		queue.enqueue(|| async { Ok::<_, Error>(()) }, None).await.expect("Work should succeed.");

		assert_eq!(queue.rate(), RatePerMinute::DEFAULT);
	}

	#[test]
	fn cancel_reason_labels() {
		assert_eq!(CancelReason::Navigation.to_string(), "cancelled due to navigation");
		assert_eq!(CancelReason::Unload.as_str(), "cancelled because the page was unloaded");
	}
}
