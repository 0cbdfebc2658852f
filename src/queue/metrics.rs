// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::{self, QueueOutcome};

/// Thread-safe counters for queue transitions.
#[derive(Debug, Default)]
pub struct QueueMetrics {
	enqueued: AtomicU64,
	dispatched: AtomicU64,
	succeeded: AtomicU64,
	failed: AtomicU64,
	cancelled: AtomicU64,
	rejected: AtomicU64,
}
impl QueueMetrics {
	/// Returns the number of items accepted by `enqueue`.
	pub fn enqueued(&self) -> u64 {
		self.enqueued.load(Ordering::Relaxed)
	}

	/// Returns the number of items whose work was started.
	pub fn dispatched(&self) -> u64 {
		self.dispatched.load(Ordering::Relaxed)
	}

	/// Returns the number of dispatched items that resolved successfully.
	pub fn succeeded(&self) -> u64 {
		self.succeeded.load(Ordering::Relaxed)
	}

	/// Returns the number of dispatched items whose work failed.
	pub fn failed(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}

	/// Returns the number of items removed by tag before dispatch.
	pub fn cancelled(&self) -> u64 {
		self.cancelled.load(Ordering::Relaxed)
	}

	/// Returns the number of items rejected by a failed drain cycle.
	pub fn rejected(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: QueueOutcome) {
		let counter = match outcome {
			QueueOutcome::Enqueued => &self.enqueued,
			QueueOutcome::Dispatched => &self.dispatched,
			QueueOutcome::Succeeded => &self.succeeded,
			QueueOutcome::Failed => &self.failed,
			QueueOutcome::Cancelled => &self.cancelled,
			QueueOutcome::Rejected => &self.rejected,
		};

		counter.fetch_add(1, Ordering::Relaxed);
		obs::record_queue_outcome(outcome);
	}
}
