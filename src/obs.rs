//! Optional observability helpers for the request queue.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `profile_analyzer.queue` with a `stage`
//!   field, plus debug/warn events for dispatches, cancellations, and drain failures.
//! - Enable `metrics` to increment the `profile_analyzer_queue_total` counter for every queue
//!   transition, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

pub(crate) use self::tracing::queue_event;

// self
use crate::_prelude::*;

/// Queue transitions recorded for each work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueOutcome {
	/// Item joined the tail of the queue.
	Enqueued,
	/// Item left the queue and its work started.
	Dispatched,
	/// Work resolved successfully.
	Succeeded,
	/// Work failed; only this item's ticket observes the error.
	Failed,
	/// Item was removed by tag before dispatch.
	Cancelled,
	/// Item was rejected because the drain cycle itself failed.
	Rejected,
}
impl QueueOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			QueueOutcome::Enqueued => "enqueued",
			QueueOutcome::Dispatched => "dispatched",
			QueueOutcome::Succeeded => "succeeded",
			QueueOutcome::Failed => "failed",
			QueueOutcome::Cancelled => "cancelled",
			QueueOutcome::Rejected => "rejected",
		}
	}
}
impl Display for QueueOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
