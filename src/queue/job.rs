//! Type-erased work items and the ticket handed back to callers.

// std
use std::task::{Context, Poll};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, obs::QueueOutcome};

/// Boxed future that runs one dispatched item to completion.
pub(crate) type DispatchFuture = Pin<Box<dyn Future<Output = QueueOutcome> + Send>>;

/// Pending work owned by the queue. Both methods consume the job, so an item settles once.
pub(crate) trait Job
where
	Self: Send,
{
	/// Invokes the work and forwards its result to the ticket.
	fn run(self: Box<Self>) -> DispatchFuture;

	/// Settles the ticket with `error` without invoking the work.
	fn reject(self: Box<Self>, error: Error);
}

struct PendingJob<T, F> {
	work: F,
	tx: oneshot::Sender<Result<T>>,
}
impl<T, F, Fut> Job for PendingJob<T, F>
where
	T: 'static + Send,
	F: 'static + Send + FnOnce() -> Fut,
	Fut: 'static + Send + Future<Output = Result<T>>,
{
	fn run(self: Box<Self>) -> DispatchFuture {
		let PendingJob { work, tx } = *self;

		Box::pin(async move {
			let result = work().await;
			let outcome =
				if result.is_ok() { QueueOutcome::Succeeded } else { QueueOutcome::Failed };

			// The caller may have dropped its ticket; the work still counts as dispatched.
			let _ = tx.send(result);

			outcome
		})
	}

	fn reject(self: Box<Self>, error: Error) {
		let _ = self.tx.send(Err(error));
	}
}

/// Wraps `work` into a queue job plus the ticket that observes its settlement.
pub(crate) fn pending<T, F, Fut>(id: u64, work: F) -> (Box<dyn Job>, QueueTicket<T>)
where
	T: 'static + Send,
	F: 'static + Send + FnOnce() -> Fut,
	Fut: 'static + Send + Future<Output = Result<T>>,
{
	let (tx, rx) = oneshot::channel();

	(Box::new(PendingJob { work, tx }), QueueTicket { id, rx })
}

/// Future returned by [`RateLimitedQueue::enqueue`](crate::queue::RateLimitedQueue::enqueue).
///
/// Resolves with the work's own result, with [`Error::Cancelled`] when the item is removed by
/// tag before dispatch, or with the drain-cycle error when the queue rejects everything pending.
/// Dropping the ticket does not remove the item from the queue.
#[derive(Debug)]
pub struct QueueTicket<T> {
	id: u64,
	rx: oneshot::Receiver<Result<T>>,
}
impl<T> QueueTicket<T> {
	/// Queue-assigned item identifier (monotonic per queue).
	pub fn id(&self) -> u64 {
		self.id
	}
}
impl<T> Unpin for QueueTicket<T> {}
impl<T> Future for QueueTicket<T> {
	type Output = Result<T>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.get_mut().rx)
			.poll(cx)
			.map(|received| received.unwrap_or_else(|_| Err(Error::DrainAborted)))
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicBool, Ordering};
	// self
	use super::*;

	#[tokio::test]
	async fn run_forwards_result_to_ticket() {
		let (job, ticket) = pending(3, || async { Ok::<_, Error>(21 * 2) });

		assert_eq!(ticket.id(), 3);
		assert_eq!(job.run().await, QueueOutcome::Succeeded);
		assert_eq!(ticket.await.expect("Ticket should observe the work result."), 42);
	}

	#[tokio::test]
	async fn reject_skips_work() {
		let ran = Arc::new(AtomicBool::new(false));
		let flag = ran.clone();
		let (job, ticket) = pending(0, move || async move {
			flag.store(true, Ordering::SeqCst);

			Ok::<_, Error>(())
		});

		job.reject(Error::NoRuntime);

		assert!(matches!(ticket.await, Err(Error::NoRuntime)));
		assert!(!ran.load(Ordering::SeqCst), "Rejected work must never be invoked.");
	}

	#[tokio::test]
	async fn dropped_job_settles_as_aborted() {
		let (job, ticket) = pending(0, || async { Ok::<_, Error>(()) });

		drop(job);

		assert!(matches!(ticket.await, Err(Error::DrainAborted)));
	}
}
