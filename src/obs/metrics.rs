// self
use crate::obs::QueueOutcome;

/// Records a queue transition via the global metrics recorder (when enabled).
pub fn record_queue_outcome(outcome: QueueOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("profile_analyzer_queue_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_queue_outcome_noop_without_metrics() {
		record_queue_outcome(QueueOutcome::Cancelled);
	}
}
