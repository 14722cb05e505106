//! In-process counters for [`RefreshCoordinator`](super::RefreshCoordinator).
//!
//! An episode is one renewal call shared by every caller that saw the credential expire while it
//! was in flight. Episodes abandoned by a dropped initiator count as attempts with neither a
//! success nor a failure.

// std
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Episode counters exposed through [`Gateway::refresh_metrics`](crate::gateway::Gateway::refresh_metrics).
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	episodes: AtomicU64,
	renewed: AtomicU64,
	failed: AtomicU64,
	joined: AtomicU64,
}
impl RefreshMetrics {
	/// Episodes started, one renewal call each.
	pub fn attempts(&self) -> u64 {
		self.episodes.load(Relaxed)
	}

	/// Episodes that stored a fresh credential.
	pub fn successes(&self) -> u64 {
		self.renewed.load(Relaxed)
	}

	/// Episodes that settled their callers with an error.
	pub fn failures(&self) -> u64 {
		self.failed.load(Relaxed)
	}

	/// Callers parked on an in-flight episode instead of starting their own.
	pub fn joined(&self) -> u64 {
		self.joined.load(Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.episodes.fetch_add(1, Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.renewed.fetch_add(1, Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failed.fetch_add(1, Relaxed);
	}

	pub(crate) fn record_joined(&self) {
		self.joined.fetch_add(1, Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn abandoned_episode_counts_only_as_an_attempt() {
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();
		metrics.record_joined();
		metrics.record_joined();
		metrics.record_attempt();
		metrics.record_success();

		assert_eq!(metrics.attempts(), 2);
		assert_eq!(metrics.successes(), 1);
		assert_eq!(metrics.failures(), 0, "A dropped episode should not count as failed.");
		assert_eq!(metrics.joined(), 2);
	}
}
