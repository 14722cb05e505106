//! User-facing notification contract (toast/snackbar surface of the host UI).

// self
use crate::_prelude::*;

/// Visual severity of a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
	/// Informational.
	Neutral,
	/// Positive confirmation.
	Success,
	/// Failure the user should know about.
	Error,
}

/// A transient notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
	/// Text shown to the user.
	pub message: String,
	/// How long the notice stays visible.
	pub duration_ms: u64,
	/// Visual severity.
	pub severity: Severity,
}
impl Notice {
	/// Creates a notice.
	pub fn new(message: impl Into<String>, duration_ms: u64, severity: Severity) -> Self {
		Self { message: message.into(), duration_ms, severity }
	}
}

/// Fire-and-forget sink for user notifications.
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Shows `notice`. Implementations must not block and cannot fail.
	fn notify(&self, notice: Notice);
}

/// Notifier that only records notices in the log; useful for headless deployments.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;
impl Notifier for LogNotifier {
	fn notify(&self, notice: Notice) {
		#[cfg(feature = "tracing")]
		tracing::info!(
			severity = ?notice.severity,
			duration_ms = notice.duration_ms,
			"{}",
			notice.message
		);
		#[cfg(not(feature = "tracing"))]
		let _ = notice;
	}
}

/// Notifier that drops every notice.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentNotifier;
impl Notifier for SilentNotifier {
	fn notify(&self, _notice: Notice) {}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builtin_notifiers_accept_notices_as_trait_objects() {
		let notifiers: [Arc<dyn Notifier>; 2] = [Arc::new(LogNotifier), Arc::new(SilentNotifier)];

		for notifier in notifiers {
			notifier.notify(Notice::new("Your session has expired.", 3_000, Severity::Error));
		}

		assert_eq!(Notice::new("saved", 1_500, Severity::Success).duration_ms, 1_500);
	}
}
