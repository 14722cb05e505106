// self
use crate::obs::{CallKind, CallOutcome};

/// Bumps `credential_gateway_call_total{kind, outcome}`.
///
/// Facade calls count once per logical call, so a renewal plus retry still adds a single
/// `kind="call"` attempt. Each renewal episode adds one `kind="refresh"` attempt regardless of
/// how many callers wait on it. Compiles to nothing without the `metrics` feature.
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"credential_gateway_call_total",
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
