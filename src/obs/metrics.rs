// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{FlowKind, FlowOutcome};

#[cfg(feature = "metrics")] const FLOW_TOTAL: &str = "jwt_bearer_flow_total";
#[cfg(feature = "metrics")] const FLOW_DURATION: &str = "jwt_bearer_flow_duration_seconds";
#[cfg(feature = "metrics")] const JWKS_SERVED: &str = "jwt_bearer_jwks_served_total";

/// Counts entry into a stage.
pub fn record_attempt(kind: FlowKind) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_TOTAL, "flow" => kind.as_str(), "outcome" => FlowOutcome::Attempt.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = kind;
}

/// Counts a finished stage and records how long it took.
pub fn record_outcome(kind: FlowKind, outcome: FlowOutcome, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	{
		let labels = [("flow", kind.as_str()), ("outcome", outcome.as_str())];

		metrics::counter!(FLOW_TOTAL, &labels).increment(1);
		metrics::histogram!(FLOW_DURATION, &labels).record(elapsed.as_secs_f64());
	}
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome, elapsed);
}

/// Counts one JWKS document served.
pub fn record_jwks_served() {
	#[cfg(feature = "metrics")]
	metrics::counter!(JWKS_SERVED).increment(1);
}
