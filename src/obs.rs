//! Observability for key loading, assertion signing, token exchange, and JWKS publishing.
//!
//! Every stage runs through [`observe`] or [`observe_async`], which open a `jwt_bearer.flow` span
//! (`tracing` feature) and record the outcome plus latency (`metrics` feature). Both features are
//! optional; without them these helpers compile down to plain calls.
//!
//! Metrics emitted:
//!
//! - `jwt_bearer_flow_total{flow, outcome}` counter (`attempt`, `success`, `failure`).
//! - `jwt_bearer_flow_duration_seconds{flow, outcome}` histogram.
//! - `jwt_bearer_jwks_served_total` counter.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Pipeline stages observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Reading and parsing the RSA private key.
	KeyLoad,
	/// Building and signing a client assertion.
	ClientAssertion,
	/// Calling the token endpoint.
	TokenExchange,
	/// Binding and serving the JWKS document.
	JwksPublish,
}
impl FlowKind {
	/// Label used in span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::KeyLoad => "key_load",
			Self::ClientAssertion => "client_assertion",
			Self::TokenExchange => "token_exchange",
			Self::JwksPublish => "jwks_publish",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Result of one stage execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Stage entered.
	Attempt,
	/// Stage returned `Ok`.
	Success,
	/// Stage returned `Err`.
	Failure,
}
impl FlowOutcome {
	/// Label used in metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Attempt => "attempt",
			Self::Success => "success",
			Self::Failure => "failure",
		}
	}

	fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs a synchronous stage inside its span and records the outcome.
pub fn observe<T, E>(
	kind: FlowKind,
	stage: &'static str,
	run: impl FnOnce() -> Result<T, E>,
) -> Result<T, E>
where
	E: Display,
{
	let span = FlowSpan::new(kind, stage);
	let started = Instant::now();

	record_attempt(kind);

	let result = span.in_scope(run);

	finish(kind, started, &result);

	result
}

/// Runs an asynchronous stage inside its span and records the outcome.
pub async fn observe_async<T, E, Fut>(kind: FlowKind, stage: &'static str, run: Fut) -> Result<T, E>
where
	E: Display,
	Fut: Future<Output = Result<T, E>>,
{
	let span = FlowSpan::new(kind, stage);
	let started = Instant::now();

	record_attempt(kind);

	let result = span.instrument(run).await;

	finish(kind, started, &result);

	result
}

fn finish<T, E>(kind: FlowKind, started: Instant, result: &Result<T, E>)
where
	E: Display,
{
	let outcome = FlowOutcome::of(result);

	record_outcome(kind, outcome, started.elapsed());

	if let Err(e) = result {
		debug_event(kind, "Stage failed.", e);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(FlowKind::TokenExchange.to_string(), "token_exchange");
		assert_eq!(FlowKind::JwksPublish.as_str(), "jwks_publish");
		assert_eq!(FlowOutcome::Failure.to_string(), "failure");
	}

	#[test]
	fn observe_passes_results_through() {
		let ok = observe(FlowKind::KeyLoad, "ok", || Ok::<_, String>(7));
		let err = observe(FlowKind::KeyLoad, "err", || Err::<u8, _>("boom".to_owned()));

		assert_eq!(ok, Ok(7));
		assert_eq!(err, Err("boom".to_owned()));
		assert_eq!(FlowOutcome::of(&ok), FlowOutcome::Success);
		assert_eq!(FlowOutcome::of(&err), FlowOutcome::Failure);
	}

	#[tokio::test]
	async fn observe_async_passes_results_through() {
		let value =
			observe_async(FlowKind::TokenExchange, "async", async { Ok::<_, String>("done") })
				.await;

		assert_eq!(value, Ok("done"));
	}
}
