// crates.io
#[cfg(feature = "tracing")] use axum::extract::ConnectInfo;
// self
use crate::{_prelude::*, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`].
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// `jwt_bearer.flow` span tagged with `flow` and `stage`; inert without the `tracing` feature.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	inner: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `stage` of `kind`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { inner: tracing::info_span!("jwt_bearer.flow", flow = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs `run` with the span entered.
	pub fn in_scope<T>(&self, run: impl FnOnce() -> T) -> T {
		#[cfg(feature = "tracing")]
		{
			self.inner.in_scope(run)
		}
		#[cfg(not(feature = "tracing"))]
		{
			run()
		}
	}

	/// Attaches the span to `fut` so it is entered on every poll.
	pub fn instrument<F>(&self, fut: F) -> InstrumentedFlow<F>
	where
		F: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.inner.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Per-request span for the JWKS publisher: method, path and, when the server records it, the peer
/// address.
#[cfg(feature = "tracing")]
pub fn http_request_span(request: &axum::http::Request<axum::body::Body>) -> tracing::Span {
	let span = tracing::info_span!(
		"jwt_bearer.http",
		method = %request.method(),
		path = %request.uri().path(),
		remote = tracing::field::Empty
	);

	if let Some(ConnectInfo(remote)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
		span.record("remote", tracing::field::display(remote));
	}

	span
}

/// `debug` event with a rendered detail field.
pub fn debug_event(kind: FlowKind, message: &'static str, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::debug!(flow = kind.as_str(), %detail, "{message}");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, message, detail);
}

/// `info` event with a rendered detail field.
pub fn info_event(kind: FlowKind, message: &'static str, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::info!(flow = kind.as_str(), %detail, "{message}");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, message, detail);
}

/// `error` event with a rendered detail field.
pub fn error_event(kind: FlowKind, message: &'static str, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::error!(flow = kind.as_str(), %detail, "{message}");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, message, detail);
}

/// `warn` event.
pub fn warn_event(kind: FlowKind, message: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::warn!(flow = kind.as_str(), "{message}");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, message);
}
