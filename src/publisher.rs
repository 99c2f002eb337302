//! JWKS publisher serving the public half of [`KeyMaterial`] at `/.well-known/jwks.json`.
//!
//! The document is serialized once when the publisher is created. Every request returns the same
//! bytes, so handlers cannot fail and the response is identical for the life of the process.
//! [`JwksPublisher::bind`] acquires the socket before anything is reported as listening; a bind
//! failure or a bad key aborts startup.

// crates.io
use axum::{Router, body::Bytes, extract::State, http::header, response::IntoResponse, routing::get};
use tokio::net::TcpListener;
#[cfg(feature = "tracing")] use tower_http::trace::DefaultOnResponse;
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	config::PublisherConfig,
	error::ServeError,
	key::{Jwks, KeyMaterial},
	obs::{self, FlowKind},
};

/// Well-known path of the key set.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Immutable JWKS document and its HTTP surface.
#[derive(Clone, Debug)]
pub struct JwksPublisher {
	key_set: Jwks,
	document: Bytes,
}
impl JwksPublisher {
	/// Derives the key set from `key` and serializes it once.
	pub fn new(key: &KeyMaterial) -> Result<Self, ServeError> {
		let key_set = Jwks::single(key.public_jwk());
		let document = serde_json::to_vec(&key_set).map_err(ServeError::Encode)?;

		Ok(Self { key_set, document: Bytes::from(document) })
	}

	/// Loads the key named by `config` and builds the publisher.
	pub fn from_config(config: &PublisherConfig) -> Result<Self> {
		let key = KeyMaterial::load(&config.key_path)?;

		Ok(Self::new(&key)?)
	}

	/// Published key set; always exactly one key.
	pub fn public_key_set(&self) -> &Jwks {
		&self.key_set
	}

	/// Serialized document served for every request.
	pub fn document(&self) -> &[u8] {
		&self.document
	}

	/// Router exposing [`JWKS_PATH`] with request tracing.
	///
	/// With the `tracing` feature every response is logged at `info` inside a span carrying the
	/// method, path and peer address.
	pub fn router(&self) -> Router {
		let router = Router::new().route(JWKS_PATH, get(jwks));
		#[cfg(feature = "tracing")]
		let router = router.layer(
			TraceLayer::new_for_http()
				.make_span_with(obs::http_request_span)
				.on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
		);
		#[cfg(not(feature = "tracing"))]
		let router = router.layer(TraceLayer::new_for_http());

		router.with_state(self.document.clone())
	}

	/// Binds `addr`; the publisher is not serving until [`BoundPublisher::serve`] runs.
	pub async fn bind(&self, addr: SocketAddr) -> Result<BoundPublisher, ServeError> {
		let listener =
			TcpListener::bind(addr).await.map_err(|source| ServeError::Bind { addr, source })?;
		let local_addr =
			listener.local_addr().map_err(|source| ServeError::Bind { addr, source })?;

		obs::warn_event(
			FlowKind::JwksPublish,
			"This server is for demo purposes only. Do not use it as is in production.",
		);
		obs::info_event(FlowKind::JwksPublish, "JWKS publisher listening.", &local_addr);

		Ok(BoundPublisher { listener, local_addr, router: self.router() })
	}
}

/// Publisher holding a bound listener.
#[derive(Debug)]
pub struct BoundPublisher {
	listener: TcpListener,
	local_addr: SocketAddr,
	router: Router,
}
impl BoundPublisher {
	/// Actual listen address (resolves port `0`).
	pub fn local_addr(&self) -> SocketAddr {
		self.local_addr
	}

	/// Serves until the process exits.
	pub async fn serve(self) -> Result<(), ServeError> {
		self.serve_with_shutdown(std::future::pending()).await
	}

	/// Serves until `signal` resolves, then drains in-flight requests.
	pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), ServeError>
	where
		F: 'static + Future<Output = ()> + Send,
	{
		let service = self.router.into_make_service_with_connect_info::<SocketAddr>();

		axum::serve(self.listener, service)
			.with_graceful_shutdown(signal)
			.await
			.map_err(ServeError::Serve)
	}
}

/// Resolves when `signal` fires.
///
/// If the signal cannot be installed the error is logged and the future never resolves.
pub async fn shutdown_on<F>(signal: F)
where
	F: Future<Output = std::io::Result<()>>,
{
	match signal.await {
		Ok(()) => obs::info_event(FlowKind::JwksPublish, "Shutting down JWKS publisher.", &"signal"),
		Err(e) => {
			obs::error_event(
				FlowKind::JwksPublish,
				"Failed to install the shutdown signal; serving until the process is killed.",
				&e,
			);

			std::future::pending::<()>().await
		},
	}
}

async fn jwks(State(document): State<Bytes>) -> impl IntoResponse {
	obs::record_jwks_served();

	([(header::CONTENT_TYPE, "application/json")], document)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn document_is_stable_and_public_only() {
		let key = load_fixture_key("client_pkcs8.pem");
		let first = JwksPublisher::new(&key).expect("Publisher should build.");
		let second = JwksPublisher::new(&key).expect("Publisher should build.");
		let json: JsonValue =
			serde_json::from_slice(first.document()).expect("Document should be JSON.");

		assert_eq!(first.document(), second.document());
		assert_eq!(first.public_key_set().keys.len(), 1);
		assert_eq!(json["keys"][0]["kid"], key.key_id());

		for private_member in ["d", "p", "q", "dp", "dq", "qi"] {
			assert!(json["keys"][0].get(private_member).is_none());
		}
	}

	#[test]
	fn from_config_fails_fast_on_missing_key() {
		let config = PublisherConfig::new(fixture_path("missing.pem"));
		let err = JwksPublisher::from_config(&config).expect_err("Missing key must abort startup.");

		assert!(matches!(err, Error::KeyLoad(crate::error::KeyLoadError::FileNotFound { .. })));
	}

	#[tokio::test]
	async fn shutdown_on_resolves_when_signal_fires() {
		tokio::time::timeout(StdDuration::from_millis(200), shutdown_on(async { Ok(()) }))
			.await
			.expect("A delivered signal should end the wait.");
	}

	#[tokio::test]
	async fn shutdown_on_keeps_serving_when_signal_is_unavailable() {
		let unavailable = async { Err(std::io::Error::other("no signal handler")) };
		let waited =
			tokio::time::timeout(StdDuration::from_millis(200), shutdown_on(unavailable)).await;

		assert!(waited.is_err(), "A failed signal install must not trigger shutdown.");
	}

	#[tokio::test]
	async fn bind_reports_address_in_use() {
		let key = load_fixture_key("client_pkcs8.pem");
		let publisher = JwksPublisher::new(&key).expect("Publisher should build.");
		let first = publisher
			.bind(SocketAddr::from(([127, 0, 0, 1], 0)))
			.await
			.expect("Ephemeral bind should succeed.");
		let err = publisher
			.bind(first.local_addr())
			.await
			.expect_err("Second bind on the same port must fail.");

		assert!(matches!(err, ServeError::Bind { .. }));
	}
}
