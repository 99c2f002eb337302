//! Transport primitives for token endpoint calls.
//!
//! [`TokenHttpClient`] is the crate's only dependency on an HTTP stack. It is expressed with the
//! `oauth2` crate's [`AsyncHttpClient`] contract so any transport compatible with that ecosystem
//! can be plugged in, and it owns the classification of transport failures into
//! [`TransportError`] so callers can tell timeouts from other network failures.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TokenExchangeError, TransportError},
};

/// Default timeout for outbound token requests.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Abstraction over HTTP transports capable of executing token requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back any number of
/// exchange clients, and the handles they return must own whatever state is required so their
/// request futures remain `Send`.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single request.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle for one outbound request.
	fn handle(&self) -> Self::Handle;

	/// Classifies a transport failure.
	///
	/// The default treats every transport-specific error as a network failure; transports that
	/// can detect timeouts should override this.
	fn map_transport_error(
		&self,
		error: HttpClientError<Self::TransportError>,
	) -> TokenExchangeError {
		map_generic_transport_error(error)
	}
}

/// Generic mapping shared by transports that cannot distinguish timeouts.
pub fn map_generic_transport_error<E>(error: HttpClientError<E>) -> TokenExchangeError
where
	E: 'static + Send + Sync + StdError,
{
	match error {
		HttpClientError::Reqwest(inner) => TransportError::network(inner).into(),
		HttpClientError::Http(inner) => TokenExchangeError::Request(inner),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::network(message).into(),
		other => TransportError::network(format!("Unhandled HTTP client error: {other}")).into(),
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests do not follow redirects: OAuth 2.0 token endpoints answer directly. Configure
/// any custom [`ReqwestClient`] passed to [`ReqwestHttpClient::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that gives up on a request after `timeout`.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}

#[cfg(feature = "reqwest")]
/// Public handle returned by [`ReqwestHttpClient`] that satisfies [`TokenHttpClient`].
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let outbound = reqwest::Request::try_from(request).map_err(Box::new)?;
			let inbound = client.execute(outbound).await.map_err(Box::new)?;
			let mut response = HttpResponse::new(Vec::new());

			*response.status_mut() = inbound.status();
			*response.headers_mut() = inbound.headers().clone();
			*response.body_mut() = inbound.bytes().await.map_err(Box::new)?.to_vec();

			Ok(response)
		})
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}

	fn map_transport_error(&self, error: HttpClientError<ReqwestError>) -> TokenExchangeError {
		match error {
			HttpClientError::Reqwest(inner) if inner.is_timeout() =>
				TransportError::timeout(inner).into(),
			other => map_generic_transport_error(other),
		}
	}
}
