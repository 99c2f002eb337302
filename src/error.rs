//! Crate-level error types shared across key loading, signing, token exchange, and publishing.

// std
use std::io;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

const KEYGEN_COMMAND: &str = "openssl genpkey -algorithm RSA -pkeyopt rsa_keygen_bits:2048 -out";

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Private key could not be loaded; fatal before any network activity.
	#[error(transparent)]
	KeyLoad(#[from] KeyLoadError),
	/// Client assertion could not be signed.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Token endpoint call failed.
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),
	/// JWKS publisher failed to start or serve.
	#[error(transparent)]
	Serve(#[from] ServeError),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required setting was never supplied.
	#[error("Missing required setting `{field}`.")]
	MissingField {
		/// Setting name.
		field: &'static str,
	},
	/// A setting was empty or contained whitespace.
	#[error("Setting `{field}` must be non-empty and free of whitespace.")]
	InvalidValue {
		/// Setting name.
		field: &'static str,
	},
	/// Authorization server host could not be parsed.
	#[error("Authorization server host is not a valid URL.")]
	InvalidAuthHost {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Authorization server host must be an HTTP(S) base URL.
	#[error("Authorization server host must be an http(s) base URL: {url}.")]
	UnsupportedAuthHost {
		/// Offending URL.
		url: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while loading the RSA private key.
#[derive(Debug, ThisError)]
pub enum KeyLoadError {
	/// Key file does not exist.
	#[error(
		"Private PEM key not found at {}. Generate one with `{} {}`.",
		.path.display(),
		KEYGEN_COMMAND,
		.path.display()
	)]
	FileNotFound {
		/// Path that was checked.
		path: PathBuf,
	},
	/// Key file exists but could not be read.
	#[error("Private PEM key at {} could not be read.", .path.display())]
	Unreadable {
		/// Path that was read.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: io::Error,
	},
	/// File contents are not a PKCS#1 or PKCS#8 RSA private key.
	#[error("File at {} is not a valid PEM-encoded RSA private key.", .path.display())]
	Parse {
		/// Path that was parsed.
		path: PathBuf,
		/// Underlying decoding failure.
		#[source]
		source: BoxError,
	},
	/// RS256 requires a modulus of at least 2048 bits.
	#[error("RSA key at {} is {bits} bits; RS256 requires at least 2048.", .path.display())]
	KeyTooSmall {
		/// Path that was parsed.
		path: PathBuf,
		/// Modulus size in bits.
		bits: usize,
	},
}
impl KeyLoadError {
	/// Wraps a PEM/DER decoding failure.
	pub fn parse(path: impl Into<PathBuf>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Parse { path: path.into(), source: Box::new(src) }
	}

	/// Shell command that generates a suitable key at `path`.
	pub fn keygen_command(path: &Path) -> String {
		format!("{KEYGEN_COMMAND} {}", path.display())
	}
}

/// Failures raised while producing a signed client assertion.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// Header or claims could not be serialized.
	#[error("Client assertion could not be serialized.")]
	Encode(#[source] serde_json::Error),
	/// RSA signing failed.
	#[error("Client assertion could not be signed.")]
	Sign(#[source] rsa::signature::Error),
}

/// Failures raised by the token endpoint exchange.
#[derive(Debug, ThisError)]
pub enum TokenExchangeError {
	/// Network-level failure; no HTTP response was received.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint answered with a non-2xx status.
	#[error("Token endpoint responded with HTTP {status}: {body}")]
	HttpStatus {
		/// HTTP status code.
		status: u16,
		/// Raw response body, usually an OAuth 2.0 error document.
		body: String,
	},
	/// Token endpoint answered 2xx with a body that is not a token response.
	#[error("Token endpoint returned a malformed token response.")]
	ResponseParse {
		/// HTTP status code.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// HTTP request construction failed.
	#[error("Token request could not be constructed.")]
	Request(#[from] oauth2::http::Error),
}
impl TokenExchangeError {
	/// Returns `true` for network-level failures, which callers may consider retrying.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Transport(_))
	}

	/// Returns the HTTP status when the endpoint produced one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::HttpStatus { status, .. } | Self::ResponseParse { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Parses the OAuth 2.0 error document carried by [`TokenExchangeError::HttpStatus`].
	pub fn oauth_error(&self) -> Option<OAuthErrorBody> {
		match self {
			Self::HttpStatus { body, .. } => serde_json::from_str(body).ok(),
			_ => None,
		}
	}
}

/// OAuth 2.0 error response body (RFC 6749 §5.2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthErrorBody {
	/// Error code such as `invalid_client`.
	pub error: String,
	/// Human-readable description, if supplied.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure (DNS, TCP, TLS).
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured timeout.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl Into<BoxError>) -> Self {
		Self::Network { source: src.into() }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl Into<BoxError>) -> Self {
		Self::Timeout { source: src.into() }
	}
}

/// Non-fatal failure decoding a JWT payload segment for diagnostics.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Token has no payload segment.
	#[error("Token does not contain a payload segment.")]
	MissingPayload,
	/// Payload segment is not base64url.
	#[error("Token payload is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Payload bytes are not JSON.
	#[error("Token payload is not valid JSON.")]
	Json(#[from] serde_json::Error),
	/// Payload JSON is not an object.
	#[error("Token payload is not a JSON object.")]
	NotAnObject,
}

/// Failures raised by the JWKS publisher.
#[derive(Debug, ThisError)]
pub enum ServeError {
	/// Listener could not be bound.
	#[error("Failed to bind JWKS publisher to {addr}.")]
	Bind {
		/// Requested address.
		addr: SocketAddr,
		/// Underlying IO failure.
		#[source]
		source: io::Error,
	},
	/// Server loop terminated with an IO failure.
	#[error("JWKS publisher stopped unexpectedly.")]
	Serve(#[source] io::Error),
	/// JWKS document could not be serialized at startup.
	#[error("JWKS document could not be serialized.")]
	Encode(#[source] serde_json::Error),
}
