//! Immutable runtime configuration for the token-request flow and the JWKS publisher.
//!
//! Values are built once at startup and passed by parameter; nothing in the crate reads
//! ambient global state.

// std
use std::net::{IpAddr, Ipv4Addr};
// self
use crate::{_prelude::*, error::ConfigError, http::DEFAULT_TIMEOUT};

/// Default JWKS publisher address.
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8085);

/// Settings for requesting an access token with a signed client assertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Authorization server base URL, e.g. `https://auth.example.com`.
	pub auth_host: Url,
	/// Realm on the authorization server.
	pub realm: String,
	/// OAuth 2.0 client identifier; also the assertion's `iss` and `sub`.
	pub client_id: String,
	/// PEM-encoded RSA private key.
	pub key_path: PathBuf,
	/// Embed `kid` in assertion headers; disable when the server stores the public key itself.
	pub self_hosted: bool,
	/// Timeout for the token endpoint call.
	pub timeout: StdDuration,
	/// Derived `{auth_host}/auth/realms/{realm}/protocol/openid-connect/token`.
	pub token_endpoint: Url,
}
impl ClientConfig {
	/// Returns a builder.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Authorization server base URL.
	pub auth_host: Option<String>,
	/// Realm name.
	pub realm: Option<String>,
	/// Client identifier.
	pub client_id: Option<String>,
	/// Private key path.
	pub key_path: Option<PathBuf>,
	/// Whether assertion headers carry `kid`.
	pub self_hosted: bool,
	/// Token endpoint timeout.
	pub timeout: StdDuration,
}
impl ClientConfigBuilder {
	/// Sets the authorization server base URL.
	pub fn auth_host(mut self, auth_host: impl Into<String>) -> Self {
		self.auth_host = Some(auth_host.into());

		self
	}

	/// Sets the realm.
	pub fn realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = Some(realm.into());

		self
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the private key path.
	pub fn key_path(mut self, key_path: impl Into<PathBuf>) -> Self {
		self.key_path = Some(key_path.into());

		self
	}

	/// Toggles `kid` in assertion headers (defaults to `true`).
	pub fn self_hosted(mut self, self_hosted: bool) -> Self {
		self.self_hosted = self_hosted;

		self
	}

	/// Overrides the token endpoint timeout (defaults to 30 seconds).
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Validates the settings and derives the token endpoint.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let auth_host = self.auth_host.ok_or(ConfigError::MissingField { field: "auth_host" })?;
		let auth_host =
			Url::parse(auth_host.trim()).map_err(|source| ConfigError::InvalidAuthHost { source })?;
		let realm = require_token("realm", self.realm)?;
		let client_id = require_token("client_id", self.client_id)?;
		let key_path = self.key_path.ok_or(ConfigError::MissingField { field: "key_path" })?;
		let token_endpoint = token_endpoint(&auth_host, &realm)?;

		Ok(ClientConfig {
			auth_host,
			realm,
			client_id,
			key_path,
			self_hosted: self.self_hosted,
			timeout: self.timeout,
			token_endpoint,
		})
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			auth_host: None,
			realm: None,
			client_id: None,
			key_path: None,
			self_hosted: true,
			timeout: DEFAULT_TIMEOUT,
		}
	}
}

/// Settings for the JWKS publisher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublisherConfig {
	/// PEM-encoded RSA private key whose public half is published.
	pub key_path: PathBuf,
	/// Listen address.
	pub bind: SocketAddr,
}
impl PublisherConfig {
	/// Creates a config listening on [`DEFAULT_BIND`].
	pub fn new(key_path: impl Into<PathBuf>) -> Self {
		Self { key_path: key_path.into(), bind: DEFAULT_BIND }
	}

	/// Overrides the listen address.
	pub fn with_bind(mut self, bind: SocketAddr) -> Self {
		self.bind = bind;

		self
	}
}

/// Builds `{auth_host}/auth/realms/{realm}/protocol/openid-connect/token`.
///
/// Any path already on `auth_host` is kept as a prefix; `realm` is percent-encoded as a single
/// segment.
pub fn token_endpoint(auth_host: &Url, realm: &str) -> Result<Url, ConfigError> {
	if !matches!(auth_host.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedAuthHost { url: auth_host.to_string() });
	}

	let mut endpoint = auth_host.clone();

	endpoint.set_query(None);
	endpoint.set_fragment(None);
	endpoint
		.path_segments_mut()
		.map_err(|_| ConfigError::UnsupportedAuthHost { url: auth_host.to_string() })?
		.pop_if_empty()
		.extend(["auth", "realms", realm, "protocol", "openid-connect", "token"]);

	Ok(endpoint)
}

fn require_token(field: &'static str, value: Option<String>) -> Result<String, ConfigError> {
	let value = value.ok_or(ConfigError::MissingField { field })?;

	if value.is_empty() || value.chars().any(char::is_whitespace) {
		return Err(ConfigError::InvalidValue { field });
	}

	Ok(value)
}
