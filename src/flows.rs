//! End-to-end token request: load the key, sign an assertion, exchange it at the token endpoint.

// self
use crate::{
	_prelude::*,
	assertion::{AssertionBuilder, SignedAssertion},
	config::ClientConfig,
	exchange::{TokenExchangeClient, TokenRequestAudit, TokenResponse},
	http::TokenHttpClient,
	key::KeyMaterial,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Coordinates the private-key-JWT `client_credentials` grant for one client.
///
/// The key is loaded when the flow is constructed, so a missing or malformed key fails before
/// any HTTP activity. Every call to [`JwtBearerFlow::request_access_token`] signs a fresh
/// assertion; nothing is cached between calls.
#[derive(Clone, Debug)]
pub struct JwtBearerFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	config: ClientConfig,
	key: Arc<KeyMaterial>,
	assertions: AssertionBuilder,
	exchange: TokenExchangeClient<C>,
}
impl<C> JwtBearerFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Assembles a flow from already-constructed parts.
	pub fn with_parts(
		config: ClientConfig,
		key: impl Into<Arc<KeyMaterial>>,
		assertions: AssertionBuilder,
		exchange: TokenExchangeClient<C>,
	) -> Self {
		Self { config, key: key.into(), assertions, exchange }
	}

	/// Loads the configured key and pairs it with the provided exchange client.
	pub fn with_exchange(config: ClientConfig, exchange: TokenExchangeClient<C>) -> Result<Self> {
		let key = KeyMaterial::load(&config.key_path)?;

		Ok(Self::with_parts(config, key, AssertionBuilder::new(), exchange))
	}

	/// Installs a callback that receives every outgoing token request before it is sent.
	pub fn with_inspector(
		mut self,
		inspector: impl 'static + Fn(&TokenRequestAudit) + Send + Sync,
	) -> Self {
		self.exchange = self.exchange.with_inspector(inspector);

		self
	}

	/// Configuration the flow was built from.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Loaded signing key.
	pub fn key(&self) -> &KeyMaterial {
		&self.key
	}

	/// Signs a fresh client assertion addressed to the token endpoint.
	pub fn client_assertion(&self) -> Result<SignedAssertion> {
		Ok(self.assertions.build(
			&self.key,
			&self.config.client_id,
			self.config.token_endpoint.as_str(),
			self.config.self_hosted,
		)?)
	}

	/// Signs an assertion and exchanges it for an access token.
	pub async fn request_access_token(&self) -> Result<TokenResponse> {
		let assertion = self.client_assertion()?;
		let response = self
			.exchange
			.request_token(&self.config.token_endpoint, &self.config.client_id, &assertion)
			.await?;

		Ok(response)
	}
}
#[cfg(feature = "reqwest")]
impl JwtBearerFlow<ReqwestHttpClient> {
	/// Loads the key, then builds a reqwest transport honoring `config.timeout`.
	pub fn from_config(config: ClientConfig) -> Result<Self> {
		let key = KeyMaterial::load(&config.key_path)?;
		let exchange = TokenExchangeClient::with_timeout(config.timeout)?;

		Ok(Self::with_parts(config, key, AssertionBuilder::new(), exchange))
	}
}
