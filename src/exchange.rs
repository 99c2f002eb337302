//! OAuth 2.0 `client_credentials` grant authenticated with a JWT client assertion (RFC 7523 §2.2).
//!
//! [`TokenExchangeClient::request_token`] posts the form, classifies failures into
//! [`TokenExchangeError`], and decodes the returned access token for diagnostics. Before the
//! request leaves the process a redacted [`TokenRequestAudit`] is logged at `debug` level and the
//! full one is handed to the optional inspector so callers can show exactly what was sent.

mod response;
mod token;

pub use response::*;
pub use token::*;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{
		Method,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	assertion::SignedAssertion,
	error::TokenExchangeError,
	http::TokenHttpClient,
	obs::{self, FlowKind},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// `grant_type` sent with every request.
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
/// `client_assertion_type` for JWT bearer client authentication.
pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
	"urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Callback receiving the outgoing request before it is sent.
pub type RequestInspector = Arc<dyn Fn(&TokenRequestAudit) + Send + Sync>;

/// Snapshot of an outgoing token request, including the decoded assertion claims.
///
/// Serializing the audit yields the request exactly as sent. `Debug` and `Display` replace the
/// compact assertion with its length so log output never carries a replayable credential.
#[derive(Clone, Serialize)]
pub struct TokenRequestAudit {
	/// Token endpoint URL.
	pub token_endpoint: String,
	/// Always `client_credentials`.
	pub grant_type: &'static str,
	/// Client identifier.
	pub client_id: String,
	/// Always the JWT bearer assertion type.
	pub client_assertion_type: &'static str,
	/// Compact assertion as sent.
	pub client_assertion: String,
	/// Assertion payload, when it decodes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_assertion_claims: Option<JsonMap<String, JsonValue>>,
}
impl TokenRequestAudit {
	fn new(token_endpoint: &Url, client_id: &str, assertion: &SignedAssertion) -> Self {
		Self {
			token_endpoint: token_endpoint.to_string(),
			grant_type: GRANT_TYPE_CLIENT_CREDENTIALS,
			client_id: client_id.to_owned(),
			client_assertion_type: CLIENT_ASSERTION_TYPE_JWT_BEARER,
			client_assertion: assertion.as_str().to_owned(),
			client_assertion_claims: crate::assertion::decode_payload(assertion.as_str()).ok(),
		}
	}

	/// Form fields in wire order.
	pub fn form_fields(&self) -> [(&'static str, &str); 4] {
		[
			("grant_type", self.grant_type),
			("client_id", &self.client_id),
			("client_assertion_type", self.client_assertion_type),
			("client_assertion", &self.client_assertion),
		]
	}

	/// URL-encoded request body.
	pub fn form_body(&self) -> String {
		form_urlencoded::Serializer::new(String::new()).extend_pairs(self.form_fields()).finish()
	}

	/// Copy with `client_assertion` replaced by a length marker, for logging.
	pub fn redacted(&self) -> Self {
		Self {
			client_assertion: format!("<redacted, {} bytes>", self.client_assertion.len()),
			..self.clone()
		}
	}
}
impl Debug for TokenRequestAudit {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRequestAudit")
			.field("token_endpoint", &self.token_endpoint)
			.field("client_id", &self.client_id)
			.field("client_assertion_len", &self.client_assertion.len())
			.finish_non_exhaustive()
	}
}
impl Display for TokenRequestAudit {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match serde_json::to_string(&self.redacted()) {
			Ok(rendered) => f.write_str(&rendered),
			Err(_) => f.write_str("<unrenderable token request>"),
		}
	}
}

/// Executes the JWT-bearer `client_credentials` grant over a [`TokenHttpClient`].
#[derive(Clone)]
pub struct TokenExchangeClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	http_client: Arc<C>,
	inspector: Option<RequestInspector>,
}
impl<C> TokenExchangeClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a client over the provided transport.
	pub fn new(http_client: impl Into<Arc<C>>) -> Self {
		Self { http_client: http_client.into(), inspector: None }
	}

	/// Installs a callback that receives every outgoing request before it is sent.
	pub fn with_inspector(
		mut self,
		inspector: impl 'static + Fn(&TokenRequestAudit) + Send + Sync,
	) -> Self {
		self.inspector = Some(Arc::new(inspector));

		self
	}

	/// Requests an access token, authenticating with `assertion`.
	///
	/// Non-2xx answers become [`TokenExchangeError::HttpStatus`] carrying the server's body;
	/// transport failures become [`TokenExchangeError::Transport`]. No retry is attempted.
	pub async fn request_token(
		&self,
		token_endpoint: &Url,
		client_id: &str,
		assertion: &SignedAssertion,
	) -> Result<TokenResponse, TokenExchangeError> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		obs::observe_async(KIND, "request_token", async move {
			let audit = TokenRequestAudit::new(token_endpoint, client_id, assertion);

			obs::debug_event(KIND, "Requesting access token.", &audit);

			if let Some(inspector) = &self.inspector {
				inspector(&audit);
			}

			let request: HttpRequest = oauth2::http::Request::builder()
				.method(Method::POST)
				.uri(token_endpoint.as_str())
				.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
				.header(ACCEPT, JSON_CONTENT_TYPE)
				.body(audit.form_body().into_bytes())?;
			let handle = self.http_client.handle();
			let response = handle
				.call(request)
				.await
				.map_err(|e| self.http_client.map_transport_error(e))?;
			let status = response.status();

			if !status.is_success() {
				return Err(TokenExchangeError::HttpStatus {
					status: status.as_u16(),
					body: String::from_utf8_lossy(response.body()).into_owned(),
				});
			}

			TokenResponse::from_body(status.as_u16(), response.body())
		})
		.await
	}
}
#[cfg(feature = "reqwest")]
impl TokenExchangeClient<ReqwestHttpClient> {
	/// Creates a client with the default reqwest transport and the given timeout.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, crate::error::ConfigError> {
		Ok(Self::new(ReqwestHttpClient::with_timeout(timeout)?))
	}
}
impl<C> Debug for TokenExchangeClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchangeClient")
			.field("inspector_set", &self.inspector.is_some())
			.finish()
	}
}
