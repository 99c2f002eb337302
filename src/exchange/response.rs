//! Token endpoint response model with diagnostic access-token decoding.

// self
use crate::{
	_prelude::*,
	error::{DecodeError, TokenExchangeError},
	exchange::AccessToken,
};

/// Required members of a successful token response (RFC 6749 §5.1).
#[derive(Debug, Deserialize)]
struct TokenResponseFields {
	access_token: AccessToken,
	token_type: String,
	#[serde(default)]
	expires_in: Option<u64>,
}

/// Successful token endpoint response.
#[derive(Debug)]
pub struct TokenResponse {
	/// Issued access token.
	pub access_token: AccessToken,
	/// Token type, typically `Bearer`.
	pub token_type: String,
	/// Lifetime in seconds, when the server supplied one.
	pub expires_in: Option<u64>,
	/// HTTP status of the response.
	pub status: u16,
	/// Raw JSON body as returned by the server.
	pub raw: JsonValue,
	/// Payload of `access_token` decoded without verification, or why that failed.
	///
	/// Failure here never fails the exchange; opaque tokens are legitimate.
	pub access_token_claims: Result<JsonMap<String, JsonValue>, DecodeError>,
}
impl TokenResponse {
	/// Parses a 2xx response body.
	pub fn from_body(status: u16, body: &[u8]) -> Result<Self, TokenExchangeError> {
		let parse_error = |source| TokenExchangeError::ResponseParse { status, source };
		let raw: JsonValue =
			serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(body))
				.map_err(parse_error)?;
		let fields: TokenResponseFields =
			serde_path_to_error::deserialize(&raw).map_err(parse_error)?;
		let access_token_claims = fields.access_token.claims();

		Ok(Self {
			access_token: fields.access_token,
			token_type: fields.token_type,
			expires_in: fields.expires_in,
			status,
			raw,
			access_token_claims,
		})
	}

	/// `Authorization` header value for calling protected APIs.
	pub fn bearer_authorization(&self) -> String {
		self.access_token.bearer_authorization()
	}

	/// Raw body plus either `access_token_claims` or `access_token_decode_error`.
	pub fn report(&self) -> JsonValue {
		let mut report = self.raw.clone();

		if let JsonValue::Object(map) = &mut report {
			match &self.access_token_claims {
				Ok(claims) => {
					map.insert("access_token_claims".into(), JsonValue::Object(claims.clone()));
				},
				Err(e) => {
					map.insert("access_token_decode_error".into(), JsonValue::String(e.to_string()));
				},
			}
		}

		report
	}
}
