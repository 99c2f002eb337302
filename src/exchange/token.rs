//! Issued access token, kept out of logs unless explicitly exposed.

// self
use crate::{_prelude::*, assertion, error::DecodeError};

/// Access token returned by the token endpoint.
///
/// `Debug` and `Display` never print the token itself, only its shape.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);
impl AccessToken {
	/// Wraps a raw token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw token value; never log it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// `true` when the token has the three-segment compact JWS shape.
	pub fn is_jwt(&self) -> bool {
		self.0.split('.').count() == 3
	}

	/// Payload claims decoded without signature verification.
	pub fn claims(&self) -> Result<JsonMap<String, JsonValue>, DecodeError> {
		assertion::decode_payload(&self.0)
	}

	/// `Authorization` header value.
	pub fn bearer_authorization(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("len", &self.0.len())
			.field("jwt", &self.is_jwt())
			.finish_non_exhaustive()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "<access token, {} bytes>", self.0.len())
	}
}
