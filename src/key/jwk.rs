//! Public JSON Web Key views (RFC 7517) and the RFC 7638 thumbprint used as `kid`.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// JWS algorithm advertised for every published key.
pub const RS256: &str = "RS256";
/// Key type for RSA keys.
pub const KTY_RSA: &str = "RSA";
/// Public key use for signature verification.
pub const USE_SIG: &str = "sig";

/// Public-only RSA JWK. Never carries private parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicJwk {
	/// Key type, always `RSA`.
	pub kty: String,
	/// Modulus, base64url without padding.
	pub n: String,
	/// Public exponent, base64url without padding.
	pub e: String,
	/// Algorithm, always `RS256`.
	pub alg: String,
	/// Intended use, always `sig`.
	#[serde(rename = "use")]
	pub key_use: String,
	/// Key identifier (RFC 7638 thumbprint), when published.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kid: Option<String>,
}
impl PublicJwk {
	/// Builds an RS256 signing JWK from base64url-encoded public parameters.
	pub fn rs256(n: impl Into<String>, e: impl Into<String>, kid: Option<String>) -> Self {
		Self {
			kty: KTY_RSA.into(),
			n: n.into(),
			e: e.into(),
			alg: RS256.into(),
			key_use: USE_SIG.into(),
			kid,
		}
	}

	/// Computes the RFC 7638 thumbprint of this key's required members.
	pub fn thumbprint(&self) -> String {
		rsa_thumbprint(&self.n, &self.e)
	}
}

/// JSON Web Key Set document served at `/.well-known/jwks.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
	/// Published keys.
	pub keys: Vec<PublicJwk>,
}
impl Jwks {
	/// Wraps a single active key.
	pub fn single(key: PublicJwk) -> Self {
		Self { keys: vec![key] }
	}

	/// Finds a key by identifier.
	pub fn find(&self, kid: &str) -> Option<&PublicJwk> {
		self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
	}
}

// Members in lexicographic order, as RFC 7638 §3.2 requires.
#[derive(Serialize)]
struct ThumbprintInput<'a> {
	e: &'a str,
	kty: &'static str,
	n: &'a str,
}

/// SHA-256 thumbprint over `{"e","kty","n"}`, base64url without padding.
pub fn rsa_thumbprint(n: &str, e: &str) -> String {
	let input = ThumbprintInput { e, kty: KTY_RSA, n };
	// Struct of plain strings; serialization cannot fail.
	let canonical = serde_json::to_vec(&input).unwrap_or_default();

	URL_SAFE_NO_PAD.encode(Sha256::digest(&canonical))
}

/// Encodes a big-endian unsigned integer as base64url without padding.
pub(crate) fn encode_uint(bytes: &[u8]) -> String {
	let start = bytes.iter().position(|byte| *byte != 0).unwrap_or(bytes.len().saturating_sub(1));

	URL_SAFE_NO_PAD.encode(&bytes[start..])
}
