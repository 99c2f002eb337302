//! RFC 7523 client assertions: header/claims models, the signing builder, and payload decoding.
//!
//! [`AssertionBuilder::build`] is pure apart from the injected [`Clock`] and [`JtiSource`]; tests
//! swap both for deterministic output.

pub mod source;

pub use source::*;

// crates.io
use base64::{
	Engine,
	alphabet::URL_SAFE,
	engine::{
		DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::URL_SAFE_NO_PAD,
	},
};
// self
use crate::{
	_prelude::*,
	error::{DecodeError, SigningError},
	key::{KeyMaterial, RS256},
	obs::{self, FlowKind},
};

/// Lifetime of every assertion: `exp - iat`.
pub const ASSERTION_LIFETIME: Duration = Duration::seconds(600);

// Servers are inconsistent about padding; accept both forms when decoding.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
	&URL_SAFE,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// JOSE header of a client assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionHeader {
	/// Signature algorithm, always `RS256`.
	pub alg: String,
	/// Key identifier; omitted entirely (not `null`) when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kid: Option<String>,
}

/// Registered claims of a client assertion (RFC 7523 §3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Unique identifier for replay protection.
	pub jti: String,
	/// Issuer; the client identifier.
	pub iss: String,
	/// Subject; the client identifier.
	pub sub: String,
	/// Audience; the token endpoint URL.
	pub aud: String,
	/// Issued-at, seconds since the Unix epoch.
	pub iat: i64,
	/// Expiry, `iat + 600`.
	pub exp: i64,
}

/// Compact-serialized, signed assertion (`header.claims.signature`).
#[derive(Clone, PartialEq, Eq)]
pub struct SignedAssertion(String);
impl SignedAssertion {
	/// Returns the compact serialization. Callers must avoid logging this string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Decodes the header segment.
	pub fn header(&self) -> Result<AssertionHeader, DecodeError> {
		let segment = self.0.split('.').next().unwrap_or_default();

		Ok(serde_json::from_slice(&LENIENT_URL_SAFE.decode(segment)?)?)
	}

	/// Decodes the claims segment.
	pub fn claims(&self) -> Result<AssertionClaims, DecodeError> {
		Ok(serde_json::from_value(JsonValue::Object(decode_payload(&self.0)?))?)
	}
}
impl Debug for SignedAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SignedAssertion").field(&"<redacted>").finish()
	}
}
impl From<SignedAssertion> for String {
	fn from(value: SignedAssertion) -> Self {
		value.0
	}
}

/// Builds and signs client assertions.
#[derive(Clone)]
pub struct AssertionBuilder {
	clock: Arc<dyn Clock>,
	jti: Arc<dyn JtiSource>,
}
impl AssertionBuilder {
	/// Creates a builder backed by the system clock and random identifiers.
	pub fn new() -> Self {
		Self { clock: Arc::new(SystemClock), jti: Arc::new(RandomJti) }
	}

	/// Replaces the clock.
	pub fn with_clock(mut self, clock: impl 'static + Clock) -> Self {
		self.clock = Arc::new(clock);

		self
	}

	/// Replaces the identifier source.
	pub fn with_jti_source(mut self, jti: impl 'static + JtiSource) -> Self {
		self.jti = Arc::new(jti);

		self
	}

	/// Signs a fresh assertion for `client_id` addressed to `audience`.
	///
	/// `include_key_id` controls whether the header carries `kid`; disable it when the
	/// authorization server holds the public key itself instead of fetching a JWKS.
	pub fn build(
		&self,
		key: &KeyMaterial,
		client_id: &str,
		audience: &str,
		include_key_id: bool,
	) -> Result<SignedAssertion, SigningError> {
		obs::observe(FlowKind::ClientAssertion, "build", || {
			let header = AssertionHeader {
				alg: RS256.into(),
				kid: include_key_id.then(|| key.key_id().to_owned()),
			};
			let iat = self.clock.now().unix_timestamp();
			let claims = AssertionClaims {
				jti: self.jti.next_jti(),
				iss: client_id.to_owned(),
				sub: client_id.to_owned(),
				aud: audience.to_owned(),
				iat,
				exp: iat + ASSERTION_LIFETIME.whole_seconds(),
			};

			sign_compact(key, &header, &claims)
		})
	}
}
impl Default for AssertionBuilder {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for AssertionBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("AssertionBuilder(..)")
	}
}

fn sign_compact(
	key: &KeyMaterial,
	header: &AssertionHeader,
	claims: &AssertionClaims,
) -> Result<SignedAssertion, SigningError> {
	let header = serde_json::to_vec(header).map_err(SigningError::Encode)?;
	let claims = serde_json::to_vec(claims).map_err(SigningError::Encode)?;
	let mut token = URL_SAFE_NO_PAD.encode(header);

	token.push('.');
	token.push_str(&URL_SAFE_NO_PAD.encode(claims));

	let signature = key.sign_rs256(token.as_bytes())?;

	token.push('.');
	token.push_str(&URL_SAFE_NO_PAD.encode(signature));

	Ok(SignedAssertion(token))
}

/// Decodes the payload (second) segment of a compact JWT into a JSON object.
///
/// The signature is not checked; this exists for diagnostics only.
pub fn decode_payload(token: &str) -> Result<JsonMap<String, JsonValue>, DecodeError> {
	let segment = token.split('.').nth(1).ok_or(DecodeError::MissingPayload)?;

	match serde_json::from_slice(&LENIENT_URL_SAFE.decode(segment)?)? {
		JsonValue::Object(map) => Ok(map),
		_ => Err(DecodeError::NotAnObject),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::_preludet::*;

	const CLIENT_ID: &str = "demo-client";
	const AUDIENCE: &str = "https://auth.example.com/auth/realms/demo/protocol/openid-connect/token";

	struct CountingJti(std::sync::atomic::AtomicU64);
	impl JtiSource for CountingJti {
		fn next_jti(&self) -> String {
			format!("jti-{}", self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
		}
	}

	fn deterministic_builder() -> AssertionBuilder {
		AssertionBuilder::new()
			.with_clock(FixedClock(datetime!(2024-05-01 12:00 UTC)))
			.with_jti_source(CountingJti(Default::default()))
	}

	#[test]
	fn claims_follow_injected_sources() {
		let key = load_fixture_key("client_pkcs8.pem");
		let builder = deterministic_builder();
		let first = builder.build(&key, CLIENT_ID, AUDIENCE, true).expect("Signing should succeed.");
		let second =
			builder.build(&key, CLIENT_ID, AUDIENCE, true).expect("Signing should succeed.");
		let claims = first.claims().expect("Claims should decode.");

		assert_eq!(claims.iat, 1_714_564_800);
		assert_eq!(claims.exp, 1_714_565_400);
		assert_eq!(claims.iss, CLIENT_ID);
		assert_eq!(claims.sub, CLIENT_ID);
		assert_eq!(claims.aud, AUDIENCE);
		assert_eq!(claims.jti, "jti-0");
		assert_eq!(second.claims().expect("Claims should decode.").jti, "jti-1");
	}

	#[test]
	fn header_kid_is_omitted_not_null() {
		let key = load_fixture_key("client_pkcs8.pem");
		let token = deterministic_builder()
			.build(&key, CLIENT_ID, AUDIENCE, false)
			.expect("Signing should succeed.");
		let raw_header = token.as_str().split('.').next().expect("Token should have a header.");
		let header: JsonValue = serde_json::from_slice(
			&URL_SAFE_NO_PAD.decode(raw_header).expect("Header should be base64url."),
		)
		.expect("Header should be JSON.");

		assert_eq!(header, serde_json::json!({ "alg": "RS256" }));
	}

	#[test]
	fn header_kid_matches_key_id() {
		let key = load_fixture_key("client_pkcs8.pem");
		let token = deterministic_builder()
			.build(&key, CLIENT_ID, AUDIENCE, true)
			.expect("Signing should succeed.");
		let header = token.header().expect("Header should decode.");

		assert_eq!(header.alg, "RS256");
		assert_eq!(header.kid.as_deref(), Some(key.key_id()));
	}

	#[test]
	fn same_inputs_sign_identically() {
		let key = load_fixture_key("client_pkcs8.pem");
		let builder = AssertionBuilder::new()
			.with_clock(FixedClock(datetime!(2024-05-01 12:00 UTC)))
			.with_jti_source(FixedJti);
		let first = builder.build(&key, CLIENT_ID, AUDIENCE, true).expect("Signing should succeed.");
		let second =
			builder.build(&key, CLIENT_ID, AUDIENCE, true).expect("Signing should succeed.");

		assert_eq!(first, second);
		assert_eq!(first.as_str().split('.').count(), 3);
	}

	struct FixedJti;
	impl JtiSource for FixedJti {
		fn next_jti(&self) -> String {
			"fixed".into()
		}
	}

	#[test]
	fn decode_payload_accepts_padded_segments() {
		let token = "e30.eyJzdWIiOiJhIn0=.sig";
		let claims = decode_payload(token).expect("Padded payload should decode.");

		assert_eq!(claims["sub"], "a");
	}

	#[test]
	fn decode_payload_reports_malformed_tokens() {
		assert!(matches!(decode_payload("opaque-token"), Err(DecodeError::MissingPayload)));
		assert!(matches!(decode_payload("a.!!!.c"), Err(DecodeError::Base64(_))));
		assert!(matches!(decode_payload("a.bm90LWpzb24.c"), Err(DecodeError::Json(_))));
		assert!(matches!(decode_payload("a.WzFd.c"), Err(DecodeError::NotAnObject)));
	}

	#[test]
	fn header_reports_the_actual_decode_failure() {
		let bad_base64 = SignedAssertion("!!!.e30.sig".into());
		let not_json = SignedAssertion("bm90LWpzb24.e30.sig".into());

		assert!(matches!(bad_base64.header(), Err(DecodeError::Base64(_))));
		assert!(matches!(not_json.header(), Err(DecodeError::Json(_))));
	}
}
