//! Private-key-JWT client authentication for OAuth 2.0 (RFC 7521/7523): sign client assertions
//! with an RSA key, exchange them for access tokens, and publish the matching JWKS.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod assertion;
pub mod config;
pub mod error;
pub mod exchange;
pub mod flows;
pub mod http;
pub mod key;
pub mod obs;
pub mod publisher;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{exchange::TokenExchangeClient, http::ReqwestHttpClient, key::KeyMaterial};

	/// Default outbound timeout applied by test transports.
	pub const TEST_TIMEOUT: StdDuration = StdDuration::from_secs(5);

	/// Resolves a file under `tests/fixtures`.
	pub fn fixture_path(name: &str) -> PathBuf {
		PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
	}

	/// Loads a PEM fixture into [`KeyMaterial`].
	pub fn load_fixture_key(name: &str) -> KeyMaterial {
		KeyMaterial::load(fixture_path(name)).expect("Fixture key should load successfully.")
	}

	/// Builds a reqwest transport with a short timeout for tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		ReqwestHttpClient::with_timeout(TEST_TIMEOUT)
			.expect("Failed to build Reqwest client for tests.")
	}

	/// Constructs a [`TokenExchangeClient`] backed by the reqwest test transport.
	pub fn build_reqwest_test_exchange() -> TokenExchangeClient<ReqwestHttpClient> {
		TokenExchangeClient::new(test_reqwest_http_client())
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		net::SocketAddr,
		path::{Path, PathBuf},
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(feature = "cli")] use {clap as _, color_eyre as _, tracing_subscriber as _};
#[cfg(test)] use {color_eyre as _, httpmock as _, jsonwebtoken as _, tracing_subscriber as _};
