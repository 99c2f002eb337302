//! Walks the full private-key-JWT exchange against a mock authorization server: load the fixture
//! key, sign an assertion, post it, and print the annotated token response.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_jwt_bearer::{config::ClientConfig, flows::JwtBearerFlow, publisher::JwksPublisher};

const ACCESS_TOKEN: &str =
	"eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJzZXJ2aWNlLWFjY291bnQtZGVtbyIsImF6cCI6ImRlbW8tY2xpZW50In0.c2ln";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/realms/demo/protocol/openid-connect/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"{ACCESS_TOKEN}\",\"token_type\":\"Bearer\",\"expires_in\":300}}"
			));
		})
		.await;
	let key_path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/client_pkcs8.pem");
	let config = ClientConfig::builder()
		.auth_host(server.base_url())
		.realm("demo")
		.client_id("demo-client")
		.key_path(key_path)
		.build()?;
	let flow = JwtBearerFlow::from_config(config)?.with_inspector(|audit| {
		let message = serde_json::to_string_pretty(audit).unwrap_or_else(|_| audit.to_string());

		println!("Requesting access token using this message:\n{message}");
	});
	let publisher = JwksPublisher::new(flow.key())?;

	println!("Published key set: {}.", String::from_utf8_lossy(publisher.document()));

	let response = flow.request_access_token().await?;

	println!("Token response: {}.", serde_json::to_string_pretty(&response.report())?);
	println!("Authorization header: {}.", response.bearer_authorization());

	token_mock.assert_async().await;

	Ok(())
}
