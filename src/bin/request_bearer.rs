//! Requests an access token with a private-key-JWT client assertion and prints the exchange.

// crates.io
use clap::Parser;
use color_eyre::{Result, eyre::WrapErr};
use tracing_subscriber::EnvFilter;
// self
use oauth2_jwt_bearer::{
	config::ClientConfig,
	error::{Error, TokenExchangeError},
	flows::JwtBearerFlow,
};

/// Request an OAuth 2.0 access token using a signed JWT client assertion.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
	/// Authorization server base URL, e.g. `https://auth.example.com`.
	#[arg(long, env = "JWT_BEARER_AUTH_HOST")]
	auth_host: String,
	/// Realm on the authorization server.
	#[arg(long, env = "JWT_BEARER_REALM")]
	realm: String,
	/// OAuth 2.0 client identifier.
	#[arg(long, env = "JWT_BEARER_CLIENT_ID")]
	client_id: String,
	/// PEM-encoded RSA private key.
	#[arg(long, env = "JWT_BEARER_KEY_PATH")]
	key_path: String,
	/// Omit `kid` from the assertion header; use when the server stores your public key.
	#[arg(long)]
	no_self_hosted: bool,
	/// Token endpoint timeout in seconds.
	#[arg(long, default_value_t = 30)]
	timeout_secs: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let cli = Cli::parse();
	let config = ClientConfig::builder()
		.auth_host(cli.auth_host)
		.realm(cli.realm)
		.client_id(cli.client_id)
		.key_path(cli.key_path)
		.self_hosted(!cli.no_self_hosted)
		.timeout(std::time::Duration::from_secs(cli.timeout_secs))
		.build()
		.wrap_err("Invalid client configuration.")?;
	let flow = JwtBearerFlow::from_config(config)?.with_inspector(|audit| {
		println!("Requesting access token using this message:");

		match serde_json::to_string_pretty(audit) {
			Ok(rendered) => println!("{rendered}"),
			Err(_) => println!("{audit}"),
		}
	});

	match flow.request_access_token().await {
		Ok(response) => {
			println!("{}", serde_json::to_string_pretty(&response.report())?);

			Ok(())
		},
		Err(Error::TokenExchange(TokenExchangeError::HttpStatus { status, body })) => {
			match serde_json::from_str::<serde_json::Value>(&body) {
				Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
				Err(_) => println!("{body}"),
			}

			Err(color_eyre::eyre::eyre!("Token endpoint answered with HTTP {status}."))
		},
		Err(e) => Err(e.into()),
	}
}
