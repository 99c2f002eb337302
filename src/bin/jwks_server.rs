//! Serves the public half of an RSA key as a JWKS document at `/.well-known/jwks.json`.

// std
use std::net::SocketAddr;
// crates.io
use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
// self
use oauth2_jwt_bearer::{
	config::{DEFAULT_BIND, PublisherConfig},
	publisher::{self, JwksPublisher},
};

/// Publish the JWKS for a private key so an authorization server can verify client assertions.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
	/// PEM-encoded RSA private key whose public half is published.
	#[arg(long, env = "JWT_BEARER_KEY_PATH")]
	read_key: String,
	/// Listen address.
	#[arg(long, default_value_t = DEFAULT_BIND)]
	bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let cli = Cli::parse();
	let config = PublisherConfig::new(cli.read_key).with_bind(cli.bind);
	let jwks = JwksPublisher::from_config(&config)?;
	let bound = jwks.bind(config.bind).await?;

	bound
		.serve_with_shutdown(publisher::shutdown_on(tokio::signal::ctrl_c()))
		.await?;

	Ok(())
}
