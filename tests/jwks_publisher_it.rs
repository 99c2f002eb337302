// std
use std::{
	io::Write,
	sync::{Arc, Mutex},
};
// crates.io
use tokio::{sync::oneshot, task::JoinSet};
use tracing_subscriber::{EnvFilter, fmt::MakeWriter, util::SubscriberInitExt};
// self
use oauth2_jwt_bearer::{
	_preludet::*,
	config::PublisherConfig,
	error::ServeError,
	key::{Jwks, rsa_thumbprint},
	publisher::{JWKS_PATH, JwksPublisher},
	reqwest::{StatusCode, header::CONTENT_TYPE},
};

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);
impl LogBuffer {
	fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock().expect("Log buffer lock should not be poisoned."))
			.into_owned()
	}
}
impl Write for LogBuffer {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.0.lock().expect("Log buffer lock should not be poisoned.").extend_from_slice(buf);

		Ok(buf.len())
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}
impl<'a> MakeWriter<'a> for LogBuffer {
	type Writer = Self;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}

fn loopback() -> SocketAddr {
	SocketAddr::from(([127, 0, 0, 1], 0))
}

#[tokio::test]
async fn serves_single_key_document() {
	let config = PublisherConfig::new(fixture_path("client_pkcs8.pem")).with_bind(loopback());
	let publisher = JwksPublisher::from_config(&config).expect("Publisher should build.");
	let bound = publisher.bind(config.bind).await.expect("Ephemeral bind should succeed.");
	let addr = bound.local_addr();
	let (stop, stopped) = oneshot::channel::<()>();
	let server = tokio::spawn(bound.serve_with_shutdown(async move {
		let _ = stopped.await;
	}));
	let client = test_reqwest_http_client().0;
	let response = client
		.get(format!("http://{addr}{JWKS_PATH}"))
		.send()
		.await
		.expect("JWKS request should complete.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
		Some("application/json")
	);

	let body = response.bytes().await.expect("Body should be readable.");
	let jwks = serde_json::from_slice::<Jwks>(&body).expect("Body should be a JWKS document.");
	let key = &jwks.keys[0];

	assert_eq!(jwks.keys.len(), 1);
	assert_eq!(&jwks, publisher.public_key_set());
	assert_eq!(key.kid.as_deref(), Some(rsa_thumbprint(&key.n, &key.e).as_str()));
	assert!(jwks.find(&key.thumbprint()).is_some());

	let missing = client
		.get(format!("http://{addr}/jwks.json"))
		.send()
		.await
		.expect("Request should complete.");

	assert_eq!(missing.status(), StatusCode::NOT_FOUND);

	let _ = stop.send(());

	server
		.await
		.expect("Server task should not panic.")
		.expect("Server should shut down cleanly.");
}

#[tokio::test]
async fn repeated_requests_return_identical_bytes() {
	let publisher = JwksPublisher::new(&load_fixture_key("client_pkcs1.pem"))
		.expect("Publisher should build.");
	let bound = publisher.bind(loopback()).await.expect("Ephemeral bind should succeed.");
	let url = format!("http://{}{JWKS_PATH}", bound.local_addr());
	let server = tokio::spawn(bound.serve());
	let client = test_reqwest_http_client().0;
	let mut bodies = Vec::new();

	for _ in 0..3 {
		let body = client
			.get(&url)
			.send()
			.await
			.expect("JWKS request should complete.")
			.bytes()
			.await
			.expect("Body should be readable.");

		bodies.push(body);
	}

	assert!(bodies.iter().all(|body| body.as_ref() == publisher.document()));

	server.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_document() {
	let publisher = JwksPublisher::new(&load_fixture_key("client_pkcs8.pem"))
		.expect("Publisher should build.");
	let bound = publisher.bind(loopback()).await.expect("Ephemeral bind should succeed.");
	let url = format!("http://{}{JWKS_PATH}", bound.local_addr());
	let server = tokio::spawn(bound.serve());
	let client = test_reqwest_http_client().0;
	let mut requests = JoinSet::new();

	for _ in 0..32 {
		let client = client.clone();
		let url = url.clone();

		requests.spawn(async move {
			let response = client.get(url).send().await.expect("JWKS request should complete.");
			let status = response.status();
			let body = response.bytes().await.expect("Body should be readable.");

			(status, body)
		});
	}

	let mut completed = 0;

	while let Some(joined) = requests.join_next().await {
		let (status, body) = joined.expect("Request task should not panic.");

		assert_eq!(status, StatusCode::OK);
		assert_eq!(body.as_ref(), publisher.document());

		completed += 1;
	}

	assert_eq!(completed, 32);

	server.abort();
}

#[cfg(feature = "tracing")]
#[tokio::test]
async fn each_request_is_logged_at_info() {
	let log = LogBuffer::default();
	let _guard = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::new("info"))
		.with_ansi(false)
		.with_writer(log.clone())
		.finish()
		.set_default();
	let publisher = JwksPublisher::new(&load_fixture_key("client_pkcs8.pem"))
		.expect("Publisher should build.");
	let bound = publisher.bind(loopback()).await.expect("Ephemeral bind should succeed.");
	let addr = bound.local_addr();
	let (stop, stopped) = oneshot::channel::<()>();
	let server = tokio::spawn(bound.serve_with_shutdown(async move {
		let _ = stopped.await;
	}));
	let response = test_reqwest_http_client()
		.0
		.get(format!("http://{addr}{JWKS_PATH}"))
		.send()
		.await
		.expect("JWKS request should complete.");

	assert_eq!(response.status(), StatusCode::OK);

	let _ = stop.send(());

	server
		.await
		.expect("Server task should not panic.")
		.expect("Server should shut down cleanly.");

	let logged = log.contents();

	assert!(logged.contains("JWKS publisher listening."), "{logged}");
	assert!(logged.contains(&format!("path={JWKS_PATH}")), "{logged}");
	assert!(logged.contains("method=GET"), "{logged}");
	assert!(logged.contains("remote=127.0.0.1:"), "{logged}");
	assert!(logged.contains("status=200"), "{logged}");
}

#[tokio::test]
async fn occupied_port_fails_to_bind() {
	let publisher = JwksPublisher::new(&load_fixture_key("client_pkcs8.pem"))
		.expect("Publisher should build.");
	let first = publisher.bind(loopback()).await.expect("Ephemeral bind should succeed.");
	let err = publisher
		.bind(first.local_addr())
		.await
		.expect_err("Binding an occupied port must fail.");

	match err {
		ServeError::Bind { addr, .. } => assert_eq!(addr, first.local_addr()),
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[test]
fn missing_key_aborts_startup() {
	let config = PublisherConfig::new(fixture_path("absent.pem"));
	let err = JwksPublisher::from_config(&config).expect_err("Missing key must abort startup.");

	assert!(err.to_string().contains("openssl genpkey"));
}
