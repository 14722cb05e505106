#![cfg(feature = "reqwest")]

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
use serde_json::{Map, Value, json};
// self
use credential_gateway::{
	auth::BearerToken,
	config::GatewayConfig,
	envelope::StatusCode,
	error::TransportFailureKind,
	gateway::{CallSpec, ReqwestGateway},
	notify::SilentNotifier,
	store::MemoryStore,
	transport::{CallTransport, OutboundCall, ReqwestTransport},
	url::Url,
};

fn transport(server: &MockServer, timeout: Duration) -> ReqwestTransport {
	let base = Url::parse(&server.url("/api/")).expect("Mock base URL should parse.");

	ReqwestTransport::new(base, timeout).expect("Reqwest transport should build.")
}

fn call(name: &str, params: Value, bearer: Option<&str>) -> OutboundCall {
	let params = match params {
		Value::Object(map) => map,
		_ => Map::new(),
	};

	OutboundCall { name: name.into(), params, bearer: bearer.map(BearerToken::new) }
}

#[tokio::test]
async fn posts_params_with_bearer_and_returns_the_envelope() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/getProfile")
				.header("authorization", "Bearer token-0")
				.json_body(json!({ "verbose": true }));
			then.status(200).json_body(json!({ "code": 0, "data": { "id": 7 }, "message": "" }));
		})
		.await;
	let envelope = transport(&server, ReqwestTransport::DEFAULT_TIMEOUT)
		.send(call("getProfile", json!({ "verbose": true }), Some("token-0")))
		.await?;

	mock.assert_async().await;
	assert!(envelope.is_success());
	assert_eq!(envelope.payload, Some(json!({ "id": 7 })));

	Ok(())
}

#[tokio::test]
async fn error_envelopes_pass_through_regardless_of_http_status() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/getProfile");
			then.status(401).json_body(json!({ "statusCode": 1202, "message": "Token expired." }));
		})
		.await;

	let envelope = transport(&server, ReqwestTransport::DEFAULT_TIMEOUT)
		.send(call("getProfile", Value::Null, Some("token-0")))
		.await?;

	assert_eq!(envelope.status(), StatusCode::CredentialExpired);
	assert_eq!(envelope.payload, None);

	Ok(())
}

#[tokio::test]
async fn non_envelope_failures_keep_the_http_status() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/getProfile");
			then.status(502).body("Bad gateway");
		})
		.await;

	let failure = transport(&server, ReqwestTransport::DEFAULT_TIMEOUT)
		.send(call("getProfile", Value::Null, None))
		.await
		.expect_err("HTML error pages are not envelopes.");

	assert_eq!(failure.kind, TransportFailureKind::Other);
	assert_eq!(failure.status, Some(502));
}

#[tokio::test]
async fn slow_backends_time_out() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/getProfile");
			then.status(200).delay(Duration::from_millis(500)).json_body(json!({ "code": 0 }));
		})
		.await;

	let failure = transport(&server, Duration::from_millis(50))
		.send(call("getProfile", Value::Null, None))
		.await
		.expect_err("The request should exceed its timeout.");

	assert_eq!(failure.kind, TransportFailureKind::Timeout);
}

#[tokio::test]
async fn refused_connections_are_unreachable() {
	let base = Url::parse("http://127.0.0.1:1/api/").expect("Base URL should parse.");
	let failure = ReqwestTransport::new(base, ReqwestTransport::DEFAULT_TIMEOUT)
		.expect("Reqwest transport should build.")
		.send(call("getProfile", Value::Null, None))
		.await
		.expect_err("Nothing listens on port 1.");

	assert_eq!(failure.kind, TransportFailureKind::Unreachable);
}

#[tokio::test]
async fn gateway_renews_over_http_and_retries_once() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/getProfile").header("authorization", "Bearer stale");
			then.status(200).json_body(json!({ "code": 1202, "message": "Token expired." }));
		})
		.await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/refreshToken").header("authorization", "Bearer stale");
			then.status(200).json_body(json!({ "code": 0, "data": { "token": "fresh" } }));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/getProfile").header("authorization", "Bearer fresh");
			then.status(200).json_body(json!({ "code": 0, "data": { "id": 7 } }));
		})
		.await;
	let config = GatewayConfig::builder(Url::parse(&server.url("/api/"))?).build()?;
	let store = MemoryStore::seeded(
		GatewayConfig::DEFAULT_CREDENTIAL_KEY,
		json!({ "id": 1, "username": "ada", "email": "ada@example.com", "token": "stale" }),
	);
	let gateway = ReqwestGateway::new(config, Arc::new(store.clone()), Arc::new(SilentNotifier))?;
	let profile: Value = gateway.call(CallSpec::new("getProfile")).await?;

	assert_eq!(profile, json!({ "id": 7 }));
	stale.assert_hits_async(1).await;
	renewal.assert_hits_async(1).await;
	fresh.assert_hits_async(1).await;
	assert_eq!(
		store.peek(GatewayConfig::DEFAULT_CREDENTIAL_KEY).map(|record| record["token"].clone()),
		Some(json!("fresh"))
	);

	Ok(())
}
