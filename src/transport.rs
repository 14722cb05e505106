//! Transport primitives for outbound calls.
//!
//! [`CallTransport`] is the gateway's only dependency on whatever actually executes a call: the
//! native host process, an HTTP stack, or a scripted fake in tests. Implementations return the
//! envelope the remote side produced, or a [`TransportFailure`] when no envelope exists.

// std
use std::time::Duration;
// self
use crate::{
	_prelude::*,
	auth::BearerToken,
	envelope::ResponseEnvelope,
	error::{TransportFailure, TransportFailureKind},
};

/// Boxed future returned by [`CallTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ResponseEnvelope, TransportFailure>> + 'a + Send>>;

/// One outbound call attempt as handed to the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundCall {
	/// Remote operation name.
	pub name: String,
	/// Named parameters.
	pub params: Map<String, Value>,
	/// Credential attached to the call, if any.
	pub bearer: Option<BearerToken>,
}

/// Executes outbound calls.
///
/// Implementations own their timeout policy and must never retry on their own; the gateway
/// decides what happens after a failure.
pub trait CallTransport
where
	Self: 'static + Send + Sync,
{
	/// Performs exactly one call attempt.
	fn send(&self, call: OutboundCall) -> TransportFuture<'_>;
}

/// HTTP transport: `POST {base_url}/{name}` with the params as JSON body.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	base_url: Url,
	timeout: Duration,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

	/// Builds a transport with a fresh reqwest client.
	pub fn new(base_url: Url, timeout: Duration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().build()?;

		Ok(Self::with_client(client, base_url, timeout))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, base_url: Url, timeout: Duration) -> Self {
		Self { client, base_url, timeout }
	}

	fn endpoint(&self, name: &str) -> Result<Url, TransportFailure> {
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|_| TransportFailure::other("Base URL cannot carry call names."))?
			.pop_if_empty()
			.push(name);

		Ok(url)
	}

	async fn execute(&self, call: OutboundCall) -> Result<ResponseEnvelope, TransportFailure> {
		use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

		let url = self.endpoint(&call.name)?;
		let body = serde_json::to_vec(&call.params).map_err(|e| {
			TransportFailure::other(format!("Failed to encode params for `{}`: {e}", call.name))
		})?;
		let mut request = self
			.client
			.post(url)
			.timeout(self.timeout)
			.header(CONTENT_TYPE, "application/json")
			.body(body);

		if let Some(bearer) = &call.bearer {
			request = request.header(AUTHORIZATION, bearer.header_value());
		}

		let response = request.send().await.map_err(map_reqwest_error)?;
		let status = response.status();
		let bytes = response.bytes().await.map_err(map_reqwest_error)?;

		match serde_json::from_slice::<ResponseEnvelope>(&bytes) {
			Ok(envelope) => Ok(envelope),
			Err(_) if !status.is_success() => Err(TransportFailure::other(format!(
				"Backend answered HTTP {status} without an envelope."
			))
			.with_status(status.as_u16())),
			Err(e) => Err(TransportFailure::other(format!(
				"Backend returned a malformed envelope: {e}"
			))
			.with_status(status.as_u16())),
		}
	}
}
#[cfg(feature = "reqwest")]
impl CallTransport for ReqwestTransport {
	fn send(&self, call: OutboundCall) -> TransportFuture<'_> {
		Box::pin(self.execute(call))
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> TransportFailure {
	let kind = if err.is_timeout() {
		TransportFailureKind::Timeout
	} else if err.is_connect() {
		TransportFailureKind::Unreachable
	} else {
		TransportFailureKind::Other
	};
	let failure = TransportFailure::new(kind, err.to_string());

	match err.status() {
		Some(status) => failure.with_status(status.as_u16()),
		None => failure,
	}
}
