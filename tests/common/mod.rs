//! Scripted collaborators shared by the integration suites.

#![allow(dead_code)]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
use serde_json::{Value, json};
// self
use credential_gateway::{
	config::{GatewayConfig, GatewayConfigBuilder},
	envelope::{ResponseEnvelope, StatusCode},
	error::TransportFailure,
	gateway::Gateway,
	notify::{Notice, Notifier},
	store::{KeyValueStore, MemoryStore, StoreError, StoreFuture},
	transport::{CallTransport, OutboundCall, TransportFuture},
	url::Url,
};

pub const CREDENTIAL_KEY: &str = "userInfo";
pub const REFRESH_CALL: &str = "refreshToken";

/// How the fake backend answers renewal calls.
#[derive(Clone, Debug)]
pub enum Renewal {
	/// Issues `token-{n}` and makes it the only accepted token.
	Rotate,
	/// Answers with an error envelope carrying `code`.
	Reject(StatusCode),
	/// Produces no envelope.
	Fail(TransportFailure),
	/// Answers success without a token.
	Empty,
}

/// In-process backend that accepts exactly one token at a time.
///
/// Calls without a bearer are rejected as unauthenticated, calls with any other bearer as
/// expired. Every call takes `latency` to answer so concurrent callers interleave.
pub struct FakeBackend {
	accepted: Mutex<Option<String>>,
	renewal: Mutex<Renewal>,
	outage: Mutex<Option<TransportFailure>>,
	expire_everything: AtomicBool,
	renewals: AtomicUsize,
	log: Mutex<Vec<OutboundCall>>,
	latency: Duration,
}
impl FakeBackend {
	pub fn new(accepted: Option<&str>) -> Self {
		Self {
			accepted: Mutex::new(accepted.map(str::to_owned)),
			renewal: Mutex::new(Renewal::Rotate),
			outage: Mutex::new(None),
			expire_everything: AtomicBool::new(false),
			renewals: AtomicUsize::new(0),
			log: Mutex::new(Vec::new()),
			latency: Duration::from_millis(20),
		}
	}

	pub fn with_renewal(self, renewal: Renewal) -> Self {
		*self.renewal.lock() = renewal;

		self
	}

	/// Every non-renewal call fails with this transport failure.
	pub fn with_outage(self, failure: TransportFailure) -> Self {
		*self.outage.lock() = Some(failure);

		self
	}

	/// Every non-renewal call is rejected as expired, even with a freshly renewed token.
	pub fn expiring_everything(self) -> Self {
		self.expire_everything.store(true, Ordering::SeqCst);

		self
	}

	pub fn renewals(&self) -> usize {
		self.renewals.load(Ordering::SeqCst)
	}

	pub fn calls_to(&self, name: &str) -> Vec<OutboundCall> {
		self.log.lock().iter().filter(|call| call.name == name).cloned().collect()
	}

	fn renew(&self, call: &OutboundCall) -> Result<ResponseEnvelope, TransportFailure> {
		let n = self.renewals.fetch_add(1, Ordering::SeqCst) + 1;

		match self.renewal.lock().clone() {
			Renewal::Rotate => {
				let token = format!("token-{n}");

				assert!(call.bearer.is_some(), "Renewal should present the stale credential.");
				*self.accepted.lock() = Some(token.clone());

				Ok(ResponseEnvelope::success(json!({ "token": token })))
			},
			Renewal::Reject(code) => Ok(ResponseEnvelope::failure(code, "Renewal refused.")),
			Renewal::Fail(failure) => Err(failure),
			Renewal::Empty => Ok(ResponseEnvelope::success(json!({}))),
		}
	}

	fn answer(&self, call: &OutboundCall) -> Result<ResponseEnvelope, TransportFailure> {
		if let Some(failure) = self.outage.lock().clone() {
			return Err(failure);
		}

		let accepted = self.accepted.lock().clone();

		match (&call.bearer, accepted) {
			(None, _) => Ok(ResponseEnvelope::failure(StatusCode::UserUnauthorized, "Sign in.")),
			(Some(bearer), Some(accepted))
				if bearer.expose() == accepted && !self.expire_everything.load(Ordering::SeqCst) =>
				Ok(route(call)),
			(Some(_), _) =>
				Ok(ResponseEnvelope::failure(StatusCode::CredentialExpired, "Token expired.")),
		}
	}
}
impl CallTransport for FakeBackend {
	fn send(&self, call: OutboundCall) -> TransportFuture<'_> {
		Box::pin(async move {
			self.log.lock().push(call.clone());
			tokio::time::sleep(self.latency).await;

			if call.name == REFRESH_CALL { self.renew(&call) } else { self.answer(&call) }
		})
	}
}

fn route(call: &OutboundCall) -> ResponseEnvelope {
	match call.name.as_str() {
		"getProfile" => ResponseEnvelope::success(json!({ "id": 7, "username": "ada" })),
		"getSettings" => ResponseEnvelope::success(json!({ "theme": 5 })),
		"deleteAccount" => ResponseEnvelope::failure(StatusCode::Permission, "Permission denied."),
		_ => ResponseEnvelope { status_code: 0, payload: None, message: String::new() },
	}
}

/// Notifier that remembers every notice.
#[derive(Default)]
pub struct RecordingNotifier(Mutex<Vec<Notice>>);
impl RecordingNotifier {
	pub fn notices(&self) -> Vec<Notice> {
		self.0.lock().clone()
	}
}
impl Notifier for RecordingNotifier {
	fn notify(&self, notice: Notice) {
		self.0.lock().push(notice);
	}
}

/// Memory-backed store whose operations can be made to fail, with a slow, counted read path.
#[derive(Default)]
pub struct FlakyStore {
	inner: MemoryStore,
	fail_reads: AtomicBool,
	fail_writes: AtomicBool,
	fail_deletes: AtomicBool,
	reads: AtomicUsize,
}
impl FlakyStore {
	pub fn seeded(value: Value) -> Self {
		Self { inner: MemoryStore::seeded(CREDENTIAL_KEY, value), ..Default::default() }
	}

	pub fn failing_reads(self) -> Self {
		self.fail_reads.store(true, Ordering::SeqCst);

		self
	}

	pub fn failing_writes(self) -> Self {
		self.fail_writes.store(true, Ordering::SeqCst);

		self
	}

	pub fn failing_deletes(self) -> Self {
		self.fail_deletes.store(true, Ordering::SeqCst);

		self
	}

	pub fn reads(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}

	pub fn peek(&self) -> Option<Value> {
		self.inner.peek(CREDENTIAL_KEY)
	}
}
impl KeyValueStore for FlakyStore {
	fn read<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
		Box::pin(async move {
			self.reads.fetch_add(1, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(10)).await;

			if self.fail_reads.load(Ordering::SeqCst) {
				return Err(StoreError::Backend { message: "config store offline".into() });
			}

			self.inner.read(key).await
		})
	}

	fn write<'a>(&'a self, key: &'a str, value: Value) -> StoreFuture<'a, ()> {
		if self.fail_writes.load(Ordering::SeqCst) {
			return Box::pin(async {
				Err(StoreError::Backend { message: "config store is read-only".into() })
			});
		}

		self.inner.write(key, value)
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		if self.fail_deletes.load(Ordering::SeqCst) {
			return Box::pin(async {
				Err(StoreError::Backend { message: "config store is read-only".into() })
			});
		}

		self.inner.delete(key)
	}
}

/// Persisted record for the signed-in fixture user.
pub fn persisted_credential(token: &str) -> Value {
	json!({
		"id": 1,
		"username": "ada",
		"email": "ada@example.com",
		"token": token,
	})
}

pub fn config() -> GatewayConfig {
	config_with(|builder| builder)
}

pub fn config_with(
	customize: impl FnOnce(GatewayConfigBuilder) -> GatewayConfigBuilder,
) -> GatewayConfig {
	let base = Url::parse("http://127.0.0.1/api/").expect("Failed to parse fixture base URL.");

	customize(GatewayConfig::builder(base))
		.build()
		.expect("Fixture configuration should validate.")
}

pub fn gateway(
	config: GatewayConfig,
	backend: Arc<FakeBackend>,
	store: Arc<FlakyStore>,
	notifier: Arc<RecordingNotifier>,
) -> Gateway<FakeBackend> {
	Gateway::with_transport(config, store, backend, notifier)
}
