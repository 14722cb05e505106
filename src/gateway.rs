//! Gateway facade and the collaborators it orchestrates.
//!
//! [`Gateway`] is the only type application code needs. Each call reads the current credential,
//! dispatches once, and interprets the classified outcome:
//!
//! - success and domain envelopes go back to the caller untouched;
//! - `Unauthenticated` ends the session (credential cleared, notice shown, [`Error::AuthRequired`]);
//! - `CredentialExpired` triggers one shared renewal followed by exactly one retry;
//! - transport failures show a notice classified by kind and surface as [`Error::Transport`].

pub mod credential;
pub mod dispatch;
pub mod refresh;

pub use credential::*;
pub use dispatch::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::GatewayConfig,
	envelope::ResponseEnvelope,
	error::{TransportFailure, TransportFailureKind},
	notify::{Notice, Notifier, Severity},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::KeyValueStore,
	transport::CallTransport,
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's HTTP transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Remote operation plus its named parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallSpec {
	/// Remote operation name.
	pub name: String,
	/// Named parameters sent with the call.
	#[serde(default)]
	pub params: Map<String, Value>,
}
impl CallSpec {
	/// Creates a call without parameters.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), params: Map::new() }
	}

	/// Adds or replaces one parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}

	/// Replaces every parameter.
	pub fn with_params(mut self, params: Map<String, Value>) -> Self {
		self.params = params;

		self
	}
}

/// Which attempt of a logical call is being dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attempt {
	/// Original dispatch.
	First,
	/// The single retry after a renewal.
	Retried,
}

/// A call together with its retry marker.
#[derive(Clone, Debug, PartialEq)]
pub struct CallContext {
	/// What to call.
	pub spec: CallSpec,
	/// Retry marker; a retried call never triggers another renewal.
	pub attempt: Attempt,
}
impl CallContext {
	/// Wraps `spec` as a first attempt.
	pub fn first(spec: CallSpec) -> Self {
		Self { spec, attempt: Attempt::First }
	}

	/// Marks the context as retried.
	pub fn retried(self) -> Self {
		Self { attempt: Attempt::Retried, ..self }
	}

	/// Returns `true` once the call has been retried.
	pub fn is_retried(&self) -> bool {
		self.attempt == Attempt::Retried
	}
}

/// Authenticated call gateway.
///
/// Cloning is cheap; clones share the credential store, the renewal coordinator, and the
/// notifier, so single-flight renewal holds across every clone.
pub struct Gateway<T>
where
	T: ?Sized + CallTransport,
{
	credentials: Arc<CredentialStore>,
	dispatcher: CallDispatcher<T>,
	coordinator: Arc<RefreshCoordinator<T>>,
	notifier: Arc<dyn Notifier>,
	config: Arc<GatewayConfig>,
}
impl<T> Gateway<T>
where
	T: ?Sized + CallTransport,
{
	/// Creates a gateway over a caller-provided transport using the standard status-code table.
	pub fn with_transport(
		config: GatewayConfig,
		store: Arc<dyn KeyValueStore>,
		transport: impl Into<Arc<T>>,
		notifier: Arc<dyn Notifier>,
	) -> Self {
		let credentials = Arc::new(CredentialStore::new(store, config.credential_key.as_str()));
		let dispatcher =
			CallDispatcher::<T>::new(transport.into(), Arc::new(DefaultEnvelopeClassifier));
		let coordinator = Self::coordinator(&config, &dispatcher, &credentials);

		Self { credentials, dispatcher, coordinator, notifier, config: Arc::new(config) }
	}

	/// Replaces the envelope classifier for both application and renewal calls.
	pub fn with_classifier(mut self, classifier: Arc<dyn EnvelopeClassifier>) -> Self {
		self.dispatcher = CallDispatcher::new(self.dispatcher.transport().clone(), classifier);
		self.coordinator = Self::coordinator(&self.config, &self.dispatcher, &self.credentials);

		self
	}

	fn coordinator(
		config: &GatewayConfig,
		dispatcher: &CallDispatcher<T>,
		credentials: &Arc<CredentialStore>,
	) -> Arc<RefreshCoordinator<T>> {
		Arc::new(
			RefreshCoordinator::new(
				dispatcher.clone(),
				credentials.clone(),
				config.refresh_call.as_str(),
			)
			.with_logout_on_transport_failure(config.logout_on_refresh_transport_failure),
		)
	}

	/// Active configuration.
	pub fn config(&self) -> &GatewayConfig {
		&self.config
	}

	/// Credential store shared by every clone of this gateway.
	pub fn credentials(&self) -> &Arc<CredentialStore> {
		&self.credentials
	}

	/// Renewal counters.
	pub fn refresh_metrics(&self) -> &Arc<RefreshMetrics> {
		self.coordinator.metrics()
	}

	/// Current credential, if signed in.
	pub async fn credential(&self) -> Option<Credential> {
		self.credentials.get().await
	}

	/// Stores a freshly authenticated credential.
	pub async fn sign_in(&self, credential: Credential) -> Result<()> {
		self.credentials.set(credential).await?;

		Ok(())
	}

	/// Clears the credential. No notice is shown for an explicit logout.
	pub async fn sign_out(&self) -> Result<()> {
		self.credentials.clear().await?;

		Ok(())
	}

	/// Performs `spec` and decodes the success payload into `R`.
	///
	/// Domain errors become [`Error::Domain`]; a missing payload decodes from `null`.
	pub async fn call<R>(&self, spec: CallSpec) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let payload = self.call_envelope(spec).await?.into_result()?.unwrap_or(Value::Null);

		serde_path_to_error::deserialize(payload).map_err(|source| Error::Decode { source })
	}

	/// Performs `spec` and returns the success or domain envelope as received.
	///
	/// Authentication, renewal and transport rules still apply; only domain errors are left
	/// for the caller to interpret.
	pub async fn call_envelope(&self, spec: CallSpec) -> Result<ResponseEnvelope> {
		const KIND: CallKind = CallKind::Call;

		let span = CallSpan::call(&spec.name);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.run(CallContext::first(spec))).await;
		let outcome = match &result {
			Ok(envelope) if envelope.is_success() => CallOutcome::Success,
			_ => CallOutcome::Failure,
		};

		obs::record_call_outcome(KIND, outcome);

		result
	}

	async fn run(&self, mut call: CallContext) -> Result<ResponseEnvelope> {
		let mut credential = self.credentials.get().await;

		loop {
			match self.dispatcher.dispatch(&call, credential.as_ref()).await {
				Ok(envelope) => return Ok(envelope),
				Err(e @ DispatchError::Unauthenticated { .. }) =>
					return Err(self.end_session(e).await),
				Err(e @ DispatchError::CredentialExpired { .. }) if call.is_retried() => {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						call = %call.spec.name,
						"Renewed credential was rejected as expired."
					);

					return Err(self.end_session(e).await);
				},
				Err(DispatchError::CredentialExpired { .. }) => {
					let stale = credential.as_ref().map(|credential| &credential.token);

					match self.coordinator.request_refresh_for(stale).await {
						Ok(fresh) => {
							credential = Some(fresh);
							call = call.retried();
						},
						Err(failure) => return Err(self.renewal_failed(failure)),
					}
				},
				Err(DispatchError::Transport(failure)) => {
					self.notify_transport(&failure);

					return Err(failure.into());
				},
			}
		}
	}

	/// Clears the credential after a rejection and tells the user to sign in again.
	async fn end_session(&self, reason: DispatchError) -> Error {
		if let Err(_e) = self.credentials.clear().await {
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %_e, "Failed to delete the persisted credential.");
		}

		self.notify(&self.config.notices.session_expired);

		Error::auth_required(reason)
	}

	/// Only the episode's initiator notifies, so one failed renewal yields one notice.
	fn renewal_failed(&self, failure: RefreshFailure) -> Error {
		match failure.cause {
			RefreshError::Transport(transport) if !failure.logged_out => {
				if failure.initiator {
					self.notify_transport(&transport);
				}

				transport.into()
			},
			cause => {
				if failure.initiator {
					self.notify(&self.config.notices.session_expired);
				}

				Error::auth_required(cause)
			},
		}
	}

	fn notify_transport(&self, failure: &TransportFailure) {
		let notices = &self.config.notices;
		let message = match failure.kind {
			TransportFailureKind::Timeout => &notices.timeout,
			TransportFailureKind::Unreachable => &notices.unreachable,
			TransportFailureKind::Other => &notices.transport_other,
		};

		self.notify(message);
	}

	fn notify(&self, message: &str) {
		self.notifier.notify(Notice::new(message, self.config.notice_duration_ms, Severity::Error));
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway that talks HTTP to `config.base_url`.
	pub fn new(
		config: GatewayConfig,
		store: Arc<dyn KeyValueStore>,
		notifier: Arc<dyn Notifier>,
	) -> Result<Self> {
		let transport = ReqwestTransport::new(config.base_url.clone(), config.request_timeout)?;

		Ok(Self::with_transport(config, store, transport, notifier))
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + CallTransport,
{
	fn clone(&self) -> Self {
		Self {
			credentials: self.credentials.clone(),
			dispatcher: self.dispatcher.clone(),
			coordinator: self.coordinator.clone(),
			notifier: self.notifier.clone(),
			config: self.config.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + CallTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("base_url", &self.config.base_url.as_str())
			.field("credentials", &self.credentials)
			.field("coordinator", &self.coordinator)
			.finish()
	}
}
