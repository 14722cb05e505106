//! Single-attempt call execution and envelope classification.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	envelope::{ResponseEnvelope, StatusCode},
	error::{TransportFailure, TransportFailureKind},
	gateway::CallContext,
	transport::{CallTransport, OutboundCall},
};

/// Classified failure of one call attempt.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DispatchError {
	/// The backend does not accept the caller's credential (or the caller has none).
	#[error("Caller is not authenticated: {message}")]
	Unauthenticated {
		/// Message carried by the envelope.
		message: String,
	},
	/// The credential has expired and may be renewed.
	#[error("Credential expired: {message}")]
	CredentialExpired {
		/// Message carried by the envelope.
		message: String,
	},
	/// No envelope was produced.
	#[error(transparent)]
	Transport(#[from] TransportFailure),
}

/// Gateway-relevant meaning of an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeClass {
	/// Success or a domain error the application handles itself.
	Passthrough,
	/// Credential rejected.
	Unauthenticated,
	/// Credential expired; renewal may help.
	CredentialExpired,
	/// The host proxied a call and reports a transport failure through the envelope.
	Transport(TransportFailureKind),
}

/// Strategy hook mapping envelope status codes onto [`EnvelopeClass`].
///
/// Backends that signal authentication problems through different codes plug in their own
/// classifier; everything else in the gateway stays unchanged.
pub trait EnvelopeClassifier
where
	Self: Send + Sync,
{
	/// Classifies `envelope`.
	fn classify(&self, envelope: &ResponseEnvelope) -> EnvelopeClass;
}

/// Classifier for the host's standard code table.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEnvelopeClassifier;
impl EnvelopeClassifier for DefaultEnvelopeClassifier {
	fn classify(&self, envelope: &ResponseEnvelope) -> EnvelopeClass {
		match envelope.status() {
			StatusCode::UserUnauthorized => EnvelopeClass::Unauthenticated,
			StatusCode::CredentialExpired => EnvelopeClass::CredentialExpired,
			StatusCode::NetworkTimeout => EnvelopeClass::Transport(TransportFailureKind::Timeout),
			StatusCode::NetworkUnreachable =>
				EnvelopeClass::Transport(TransportFailureKind::Unreachable),
			StatusCode::Network => EnvelopeClass::Transport(TransportFailureKind::Other),
			_ => EnvelopeClass::Passthrough,
		}
	}
}

/// Executes exactly one call attempt and classifies the outcome.
///
/// The dispatcher never retries and never touches the credential store.
pub struct CallDispatcher<T>
where
	T: ?Sized + CallTransport,
{
	transport: Arc<T>,
	classifier: Arc<dyn EnvelopeClassifier>,
}
impl<T> CallDispatcher<T>
where
	T: ?Sized + CallTransport,
{
	/// Creates a dispatcher over `transport` using `classifier`.
	pub fn new(transport: Arc<T>, classifier: Arc<dyn EnvelopeClassifier>) -> Self {
		Self { transport, classifier }
	}

	/// Transport the dispatcher sends through.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Sends `call`, attaching `credential` when present.
	pub async fn dispatch(
		&self,
		call: &CallContext,
		credential: Option<&Credential>,
	) -> Result<ResponseEnvelope, DispatchError> {
		let outbound = OutboundCall {
			name: call.spec.name.clone(),
			params: call.spec.params.clone(),
			bearer: credential.map(|credential| credential.token.clone()),
		};
		let envelope = self.transport.send(outbound).await?;

		match self.classifier.classify(&envelope) {
			EnvelopeClass::Passthrough => Ok(envelope),
			EnvelopeClass::Unauthenticated =>
				Err(DispatchError::Unauthenticated { message: envelope.message }),
			EnvelopeClass::CredentialExpired =>
				Err(DispatchError::CredentialExpired { message: envelope.message }),
			EnvelopeClass::Transport(kind) =>
				Err(TransportFailure::new(kind, envelope.message).into()),
		}
	}
}
impl<T> Clone for CallDispatcher<T>
where
	T: ?Sized + CallTransport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), classifier: self.classifier.clone() }
	}
}
impl<T> Debug for CallDispatcher<T>
where
	T: ?Sized + CallTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CallDispatcher(..)")
	}
}
