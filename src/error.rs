//! Gateway-level error types surfaced to application callers.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical gateway error exposed by public APIs.
///
/// `CredentialExpired` is deliberately absent: the gateway consumes that signal internally to
/// run its single refresh-and-retry cycle, so application callers never observe it.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The credential is missing, was rejected, or could not be renewed; the user must sign in
	/// again. The stored credential has already been cleared when this is returned.
	#[error("Authentication required: {reason}.")]
	AuthRequired {
		/// Human-readable reason string.
		reason: String,
	},
	/// The call never produced an envelope.
	#[error(transparent)]
	Transport(#[from] TransportFailure),
	/// The backend answered with a non-success envelope the gateway does not interpret.
	#[error("Backend returned error code {code}: {message}")]
	Domain {
		/// Status code carried by the envelope.
		code: i64,
		/// Human-readable message carried by the envelope.
		message: String,
	},
	/// A success payload could not be decoded into the requested type.
	#[error("Response payload could not be decoded.")]
	Decode {
		/// Structured parsing failure including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Persistence collaborator failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Builds an [`Error::AuthRequired`] from any displayable reason.
	pub fn auth_required(reason: impl Display) -> Self {
		Self::AuthRequired { reason: reason.to_string() }
	}

	/// Returns `true` when the caller must re-authenticate.
	pub fn is_auth_required(&self) -> bool {
		matches!(self, Self::AuthRequired { .. })
	}
}

/// Configuration and validation failures raised while assembling a gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: Box<dyn StdError + Send + Sync>,
	},
	/// The backend base URL is missing.
	#[error("Gateway configuration is missing a base URL.")]
	MissingBaseUrl,
	/// The backend base URL uses a scheme other than http or https.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// A required text field was empty.
	#[error("Configuration field `{field}` must not be empty.")]
	EmptyField {
		/// Name of the empty field.
		field: &'static str,
	},
	/// The request timeout must be positive.
	#[error("Request timeout must be greater than zero.")]
	ZeroTimeout,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Machine classification of a transport failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailureKind {
	/// The transport gave up waiting for the backend.
	Timeout,
	/// The backend could not be reached (DNS, connect, host offline).
	Unreachable,
	/// Any other failure that produced no envelope.
	Other,
}
impl TransportFailureKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Timeout => "timeout",
			Self::Unreachable => "unreachable",
			Self::Other => "other",
		}
	}
}
impl Display for TransportFailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-level failure: the call produced no envelope.
///
/// The value is `Clone` so a single renewal failure can be handed to every queued waiter.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Transport failure ({kind}): {message}")]
pub struct TransportFailure {
	/// Machine classification.
	pub kind: TransportFailureKind,
	/// Human-readable description.
	pub message: String,
	/// HTTP status, when one was received.
	pub status: Option<u16>,
}
impl TransportFailure {
	/// Creates a failure of the given kind.
	pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into(), status: None }
	}

	/// Convenience constructor for [`TransportFailureKind::Timeout`].
	pub fn timeout(message: impl Into<String>) -> Self {
		Self::new(TransportFailureKind::Timeout, message)
	}

	/// Convenience constructor for [`TransportFailureKind::Unreachable`].
	pub fn unreachable(message: impl Into<String>) -> Self {
		Self::new(TransportFailureKind::Unreachable, message)
	}

	/// Convenience constructor for [`TransportFailureKind::Other`].
	pub fn other(message: impl Into<String>) -> Self {
		Self::new(TransportFailureKind::Other, message)
	}

	/// Attaches the HTTP status that accompanied the failure.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}
}
