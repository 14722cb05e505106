//! Canonical response envelope shared by local and remote calls, plus the status-code table
//! the host process speaks.

// std
use std::borrow::Cow;
// self
use crate::_prelude::*;

/// Status codes emitted by the host process and the backend.
///
/// The numeric ranges group codes by origin: `10xx` system, `11xx` parameters, `12xx` user and
/// session, `13xx` files, `14xx` network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
	/// Call succeeded.
	Success,
	/// Generic system failure.
	System,
	/// Configuration failure.
	Config,
	/// Database failure.
	Database,
	/// Permission denied.
	Permission,
	/// Invalid parameters.
	Params,
	/// Required parameter missing.
	ParamsMissing,
	/// Parameter failed validation.
	ParamsInvalid,
	/// User does not exist.
	UserNotFound,
	/// Caller is not authenticated.
	UserUnauthorized,
	/// Caller's credential has expired and may be renewed.
	CredentialExpired,
	/// File does not exist.
	FileNotFound,
	/// File could not be read.
	FileRead,
	/// File could not be written.
	FileWrite,
	/// Network failure reported by the host.
	Network,
	/// Network timeout reported by the host.
	NetworkTimeout,
	/// Network unreachable reported by the host.
	NetworkUnreachable,
	/// Any code outside the table.
	Unknown(i64),
}
impl StatusCode {
	/// Maps a raw wire code onto the table.
	pub const fn from_code(code: i64) -> Self {
		match code {
			0 => Self::Success,
			1000 => Self::System,
			1001 => Self::Config,
			1002 => Self::Database,
			1003 => Self::Permission,
			1100 => Self::Params,
			1101 => Self::ParamsMissing,
			1102 => Self::ParamsInvalid,
			1200 => Self::UserNotFound,
			1201 => Self::UserUnauthorized,
			1202 => Self::CredentialExpired,
			1300 => Self::FileNotFound,
			1301 => Self::FileRead,
			1302 => Self::FileWrite,
			1400 => Self::Network,
			1401 => Self::NetworkTimeout,
			1402 => Self::NetworkUnreachable,
			other => Self::Unknown(other),
		}
	}

	/// Returns the raw wire code.
	pub const fn code(self) -> i64 {
		match self {
			Self::Success => 0,
			Self::System => 1000,
			Self::Config => 1001,
			Self::Database => 1002,
			Self::Permission => 1003,
			Self::Params => 1100,
			Self::ParamsMissing => 1101,
			Self::ParamsInvalid => 1102,
			Self::UserNotFound => 1200,
			Self::UserUnauthorized => 1201,
			Self::CredentialExpired => 1202,
			Self::FileNotFound => 1300,
			Self::FileRead => 1301,
			Self::FileWrite => 1302,
			Self::Network => 1400,
			Self::NetworkTimeout => 1401,
			Self::NetworkUnreachable => 1402,
			Self::Unknown(code) => code,
		}
	}

	/// Returns a short human-readable description of the code.
	pub fn description(self) -> Cow<'static, str> {
		let text = match self {
			Self::Success => "Success",
			Self::System => "System error",
			Self::Config => "Configuration error",
			Self::Database => "Database error",
			Self::Permission => "Permission denied",
			Self::Params => "Invalid parameters",
			Self::ParamsMissing => "Missing parameters",
			Self::ParamsInvalid => "Parameter validation failed",
			Self::UserNotFound => "User not found",
			Self::UserUnauthorized => "User not authorized",
			Self::CredentialExpired => "Credential expired",
			Self::FileNotFound => "File not found",
			Self::FileRead => "File read failed",
			Self::FileWrite => "File write failed",
			Self::Network => "Network error",
			Self::NetworkTimeout => "Network timeout",
			Self::NetworkUnreachable => "Network unreachable",
			Self::Unknown(code) => return Cow::Owned(format!("Unknown error ({code})")),
		};

		Cow::Borrowed(text)
	}
}
impl From<i64> for StatusCode {
	fn from(code: i64) -> Self {
		Self::from_code(code)
	}
}
impl Display for StatusCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} ({})", self.description(), self.code())
	}
}

/// Normalized result of every call.
///
/// A payload is only meaningful when [`ResponseEnvelope::is_success`] holds; error envelopes
/// carry `None` and a human-readable message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T = Value> {
	/// Raw status code.
	#[serde(rename = "code", alias = "statusCode")]
	pub status_code: i64,
	/// Payload present on success.
	#[serde(rename = "data", alias = "payload", default)]
	pub payload: Option<T>,
	/// Human-readable message; empty on success.
	#[serde(default)]
	pub message: String,
}
impl<T> ResponseEnvelope<T> {
	/// Builds a success envelope around `payload`.
	pub fn success(payload: T) -> Self {
		Self {
			status_code: StatusCode::Success.code(),
			payload: Some(payload),
			message: String::new(),
		}
	}

	/// Builds an error envelope; error envelopes never carry a payload.
	pub fn failure(status: impl Into<StatusCode>, message: impl Into<String>) -> Self {
		Self { status_code: status.into().code(), payload: None, message: message.into() }
	}

	/// Returns the classified status.
	pub fn status(&self) -> StatusCode {
		StatusCode::from_code(self.status_code)
	}

	/// Returns `true` for the success code.
	pub fn is_success(&self) -> bool {
		self.status_code == StatusCode::Success.code()
	}

	/// Unwraps a success payload, or converts the envelope into [`Error::Domain`].
	pub fn into_result(self) -> Result<Option<T>> {
		if self.is_success() {
			Ok(self.payload)
		} else {
			Err(Error::Domain { code: self.status_code, message: self.message })
		}
	}
}
impl From<StatusCode> for i64 {
	fn from(status: StatusCode) -> Self {
		status.code()
	}
}
