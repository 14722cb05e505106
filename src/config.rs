//! Gateway configuration: backend location, persistence key, renewal call, and notification
//! texts.

// std
use std::time::Duration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Messages shown through the notification collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeTexts {
	/// Shown when the session ends and the user must sign in again.
	pub session_expired: String,
	/// Shown when a call timed out.
	pub timeout: String,
	/// Shown when the backend could not be reached.
	pub unreachable: String,
	/// Shown for any other transport failure.
	pub transport_other: String,
}
impl Default for NoticeTexts {
	fn default() -> Self {
		Self {
			session_expired: "Your session has expired. Please sign in again.".into(),
			timeout: "The request timed out. Please try again.".into(),
			unreachable: "The service is unreachable. Check your network connection.".into(),
			transport_other: "The request failed. Please try again later.".into(),
		}
	}
}

/// Validated gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GatewayConfig {
	/// Backend base URL; call names are appended as path segments.
	pub base_url: Url,
	/// Per-request timeout enforced by the transport.
	pub request_timeout: Duration,
	/// Key the credential record is persisted under.
	pub credential_key: String,
	/// Remote operation that renews the credential.
	pub refresh_call: String,
	/// Visibility duration for every notice.
	pub notice_duration_ms: u64,
	/// Whether a transport failure during renewal clears the credential (forced logout) or
	/// keeps the stale credential and surfaces a transient error.
	pub logout_on_refresh_transport_failure: bool,
	/// Notification texts.
	pub notices: NoticeTexts,
}
impl GatewayConfig {
	/// Default persistence key.
	pub const DEFAULT_CREDENTIAL_KEY: &'static str = "userInfo";
	/// Default notice visibility.
	pub const DEFAULT_NOTICE_DURATION_MS: u64 = 3_000;
	/// Default renewal operation.
	pub const DEFAULT_REFRESH_CALL: &'static str = "refreshToken";
	/// Default per-request timeout.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

	/// Returns a builder for the provided backend base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new().base_url(base_url)
	}

	/// Parses and validates a JSON configuration document.
	///
	/// Every field except `base_url` is optional; `request_timeout_ms` expresses the timeout in
	/// milliseconds.
	pub fn from_json(raw: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let builder: GatewayConfigBuilder = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { source })?;

		Ok(builder.build()?)
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GatewayConfigBuilder {
	/// Backend base URL.
	pub base_url: Option<Url>,
	/// Per-request timeout in milliseconds.
	pub request_timeout_ms: u64,
	/// Persistence key.
	pub credential_key: String,
	/// Renewal operation name.
	pub refresh_call: String,
	/// Notice visibility duration.
	pub notice_duration_ms: u64,
	/// Forced-logout policy for transport failures during renewal.
	pub logout_on_refresh_transport_failure: bool,
	/// Notification texts.
	pub notices: NoticeTexts,
}
impl GatewayConfigBuilder {
	/// Creates a builder seeded with defaults and no base URL.
	pub fn new() -> Self {
		Self {
			base_url: None,
			request_timeout_ms: GatewayConfig::DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
			credential_key: GatewayConfig::DEFAULT_CREDENTIAL_KEY.into(),
			refresh_call: GatewayConfig::DEFAULT_REFRESH_CALL.into(),
			notice_duration_ms: GatewayConfig::DEFAULT_NOTICE_DURATION_MS,
			logout_on_refresh_transport_failure: true,
			notices: NoticeTexts::default(),
		}
	}

	/// Sets the backend base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the per-request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

		self
	}

	/// Overrides the persistence key.
	pub fn credential_key(mut self, key: impl Into<String>) -> Self {
		self.credential_key = key.into();

		self
	}

	/// Overrides the renewal operation name.
	pub fn refresh_call(mut self, name: impl Into<String>) -> Self {
		self.refresh_call = name.into();

		self
	}

	/// Overrides the notice visibility duration.
	pub fn notice_duration_ms(mut self, duration_ms: u64) -> Self {
		self.notice_duration_ms = duration_ms;

		self
	}

	/// Chooses whether transport failures during renewal force a logout.
	pub fn logout_on_refresh_transport_failure(mut self, logout: bool) -> Self {
		self.logout_on_refresh_transport_failure = logout;

		self
	}

	/// Replaces the notification texts.
	pub fn notices(mut self, notices: NoticeTexts) -> Self {
		self.notices = notices;

		self
	}

	/// Validates the builder and produces a [`GatewayConfig`].
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let base_url = self.base_url.ok_or(ConfigError::MissingBaseUrl)?;

		if !matches!(base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { url: base_url.to_string() });
		}
		if self.credential_key.trim().is_empty() {
			return Err(ConfigError::EmptyField { field: "credential_key" });
		}
		if self.refresh_call.trim().is_empty() {
			return Err(ConfigError::EmptyField { field: "refresh_call" });
		}
		if self.request_timeout_ms == 0 {
			return Err(ConfigError::ZeroTimeout);
		}

		Ok(GatewayConfig {
			base_url,
			request_timeout: Duration::from_millis(self.request_timeout_ms),
			credential_key: self.credential_key,
			refresh_call: self.refresh_call,
			notice_duration_ms: self.notice_duration_ms,
			logout_on_refresh_transport_failure: self.logout_on_refresh_transport_failure,
			notices: self.notices,
		})
	}
}
impl Default for GatewayConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}
