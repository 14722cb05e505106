//! Credential records, their persisted shape, and renewal payload decoding.

// self
use crate::{_prelude::*, auth::BearerToken};

/// Identity attached to a credential.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Numeric user identifier.
	#[serde(default)]
	pub id: u64,
	/// Display name.
	#[serde(default)]
	pub username: String,
	/// Contact address.
	#[serde(default)]
	pub email: String,
	/// Avatar location, if the user uploaded one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
}
impl Identity {
	/// Creates an identity with the required fields.
	pub fn new(id: u64, username: impl Into<String>, email: impl Into<String>) -> Self {
		Self { id, username: username.into(), email: email.into(), avatar: None }
	}

	/// Attaches an avatar location.
	pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
		self.avatar = Some(avatar.into());

		self
	}
}

/// Bearer token plus the identity it authorizes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
	/// Secret attached to outbound calls.
	pub token: BearerToken,
	/// Identity of the signed-in user.
	pub identity: Identity,
	/// Instant the token was issued or last renewed.
	pub issued_at: OffsetDateTime,
}
impl Credential {
	/// Creates a credential stamped with the current clock.
	pub fn new(token: impl Into<String>, identity: Identity) -> Self {
		Self {
			token: BearerToken::new(token),
			identity,
			issued_at: OffsetDateTime::now_utc(),
		}
	}

	/// Produces the credential that results from a renewal grant.
	///
	/// The grant's identity replaces the current one when present; otherwise only the token
	/// rotates.
	pub fn renewed(current: Option<&Credential>, grant: RenewalGrant) -> Self {
		let identity = grant
			.user
			.or_else(|| current.map(|credential| credential.identity.clone()))
			.unwrap_or_default();

		Self::new(grant.token, identity)
	}

	/// Returns `true` when both credentials carry the same token.
	pub fn same_token(&self, token: &BearerToken) -> bool {
		&self.token == token
	}

	pub(crate) fn to_persisted(&self) -> Result<Value, serde_json::Error> {
		serde_json::to_value(PersistedCredential {
			token: Some(self.token.expose().to_owned()),
			issued_at: Some(self.issued_at),
			identity: self.identity.clone(),
		})
	}

	/// Decodes a persisted record. Records without a usable token decode as `None`.
	pub(crate) fn from_persisted(value: Value) -> Result<Option<Self>, serde_json::Error> {
		let persisted: PersistedCredential = serde_json::from_value(value)?;
		let Some(token) = persisted.token.filter(|token| !token.is_empty()) else {
			return Ok(None);
		};

		Ok(Some(Self {
			token: BearerToken::new(token),
			identity: persisted.identity,
			issued_at: persisted.issued_at.unwrap_or_else(OffsetDateTime::now_utc),
		}))
	}
}

/// Flat record stored under the credential key: identity fields beside the token.
#[derive(Serialize, Deserialize)]
struct PersistedCredential {
	#[serde(default)]
	token: Option<String>,
	#[serde(default, with = "time::serde::timestamp::option")]
	issued_at: Option<OffsetDateTime>,
	#[serde(flatten)]
	identity: Identity,
}

/// Payload of a successful renewal call.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RenewalGrant {
	/// Freshly issued token.
	pub token: String,
	/// Updated identity, when the backend sends one.
	#[serde(default)]
	pub user: Option<Identity>,
}
impl RenewalGrant {
	/// Extracts a grant from a renewal payload; `None` when no non-empty token is present.
	pub fn from_payload(payload: Option<Value>) -> Option<Self> {
		let grant: Self = serde_json::from_value(payload?).ok()?;

		(!grant.token.is_empty()).then_some(grant)
	}
}
