//! Process-wide holder of the current credential, backed by the key-value collaborator.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{KeyValueStore, StoreError},
};

/// Single source of truth for the current credential.
///
/// The persisted record is loaded lazily on first access and cached afterwards. Concurrent
/// first accesses share one load. A failing or undecodable load degrades to "no credential";
/// failing writes propagate.
pub struct CredentialStore {
	backend: Arc<dyn KeyValueStore>,
	key: String,
	loaded: AsyncOnceCell<()>,
	current: RwLock<Option<Credential>>,
	writes: AsyncMutex<()>,
}
impl CredentialStore {
	/// Creates a store persisting under `key`.
	pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
		Self {
			backend,
			key: key.into(),
			loaded: AsyncOnceCell::new(),
			current: RwLock::new(None),
			writes: AsyncMutex::new(()),
		}
	}

	/// Key the record is persisted under.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Returns the current credential, loading it from the backend on first use.
	pub async fn get(&self) -> Option<Credential> {
		self.ensure_loaded().await;

		self.current.read().clone()
	}

	/// Returns `true` when a credential is present.
	pub async fn is_signed_in(&self) -> bool {
		self.ensure_loaded().await;

		self.current.read().is_some()
	}

	/// Persists `credential` and makes it the current one.
	///
	/// The cache only changes once the backend accepted the write.
	pub async fn set(&self, credential: Credential) -> Result<(), StoreError> {
		self.ensure_loaded().await;

		let _write = self.writes.lock().await;
		let value = credential.to_persisted()?;

		self.backend.write(&self.key, value).await?;
		*self.current.write() = Some(credential);

		Ok(())
	}

	/// Drops the current credential and deletes the persisted copy.
	///
	/// The cache is emptied before the backend is touched, so a failing delete still leaves the
	/// process logged out.
	pub async fn clear(&self) -> Result<(), StoreError> {
		self.ensure_loaded().await;

		let _write = self.writes.lock().await;

		self.current.write().take();
		self.backend.delete(&self.key).await
	}

	/// Cached value without triggering the lazy load; `None` before the load completed.
	pub(crate) fn cached(&self) -> Option<Credential> {
		self.current.read().clone()
	}

	async fn ensure_loaded(&self) {
		self.loaded
			.get_or_init(|| async {
				let loaded = self.load().await;

				*self.current.write() = loaded;
			})
			.await;
	}

	async fn load(&self) -> Option<Credential> {
		let value = match self.backend.read(&self.key).await {
			Ok(value) => value?,
			Err(e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					key = %self.key,
					error = %e,
					"Credential load failed; continuing signed out."
				);
				#[cfg(not(feature = "tracing"))]
				let _ = e;

				return None;
			},
		};

		match Credential::from_persisted(value) {
			Ok(credential) => credential,
			Err(e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					key = %self.key,
					error = %e,
					"Persisted credential is unreadable; continuing signed out."
				);
				#[cfg(not(feature = "tracing"))]
				let _ = e;

				None
			},
		}
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore")
			.field("key", &self.key)
			.field("loaded", &self.loaded.is_initialized())
			.field("signed_in", &self.current.read().is_some())
			.finish()
	}
}
