//! Thread-safe in-memory [`KeyValueStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, Value>>>;

/// Thread-safe storage backend that keeps values in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Creates a store pre-populated with `key => value`.
	pub fn seeded(key: impl Into<String>, value: Value) -> Self {
		let store = Self::default();

		store.0.write().insert(key.into(), value);

		store
	}

	/// Returns a snapshot of the value under `key` without going through the async contract.
	pub fn peek(&self, key: &str) -> Option<Value> {
		self.0.read().get(key).cloned()
	}

	fn write_now(map: StoreMap, key: String, value: Value) -> Result<(), StoreError> {
		map.write().insert(key, value);

		Ok(())
	}

	fn delete_now(map: StoreMap, key: &str) -> Result<(), StoreError> {
		map.write().remove(key);

		Ok(())
	}
}
impl KeyValueStore for MemoryStore {
	fn read<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn write<'a>(&'a self, key: &'a str, value: Value) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Self::write_now(map, key, value) })
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::delete_now(map, key) })
	}
}
