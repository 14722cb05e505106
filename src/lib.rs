//! Authenticated remote-call gateway: bearer credentials attached to every outbound call,
//! expiry detected from response envelopes, and single-flight credential renewal shared by every
//! concurrent caller.
//!
//! Application code talks to [`gateway::Gateway`] only. The gateway reads the current credential
//! from a [`gateway::CredentialStore`], dispatches through a [`transport::CallTransport`], and on
//! a credential-expired signal asks the [`gateway::RefreshCoordinator`] for a fresh credential
//! before retrying the call exactly once.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod obs;
pub mod store;
pub mod transport;

mod _prelude {
	pub use std::{
		collections::{HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::{Mutex as AsyncMutex, OnceCell as AsyncOnceCell};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
