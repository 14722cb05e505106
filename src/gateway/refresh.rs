//! Single-flight credential renewal.
//!
//! [`RefreshCoordinator::request_refresh`] guarantees that at most one renewal call is in flight
//! at any instant. The first caller to observe the coordinator idle becomes the episode's
//! initiator and performs the renewal; every caller arriving while the episode runs is parked
//! in a FIFO queue and receives the initiator's outcome. The credential store is updated (or
//! cleared) before any waiter is released, so a waiter that retries always sees the new state.
//!
//! The queue is drained in one step (`Idle` swapped in, waiters taken out) which makes double
//! resolution impossible; a caller arriving after the drain starts a fresh episode. If the
//! initiator's future is dropped mid-renewal the episode is abandoned: the coordinator returns
//! to `Idle` and parked waiters re-enter, one of them becoming the next initiator.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::{
	mem,
	sync::atomic::{AtomicU64, Ordering},
};
// crates.io
use futures::channel::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, Credential, RenewalGrant},
	error::TransportFailure,
	gateway::{CallContext, CallDispatcher, CallSpec, CredentialStore, DispatchError},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::StoreError,
	transport::CallTransport,
};

/// Outcome every participant of a renewal episode receives.
pub type Settlement = Result<Credential, RefreshFailure>;

/// Why a renewal episode failed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// The backend rejected the credential presented for renewal.
	#[error("renewal rejected as unauthenticated: {message}")]
	Unauthenticated {
		/// Message carried by the envelope.
		message: String,
	},
	/// The backend reported the credential presented for renewal as expired.
	#[error("renewal rejected as expired: {message}")]
	Expired {
		/// Message carried by the envelope.
		message: String,
	},
	/// The backend answered the renewal with another error code.
	#[error("renewal rejected with code {code}: {message}")]
	Rejected {
		/// Status code carried by the envelope.
		code: i64,
		/// Message carried by the envelope.
		message: String,
	},
	/// The renewal succeeded but its payload carried no usable token.
	#[error("renewal response did not contain a credential")]
	MissingCredential,
	/// The renewal call produced no envelope.
	#[error("renewal call failed: {0}")]
	Transport(TransportFailure),
	/// The fresh credential could not be persisted.
	#[error("renewed credential could not be stored: {0}")]
	Storage(StoreError),
}

/// Failure outcome delivered to every participant of an episode.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Credential renewal failed: {cause}")]
pub struct RefreshFailure {
	/// Underlying cause.
	pub cause: RefreshError,
	/// Episode the failure belongs to.
	pub episode: u64,
	/// `true` only for the caller that performed the renewal.
	pub initiator: bool,
	/// `true` when the credential was cleared as a consequence.
	pub logged_out: bool,
}

/// Renewal state; waiters only exist while an episode is in flight.
enum RenewalState {
	Idle,
	InFlight { episode: u64, waiters: VecDeque<oneshot::Sender<Settlement>> },
}

enum Role {
	Initiator { episode: u64, current: Option<Credential> },
	Waiter { episode: u64, outcome: oneshot::Receiver<Settlement> },
	/// An earlier episode already decided this caller's outcome.
	Settled(Settlement),
}

/// Coordinates credential renewal so concurrent callers share one renewal call.
pub struct RefreshCoordinator<T>
where
	T: ?Sized + CallTransport,
{
	dispatcher: CallDispatcher<T>,
	credentials: Arc<CredentialStore>,
	refresh_call: String,
	logout_on_transport_failure: bool,
	state: Mutex<RenewalState>,
	episodes: AtomicU64,
	metrics: Arc<RefreshMetrics>,
}
impl<T> RefreshCoordinator<T>
where
	T: ?Sized + CallTransport,
{
	/// Creates an idle coordinator that renews through `refresh_call`.
	pub fn new(
		dispatcher: CallDispatcher<T>,
		credentials: Arc<CredentialStore>,
		refresh_call: impl Into<String>,
	) -> Self {
		Self {
			dispatcher,
			credentials,
			refresh_call: refresh_call.into(),
			logout_on_transport_failure: true,
			state: Mutex::new(RenewalState::Idle),
			episodes: AtomicU64::new(0),
			metrics: Default::default(),
		}
	}

	/// Chooses whether a transport failure during renewal clears the credential.
	pub fn with_logout_on_transport_failure(mut self, logout: bool) -> Self {
		self.logout_on_transport_failure = logout;

		self
	}

	/// Shared counters for renewal outcomes.
	pub fn metrics(&self) -> &Arc<RefreshMetrics> {
		&self.metrics
	}

	/// Returns `true` while a renewal episode is running.
	pub fn is_in_flight(&self) -> bool {
		matches!(*self.state.lock(), RenewalState::InFlight { .. })
	}

	/// Renews the credential, or joins the episode already in flight.
	pub async fn request_refresh(&self) -> Settlement {
		self.request_refresh_for(None).await
	}

	/// Like [`request_refresh`](Self::request_refresh), for a caller whose call was rejected
	/// while carrying `stale`.
	///
	/// When no episode is running, a store that no longer holds `stale` means an episode settled
	/// after the caller dispatched. A different token is returned without renewing again; an
	/// empty store means that episode ended the session, and the caller fails as logged out
	/// without a second renewal call.
	pub async fn request_refresh_for(&self, stale: Option<&BearerToken>) -> Settlement {
		// Completes the lazy load so `cached` is authoritative below.
		self.credentials.get().await;

		loop {
			match self.enter(stale) {
				Role::Initiator { episode, current } =>
					return self.run_episode(episode, current).await,
				Role::Waiter { episode, outcome } => match outcome.await {
					Ok(settlement) => return settlement,
					Err(oneshot::Canceled) => {
						#[cfg(feature = "tracing")]
						tracing::debug!(episode, "Renewal episode abandoned; re-entering.");
						#[cfg(not(feature = "tracing"))]
						let _ = episode;
					},
				},
				Role::Settled(settlement) => return settlement,
			}
		}
	}

	/// Decides this caller's role under the state lock.
	fn enter(&self, stale: Option<&BearerToken>) -> Role {
		let mut state = self.state.lock();

		match &mut *state {
			RenewalState::InFlight { episode, waiters } => {
				let (tx, rx) = oneshot::channel();

				waiters.push_back(tx);
				self.metrics.record_joined();

				#[cfg(feature = "tracing")]
				tracing::debug!(episode = *episode, queued = waiters.len(), "Joined renewal episode.");

				Role::Waiter { episode: *episode, outcome: rx }
			},
			RenewalState::Idle => {
				let current = self.credentials.cached();

				if let Some(stale) = stale {
					match &current {
						Some(renewed) if !renewed.same_token(stale) =>
							return Role::Settled(Ok(renewed.clone())),
						None => return Role::Settled(Err(self.session_ended())),
						Some(_) => {},
					}
				}

				let episode = self.episodes.fetch_add(1, Ordering::Relaxed) + 1;

				*state = RenewalState::InFlight { episode, waiters: VecDeque::new() };

				Role::Initiator { episode, current }
			},
		}
	}

	/// Failure handed to a caller whose session an earlier episode already ended.
	fn session_ended(&self) -> RefreshFailure {
		let episode = self.episodes.load(Ordering::Relaxed);

		#[cfg(feature = "tracing")]
		tracing::debug!(episode, "Credential already cleared; skipping renewal.");

		RefreshFailure {
			cause: RefreshError::Unauthenticated {
				message: "Session ended by an earlier renewal.".into(),
			},
			episode,
			initiator: false,
			logged_out: true,
		}
	}

	async fn run_episode(&self, episode: u64, current: Option<Credential>) -> Settlement {
		const KIND: CallKind = CallKind::Refresh;

		let guard = EpisodeGuard { coordinator: self, armed: true };
		let span = CallSpan::renewal(&self.refresh_call, episode);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.metrics.record_attempt();

		let settlement = span.instrument(self.renew(episode, current)).await;

		guard.disarm();

		let waiters = self.drain();

		match &settlement {
			Ok(_) => {
				self.metrics.record_success();
				obs::record_call_outcome(KIND, CallOutcome::Success);
			},
			Err(_failure) => {
				self.metrics.record_failure();
				obs::record_call_outcome(KIND, CallOutcome::Failure);

				#[cfg(feature = "tracing")]
				tracing::warn!(
					episode,
					waiters = waiters.len(),
					logged_out = _failure.logged_out,
					error = %_failure.cause,
					"Credential renewal failed."
				);
			},
		}

		for waiter in waiters {
			// A waiter whose caller went away has dropped its receiver.
			let _ = waiter.send(settlement.clone());
		}

		settlement.map_err(|failure| RefreshFailure { initiator: true, ..failure })
	}

	/// Performs the renewal call and applies its outcome to the credential store.
	async fn renew(&self, episode: u64, current: Option<Credential>) -> Settlement {
		let call = CallContext::first(CallSpec::new(self.refresh_call.as_str()));
		let cause = match self.dispatcher.dispatch(&call, current.as_ref()).await {
			Ok(envelope) if envelope.is_success() =>
				match RenewalGrant::from_payload(envelope.payload) {
					Some(grant) => {
						let credential = Credential::renewed(current.as_ref(), grant);

						match self.credentials.set(credential.clone()).await {
							Ok(()) => return Ok(credential),
							Err(e) => RefreshError::Storage(e),
						}
					},
					None => RefreshError::MissingCredential,
				},
			Ok(envelope) =>
				RefreshError::Rejected { code: envelope.status_code, message: envelope.message },
			Err(DispatchError::Unauthenticated { message }) =>
				RefreshError::Unauthenticated { message },
			Err(DispatchError::CredentialExpired { message }) => RefreshError::Expired { message },
			Err(DispatchError::Transport(failure)) => RefreshError::Transport(failure),
		};
		let logged_out =
			self.logout_on_transport_failure || !matches!(cause, RefreshError::Transport(_));

		if logged_out {
			if let Err(_e) = self.credentials.clear().await {
				#[cfg(feature = "tracing")]
				tracing::warn!(episode, error = %_e, "Failed to delete the persisted credential.");
			}
		}

		Err(RefreshFailure { cause, episode, initiator: false, logged_out })
	}

	/// Takes every waiter and returns the coordinator to `Idle` in one step.
	fn drain(&self) -> VecDeque<oneshot::Sender<Settlement>> {
		match mem::replace(&mut *self.state.lock(), RenewalState::Idle) {
			RenewalState::InFlight { waiters, .. } => waiters,
			RenewalState::Idle => VecDeque::new(),
		}
	}
}
impl<T> Debug for RefreshCoordinator<T>
where
	T: ?Sized + CallTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("refresh_call", &self.refresh_call)
			.field("in_flight", &self.is_in_flight())
			.field("episodes", &self.episodes.load(Ordering::Relaxed))
			.finish()
	}
}

/// Abandons the episode if the initiator's future is dropped before settling.
struct EpisodeGuard<'a, T>
where
	T: ?Sized + CallTransport,
{
	coordinator: &'a RefreshCoordinator<T>,
	armed: bool,
}
impl<T> EpisodeGuard<'_, T>
where
	T: ?Sized + CallTransport,
{
	fn disarm(mut self) {
		self.armed = false;
	}
}
impl<T> Drop for EpisodeGuard<'_, T>
where
	T: ?Sized + CallTransport,
{
	fn drop(&mut self) {
		if self.armed {
			// Dropping the senders wakes every waiter with `Canceled`.
			let _abandoned = self.coordinator.drain();

			#[cfg(feature = "tracing")]
			tracing::debug!(waiters = _abandoned.len(), "Renewal initiator dropped mid-flight.");
		}
	}
}
