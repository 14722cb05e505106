// self
use crate::_prelude::*;
#[cfg(feature = "tracing")] use crate::obs::CallKind;

/// Future returned by [`CallSpan::instrument`]; a plain passthrough without the `tracing` feature.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough when spans are compiled out.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapping one logical gateway call or one renewal episode.
///
/// A facade call's span covers its first dispatch, any wait on a shared renewal, and the single
/// retry. A renewal span additionally carries the episode number so waiters can be matched to
/// the episode that settled them.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Span for an application call named `call`.
	pub fn call(call: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("credential_gateway.call", kind = CallKind::Call.as_str(), call);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = call;

			Self {}
		}
	}

	/// Span for renewal episode `episode`, issued through the `call` operation.
	pub fn renewal(call: &str, episode: u64) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"credential_gateway.call",
				kind = CallKind::Refresh.as_str(),
				call,
				episode
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (call, episode);

			Self {}
		}
	}

	/// Attaches the span to `fut`; it is entered on every poll, never held across an await.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
