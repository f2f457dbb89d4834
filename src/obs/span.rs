// crates.io
use tracing::{Span, field, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::PollOutcome};

/// Span wrapping one poll cycle.
#[derive(Clone, Debug)]
pub struct PollSpan {
	span: Span,
}
impl PollSpan {
	/// Creates a span tagged with the 1-based cycle number.
	pub fn new(cycle: u64) -> Self {
		let span = tracing::info_span!("twitter_api_metrics.poll", cycle, outcome = field::Empty);

		Self { span }
	}

	/// Fills in the `outcome` field once the cycle has been classified.
	pub fn record_outcome(&self, outcome: PollOutcome) {
		self.span.record("outcome", outcome.as_str());
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}
