//! Logging setup plus the span and outcome labels attached to every poll cycle.
//!
//! Each cycle runs inside a `twitter_api_metrics.poll` span carrying the `cycle` number and, once
//! known, the `outcome` label from [`PollOutcome`].

mod span;
mod subscriber;

pub use span::*;
pub use subscriber::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each poll cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollOutcome {
	/// Gauges were refreshed.
	Success,
	/// The status call was throttled.
	RateLimited,
	/// Any other failure; gauges kept their previous values.
	Failure,
}
impl PollOutcome {
	/// Returns a stable label suitable for span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PollOutcome::Success => "success",
			PollOutcome::RateLimited => "rate_limited",
			PollOutcome::Failure => "failure",
		}
	}
}
impl Display for PollOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
