//! Fixed-cadence polling loop with reset-aware back-off.
//!
//! Every cycle counts one attempt, fetches the status snapshot, and either refreshes the gauges or
//! leaves them untouched. The next delay comes from [`PollPolicy`]: the configured interval after
//! a success or a generic failure, and the `X-Rate-Limit-Reset` instant (or a 15 minute fallback)
//! after a 429. Time is read and slept through an injected [`Clock`].

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	api::RateLimitApi,
	flatten,
	obs::{PollOutcome, PollSpan},
	registry::MetricRegistry,
	resource::ResourceGroup,
};

/// Boxed future returned by [`Clock::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Time source used by the loop.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Current wall-clock instant.
	fn now(&self) -> OffsetDateTime;

	/// Suspends for `duration`.
	fn sleep(&self, duration: StdDuration) -> SleepFuture<'_>;
}

/// [`Clock`] backed by the system clock and the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;
impl Clock for TokioClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}

	fn sleep(&self, duration: StdDuration) -> SleepFuture<'_> {
		Box::pin(tokio::time::sleep(duration))
	}
}

/// Result of one poll cycle.
#[derive(Debug)]
pub enum CycleOutcome {
	/// Gauges were refreshed from the response.
	Success {
		/// Number of endpoint rows written.
		updated: usize,
	},
	/// The status call returned 429.
	RateLimited {
		/// Instant the next attempt should wait for.
		resume_at: OffsetDateTime,
	},
	/// Any other failure.
	Failed {
		/// Error that ended the cycle.
		error: Error,
	},
}
impl CycleOutcome {
	/// Label recorded on the cycle span.
	pub fn label(&self) -> PollOutcome {
		match self {
			Self::Success { .. } => PollOutcome::Success,
			Self::RateLimited { .. } => PollOutcome::RateLimited,
			Self::Failed { .. } => PollOutcome::Failure,
		}
	}
}

/// Sleep policy applied between cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
	/// Delay after a success or a generic failure.
	pub interval: StdDuration,
	/// Wait applied to a 429 that carried no usable reset header.
	pub rate_limit_fallback: StdDuration,
}
impl PollPolicy {
	/// Fallback wait for throttled cycles without a reset instant.
	pub const DEFAULT_RATE_LIMIT_FALLBACK: StdDuration = StdDuration::from_secs(15 * 60);

	/// Creates a policy polling every `interval`.
	pub fn new(interval: StdDuration) -> Self {
		Self { interval, rate_limit_fallback: Self::DEFAULT_RATE_LIMIT_FALLBACK }
	}

	/// Instant a throttled cycle resumes at when the reset header was missing or invalid.
	pub fn fallback_resume(&self, now: OffsetDateTime) -> OffsetDateTime {
		now + self.rate_limit_fallback
	}

	/// Delay before the next cycle.
	///
	/// A reset instant that already passed falls back to the regular interval.
	pub fn delay_for(&self, outcome: &CycleOutcome, now: OffsetDateTime) -> StdDuration {
		match outcome {
			CycleOutcome::RateLimited { resume_at } => {
				let wait = *resume_at - now;

				if wait.is_positive() { wait.unsigned_abs() } else { self.interval }
			},
			CycleOutcome::Success { .. } | CycleOutcome::Failed { .. } => self.interval,
		}
	}
}

/// Drives [`RateLimitApi`] into a [`MetricRegistry`] forever.
pub struct Poller<A, C>
where
	A: ?Sized,
	C: ?Sized,
{
	api: Arc<A>,
	registry: Arc<MetricRegistry>,
	clock: Arc<C>,
	policy: PollPolicy,
}
impl<A, C> Poller<A, C>
where
	A: ?Sized + RateLimitApi,
	C: ?Sized + Clock,
{
	/// Creates a poller over the provided collaborators.
	pub fn new(
		api: Arc<A>,
		registry: Arc<MetricRegistry>,
		clock: Arc<C>,
		policy: PollPolicy,
	) -> Self {
		Self { api, registry, clock, policy }
	}

	/// Sleep policy in effect.
	pub fn policy(&self) -> PollPolicy {
		self.policy
	}

	/// Counts an attempt, fetches once, and applies the result without sleeping.
	pub async fn poll_once(&self) -> CycleOutcome {
		self.registry.increment_attempt();

		match self.api.fetch_rate_limit_status().await {
			Ok(status) => {
				let flattened = flatten::flatten(&status.resources, &ResourceGroup::ALL);

				CycleOutcome::Success { updated: self.registry.apply(&flattened.rows) }
			},
			Err(Error::RateLimited { reset_at }) => CycleOutcome::RateLimited {
				resume_at: reset_at.unwrap_or_else(|| self.policy.fallback_resume(self.clock.now())),
			},
			Err(error) => CycleOutcome::Failed { error },
		}
	}

	/// Runs cycle number `cycle`, then sleeps for the delay its outcome calls for.
	pub async fn step(&self, cycle: u64) -> CycleOutcome {
		let span = PollSpan::new(cycle);

		span.instrument(async {
			let outcome = self.poll_once().await;
			let delay = self.policy.delay_for(&outcome, self.clock.now());

			span.record_outcome(outcome.label());
			log_outcome(&outcome, delay);

			self.clock.sleep(delay).await;

			outcome
		})
		.await
	}

	/// Polls until the process exits.
	pub async fn run(&self) {
		tracing::info!(
			interval_secs = self.policy.interval.as_secs(),
			registered = self.registry.len(),
			"Starting rate-limit poll loop."
		);

		let mut cycle = 0_u64;

		loop {
			cycle = cycle.saturating_add(1);

			self.step(cycle).await;
		}
	}
}
impl<A, C> Debug for Poller<A, C>
where
	A: ?Sized,
	C: ?Sized,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Poller")
			.field("registry", &self.registry)
			.field("policy", &self.policy)
			.finish()
	}
}

fn log_outcome(outcome: &CycleOutcome, delay: StdDuration) {
	let delay_secs = delay.as_secs();

	match outcome {
		CycleOutcome::Success { updated } =>
			tracing::info!(updated, delay_secs, "Refreshed rate-limit gauges."),
		CycleOutcome::RateLimited { resume_at } => tracing::warn!(
			resume_at = resume_at.unix_timestamp(),
			delay_secs,
			"Rate-limit status call throttled; waiting for reset."
		),
		CycleOutcome::Failed { error: error @ Error::InvalidClient { .. } } =>
			tracing::error!(%error, delay_secs, "Twitter rejected the configured API credentials."),
		CycleOutcome::Failed { error } =>
			tracing::warn!(%error, delay_secs, "Rate-limit poll failed; gauges left unchanged."),
	}
}
