//! Cached app-only bearer tokens with singleflight refresh.
//!
//! [`TokenSource::bearer`] hands out the cached token while it is usable and only calls the
//! token endpoint when nothing is cached, the token is inside its preemptive window, or the
//! caller discarded it via [`TokenSource::invalidate`] after the API rejected it. The cache lock
//! is held across the exchange, so concurrent callers piggy-back on one in-flight request
//! instead of stampeding the token endpoint.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, ExchangeMetrics, TokenRecord, TokenSecret},
	http::ReqwestHttpClient,
	oauth::TokenFacade,
};

/// Client-credentials token cache bound to one credential pair.
#[derive(Debug)]
pub struct TokenSource {
	facade: TokenFacade,
	cached: AsyncMutex<Option<TokenRecord>>,
	preemptive_window: Duration,
	metrics: Arc<ExchangeMetrics>,
}
impl TokenSource {
	const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates a source with its own timeout-bound HTTP client.
	pub fn new(
		credentials: ClientCredentials,
		token_url: Url,
		timeout: StdDuration,
	) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(timeout)?;

		Self::with_http_client(credentials, token_url, http_client)
	}

	/// Creates a source that reuses the caller-provided transport.
	pub fn with_http_client(
		credentials: ClientCredentials,
		token_url: Url,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let facade = TokenFacade::new(&credentials, &token_url, http_client)?;

		Ok(Self {
			facade,
			cached: AsyncMutex::new(None),
			preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW,
			metrics: Default::default(),
		})
	}

	/// Overrides the preemptive refresh window (defaults to 60 seconds).
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Exchange counters for this source.
	pub fn metrics(&self) -> &ExchangeMetrics {
		&self.metrics
	}

	/// Returns a usable bearer token, exchanging credentials when required.
	pub async fn bearer(&self) -> Result<TokenSecret> {
		let mut cached = self.cached.lock().await;
		let now = OffsetDateTime::now_utc();

		if let Some(current) =
			cached.as_ref().filter(|record| !record.should_refresh(now, self.preemptive_window))
		{
			return Ok(current.access_token.clone());
		}

		self.metrics.record_attempt();

		match self.facade.exchange_client_credentials().await {
			Ok(record) => {
				self.metrics.record_success();
				tracing::debug!(expires_at = ?record.expires_at, "Obtained app-only bearer token.");

				let token = record.access_token.clone();

				*cached = Some(record);

				Ok(token)
			},
			Err(e) => {
				self.metrics.record_failure();

				Err(e)
			},
		}
	}

	/// Drops the cached token so the next [`bearer`](Self::bearer) call re-authenticates.
	pub async fn invalidate(&self) {
		if self.cached.lock().await.take().is_some() {
			tracing::debug!("Discarded cached bearer token.");
		}
	}
}
