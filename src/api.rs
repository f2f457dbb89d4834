//! Authenticated access to the `application/rate_limit_status` endpoint.
//!
//! [`RateLimitApi`] is the poll loop's only dependency on the network; [`ApiClient`] is the
//! reqwest implementation. A 429 surfaces as [`Error::RateLimited`] carrying the parsed
//! `X-Rate-Limit-Reset` instant, and a 401 discards the cached bearer token so the next cycle
//! re-authenticates.

// std
use std::time::Duration as StdDuration;
// crates.io
use reqwest::StatusCode;
// self
use crate::{
	_prelude::*,
	auth::TokenSource,
	error::{ConfigError, TransientError, TransportError},
	http::{self, ReqwestHttpClient},
	resource::{ResourceGroup, Resources},
};

/// Boxed future returned by [`RateLimitApi::fetch_rate_limit_status`].
pub type StatusFuture<'a> = Pin<Box<dyn Future<Output = Result<RateLimitStatus>> + 'a + Send>>;

/// Source of rate-limit status snapshots.
pub trait RateLimitApi
where
	Self: Send + Sync,
{
	/// Issues one status request.
	fn fetch_rate_limit_status(&self) -> StatusFuture<'_>;
}

/// Decoded body of the rate-limit status endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RateLimitStatus {
	/// Which credential the numbers belong to.
	#[serde(default)]
	pub rate_limit_context: Option<RateLimitContext>,
	/// Per-group endpoint quotas.
	#[serde(default)]
	pub resources: Resources,
}

/// `rate_limit_context` object of the status response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RateLimitContext {
	/// Application identifier for app-only tokens.
	#[serde(default)]
	pub application: Option<String>,
	/// Access token owner for user-context tokens.
	#[serde(default)]
	pub access_token: Option<String>,
}

/// reqwest-backed [`RateLimitApi`] authenticated by a [`TokenSource`].
#[derive(Debug)]
pub struct ApiClient {
	http_client: ReqwestHttpClient,
	status_url: Url,
	tokens: Arc<TokenSource>,
}
impl ApiClient {
	const BODY_PREVIEW_LIMIT: usize = 256;
	const STATUS_PATH: &'static str = "1.1/application/rate_limit_status.json";
	const TARGET: &'static str = "rate-limit status endpoint";

	/// Creates a client for the API rooted at `base_url`.
	pub fn new(base_url: Url, tokens: Arc<TokenSource>, timeout: StdDuration) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(timeout)?;

		Self::with_http_client(base_url, tokens, http_client)
	}

	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(
		base_url: Url,
		tokens: Arc<TokenSource>,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let mut status_url = base_url
			.join(Self::STATUS_PATH)
			.map_err(|source| ConfigError::InvalidUrl { key: "API_BASE_URL".into(), source })?;

		status_url.query_pairs_mut().append_pair("resources", &ResourceGroup::query_value());

		Ok(Self { http_client, status_url, tokens })
	}

	/// Fully resolved status URL, including the `resources` query.
	pub fn status_url(&self) -> &Url {
		&self.status_url
	}

	/// Token source authenticating every call.
	pub fn tokens(&self) -> &TokenSource {
		&self.tokens
	}

	async fn fetch(&self) -> Result<RateLimitStatus> {
		let bearer = self.tokens.bearer().await?;
		let response = self
			.http_client
			.get(self.status_url.clone())
			.bearer_auth(bearer.expose())
			.send()
			.await
			.map_err(|e| TransportError::from_reqwest(Self::TARGET, e))?;
		let status = response.status();

		match status {
			StatusCode::OK => {
				let body =
					response.bytes().await.map_err(|e| TransportError::from_reqwest(Self::TARGET, e))?;
				let deserializer = &mut serde_json::Deserializer::from_slice(&body);

				serde_path_to_error::deserialize(deserializer)
					.map_err(|source| TransientError::StatusResponseParse { source }.into())
			},
			StatusCode::TOO_MANY_REQUESTS =>
				Err(Error::RateLimited { reset_at: http::parse_rate_limit_reset(response.headers()) }),
			_ => {
				if status == StatusCode::UNAUTHORIZED {
					self.tokens.invalidate().await;
				}

				let body = read_body_preview(response).await;

				Err(TransientError::UnexpectedStatus {
					status: status.as_u16(),
					body: truncate_preview(body, Self::BODY_PREVIEW_LIMIT),
				}
				.into())
			},
		}
	}
}
impl RateLimitApi for ApiClient {
	fn fetch_rate_limit_status(&self) -> StatusFuture<'_> {
		Box::pin(self.fetch())
	}
}

async fn read_body_preview(response: reqwest::Response) -> String {
	let status = response.status().as_u16();

	match response.text().await {
		Ok(body) => body,
		Err(e) => {
			tracing::debug!(status, error = %e, "Failed to read error response body.");

			String::new()
		},
	}
}

fn truncate_preview(body: String, limit: usize) -> String {
	if body.chars().count() <= limit {
		return body;
	}

	let mut buf = body.chars().take(limit).collect::<String>();

	buf.push('…');

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ClientCredentials;

	fn client(base: &str) -> ApiClient {
		let timeout = StdDuration::from_secs(1);
		let token_url =
			Url::parse("https://api.twitter.com/oauth2/token").expect("Token URL should parse.");
		let tokens = TokenSource::new(ClientCredentials::new("key", "secret"), token_url, timeout)
			.expect("Token source should build.");

		ApiClient::new(Url::parse(base).expect("Base URL should parse."), Arc::new(tokens), timeout)
			.expect("API client should build.")
	}

	#[test]
	fn status_url_requests_every_group() {
		let client = client("https://api.twitter.com");

		assert_eq!(client.status_url().path(), "/1.1/application/rate_limit_status.json");
		assert_eq!(
			client.status_url().query(),
			Some(
				"resources=application%2Cfavorites%2Cfollowers%2Cfriends%2Cfriendships%2Cgeo%2Chelp%2Clists%2Csearch%2Cstatuses%2Ctrends%2Cusers"
			)
		);
	}

	#[test]
	fn status_url_keeps_base_path_prefix() {
		let client = client("http://127.0.0.1:8080/proxy/");

		assert_eq!(client.status_url().path(), "/proxy/1.1/application/rate_limit_status.json");
	}

	#[test]
	fn body_preview_is_truncated() {
		assert_eq!(truncate_preview("short".into(), 10), "short");
		assert_eq!(truncate_preview("abcdef".into(), 3), "abc…");
	}

	#[tokio::test]
	async fn error_body_is_read_for_preview() {
		let response = axum::http::Response::builder()
			.status(503)
			.body("over capacity")
			.expect("Response fixture should build.");

		assert_eq!(read_body_preview(reqwest::Response::from(response)).await, "over capacity");
	}

	#[test]
	fn malformed_group_does_not_fail_status_decoding() {
		let status: RateLimitStatus = serde_json::from_str(
			r#"{
				"resources": {
					"geo": "oops",
					"help": { "/help/languages": { "limit": 15, "remaining": 15 } }
				}
			}"#,
		)
		.expect("One malformed group should not fail the whole body.");

		assert!(ResourceGroup::Geo.endpoints(&status.resources).is_none());
		assert!(ResourceGroup::Help.endpoints(&status.resources).is_some());
	}

	#[test]
	fn status_body_decodes_with_context() {
		let status: RateLimitStatus = serde_json::from_str(
			r#"{
				"rate_limit_context": { "application": "dBvQ" },
				"resources": { "geo": { "/geo/id/:place_id": { "limit": 75, "remaining": 75, "reset": 1 } } }
			}"#,
		)
		.expect("Status fixture should decode.");

		assert_eq!(
			status.rate_limit_context.and_then(|context| context.application).as_deref(),
			Some("dBvQ")
		);
		assert!(ResourceGroup::Geo.endpoints(&status.resources).is_some());
	}
}
