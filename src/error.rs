//! Exporter-level error types shared across configuration, authentication, and polling.

// self
use crate::_prelude::*;

/// Exporter-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical exporter error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal at startup.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retried on the next cycle.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The rate-limit status call itself was throttled (HTTP 429).
	#[error("Rate-limit status endpoint is throttled until {}.", display_reset(.reset_at))]
	RateLimited {
		/// Instant parsed from `X-Rate-Limit-Reset`, when the header was usable.
		reset_at: Option<OffsetDateTime>,
	},
	/// Token endpoint rejected the API key/secret pair.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns `true` for errors that must stop the process.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Config(_))
	}
}

/// Configuration and startup failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// An integer-valued setting could not be parsed.
	#[error("`{key}` must be a positive integer, got `{value}`.")]
	InvalidInteger {
		/// Environment key (with prefix) that failed.
		key: String,
		/// Raw value that was supplied.
		value: String,
	},
	/// The HTTP port could not be parsed.
	#[error("`{key}` must be a TCP port, got `{value}`.")]
	InvalidPort {
		/// Environment key (with prefix) that failed.
		key: String,
		/// Raw value that was supplied.
		value: String,
	},
	/// The metrics path contains characters the router treats as route syntax.
	#[error("`{key}` must be a plain path without `:`, `*`, `{{` or `}}`, got `{value}`.")]
	InvalidPath {
		/// Environment key (with prefix) that failed.
		key: String,
		/// Raw value that was supplied.
		value: String,
	},
	/// A URL-valued setting could not be parsed.
	#[error("`{key}` is not a valid URL.")]
	InvalidUrl {
		/// Environment key (with prefix) that failed.
		key: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Token endpoint URL was rejected by the OAuth client.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenUrl {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Metrics listener could not bind.
	#[error("Failed to bind the metrics listener on {addr}.")]
	Bind {
		/// Address that was requested.
		addr: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry on the next cycle).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Rate-limit status endpoint answered with a status other than 200 or 429.
	#[error("Rate-limit status endpoint returned HTTP {status}: {body}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body: String,
	},
	/// Rate-limit status body did not match the expected shape.
	#[error("Rate-limit status endpoint returned malformed JSON.")]
	StatusResponseParse {
		/// Structured parsing failure, including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Logical call site (`token endpoint`, `rate-limit status endpoint`).
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call did not complete within the configured timeout.
	#[error("Request to {target} timed out.")]
	Timeout {
		/// Logical call site.
		target: &'static str,
	},
	/// Underlying IO failure surfaced during transport or while serving scrapes.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(target: &'static str, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { target, source: Box::new(src) }
	}

	/// Classifies a reqwest failure, separating timeouts from other network errors.
	pub fn from_reqwest(target: &'static str, err: ReqwestError) -> Self {
		if err.is_timeout() { Self::Timeout { target } } else { Self::network(target, err) }
	}
}

fn display_reset(reset_at: &Option<OffsetDateTime>) -> String {
	match reset_at {
		Some(instant) => instant.unix_timestamp().to_string(),
		None => "an unknown reset time".into(),
	}
}
