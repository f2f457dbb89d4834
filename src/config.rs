//! Environment-driven configuration with per-key fallbacks.
//!
//! Every key is read as `TWITTER_API_METRICS_<KEY>`. Only the integer, port, path, and URL keys
//! are validated; the API credentials are accepted as-is and fail later at the token endpoint when
//! wrong or empty.

// std
use std::{path::PathBuf, time::Duration as StdDuration};
// crates.io
use tracing::Level;
// self
use crate::{_prelude::*, error::ConfigError};

/// Prefix shared by every environment key.
pub const ENV_PREFIX: &str = "TWITTER_API_METRICS_";

const DEFAULT_NAME: &str = "default";
const DEFAULT_HTTP_PORT: &str = "9100";
const DEFAULT_HTTP_PATH: &str = "metrics";
const DEFAULT_METRICS_PREFIX: &str = "twitter_api_ratelimits";
const DEFAULT_INTERVAL_SECONDS: &str = "10";
const DEFAULT_LOG_LEVEL: &str = "INFO";
const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";
const DEFAULT_TOKEN_URL: &str = "https://api.twitter.com/oauth2/token";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: &str = "10";

/// Loads an optional `.env` file into the process environment, returning its path.
pub fn load_env_file() -> Option<PathBuf> {
	dotenvy::dotenv().ok()
}

/// Reads only `LOG_LEVEL` from the process environment.
///
/// Logging can start before the remaining keys are validated, so a fatal configuration error is
/// reported through the subscriber.
pub fn log_level_from_env() -> Level {
	log_level_from_lookup(|key| std::env::var(key).ok())
}

/// Reads only `LOG_LEVEL` through `lookup`, which receives fully prefixed keys.
pub fn log_level_from_lookup<F>(lookup: F) -> Level
where
	F: Fn(&str) -> Option<String>,
{
	parse_log_level(&PrefixedEnv { lookup }.get("LOG_LEVEL", DEFAULT_LOG_LEVEL))
}

/// Fully resolved exporter configuration.
#[derive(Clone)]
pub struct Config {
	/// Constant `name` label distinguishing exporter instances.
	pub name: String,
	/// Port the metrics server binds on.
	pub http_port: u16,
	/// Path (without leading slash) serving the exposition.
	pub http_path: String,
	/// Prefix applied to every metric name.
	pub metrics_prefix: String,
	/// OAuth2 client identifier (the Twitter API key).
	pub api_key: String,
	/// OAuth2 client secret (the Twitter API secret key).
	pub api_secret_key: String,
	/// Delay between successful or failed polls.
	pub interval: StdDuration,
	/// Maximum log verbosity.
	pub log_level: Level,
	/// Base URL for the rate-limit status call.
	pub api_base_url: Url,
	/// Client-credentials token endpoint.
	pub token_url: Url,
	/// Upper bound for each outbound HTTP call.
	pub request_timeout: StdDuration,
}
impl Config {
	/// Reads the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads configuration through `lookup`, which receives fully prefixed keys.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let env = PrefixedEnv { lookup };
		let interval = env.positive_seconds("INTERVAL_SECONDS", DEFAULT_INTERVAL_SECONDS)?;
		let request_timeout =
			env.positive_seconds("REQUEST_TIMEOUT_SECONDS", DEFAULT_REQUEST_TIMEOUT_SECONDS)?;
		let http_port = {
			let value = env.get("HTTP_PORT", DEFAULT_HTTP_PORT);

			value
				.trim()
				.parse::<u16>()
				.map_err(|_| ConfigError::InvalidPort { key: prefixed("HTTP_PORT"), value })?
		};

		Ok(Self {
			name: env.get("NAME", DEFAULT_NAME),
			http_port,
			http_path: env.path("HTTP_PATH", DEFAULT_HTTP_PATH)?,
			metrics_prefix: env.get("METRICS_PREFIX", DEFAULT_METRICS_PREFIX),
			api_key: env.get("API_KEY", ""),
			api_secret_key: env.get("API_SECRET_KEY", ""),
			interval,
			log_level: log_level_from_lookup(&env.lookup),
			api_base_url: env.url("API_BASE_URL", DEFAULT_API_BASE_URL)?,
			token_url: env.url("TOKEN_URL", DEFAULT_TOKEN_URL)?,
			request_timeout,
		})
	}

	/// Route the metrics server answers on, always with a single leading slash.
	pub fn route(&self) -> String {
		format!("/{}", self.http_path.trim_start_matches('/'))
	}
}
impl Debug for Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("name", &self.name)
			.field("http_port", &self.http_port)
			.field("http_path", &self.http_path)
			.field("metrics_prefix", &self.metrics_prefix)
			.field("api_key_set", &!self.api_key.is_empty())
			.field("api_secret_key_set", &!self.api_secret_key.is_empty())
			.field("interval", &self.interval)
			.field("log_level", &self.log_level)
			.field("api_base_url", &self.api_base_url.as_str())
			.field("token_url", &self.token_url.as_str())
			.field("request_timeout", &self.request_timeout)
			.finish()
	}
}

struct PrefixedEnv<F> {
	lookup: F,
}
impl<F> PrefixedEnv<F>
where
	F: Fn(&str) -> Option<String>,
{
	fn get(&self, key: &str, fallback: &str) -> String {
		(self.lookup)(&prefixed(key)).unwrap_or_else(|| fallback.to_owned())
	}

	fn positive_seconds(&self, key: &str, fallback: &str) -> Result<StdDuration, ConfigError> {
		let value = self.get(key, fallback);

		match value.trim().parse::<u64>() {
			Ok(secs) if secs > 0 => Ok(StdDuration::from_secs(secs)),
			_ => Err(ConfigError::InvalidInteger { key: prefixed(key), value }),
		}
	}

	fn path(&self, key: &str, fallback: &str) -> Result<String, ConfigError> {
		let value = self.get(key, fallback);

		if value.contains([':', '*', '{', '}']) {
			return Err(ConfigError::InvalidPath { key: prefixed(key), value });
		}

		Ok(value)
	}

	fn url(&self, key: &str, fallback: &str) -> Result<Url, ConfigError> {
		let value = self.get(key, fallback);

		Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl { key: prefixed(key), source })
	}
}

fn prefixed(key: &str) -> String {
	format!("{ENV_PREFIX}{key}")
}

fn parse_log_level(raw: &str) -> Level {
	Level::from_str(raw.trim()).unwrap_or(Level::INFO)
}
