// crates.io
use tracing::Level;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};
// self
use crate::_prelude::*;

/// Builds the filter used by [`init_tracing`].
///
/// `directives` (normally `RUST_LOG`) wins when present; otherwise everything at `level` and
/// above is enabled.
pub fn env_filter(level: Level, directives: Option<&str>) -> EnvFilter {
	EnvFilter::builder()
		.with_default_directive(LevelFilter::from_level(level).into())
		.parse_lossy(directives.unwrap_or_default())
}

/// Installs the global fmt subscriber, honouring `RUST_LOG` over `level`.
pub fn init_tracing(level: Level) -> Result<(), Box<dyn StdError + Send + Sync>> {
	let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

	tracing_subscriber::fmt().with_env_filter(env_filter(level, directives.as_deref())).try_init()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn level_is_the_default_directive() {
		assert_eq!(env_filter(Level::DEBUG, None).max_level_hint(), Some(LevelFilter::DEBUG));
		assert_eq!(env_filter(Level::WARN, Some("")).max_level_hint(), Some(LevelFilter::WARN));
	}

	#[test]
	fn explicit_directives_override_level() {
		assert_eq!(env_filter(Level::INFO, Some("error")).max_level_hint(), Some(LevelFilter::ERROR));
	}
}
