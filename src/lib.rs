//! Republishes Twitter API rate-limit status as Prometheus metrics: an app-only OAuth 2.0
//! client, a reset-aware polling loop, and a scrape endpoint.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod flatten;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod poll;
pub mod registry;
pub mod resource;
pub mod server;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::time::Duration as StdDuration;
	// crates.io
	use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
	// self
	use crate::{
		api::ApiClient,
		auth::{ClientCredentials, TokenSource},
		poll::{Clock, SleepFuture},
		registry::MetricRegistry,
	};

	/// Two-group payload shaped like the live `rate_limit_status` response.
	pub const TWO_GROUP_PAYLOAD: &str = r#"{
		"rate_limit_context": { "application": "app-token" },
		"resources": {
			"application": {
				"/application/rate_limit_status": { "limit": 180, "remaining": 179, "reset": 1735689600 }
			},
			"users": {
				"/users/show/:id": { "limit": 900, "remaining": 850, "reset": 1735689600 }
			}
		}
	}"#;

	/// Builds an isolated registry plus the handle used to render its exposition.
	pub fn test_registry(prefix: &str, name: &str) -> (Arc<MetricRegistry>, PrometheusHandle) {
		let recorder = PrometheusBuilder::new().build_recorder();
		let handle = recorder.handle();
		let registry = MetricRegistry::new(Arc::new(recorder), prefix, name);

		(Arc::new(registry), handle)
	}

	/// Builds an [`ApiClient`] that authenticates and polls against a mock server.
	pub fn test_api_client(base: &str) -> ApiClient {
		let base_url = Url::parse(base).expect("Mock base URL should parse.");
		let token_url =
			base_url.join("/oauth2/token").expect("Mock token URL should join successfully.");
		let credentials = ClientCredentials::new("test-key", "test-secret");
		let timeout = StdDuration::from_secs(5);
		let tokens = TokenSource::new(credentials, token_url, timeout)
			.expect("Token source should build for tests.");

		ApiClient::new(base_url, Arc::new(tokens), timeout)
			.expect("API client should build for tests.")
	}

	/// Clock that never sleeps and records every requested delay.
	#[derive(Debug)]
	pub struct FakeClock {
		now: Mutex<OffsetDateTime>,
		sleeps: Mutex<Vec<StdDuration>>,
	}
	impl FakeClock {
		/// Creates a clock frozen at `now`.
		pub fn at(now: OffsetDateTime) -> Self {
			Self { now: Mutex::new(now), sleeps: Mutex::default() }
		}

		/// Returns every delay requested so far.
		pub fn sleeps(&self) -> Vec<StdDuration> {
			self.sleeps.lock().clone()
		}
	}
	impl Clock for FakeClock {
		fn now(&self) -> OffsetDateTime {
			*self.now.lock()
		}

		fn sleep(&self, duration: StdDuration) -> SleepFuture<'_> {
			self.sleeps.lock().push(duration);

			let mut now = self.now.lock();

			*now += duration;

			Box::pin(async {})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::Deserialize;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use metrics_exporter_prometheus;
pub use reqwest;
pub use url;
// Consumed by the binary target only.
use color_eyre as _;
#[cfg(test)] use httpmock as _;
