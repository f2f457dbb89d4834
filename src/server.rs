//! Scrape endpoint rendering the Prometheus text exposition on every request.

// std
use std::net::{Ipv4Addr, SocketAddr};
// crates.io
use axum::{Router, extract::State, http::header, response::IntoResponse, routing};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Content type of the text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Builds the router serving `route`.
pub fn router(route: &str, handle: PrometheusHandle) -> Router {
	Router::new().route(route, routing::get(render)).with_state(handle)
}

/// Bound, not yet serving, metrics listener.
pub struct MetricsServer {
	listener: TcpListener,
	local_addr: SocketAddr,
	route: String,
	router: Router,
}
impl MetricsServer {
	/// Binds `0.0.0.0:<port>`.
	pub async fn bind_port(port: u16, route: &str, handle: PrometheusHandle) -> Result<Self> {
		Self::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), route, handle).await
	}

	/// Binds `addr`; failure is reported as [`ConfigError::Bind`].
	pub async fn bind(addr: SocketAddr, route: &str, handle: PrometheusHandle) -> Result<Self> {
		let bind_error = |source| ConfigError::Bind { addr: addr.to_string(), source };
		let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
		let local_addr = listener.local_addr().map_err(bind_error)?;

		Ok(Self { listener, local_addr, route: route.to_owned(), router: router(route, handle) })
	}

	/// Address actually bound (useful with port 0).
	pub fn local_addr(&self) -> SocketAddr {
		self.local_addr
	}

	/// Serves scrapes until the listener fails.
	pub async fn serve(self) -> Result<()> {
		tracing::info!(addr = %self.local_addr, route = %self.route, "Serving metrics.");

		axum::serve(self.listener, self.router).await.map_err(TransportError::from)?;

		Ok(())
	}
}
impl Debug for MetricsServer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MetricsServer")
			.field("local_addr", &self.local_addr)
			.field("route", &self.route)
			.finish()
	}
}

async fn render(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
	([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], handle.render())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::test_registry, config::Config};

	#[tokio::test]
	async fn serves_exposition_on_configured_route_only() {
		let (registry, handle) = test_registry("tw", "unit");
		let server = MetricsServer::bind((Ipv4Addr::LOCALHOST, 0).into(), "/metrics", handle)
			.await
			.expect("Loopback listener should bind.");
		let addr = server.local_addr();

		registry.increment_attempt();
		tokio::spawn(server.serve());

		let client = ReqwestClient::new();
		let response = client
			.get(format!("http://{addr}/metrics"))
			.send()
			.await
			.expect("Scrape request should succeed.");

		assert_eq!(response.status(), 200);
		assert_eq!(
			response.headers().get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok()),
			Some(EXPOSITION_CONTENT_TYPE)
		);

		let body = response.text().await.expect("Scrape body should be readable.");

		assert!(body.contains("tw_counter{type=\"\"} 1"), "{body}");

		let missing = client
			.get(format!("http://{addr}/other"))
			.send()
			.await
			.expect("Request to unknown route should complete.");

		assert_eq!(missing.status(), 404);
	}

	#[test]
	fn accepted_config_paths_build_routers() {
		for path in ["", "metrics", "/internal/metrics"] {
			let config = Config::from_lookup(|key| {
				(key == "TWITTER_API_METRICS_HTTP_PATH").then(|| path.to_owned())
			})
			.expect("Plain paths should be accepted.");
			let (_registry, handle) = test_registry("tw", "unit");

			router(&config.route(), handle);
		}
	}

	#[tokio::test]
	async fn bind_conflict_is_a_config_error() {
		let (_registry, handle) = test_registry("tw", "unit");
		let first = MetricsServer::bind((Ipv4Addr::LOCALHOST, 0).into(), "/metrics", handle.clone())
			.await
			.expect("First listener should bind.");
		let err = MetricsServer::bind(first.local_addr(), "/metrics", handle)
			.await
			.expect_err("Second bind on the same address should fail.");

		assert!(matches!(err, Error::Config(ConfigError::Bind { .. })));
		assert!(err.is_fatal());
	}
}
