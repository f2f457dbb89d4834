//! Twitter API rate-limit exporter daemon.

// std
use std::{process, sync::Arc};
// crates.io
use color_eyre::eyre::Report;
use metrics_exporter_prometheus::PrometheusBuilder;
// self
use twitter_api_metrics::{
	api::ApiClient,
	auth::{ClientCredentials, TokenSource},
	config::{self, Config},
	obs,
	poll::{PollPolicy, Poller, TokioClock},
	registry::MetricRegistry,
	server::MetricsServer,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let env_file = config::load_env_file();

	obs::init_tracing(config::log_level_from_env()).map_err(Report::msg)?;

	if let Some(path) = env_file {
		tracing::debug!(path = %path.display(), "Loaded environment file.");
	}

	let config = match Config::from_env() {
		Ok(config) => config,
		Err(e) => {
			tracing::error!(error = %e, "Invalid configuration.");
			process::exit(1);
		},
	};

	tracing::info!(?config, "Loaded configuration.");

	let recorder = PrometheusBuilder::new().build_recorder();
	let handle = recorder.handle();
	let registry =
		Arc::new(MetricRegistry::new(Arc::new(recorder), &config.metrics_prefix, &config.name));
	let credentials = ClientCredentials::new(&config.api_key, &config.api_secret_key);
	let tokens = Arc::new(TokenSource::new(
		credentials,
		config.token_url.clone(),
		config.request_timeout,
	)?);
	let api = Arc::new(ApiClient::new(config.api_base_url.clone(), tokens, config.request_timeout)?);
	let poller =
		Poller::new(api, registry, Arc::new(TokioClock), PollPolicy::new(config.interval));
	let server = match MetricsServer::bind_port(config.http_port, &config.route(), handle).await {
		Ok(server) => server,
		Err(e) => {
			tracing::error!(error = %e, port = config.http_port, "Failed to start metrics server.");
			process::exit(1);
		},
	};

	tokio::spawn(async move { poller.run().await });

	if let Err(e) = server.serve().await {
		tracing::error!(error = %e, "Metrics server stopped.");
		process::exit(1);
	}

	Ok(())
}
