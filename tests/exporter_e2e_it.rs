// std
use std::{
	net::{Ipv4Addr, SocketAddr},
	time::Duration as StdDuration,
};
// crates.io
use httpmock::prelude::*;
// self
use twitter_api_metrics::{
	_preludet::*,
	poll::{PollPolicy, Poller, TokioClock},
	server::MetricsServer,
};

fn counter_value(rendered: &str, metric: &str) -> f64 {
	let prefix = format!("{metric}{{type=\"\"}} ");

	rendered
		.lines()
		.find_map(|line| line.strip_prefix(&prefix))
		.and_then(|value| value.trim().parse().ok())
		.unwrap_or_default()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scrape_reflects_live_polling() {
	let api = MockServer::start_async().await;
	let _token = api
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"bearer\",\"access_token\":\"e2e-token\"}");
		})
		.await;
	let _status = api
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/application/rate_limit_status.json");
			then.status(200).header("content-type", "application/json").body(TWO_GROUP_PAYLOAD);
		})
		.await;
	let (registry, handle) = test_registry("twitter_api_ratelimits", "e2e");
	let server =
		MetricsServer::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), "/metrics", handle)
			.await
			.expect("Metrics server should bind on loopback.");
	let addr = server.local_addr();
	let poller = Poller::new(
		Arc::new(test_api_client(&api.base_url())),
		registry,
		Arc::new(TokioClock),
		PollPolicy::new(StdDuration::from_secs(1)),
	);
	let polling = tokio::spawn(async move { poller.run().await });
	let serving = tokio::spawn(server.serve());

	tokio::time::sleep(StdDuration::from_millis(3_500)).await;

	let body = ReqwestClient::new()
		.get(format!("http://{addr}/metrics"))
		.send()
		.await
		.expect("Scrape should reach the metrics server.")
		.text()
		.await
		.expect("Scrape body should be readable.");

	polling.abort();
	serving.abort();

	let limit_lines =
		body.lines().filter(|line| line.starts_with("twitter_api_ratelimits_limit{")).count();

	assert_eq!(limit_lines, 2, "{body}");
	assert!(counter_value(&body, "twitter_api_ratelimits_counter") >= 3.0, "{body}");
	assert!(
		body.contains(
			"twitter_api_ratelimits_limit{resource=\"users\",endpoint=\"/users/show/:id\",name=\"e2e\"} 900"
		),
		"{body}"
	);
}
