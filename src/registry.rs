//! Per-endpoint gauge pairs and the poll-attempt counter.
//!
//! The registry writes into an injected [`Recorder`] instead of the global one, so the
//! production Prometheus recorder and test recorders never collide. Gauge pairs are created the
//! first time a `(resource, endpoint)` key is seen and live for the rest of the process.

// crates.io
use metrics::{Counter, Gauge, Key, KeyName, Label, Level, Metadata, Recorder, SharedString};
// self
use crate::{_prelude::*, flatten::EndpointLimit, resource::ResourceGroup};

/// Recorder shared between the registry and whoever renders it.
pub type SharedRecorder = Arc<dyn Recorder + Send + Sync>;

/// Identity of one gauge pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointKey {
	/// Resource group the endpoint belongs to.
	pub resource: ResourceGroup,
	/// Endpoint path.
	pub endpoint: String,
}
impl EndpointKey {
	/// Creates a key for the provided group and endpoint path.
	pub fn new(resource: ResourceGroup, endpoint: impl Into<String>) -> Self {
		Self { resource, endpoint: endpoint.into() }
	}
}

/// Limit and remaining gauges for one endpoint.
#[derive(Clone)]
pub struct GaugePair {
	/// `<prefix>_limit` gauge.
	pub limit: Gauge,
	/// `<prefix>_remaining` gauge.
	pub remaining: Gauge,
}
impl Debug for GaugePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("GaugePair(..)")
	}
}

/// Owner of every instrument this exporter publishes.
pub struct MetricRegistry {
	recorder: SharedRecorder,
	name: String,
	limit_name: String,
	remaining_name: String,
	counter: Counter,
	gauges: RwLock<HashMap<EndpointKey, GaugePair>>,
}
impl MetricRegistry {
	/// Registers the attempt counter and metric descriptions under `prefix`.
	///
	/// `name` becomes the constant `name` label on every gauge.
	pub fn new(recorder: SharedRecorder, prefix: &str, name: impl Into<String>) -> Self {
		let counter_name = format!("{prefix}_counter");
		let limit_name = format!("{prefix}_limit");
		let remaining_name = format!("{prefix}_remaining");

		recorder.describe_counter(
			KeyName::from(counter_name.clone()),
			None,
			SharedString::from("Increment each time we call the API to get rate limits"),
		);
		recorder.describe_gauge(
			KeyName::from(limit_name.clone()),
			None,
			SharedString::from("The request limit for the endpoint rate limit"),
		);
		recorder.describe_gauge(
			KeyName::from(remaining_name.clone()),
			None,
			SharedString::from("The number of requests left in the period for the endpoint rate limit"),
		);

		// The `type` label is a fixed placeholder kept for dashboard compatibility.
		let counter_key = Key::from_parts(counter_name, vec![Label::new("type", "")]);
		let counter = recorder.register_counter(&counter_key, &metadata());

		Self {
			recorder,
			name: name.into(),
			limit_name,
			remaining_name,
			counter,
			gauges: RwLock::new(HashMap::new()),
		}
	}

	/// Counts one poll attempt.
	pub fn increment_attempt(&self) {
		self.counter.increment(1);
	}

	/// Returns the pair for `key`, creating and registering it on first use.
	pub fn ensure_gauges(&self, key: &EndpointKey) -> GaugePair {
		if let Some(pair) = self.gauges.read().get(key) {
			return pair.clone();
		}

		let mut gauges = self.gauges.write();

		gauges
			.entry(key.clone())
			.or_insert_with(|| {
				tracing::debug!(
					resource = key.resource.as_str(),
					endpoint = %key.endpoint,
					"Registering gauges for new endpoint."
				);

				self.register_pair(key)
			})
			.clone()
	}

	/// Overwrites both gauges of `pair`.
	pub fn update(&self, pair: &GaugePair, limit: u64, remaining: u64) {
		pair.limit.set(limit as f64);
		pair.remaining.set(remaining as f64);
	}

	/// Ensures and updates a pair for every row; returns the number of rows applied.
	pub fn apply(&self, rows: &[EndpointLimit]) -> usize {
		for row in rows {
			let pair = self.ensure_gauges(&EndpointKey::new(row.resource, row.endpoint.as_str()));

			self.update(&pair, row.limit, row.remaining);
		}

		rows.len()
	}

	/// Number of distinct gauge pairs created so far.
	pub fn len(&self) -> usize {
		self.gauges.read().len()
	}

	/// Returns `true` until the first pair is created.
	pub fn is_empty(&self) -> bool {
		self.gauges.read().is_empty()
	}

	fn register_pair(&self, key: &EndpointKey) -> GaugePair {
		let labels = vec![
			Label::new("resource", key.resource.as_str()),
			Label::new("endpoint", key.endpoint.clone()),
			Label::new("name", self.name.clone()),
		];
		let limit = Key::from_parts(self.limit_name.clone(), labels.clone());
		let remaining = Key::from_parts(self.remaining_name.clone(), labels);

		GaugePair {
			limit: self.recorder.register_gauge(&limit, &metadata()),
			remaining: self.recorder.register_gauge(&remaining, &metadata()),
		}
	}
}
impl Debug for MetricRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MetricRegistry")
			.field("name", &self.name)
			.field("limit_name", &self.limit_name)
			.field("remaining_name", &self.remaining_name)
			.field("pairs", &self.len())
			.finish()
	}
}

fn metadata() -> Metadata<'static> {
	Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}
