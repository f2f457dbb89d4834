//! Flattens the nested per-group response into one row per endpoint.

// self
use crate::{
	_prelude::*,
	resource::{ResourceGroup, Resources},
};

/// One `(resource, endpoint, limit, remaining)` row of the flattened response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointLimit {
	/// Group the endpoint belongs to.
	pub resource: ResourceGroup,
	/// Endpoint path as reported by the API (e.g. `/users/show/:id`).
	pub endpoint: String,
	/// Request ceiling for the current window.
	pub limit: u64,
	/// Requests left in the current window.
	pub remaining: u64,
}

/// Flattened view of one response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Flattened {
	/// Rows in [`ResourceGroup::ALL`] order, endpoints sorted by path.
	pub rows: Vec<EndpointLimit>,
	/// Tracked groups absent from the response or dropped as malformed.
	pub missing: Vec<ResourceGroup>,
}

/// Flattens every group in `groups`, skipping (and reporting) those the response omits or
/// sends malformed.
pub fn flatten(resources: &Resources, groups: &[ResourceGroup]) -> Flattened {
	let mut flattened = Flattened::default();

	for &group in groups {
		let Some(endpoints) = group.endpoints(resources) else {
			tracing::warn!(
				resource = group.as_str(),
				"Resource group absent or malformed in rate-limit status response; skipping."
			);
			flattened.missing.push(group);

			continue;
		};

		flattened.rows.extend(endpoints.iter().map(|(endpoint, quota)| EndpointLimit {
			resource: group,
			endpoint: endpoint.clone(),
			limit: quota.limit,
			remaining: quota.remaining,
		}));
	}

	flattened
}
