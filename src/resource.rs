//! Resource groups and the per-group shape of the rate-limit status response.
//!
//! The API nests `endpoint -> { limit, remaining, reset }` maps under one field per resource
//! group. [`ResourceGroup`] is the closed set of groups this exporter tracks, and
//! [`ResourceGroup::endpoints`] resolves each one to its field with an exhaustive match.
//! Groups are decoded one at a time, so a group with an unexpected shape is logged and dropped
//! without losing the others.

// crates.io
use serde::Deserializer;
use serde_json::Value;
// self
use crate::_prelude::*;

/// Rate-limit numbers reported for one endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct EndpointQuota {
	/// Request ceiling for the current window.
	pub limit: u64,
	/// Requests left in the current window.
	pub remaining: u64,
	/// Unix epoch (seconds) at which the window resets.
	#[serde(default)]
	pub reset: Option<i64>,
}

/// Endpoint path to quota map for one resource group.
pub type EndpointQuotas = BTreeMap<String, EndpointQuota>;

/// `resources` object of the rate-limit status response.
///
/// Groups the API adds later are ignored; groups it drops, or sends with an unexpected shape,
/// deserialize as `None`.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resources {
	pub application: Option<EndpointQuotas>,
	pub favorites: Option<EndpointQuotas>,
	pub followers: Option<EndpointQuotas>,
	pub friends: Option<EndpointQuotas>,
	pub friendships: Option<EndpointQuotas>,
	pub geo: Option<EndpointQuotas>,
	pub help: Option<EndpointQuotas>,
	pub lists: Option<EndpointQuotas>,
	pub search: Option<EndpointQuotas>,
	pub statuses: Option<EndpointQuotas>,
	pub trends: Option<EndpointQuotas>,
	pub users: Option<EndpointQuotas>,
}
impl<'de> Deserialize<'de> for Resources {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let mut raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
		let mut resources = Self::default();

		for group in ResourceGroup::ALL {
			let Some(value) = raw.remove(group.as_str()).filter(|value| !value.is_null()) else {
				continue;
			};

			let decoded: Result<EndpointQuotas, _> = serde_path_to_error::deserialize(value);

			match decoded {
				Ok(endpoints) => *group.slot_mut(&mut resources) = Some(endpoints),
				Err(e) => tracing::warn!(
					resource = group.as_str(),
					path = %e.path(),
					error = %e.inner(),
					"Malformed resource group in rate-limit status response; skipping."
				),
			}
		}

		Ok(resources)
	}
}

/// Resource groups whose endpoints are exported.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceGroup {
	Application,
	Favorites,
	Followers,
	Friends,
	Friendships,
	Geo,
	Help,
	Lists,
	Search,
	Statuses,
	Trends,
	Users,
}
impl ResourceGroup {
	/// Every tracked group, in export order.
	pub const ALL: [Self; 12] = [
		Self::Application,
		Self::Favorites,
		Self::Followers,
		Self::Friends,
		Self::Friendships,
		Self::Geo,
		Self::Help,
		Self::Lists,
		Self::Search,
		Self::Statuses,
		Self::Trends,
		Self::Users,
	];

	/// Returns the API name, also used as the `resource` label value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Application => "application",
			Self::Favorites => "favorites",
			Self::Followers => "followers",
			Self::Friends => "friends",
			Self::Friendships => "friendships",
			Self::Geo => "geo",
			Self::Help => "help",
			Self::Lists => "lists",
			Self::Search => "search",
			Self::Statuses => "statuses",
			Self::Trends => "trends",
			Self::Users => "users",
		}
	}

	/// Resolves this group's endpoint map inside `resources`.
	pub fn endpoints(self, resources: &Resources) -> Option<&EndpointQuotas> {
		match self {
			Self::Application => resources.application.as_ref(),
			Self::Favorites => resources.favorites.as_ref(),
			Self::Followers => resources.followers.as_ref(),
			Self::Friends => resources.friends.as_ref(),
			Self::Friendships => resources.friendships.as_ref(),
			Self::Geo => resources.geo.as_ref(),
			Self::Help => resources.help.as_ref(),
			Self::Lists => resources.lists.as_ref(),
			Self::Search => resources.search.as_ref(),
			Self::Statuses => resources.statuses.as_ref(),
			Self::Trends => resources.trends.as_ref(),
			Self::Users => resources.users.as_ref(),
		}
	}

	fn slot_mut(self, resources: &mut Resources) -> &mut Option<EndpointQuotas> {
		match self {
			Self::Application => &mut resources.application,
			Self::Favorites => &mut resources.favorites,
			Self::Followers => &mut resources.followers,
			Self::Friends => &mut resources.friends,
			Self::Friendships => &mut resources.friendships,
			Self::Geo => &mut resources.geo,
			Self::Help => &mut resources.help,
			Self::Lists => &mut resources.lists,
			Self::Search => &mut resources.search,
			Self::Statuses => &mut resources.statuses,
			Self::Trends => &mut resources.trends,
			Self::Users => &mut resources.users,
		}
	}

	/// Comma-separated `resources` query value covering every tracked group.
	pub fn query_value() -> String {
		Self::ALL.iter().map(|group| group.as_str()).collect::<Vec<_>>().join(",")
	}
}
impl Display for ResourceGroup {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
