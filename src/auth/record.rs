//! Bearer token records and lifecycle helpers.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// Token is currently valid.
	Active,
	/// Token exceeded its expiry instant.
	Expired,
}

/// App-only bearer token issued by the client-credentials grant.
#[derive(Clone)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the token endpoint answered.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `expires_in`; `None` when the provider issued a non-expiring token.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Creates a record that never expires locally.
	pub fn new(access_token: impl Into<String>, issued_at: OffsetDateTime) -> Self {
		Self { access_token: TokenSecret::new(access_token), issued_at, expires_at: None }
	}

	/// Sets a relative expiry from the issued instant.
	///
	/// Durations that overflow the representable range leave the record non-expiring.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_at = self.issued_at.checked_add(expires_in);

		self
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		match self.expires_at {
			Some(expires_at) if instant >= expires_at => TokenStatus::Expired,
			_ => TokenStatus::Active,
		}
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Determines whether the record should be replaced before use.
	///
	/// Expiring tokens are refreshed once they enter the preemptive `window`.
	pub fn should_refresh(&self, now: OffsetDateTime, window: Duration) -> bool {
		if self.is_expired_at(now) {
			return true;
		}

		match self.expires_at {
			Some(expires_at) => expires_at - now <= window,
			None => false,
		}
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
