//! Secret wrappers that keep sensitive material out of logs.

// self
use crate::_prelude::*;

/// Redacted secret wrapper used for bearer tokens and the API secret key.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// API key/secret pair used as OAuth 2.0 client credentials.
#[derive(Clone, Debug)]
pub struct ClientCredentials {
	/// OAuth 2.0 client identifier (the API key).
	pub client_id: String,
	/// OAuth 2.0 client secret (the API secret key).
	pub client_secret: TokenSecret,
}
impl ClientCredentials {
	/// Creates a credential pair; empty values are accepted and rejected later by the provider.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: TokenSecret::new(client_secret) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn credentials_debug_hides_secret() {
		let credentials = ClientCredentials::new("api-key", "api-secret");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("api-key"));
		assert!(!rendered.contains("api-secret"));
	}
}
