//! OAuth client facade performing the app-only client-credentials grant.

pub use oauth2;

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, TokenRecord},
	error::{ConfigError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;

const TARGET: &str = "token endpoint";

/// Client-credentials facade bound to one token endpoint and credential pair.
pub struct TokenFacade {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
	client_id: String,
	token_url: Url,
}
impl TokenFacade {
	/// Builds the facade; credentials travel as HTTP Basic client authentication.
	pub fn new(
		credentials: &ClientCredentials,
		token_url: &Url,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let token_uri = TokenUrl::new(token_url.to_string())
			.map_err(|source| ConfigError::InvalidTokenUrl { source })?;
		let oauth_client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
			.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
			.set_token_uri(token_uri);

		Ok(Self {
			oauth_client,
			http_client,
			client_id: credentials.client_id.clone(),
			token_url: token_url.clone(),
		})
	}

	/// Performs the `client_credentials` grant and returns the issued bearer token.
	pub async fn exchange_client_credentials(&self) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(response)
	}
}
impl Debug for TokenFacade {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenFacade")
			.field("client_id", &self.client_id)
			.field("token_url", &self.token_url.as_str())
			.finish()
	}
}

fn map_token_response(response: FacadeTokenResponse) -> Result<TokenRecord> {
	let issued_at = OffsetDateTime::now_utc();
	let record = TokenRecord::new(response.access_token().secret().to_owned(), issued_at);

	match response.expires_in() {
		None => Ok(record),
		Some(expires_in) if expires_in.is_zero() => Err(TransientError::TokenEndpoint {
			message: "expires_in must be positive".into(),
			status: Some(200),
		}
		.into()),
		Some(expires_in) => {
			let secs = i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX);

			Ok(record.with_expires_in(Duration::seconds(secs)))
		},
	}
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta_status(meta.as_ref());

	if status == Some(429) {
		return Error::RateLimited { reset_at: meta.and_then(|value| value.rate_limit_reset) };
	}

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error, status),
		// Twitter answers bad credentials with its own error envelope, not the OAuth one.
		RequestTokenError::Parse(_, _) if matches!(status, Some(401 | 403)) => Error::InvalidClient {
			reason: format!("token endpoint returned HTTP {}", status_label(status)),
		},
		RequestTokenError::Parse(source, _body) =>
			TransientError::TokenResponseParse { source, status }.into(),
		RequestTokenError::Other(message) if matches!(status, Some(401 | 403)) =>
			Error::InvalidClient { reason: message },
		RequestTokenError::Other(message) =>
			TransientError::TokenEndpoint { message, status }.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let code = response.error().as_ref().to_string();
	let message = match response.error_description() {
		Some(description) => format!("{code}: {description}"),
		None => code.clone(),
	};

	if is_client_error(&code) || status == Some(401) {
		Error::InvalidClient { reason: message }
	} else {
		TransientError::TokenEndpoint { message, status }.into()
	}
}

fn map_transport_error(err: HttpClientError<ReqwestError>, status: Option<u16>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => TransportError::from_reqwest(TARGET, *inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error: {message}"),
			status,
		}
		.into(),
		_ => TransientError::TokenEndpoint { message: "HTTP client error".into(), status }.into(),
	}
}

fn is_client_error(code: &str) -> bool {
	code.eq_ignore_ascii_case("invalid_client") || code.eq_ignore_ascii_case("unauthorized_client")
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn status_label(status: Option<u16>) -> String {
	status.map_or_else(|| "unknown".into(), |code| code.to_string())
}
