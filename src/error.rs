//! Route-level error types shared across flows, sessions, and the token exchange.

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::http::StatusCode;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// None of the variants render client secrets or token values in their `Display` output, so the
/// text is safe to show to end users.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (including a missing session facility).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Session backend failure.
	#[error("{0}")]
	Session(
		#[from]
		#[source]
		crate::session::SessionError,
	),
	/// Transport failure (DNS, TCP, TLS, timeout, malformed transport response).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint returned a 2xx response that could not be turned into a token record.
	#[error(transparent)]
	Response(#[from] ResponseError),

	/// The anti-forgery `state` was missing or did not match the session.
	#[error("Invalid state token returned from the identity provider.")]
	InvalidState,
	/// Token endpoint answered with a non-2xx status; `body` is the provider payload as sent.
	#[error("Token endpoint rejected the request with HTTP {status}: {body}.")]
	Provider {
		/// HTTP status code returned by the provider.
		status: u16,
		/// Parsed JSON error body, passed through untouched.
		body: serde_json::Value,
	},
}
impl Error {
	/// HTTP status a route should use when rendering this error to the user agent.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::InvalidState => StatusCode::BAD_REQUEST,
			Self::Transport(TransportError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
			Self::Transport(_) | Self::Response(_) | Self::Provider { .. } =>
				StatusCode::BAD_GATEWAY,
			Self::Config(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Returns the verbatim provider error body, if the provider rejected the exchange.
	pub fn provider_body(&self) -> Option<&serde_json::Value> {
		match self {
			Self::Provider { body, .. } => Some(body),
			_ => None,
		}
	}
}

/// Configuration and wiring failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The host did not supply a session for a request that needs one.
	#[error("No session is available; install session support on the host before routing OAuth requests.")]
	SessionUnavailable,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Client identifier failed validation.
	#[error("Client identifier is invalid.")]
	InvalidClientId(#[from] crate::auth::IdentifierError),
	/// Provider descriptor contains an invalid endpoint.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI parsed but cannot serve as an absolute callback URL.
	#[error("Redirect URI must be an absolute http(s) URL: {uri}.")]
	RelativeRedirect {
		/// Offending URI.
		uri: String,
	},
	/// Configured scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures while interpreting a successful token endpoint response.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint response carried no usable access token.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Authorization code exchange did not return a refresh token.
	#[error("Token endpoint response is missing refresh_token.")]
	MissingRefreshToken,
	/// Granted scopes could not be parsed.
	#[error("Token endpoint returned invalid scopes.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}

/// Transport-level failures (network, IO, deadlines).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// The token endpoint did not answer within the allotted time.
	#[error("Token endpoint did not respond within {}ms.", .after.as_millis())]
	Timeout {
		/// Deadline that elapsed.
		after: StdDuration,
	},
	/// The transport produced a response without recording its HTTP status.
	#[error("Transport returned a response without an HTTP status code.")]
	MissingStatus,
	/// Transport reported a failure the mapper could not classify.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Transport-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_codes_follow_error_class() {
		assert_eq!(Error::InvalidState.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(
			Error::from(TransportError::Timeout { after: StdDuration::from_secs(10) })
				.status_code(),
			StatusCode::GATEWAY_TIMEOUT
		);
		assert_eq!(
			Error::Provider { status: 400, body: serde_json::json!({ "error": "invalid_grant" }) }
				.status_code(),
			StatusCode::BAD_GATEWAY
		);
		assert_eq!(
			Error::from(ConfigError::SessionUnavailable).status_code(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn provider_body_is_exposed_verbatim() {
		let body = serde_json::json!({ "error": "invalid_grant", "extra": [1, 2] });
		let err = Error::Provider { status: 400, body: body.clone() };

		assert_eq!(err.provider_body(), Some(&body));
		assert!(Error::InvalidState.provider_body().is_none());
	}

	#[test]
	fn timeout_message_reports_deadline() {
		let err = TransportError::Timeout { after: StdDuration::from_secs(10) };

		assert_eq!(err.to_string(), "Token endpoint did not respond within 10000ms.");
	}
}
