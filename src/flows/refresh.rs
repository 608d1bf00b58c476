//! Standalone refresh-token grant with a hard deadline and per-refresher counters.
//!
//! [`TokenRefresher::refresh`] performs exactly one `grant_type=refresh_token` call per
//! invocation. It never touches a session, takes no locks, and does not deduplicate concurrent
//! calls. The whole exchange is bounded by [`DEFAULT_REFRESH_TIMEOUT`] unless the refresher was
//! built with [`TokenRefresher::with_timeout`].

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret, TokenRecord},
	error::ConfigError,
	flows,
	http::TokenHttpClient,
	oauth::{self as exchange, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{GrantType, descriptor::builder::validate_endpoint},
};
#[cfg(feature = "reqwest")]
use crate::{
	http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper, provider::ProviderDescriptor,
};

/// Deadline applied to every refresh exchange unless overridden.
pub const DEFAULT_REFRESH_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Inputs for one refresh exchange.
#[derive(Clone, Debug)]
pub struct RefreshRequest {
	/// Refresh token issued by a previous exchange.
	pub refresh_token: Secret,
	/// Registered client identifier.
	pub client_id: String,
	/// Client secret.
	pub client_secret: Secret,
	/// Narrowed scope set; sent only when present and non-empty.
	pub scope: Option<ScopeSet>,
	/// Token endpoint override for this call.
	pub token_endpoint: Option<Url>,
}
impl RefreshRequest {
	/// Creates a request with no scope and the refresher's token endpoint.
	pub fn new(
		refresh_token: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
	) -> Self {
		Self {
			refresh_token: Secret::new(refresh_token),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			scope: None,
			token_endpoint: None,
		}
	}

	/// Requests the given scopes. The provider decides whether narrowing is allowed.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = Some(scope);

		self
	}

	/// Sends this request to `url` instead of the refresher's endpoint.
	pub fn with_token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}
}

/// Performs refresh exchanges against one token endpoint.
pub struct TokenRefresher<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every refresh call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Default token endpoint.
	pub token_endpoint: Url,
	/// Deadline for a single exchange.
	pub timeout: StdDuration,
	/// Shared counters for refresh outcomes.
	pub metrics: Arc<RefreshMetrics>,
}
impl<C, M> TokenRefresher<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a refresher that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		token_endpoint: Url,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			token_endpoint,
			timeout: DEFAULT_REFRESH_TIMEOUT,
			metrics: Default::default(),
		}
	}

	/// Replaces the exchange deadline.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Exchanges `request.refresh_token` for a new token pair.
	///
	/// When the provider does not rotate the refresh token, the input token is carried into the
	/// returned record. A non-2xx reply surfaces as [`Error::Provider`] with the body untouched.
	pub async fn refresh(&self, request: RefreshRequest) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let result = span.instrument(self.exchange(&request)).await;

		match &result {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		obs::finish_flow(KIND, &result);

		result
	}

	async fn exchange(&self, request: &RefreshRequest) -> Result<TokenRecord> {
		let endpoint = match &request.token_endpoint {
			Some(url) => {
				validate_endpoint("token", url).map_err(ConfigError::from)?;

				url
			},
			None => &self.token_endpoint,
		};
		let grant = GrantType::RefreshToken;
		let scope =
			request.scope.as_ref().filter(|scope| !scope.is_empty()).map(ScopeSet::normalized);
		let mut form = vec![
			("refresh_token", request.refresh_token.expose()),
			("client_id", request.client_id.as_str()),
			("client_secret", request.client_secret.expose()),
			("grant_type", grant.as_str()),
		];

		if let Some(scope) = scope.as_deref() {
			form.push(("scope", scope));
		}

		flows::with_deadline(
			Some(self.timeout),
			exchange::exchange_token(
				self.http_client.as_ref(),
				self.transport_mapper.as_ref(),
				grant,
				endpoint,
				&form,
				Some(request.refresh_token.expose()),
			),
		)
		.await
	}
}
#[cfg(feature = "reqwest")]
impl TokenRefresher<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a reqwest-backed refresher for the Twitch token endpoint.
	pub fn new() -> Result<Self> {
		Ok(Self::with_http_client(
			ProviderDescriptor::twitch().map_err(ConfigError::from)?.endpoints.token,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Clone for TokenRefresher<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			token_endpoint: self.token_endpoint.clone(),
			timeout: self.timeout,
			metrics: self.metrics.clone(),
		}
	}
}
impl<C, M> Debug for TokenRefresher<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRefresher")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("timeout", &self.timeout)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_debug_redacts_secrets() {
		let request = RefreshRequest::new("RT1", "client-123", "s3cret")
			.with_scope(ScopeSet::new(["chat:read"]).expect("Scope fixture should be valid."));
		let rendered = format!("{request:?}");

		assert!(!rendered.contains("RT1"));
		assert!(!rendered.contains("s3cret"));
		assert!(rendered.contains("client-123"));
	}

	#[test]
	fn default_timeout_is_ten_seconds() {
		assert_eq!(DEFAULT_REFRESH_TIMEOUT, StdDuration::from_secs(10));
	}
}
