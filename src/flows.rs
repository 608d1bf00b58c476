//! Flow orchestrators for the authorization redirect, the callback, and token refresh.

pub mod authorize;
pub mod callback;
pub mod refresh;

pub use authorize::*;
pub use callback::*;
pub use refresh::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*, config::OAuthConfig, error::TransportError, http::TokenHttpClient,
	oauth::TransportErrorMapper,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Flow specialized for the crate's default reqwest transport stack.
pub type ReqwestFlow = OAuthFlow<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Runs the authorization-code flow for one [`OAuthConfig`].
///
/// The flow owns the HTTP client, the transport error mapper, and the configuration so the
/// redirect and callback halves only deal with grant-specific logic. Cloning is cheap; every
/// field is reference counted.
pub struct OAuthFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Validated client configuration.
	pub config: Arc<OAuthConfig>,
}
impl<C, M> OAuthFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a flow that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: impl Into<Arc<OAuthConfig>>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config: config.into(),
		}
	}

	/// Builds a [`TokenRefresher`] sharing this flow's transport and token endpoint.
	pub fn refresher(&self) -> TokenRefresher<C, M> {
		TokenRefresher::with_http_client(
			self.config.descriptor.endpoints.token.clone(),
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)
	}

	/// Prepares a [`RefreshRequest`] carrying this flow's client credentials.
	pub fn refresh_request(&self, refresh_token: impl Into<String>) -> RefreshRequest {
		RefreshRequest::new(
			refresh_token,
			self.config.client_id.as_ref(),
			self.config.client_secret.clone(),
		)
	}
}
#[cfg(feature = "reqwest")]
impl OAuthFlow<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a flow that provisions its own reqwest transport with redirects disabled.
	pub fn new(config: impl Into<Arc<OAuthConfig>>) -> Result<Self> {
		Ok(Self::with_http_client(
			config,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Clone for OAuthFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			config: self.config.clone(),
		}
	}
}
impl<C, M> Debug for OAuthFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthFlow").field("config", &self.config).finish()
	}
}

async fn with_deadline<T, F>(deadline: Option<StdDuration>, exchange: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	match deadline {
		Some(after) => tokio::time::timeout(after, exchange)
			.await
			.map_err(|_| Error::from(TransportError::Timeout { after }))?,
		None => exchange.await,
	}
}
