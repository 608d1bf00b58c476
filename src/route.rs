//! Route dispatch binding one [`OAuthFlow`] to the redirect URI's path.
//!
//! A single path serves both halves of the flow. A request without `code` starts an
//! authorization; a request with `code` is treated as the provider callback. Hosts plug in an
//! [`AuthorizationContinuation`] to decide what happens with the issued tokens and, optionally,
//! an [`ErrorRenderer`] that turns callback failures into a response body.

// crates.io
use oauth2::http::{
	StatusCode,
	header::{CONTENT_TYPE, HeaderValue, LOCATION},
	request::Parts,
};
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	config::OAuthConfig,
	error::ConfigError,
	flows::{CallbackQuery, OAuthFlow},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs,
	session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, Session},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Response type produced by the route.
pub type RouteResponse = oauth2::http::Response<Vec<u8>>;

/// Boxed future returned by continuations and error renderers.
pub type RouteFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

#[cfg(feature = "reqwest")]
/// Route specialized for the crate's default reqwest transport stack.
pub type ReqwestRoute = OAuthRoute<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Request state handed to an [`AuthorizationContinuation`].
pub struct CallbackContext<'a> {
	/// Parts of the inbound callback request.
	pub request: &'a Parts,
	/// Session bound to the request.
	pub session: &'a mut dyn Session,
}
impl Debug for CallbackContext<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackContext").field("uri", &self.request.uri).finish_non_exhaustive()
	}
}

/// Host logic run after a successful code exchange.
///
/// The continuation alone decides session writes, redirects, and the response body. The route
/// awaits the returned future, so both immediate and deferred completion are supported.
pub trait AuthorizationContinuation
where
	Self: Send + Sync,
{
	/// Produces the response for a completed authorization.
	fn complete<'a>(
		&'a self,
		ctx: CallbackContext<'a>,
		record: TokenRecord,
	) -> RouteFuture<'a, Result<RouteResponse>>;
}

/// Turns a callback failure into a response body.
pub trait ErrorRenderer
where
	Self: Send + Sync,
{
	/// Renders `error` as text for the user agent.
	fn render<'a>(&'a self, error: &'a Error) -> RouteFuture<'a, String>;
}

/// Stores both tokens in the session and redirects to a landing path.
#[derive(Clone, Debug)]
pub struct SessionRedirect {
	/// Location the user agent is sent to once the tokens are stored.
	pub landing_path: String,
}
impl SessionRedirect {
	/// Creates a continuation redirecting to `landing_path`.
	pub fn new(landing_path: impl Into<String>) -> Self {
		Self { landing_path: landing_path.into() }
	}
}
impl Default for SessionRedirect {
	fn default() -> Self {
		Self::new("/")
	}
}
impl AuthorizationContinuation for SessionRedirect {
	fn complete<'a>(
		&'a self,
		ctx: CallbackContext<'a>,
		record: TokenRecord,
	) -> RouteFuture<'a, Result<RouteResponse>> {
		Box::pin(async move {
			let session = ctx.session;

			session.insert(ACCESS_TOKEN_KEY, record.access_token.expose().to_owned()).await?;
			session.insert(REFRESH_TOKEN_KEY, record.refresh_token.expose().to_owned()).await?;

			let response = oauth2::http::Response::builder()
				.status(StatusCode::TEMPORARY_REDIRECT)
				.header(LOCATION, self.landing_path.as_str())
				.body(Vec::new())
				.map_err(ConfigError::from)?;

			Ok(response)
		})
	}
}

/// Renders every failure as one fixed message.
#[derive(Clone, Debug)]
pub struct GenericErrorRenderer {
	/// Message written to the response body.
	pub message: String,
}
impl Default for GenericErrorRenderer {
	fn default() -> Self {
		Self { message: "Authentication failed. Please try again.".into() }
	}
}
impl ErrorRenderer for GenericErrorRenderer {
	fn render<'a>(&'a self, _error: &'a Error) -> RouteFuture<'a, String> {
		Box::pin(async move { self.message.clone() })
	}
}

/// Pluggable route handler serving the authorization redirect and the provider callback.
pub struct OAuthRoute<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Flow driving both halves of the exchange.
	pub flow: OAuthFlow<C, M>,
	continuation: Arc<dyn AuthorizationContinuation>,
	error_renderer: Option<Arc<dyn ErrorRenderer>>,
}
impl<C, M> OAuthRoute<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Binds `flow` to its redirect path with the provided continuation.
	pub fn new(flow: OAuthFlow<C, M>, continuation: Arc<dyn AuthorizationContinuation>) -> Self {
		Self { flow, continuation, error_renderer: None }
	}

	/// Installs a renderer for callback failures.
	pub fn with_error_renderer(mut self, renderer: Arc<dyn ErrorRenderer>) -> Self {
		self.error_renderer = Some(renderer);

		self
	}

	/// Path this route must be mounted on.
	pub fn path(&self) -> &str {
		self.flow.config.route_path()
	}

	/// Configuration behind the route.
	pub fn config(&self) -> &OAuthConfig {
		&self.flow.config
	}

	/// Handles one inbound request on [`path`](Self::path).
	///
	/// Returns `Err` only when the host failed to provide a session or when the redirect half
	/// fails; callback failures are rendered into a response with
	/// [`Error::status_code`].
	pub async fn handle(
		&self,
		request: &Parts,
		session: Option<&mut dyn Session>,
	) -> Result<RouteResponse> {
		let Some(session) = session else {
			let err = Error::from(ConfigError::SessionUnavailable);

			obs::record_misconfiguration(&err);

			return Err(err);
		};

		match CallbackQuery::from_uri(&request.uri) {
			None => self.flow.start_authorization(session).await?.into_response(),
			Some(query) => Ok(self.handle_callback(request, &query, session).await),
		}
	}

	async fn handle_callback(
		&self,
		request: &Parts,
		query: &CallbackQuery,
		session: &mut dyn Session,
	) -> RouteResponse {
		let outcome = match self.flow.complete_authorization(query, &*session).await {
			Ok(record) =>
				self.continuation.complete(CallbackContext { request, session }, record).await,
			Err(err) => Err(err),
		};

		match outcome {
			Ok(response) => response,
			Err(err) => self.render_error(&err).await,
		}
	}

	async fn render_error(&self, error: &Error) -> RouteResponse {
		let body = match &self.error_renderer {
			Some(renderer) => renderer.render(error).await,
			None => error.to_string(),
		};
		let mut response = RouteResponse::new(body.into_bytes());

		*response.status_mut() = error.status_code();
		response
			.headers_mut()
			.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));

		response
	}
}
impl<C, M> Debug for OAuthRoute<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthRoute")
			.field("path", &self.path())
			.field("error_renderer", &self.error_renderer.is_some())
			.finish()
	}
}
