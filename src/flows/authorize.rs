//! Authorization redirect: issue anti-forgery state and send the user agent to the provider.

// crates.io
use oauth2::http::{StatusCode, header::LOCATION};
// self
use crate::{
	_prelude::*,
	auth::AntiForgeryState,
	error::ConfigError,
	flows::OAuthFlow,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	route::RouteResponse,
	session::{STATE_KEY, Session},
};

/// Redirect target produced by [`OAuthFlow::start_authorization`].
#[derive(Clone, Debug)]
pub struct AuthorizationRedirect {
	/// State value stored in the session and embedded in `url`.
	pub state: AntiForgeryState,
	/// Fully-formed authorization URL.
	pub url: Url,
}
impl AuthorizationRedirect {
	/// Renders the redirect as a `307 Temporary Redirect` response.
	pub fn into_response(self) -> Result<RouteResponse> {
		let response = oauth2::http::Response::builder()
			.status(StatusCode::TEMPORARY_REDIRECT)
			.header(LOCATION, self.url.as_str())
			.body(Vec::new())
			.map_err(ConfigError::from)?;

		Ok(response)
	}
}

impl<C, M> OAuthFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Generates fresh state, stores it under [`STATE_KEY`], and returns the provider redirect.
	///
	/// No network I/O happens here. The only failure source is the session backend.
	pub async fn start_authorization(
		&self,
		session: &mut dyn Session,
	) -> Result<AuthorizationRedirect> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "start_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let state = AntiForgeryState::generate();

				session.insert(STATE_KEY, state.as_str().to_owned()).await?;

				let url = self.authorization_url(&state);

				Ok(AuthorizationRedirect { state, url })
			})
			.await;

		obs::finish_flow(KIND, &result);

		result
	}

	/// Builds the provider authorization URL for `state`.
	///
	/// Query parameters are appended in a fixed order: `client_id`, `redirect_uri`,
	/// `response_type`, `scope`, `state`, then `force_verify` when enabled. `scope` is always
	/// present and is empty when no scopes are configured.
	pub fn authorization_url(&self, state: &AntiForgeryState) -> Url {
		let config = self.config.as_ref();
		let mut url = config.descriptor.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("client_id", config.client_id.as_ref());
		pairs.append_pair("redirect_uri", &config.registered_redirect_uri);
		pairs.append_pair("response_type", "code");
		pairs.append_pair("scope", &config.scopes.normalized());
		pairs.append_pair("state", state.as_str());

		if config.force_verify {
			pairs.append_pair("force_verify", "true");
		}

		drop(pairs);

		url
	}
}
