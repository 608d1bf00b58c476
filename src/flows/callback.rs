//! Callback handling: validate the echoed state and exchange the authorization code.

// crates.io
use oauth2::http::Uri;
// self
use crate::{
	_prelude::*,
	auth::{AntiForgeryState, TokenRecord},
	flows::{self, OAuthFlow},
	http::TokenHttpClient,
	oauth::{self as exchange, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GrantType,
	session::{STATE_KEY, Session},
};

/// Query parameters the provider appends to the redirect URI.
#[derive(Clone, PartialEq, Eq)]
pub struct CallbackQuery {
	/// Authorization code to exchange.
	pub code: String,
	/// Echoed anti-forgery value, if the provider sent one.
	pub state: Option<String>,
}
impl CallbackQuery {
	/// Extracts the callback parameters from a raw query string.
	///
	/// Returns `None` when `code` is absent or empty, meaning the request should start a new
	/// authorization instead. The first occurrence of a repeated parameter wins.
	pub fn from_query(query: Option<&str>) -> Option<Self> {
		let mut code = None;
		let mut state = None;

		for (key, value) in url::form_urlencoded::parse(query?.as_bytes()) {
			match key.as_ref() {
				"code" if code.is_none() => code = Some(value.into_owned()),
				"state" if state.is_none() => state = Some(value.into_owned()),
				_ => {},
			}
		}

		let code = code.filter(|code: &String| !code.is_empty())?;

		Some(Self { code, state })
	}

	/// Extracts the callback parameters from a request URI.
	pub fn from_uri(uri: &Uri) -> Option<Self> {
		Self::from_query(uri.query())
	}
}
impl Debug for CallbackQuery {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackQuery")
			.field("code", &"<redacted>")
			.field("state", &self.state)
			.finish()
	}
}

impl<C, M> OAuthFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Validates `query.state` against the session and exchanges the code for tokens.
	///
	/// State validation happens before any network traffic; a missing or mismatched value yields
	/// [`Error::InvalidState`]. The stored state is left in place after a successful match.
	pub async fn complete_authorization(
		&self,
		query: &CallbackQuery,
		session: &dyn Session,
	) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "complete_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let stored = session.get(STATE_KEY).await?;

				AntiForgeryState::verify(stored.as_deref(), query.state.as_deref())?;

				self.exchange_code(&query.code).await
			})
			.await;

		obs::finish_flow(KIND, &result);

		result
	}

	async fn exchange_code(&self, code: &str) -> Result<TokenRecord> {
		let config = self.config.as_ref();
		let grant = GrantType::AuthorizationCode;
		let form = [
			("client_id", config.client_id.as_ref()),
			("client_secret", config.client_secret.expose()),
			("code", code),
			("grant_type", grant.as_str()),
			("redirect_uri", config.registered_redirect_uri.as_str()),
		];

		flows::with_deadline(
			config.exchange_timeout,
			exchange::exchange_token(
				self.http_client.as_ref(),
				self.transport_mapper.as_ref(),
				grant,
				&config.descriptor.endpoints.token,
				&form,
				None,
			),
		)
		.await
	}
}
