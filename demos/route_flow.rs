//! Walks one user agent through the route: the authorization redirect, the provider callback,
//! and the default continuation storing both tokens in the session.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_route::{
	config::OAuthConfig,
	flows::ReqwestFlow,
	http::ReqwestHttpClient,
	oauth::{
		ReqwestTransportErrorMapper,
		oauth2::http::{Request, header::LOCATION},
	},
	reqwest::Client,
	route::{OAuthRoute, SessionRedirect},
	session::{ACCESS_TOKEN_KEY, MemorySession, STATE_KEY},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"expires_in\":14400,\"scope\":[\"chat:read\"],\"token_type\":\"bearer\"}",
			);
		})
		.await;
	let config =
		OAuthConfig::builder("demo-client", "demo-secret", "http://localhost:3000/auth/twitch")
			.scopes(["chat:read"])
			.token_endpoint(Url::parse(&server.url("/token"))?)
			.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.redirect(oauth2_route::reqwest::redirect::Policy::none())
			.build()?,
	);
	let flow = ReqwestFlow::with_http_client(config, http_client, ReqwestTransportErrorMapper);
	let route = OAuthRoute::new(flow, Arc::new(SessionRedirect::new("/dashboard")));
	let mut session = MemorySession::default();

	println!("Mount the route on {}.", route.path());

	let (start, _) = Request::builder().uri(route.path()).body(())?.into_parts();
	let redirect = route.handle(&start, Some(&mut session)).await?;

	println!("Redirect the user agent to {}.", redirect.headers()[LOCATION].to_str()?);

	// Simulate the provider sending the user agent back with the stored state.
	let state = session.peek(STATE_KEY).unwrap_or_default().to_owned();
	let (callback, _) = Request::builder()
		.uri(format!("{}?code=demo-code&state={state}", route.path()))
		.body(())?
		.into_parts();
	let response = route.handle(&callback, Some(&mut session)).await?;

	token_mock.assert_async().await;

	println!(
		"Callback answered {} to {}; session access token: {}.",
		response.status(),
		response.headers()[LOCATION].to_str()?,
		session.peek(ACCESS_TOKEN_KEY).unwrap_or("<missing>")
	);

	Ok(())
}
