//! Renews a token pair with the standalone refresher, then shows the provider's rejection of a
//! revoked refresh token surfacing verbatim.

// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_route::{
	auth::ScopeSet,
	error::Error,
	flows::{RefreshRequest, TokenRefresher},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let rotate = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("refresh_token", "demo-refresh");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"next-access\",\"refresh_token\":\"next-refresh\",\"expires_in\":14400,\"scope\":\"chat:read\"}",
			);
		})
		.await;
	let revoked = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("refresh_token", "revoked");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"status\":400,\"message\":\"Invalid refresh token\"}");
		})
		.await;
	let http_client =
		ReqwestHttpClient::with_client(Client::builder().danger_accept_invalid_certs(true).build()?);
	let refresher = <TokenRefresher<ReqwestHttpClient, ReqwestTransportErrorMapper>>::with_http_client(
		Url::parse(&server.url("/token"))?,
		http_client,
		ReqwestTransportErrorMapper,
	)
	.with_timeout(Duration::from_secs(5));
	let record = refresher
		.refresh(
			RefreshRequest::new("demo-refresh", "demo-client", "demo-secret")
				.with_scope(ScopeSet::new(["chat:read"])?),
		)
		.await?;

	rotate.assert_async().await;

	println!(
		"Refreshed: access token {}, expires at {}, scope `{}`.",
		record.access_token.expose(),
		record.expires_at,
		record.scope
	);

	match refresher.refresh(RefreshRequest::new("revoked", "demo-client", "demo-secret")).await {
		Err(Error::Provider { status, body }) => println!("Provider answered {status}: {body}."),
		other => println!("Unexpected refresh outcome: {other:?}."),
	}

	revoked.assert_async().await;

	println!(
		"Refresh attempts: {}, failures: {}.",
		refresher.metrics.attempts(),
		refresher.metrics.failures()
	);

	Ok(())
}
