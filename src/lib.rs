//! Drop-in OAuth 2.0 authorization-code and refresh-token route handler: anti-forgery state,
//! code exchange with a pluggable continuation, and standalone token refresh with a hard timeout.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod route;
pub mod session;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{OAuthConfig, OAuthConfigBuilder},
		flows::{ReqwestFlow, TokenRefresher},
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		route::{AuthorizationContinuation, ReqwestRoute},
	};

	/// Client identifier used by test fixtures.
	pub const TEST_CLIENT_ID: &str = "client-123";
	/// Client secret used by test fixtures.
	pub const TEST_CLIENT_SECRET: &str = "s3cret";
	/// Redirect URI used by test fixtures.
	pub const TEST_REDIRECT_URI: &str = "http://localhost:3000/auth/twitch";

	/// Refresher type alias used by reqwest-backed integration tests.
	pub type ReqwestTestRefresher = TokenRefresher<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Seeds a configuration builder with the fixture credentials and `token_endpoint`.
	pub fn test_config_builder(token_endpoint: &str) -> OAuthConfigBuilder {
		OAuthConfig::builder(TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_REDIRECT_URI)
			.token_endpoint(Url::parse(token_endpoint).expect("Mock token endpoint should parse."))
	}

	/// Constructs a [`ReqwestFlow`] backed by [`test_reqwest_http_client`].
	pub fn build_reqwest_test_flow(config: OAuthConfig) -> ReqwestFlow {
		ReqwestFlow::with_http_client(
			config,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}

	/// Constructs a [`ReqwestRoute`] around a test flow and the given continuation.
	pub fn build_reqwest_test_route(
		config: OAuthConfig,
		continuation: Arc<dyn AuthorizationContinuation>,
	) -> ReqwestRoute {
		ReqwestRoute::new(build_reqwest_test_flow(config), continuation)
	}

	/// Constructs a refresher whose exchanges hit `token_endpoint`.
	pub fn build_reqwest_test_refresher(token_endpoint: &str) -> ReqwestTestRefresher {
		TokenRefresher::with_http_client(
			Url::parse(token_endpoint).expect("Mock token endpoint should parse."),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
