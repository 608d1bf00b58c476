#![cfg(all(feature = "test", feature = "reqwest"))]

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
// self
use oauth2_route::{
	_preludet::*,
	auth::TokenRecord,
	error::TransportError,
	flows::CallbackQuery,
	oauth::oauth2::http::{StatusCode, request::Parts},
	route::{AuthorizationContinuation, CallbackContext, ErrorRenderer, RouteFuture, RouteResponse},
	session::{MemorySession, STATE_KEY, Session},
};

const STATE: &str = "0123456789abcdef0123456789abcdef";

#[derive(Default)]
struct RecordingContinuation {
	records: Mutex<Vec<TokenRecord>>,
	delay: Option<StdDuration>,
}
impl AuthorizationContinuation for RecordingContinuation {
	fn complete<'a>(
		&'a self,
		ctx: CallbackContext<'a>,
		record: TokenRecord,
	) -> RouteFuture<'a, Result<RouteResponse>> {
		Box::pin(async move {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			ctx.session.insert("user", "viewer".into()).await?;
			self.records.lock().push(record);

			Ok(RouteResponse::new(b"welcome".to_vec()))
		})
	}
}

#[derive(Default)]
struct RecordingRenderer {
	calls: Mutex<Vec<(StatusCode, Option<serde_json::Value>)>>,
}
impl ErrorRenderer for RecordingRenderer {
	fn render<'a>(&'a self, error: &'a Error) -> RouteFuture<'a, String> {
		Box::pin(async move {
			self.calls.lock().push((error.status_code(), error.provider_body().cloned()));

			format!("rendered {}", error.status_code().as_u16())
		})
	}
}

fn parts(uri: &str) -> Parts {
	oauth2_route::oauth::oauth2::http::Request::builder()
		.uri(uri)
		.body(())
		.expect("Request fixture should build.")
		.into_parts()
		.0
}

async fn seeded_session() -> MemorySession {
	let mut session = MemorySession::default();

	session.insert(STATE_KEY, STATE.into()).await.expect("Seeding state should succeed.");

	session
}

#[tokio::test]
async fn callback_exchanges_code_and_runs_continuation() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("client_id", TEST_CLIENT_ID)
				.form_urlencoded_tuple("client_secret", TEST_CLIENT_SECRET)
				.form_urlencoded_tuple("code", "c0de")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("redirect_uri", TEST_REDIRECT_URI);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"AT1\",\"refresh_token\":\"RT1\",\"expires_in\":3600,\"scope\":[\"x\"],\"token_type\":\"bearer\"}",
			);
		})
		.await;
	let config = test_config_builder(&server.url("/token"))
		.build()
		.expect("Configuration should build for the mock provider.");
	let continuation = Arc::new(RecordingContinuation::default());
	let route = build_reqwest_test_route(config, continuation.clone());
	let mut session = seeded_session().await;
	let response = route
		.handle(&parts(&format!("/auth/twitch?code=c0de&state={STATE}")), Some(&mut session))
		.await
		.expect("Callback should produce a response.");
	let expected_expiry = OffsetDateTime::now_utc() + Duration::seconds(3600);

	mock.assert_async().await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.body().as_slice(), b"welcome");
	assert_eq!(session.peek("user"), Some("viewer"));

	let records = continuation.records.lock();
	let record = records.first().expect("Continuation should receive one record.");

	assert_eq!(records.len(), 1);
	assert_eq!(record.access_token.expose(), "AT1");
	assert_eq!(record.refresh_token.expose(), "RT1");
	assert_eq!(record.scope.iter().collect::<Vec<_>>(), ["x"]);
	assert_eq!(record.token_type.as_deref(), Some("bearer"));
	assert!((record.expires_at - expected_expiry).abs() <= Duration::seconds(2));
}

#[tokio::test]
async fn mismatched_state_skips_exchange_and_renders_once() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let config = test_config_builder(&server.url("/token"))
		.build()
		.expect("Configuration should build for the mock provider.");
	let continuation = Arc::new(RecordingContinuation::default());
	let renderer = Arc::new(RecordingRenderer::default());
	let route = build_reqwest_test_route(config, continuation.clone())
		.with_error_renderer(renderer.clone());

	for uri in ["/auth/twitch?code=c0de&state=forged", "/auth/twitch?code=c0de"] {
		let mut session = seeded_session().await;
		let response = route
			.handle(&parts(uri), Some(&mut session))
			.await
			.expect("Invalid state should be rendered, not returned.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(response.body().as_slice(), b"rendered 400");
	}

	let mut empty_session = MemorySession::default();
	let uri = format!("/auth/twitch?code=c0de&state={STATE}");
	let response = route
		.handle(&parts(&uri), Some(&mut empty_session))
		.await
		.expect("Missing stored state should be rendered, not returned.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	mock.assert_calls_async(0).await;

	assert_eq!(renderer.calls.lock().len(), 3);
	assert!(continuation.records.lock().is_empty());
}

#[tokio::test]
async fn provider_rejection_reaches_renderer_verbatim() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Invalid authorization code\"}");
		})
		.await;
	let config = test_config_builder(&server.url("/token"))
		.build()
		.expect("Configuration should build for the mock provider.");
	let renderer = Arc::new(RecordingRenderer::default());
	let route = build_reqwest_test_route(config, Arc::new(RecordingContinuation::default()))
		.with_error_renderer(renderer.clone());
	let mut session = seeded_session().await;
	let response = route
		.handle(&parts(&format!("/auth/twitch?code=stale&state={STATE}")), Some(&mut session))
		.await
		.expect("Provider rejection should be rendered, not returned.");

	mock.assert_async().await;

	assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

	let calls = renderer.calls.lock();

	assert_eq!(calls.len(), 1);
	assert_eq!(
		calls[0].1,
		Some(serde_json::json!({
			"error": "invalid_grant",
			"error_description": "Invalid authorization code"
		}))
	);
}

#[tokio::test]
async fn deferred_continuation_is_awaited() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"AT1\",\"refresh_token\":\"RT1\",\"expires_in\":60,\"scope\":[]}",
			);
		})
		.await;
	let config = test_config_builder(&server.url("/token"))
		.build()
		.expect("Configuration should build for the mock provider.");
	let continuation = Arc::new(RecordingContinuation {
		delay: Some(StdDuration::from_millis(50)),
		..Default::default()
	});
	let route = build_reqwest_test_route(config, continuation.clone());
	let mut session = seeded_session().await;
	let response = route
		.handle(&parts(&format!("/auth/twitch?code=c0de&state={STATE}")), Some(&mut session))
		.await
		.expect("Callback should produce a response.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(continuation.records.lock().len(), 1);
	assert!(continuation.records.lock()[0].scope.is_empty());
}

#[tokio::test]
async fn exchange_timeout_is_reported_as_gateway_timeout() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).delay(StdDuration::from_secs(2)).body("{}");
		})
		.await;
	let config = test_config_builder(&server.url("/token"))
		.exchange_timeout(StdDuration::from_millis(100))
		.build()
		.expect("Configuration should build for the mock provider.");
	let flow = build_reqwest_test_flow(config);
	let session = seeded_session().await;
	let raw_query = format!("code=c0de&state={STATE}");
	let query = CallbackQuery::from_query(Some(raw_query.as_str()))
		.expect("Query fixture carries a code.");
	let err = flow
		.complete_authorization(&query, &session)
		.await
		.expect_err("Slow token endpoint must time out.");

	assert!(matches!(
		err,
		Error::Transport(TransportError::Timeout { after }) if after == StdDuration::from_millis(100)
	));
	assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
}
