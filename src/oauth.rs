//! Token endpoint exchange shared by the callback and refresh flows.
//!
//! [`exchange_token`] posts a form-encoded grant request through a [`TokenHttpClient`], waits for
//! the complete response body, and turns it into a [`TokenRecord`] or one of the error classes in
//! [`crate::error`]. Transport failures pass through a [`TransportErrorMapper`] so hosts with a
//! custom HTTP stack control how their errors are reported.

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest,
	http::{
		Method,
		header::{ACCEPT, CONTENT_TYPE, HeaderValue},
	},
};
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord, TokenRecordBuilderError},
	error::{ConfigError, ResponseError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::GrantType,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		grant: GrantType,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_grant: GrantType,
		_metadata: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			_ => TransportError::Other { message: "unrecognized transport failure".into() }.into(),
		}
	}
}

/// Wire shape of a successful token endpoint response.
///
/// The code exchange reports `scope` as a JSON array while the refresh grant uses a
/// space-delimited string; both are accepted on either path.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenEndpointResponse {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
	#[serde(default, deserialize_with = "deserialize_wire_scope")]
	scope: Vec<String>,
	#[serde(default)]
	token_type: Option<String>,
}

/// Posts `form` to `endpoint` and converts the reply into a [`TokenRecord`].
///
/// `fallback_refresh` is carried into the record when the provider does not rotate the refresh
/// token; without it a missing `refresh_token` is a [`ResponseError::MissingRefreshToken`].
pub(crate) async fn exchange_token<C, M>(
	http_client: &C,
	mapper: &M,
	grant: GrantType,
	endpoint: &Url,
	form: &[(&str, &str)],
	fallback_refresh: Option<&str>,
) -> Result<TokenRecord>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let meta = ResponseMetadataSlot::default();
	let handle = http_client.with_metadata(meta.clone());
	let request = build_token_request(endpoint, form)?;
	let response = handle
		.call(request)
		.await
		.map_err(|err| mapper.map_transport_error(grant, meta.take().as_ref(), err))?;
	let status = meta
		.take()
		.and_then(|value| value.status)
		.ok_or(TransportError::MissingStatus)?;
	let body = response.body();

	if !(200..300).contains(&status) {
		return Err(Error::Provider { status, body: parse_error_body(body) });
	}

	let issued_at = OffsetDateTime::now_utc();
	let parsed = parse_token_response(status, body)?;

	map_token_response(parsed, issued_at, fallback_refresh)
}

pub(crate) fn build_token_request(endpoint: &Url, form: &[(&str, &str)]) -> Result<HttpRequest> {
	let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(form).finish();
	let request = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
		.header(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE))
		.body(body.into_bytes())
		.map_err(ConfigError::from)?;

	Ok(request)
}

pub(crate) fn parse_token_response(status: u16, body: &[u8]) -> Result<TokenEndpointResponse> {
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| ResponseError::Parse { source, status }.into())
}

pub(crate) fn map_token_response(
	response: TokenEndpointResponse,
	issued_at: OffsetDateTime,
	fallback_refresh: Option<&str>,
) -> Result<TokenRecord> {
	let expires_in = response.expires_in.ok_or(ResponseError::MissingExpiresIn)?;

	if expires_in <= 0 {
		return Err(ResponseError::NonPositiveExpiresIn.into());
	}

	let expires_at = issued_at
		.checked_add(Duration::seconds(expires_in))
		.ok_or(ResponseError::ExpiresInOutOfRange)?;
	let refresh_token = response
		.refresh_token
		.or_else(|| fallback_refresh.map(str::to_owned))
		.ok_or(ResponseError::MissingRefreshToken)?;
	let scope = ScopeSet::new(response.scope).map_err(ResponseError::from)?;

	TokenRecord::builder(scope)
		.access_token(response.access_token)
		.refresh_token(refresh_token)
		.token_type(response.token_type)
		.issued_at(issued_at)
		.expires_at(expires_at)
		.build()
		.map_err(|err| record_error(err).into())
}

fn record_error(err: TokenRecordBuilderError) -> ResponseError {
	match err {
		TokenRecordBuilderError::MissingAccessToken => ResponseError::MissingAccessToken,
		TokenRecordBuilderError::MissingRefreshToken => ResponseError::MissingRefreshToken,
		TokenRecordBuilderError::MissingExpiry => ResponseError::MissingExpiresIn,
	}
}

/// Keeps the provider payload as-is; non-JSON bodies become a JSON string of their text.
pub(crate) fn parse_error_body(body: &[u8]) -> serde_json::Value {
	serde_json::from_slice(body)
		.unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(body).into_owned()))
}

fn deserialize_wire_scope<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum WireScope {
		Delimited(String),
		List(Vec<String>),
	}

	Ok(match Option::<WireScope>::deserialize(deserializer)? {
		Some(WireScope::Delimited(raw)) => raw.split_whitespace().map(str::to_owned).collect(),
		Some(WireScope::List(values)) => values
			.iter()
			.flat_map(|value| value.split_whitespace())
			.map(str::to_owned)
			.collect(),
		None => Vec::new(),
	})
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}
