//! Client configuration consumed by the route and its flows.
//!
//! [`OAuthConfig`] is assembled once at startup through [`OAuthConfigBuilder`], which validates
//! the redirect URI, the scope list, and the provider endpoints before anything is served.
//! Hosts that load settings from files or environment layers can deserialize an
//! [`OAuthSettings`] and convert it with [`TryFrom`].

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, Secret},
	error::ConfigError,
	provider::{ProviderDescriptor, descriptor::builder::validate_endpoint},
};

/// Validated, immutable client configuration.
#[derive(Clone)]
pub struct OAuthConfig {
	/// Registered client identifier.
	pub client_id: ClientId,
	/// Client secret sent with every exchange.
	pub client_secret: Secret,
	/// Parsed callback URL; its path is the route path.
	pub redirect_uri: Url,
	/// Callback URL exactly as configured. Providers compare it byte for byte, so this is the
	/// form sent in the authorization redirect and the code exchange.
	pub registered_redirect_uri: String,
	/// Scopes requested by the authorization redirect.
	pub scopes: ScopeSet,
	/// Provider identity and endpoints.
	pub descriptor: ProviderDescriptor,
	/// Forces the provider to show the consent screen again.
	pub force_verify: bool,
	/// Optional deadline for the callback's code exchange.
	pub exchange_timeout: Option<StdDuration>,
}
impl OAuthConfig {
	/// Starts a builder seeded with the three required values.
	pub fn builder(
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
		redirect_uri: impl Into<String>,
	) -> OAuthConfigBuilder {
		OAuthConfigBuilder::new(client_id, client_secret, redirect_uri)
	}

	/// Path the route binds to, taken from the redirect URI.
	pub fn route_path(&self) -> &str {
		self.redirect_uri.path()
	}
}
impl Debug for OAuthConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("redirect_uri", &self.registered_redirect_uri)
			.field("scopes", &self.scopes)
			.field("descriptor", &self.descriptor.id)
			.field("force_verify", &self.force_verify)
			.field("exchange_timeout", &self.exchange_timeout)
			.finish()
	}
}
impl TryFrom<OAuthSettings> for OAuthConfig {
	type Error = ConfigError;

	fn try_from(settings: OAuthSettings) -> Result<Self, Self::Error> {
		let mut builder =
			Self::builder(settings.client_id, settings.client_secret, settings.redirect_uri)
				.scopes(settings.scopes)
				.force_verify(settings.force_verify);

		if let Some(url) = settings.authorization_endpoint {
			builder = builder.authorization_endpoint(url);
		}
		if let Some(url) = settings.token_endpoint {
			builder = builder.token_endpoint(url);
		}
		if let Some(ms) = settings.exchange_timeout_ms {
			builder = builder.exchange_timeout(StdDuration::from_millis(ms));
		}

		builder.build()
	}
}

/// Builder for [`OAuthConfig`] values.
#[derive(Debug)]
pub struct OAuthConfigBuilder {
	client_id: String,
	client_secret: Secret,
	redirect_uri: String,
	scopes: Vec<String>,
	descriptor: Option<ProviderDescriptor>,
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	force_verify: bool,
	exchange_timeout: Option<StdDuration>,
}
impl OAuthConfigBuilder {
	fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
		redirect_uri: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			redirect_uri: redirect_uri.into(),
			scopes: Vec::new(),
			descriptor: None,
			authorization_endpoint: None,
			token_endpoint: None,
			force_verify: false,
			exchange_timeout: None,
		}
	}

	/// Replaces the requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the `force_verify` flag.
	pub fn force_verify(mut self, enabled: bool) -> Self {
		self.force_verify = enabled;

		self
	}

	/// Targets another provider; defaults to [`ProviderDescriptor::twitch`].
	pub fn descriptor(mut self, descriptor: ProviderDescriptor) -> Self {
		self.descriptor = Some(descriptor);

		self
	}

	/// Overrides the descriptor's authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Overrides the descriptor's token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Bounds the callback's code exchange.
	pub fn exchange_timeout(mut self, timeout: StdDuration) -> Self {
		self.exchange_timeout = Some(timeout);

		self
	}

	/// Validates every field and produces the configuration.
	pub fn build(self) -> Result<OAuthConfig, ConfigError> {
		let client_id = ClientId::new(&self.client_id)?;
		let redirect_uri = parse_redirect(&self.redirect_uri)?;
		let scopes = ScopeSet::new(self.scopes)?;
		let mut descriptor = match self.descriptor {
			Some(descriptor) => descriptor,
			None => ProviderDescriptor::twitch()?,
		};

		if let Some(url) = self.authorization_endpoint {
			validate_endpoint("authorization", &url)?;

			descriptor.endpoints.authorization = url;
		}
		if let Some(url) = self.token_endpoint {
			validate_endpoint("token", &url)?;

			descriptor.endpoints.token = url;
		}

		descriptor.validate()?;

		Ok(OAuthConfig {
			client_id,
			client_secret: self.client_secret,
			redirect_uri,
			registered_redirect_uri: self.redirect_uri,
			scopes,
			descriptor,
			force_verify: self.force_verify,
			exchange_timeout: self.exchange_timeout,
		})
	}
}

/// Serializable configuration layer; convert with `OAuthConfig::try_from`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OAuthSettings {
	/// Registered client identifier.
	pub client_id: String,
	/// Client secret.
	pub client_secret: Secret,
	/// Absolute callback URL.
	pub redirect_uri: String,
	/// Requested scopes.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Forces the consent screen.
	#[serde(default)]
	pub force_verify: bool,
	/// Authorization endpoint override.
	#[serde(default)]
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint override.
	#[serde(default)]
	pub token_endpoint: Option<Url>,
	/// Code exchange deadline in milliseconds.
	#[serde(default)]
	pub exchange_timeout_ms: Option<u64>,
}

fn parse_redirect(raw: &str) -> Result<Url, ConfigError> {
	let url = match Url::parse(raw) {
		Ok(url) => url,
		Err(url::ParseError::RelativeUrlWithoutBase) =>
			return Err(ConfigError::RelativeRedirect { uri: raw.to_owned() }),
		Err(source) => return Err(ConfigError::InvalidRedirect { source }),
	};

	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(ConfigError::RelativeRedirect { uri: raw.to_owned() });
	}

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ScopeValidationError, provider::ProviderDescriptorError};

	fn builder() -> OAuthConfigBuilder {
		OAuthConfig::builder("client-123", "s3cret", "http://localhost:3000/auth/twitch")
	}

	#[test]
	fn build_uses_twitch_defaults() {
		let config = builder().build().expect("Minimal configuration should build.");

		assert_eq!(config.client_id.as_ref(), "client-123");
		assert_eq!(config.route_path(), "/auth/twitch");
		assert!(config.scopes.is_empty());
		assert!(!config.force_verify);
		assert!(config.exchange_timeout.is_none());
		assert_eq!(
			config.descriptor,
			ProviderDescriptor::twitch().expect("Twitch descriptor should build.")
		);
	}

	#[test]
	fn redirect_uri_is_kept_as_configured() {
		let config = OAuthConfig::builder("client-123", "s3cret", "http://localhost:3000")
			.build()
			.expect("Bare origin redirect should build.");

		assert_eq!(config.registered_redirect_uri, "http://localhost:3000");
		assert_eq!(config.redirect_uri.as_str(), "http://localhost:3000/");
		assert_eq!(config.route_path(), "/");

		let config = OAuthConfig::builder("client-123", "s3cret", "https://App.Example.com:443/cb")
			.build()
			.expect("Redirect with default port should build.");

		assert_eq!(config.registered_redirect_uri, "https://App.Example.com:443/cb");
		assert_eq!(config.route_path(), "/cb");
	}

	#[test]
	fn relative_and_invalid_redirects_are_rejected() {
		let err = OAuthConfig::builder("client-123", "s3cret", "/auth/twitch")
			.build()
			.expect_err("Relative redirect must be rejected.");

		assert!(matches!(err, ConfigError::RelativeRedirect { .. }));

		let err = OAuthConfig::builder("client-123", "s3cret", "http://[::1")
			.build()
			.expect_err("Malformed redirect must be rejected.");

		assert!(matches!(err, ConfigError::InvalidRedirect { .. }));

		let err = OAuthConfig::builder("client-123", "s3cret", "mailto:ops@example.com")
			.build()
			.expect_err("Non-http redirect must be rejected.");

		assert!(matches!(err, ConfigError::RelativeRedirect { .. }));
	}

	#[test]
	fn scopes_keep_configured_order() {
		let config = builder()
			.scopes(["user:read:email", "chat:read", "user:read:email"])
			.build()
			.expect("Scoped configuration should build.");

		assert_eq!(config.scopes.normalized(), "user:read:email chat:read");

		let err = builder().scopes(["chat read"]).build().expect_err("Whitespace scope must fail.");

		assert!(matches!(
			err,
			ConfigError::InvalidScope(ScopeValidationError::ContainsWhitespace { .. })
		));
	}

	#[test]
	fn endpoint_overrides_are_validated() {
		let token = Url::parse("http://127.0.0.1:8080/token").expect("Fixture URL should parse.");
		let config = builder()
			.token_endpoint(token.clone())
			.build()
			.expect("Loopback token endpoint should be accepted.");

		assert_eq!(config.descriptor.endpoints.token, token);

		let err = builder()
			.authorization_endpoint(
				Url::parse("http://auth.example.com/authorize").expect("Fixture URL should parse."),
			)
			.build()
			.expect_err("Plaintext public endpoint must be rejected.");

		assert!(matches!(
			err,
			ConfigError::InvalidDescriptor(ProviderDescriptorError::InsecureEndpoint { .. })
		));
	}

	#[test]
	fn debug_output_redacts_secret() {
		let config = builder().build().expect("Configuration should build.");
		let rendered = format!("{config:?}");

		assert!(!rendered.contains("s3cret"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn settings_convert_into_config() {
		let settings: OAuthSettings = serde_json::from_value(serde_json::json!({
			"client_id": "client-123",
			"client_secret": "s3cret",
			"redirect_uri": "https://app.example.com/auth/twitch",
			"scopes": ["chat:read"],
			"force_verify": true,
			"exchange_timeout_ms": 5000
		}))
		.expect("Settings fixture should deserialize.");
		let config = OAuthConfig::try_from(settings).expect("Settings should convert.");

		assert!(config.force_verify);
		assert_eq!(config.client_secret.expose(), "s3cret");
		assert_eq!(config.exchange_timeout, Some(StdDuration::from_secs(5)));
		assert!(config.scopes.contains("chat:read"));

		let err = OAuthConfig::try_from(OAuthSettings {
			client_id: " ".into(),
			client_secret: "s3cret".into(),
			redirect_uri: "https://app.example.com/auth".into(),
			scopes: Vec::new(),
			force_verify: false,
			authorization_endpoint: None,
			token_endpoint: None,
			exchange_timeout_ms: None,
		})
		.expect_err("Blank client id must be rejected.");

		assert!(matches!(err, ConfigError::InvalidClientId(_)));
	}
}
