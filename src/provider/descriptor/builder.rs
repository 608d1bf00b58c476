// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{ProviderDescriptor, ProviderEndpoints},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint is required to start the flow.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory for all exchanges.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Endpoint text is not an absolute URL.
	#[error("The {endpoint} endpoint is not a valid URL: {url}.")]
	UnparsableEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Raw endpoint text.
		url: String,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Authorization endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint used for exchanges and refreshes.
	pub token_endpoint: Option<Url>,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self { id, authorization_endpoint: None, token_endpoint: None }
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let descriptor =
			ProviderDescriptor { id: self.id, endpoints: ProviderEndpoints { authorization, token } };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates endpoint invariants for the descriptor.
	pub(crate) fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;

		Ok(())
	}
}

pub(crate) fn parse_endpoint(
	name: &'static str,
	raw: &str,
) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|_| ProviderDescriptorError::UnparsableEndpoint {
		endpoint: name,
		url: raw.to_owned(),
	})
}

pub(crate) fn validate_endpoint(
	name: &'static str,
	url: &Url,
) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor fixture URL.")
	}

	fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptor::builder(
			ProviderId::new("mock").expect("Provider fixture should be valid."),
		)
	}

	#[test]
	fn descriptor_requires_both_endpoints() {
		let err = builder()
			.token_endpoint(url("https://example.com/token"))
			.build()
			.expect_err("Missing authorization endpoint must fail.");

		assert_eq!(err, ProviderDescriptorError::MissingAuthorizationEndpoint);

		let err = builder()
			.authorization_endpoint(url("https://example.com/auth"))
			.build()
			.expect_err("Missing token endpoint must fail.");

		assert_eq!(err, ProviderDescriptorError::MissingTokenEndpoint);
	}

	#[test]
	fn plaintext_is_limited_to_loopback_hosts() {
		let err = builder()
			.authorization_endpoint(url("http://example.com/auth"))
			.token_endpoint(url("https://example.com/token"))
			.build()
			.expect_err("Plaintext public endpoints must be rejected.");

		assert!(matches!(
			err,
			ProviderDescriptorError::InsecureEndpoint { endpoint: "authorization", .. }
		));

		let descriptor = builder()
			.authorization_endpoint(url("http://localhost:3080/authorize"))
			.token_endpoint(url("http://127.0.0.1:3080/token"))
			.build()
			.expect("Loopback endpoints should be accepted for local testing.");

		assert_eq!(descriptor.endpoints.token.as_str(), "http://127.0.0.1:3080/token");
		assert!(
			builder()
				.authorization_endpoint(url("https://example.com/auth"))
				.token_endpoint(url("http://[::1]:3080/token"))
				.build()
				.is_ok()
		);
		assert!(
			builder()
				.authorization_endpoint(url("ftp://example.com/auth"))
				.token_endpoint(url("https://example.com/token"))
				.build()
				.is_err()
		);
	}
}
