//! Validated identifiers for OAuth clients and provider descriptors.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

macro_rules! identifier {
	($(#[$meta:meta])* $name:ident => $label:literal) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` and wraps it.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				check($label, &value)?;

				Ok(Self(value))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", stringify!($name), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Longest identifier accepted, in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// Reasons an identifier is rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("The {label} identifier is empty.")]
	Empty {
		/// Which identifier failed.
		label: &'static str,
	},
	/// Whitespace would corrupt the query string and form bodies the identifier travels in.
	#[error("The {label} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Which identifier failed.
		label: &'static str,
	},
	/// The identifier is longer than [`MAX_IDENTIFIER_LEN`].
	#[error("The {label} identifier is longer than {max} bytes.", max = MAX_IDENTIFIER_LEN)]
	TooLong {
		/// Which identifier failed.
		label: &'static str,
	},
}

identifier! {
	/// Client identifier issued by the provider's developer console.
	ClientId => "client"
}
identifier! {
	/// Name of a [`ProviderDescriptor`](crate::provider::ProviderDescriptor).
	ProviderId => "provider"
}
impl ProviderId {
	/// Wraps a built-in provider name without validation.
	pub(crate) fn from_static(value: &'static str) -> Self {
		Self(value.to_owned())
	}
}

fn check(label: &'static str, value: &str) -> Result<(), IdentifierError> {
	if value.is_empty() {
		Err(IdentifierError::Empty { label })
	} else if value.chars().any(char::is_whitespace) {
		Err(IdentifierError::ContainsWhitespace { label })
	} else if value.len() > MAX_IDENTIFIER_LEN {
		Err(IdentifierError::TooLong { label })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn client_id_rejects_blank_and_spaced_values() {
		assert_eq!(ClientId::new(""), Err(IdentifierError::Empty { label: "client" }));
		assert_eq!(
			ClientId::new("abc def"),
			Err(IdentifierError::ContainsWhitespace { label: "client" })
		);
		assert!(ClientId::new("abc\t").is_err());

		let id = ClientId::new("gp762nuuoqcoxypju8c569th9wz7q5")
			.expect("Twitch-shaped client id should be accepted.");

		assert_eq!(&*id, "gp762nuuoqcoxypju8c569th9wz7q5");
		assert_eq!(format!("{id:?}"), "ClientId(gp762nuuoqcoxypju8c569th9wz7q5)");
	}

	#[test]
	fn deserialization_runs_validation() {
		let id: ProviderId =
			serde_json::from_str("\"twitch\"").expect("Provider id should deserialize.");

		assert_eq!(id, ProviderId::from_static("twitch"));
		assert!(serde_json::from_str::<ClientId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<ProviderId>("\"\"").is_err());
	}

	#[test]
	fn length_is_capped() {
		ClientId::new("a".repeat(MAX_IDENTIFIER_LEN)).expect("Identifier at the cap is accepted.");

		assert_eq!(
			ClientId::new("a".repeat(MAX_IDENTIFIER_LEN + 1)),
			Err(IdentifierError::TooLong { label: "client" })
		);
	}
}
