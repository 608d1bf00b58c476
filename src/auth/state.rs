//! Anti-forgery `state` tokens round-tripped through the identity provider.

// crates.io
use rand::RngCore;
// self
use crate::_prelude::*;

const STATE_BYTES: usize = 16;

/// Opaque 128-bit random value, hex-encoded, bound to one session.
///
/// A value is compared by exact equality when the provider redirects back. It is not cleared
/// after a successful match, so a captured `state`/`code` pair can be replayed until the session
/// issues a new one.
#[derive(Clone, PartialEq, Eq)]
pub struct AntiForgeryState(String);
impl AntiForgeryState {
	/// Number of hex characters in a generated value.
	pub const ENCODED_LEN: usize = STATE_BYTES * 2;

	/// Draws a fresh value from the thread-local CSPRNG.
	pub fn generate() -> Self {
		let mut bytes = [0_u8; STATE_BYTES];

		rand::rng().fill_bytes(&mut bytes);

		Self(hex::encode(bytes))
	}

	/// Returns the encoded value.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Checks the `state` echoed by the provider against the value stored in the session.
	///
	/// Fails with [`Error::InvalidState`] when either side is absent or the values differ.
	pub fn verify(stored: Option<&str>, returned: Option<&str>) -> Result<()> {
		match (stored, returned) {
			(Some(stored), Some(returned)) if stored == returned => Ok(()),
			_ => Err(Error::InvalidState),
		}
	}
}
impl From<AntiForgeryState> for String {
	fn from(value: AntiForgeryState) -> Self {
		value.0
	}
}
impl Debug for AntiForgeryState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AntiForgeryState").field(&self.0).finish()
	}
}
impl Display for AntiForgeryState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashSet;
	// self
	use super::*;

	#[test]
	fn generated_states_are_hex_and_unique() {
		let states = (0..256).map(|_| AntiForgeryState::generate()).collect::<Vec<_>>();

		for state in &states {
			assert_eq!(state.as_str().len(), AntiForgeryState::ENCODED_LEN);
			assert!(state.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

			let decoded = hex::decode(state.as_str()).expect("State should decode as hex.");

			assert_eq!(decoded.len(), STATE_BYTES);
		}

		let unique = states.iter().map(AntiForgeryState::as_str).collect::<HashSet<_>>();

		assert_eq!(unique.len(), states.len(), "States must never repeat.");
	}

	#[test]
	fn verify_requires_both_sides_to_match() {
		assert!(AntiForgeryState::verify(Some("abc"), Some("abc")).is_ok());
		assert!(matches!(
			AntiForgeryState::verify(Some("abc"), Some("abd")),
			Err(Error::InvalidState)
		));
		assert!(matches!(AntiForgeryState::verify(Some("abc"), None), Err(Error::InvalidState)));
		assert!(matches!(AntiForgeryState::verify(None, Some("abc")), Err(Error::InvalidState)));
		assert!(matches!(AntiForgeryState::verify(None, None), Err(Error::InvalidState)));
	}
}
