//! Scope modeling helpers used across the flows.

// std
use std::collections::HashSet;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Ordered set of OAuth scopes.
///
/// Duplicates are dropped while the first-seen order is kept, so the wire form produced by
/// [`normalized`](Self::normalized) matches what the caller configured. Equality ignores order.
#[derive(Clone, Default)]
pub struct ScopeSet {
	/// The scopes in first-seen order.
	pub scopes: Arc<[String]>,
}
impl ScopeSet {
	/// Creates a scope set from any iterator, keeping the first occurrence of each scope.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { scopes: dedup(scopes)? })
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in wire order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Returns the space-delimited wire representation (empty string for an empty set).
	pub fn normalized(&self) -> String {
		self.scopes.join(" ")
	}

	/// Returns the underlying slice of scope strings.
	pub fn as_slice(&self) -> &[String] {
		&self.scopes
	}
}
impl PartialEq for ScopeSet {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().all(|scope| other.contains(scope))
	}
}
impl Eq for ScopeSet {}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}

impl TryFrom<Vec<String>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	/// Parses a space-delimited wire string; an empty (or blank) string yields the empty set.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s.split_whitespace())
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.scopes.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeSet::new(values).map_err(DeError::custom)
	}
}

fn dedup<I, S>(scopes: I) -> Result<Arc<[String]>, ScopeValidationError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut seen = HashSet::new();
	let mut ordered = Vec::new();

	for scope in scopes {
		let owned: String = scope.into();

		if owned.is_empty() {
			return Err(ScopeValidationError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
		}
		if seen.insert(owned.clone()) {
			ordered.push(owned);
		}
	}

	Ok(Arc::from(ordered))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_keep_wire_order_and_compare_as_sets() {
		let lhs = ScopeSet::new(["user:read:email", "channel:read:subscriptions", "user:read:email"])
			.expect("Left-hand scope set should be valid.");
		let rhs = ScopeSet::new(["channel:read:subscriptions", "user:read:email"])
			.expect("Right-hand scope set should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.normalized(), "user:read:email channel:read:subscriptions");
		assert_eq!(rhs.normalized(), "channel:read:subscriptions user:read:email");
		assert_ne!(lhs, ScopeSet::new(["user:read:email"]).expect("Subset should be valid."));
	}

	#[test]
	fn wire_strings_parse_into_ordered_sets() {
		let empty = ScopeSet::from_str("").expect("Empty string represents an empty scope set.");

		assert!(empty.is_empty());
		assert_eq!(empty.normalized(), "");

		let parsed = ScopeSet::from_str("a b c").expect("Scope string should parse.");

		assert_eq!(parsed.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);

		let round_trip =
			ScopeSet::from_str(&parsed.normalized()).expect("Joined scopes should parse again.");

		assert_eq!(round_trip.as_slice(), parsed.as_slice());
	}

	#[test]
	fn invalid_scopes_error() {
		assert_eq!(ScopeSet::new([""]).expect_err("Empty scope must fail."), ScopeValidationError::Empty);
		assert!(matches!(
			ScopeSet::new([" profile "]),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
	}

	#[test]
	fn membership_ignores_order() {
		let scopes = ScopeSet::from_str("chat:edit chat:read").expect("Scope string should parse.");

		assert!(scopes.contains("chat:read"));
		assert!(!scopes.contains("whispers:read"));
		assert_eq!(scopes.len(), 2);
		assert_eq!(scopes.to_string(), "chat:edit chat:read");
		assert_eq!(scopes, ScopeSet::from_str("chat:read chat:edit").expect("Reordered scopes parse."));
	}

	#[test]
	fn serde_uses_sequence_form() {
		let scopes = ScopeSet::new(["x", "y"]).expect("Scope fixture should be valid.");
		let payload = serde_json::to_string(&scopes).expect("Scopes should serialize.");

		assert_eq!(payload, "[\"x\",\"y\"]");

		let back: ScopeSet = serde_json::from_str(&payload).expect("Scopes should deserialize.");

		assert_eq!(back.as_slice(), scopes.as_slice());
		assert!(serde_json::from_str::<ScopeSet>("[\"has space\"]").is_err());
	}
}
