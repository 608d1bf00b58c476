//! Session contract the route reads and writes through.
//!
//! The host owns session storage; the route only needs string get and insert on the session
//! bound to the current request. The session is always passed explicitly.

// self
use crate::_prelude::*;

/// Session key holding the anti-forgery value issued by the authorization redirect.
pub const STATE_KEY: &str = "oauth_state";
/// Session key [`SessionRedirect`](crate::route::SessionRedirect) writes the access token to.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Session key [`SessionRedirect`](crate::route::SessionRedirect) writes the refresh token to.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Boxed future returned by [`Session`] operations.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SessionError>> + 'a + Send>>;

/// Per-request session storage supplied by the host.
pub trait Session
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn get<'a>(&'a self, key: &'a str) -> SessionFuture<'a, Option<String>>;

	/// Stores `value` under `key`, replacing any previous value.
	fn insert<'a>(&'a mut self, key: &'a str, value: String) -> SessionFuture<'a, ()>;
}

/// Error type produced by [`Session`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionError {
	/// Session payload could not be encoded or decoded.
	#[error("Session serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the session store.
	#[error("Session backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// In-process session for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemorySession(HashMap<String, String>);
impl MemorySession {
	/// Returns the value under `key` without going through the async contract.
	pub fn peek(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Returns how many keys are stored.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no keys are stored.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Session for MemorySession {
	fn get<'a>(&'a self, key: &'a str) -> SessionFuture<'a, Option<String>> {
		let value = self.0.get(key).cloned();

		Box::pin(async move { Ok(value) })
	}

	fn insert<'a>(&'a mut self, key: &'a str, value: String) -> SessionFuture<'a, ()> {
		self.0.insert(key.to_owned(), value);

		Box::pin(async { Ok(()) })
	}
}
