//! Auth-domain identifiers, scope sets, anti-forgery state, and token models.

pub mod id;
pub mod scope;
pub mod secret;
pub mod state;
pub mod token;

pub use id::*;
pub use scope::*;
pub use secret::*;
pub use state::*;
pub use token::*;
