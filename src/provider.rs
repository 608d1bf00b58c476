//! Provider-facing descriptors: endpoints and grant labels.
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering the authorization and
//! token endpoints. Endpoints must use HTTPS; plaintext HTTP is accepted only for loopback hosts so
//! local test doubles can stand in for the real provider.

pub mod descriptor;

pub use descriptor::*;
