//! Networking for the console backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `client` owns bearer injection and the typed auth calls, `http` is the
//! reqwest transport, `resource` names the backend collections, and `types`
//! defines the wire schema.

pub mod client;
pub mod http;
pub mod resource;
pub mod types;

pub use client::{ApiClient, ApiRequest, Transport};
pub use http::{HttpTransport, Timeouts};
pub use resource::Resource;
pub use types::{LoginGrant, LoginRequest, Role, User};

#[cfg(test)]
pub mod test_helpers;
