//! Client core for the learning-platform admin console.
//!
//! This crate owns everything between a console view and the backend: the
//! persisted credentials, the authenticated session, the HTTP client that
//! injects the bearer token, the query cache that deduplicates reads, and the
//! route guard that keeps non-admins out of protected views. Rendering is the
//! host's job; it reads [`session::Session`] snapshots and
//! [`guard::GuardDecision`]s and calls into [`console::Console`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`console`] | Facade wiring session, cache and API client together |
//! | [`session`] | Auth session manager and login outcomes |
//! | [`storage`] | Key/value backends and the credential record |
//! | [`net`] | API client, reqwest transport, wire types, resource paths |
//! | [`cache`] | Query cache, cache keys, view scopes |
//! | [`guard`] | Route guard decisions |
//! | [`config`] | Environment-driven configuration |
//! | [`error`] | Error taxonomy and error codes |

pub mod cache;
pub mod config;
pub mod console;
pub mod error;
pub mod guard;
pub mod net;
pub mod session;
pub mod storage;

pub use cache::{CacheConfig, QueryCache, QueryKey, ViewScope};
pub use config::ConsoleConfig;
pub use console::Console;
pub use error::{ApiError, AuthError, ConfigError, ErrorCode, StorageError};
pub use guard::{GuardDecision, GuardNotice, guard};
pub use net::{ApiClient, HttpTransport, LoginRequest, Resource, Role, Transport, User};
pub use session::{AuthSession, LoginOutcome, Session, SessionPhase};
pub use storage::{CredentialStore, FileStore, KeyValueStore, MemoryStore};
