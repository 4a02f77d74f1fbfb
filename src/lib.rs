//! Provider layer of an ACME client.
//!
//! An [`AcmeProvider`] turns a server URI into a directory endpoint, fetches the
//! directory in one round trip (priming the session's replay-nonce on the way)
//! and builds challenge objects bound to a [`Session`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use acme_provider::{Session, find_provider};
//!
//! # fn main() -> Result<(), acme_provider::AcmeError> {
//! let session = Arc::new(Session::new("acme://letsencrypt.org/staging")?);
//! let provider = find_provider(session.server_uri())?;
//!
//! let directory = provider.directory(&session, session.server_uri())?;
//! session.cache_directory(&directory);
//!
//! if let Some(challenge) = provider.create_challenge(&session, "dns-01") {
//!     println!("{:?}", challenge);
//! }
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod connector;
pub mod directory;
pub mod error;
pub mod provider;
pub mod providers;
pub mod session;

pub use challenge::{Challenge, ChallengeRegistry, Status};
pub use connector::{Connection, ConnectionFactory, HttpConnector, HttpConnectorConfig};
pub use directory::{Directory, Metadata, Resource};
pub use error::{AcmeError, Result};
pub use provider::{AcmeProvider, fetch_directory};
pub use providers::{GenericProvider, LetsEncryptProvider, PebbleProvider, find_provider};
pub use session::Session;
