use reqwest::Url;
use serde_json::Value;

use crate::error::Result;
use crate::session::Session;

mod connection;
mod http;

pub use connection::{DefaultConnection, REPLAY_NONCE};
pub use http::{HttpConnector, HttpConnectorConfig, DEFAULT_TIMEOUT_SECS, PROXY_ENV, TIMEOUT_ENV};

/// A scoped, single-use exchange with an authority.
///
/// A connection carries at most one request. Whatever transport handle it
/// wraps is released when the connection is dropped, so every exit path of a
/// caller releases it exactly once.
pub trait Connection: Send {
    /// Sends a GET request to `url`. The session supplies request context such
    /// as the preferred language.
    fn send_request(&mut self, url: &Url, session: &Session) -> Result<()>;

    /// Checks the status of the last response against `expected` and returns
    /// it. Any other status is an `UnexpectedResponse` fault; the body is left
    /// unread.
    fn accept(&mut self, expected: u16) -> Result<u16>;

    /// Reads the last response body as JSON.
    fn read_json_response(&mut self) -> Result<Value>;

    /// Copies the replay-nonce of the last response into the session, if the
    /// authority sent one. Never fails.
    fn update_session(&mut self, session: &Session);
}

/// Creates connections. Authorities override this to tune the transport.
pub trait ConnectionFactory: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Connection>>;
}
