use std::sync::Arc;

use log::debug;
use reqwest::Url;

use crate::challenge::{self, Challenge};
use crate::connector::{Connection, ConnectionFactory, HttpConnector};
use crate::directory::Directory;
use crate::error::Result;
use crate::session::Session;

const HTTP_OK: u16 = 200;

/// What every certificate authority implementation provides.
///
/// Implementors supply [`accepts`](AcmeProvider::accepts) and
/// [`resolve`](AcmeProvider::resolve); everything else has a default. Override
/// [`connection_factory`](AcmeProvider::connection_factory) to tune timeouts,
/// proxies or trust roots without touching the bootstrap logic.
pub trait AcmeProvider: Send + Sync {
    /// Whether this provider handles `server_uri`.
    fn accepts(&self, server_uri: &Url) -> bool;

    /// Maps the caller's server URI to the directory endpoint. Must be pure.
    fn resolve(&self, server_uri: &Url) -> Result<Url>;

    fn connection_factory(&self) -> Arc<dyn ConnectionFactory> {
        HttpConnector::shared()
    }

    /// A fresh connection. It is released when dropped.
    fn connect(&self) -> Result<Box<dyn Connection>> {
        self.connection_factory().connect()
    }

    fn directory(&self, session: &Session, server_uri: &Url) -> Result<Directory> {
        fetch_directory(self, session, server_uri)
    }

    fn create_challenge(
        &self,
        session: &Arc<Session>,
        challenge_type: &str,
    ) -> Option<Box<dyn Challenge>> {
        challenge::create_challenge(session, challenge_type)
    }
}

/// Fetches the directory of `server_uri` in a single round trip.
///
/// The connection is dropped on every exit path. A `Replay-Nonce` on the
/// successful response is stored in the session; its absence is not an error.
pub fn fetch_directory<P>(provider: &P, session: &Session, server_uri: &Url) -> Result<Directory>
where
    P: AcmeProvider + ?Sized,
{
    let mut conn = provider.connect()?;
    let endpoint = provider.resolve(server_uri)?;
    debug!("[acme-dir] fetching directory of {} from {}", server_uri, endpoint);

    conn.send_request(&endpoint, session)?;
    conn.accept(HTTP_OK)?;

    // use the nonce header if there is one, saves a newNonce request
    conn.update_session(session);

    let directory = Directory::from_json(conn.read_json_response()?)?;
    debug!(
        "[acme-dir] directory of {} lists {} entries",
        server_uri,
        directory.as_json().len()
    );
    Ok(directory)
}
