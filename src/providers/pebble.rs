use std::sync::Arc;

use log::{debug, warn};
use reqwest::Url;

use crate::connector::{ConnectionFactory, HttpConnector, HttpConnectorConfig};
use crate::error::{AcmeError, Result};
use crate::provider::AcmeProvider;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 14000;
/// Path to Pebble's minica root certificate (`test/certs/pebble.minica.pem`).
pub const ROOT_ENV: &str = "ACME_PROVIDER_PEBBLE_ROOT";

/// Pebble, the ACME test server, addressed as `acme://pebble`,
/// `acme://pebble/<host>` or `acme://pebble/<host>:<port>`.
///
/// Pebble serves its directory with a certificate from its own minica root.
/// When that root is known (`ACME_PROVIDER_PEBBLE_ROOT` or
/// [`PebbleProvider::with_root_pem`]) it is added as a trust anchor and
/// verification stays on. Without it, connections skip certificate
/// verification, so never point such a provider at anything but a test server.
pub struct PebbleProvider {
    connector: Arc<HttpConnector>,
}

impl PebbleProvider {
    pub fn new() -> Self {
        let config = HttpConnectorConfig::from_env();
        match resolve_root_pem() {
            Some(pem) => Self::with_root_pem(config, pem),
            None => Self::with_config(config),
        }
    }

    /// Trusts `pem` on top of `config`'s anchors and keeps verification on.
    pub fn with_root_pem(config: HttpConnectorConfig, pem: impl Into<String>) -> Self {
        let mut config = config;
        config.extra_root_pems.push(pem.into());
        Self::from_connector_config(config)
    }

    /// Uses `config` as is when it already carries a trust anchor, otherwise
    /// disables certificate verification.
    pub fn with_config(config: HttpConnectorConfig) -> Self {
        if config.extra_root_pems.is_empty() && !config.accept_invalid_certs {
            debug!("[acme-provider] no pebble root configured ({ROOT_ENV}); skipping certificate verification");
            return Self::from_connector_config(HttpConnectorConfig {
                accept_invalid_certs: true,
                ..config
            });
        }
        Self::from_connector_config(config)
    }

    fn from_connector_config(config: HttpConnectorConfig) -> Self {
        Self {
            connector: Arc::new(HttpConnector::new(config)),
        }
    }
}

fn resolve_root_pem() -> Option<String> {
    let path = std::env::var(ROOT_ENV).ok()?;
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(pem) => Some(pem),
        Err(err) => {
            warn!("[acme-provider] cannot read pebble root {path:?}: {err}");
            None
        }
    }
}

impl Default for PebbleProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AcmeProvider for PebbleProvider {
    fn accepts(&self, server_uri: &Url) -> bool {
        server_uri.scheme() == "acme" && server_uri.host_str() == Some("pebble")
    }

    fn resolve(&self, server_uri: &Url) -> Result<Url> {
        if !self.accepts(server_uri) {
            return Err(AcmeError::UnsupportedServer(format!(
                "{server_uri} is not a pebble uri"
            )));
        }

        let target = server_uri.path().trim_matches('/');
        let (host, port) = match target.rsplit_once(':') {
            _ if target.is_empty() => (DEFAULT_HOST, DEFAULT_PORT),
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    AcmeError::UnsupportedServer(format!("invalid pebble port {port:?}"))
                })?;
                (host, port)
            }
            None => (target, DEFAULT_PORT),
        };
        if host.is_empty() || host.contains('/') {
            return Err(AcmeError::UnsupportedServer(format!(
                "invalid pebble host {host:?}"
            )));
        }

        let raw = format!("https://{host}:{port}/dir");
        Url::parse(&raw).map_err(|err| AcmeError::InvalidUri(format!("{raw}: {err}")))
    }

    fn connection_factory(&self) -> Arc<dyn ConnectionFactory> {
        self.connector.clone()
    }
}
