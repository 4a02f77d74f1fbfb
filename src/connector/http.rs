use std::sync::{Arc, OnceLock};
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::{Certificate, Proxy};

use super::{Connection, ConnectionFactory, DefaultConnection};
use crate::error::{AcmeError, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const TIMEOUT_ENV: &str = "ACME_PROVIDER_HTTP_TIMEOUT_SECS";
pub const PROXY_ENV: &str = "ACME_PROVIDER_HTTP_PROXY";

/// Transport settings for [`HttpConnector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConnectorConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<String>,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` when no explicit proxy is set.
    pub system_proxy: bool,
    /// Additional PEM encoded trust anchors.
    pub extra_root_pems: Vec<String>,
    pub accept_invalid_certs: bool,
}

impl Default for HttpConnectorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
            proxy: None,
            system_proxy: true,
            extra_root_pems: Vec::new(),
            accept_invalid_certs: false,
        }
    }
}

impl HttpConnectorConfig {
    /// Defaults overridden by `ACME_PROVIDER_HTTP_TIMEOUT_SECS` and
    /// `ACME_PROVIDER_HTTP_PROXY`.
    pub fn from_env() -> Self {
        Self {
            timeout: resolve_timeout(),
            proxy: resolve_proxy(),
            ..Self::default()
        }
    }
}

/// The standard connection factory: a blocking reqwest client per connector,
/// built on first use and shared by every connection it hands out.
pub struct HttpConnector {
    config: HttpConnectorConfig,
    client: OnceLock<Client>,
}

impl HttpConnector {
    pub fn new(config: HttpConnectorConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    /// Process-wide connector configured from the environment.
    pub fn shared() -> Arc<HttpConnector> {
        static CONNECTOR: OnceLock<Arc<HttpConnector>> = OnceLock::new();
        CONNECTOR
            .get_or_init(|| Arc::new(HttpConnector::new(HttpConnectorConfig::from_env())))
            .clone()
    }

    pub fn config(&self) -> &HttpConnectorConfig {
        &self.config
    }

    fn client(&self) -> Result<Client> {
        if let Some(client) = self.client.get() {
            return Ok(client.clone());
        }
        let client = build_client(&self.config)?;
        // A concurrent first use may have won the race; either client is fine.
        let _ = self.client.set(client.clone());
        Ok(client)
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(HttpConnectorConfig::default())
    }
}

impl ConnectionFactory for HttpConnector {
    fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(DefaultConnection::new(self.client()?)))
    }
}

fn build_client(config: &HttpConnectorConfig) -> Result<Client> {
    debug!(
        "[acme-http] building client (timeout={}s, proxy={}, extra_roots={}, accept_invalid_certs={})",
        config.timeout.as_secs(),
        config.proxy.is_some(),
        config.extra_root_pems.len(),
        config.accept_invalid_certs
    );

    let mut builder = Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none())
        .danger_accept_invalid_certs(config.accept_invalid_certs);

    if let Some(proxy) = &config.proxy {
        let proxy = Proxy::all(proxy.as_str())
            .map_err(|err| AcmeError::Transport(format!("invalid proxy {proxy}: {err}")))?;
        builder = builder.proxy(proxy);
    } else if !config.system_proxy {
        builder = builder.no_proxy();
    }

    for pem in &config.extra_root_pems {
        let cert = Certificate::from_pem(pem.as_bytes())
            .map_err(|err| AcmeError::Transport(format!("invalid trust anchor: {err}")))?;
        builder = builder.add_root_certificate(cert);
    }

    builder
        .build()
        .map_err(|err| AcmeError::Transport(format!("failed to build http client: {err}")))
}

fn default_user_agent() -> String {
    format!("acme-provider/{}", env!("CARGO_PKG_VERSION"))
}

fn resolve_timeout() -> Duration {
    let Ok(raw) = std::env::var(TIMEOUT_ENV) else {
        return Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!("[acme-http] invalid {TIMEOUT_ENV} value {raw:?}; using default");
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        }
    }
}

fn resolve_proxy() -> Option<String> {
    std::env::var(PROXY_ENV)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
