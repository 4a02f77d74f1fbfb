use reqwest::Url;

use crate::error::{AcmeError, Result};
use crate::provider::AcmeProvider;

pub const PRODUCTION_DIRECTORY: &str = "https://acme-v02.api.letsencrypt.org/directory";
pub const STAGING_DIRECTORY: &str = "https://acme-staging-v02.api.letsencrypt.org/directory";

/// Let's Encrypt, addressed as `acme://letsencrypt.org` (production) or
/// `acme://letsencrypt.org/staging`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LetsEncryptProvider;

impl AcmeProvider for LetsEncryptProvider {
    fn accepts(&self, server_uri: &Url) -> bool {
        server_uri.scheme() == "acme" && server_uri.host_str() == Some("letsencrypt.org")
    }

    fn resolve(&self, server_uri: &Url) -> Result<Url> {
        if !self.accepts(server_uri) {
            return Err(AcmeError::UnsupportedServer(format!(
                "{server_uri} is not a Let's Encrypt uri"
            )));
        }
        let directory = match server_uri.path() {
            "" | "/" | "/v02" => PRODUCTION_DIRECTORY,
            "/staging" => STAGING_DIRECTORY,
            other => {
                return Err(AcmeError::UnsupportedServer(format!(
                    "unknown Let's Encrypt instance {other:?}"
                )));
            }
        };
        Url::parse(directory).map_err(|err| AcmeError::InvalidUri(err.to_string()))
    }
}
