use reqwest::Url;

use crate::error::{AcmeError, Result};
use crate::provider::AcmeProvider;

/// Any authority reachable through a plain `http` or `https` directory URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericProvider;

impl AcmeProvider for GenericProvider {
    fn accepts(&self, server_uri: &Url) -> bool {
        matches!(server_uri.scheme(), "http" | "https")
    }

    fn resolve(&self, server_uri: &Url) -> Result<Url> {
        if !self.accepts(server_uri) {
            return Err(AcmeError::UnsupportedServer(format!(
                "{server_uri} is not an http(s) directory url"
            )));
        }
        Ok(server_uri.clone())
    }
}
