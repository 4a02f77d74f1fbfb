use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use log::debug;
use reqwest::Url;

use crate::directory::{Directory, Resource};
use crate::error::{AcmeError, Result};

/// One logical relationship with one authority.
///
/// Sessions are created and owned by the caller and usually shared as
/// `Arc<Session>` so challenges can hold on to them. The provider layer only
/// ever writes the replay-nonce. Callers must not race two directory fetches on
/// the same session; the locks below keep shared access sound but do not order
/// writers.
#[derive(Debug)]
pub struct Session {
    server_uri: Url,
    account_thumbprint: Option<String>,
    locale: Option<String>,
    nonce: Mutex<Option<String>>,
    resources: RwLock<HashMap<Resource, Url>>,
}

impl Session {
    pub fn new(server_uri: &str) -> Result<Self> {
        let server_uri = Url::parse(server_uri)
            .map_err(|err| AcmeError::InvalidUri(format!("{server_uri}: {err}")))?;
        Ok(Self::from_url(server_uri))
    }

    pub fn from_url(server_uri: Url) -> Self {
        Self {
            server_uri,
            account_thumbprint: None,
            locale: None,
            nonce: Mutex::new(None),
            resources: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the base64url JWK thumbprint of the account key. Challenges use it
    /// to build key authorizations.
    pub fn with_account_thumbprint(mut self, thumbprint: impl Into<String>) -> Self {
        self.account_thumbprint = Some(thumbprint.into());
        self
    }

    /// Preferred language for human readable server messages.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn server_uri(&self) -> &Url {
        &self.server_uri
    }

    pub fn account_thumbprint(&self) -> Option<&str> {
        self.account_thumbprint.as_deref()
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn nonce(&self) -> Option<String> {
        self.nonce
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_nonce(&self, nonce: Option<String>) {
        *self
            .nonce
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = nonce;
    }

    /// Remembers every endpoint the directory advertises, replacing what was
    /// cached before.
    pub fn cache_directory(&self, directory: &Directory) {
        let mut resources = self
            .resources
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        resources.clear();
        for resource in Resource::ALL {
            if let Some(url) = directory.url(resource) {
                resources.insert(resource, url);
            }
        }
        debug!(
            "[acme-session] cached {} endpoints for {}",
            resources.len(),
            self.server_uri
        );
    }

    pub fn resource_url(&self, resource: Resource) -> Option<Url> {
        self.resources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&resource)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_unparsable_server_uri() {
        let err = Session::new("not a uri").unwrap_err();
        assert!(matches!(err, AcmeError::InvalidUri(_)));
    }

    #[test]
    fn nonce_starts_empty_and_can_be_replaced() {
        let session = Session::new("acme://letsencrypt.org/staging").unwrap();
        assert_eq!(session.nonce(), None);
        session.set_nonce(Some("abc".into()));
        assert_eq!(session.nonce().as_deref(), Some("abc"));
        session.set_nonce(None);
        assert_eq!(session.nonce(), None);
    }

    #[test]
    fn caches_directory_endpoints() {
        let session = Session::new("https://ca.example/directory").unwrap();
        let directory = Directory::from_json(json!({
            "newNonce": "https://ca.example/nonce",
            "newOrder": "https://ca.example/order"
        }))
        .unwrap();
        session.cache_directory(&directory);
        assert_eq!(
            session.resource_url(Resource::NewOrder).unwrap().as_str(),
            "https://ca.example/order"
        );
        assert!(session.resource_url(Resource::KeyChange).is_none());

        session.cache_directory(&Directory::from_json(json!({})).unwrap());
        assert!(session.resource_url(Resource::NewOrder).is_none());
    }

    #[test]
    fn builder_sets_account_context() {
        let session = Session::new("https://ca.example/directory")
            .unwrap()
            .with_account_thumbprint("thumb")
            .with_locale("de-DE");
        assert_eq!(session.account_thumbprint(), Some("thumb"));
        assert_eq!(session.locale(), Some("de-DE"));
    }
}
