use log::warn;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AcmeError, Result};

/// Operations an authority advertises in its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    NewNonce,
    NewAccount,
    NewOrder,
    NewAuthz,
    RevokeCert,
    KeyChange,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::NewNonce,
        Resource::NewAccount,
        Resource::NewOrder,
        Resource::NewAuthz,
        Resource::RevokeCert,
        Resource::KeyChange,
    ];

    /// Key of this resource inside the directory document.
    pub fn key(&self) -> &'static str {
        match self {
            Resource::NewNonce => "newNonce",
            Resource::NewAccount => "newAccount",
            Resource::NewOrder => "newOrder",
            Resource::NewAuthz => "newAuthz",
            Resource::RevokeCert => "revokeCert",
            Resource::KeyChange => "keyChange",
        }
    }
}

/// The optional `meta` object of a directory.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub terms_of_service: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub caa_identities: Vec<String>,
    #[serde(default)]
    pub external_account_required: bool,
}

/// Capability map returned by a directory bootstrap. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    entries: Map<String, Value>,
}

impl Directory {
    /// Wraps a parsed response body. Only JSON objects are directories.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(AcmeError::UnparsableResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Endpoint advertised for `resource`, if present and a valid URL.
    pub fn url(&self, resource: Resource) -> Option<Url> {
        let raw = self.entries.get(resource.key())?.as_str()?;
        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(
                    "[acme-dir] ignoring invalid {} url {:?}: {}",
                    resource.key(),
                    raw,
                    err
                );
                None
            }
        }
    }

    /// Directory metadata. A missing or malformed `meta` object yields defaults.
    pub fn meta(&self) -> Metadata {
        let Some(raw) = self.entries.get("meta") else {
            return Metadata::default();
        };
        match serde_json::from_value::<Metadata>(raw.clone()) {
            Ok(meta) => meta,
            Err(err) => {
                warn!("[acme-dir] malformed directory meta object: {}", err);
                Metadata::default()
            }
        }
    }

    pub fn as_json(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.entries)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
