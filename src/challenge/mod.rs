//! Challenge objects and the registry that builds them.
//!
//! Every challenge is bound to the [`Session`] it was created for. The shared
//! state (status, location, validation time, error document) lives in
//! [`ChallengeData`]; variants add the computations their proof needs.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::directory::json_kind;
use crate::error::{AcmeError, Result};
use crate::session::Session;

mod dns01;
mod http01;
mod oob01;
mod registry;
mod tls_sni;

pub use dns01::Dns01Challenge;
pub use http01::Http01Challenge;
pub use oob01::OutOfBand01Challenge;
pub use registry::{ChallengeConstructor, ChallengeRegistry, create_challenge};
#[allow(deprecated)]
pub use tls_sni::{TlsSni01Challenge, TlsSni02Challenge};

/// Lifecycle state reported by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Processing,
    Ready,
    Valid,
    Invalid,
    Revoked,
    Deactivated,
    Expired,
    Unknown,
}

impl Status {
    pub fn parse(raw: &str) -> Status {
        match raw {
            "pending" => Status::Pending,
            "processing" => Status::Processing,
            "ready" => Status::Ready,
            "valid" => Status::Valid,
            "invalid" => Status::Invalid,
            "revoked" => Status::Revoked,
            "deactivated" => Status::Deactivated,
            "expired" => Status::Expired,
            _ => Status::Unknown,
        }
    }
}

/// State common to every challenge variant.
pub struct ChallengeData {
    session: Arc<Session>,
    json: Map<String, Value>,
    status: Status,
    location: Option<Url>,
    validated: Option<DateTime<Utc>>,
}

impl ChallengeData {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            json: Map::new(),
            status: Status::Pending,
            location: None,
            validated: None,
        }
    }

    /// Replaces the state with the challenge document `json`, which must be of
    /// type `expected_type`. On error the previous state is kept.
    fn load(&mut self, expected_type: &str, json: &Value) -> Result<()> {
        let Value::Object(map) = json else {
            return Err(AcmeError::InvalidChallenge(format!(
                "expected a JSON object, got {}",
                json_kind(json)
            )));
        };

        match map.get("type").and_then(Value::as_str) {
            Some(kind) if kind == expected_type => {}
            Some(kind) => {
                return Err(AcmeError::InvalidChallenge(format!(
                    "cannot load a {kind} document into a {expected_type} challenge"
                )));
            }
            None => {
                return Err(AcmeError::InvalidChallenge("document has no type".into()));
            }
        }

        let status = map
            .get("status")
            .and_then(Value::as_str)
            .map(Status::parse)
            .unwrap_or(Status::Pending);

        // "uri" is what pre-RFC 8555 servers call it.
        let location = match map.get("url").or_else(|| map.get("uri")).and_then(Value::as_str) {
            Some(raw) => Some(
                Url::parse(raw)
                    .map_err(|err| AcmeError::InvalidChallenge(format!("bad url {raw:?}: {err}")))?,
            ),
            None => None,
        };

        let validated = match map.get("validated").and_then(Value::as_str) {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|err| {
                        AcmeError::InvalidChallenge(format!("bad validated time {raw:?}: {err}"))
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        self.json = map.clone();
        self.status = status;
        self.location = location;
        self.validated = validated;
        Ok(())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.json.get(key).and_then(Value::as_str)
    }

    /// `token "." thumbprint`, as defined for token based challenges.
    fn key_authorization(&self) -> Result<String> {
        let token = self
            .str_field("token")
            .ok_or_else(|| AcmeError::InvalidChallenge("challenge has no token".into()))?;
        let thumbprint = self
            .session
            .account_thumbprint()
            .ok_or(AcmeError::MissingAccountKey)?;
        Ok(format!("{token}.{thumbprint}"))
    }
}

/// A protocol challenge bound to one session.
pub trait Challenge: Send + Sync {
    /// Protocol identifier, e.g. `dns-01`.
    fn challenge_type(&self) -> &'static str;

    fn data(&self) -> &ChallengeData;

    fn data_mut(&mut self) -> &mut ChallengeData;

    fn as_any(&self) -> &dyn Any;

    fn session(&self) -> &Arc<Session> {
        &self.data().session
    }

    fn status(&self) -> Status {
        self.data().status
    }

    fn location(&self) -> Option<&Url> {
        self.data().location.as_ref()
    }

    fn validated(&self) -> Option<DateTime<Utc>> {
        self.data().validated
    }

    /// Problem document of a failed validation.
    fn error(&self) -> Option<&Value> {
        self.data().json.get("error")
    }

    /// The last challenge document loaded through [`Challenge::unmarshal`].
    fn json(&self) -> &Map<String, Value> {
        &self.data().json
    }

    fn unmarshal(&mut self, json: &Value) -> Result<()> {
        let kind = self.challenge_type();
        self.data_mut().load(kind, json)
    }
}

impl dyn Challenge {
    pub fn downcast_ref<T: Challenge + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Challenge")
            .field("type", &self.challenge_type())
            .field("status", &self.status())
            .field("location", &self.location().map(Url::as_str))
            .finish()
    }
}

/// Loads `json` and then insists on a string `field` the variant cannot work
/// without.
fn unmarshal_requiring(data: &mut ChallengeData, kind: &str, json: &Value, field: &str) -> Result<()> {
    let has_field = json.get(field).and_then(Value::as_str).is_some();
    if !has_field {
        return Err(AcmeError::InvalidChallenge(format!(
            "{kind} challenge requires a \"{field}\" field"
        )));
    }
    data.load(kind, json)
}

fn sha256(input: &[u8]) -> [u8; 32] {
    Sha256::digest(input).into()
}

fn base64url(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}
