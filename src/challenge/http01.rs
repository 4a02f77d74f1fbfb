use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use super::{Challenge, ChallengeData, unmarshal_requiring};
use crate::error::{AcmeError, Result};
use crate::session::Session;

/// Proves control of a domain by serving a file over plain HTTP.
pub struct Http01Challenge {
    data: ChallengeData,
}

impl Http01Challenge {
    pub const TYPE: &'static str = "http-01";
    pub const WELL_KNOWN_PATH: &'static str = "/.well-known/acme-challenge/";

    pub fn new(session: Arc<Session>) -> Self {
        Self {
            data: ChallengeData::new(session),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.data.str_field("token")
    }

    /// Content to serve at [`Http01Challenge::path`].
    pub fn authorization(&self) -> Result<String> {
        self.data.key_authorization()
    }

    /// Request path the authority will fetch.
    pub fn path(&self) -> Result<String> {
        let token = self
            .token()
            .ok_or_else(|| AcmeError::InvalidChallenge("challenge has no token".into()))?;
        Ok(format!("{}{}", Self::WELL_KNOWN_PATH, token))
    }
}

impl Challenge for Http01Challenge {
    fn challenge_type(&self) -> &'static str {
        Self::TYPE
    }

    fn data(&self) -> &ChallengeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ChallengeData {
        &mut self.data
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn unmarshal(&mut self, json: &Value) -> Result<()> {
        unmarshal_requiring(&mut self.data, Self::TYPE, json, "token")
    }
}
