use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use super::{Challenge, ChallengeData, base64url, sha256, unmarshal_requiring};
use crate::error::{AcmeError, Result};
use crate::session::Session;

/// Proves control of a domain with a TXT record.
pub struct Dns01Challenge {
    data: ChallengeData,
}

impl Dns01Challenge {
    pub const TYPE: &'static str = "dns-01";
    pub const RECORD_NAME_PREFIX: &'static str = "_acme-challenge";

    pub fn new(session: Arc<Session>) -> Self {
        Self {
            data: ChallengeData::new(session),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.data.str_field("token")
    }

    /// TXT record value: base64url SHA-256 of the key authorization.
    pub fn digest(&self) -> Result<String> {
        let key_authorization = self.data.key_authorization()?;
        Ok(base64url(&sha256(key_authorization.as_bytes())))
    }

    /// Name of the TXT record to publish for `domain`, in ASCII form.
    pub fn record_name(domain: &str) -> Result<String> {
        let trimmed = domain.trim().trim_start_matches("*.").trim_end_matches('.');
        let trimmed = trimmed
            .strip_prefix(Self::RECORD_NAME_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(AcmeError::InvalidChallenge("domain name is required".into()));
        }
        let ascii = idna::domain_to_ascii(trimmed)
            .map_err(|err| AcmeError::InvalidChallenge(format!("invalid domain name: {err}")))?;
        Ok(format!("{}.{}", Self::RECORD_NAME_PREFIX, ascii.to_lowercase()))
    }
}

impl Challenge for Dns01Challenge {
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
