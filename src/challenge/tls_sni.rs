//! TLS-SNI challenges. Both were withdrawn by the protocol and survive only for
//! authorities that still offer them.
#![allow(deprecated)]

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use super::{Challenge, ChallengeData, sha256, unmarshal_requiring};
use crate::error::{AcmeError, Result};
use crate::session::Session;

const ACME_INVALID: &str = "acme.invalid";

/// Splits the hex SHA-256 of `input` into two DNS labels followed by `suffix`.
fn sni_name(input: &[u8], suffix: &str) -> String {
    let z = hex::encode(sha256(input));
    format!("{}.{}.{}", &z[..32], &z[32..], suffix)
}

#[deprecated(note = "tls-sni-01 was withdrawn; use dns-01 or http-01")]
pub struct TlsSni01Challenge {
    data: ChallengeData,
}

impl TlsSni01Challenge {
    pub const TYPE: &'static str = "tls-sni-01";

    pub fn new(session: Arc<Session>) -> Self {
        Self {
            data: ChallengeData::new(session),
        }
    }

    pub fn authorization(&self) -> Result<String> {
        self.data.key_authorization()
    }

    /// SNI name the self-signed certificate must carry.
    pub fn subject(&self) -> Result<String> {
        Ok(sni_name(self.authorization()?.as_bytes(), ACME_INVALID))
    }
}

impl Challenge for TlsSni01Challenge {
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

#[deprecated(note = "tls-sni-02 was withdrawn; use dns-01 or http-01")]
pub struct TlsSni02Challenge {
    data: ChallengeData,
}

impl TlsSni02Challenge {
    pub const TYPE: &'static str = "tls-sni-02";

    pub fn new(session: Arc<Session>) -> Self {
        Self {
            data: ChallengeData::new(session),
        }
    }

    pub fn authorization(&self) -> Result<String> {
        self.data.key_authorization()
    }

    /// SAN A, derived from the token.
    pub fn subject(&self) -> Result<String> {
        let token = self
            .data
            .str_field("token")
            .ok_or_else(|| AcmeError::InvalidChallenge("challenge has no token".into()))?;
        Ok(sni_name(token.as_bytes(), &format!("token.{ACME_INVALID}")))
    }

    /// SAN B, derived from the key authorization.
    pub fn sanb(&self) -> Result<String> {
        Ok(sni_name(
            self.authorization()?.as_bytes(),
            &format!("ka.{ACME_INVALID}"),
        ))
    }
}

impl Challenge for TlsSni02Challenge {
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
