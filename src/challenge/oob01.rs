use std::any::Any;
use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;

use super::{Challenge, ChallengeData, unmarshal_requiring};
use crate::error::{AcmeError, Result};
use crate::session::Session;

/// Validation happens out of band: a human visits the URL the authority hands out.
pub struct OutOfBand01Challenge {
    data: ChallengeData,
}

impl OutOfBand01Challenge {
    pub const TYPE: &'static str = "oob-01";

    pub fn new(session: Arc<Session>) -> Self {
        Self {
            data: ChallengeData::new(session),
        }
    }

    pub fn validation_url(&self) -> Result<Url> {
        let raw = self
            .data
            .str_field("href")
            .ok_or_else(|| AcmeError::InvalidChallenge("challenge has no href".into()))?;
        Url::parse(raw).map_err(|err| AcmeError::InvalidChallenge(format!("bad href {raw:?}: {err}")))
    }
}

impl Challenge for OutOfBand01Challenge {
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
        unmarshal_requiring(&mut self.data, Self::TYPE, json, "href")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::test_support;
    use serde_json::json;

    #[test]
    fn reads_validation_url() {
        let mut challenge = OutOfBand01Challenge::new(test_support::session());
        challenge
            .unmarshal(&json!({
                "type": "oob-01",
                "status": "pending",
                "href": "https://ca.example/validate/evaGxfADs6pSRb2LAv9IZ"
            }))
            .unwrap();
        assert_eq!(
            challenge.validation_url().unwrap().as_str(),
            "https://ca.example/validate/evaGxfADs6pSRb2LAv9IZ"
        );
    }

    #[test]
    fn unmarshal_requires_href() {
        let mut challenge = OutOfBand01Challenge::new(test_support::session());
        assert!(challenge.unmarshal(&json!({ "type": "oob-01" })).is_err());
        assert!(challenge.validation_url().is_err());
    }
}
