use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, ACCEPT_CHARSET, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Url;
use serde_json::Value;

use super::Connection;
use crate::error::{AcmeError, Result};
use crate::session::Session;

pub const REPLAY_NONCE: &str = "Replay-Nonce";

/// [`Connection`] backed by a blocking reqwest client.
pub struct DefaultConnection {
    client: Client,
    response: Option<Response>,
}

impl DefaultConnection {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            response: None,
        }
    }

    fn response(&self) -> Result<&Response> {
        self.response
            .as_ref()
            .ok_or_else(|| AcmeError::Transport("no request has been sent on this connection".into()))
    }
}

impl Connection for DefaultConnection {
    fn send_request(&mut self, url: &Url, session: &Session) -> Result<()> {
        debug!("[acme-http] GET {}", url);

        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .header(ACCEPT_CHARSET, "utf-8");
        if let Some(locale) = session.locale() {
            request = request.header(ACCEPT_LANGUAGE, locale);
        }

        let response = request
            .send()
            .map_err(|err| AcmeError::Network(format!("{url}: {err}")))?;
        debug!("[acme-http] {} answered HTTP {}", url, response.status());
        self.response = Some(response);
        Ok(())
    }

    fn accept(&mut self, expected: u16) -> Result<u16> {
        let status = self.response()?.status().as_u16();
        if status != expected {
            debug!("[acme-http] expected HTTP {expected}, got {status}");
            return Err(AcmeError::UnexpectedResponse { status });
        }
        Ok(status)
    }

    fn read_json_response(&mut self) -> Result<Value> {
        let response = self
            .response
            .take()
            .ok_or_else(|| AcmeError::Transport("no response to read".into()))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase());
        match content_type.as_deref() {
            Some(ct) if ct.starts_with("application/json") => {}
            other => warn!("[acme-http] expected a JSON response, content type is {:?}", other),
        }

        let body = response
            .bytes()
            .map_err(|err| AcmeError::Network(format!("failed to read response body: {err}")))?;
        serde_json::from_slice(&body).map_err(|err| AcmeError::UnparsableResponse(err.to_string()))
    }

    fn update_session(&mut self, session: &Session) {
        let Some(response) = self.response.as_ref() else {
            return;
        };
        let header = response
            .headers()
            .get(REPLAY_NONCE)
            .map(|value| value.to_str().map(str::trim));
        match header {
            Some(Ok(nonce)) if is_valid_nonce(nonce) => {
                debug!("[acme-http] captured replay nonce");
                session.set_nonce(Some(nonce.to_string()));
            }
            Some(_) => warn!("[acme-http] ignoring malformed {REPLAY_NONCE} header"),
            None => debug!("[acme-http] response carried no {REPLAY_NONCE} header"),
        }
    }
}

impl Drop for DefaultConnection {
    fn drop(&mut self) {
        if self.response.take().is_some() {
            debug!("[acme-http] released connection with unread response");
        }
    }
}

/// Nonces are base64url without padding.
fn is_valid_nonce(nonce: &str) -> bool {
    !nonce.is_empty()
        && nonce
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_base64url_nonces() {
        assert!(is_valid_nonce("abc123"));
        assert!(is_valid_nonce("oFvnlFP1wIhRlYS2jTaXbA_-Zs"));
    }

    #[test]
    fn rejects_malformed_nonces() {
        assert!(!is_valid_nonce(""));
        assert!(!is_valid_nonce("abc=="));
        assert!(!is_valid_nonce("has space"));
    }

    #[test]
    fn accept_without_request_is_a_transport_fault() {
        let mut conn = DefaultConnection::new(Client::new());
        let err = conn.accept(200).unwrap_err();
        assert!(matches!(err, AcmeError::Transport(_)));
    }

    #[test]
    fn update_session_without_response_keeps_nonce() {
        let session = Session::new("https://ca.example/directory").unwrap();
        session.set_nonce(Some("old".into()));
        let mut conn = DefaultConnection::new(Client::new());
        conn.update_session(&session);
        assert_eq!(session.nonce().as_deref(), Some("old"));
    }
}
