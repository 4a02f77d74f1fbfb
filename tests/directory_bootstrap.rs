//! Directory bootstrap over real HTTP against a one-shot local server.

mod support;

use std::sync::Arc;

use acme_provider::{AcmeError, AcmeProvider, Resource, Session};
use anyhow::{Result, anyhow};
use reqwest::Url;
use serde_json::json;

use support::{
    CannedResponse, LocalProvider, closed_addr, idle_listener, init_logging, serve_once,
    was_contacted,
};

fn directory_url(addr: std::net::SocketAddr) -> Url {
    Url::parse(&format!("http://{addr}/directory")).unwrap()
}

#[test]
fn fetches_directory_and_captures_nonce() -> Result<()> {
    init_logging();
    let (addr, server) = serve_once(
        CannedResponse::json("200 OK", r#"{"newOrder":"https://ca.example/order"}"#)
            .with_header("Replay-Nonce", "abc123"),
    );
    let uri = directory_url(addr);
    let session = Session::from_url(uri.clone());

    let directory = LocalProvider::new().directory(&session, &uri)?;

    assert_eq!(
        directory.into_json(),
        json!({ "newOrder": "https://ca.example/order" })
    );
    assert_eq!(session.nonce().as_deref(), Some("abc123"));

    let request = server.join().map_err(|_| anyhow!("server panicked"))?;
    assert!(request.starts_with("get /directory http/1.1"));
    assert!(request.contains("accept: application/json"));
    assert!(request.contains("user-agent: acme-provider/"));
    Ok(())
}

#[test]
fn sends_session_locale() -> Result<()> {
    init_logging();
    let (addr, server) = serve_once(CannedResponse::json("200 OK", "{}"));
    let uri = directory_url(addr);
    let session = Session::from_url(uri.clone()).with_locale("de-DE");

    LocalProvider::new().directory(&session, &uri)?;

    let request = server.join().map_err(|_| anyhow!("server panicked"))?;
    assert!(request.contains("accept-language: de-de"));
    Ok(())
}

#[test]
fn directory_without_nonce_leaves_session_alone() -> Result<()> {
    init_logging();
    let (addr, server) = serve_once(CannedResponse::json(
        "200 OK",
        r#"{"newNonce":"https://ca.example/nonce","newAccount":"https://ca.example/acct"}"#,
    ));
    let uri = directory_url(addr);
    let session = Session::from_url(uri.clone());

    let directory = LocalProvider::new().directory(&session, &uri)?;
    server.join().map_err(|_| anyhow!("server panicked"))?;

    assert_eq!(session.nonce(), None);
    session.cache_directory(&directory);
    assert_eq!(
        session.resource_url(Resource::NewAccount).map(|u| u.to_string()),
        Some("https://ca.example/acct".to_string())
    );
    Ok(())
}

#[test]
fn malformed_nonce_is_ignored() -> Result<()> {
    init_logging();
    let (addr, server) = serve_once(
        CannedResponse::json("200 OK", "{}").with_header("Replay-Nonce", "not/base64url=="),
    );
    let uri = directory_url(addr);
    let session = Session::from_url(uri.clone());
    session.set_nonce(Some("kept".into()));

    LocalProvider::new().directory(&session, &uri)?;
    server.join().map_err(|_| anyhow!("server panicked"))?;

    assert_eq!(session.nonce().as_deref(), Some("kept"));
    Ok(())
}

#[test]
fn forbidden_is_a_protocol_fault() -> Result<()> {
    init_logging();
    let (addr, server) = serve_once(
        CannedResponse::new(
            "403 Forbidden",
            r#"{"type":"urn:ietf:params:acme:error:unauthorized"}"#,
        )
        .with_header("Content-Type", "application/problem+json")
        .with_header("Replay-Nonce", "ignored"),
    );
    let uri = directory_url(addr);
    let session = Session::from_url(uri.clone());

    let err = LocalProvider::new()
        .directory(&session, &uri)
        .err()
        .ok_or_else(|| anyhow!("403 must fail"))?;
    server.join().map_err(|_| anyhow!("server panicked"))?;

    assert!(matches!(err, AcmeError::UnexpectedResponse { status: 403 }));
    assert_eq!(err.status(), Some(403));
    assert_eq!(session.nonce(), None);
    Ok(())
}

#[test]
fn redirect_is_a_protocol_fault_and_not_followed() -> Result<()> {
    init_logging();
    let elsewhere = idle_listener();
    let target = format!("http://{}/directory", elsewhere.local_addr()?);
    let (addr, server) = serve_once(
        CannedResponse::new("302 Found", "")
            .with_header("Location", target)
            .with_header("Replay-Nonce", "fromredirect"),
    );
    let uri = directory_url(addr);
    let session = Session::from_url(uri.clone());

    let err = LocalProvider::new()
        .directory(&session, &uri)
        .err()
        .ok_or_else(|| anyhow!("302 must fail"))?;
    server.join().map_err(|_| anyhow!("server panicked"))?;

    assert!(matches!(err, AcmeError::UnexpectedResponse { status: 302 }));
    assert_eq!(session.nonce(), None);
    assert!(!was_contacted(&elsewhere));
    Ok(())
}

#[test]
fn no_content_is_a_protocol_fault() -> Result<()> {
    init_logging();
    let (addr, server) = serve_once(
        CannedResponse::new("204 No Content", "").with_header("Replay-Nonce", "n0nce"),
    );
    let uri = directory_url(addr);
    let session = Session::from_url(uri.clone());

    let err = LocalProvider::new()
        .directory(&session, &uri)
        .err()
        .ok_or_else(|| anyhow!("204 must fail"))?;
    server.join().map_err(|_| anyhow!("server panicked"))?;

    assert!(matches!(err, AcmeError::UnexpectedResponse { status: 204 }));
    assert_eq!(err.status(), Some(204));
    assert_eq!(session.nonce(), None);
    Ok(())
}

#[test]
fn malformed_body_is_a_parse_fault() -> Result<()> {
    init_logging();
    let (addr, server) = serve_once(CannedResponse::json("200 OK", "<html>maintenance</html>"));
    let uri = directory_url(addr);
    let session = Session::from_url(uri.clone());

    let err = LocalProvider::new()
        .directory(&session, &uri)
        .err()
        .ok_or_else(|| anyhow!("html must not parse"))?;
    server.join().map_err(|_| anyhow!("server panicked"))?;

    assert!(matches!(err, AcmeError::UnparsableResponse(_)));
    assert_eq!(err.status(), None);
    Ok(())
}

#[test]
fn unreachable_server_is_a_network_fault() -> Result<()> {
    init_logging();
    let uri = directory_url(closed_addr());
    let session = Session::from_url(uri.clone());

    let err = LocalProvider::new()
        .directory(&session, &uri)
        .err()
        .ok_or_else(|| anyhow!("nothing listens there"))?;
    assert!(matches!(err, AcmeError::Network(_)));
    Ok(())
}

#[test]
fn challenges_share_the_bootstrapped_session() -> Result<()> {
    init_logging();
    let (addr, server) = serve_once(
        CannedResponse::json("200 OK", "{}").with_header("Replay-Nonce", "n0nce"),
    );
    let uri = directory_url(addr);
    let session = Arc::new(Session::from_url(uri.clone()).with_account_thumbprint("thumb"));
    let provider = LocalProvider::new();

    provider.directory(&session, &uri)?;
    server.join().map_err(|_| anyhow!("server panicked"))?;

    let challenge = provider
        .create_challenge(&session, "http-01")
        .ok_or_else(|| anyhow!("http-01 is registered"))?;
    assert!(Arc::ptr_eq(challenge.session(), &session));
    assert_eq!(challenge.session().nonce().as_deref(), Some("n0nce"));
    Ok(())
}
