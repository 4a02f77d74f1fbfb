#![allow(dead_code)]

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use acme_provider::{
    AcmeError, AcmeProvider, ConnectionFactory, HttpConnector, HttpConnectorConfig,
};
use reqwest::Url;

/// A canned HTTP/1.1 response.
pub struct CannedResponse {
    pub status: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: &'static str,
}

impl CannedResponse {
    pub fn new(status: &'static str, body: &'static str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn json(status: &'static str, body: &'static str) -> Self {
        Self::new(status, body).with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn render(&self) -> String {
        let mut out = format!("HTTP/1.1 {}\r\n", self.status);
        for (name, value) in &self.headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.body.len(),
            self.body
        ));
        out
    }
}

/// Serves `response` to exactly one request. The handle yields the raw
/// request head, lowercased.
pub fn serve_once(response: CannedResponse) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(socket.try_clone().unwrap());
        let mut head = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        socket.write_all(response.render().as_bytes()).unwrap();
        socket.flush().unwrap();
        head.to_lowercase()
    });

    (addr, handle)
}

/// A listener that never answers. Poll it with [`was_contacted`] to check
/// whether anything tried to connect.
pub fn idle_listener() -> TcpListener {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    listener
}

pub fn was_contacted(listener: &TcpListener) -> bool {
    match listener.accept() {
        Ok(_) => true,
        Err(err) if err.kind() == ErrorKind::WouldBlock => false,
        Err(err) => panic!("accept failed: {err}"),
    }
}

/// An address nothing listens on.
pub fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Resolves `http(s)://` URIs to themselves over a direct, short-timeout
/// connector.
pub struct LocalProvider {
    connector: Arc<HttpConnector>,
}

impl LocalProvider {
    pub fn new() -> Self {
        Self {
            connector: Arc::new(HttpConnector::new(HttpConnectorConfig {
                timeout: Duration::from_secs(5),
                system_proxy: false,
                ..HttpConnectorConfig::default()
            })),
        }
    }
}

impl AcmeProvider for LocalProvider {
    fn accepts(&self, server_uri: &Url) -> bool {
        matches!(server_uri.scheme(), "http" | "https")
    }

    fn resolve(&self, server_uri: &Url) -> Result<Url, AcmeError> {
        Ok(server_uri.clone())
    }

    fn connection_factory(&self) -> Arc<dyn ConnectionFactory> {
        self.connector.clone()
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
