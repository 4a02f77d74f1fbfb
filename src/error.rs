use thiserror::Error;

pub type Result<T> = std::result::Result<T, AcmeError>;

/// Faults surfaced by the provider layer.
///
/// `UnexpectedResponse` and `UnparsableResponse` are kept apart on purpose: the
/// first means the authority answered and refused, the second means it answered
/// with something we cannot read.
#[derive(Error, Debug)]
pub enum AcmeError {
    #[error("unexpected response from authority: HTTP {status}")]
    UnexpectedResponse { status: u16 },
    #[error("unparsable directory response: {0}")]
    UnparsableResponse(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unsupported server: {0}")]
    UnsupportedServer(String),
    #[error("transport unavailable: {0}")]
    Transport(String),
    #[error("invalid challenge: {0}")]
    InvalidChallenge(String),
    #[error("session has no account key; key authorization cannot be computed")]
    MissingAccountKey,
    #[error("invalid uri: {0}")]
    InvalidUri(String),
}

impl AcmeError {
    /// HTTP status carried by a protocol fault, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AcmeError::UnexpectedResponse { status } => Some(*status),
            _ => None,
        }
    }
}
