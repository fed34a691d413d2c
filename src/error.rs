//! Error types shared by the parsing, network and storage layers.
//!
//! Every operation catches these at its own boundary and turns them into a
//! status line for the UI; none of them is meant to reach `main`.

use thiserror::Error;

/// Input rejected before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidJson(String),
    #[error("Invalid header line: '{0}'")]
    InvalidHeaderLine(String),
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Missing host in URL.")]
    MissingHost,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Network level failure. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Connection closed")]
    Closed,
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
            WsError::Tls(inner) => TransportError::Tls(inner.to_string()),
            WsError::Io(inner) if inner.kind() == std::io::ErrorKind::TimedOut => {
                TransportError::Timeout
            }
            WsError::Io(inner) => TransportError::Connect(inner.to_string()),
            other => TransportError::Request(other.to_string()),
        }
    }
}

/// Failure reading or writing the state document.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Anything a request or session operation can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, Error>;
