//! Error types for the request client and the candidate reader

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single secure request
#[derive(Debug, Error)]
pub enum RequestError {
    /// TCP connect to the target (or relay) failed
    #[error("{0}")]
    Connect(#[source] io::Error),

    /// TLS handshake failed
    #[error("{0}")]
    Tls(#[from] native_tls::Error),

    /// Read or write on an established session failed
    #[error("{0}")]
    Io(#[from] io::Error),

    /// No completion within the configured deadline
    #[error("Request timeout")]
    Timeout(Duration),
}

impl RequestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout(_))
    }
}

/// A candidate record that could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: missing {field} field")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: invalid port {value:?}")]
    InvalidPort { line: usize, value: String },
}
