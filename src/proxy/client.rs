//! Secure request client
//!
//! Opens a TLS session to a host, optionally using a relay as the TCP
//! endpoint, and performs one `GET` with `Connection: close`. The TLS server
//! name is always the target host, never the relay.

use crate::error::RequestError;
use crate::proxy::models::Relay;
use async_trait::async_trait;
use native_tls::TlsConnector as NativeTlsConnector;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_native_tls::TlsConnector;
use tracing::trace;

/// Standard secure port used when no relay is given
pub const DEFAULT_SECURE_PORT: u16 = 443;

/// Default per-request deadline in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default user agent for probe requests
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// One-shot request transport used by the checker
#[async_trait]
pub trait RequestClient: Send + Sync + 'static {
    /// Fetch `path` from `host` and return the response body
    async fn send(
        &self,
        host: &str,
        path: &str,
        via: Option<&Relay>,
    ) -> Result<String, RequestError>;
}

/// Configuration for [`TlsClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub port: u16,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            port: DEFAULT_SECURE_PORT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

/// TLS request client over tokio TCP streams
#[derive(Clone)]
pub struct TlsClient {
    config: ClientConfig,
    connector: TlsConnector,
}

impl TlsClient {
    pub fn new() -> Result<Self, RequestError> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, RequestError> {
        let connector = NativeTlsConnector::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            config,
            connector: TlsConnector::from(connector),
        })
    }

    async fn exchange(
        &self,
        host: &str,
        path: &str,
        via: Option<&Relay>,
    ) -> Result<String, RequestError> {
        let stream = match via {
            Some(relay) => TcpStream::connect((relay.host.as_str(), relay.port)).await,
            None => TcpStream::connect((host, self.config.port)).await,
        }
        .map_err(RequestError::Connect)?;

        let mut tls = self.connector.connect(host, stream).await?;
        trace!(host, ?via, "session established");

        let request = build_request(host, path, &self.config.user_agent);
        tls.write_all(request.as_bytes()).await?;

        let mut response = Vec::new();
        let mut buffer = [0u8; 8192];
        loop {
            match tls.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => response.extend_from_slice(&buffer[..n]),
                // Peers that close without close_notify still delivered the response
                Err(e) if e.kind() == ErrorKind::UnexpectedEof && !response.is_empty() => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(extract_body(&response))
    }
}

#[async_trait]
impl RequestClient for TlsClient {
    async fn send(
        &self,
        host: &str,
        path: &str,
        via: Option<&Relay>,
    ) -> Result<String, RequestError> {
        // Dropping the exchange on timeout closes the session
        let exchange = self.exchange(host, path, via);
        match tokio::time::timeout(self.config.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(RequestError::Timeout(self.config.timeout)),
        }
    }
}

/// Build the minimal HTTP/1.1 request for one exchange
pub fn build_request(host: &str, path: &str, user_agent: &str) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: {}\r\nConnection: close\r\n\r\n",
        path, host, user_agent
    )
}

/// Everything after the first blank line, or an empty string
pub fn extract_body(response: &[u8]) -> String {
    let response = String::from_utf8_lossy(response);
    response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default()
}
