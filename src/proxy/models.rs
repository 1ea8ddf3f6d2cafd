//! Proxy data models

use serde::{de, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Generic failure message for a relay that did not pass verification
pub const PROXY_TEST_FAILED: &str = "Proxy test failed";

/// A relay endpoint used as transport for a secure request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    pub host: String,
    pub port: u16,
}

impl Relay {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Candidate relay as read from the input list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub address: String,
    pub port: u16,
    /// Declared country, informational only
    pub country: String,
    /// Declared organization, informational only
    pub org: String,
}

impl Candidate {
    pub fn new(address: String, port: u16, country: String, org: String) -> Self {
        Self {
            address,
            port,
            country,
            org,
        }
    }

    pub fn relay(&self) -> Relay {
        Relay::new(self.address.clone(), self.port)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Identity reported by the reference endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentityInfo {
    pub ip: String,
    pub country: String,
    #[serde(rename = "asOrganization")]
    pub as_organization: String,
}

impl IdentityInfo {
    /// Parse a response body, which must be a JSON object
    pub fn from_body(body: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<Value>(body)? {
            value @ Value::Object(_) => Self::deserialize(value),
            _ => Err(de::Error::custom("identity body is not a JSON object")),
        }
    }
}

/// A relay that egresses through its own IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedProxy {
    pub proxy: String,
    pub port: u16,
    pub proxyip: bool,
    pub country: String,
    #[serde(rename = "asOrganization")]
    pub as_organization: String,
}

impl VerifiedProxy {
    pub fn new(candidate: &Candidate, identity: IdentityInfo) -> Self {
        Self {
            proxy: candidate.address.clone(),
            port: candidate.port,
            proxyip: true,
            country: identity.country,
            as_organization: identity.as_organization,
        }
    }

    /// `address,port,country,org` record of the flat list
    pub fn to_record(&self) -> String {
        format!(
            "{},{},{},{}",
            self.proxy, self.port, self.country, self.as_organization
        )
    }

    /// `address:port` entry of the country mapping
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.proxy, self.port)
    }
}

/// Outcome of verifying one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProbeResult {
    Success(VerifiedProxy),
    Failure { error: bool, message: String },
}

impl ProbeResult {
    pub fn failed(message: impl Into<String>) -> Self {
        ProbeResult::Failure {
            error: true,
            message: message.into(),
        }
    }

    pub fn is_working(&self) -> bool {
        matches!(self, ProbeResult::Success(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ProbeResult::Success(_) => None,
            ProbeResult::Failure { message, .. } => Some(message),
        }
    }
}
