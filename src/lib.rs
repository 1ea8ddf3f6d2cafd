//! ProxyIP Checker - Relay verifier
//!
//! Probes each candidate relay against a reference endpoint, keeps the ones
//! whose egress IP differs from the caller's own, and groups them by country.

pub mod error;
pub mod proxy;

pub use error::{ParseError, RequestError};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Default candidate list path
pub const DEFAULT_INPUT_PATH: &str = "./rawProxyList.txt";

/// Default country mapping output path
pub const DEFAULT_COUNTRY_MAP_PATH: &str = "./kvProxyList.json";

/// Default flat list output path
pub const DEFAULT_PROXY_LIST_PATH: &str = "./proxyList.txt";
