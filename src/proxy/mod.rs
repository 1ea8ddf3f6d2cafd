//! Proxy module for verifying relay candidates
//!
//! This module provides functionality for:
//! - Parsing `address,port,country,org` candidate lists
//! - Issuing secure requests directly or through a relay
//! - Verifying that a relay changes the egress IP
//! - Running bounded concurrent checks and grouping results by country

pub mod aggregate;
pub mod checker;
pub mod client;
pub mod models;
pub mod parser;

pub use aggregate::AggregateState;
pub use checker::{CheckerConfig, ProxyChecker};
pub use client::{ClientConfig, RequestClient, TlsClient};
pub use models::{Candidate, IdentityInfo, ProbeResult, Relay, VerifiedProxy};
pub use parser::CandidateParser;
