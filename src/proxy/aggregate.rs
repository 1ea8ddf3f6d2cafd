//! Folding of probe results into the flat list and the per-country mapping

use crate::proxy::models::ProbeResult;
use crate::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default number of relays kept per country in the mapping
pub const DEFAULT_COUNTRY_CAP: usize = 10;

/// Aggregated verification results
///
/// Only mutated by the coordinating task; units never touch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateState {
    /// `address,port,country,org` per working relay, in arrival order
    pub flat_list: Vec<String>,
    /// Country code to at most `cap` `address:port` entries
    pub by_country: BTreeMap<String, Vec<String>>,
    /// Number of failed verifications folded so far
    pub failed: usize,
    cap: usize,
}

impl Default for AggregateState {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY_CAP)
    }
}

impl AggregateState {
    pub fn new(cap: usize) -> Self {
        Self {
            flat_list: Vec::new(),
            by_country: BTreeMap::new(),
            failed: 0,
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Fold one result into the state
    pub fn fold(&mut self, result: ProbeResult) {
        let verified = match result {
            ProbeResult::Success(verified) => verified,
            ProbeResult::Failure { .. } => {
                self.failed += 1;
                return;
            }
        };

        self.flat_list.push(verified.to_record());

        let entries = self.by_country.entry(verified.country.clone()).or_default();
        if entries.len() < self.cap {
            entries.push(verified.to_simple_string());
        }
    }

    /// Number of working relays
    pub fn working(&self) -> usize {
        self.flat_list.len()
    }

    /// Write the country mapping as pretty-printed JSON
    pub fn save_country_map<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.by_country)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Write the flat list, one record per line
    pub fn save_proxy_list<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.flat_list.join("\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::{Candidate, IdentityInfo, VerifiedProxy, PROXY_TEST_FAILED};

    fn success(address: &str, port: u16, country: &str) -> ProbeResult {
        let candidate = Candidate::new(address.to_string(), port, "XX".to_string(), String::new());
        ProbeResult::Success(VerifiedProxy::new(
            &candidate,
            IdentityInfo {
                ip: address.to_string(),
                country: country.to_string(),
                as_organization: "Org".to_string(),
            },
        ))
    }

    #[test]
    fn test_fold_failure_is_noop_for_lists() {
        let mut state = AggregateState::default();
        state.fold(ProbeResult::failed(PROXY_TEST_FAILED));
        assert!(state.flat_list.is_empty());
        assert!(state.by_country.is_empty());
        assert_eq!(state.failed, 1);
    }

    #[test]
    fn test_fold_success_keys_by_probed_country() {
        let mut state = AggregateState::default();
        state.fold(success("1.2.3.4", 8443, "US"));

        assert_eq!(state.flat_list, vec!["1.2.3.4,8443,US,Org".to_string()]);
        assert_eq!(state.by_country["US"], vec!["1.2.3.4:8443".to_string()]);
        assert!(!state.by_country.contains_key("XX"));
    }

    #[test]
    fn test_country_cap() {
        let mut state = AggregateState::default();
        for i in 0..15 {
            state.fold(success(&format!("10.0.0.{}", i), 443, "US"));
        }
        state.fold(success("10.0.1.1", 443, "DE"));

        assert_eq!(state.working(), 16);
        assert_eq!(state.by_country["US"].len(), 10);
        assert_eq!(state.by_country["US"][0], "10.0.0.0:443");
        assert_eq!(state.by_country["US"][9], "10.0.0.9:443");
        assert_eq!(state.by_country["DE"].len(), 1);
    }

    #[test]
    fn test_custom_cap() {
        let mut state = AggregateState::new(2);
        for i in 0..5 {
            state.fold(success(&format!("10.0.0.{}", i), 443, "SG"));
        }
        assert_eq!(state.cap(), 2);
        assert_eq!(state.by_country["SG"].len(), 2);
        assert_eq!(state.flat_list.len(), 5);
    }

    #[test]
    fn test_save_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let map_path = dir.path().join("kvProxyList.json");
        let list_path = dir.path().join("proxyList.txt");

        let mut state = AggregateState::default();
        state.fold(success("1.2.3.4", 8443, "US"));
        state.fold(success("5.6.7.8", 443, "DE"));
        state.save_country_map(&map_path).unwrap();
        state.save_proxy_list(&list_path).unwrap();

        let map: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&fs::read_to_string(&map_path).unwrap()).unwrap();
        assert_eq!(map, state.by_country);
        assert!(fs::read_to_string(&map_path).unwrap().contains("\n  \"DE\": ["));
        assert_eq!(
            fs::read_to_string(&list_path).unwrap(),
            "1.2.3.4,8443,US,Org\n5.6.7.8,443,DE,Org"
        );
    }

    #[test]
    fn test_save_empty_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let map_path = dir.path().join("kvProxyList.json");
        let list_path = dir.path().join("proxyList.txt");

        let state = AggregateState::default();
        state.save_country_map(&map_path).unwrap();
        state.save_proxy_list(&list_path).unwrap();

        assert_eq!(fs::read_to_string(&map_path).unwrap(), "{}");
        assert_eq!(fs::read_to_string(&list_path).unwrap(), "");
    }
}
