//! Candidate parser for `address,port,country,org` lists

use crate::error::ParseError;
use crate::proxy::models::Candidate;
use crate::Result;
use std::fs;
use std::path::Path;

/// One parsed record, or the reason it was rejected
pub type Record = std::result::Result<Candidate, ParseError>;

/// Parser for candidate relay lists
pub struct CandidateParser;

impl CandidateParser {
    /// Parse a single record
    ///
    /// Returns `None` for blank lines and `#` comments. `line_no` is 1-based
    /// and only used for error messages.
    pub fn parse_line(line: &str, line_no: usize) -> Option<Record> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut fields = line.splitn(4, ',').map(str::trim);

        let address = match fields.next() {
            Some(address) if !address.is_empty() => address.to_string(),
            _ => {
                return Some(Err(ParseError::MissingField {
                    line: line_no,
                    field: "address",
                }))
            }
        };

        let port = match fields.next() {
            Some(raw) if !raw.is_empty() => match raw.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    return Some(Err(ParseError::InvalidPort {
                        line: line_no,
                        value: raw.to_string(),
                    }))
                }
            },
            _ => {
                return Some(Err(ParseError::MissingField {
                    line: line_no,
                    field: "port",
                }))
            }
        };

        let country = fields.next().unwrap_or_default().to_string();
        let org = fields.next().unwrap_or_default().to_string();

        Some(Ok(Candidate::new(address, port, country, org)))
    }

    /// Parse every non-blank record of a string, keeping per-record errors
    pub fn parse_string(content: &str) -> Vec<Record> {
        content
            .split('\n')
            .enumerate()
            .filter_map(|(idx, line)| Self::parse_line(line, idx + 1))
            .collect()
    }

    /// Parse candidates from a file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse_string(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let candidate = CandidateParser::parse_line("1.2.3.4,8443,US,ExampleOrg", 1)
            .unwrap()
            .unwrap();
        assert_eq!(candidate.address, "1.2.3.4");
        assert_eq!(candidate.port, 8443);
        assert_eq!(candidate.country, "US");
        assert_eq!(candidate.org, "ExampleOrg");
    }

    #[test]
    fn test_parse_org_with_commas() {
        let candidate = CandidateParser::parse_line("5.6.7.8,443,DE,Hosting, Inc.", 1)
            .unwrap()
            .unwrap();
        assert_eq!(candidate.org, "Hosting, Inc.");
    }

    #[test]
    fn test_parse_without_metadata() {
        let candidate = CandidateParser::parse_line("5.6.7.8,443", 1).unwrap().unwrap();
        assert_eq!(candidate.port, 443);
        assert!(candidate.country.is_empty());
        assert!(candidate.org.is_empty());
    }

    #[test]
    fn test_parse_crlf_line() {
        let candidate = CandidateParser::parse_line("5.6.7.8,443,DE,OtherOrg\r", 1)
            .unwrap()
            .unwrap();
        assert_eq!(candidate.org, "OtherOrg");
    }

    #[test]
    fn test_parse_empty_and_comment_lines() {
        assert!(CandidateParser::parse_line("", 1).is_none());
        assert!(CandidateParser::parse_line("   ", 1).is_none());
        assert!(CandidateParser::parse_line("# relays", 1).is_none());
    }

    #[test]
    fn test_parse_invalid_port() {
        assert_eq!(
            CandidateParser::parse_line("1.2.3.4,abc,US,Org", 3).unwrap(),
            Err(ParseError::InvalidPort {
                line: 3,
                value: "abc".to_string()
            })
        );
        assert!(matches!(
            CandidateParser::parse_line("1.2.3.4,0,US,Org", 1).unwrap(),
            Err(ParseError::InvalidPort { .. })
        ));
        assert!(matches!(
            CandidateParser::parse_line("1.2.3.4,70000,US,Org", 1).unwrap(),
            Err(ParseError::InvalidPort { .. })
        ));
    }

    #[test]
    fn test_parse_missing_port() {
        assert_eq!(
            CandidateParser::parse_line("1.2.3.4", 2).unwrap(),
            Err(ParseError::MissingField {
                line: 2,
                field: "port"
            })
        );
        assert_eq!(
            CandidateParser::parse_line(",443,US,Org", 2).unwrap(),
            Err(ParseError::MissingField {
                line: 2,
                field: "address"
            })
        );
    }

    #[test]
    fn test_parse_string_tolerates_trailing_newline() {
        let content = "1.2.3.4,8443,US,ExampleOrg\n5.6.7.8,443,DE,OtherOrg\n";
        let records = CandidateParser::parse_string(content);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_parse_string_keeps_bad_records_as_errors() {
        let content = "1.2.3.4,8443,US,ExampleOrg\nbad,port,XX,Org\n\n5.6.7.8,443,DE,OtherOrg";
        let records = CandidateParser::parse_string(content);
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[1],
            Err(ParseError::InvalidPort {
                line: 2,
                value: "port".to_string()
            })
        );
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rawProxyList.txt");
        fs::write(&path, "1.2.3.4,8443,US,ExampleOrg\n").unwrap();

        let records = CandidateParser::parse_file(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert!(CandidateParser::parse_file(dir.path().join("missing.txt")).is_err());
    }
}
