//! NSI-DDS document store client.
//!
//! Fetches NSA and topology documents from a DDS discovery service over
//! synchronous HTTP. A 404 for a single document is an explicit,
//! non-fatal not-found; any other non-success status and all transport
//! failures are hard errors.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::nml::{self, DdsDocument, NmlError, NsaDocument, TopologyDocument};

/// DDS media type of NSA description documents.
pub const NSA_DOCUMENT_TYPE: &str = "vnd.ogf.nsi.nsa.v1+xml";
/// DDS media type of NML topology documents.
pub const TOPOLOGY_DOCUMENT_TYPE: &str = "vnd.ogf.nsi.topology.v2+xml";

/// Errors produced by the DDS client
#[derive(Debug, thiserror::Error)]
pub enum DdsError {
    #[error("DDS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("DDS returned status {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("failed to parse DDS response: {0}")]
    Document(#[from] NmlError),
}

/// A client bound to one DDS service URL.
pub struct DdsClient {
    base_url: String,
    http: Client,
}

impl DdsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// GET a DDS path. `Ok(None)` is an explicit not-found, distinct from
    /// transport failure.
    fn get(&self, path: &str) -> Result<Option<String>, DdsError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.http.get(&url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DdsError::Status {
                status: response.status(),
                url,
            });
        }
        Ok(Some(response.text()?))
    }

    /// Fetch and parse every NSA description document the DDS holds.
    /// Expired documents are skipped with a warning.
    pub fn get_nsa_documents(&self) -> Result<Vec<NsaDocument>, DdsError> {
        let path = format!("documents?type={}", encode(NSA_DOCUMENT_TYPE));
        let body = self.get(&path)?.ok_or_else(|| DdsError::Status {
            status: StatusCode::NOT_FOUND,
            url: format!("{}/{}", self.base_url, path),
        })?;

        let mut nsas = Vec::new();
        for document in nml::parse_dds_documents(&body)? {
            if is_expired(&document) {
                continue;
            }
            nsas.push(nml::parse_nsa(&document.content)?);
        }
        Ok(nsas)
    }

    /// Fetch the topology document for every network each NSA advertises.
    /// A missing (nsa, network) pair is skipped; structural parse failures
    /// propagate.
    pub fn get_topology_documents(
        &self,
        nsas: &[NsaDocument],
    ) -> Result<Vec<TopologyDocument>, DdsError> {
        let mut topologies = Vec::new();
        for nsa in nsas {
            for network_id in &nsa.network_ids {
                let path = format!(
                    "documents/{}/{}/{}",
                    encode(&nsa.id),
                    encode(TOPOLOGY_DOCUMENT_TYPE),
                    encode(network_id)
                );
                let Some(body) = self.get(&path)? else {
                    debug!(
                        "no topology document for nsa {} network {}",
                        nsa.id, network_id
                    );
                    continue;
                };
                let document = nml::parse_dds_document(&body)?;
                if is_expired(&document) {
                    continue;
                }
                topologies.push(nml::parse_topology(&document.content)?);
            }
        }
        Ok(topologies)
    }
}

/// A document with no expiry never expires; one with an unparseable
/// expiry is treated as expired and skipped.
fn is_expired(document: &DdsDocument) -> bool {
    let Some(raw) = document.expires.as_deref() else {
        return false;
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(expires) => {
            if expires.with_timezone(&Utc) <= Utc::now() {
                warn!("document {} has expired", document.id);
                true
            } else {
                false
            }
        }
        Err(_) => {
            warn!("document {} has an invalid expires date: {}", document.id, raw);
            true
        }
    }
}

/// Percent-encode a path or query segment. NSA and network identifiers
/// are URNs full of `:`; the DDS expects them encoded.
fn encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_urn_segments() {
        assert_eq!(
            encode("urn:ogf:network:example.net:2013:nsa"),
            "urn%3Aogf%3Anetwork%3Aexample.net%3A2013%3Ansa"
        );
        assert_eq!(encode("vnd.ogf.nsi.nsa.v1+xml"), "vnd.ogf.nsi.nsa.v1%2Bxml");
    }

    #[test]
    fn test_expiry_handling() {
        let fresh = DdsDocument {
            id: "a".to_string(),
            expires: Some("2099-01-01T00:00:00Z".to_string()),
            content: String::new(),
        };
        let stale = DdsDocument {
            id: "b".to_string(),
            expires: Some("2001-01-01T00:00:00Z".to_string()),
            content: String::new(),
        };
        let unstamped = DdsDocument {
            id: "c".to_string(),
            expires: None,
            content: String::new(),
        };
        let invalid = DdsDocument {
            id: "d".to_string(),
            expires: Some("not a date".to_string()),
            content: String::new(),
        };
        assert!(!is_expired(&fresh));
        assert!(is_expired(&stale));
        assert!(!is_expired(&unstamped));
        assert!(is_expired(&invalid));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = DdsClient::new("http://localhost:8401/dds/");
        assert_eq!(client.base_url, "http://localhost:8401/dds");
    }
}
