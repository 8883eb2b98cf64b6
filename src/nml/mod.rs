//! NSI document parsing.
//!
//! Turns raw DDS, NSA, and NML topology XML into the typed documents the
//! resolver and renderer consume. Structural problems (malformed XML,
//! missing document identifiers) are hard errors; field-level anomalies
//! inside an otherwise well-formed topology are logged and skipped by the
//! consumer, not here.

pub mod types;
pub mod xml;

pub use types::{
    BidirectionalPort, DdsDocument, NsaDocument, PortMember, Relation, SubPort, TopologyDocument,
};

use log::warn;

use crate::stp::SimpleLabel;
use xml::Element;

/// Relation type fragment marking topology inbound-port membership.
const REL_HAS_INBOUND_PORT: &str = "hasInboundPort";
/// Relation type fragment marking a peer sub-port alias.
const REL_IS_ALIAS: &str = "isAlias";

/// Errors produced while parsing NSI documents
#[derive(Debug, thiserror::Error)]
pub enum NmlError {
    #[error("malformed XML at offset {offset}: {message}")]
    Xml { offset: usize, message: String },

    #[error("expected a {expected} document, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    #[error("<{element}> element is missing its id")]
    MissingId { element: &'static str },

    #[error("document entry is missing its content")]
    MissingContent,

    #[error("unsupported content transfer encoding: {0}")]
    ContentEncoding(String),

    #[error("invalid base64 document content: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("document content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// The fragment after `#` in a relation/label type URI, or the whole
/// string when there is none.
fn uri_fragment(uri: &str) -> &str {
    match uri.rsplit_once('#') {
        Some((_, fragment)) => fragment,
        None => uri,
    }
}

/// Parse an NML topology document.
pub fn parse_topology(raw: &str) -> Result<TopologyDocument, NmlError> {
    let root = xml::parse(raw)?;
    if root.name != "Topology" {
        return Err(NmlError::UnexpectedRoot {
            expected: "Topology",
            found: root.name,
        });
    }
    let id = root
        .attribute("id")
        .ok_or(NmlError::MissingId { element: "Topology" })?
        .to_string();

    let mut topology = TopologyDocument {
        id,
        bidirectional_ports: Vec::new(),
        inbound_port_groups: Vec::new(),
        inbound_ports: Vec::new(),
    };

    for child in &root.children {
        match child.name.as_str() {
            "BidirectionalPort" => {
                let Some(id) = child.attribute("id") else {
                    warn!("skipping bidirectional port without an id in {}", topology.id);
                    continue;
                };
                topology.bidirectional_ports.push(BidirectionalPort {
                    id: id.to_string(),
                    members: parse_members(child),
                });
            }
            "Relation" => {
                let relation_type = child.attribute("type").unwrap_or_default();
                if uri_fragment(relation_type) != REL_HAS_INBOUND_PORT {
                    continue;
                }
                for member in &child.children {
                    match member.name.as_str() {
                        "PortGroup" => {
                            if let Some(sub) = parse_sub_port(member, &topology.id) {
                                topology.inbound_port_groups.push(sub);
                            }
                        }
                        "Port" => {
                            if let Some(sub) = parse_sub_port(member, &topology.id) {
                                topology.inbound_ports.push(sub);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    Ok(topology)
}

fn parse_members(port: &Element) -> Vec<PortMember> {
    port.children
        .iter()
        .map(|member| match (member.name.as_str(), member.attribute("id")) {
            ("PortGroup", Some(id)) => PortMember::Group(id.to_string()),
            ("Port", Some(id)) => PortMember::Port(id.to_string()),
            (name, _) => PortMember::Other(name.to_string()),
        })
        .collect()
}

fn parse_sub_port(element: &Element, topology_id: &str) -> Option<SubPort> {
    let Some(id) = element.attribute("id") else {
        warn!("skipping inbound {} without an id in {}", element.name, topology_id);
        return None;
    };

    let mut labels = Vec::new();
    let mut relations = Vec::new();
    for child in &element.children {
        match child.name.as_str() {
            "LabelGroup" | "Label" => {
                let Some(labeltype) = child.attribute("labeltype") else {
                    warn!("skipping label without a labeltype on {}", id);
                    continue;
                };
                labels.push(SimpleLabel::new(
                    uri_fragment(labeltype),
                    child.trimmed_text(),
                ));
            }
            "Relation" => {
                let Some(relation_type) = child.attribute("type") else {
                    continue;
                };
                let targets = child
                    .children
                    .iter()
                    .filter(|t| t.name == "PortGroup" || t.name == "Port")
                    .filter_map(|t| t.attribute("id").map(str::to_string))
                    .collect();
                relations.push(Relation {
                    relation_type: relation_type.to_string(),
                    targets,
                });
            }
            _ => {}
        }
    }

    Some(SubPort {
        id: id.to_string(),
        labels,
        relations,
    })
}

/// Parse an NSA description document into its identifier and advertised
/// network identifiers.
pub fn parse_nsa(raw: &str) -> Result<NsaDocument, NmlError> {
    let root = xml::parse(raw)?;
    if !root.name.eq_ignore_ascii_case("nsa") {
        return Err(NmlError::UnexpectedRoot {
            expected: "nsa",
            found: root.name,
        });
    }
    let id = root
        .attribute("id")
        .ok_or(NmlError::MissingId { element: "nsa" })?
        .to_string();
    let network_ids = root
        .children_named("networkId")
        .map(|c| c.trimmed_text().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    Ok(NsaDocument { id, network_ids })
}

/// The first `isAlias` relation's first referenced sub-port, if any.
pub fn find_alias_relation(relations: &[Relation]) -> Option<&str> {
    relations
        .iter()
        .find(|r| uri_fragment(&r.relation_type) == REL_IS_ALIAS)
        .and_then(|r| r.targets.first())
        .map(String::as_str)
}

/// Parse a DDS `<documents>` collection response.
pub fn parse_dds_documents(raw: &str) -> Result<Vec<DdsDocument>, NmlError> {
    let root = xml::parse(raw)?;
    if root.name != "documents" {
        return Err(NmlError::UnexpectedRoot {
            expected: "documents",
            found: root.name,
        });
    }
    root.children_named("document")
        .map(parse_document_element)
        .collect()
}

/// Parse a single DDS `<document>` response.
pub fn parse_dds_document(raw: &str) -> Result<DdsDocument, NmlError> {
    let root = xml::parse(raw)?;
    if root.name != "document" {
        return Err(NmlError::UnexpectedRoot {
            expected: "document",
            found: root.name,
        });
    }
    parse_document_element(&root)
}

fn parse_document_element(document: &Element) -> Result<DdsDocument, NmlError> {
    let id = document
        .attribute("id")
        .map(str::to_string)
        .or_else(|| {
            document
                .first_child("id")
                .map(|c| c.trimmed_text().to_string())
        })
        .ok_or(NmlError::MissingId { element: "document" })?;

    let expires = document
        .attribute("expires")
        .map(str::to_string)
        .or_else(|| {
            document
                .first_child("expires")
                .map(|c| c.trimmed_text().to_string())
        });

    let content = document
        .first_child("content")
        .ok_or(NmlError::MissingContent)?;
    let encoding = content
        .attribute("contentTransferEncoding")
        .unwrap_or_default();
    let decoded = decode_content(encoding, content.trimmed_text())?;

    Ok(DdsDocument {
        id,
        expires,
        content: decoded,
    })
}

/// Decode a document payload according to its content transfer encoding.
fn decode_content(encoding: &str, text: &str) -> Result<String, NmlError> {
    match encoding.to_ascii_lowercase().as_str() {
        "" | "7bit" | "8bit" => Ok(text.to_string()),
        "base64" => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::decode(compact)?;
            Ok(String::from_utf8(bytes)?)
        }
        other => Err(NmlError::ContentEncoding(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPOLOGY: &str = r#"
        <nml:Topology xmlns:nml="http://schemas.ogf.org/nml/2013/05/base#"
                      id="urn:ogf:network:example.net:2013:alpha">
          <nml:BidirectionalPort id="urn:ogf:network:example.net:2013:alpha:ifce">
            <nml:name>ifce</nml:name>
            <nml:PortGroup id="urn:ogf:network:example.net:2013:alpha:ifce:in"/>
            <nml:PortGroup id="urn:ogf:network:example.net:2013:alpha:ifce:out"/>
          </nml:BidirectionalPort>
          <nml:Relation type="http://schemas.ogf.org/nml/2013/05/base#hasInboundPort">
            <nml:PortGroup id="urn:ogf:network:example.net:2013:alpha:ifce:in">
              <nml:LabelGroup labeltype="http://schemas.ogf.org/nml/2012/10/ethernet#vlan">1-4095</nml:LabelGroup>
              <nml:Relation type="http://schemas.ogf.org/nml/2013/05/base#isAlias">
                <nml:PortGroup id="urn:ogf:network:example.net:2013:beta:ifce:out"/>
              </nml:Relation>
            </nml:PortGroup>
          </nml:Relation>
        </nml:Topology>"#;

    #[test]
    fn test_parse_topology() {
        let topology = parse_topology(TOPOLOGY).unwrap();
        assert_eq!(topology.id, "urn:ogf:network:example.net:2013:alpha");
        assert_eq!(topology.bidirectional_ports.len(), 1);
        assert_eq!(topology.bidirectional_ports[0].members.len(), 3);
        assert_eq!(topology.inbound_port_groups.len(), 1);
        assert!(topology.inbound_ports.is_empty());

        let group = &topology.inbound_port_groups[0];
        assert_eq!(group.labels[0], SimpleLabel::new("vlan", "1-4095"));
        assert_eq!(
            find_alias_relation(&group.relations),
            Some("urn:ogf:network:example.net:2013:beta:ifce:out")
        );
    }

    #[test]
    fn test_parse_topology_requires_topology_root() {
        assert!(matches!(
            parse_topology("<documents/>"),
            Err(NmlError::UnexpectedRoot { .. })
        ));
        assert!(matches!(
            parse_topology("<Topology/>"),
            Err(NmlError::MissingId { .. })
        ));
    }

    #[test]
    fn test_parse_nsa() {
        let doc = r#"
            <nsa:nsa xmlns:nsa="urn:ogf:network:nsi:2014:nsa"
                     id="urn:ogf:network:example.net:2013:nsa">
              <networkId>urn:ogf:network:example.net:2013:alpha</networkId>
              <networkId>urn:ogf:network:example.net:2013:beta</networkId>
            </nsa:nsa>"#;
        let nsa = parse_nsa(doc).unwrap();
        assert_eq!(nsa.id, "urn:ogf:network:example.net:2013:nsa");
        assert_eq!(nsa.network_ids.len(), 2);
    }

    #[test]
    fn test_parse_dds_documents_base64() {
        let payload = base64::encode("<x id=\"1\"/>");
        let doc = format!(
            r#"<documents>
                 <document>
                   <id>doc-1</id>
                   <expires>2099-01-01T00:00:00Z</expires>
                   <content contentType="application/xml"
                            contentTransferEncoding="base64">{payload}</content>
                 </document>
               </documents>"#
        );
        let documents = parse_dds_documents(&doc).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "doc-1");
        assert_eq!(documents[0].content, "<x id=\"1\"/>");
        assert_eq!(documents[0].expires.as_deref(), Some("2099-01-01T00:00:00Z"));
    }

    #[test]
    fn test_decode_content_rejects_unknown_encoding() {
        assert!(matches!(
            decode_content("quoted-printable", "x"),
            Err(NmlError::ContentEncoding(_))
        ));
        assert_eq!(decode_content("7bit", "plain").unwrap(), "plain");
    }
}
