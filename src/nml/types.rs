//! Document type definitions.
//!
//! In-memory shapes for the three document kinds the generator consumes:
//! the DDS document envelope, NSA description documents, and NML network
//! topology documents.

use crate::stp::SimpleLabel;

/// One entry from a DDS document collection: metadata plus the decoded
/// payload document text.
#[derive(Debug, Clone)]
pub struct DdsDocument {
    pub id: String,
    /// Raw RFC 3339 expiry stamp, if the document carries one.
    pub expires: Option<String>,
    pub content: String,
}

/// An NSA description document: the participant identifier and the
/// network topologies it advertises.
#[derive(Debug, Clone)]
pub struct NsaDocument {
    pub id: String,
    pub network_ids: Vec<String>,
}

/// A relation declared on a sub-port, e.g. `isAlias` pointing at a peer
/// sub-port in another topology.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Full relation type URI; matched by its `#` fragment.
    pub relation_type: String,
    /// Identifiers of the port/port-group elements the relation references.
    pub targets: Vec<String>,
}

/// A unidirectional sub-port or sub-port-group.
#[derive(Debug, Clone)]
pub struct SubPort {
    pub id: String,
    pub labels: Vec<SimpleLabel>,
    pub relations: Vec<Relation>,
}

/// A member element of a bidirectional port. Anything that is not a
/// sub-port or sub-port-group reference is carried as `Other` and ignored
/// downstream.
#[derive(Debug, Clone)]
pub enum PortMember {
    Group(String),
    Port(String),
    Other(String),
}

/// A bidirectional port and its member sub-port references, in document
/// order.
#[derive(Debug, Clone)]
pub struct BidirectionalPort {
    pub id: String,
    pub members: Vec<PortMember>,
}

/// A parsed NML topology document.
#[derive(Debug, Clone)]
pub struct TopologyDocument {
    pub id: String,
    pub bidirectional_ports: Vec<BidirectionalPort>,
    pub inbound_port_groups: Vec<SubPort>,
    pub inbound_ports: Vec<SubPort>,
}
