//! STP identifier handling.
//!
//! NSI identifies networks and ports with hierarchical URNs
//! (`urn:ogf:network:<domain>:<year>:<topology>:<local-id>?<labels>`).
//! This module parses those URNs, canonicalizes network identifiers into
//! the short form the generated configuration files require, and sanitizes
//! local identifiers so they are safe in file-based configuration keys.

use std::sync::OnceLock;

use regex::Regex;

/// Well-known prefix shared by every NSI network URN.
pub const NSI_NETWORK_URN_PREFIX: &str = "urn:ogf:network:";

/// The VLAN label dimension used by Ethernet technology labels.
pub const VLAN_LABEL_TYPE: &str = "vlan";

/// Errors produced while parsing or canonicalizing STP identifiers
#[derive(Debug, Clone, thiserror::Error)]
pub enum StpError {
    #[error("identifier does not carry the urn:ogf:network: prefix: {0}")]
    Prefix(String),

    #[error("identifier has too few segments for an STP: {0}")]
    Format(String),

    #[error("label has an empty dimension")]
    EmptyDimension,
}

/// A single (dimension, value) technology label, e.g. `vlan` / `1-4095`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleLabel {
    pub dimension: String,
    pub value: String,
}

impl SimpleLabel {
    pub fn new(dimension: &str, value: &str) -> Self {
        Self {
            dimension: dimension.to_string(),
            value: value.to_string(),
        }
    }
}

/// An ordered label set. A dimension normally appears once per port;
/// duplicates collapse by full (dimension, value) equality, not by
/// dimension alone. Insertion order is preserved so serialization is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<SimpleLabel>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set holding exactly one label.
    pub fn single(label: SimpleLabel) -> Self {
        Self {
            labels: vec![label],
        }
    }

    pub fn insert(&mut self, label: SimpleLabel) {
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
    }

    pub fn first(&self) -> Option<&SimpleLabel> {
        self.labels.first()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Render the set as `dimension=value` pairs joined by `,`.
    pub fn serialize(&self) -> Result<String, StpError> {
        let mut parts = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            if label.dimension.is_empty() {
                return Err(StpError::EmptyDimension);
            }
            parts.push(format!("{}={}", label.dimension, label.value));
        }
        Ok(parts.join(","))
    }
}

impl FromIterator<SimpleLabel> for LabelSet {
    fn from_iter<T: IntoIterator<Item = SimpleLabel>>(iter: T) -> Self {
        let mut set = LabelSet::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

/// A decomposed Service Termination Point identifier.
///
/// `network_id` keeps the full URN form of the owning network,
/// `local_id` the remaining colon-joined segments, and `labels` any
/// technology labels from the URN query or an external label source.
#[derive(Debug, Clone)]
pub struct Stp {
    network_id: String,
    local_id: String,
    labels: LabelSet,
}

impl Stp {
    /// Parse a full STP URN, including an optional `?dim=value[&dim=value]`
    /// label query.
    pub fn parse(raw: &str) -> Result<Self, StpError> {
        let (id_part, query) = match raw.split_once('?') {
            Some((id, q)) => (id, Some(q)),
            None => (raw, None),
        };

        let rest = id_part
            .strip_prefix(NSI_NETWORK_URN_PREFIX)
            .ok_or_else(|| StpError::Prefix(raw.to_string()))?;

        // <domain>:<year>:<topology>:<local...>, the local part may itself
        // contain colons.
        let segments: Vec<&str> = rest.split(':').collect();
        if segments.len() < 4 || segments[3].is_empty() {
            return Err(StpError::Format(raw.to_string()));
        }

        let network_id = format!(
            "{}{}:{}:{}",
            NSI_NETWORK_URN_PREFIX, segments[0], segments[1], segments[2]
        );
        let local_id = segments[3..].join(":");

        let mut labels = LabelSet::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (dimension, value) = pair.split_once('=').unwrap_or((pair, ""));
                labels.insert(SimpleLabel::new(dimension, value));
            }
        }

        Ok(Self {
            network_id,
            local_id,
            labels,
        })
    }

    /// Parse a sub-port identifier and attach externally supplied labels
    /// (from a topology document's label elements). Labels from the URN
    /// query are kept only when the document carries none.
    pub fn from_sub_port(raw: &str, labels: &[SimpleLabel]) -> Result<Self, StpError> {
        let mut stp = Self::parse(raw)?;
        if !labels.is_empty() {
            stp.labels = labels.iter().cloned().collect();
        }
        Ok(stp)
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// The label-free identifier, used as the reverse-index key.
    pub fn id(&self) -> String {
        format!("{}:{}", self.network_id, self.local_id)
    }

    /// Short configuration-safe form of the owning network identifier.
    pub fn network_label(&self) -> Result<String, StpError> {
        canonicalize_network_urn(&self.network_id)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

/// Replace every `:` and `#` in a local identifier with `_` so it is safe
/// for use in configuration-file keys. Idempotent.
pub fn sanitize_local_id(raw: &str) -> String {
    raw.replace(':', "_").replace('#', "_")
}

fn topology_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":topology$").expect("static regex"))
}

/// Rewrite a network URN into its short configuration form.
///
/// The well-known prefix is stripped and a bare trailing `topology` marker
/// segment dropped. Otherwise the final segment is moved to the front,
/// joined with `.`, because the generated configuration files allow only a
/// single `:`-delimited hierarchy level and want the most specific
/// qualifier first:
///
/// `urn:ogf:network:surfnet.nl:1990:netherlight7` -> `netherlight7.surfnet.nl:1990`
pub fn canonicalize_network_urn(urn: &str) -> Result<String, StpError> {
    let rest = urn
        .strip_prefix(NSI_NETWORK_URN_PREFIX)
        .ok_or_else(|| StpError::Prefix(urn.to_string()))?;

    let result = topology_suffix().replace(rest, ":");
    if let Some(stripped) = result.strip_suffix(':') {
        return Ok(stripped.to_string());
    }

    match result.rfind(':') {
        Some(point) => Ok(format!("{}.{}", &result[point + 1..], &result[..point])),
        None => Ok(result.into_owned()),
    }
}
