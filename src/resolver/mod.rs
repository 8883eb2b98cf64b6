//! Topology resolution engine.
//!
//! Turns a batch of parsed topology documents into a flat set of simulated
//! physical-port descriptors. Resolution is strictly two-phase: every
//! topology is extracted first, building a reverse index from each
//! unidirectional sub-port identifier to its owning record, and only then
//! are alias references resolved — a peer reference may point into a
//! topology that appears later in the batch, so no streaming resolution is
//! possible.
//!
//! Field-level anomalies (a malformed port identifier, an orphaned
//! sub-port, an unresolvable alias) are logged and skipped; they never
//! abort a run.

pub mod types;

pub use types::PortDescriptor;

use std::collections::HashMap;
use std::sync::OnceLock;

use log::{error, warn};
use regex::Regex;

use crate::nml::{find_alias_relation, PortMember, SubPort, TopologyDocument};
use crate::stp::{sanitize_local_id, LabelSet, SimpleLabel, Stp, VLAN_LABEL_TYPE};

use types::PortRecord;

/// Reverse index from every sub-port identifier seen across all
/// topologies to the owning record's slot in the record list. Scoped to
/// one resolve call.
type ReverseIndex = HashMap<String, usize>;

/// Resolve a batch of topology documents into port descriptors.
///
/// Descriptors are returned in creation order (input order of the
/// topologies, document order of the ports within each). Pure function of
/// its input; the record list and reverse index live and die inside the
/// call.
pub fn resolve(topologies: &[TopologyDocument]) -> Vec<PortDescriptor> {
    let mut records: Vec<PortRecord> = Vec::new();
    let mut index: ReverseIndex = HashMap::new();

    // Phase one: extract every topology before any alias is resolved.
    for topology in topologies {
        extract_topology(topology, &mut records, &mut index);
    }

    // Phase two: the index is complete, resolve peer references.
    resolve_aliases(&mut records, &index);

    records.into_iter().map(PortRecord::finish).collect()
}

/// Walk one topology: create a record per bidirectional port, register
/// its member sub-ports in the reverse index, then fold inbound port
/// groups and inbound ports into the owning records.
fn extract_topology(
    topology: &TopologyDocument,
    records: &mut Vec<PortRecord>,
    index: &mut ReverseIndex,
) {
    if topology.bidirectional_ports.is_empty() {
        warn!("topology {} has no bidirectional ports", topology.id);
    }

    let mut interface = 0;
    for port in &topology.bidirectional_ports {
        let stp = match Stp::parse(&port.id) {
            Ok(stp) => stp,
            Err(e) => {
                error!("skipping bidirectional port {}: {}", port.id, e);
                continue;
            }
        };
        let network_label = match stp.network_label() {
            Ok(label) => label,
            Err(e) => {
                error!("skipping bidirectional port {}: {}", port.id, e);
                continue;
            }
        };

        records.push(PortRecord {
            port_id: stp.id(),
            port_name: sanitize_local_id(stp.local_id()),
            network_id: stp.network_id().to_string(),
            network_label,
            label: None,
            interface_name: format!("em{}", interface),
            alias_ref: None,
            remote: None,
        });
        interface += 1;

        let slot = records.len() - 1;
        for member in &port.members {
            match member {
                PortMember::Group(id) | PortMember::Port(id) => {
                    index.insert(id.clone(), slot);
                }
                PortMember::Other(_) => {}
            }
        }
    }

    for group in &topology.inbound_port_groups {
        apply_sub_port(group, records, index);
    }
    for port in &topology.inbound_ports {
        apply_sub_port(port, records, index);
    }
}

/// Fold one inbound sub-port into its owning record: resolve the
/// effective label and pick up any isAlias reference. Later sub-ports of
/// the same bidirectional port may overwrite the label; the serialized
/// forms are equivalent, so the overwrite is idempotent in effect.
fn apply_sub_port(sub: &SubPort, records: &mut [PortRecord], index: &ReverseIndex) {
    let stp = match Stp::from_sub_port(&sub.id, &sub.labels) {
        Ok(stp) => stp,
        Err(e) => {
            error!("skipping sub-port {}: {}", sub.id, e);
            return;
        }
    };

    let Some(&slot) = index.get(&stp.id()) else {
        error!("no bidirectional port owns sub-port {}", stp.id());
        return;
    };
    let record = &mut records[slot];

    // A missing label, or a vlan label with an empty value, is unusable
    // downstream; substitute vlan 0.
    let labels = match stp.labels().first() {
        None => LabelSet::single(SimpleLabel::new(VLAN_LABEL_TYPE, "0")),
        Some(first) if first.dimension == VLAN_LABEL_TYPE && first.value.is_empty() => {
            LabelSet::single(SimpleLabel::new(VLAN_LABEL_TYPE, "0"))
        }
        Some(_) => stp.labels().clone(),
    };

    match labels.serialize() {
        Ok(text) if !text.is_empty() => record.label = Some(text.replace('=', ":")),
        Ok(_) => {}
        Err(e) => error!("failed to serialize labels for {}: {}", stp.id(), e),
    }

    if let Some(alias) = find_alias_relation(&sub.relations) {
        record.alias_ref = Some(alias.to_string());
    }
}

fn in_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[:-]in$").expect("static regex"))
}

fn out_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[:-]out$").expect("static regex"))
}

/// Strip a trailing `:in` / `-in`, then `:out` / `-out`, direction marker.
/// Sequential on purpose: this matches the original suffix rule, which is
/// a documented heuristic, not a grammar.
fn strip_direction_suffix(alias: &str) -> String {
    let stripped = in_suffix().replace(alias, "");
    out_suffix().replace(&stripped, "").into_owned()
}

/// Resolve every recorded alias reference into a remote endpoint string.
/// Runs once, after the reverse index is complete. Best effort: a direct
/// index hit uses the matched record's own identifier components; a miss
/// falls back to reparsing the reference with its direction suffix
/// stripped. Failures leave `remote` unset and are never fatal.
fn resolve_aliases(records: &mut [PortRecord], index: &ReverseIndex) {
    let mut resolved: Vec<(usize, String)> = Vec::new();

    for (slot, record) in records.iter().enumerate() {
        let Some(alias) = record.alias_ref.as_deref() else {
            continue;
        };

        if let Some(&peer_slot) = index.get(alias) {
            let peer = &records[peer_slot];
            resolved.push((slot, remote_endpoint(&peer.network_label, &peer.port_name)));
            continue;
        }

        // Heuristic recovery: the reference often names a unidirectional
        // sub-port of the peer rather than a registered identifier.
        warn!("no bidirectional port matches alias {}, trying suffix recovery", alias);
        let stripped = strip_direction_suffix(alias);
        match Stp::parse(&stripped) {
            Ok(stp) => match stp.network_label() {
                Ok(label) => {
                    let remote = remote_endpoint(&label, &sanitize_local_id(stp.local_id()));
                    warn!("recovered remote {} for alias {}", remote, alias);
                    resolved.push((slot, remote));
                }
                Err(e) => error!("unresolvable alias {}: {}", alias, e),
            },
            Err(e) => error!("unresolvable alias {}: {}", alias, e),
        }
    }

    for (slot, remote) in resolved {
        records[slot].remote = Some(remote);
        records[slot].alias_ref = None;
    }
}

/// The remote endpoint format. The literal `-(in|out)` suffix means
/// "either direction": the simulated side does not distinguish them, so
/// the direction is intentionally left unresolved.
fn remote_endpoint(network_label: &str, port_name: &str) -> String {
    format!("{}#{}-(in|out)", network_label, port_name)
}
