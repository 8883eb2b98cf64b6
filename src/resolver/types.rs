//! Port descriptor types.

/// Fixed port type for every simulated port; the documents do not carry
/// a real technology type.
pub const PORT_TYPE: &str = "ethernet";

/// Fixed default capacity; the documents do not carry real capacity.
pub const DEFAULT_BANDWIDTH: u64 = 100_000;

/// Label rendered for a port whose sub-ports never produced one.
pub const DEFAULT_LABEL: &str = "vlan:0";

/// One simulated bidirectional physical port, finished and immutable.
///
/// Each descriptor maps 1:1 to one line of the downstream port
/// configuration format (see [`PortDescriptor::config_line`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    /// Canonical identifier of the underlying bidirectional port.
    pub port_id: String,
    /// Sanitized local name, safe for configuration-file keys.
    pub port_name: String,
    /// Full URN of the owning topology.
    pub network_id: String,
    /// Short canonical label of the owning topology.
    pub network_label: String,
    /// Resolved label serialization, `dimension:value`.
    pub label: String,
    pub bandwidth: u64,
    /// Synthetic interface name, `emN`, sequential per topology.
    pub interface_name: String,
    /// Resolved remote endpoint,
    /// `<peer-network-label>#<sanitized-peer-local-id>-(in|out)`.
    pub remote: Option<String>,
}

impl PortDescriptor {
    /// Render the downstream port-configuration line:
    /// `<type> <portName> <remote-or-"-"> <label> <bandwidth> <interfaceName> -`
    pub fn config_line(&self) -> String {
        format!(
            "{} {} {} {} {} {} -",
            PORT_TYPE,
            self.port_name,
            self.remote.as_deref().unwrap_or("-"),
            self.label,
            self.bandwidth,
            self.interface_name,
        )
    }
}

/// Builder record accumulated during one resolve run. Records are private
/// to the engine and finalized into [`PortDescriptor`]s before the engine
/// returns; nothing mutates a descriptor afterwards.
#[derive(Debug)]
pub(crate) struct PortRecord {
    pub port_id: String,
    pub port_name: String,
    pub network_id: String,
    pub network_label: String,
    pub label: Option<String>,
    pub interface_name: String,
    /// Raw identifier of a peer sub-port from an inbound isAlias relation,
    /// cleared once resolved into `remote`.
    pub alias_ref: Option<String>,
    pub remote: Option<String>,
}

impl PortRecord {
    pub(crate) fn finish(self) -> PortDescriptor {
        PortDescriptor {
            port_id: self.port_id,
            port_name: self.port_name,
            network_id: self.network_id,
            network_label: self.network_label,
            label: self.label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            bandwidth: DEFAULT_BANDWIDTH,
            interface_name: self.interface_name,
            remote: self.remote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_line_renders_dash_for_missing_remote() {
        let descriptor = PortDescriptor {
            port_id: "urn:ogf:network:example.net:2013:alpha:ifce".to_string(),
            port_name: "ifce".to_string(),
            network_id: "urn:ogf:network:example.net:2013:alpha".to_string(),
            network_label: "alpha.example.net:2013".to_string(),
            label: "vlan:1-4095".to_string(),
            bandwidth: DEFAULT_BANDWIDTH,
            interface_name: "em0".to_string(),
            remote: None,
        };
        assert_eq!(
            descriptor.config_line(),
            "ethernet ifce - vlan:1-4095 100000 em0 -"
        );
    }
}
