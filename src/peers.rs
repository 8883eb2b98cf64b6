//! Hand-authored peers overlay.
//!
//! An optional `peers.yaml` file lets an operator append extra port lines
//! to the generated port configuration of specific networks, for links the
//! discovered topology documents do not describe.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use serde::{Deserialize, Serialize};

/// Extra ports for one network, keyed by its full URN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    #[serde(rename = "networkId")]
    pub network_id: String,
    #[serde(default)]
    pub port: Vec<PortLine>,
}

/// One hand-authored port line. Omitted fields fall back to the defaults
/// the downstream services accept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortLine {
    #[serde(rename = "type", default)]
    pub port_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub bandwidth: Option<String>,
    #[serde(rename = "_interface", default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub attributes: Option<String>,
}

impl PortLine {
    /// Render the seven-column port-configuration line, filling defaults
    /// for omitted fields.
    pub fn config_line(&self) -> String {
        format!(
            "{} {} {} {} {} {} {}",
            self.port_type.as_deref().unwrap_or("ethernet"),
            self.name.as_deref().unwrap_or("undefined"),
            self.remote.as_deref().unwrap_or("-"),
            self.label.as_deref().unwrap_or("vlan:0-4095"),
            self.bandwidth.as_deref().unwrap_or("10000"),
            self.interface.as_deref().unwrap_or("my0"),
            self.attributes.as_deref().unwrap_or("-"),
        )
    }
}

/// Load a peers overlay file, keyed by network identifier. Duplicate
/// network entries keep the first occurrence.
pub fn load_peers<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Peer>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("could not read peers file '{}'", path.display()))?;
    let peers: Vec<Peer> = serde_yaml::from_str(&text)
        .wrap_err_with(|| format!("could not parse peers file '{}'", path.display()))?;

    let mut map = HashMap::new();
    for peer in peers {
        map.entry(peer.network_id.clone()).or_insert(peer);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PEERS_YAML: &str = r#"
- networkId: "urn:ogf:network:netherlight7.surfnet.nl:1990:topology"
  port:
    - type: ethernet
      name: to_production7
      remote: "production7.surfnet.nl:1990:topology#to_netherlight7-(in|out)"
      label: "vlan:1-4095"
      bandwidth: "100000"
      _interface: fk0
      attributes: "-"
- networkId: "urn:ogf:network:production7.surfnet.nl:1990:topology"
  port:
    - type: ethernet
      name: to_netherlight7
      remote: "netherlight7.surfnet.nl:1990:topology#to_production7-(in|out)"
      label: "vlan:1-4095"
      bandwidth: "100000"
      _interface: fk0
      attributes: "-"
"#;

    #[test]
    fn test_load_peers() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PEERS_YAML.as_bytes()).unwrap();

        let peers = load_peers(file.path()).unwrap();
        assert_eq!(peers.len(), 2);

        let peer = &peers["urn:ogf:network:netherlight7.surfnet.nl:1990:topology"];
        assert_eq!(peer.port.len(), 1);
        assert_eq!(peer.port[0].name.as_deref(), Some("to_production7"));
        assert_eq!(
            peer.port[0].config_line(),
            "ethernet to_production7 production7.surfnet.nl:1990:topology#to_netherlight7-(in|out) vlan:1-4095 100000 fk0 -"
        );
    }

    #[test]
    fn test_duplicate_network_keeps_first() {
        let yaml = r#"
- networkId: "urn:ogf:network:a.net:2013:x"
  port:
    - name: first
- networkId: "urn:ogf:network:a.net:2013:x"
  port:
    - name: second
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let peers = load_peers(file.path()).unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(
            peers["urn:ogf:network:a.net:2013:x"].port[0].name.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_port_line_defaults() {
        let line = PortLine::default().config_line();
        assert_eq!(line, "ethernet undefined - vlan:0-4095 10000 my0 -");
    }
}
