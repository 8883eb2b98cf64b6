#[cfg(test)]
mod resolver_tests {
    use nsisim::nml::{parse_topology, TopologyDocument};
    use nsisim::resolver::resolve;

    /// Two independently-authored topologies whose port groups declare
    /// isAlias references at each other, VLAN 1-4095 on both sides.
    fn alpha() -> TopologyDocument {
        parse_topology(
            r#"<nml:Topology xmlns:nml="http://schemas.ogf.org/nml/2013/05/base#"
                  id="urn:ogf:network:example.net:2013:alpha">
                 <nml:BidirectionalPort id="urn:ogf:network:example.net:2013:alpha:to-beta">
                   <nml:PortGroup id="urn:ogf:network:example.net:2013:alpha:to-beta:in"/>
                   <nml:PortGroup id="urn:ogf:network:example.net:2013:alpha:to-beta:out"/>
                 </nml:BidirectionalPort>
                 <nml:Relation type="http://schemas.ogf.org/nml/2013/05/base#hasInboundPort">
                   <nml:PortGroup id="urn:ogf:network:example.net:2013:alpha:to-beta:in">
                     <nml:LabelGroup labeltype="http://schemas.ogf.org/nml/2012/10/ethernet#vlan">1-4095</nml:LabelGroup>
                     <nml:Relation type="http://schemas.ogf.org/nml/2013/05/base#isAlias">
                       <nml:PortGroup id="urn:ogf:network:example.net:2013:beta:to-alpha:out"/>
                     </nml:Relation>
                   </nml:PortGroup>
                 </nml:Relation>
               </nml:Topology>"#,
        )
        .unwrap()
    }

    fn beta() -> TopologyDocument {
        parse_topology(
            r#"<nml:Topology xmlns:nml="http://schemas.ogf.org/nml/2013/05/base#"
                  id="urn:ogf:network:example.net:2013:beta">
                 <nml:BidirectionalPort id="urn:ogf:network:example.net:2013:beta:to-alpha">
                   <nml:PortGroup id="urn:ogf:network:example.net:2013:beta:to-alpha:in"/>
                   <nml:PortGroup id="urn:ogf:network:example.net:2013:beta:to-alpha:out"/>
                 </nml:BidirectionalPort>
                 <nml:Relation type="http://schemas.ogf.org/nml/2013/05/base#hasInboundPort">
                   <nml:PortGroup id="urn:ogf:network:example.net:2013:beta:to-alpha:in">
                     <nml:LabelGroup labeltype="http://schemas.ogf.org/nml/2012/10/ethernet#vlan">1-4095</nml:LabelGroup>
                     <nml:Relation type="http://schemas.ogf.org/nml/2013/05/base#isAlias">
                       <nml:PortGroup id="urn:ogf:network:example.net:2013:alpha:to-beta:out"/>
                     </nml:Relation>
                   </nml:PortGroup>
                 </nml:Relation>
               </nml:Topology>"#,
        )
        .unwrap()
    }

    fn empty() -> TopologyDocument {
        parse_topology(
            r#"<nml:Topology xmlns:nml="http://schemas.ogf.org/nml/2013/05/base#"
                  id="urn:ogf:network:example.net:2013:empty">
               </nml:Topology>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_cross_topology_alias_resolution() {
        let descriptors = resolve(&[alpha(), beta()]);
        assert_eq!(descriptors.len(), 2);

        let from_alpha = &descriptors[0];
        let from_beta = &descriptors[1];

        assert_eq!(from_alpha.network_label, "alpha.example.net:2013");
        assert_eq!(from_alpha.label, "vlan:1-4095");
        assert_eq!(
            from_alpha.remote.as_deref(),
            Some("beta.example.net:2013#to-alpha-(in|out)")
        );

        assert_eq!(from_beta.network_label, "beta.example.net:2013");
        assert_eq!(from_beta.label, "vlan:1-4095");
        assert_eq!(
            from_beta.remote.as_deref(),
            Some("alpha.example.net:2013#to-beta-(in|out)")
        );
    }

    #[test]
    fn test_alias_resolution_is_order_independent() {
        let forward = resolve(&[alpha(), beta()]);
        let reverse = resolve(&[beta(), alpha()]);

        let remote_of = |descriptors: &[nsisim::resolver::PortDescriptor], name: &str| {
            descriptors
                .iter()
                .find(|d| d.port_name == name)
                .and_then(|d| d.remote.clone())
        };

        assert_eq!(
            remote_of(&forward, "to-beta"),
            remote_of(&reverse, "to-beta")
        );
        assert_eq!(
            remote_of(&forward, "to-alpha"),
            remote_of(&reverse, "to-alpha")
        );
    }

    #[test]
    fn test_empty_topology_contributes_nothing() {
        let descriptors = resolve(&[empty(), alpha(), beta()]);
        assert_eq!(descriptors.len(), 2);

        // Alias resolution still works across the non-empty ones.
        assert!(descriptors.iter().all(|d| d.remote.is_some()));
    }

    #[test]
    fn test_heuristic_recovery_matches_direct_format() {
        // Resolve alpha alone: the alias target's topology is absent, so
        // the resolver falls back to suffix stripping. The recovered
        // remote has the same shape a direct match would produce.
        let descriptors = resolve(&[alpha()]);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(
            descriptors[0].remote.as_deref(),
            Some("beta.example.net:2013#to-alpha-(in|out)")
        );
    }

    #[test]
    fn test_config_lines_render_end_to_end() {
        let descriptors = resolve(&[alpha(), beta()]);
        let lines: Vec<String> = descriptors.iter().map(|d| d.config_line()).collect();
        assert_eq!(
            lines[0],
            "ethernet to-beta beta.example.net:2013#to-alpha-(in|out) vlan:1-4095 100000 em0 -"
        );
        assert_eq!(
            lines[1],
            "ethernet to-alpha alpha.example.net:2013#to-beta-(in|out) vlan:1-4095 100000 em0 -"
        );
    }
}
