use super::*;
use crate::connector::connect_nets;
use crate::device::tests::test_device;
use crate::mapper::map_cells;
use crate::netlist::parse_str;
use crate::phys::{SiteSegment, GND_NET_NAME};

fn route(netnames: &str, cells: &str, opts: &ConvertOpts) -> Result<(PhysDesign, RouteStats)> {
    let src = format!(
        r#"{{ "modules": {{ "top": {{ "netnames": {{ {} }}, "cells": {{ {} }} }} }} }}"#,
        netnames, cells
    );
    let mut netlist = parse_str(&src)?;
    let dev = test_device();
    let mut design = PhysDesign::new("top", dev.name());
    map_cells(&mut netlist, &mut design, &dev, &dev, opts)?;
    connect_nets(&mut netlist, &mut design, &dev)?;
    let stats = route_nets(&netlist, &mut design, &dev, opts)?;
    Ok((design, stats))
}

fn net_with_routing(routing: &str) -> String {
    format!(r#""n": {{ "bits": [2], "attributes": {{ "ROUTING": "{}" }} }}"#, routing)
}

fn segment(net: &str, from: (&str, &str), to: (&str, &str)) -> SiteSegment {
    SiteSegment {
        net: net.into(),
        from: BelPinRef::new(from.0, from.1),
        to: BelPinRef::new(to.0, to.1),
    }
}

#[test]
fn test_routing_entries() {
    let entries = routing_entries("w0;p0;1;w1;;1;");
    assert_eq!(entries, vec![
        RoutingEntry { wire: "w0", pip: "p0" },
        RoutingEntry { wire: "w1", pip: "" },
    ]);
    assert!(routing_entries("").is_empty());
    assert_eq!(routing_entries("w0;p0").len(), 1);
}

#[test]
fn test_parse_tokens() {
    assert_eq!(parse_pip("").unwrap(), None);
    assert_eq!(
        parse_pip("INT_X0Y0/12.7").unwrap(),
        Some(PipToken::Tile { tile: "INT_X0Y0", src: 12, dst: 7 })
    );
    assert_eq!(
        parse_pip("SITEPIP/SLICE_X0Y0/FFMUXA1/A_O6").unwrap(),
        Some(PipToken::Site { site: "SLICE_X0Y0", bel: "FFMUXA1", input_wire: "A_O6" })
    );
    assert!(parse_pip("INT_X0Y0/12").is_err());
    assert!(parse_pip("INT_X0Y0/a.b").is_err());
    assert!(parse_pip("SITEPIP/SLICE_X0Y0").is_err());

    assert_eq!(parse_site_wire("SITEWIRE/SLICE_X0Y0/AQ").unwrap(), Some(("SLICE_X0Y0", "AQ")));
    assert_eq!(parse_site_wire("INT_X0Y0/WIRE").unwrap(), None);
    assert!(parse_site_wire("SITEWIRE/SLICE_X0Y0").is_err());
}

#[test]
fn test_out_of_range_pip_skipped() {
    let nets = net_with_routing("w;INT_X0Y0/0.1;1;w;INT_X0Y0/9.1;1;w;INT_X0Y0/1.2;1;");
    let (design, stats) = route(&nets, "", &ConvertOpts::default()).unwrap();

    let pips = &design.net(design.net_by_name("n").unwrap()).pips;
    assert_eq!(pips.len(), 2);
    assert!(pips.contains(&Pip { tile: "INT_X0Y0".into(), src: 0, dst: 1 }));
    assert!(pips.contains(&Pip { tile: "INT_X0Y0".into(), src: 1, dst: 2 }));
    assert_eq!(stats.skipped_pips, 1);
}

#[test]
fn test_out_of_range_pip_strict() {
    let nets = net_with_routing("w;INT_X0Y0/0.1;1;w;INT_X0Y0/9.1;1;");
    let opts = ConvertOpts { pip_range_policy: MismatchPolicy::Fail, ..Default::default() };
    assert!(matches!(route(&nets, "", &opts), Err(Error::DeviceModelMismatch { .. })));
}

#[test]
fn test_bad_pips_are_fatal() {
    let opts = ConvertOpts::default();

    let nets = net_with_routing("w;INT_X0Y0/1.0;1;");
    assert!(matches!(route(&nets, "", &opts), Err(Error::DeviceModelMismatch { .. })));

    let nets = net_with_routing("w;INT_X9Y9/0.1;1;");
    assert!(matches!(route(&nets, "", &opts), Err(Error::DeviceModelMismatch { .. })));

    let nets = net_with_routing("w;INT_X0Y0/0;1;");
    assert!(matches!(route(&nets, "", &opts), Err(Error::MalformedInput { .. })));

    let nets = net_with_routing("SITEWIRE/SLICE_X9Y9/AQ;;1;");
    assert!(matches!(route(&nets, "", &opts), Err(Error::DeviceModelMismatch { .. })));

    let nets = net_with_routing("w;SITEPIP/SLICE_X0Y0/BFFMUX/A_O6;1;");
    assert!(matches!(route(&nets, "", &opts), Err(Error::DeviceModelMismatch { .. })));
}

#[test]
fn test_missing_routing_attribute() {
    let (design, stats) = route(r#""n": { "bits": [2] }"#, "", &ConvertOpts::default()).unwrap();
    assert!(design.net(design.net_by_name("n").unwrap()).pips.is_empty());
    assert_eq!(stats, RouteStats::default());
}

const LUT_TO_FF: &str = r#"
    "lut": {
      "type": "SLICE_LUTX",
      "port_directions": { "O6": "output" },
      "connections": { "O6": [2] },
      "attributes": {
        "X_ORIG_TYPE": "LUT1",
        "NEXTPNR_BEL": "SLICE_X0Y0/A6LUT",
        "X_ORIG_PORT_O6": "O"
      },
      "parameters": {}
    },
    "ff": {
      "type": "SLICE_FF",
      "port_directions": { "D": "input" },
      "connections": { "D": [2] },
      "attributes": {
        "X_ORIG_TYPE": "FDRE",
        "NEXTPNR_BEL": "SLICE_X0Y0/AFF",
        "X_ORIG_PORT_D": "D"
      },
      "parameters": {}
    }"#;

#[test]
fn test_site_pip_and_wire_fan_out() {
    let nets = net_with_routing(
        "SITEWIRE/SLICE_X0Y0/A_O6;SITEPIP/SLICE_X0Y0/FFMUXA1/A_O6;1;"
    );
    let (design, _) = route(&nets, LUT_TO_FF, &ConvertOpts::default()).unwrap();
    let si = design.site_inst("SLICE_X0Y0").unwrap();

    assert!(si.site_pips.contains(&SitePipRef {
        bel: "FFMUXA1".into(),
        input: "D6".into(),
        output: "OUT".into(),
    }));
    assert_eq!(si.site_pips.len(), 1);

    /* Through the site PIP into the flip-flop */
    assert!(si.segments.contains(&segment("n", ("A6LUT", "O6"), ("AFF", "D"))));
    /* Every input on the LUT output wire */
    for sink in [("CARRY8", "S0"), ("FFMUXA1", "D6"), ("A_O", "A_O")] {
        assert!(si.segments.contains(&segment("n", ("A6LUT", "O6"), sink)));
    }
    assert_eq!(si.wire_net("AFF_D"), Some("n"));
}

fn clock_cells(inverted: &str) -> String {
    format!(r#"
        "ff": {{
          "type": "SLICE_FF",
          "port_directions": {{ "CK": "input" }},
          "connections": {{ "CK": [2] }},
          "attributes": {{
            "X_ORIG_TYPE": "FDRE",
            "NEXTPNR_BEL": "SLICE_X0Y0/AFF",
            "X_ORIG_PORT_CK": "C"
          }},
          "parameters": {{ "IS_C_INVERTED": "{}" }}
        }}"#, inverted)
}

const CLOCK_ROUTING: &str = "SITEWIRE/SLICE_X0Y0/CLK_IN;SITEPIP/SLICE_X0Y0/CLKINV/CLK_IN;1;";

#[test]
fn test_inverted_wire_blocks_site_pip() {
    let nets = net_with_routing(CLOCK_ROUTING);
    let (design, _) = route(&nets, &clock_cells("1"), &ConvertOpts::default()).unwrap();
    let si = design.site_inst("SLICE_X0Y0").unwrap();

    assert!(si.site_pips.is_empty());
    assert!(si.segments.is_empty());
}

#[test]
fn test_clock_site_pips() {
    let nets = net_with_routing(CLOCK_ROUTING);
    let (design, _) = route(&nets, &clock_cells("0"), &ConvertOpts::default()).unwrap();
    let si = design.site_inst("SLICE_X0Y0").unwrap();

    /* Both inverter inputs sit on CLK_IN */
    assert_eq!(si.site_pips.len(), 2);
    /* The site port sources the site PIP, but a plain site wire token
     * never starts at a site port */
    assert_eq!(si.segments.len(), 1);
    assert!(si.segments.contains(&segment("n", ("CLK", "CLK"), ("AFF", "CK"))));
}

#[test]
fn test_inverted_wires_collected() {
    let src = format!(
        r#"{{ "modules": {{ "top": {{ "netnames": {{ "n": {{ "bits": [2] }} }}, "cells": {{ {} }} }} }} }}"#,
        clock_cells("1")
    );
    let mut netlist = parse_str(&src).unwrap();
    let dev = test_device();
    let mut design = PhysDesign::new("top", dev.name());
    map_cells(&mut netlist, &mut design, &dev, &dev, &ConvertOpts::default()).unwrap();

    let net = netlist.net(netlist.net_by_name("n").unwrap());
    let inverted = inverted_wires(&netlist, &design, &dev, net);
    assert_eq!(inverted.len(), 1);
    assert!(inverted.contains(&("SLICE_X0Y0".to_string(), "CLK".to_string())));
}

#[test]
fn test_ground_net_skips_site_routing() {
    let nets = r#""$PACKER_GND_NET": { "bits": [2], "attributes": {
        "ROUTING": "w;INT_X0Y0/0.1;1;SITEWIRE/SLICE_X0Y0/A_O6;SITEPIP/SLICE_X0Y0/FFMUXA1/A_O6;1;"
    } }"#;
    let (design, stats) = route(nets, LUT_TO_FF, &ConvertOpts::default()).unwrap();

    let gnd = design.net(design.net_by_name(GND_NET_NAME).unwrap());
    assert_eq!(gnd.pips.len(), 1);
    assert_eq!(stats.site_pips, 0);
    assert_eq!(stats.segments, 0);
    assert!(design.site_inst("SLICE_X0Y0").unwrap().site_pips.is_empty());
}
