use super::*;
use crate::device::tests::test_device;
use crate::mapper::map_cells;
use crate::netlist::parse_str;
use crate::phys::{PortInst, GND_NET_NAME, VCC_NET_NAME};
use crate::ConvertOpts;

fn design_for(netnames: &str, cells: &str) -> Result<(Netlist, PhysDesign)> {
    let src = format!(
        r#"{{ "modules": {{ "top": {{ "netnames": {{ {} }}, "cells": {{ {} }} }} }} }}"#,
        netnames, cells
    );
    let mut netlist = parse_str(&src)?;
    let dev = test_device();
    let mut design = PhysDesign::new("top", dev.name());
    map_cells(&mut netlist, &mut design, &dev, &dev, &ConvertOpts::default())?;
    connect_nets(&mut netlist, &mut design, &dev)?;
    Ok((netlist, design))
}

fn port_insts<'a>(design: &'a PhysDesign, net: &str) -> &'a [PortInst] {
    let pnet = design.net(design.net_by_name(net).unwrap());
    &design.logical_net(pnet.logical).port_insts
}

fn has_site_pin(design: &PhysDesign, net: &str, site: &str, pin: &str, is_output: bool) -> bool {
    let pnet = design.net(design.net_by_name(net).unwrap());
    pnet.pins.contains(&SitePinInst { site: site.into(), pin: pin.into(), is_output })
}

const LUT_NETS: &str = r#"
    "a": { "bits": [2] },
    "y": { "bits": [3] },
    "$PACKER_VCC_NET": { "bits": [4] },
    "$PACKER_GND_NET": { "bits": [5] }
"#;

const LUT_CELL: &str = r#"
    "lut": {
      "type": "SLICE_LUTX",
      "port_directions": { "A1": "input", "A2": "input", "A6": "input", "O6": "output" },
      "connections": { "A1": [2], "A2": [5], "A6": [4], "O6": [3] },
      "attributes": {
        "X_ORIG_TYPE": "LUT2",
        "NEXTPNR_BEL": "SLICE_X0Y0/A6LUT",
        "X_ORIG_PORT_A1": "I0",
        "X_ORIG_PORT_A2": "I1",
        "X_ORIG_PORT_O6": "O"
      },
      "parameters": { "INIT": "10" }
    }"#;

#[test]
fn test_static_nets_bound() {
    let (netlist, design) = design_for(LUT_NETS, LUT_CELL).unwrap();

    let gnd = netlist.net(netlist.net_by_name("$PACKER_GND_NET").unwrap());
    let vcc = netlist.net(netlist.net_by_name("$PACKER_VCC_NET").unwrap());
    assert_eq!(gnd.phys, Some(design.static_net(StaticNet::Gnd)));
    assert_eq!(vcc.phys, Some(design.static_net(StaticNet::Vcc)));
    assert_eq!(design.nets().count(), 4);
    assert!(design.net_by_name("$PACKER_GND_NET").is_none());

    /* I1 of the LUT is driven by the logical ground net */
    assert_eq!(port_insts(&design, GND_NET_NAME), &[PortInst {
        cell: "lut".into(),
        port: "I1".into(),
        index: None,
        dir: PinDir::Input,
    }]);
}

#[test]
fn test_lut_pins() {
    let (_, design) = design_for(LUT_NETS, LUT_CELL).unwrap();

    assert!(has_site_pin(&design, "a", "SLICE_X0Y0", "A1", false));
    assert!(has_site_pin(&design, "y", "SLICE_X0Y0", "A_O", true));
    assert_eq!(port_insts(&design, "y")[0].port, "O");

    let si = design.site_inst("SLICE_X0Y0").unwrap();
    assert_eq!(si.wire_net("A1"), Some("a"));
    assert_eq!(si.wire_net("A_O6"), Some("y"));
}

#[test]
fn test_tie_pin_is_physical_only() {
    let (_, design) = design_for(LUT_NETS, LUT_CELL).unwrap();

    /* A6 has no logical pin, only the site pin is added */
    assert!(has_site_pin(&design, VCC_NET_NAME, "SLICE_X0Y0", "A6", false));
    assert!(port_insts(&design, VCC_NET_NAME).is_empty());
}

#[test]
fn test_bus_pin_position() {
    let cells = r#"
        "carry": {
          "type": "SLICE_CARRY",
          "port_directions": { "DI0": "input", "O0": "output" },
          "connections": { "DI0": [2], "O0": [3] },
          "attributes": {
            "X_ORIG_TYPE": "CARRY8",
            "NEXTPNR_BEL": "SLICE_X0Y0/CARRY8",
            "X_ORIG_PORT_DI0": "DI[0]",
            "X_ORIG_PORT_O0": "O[2]"
          },
          "parameters": {}
        }"#;
    let (_, design) = design_for(r#""a": { "bits": [2] }, "y": { "bits": [3] }"#, cells).unwrap();

    assert_eq!(port_insts(&design, "a"), &[PortInst {
        cell: "carry".into(),
        port: "DI".into(),
        index: Some(7),
        dir: PinDir::Input,
    }]);
    assert!(has_site_pin(&design, "a", "SLICE_X0Y0", "AX", false));

    /* O0 leaves the site nowhere, so the bus member is only logical */
    let out = &port_insts(&design, "y")[0];
    assert_eq!((out.port.as_str(), out.index), ("O", Some(5)));
    assert!(design.net(design.net_by_name("y").unwrap()).pins.is_empty());
}

#[test]
fn test_bus_pin_out_of_range() {
    let cells = r#"
        "carry": {
          "type": "SLICE_CARRY",
          "port_directions": { "DI0": "input" },
          "connections": { "DI0": [2] },
          "attributes": {
            "X_ORIG_TYPE": "CARRY8",
            "NEXTPNR_BEL": "SLICE_X0Y0/CARRY8",
            "X_ORIG_PORT_DI0": "DI[8]"
          },
          "parameters": {}
        }"#;
    let res = design_for(r#""a": { "bits": [2] }"#, cells);
    assert!(matches!(res, Err(Error::UnknownPrimitivePort { .. })));
}

#[test]
fn test_pin_without_site_pin_is_logical_only() {
    let cells = r#"
        "ff": {
          "type": "SLICE_FF",
          "port_directions": { "CK": "input", "Q": "output" },
          "connections": { "CK": [2], "Q": [3] },
          "attributes": {
            "X_ORIG_TYPE": "FDRE",
            "NEXTPNR_BEL": "SLICE_X0Y0/AFF",
            "X_ORIG_PORT_CK": "C",
            "X_ORIG_PORT_Q": "Q"
          },
          "parameters": {}
        }"#;
    let (_, design) = design_for(r#""clk": { "bits": [2] }, "q": { "bits": [3] }"#, cells).unwrap();

    assert_eq!(port_insts(&design, "clk")[0].port, "C");
    assert!(design.net(design.net_by_name("clk").unwrap()).pins.is_empty());
    assert!(has_site_pin(&design, "q", "SLICE_X0Y0", "AQ", true));
}

#[test]
fn test_driver_without_logical_pin() {
    let cells = r#"
        "ff": {
          "type": "SLICE_FF",
          "port_directions": { "Q": "output" },
          "connections": { "Q": [2] },
          "attributes": { "X_ORIG_TYPE": "FDRE", "NEXTPNR_BEL": "SLICE_X0Y0/AFF" },
          "parameters": {}
        },
        "lut": {
          "type": "SLICE_LUTX",
          "port_directions": { "A1": "input" },
          "connections": { "A1": [2] },
          "attributes": {
            "X_ORIG_TYPE": "LUT1",
            "NEXTPNR_BEL": "SLICE_X1Y0/A6LUT",
            "X_ORIG_PORT_A1": "I0"
          },
          "parameters": {}
        }"#;
    let (_, design) = design_for(r#""a": { "bits": [2] }"#, cells).unwrap();

    /* The driver is skipped, its users are still connected */
    let insts = port_insts(&design, "a");
    assert_eq!(insts.len(), 1);
    assert_eq!(insts[0].cell, "lut");
    assert!(has_site_pin(&design, "a", "SLICE_X1Y0", "A1", false));
}

#[test]
fn test_input_buffer_connect() {
    let cells = r#"
        "ibuf": {
          "type": "IOB_INBUF",
          "port_directions": { "PAD": "input", "O": "output" },
          "connections": { "PAD": [2], "O": [3] },
          "attributes": {
            "X_ORIG_TYPE": "INBUF",
            "NEXTPNR_BEL": "IOB_X0Y0/INBUF",
            "X_ORIG_PORT_PAD": "PAD",
            "X_ORIG_PORT_O": "O"
          },
          "parameters": {}
        }"#;
    let (_, design) = design_for(r#""pad": { "bits": [2] }, "o": { "bits": [3] }"#, cells).unwrap();

    assert!(has_site_pin(&design, "o", "IOB_X0Y0", "I", true));
    assert_eq!(port_insts(&design, "pad")[0].port, "PAD");
    assert_eq!(design.site_inst("IOB_X0Y0").unwrap().wire_net("INBUF_O"), Some("o"));
}

#[test]
fn test_escaped_name_collision() {
    let res = design_for(r#""a/b": { "bits": [2] }, "a_b": { "bits": [3] }"#, "");
    assert!(matches!(res, Err(Error::InconsistentNetlist { .. })));

    let (_, design) = design_for(r#""top\\inst/q": { "bits": [2] }"#, "").unwrap();
    assert!(design.net_by_name("top__inst_q").is_some());
}
