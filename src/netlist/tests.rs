use serde_json::json;

use super::*;

fn bits(s: &str) -> String {
    decode_param(&json!(s)).unwrap().to_string()
}

#[test]
fn test_binary_params() {
    assert_eq!(bits("10"), "2'h2");
    assert_eq!(bits("1x1"), "3'h5");
    assert_eq!(bits("00000000"), "8'h0");
    assert_eq!(bits("1111000011"), "10'h3c3");
}

#[test]
fn test_integer_params() {
    let int = |v: i64| decode_param(&json!(v)).unwrap().to_string();
    assert_eq!(int(0), "1'h0");
    assert_eq!(int(1), "1'h1");
    assert_eq!(int(5), "3'h5");
    assert_eq!(int(-1), "32'hffffffff");
    assert!(decode_param(&json!(-5_000_000_000i64)).is_err());
}

#[test]
fn test_other_params() {
    assert_eq!(decode_param(&json!("TRUE")).unwrap(), ParamValue::Str("TRUE".into()));
    assert_eq!(decode_param(&json!("")).unwrap(), ParamValue::Str("".into()));
    assert!(decode_param(&json!(1.5)).is_err());
    assert!(decode_param(&json!([1, 2])).is_err());
}

#[test]
fn test_resize() {
    let bv = BitVector::from_binary("10");
    assert_eq!(bv.resized(4).unwrap().to_string(), "4'h2");
    assert_eq!(bv.resized(64).unwrap().to_string(), "64'h0000000000000002");
    assert_eq!(bv.resized(2).unwrap().to_string(), "2'h2");
    assert!(bv.resized(1).is_none());
    assert!(BitVector::from_binary("11111").resized(4).is_none());
    assert!(BitVector::from_binary("1").lsb());
    assert!(!BitVector::from_binary("10").lsb());
}

const SIMPLE: &str = r#"{
  "modules": {
    "top": {
      "netnames": {
        "a": { "bits": [2], "attributes": { "ROUTING": "" } },
        "y": { "bits": [3], "attributes": {} }
      },
      "cells": {
        "lut": {
          "type": "SLICE_LUTX",
          "port_directions": { "A1": "input", "A2": "input", "O6": "output" },
          "connections": { "A1": [2], "A2": [], "O6": [3] },
          "attributes": { "X_ORIG_TYPE": "LUT1", "NEXTPNR_BEL": "SLICE_X0Y0/A6LUT" },
          "parameters": { "INIT": "10" }
        }
      }
    }
  }
}"#;

#[test]
fn test_parse_simple() {
    let netlist = parse_str(SIMPLE).unwrap();
    assert_eq!(netlist.net_count(), 2);
    assert_eq!(netlist.cell_count(), 1);

    let lut = netlist.cell(netlist.cell_by_name("lut").unwrap());
    assert_eq!(lut.orig_type(), Some("LUT1"));
    assert_eq!(lut.params["INIT"].to_string(), "2'h2");
    assert_eq!(lut.ports["A2"].net, None);

    let y = netlist.net(netlist.net_by_name("y").unwrap());
    let driver = y.driver.as_ref().unwrap();
    assert_eq!(driver.port, "O6");

    let a = netlist.net(netlist.net_by_index(2).unwrap());
    assert_eq!(a.name, "a");
    assert!(a.driver.is_none());
    assert_eq!(a.users.len(), 1);
}

#[test]
fn test_missing_tables() {
    assert!(matches!(parse_str("{}"), Err(Error::MalformedInput { .. })));
    assert!(matches!(
        parse_str(r#"{ "modules": { "top": { "cells": {} } } }"#),
        Err(Error::MalformedInput { .. })
    ));
    assert!(matches!(
        parse_str(r#"{ "modules": { "top": { "netnames": {}, "cells": {
            "c": { "type": "X", "connections": {} }
        } } } }"#),
        Err(Error::MalformedInput { .. })
    ));
    assert!(matches!(parse_str("not json"), Err(Error::MalformedInput { .. })));
}

#[test]
fn test_unknown_net_index() {
    let src = SIMPLE.replace(r#""O6": [3]"#, r#""O6": [42]"#);
    assert!(matches!(parse_str(&src), Err(Error::MalformedInput { .. })));
}

#[test]
fn test_two_drivers() {
    let src = r#"{ "modules": { "top": {
      "netnames": { "y": { "bits": [3] } },
      "cells": {
        "a": { "type": "T", "port_directions": { "O": "output" }, "connections": { "O": [3] } },
        "b": { "type": "T", "port_directions": { "O": "output" }, "connections": { "O": [3] } }
      }
    } } }"#;
    assert!(matches!(parse_str(src), Err(Error::InconsistentNetlist { .. })));
}

#[test]
fn test_orig_ports_split() {
    let mut attrs = BTreeMap::new();
    attrs.insert("X_ORIG_PORT_A1".to_string(), "I0 I1".to_string());
    let cell = LogicalCell {
        name: "c".into(),
        cell_type: "SLICE_LUTX".into(),
        ports: BTreeMap::new(),
        attrs,
        params: BTreeMap::new(),
        phys: None,
    };
    let names: Vec<_> = cell.orig_ports("A1").unwrap().collect();
    assert_eq!(names, vec!["I0", "I1"]);
    assert!(cell.orig_ports("A2").is_none());
}
