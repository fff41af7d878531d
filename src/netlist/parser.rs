/* Copyright (C) 2022 Antmicro
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::Value;

use super::*;
#[allow(unused)]
use crate::log::*;

#[derive(Deserialize)]
struct RawDesign {
    modules: Option<BTreeMap<String, RawModule>>,
}

#[derive(Deserialize)]
struct RawModule {
    netnames: Option<BTreeMap<String, RawNet>>,
    cells: Option<BTreeMap<String, RawCell>>,
}

#[derive(Deserialize)]
struct RawNet {
    #[serde(default)]
    bits: Vec<Value>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct RawCell {
    #[serde(rename = "type")]
    cell_type: String,
    port_directions: Option<BTreeMap<String, String>>,
    connections: Option<BTreeMap<String, Vec<Value>>>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
    #[serde(default)]
    parameters: BTreeMap<String, Value>,
}

fn parse_port_dir(s: &str) -> Option<PinDir> {
    match s {
        "input" => Some(PinDir::Input),
        "output" => Some(PinDir::Output),
        "inout" => Some(PinDir::Inout),
        _ => None,
    }
}

fn attr_to_string(context: &str, name: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::malformed(
            context,
            format!("attribute {} has unsupported value {}", name, other)
        )),
    }
}

fn convert_attrs(context: &str, raw: BTreeMap<String, Value>)
    -> Result<BTreeMap<String, String>>
{
    raw.into_iter()
        .map(|(name, value)| {
            let value = attr_to_string(context, &name, value)?;
            Ok((name, value))
        })
        .collect()
}

/* Connections refer to nets through the first element of their bit list */
fn bit_index(bits: &[Value]) -> Option<i64> {
    bits.first().and_then(Value::as_i64)
}

fn take_top_module(design: RawDesign) -> Result<(String, RawModule)> {
    let modules = design.modules
        .ok_or_else(|| Error::malformed("netlist", "no `modules` table"))?;
    if modules.len() > 1 {
        return Err(Error::malformed(
            "netlist",
            format!("expected a single top module, found {}", modules.len())
        ));
    }
    modules.into_iter()
        .next()
        .ok_or_else(|| Error::malformed("netlist", "no top module"))
}

fn build_netlist(design: RawDesign) -> Result<Netlist> {
    let (top_name, top) = take_top_module(design)?;
    let top_ctx = format!("module {}", top_name);
    let netnames = top.netnames
        .ok_or_else(|| Error::malformed(&top_ctx, "no `netnames` table"))?;
    let cells = top.cells
        .ok_or_else(|| Error::malformed(&top_ctx, "no `cells` table"))?;

    let mut netlist = Netlist::new();

    for (name, raw) in netnames {
        let context = format!("net {}", name);
        let index = bit_index(&raw.bits)
            .ok_or_else(|| Error::malformed(&context, "missing integer bit index"))?;
        let attrs = convert_attrs(&context, raw.attributes)?;
        netlist.add_net(index, name, attrs)?;
    }

    for (name, raw) in cells {
        let context = format!("cell {}", name);

        let port_directions = raw.port_directions
            .ok_or_else(|| Error::malformed(&context, "no `port_directions` table"))?;
        let connections = raw.connections
            .ok_or_else(|| Error::malformed(&context, "no `connections` table"))?;

        let mut ports = BTreeMap::new();
        for (port, dir) in port_directions {
            let dir = parse_port_dir(&dir)
                .ok_or_else(|| Error::malformed(&context, format!(
                    "bad direction `{}` for port {}", dir, port
                )))?;
            ports.insert(port.clone(), LogicalPort { name: port, dir, net: None });
        }

        let mut params = BTreeMap::new();
        for (param, value) in raw.parameters {
            let value = decode_param(&value)
                .map_err(|reason| Error::malformed(
                    format!("cell {} parameter {}", name, param),
                    reason
                ))?;
            params.insert(param, value);
        }

        let cell = LogicalCell {
            name: name.clone(),
            cell_type: raw.cell_type,
            ports,
            attrs: convert_attrs(&context, raw.attributes)?,
            params,
            phys: None,
        };
        let cell_id = netlist.add_cell(cell)?;

        for (port, bits) in connections {
            /* An empty bit list leaves the port unconnected */
            if bits.is_empty() {
                continue;
            }
            let port_ctx = format!("cell {} port {}", name, port);
            let index = bit_index(&bits)
                .ok_or_else(|| Error::malformed(&port_ctx, "connection is not a net index"))?;
            let net = netlist.net_by_index(index)
                .ok_or_else(|| Error::malformed(&port_ctx, format!("unknown net index {}", index)))?;
            netlist.connect(cell_id, &port, net)?;
        }
    }

    dbg_log!(
        DBG_INFO,
        "Parsed module {}: {} nets, {} cells",
        top_name, netlist.net_count(), netlist.cell_count()
    );

    Ok(netlist)
}

/// Parses a nextpnr JSON netlist.
pub fn parse_str(src: &str) -> Result<Netlist> {
    let design: RawDesign = serde_json::from_str(src)
        .map_err(|e| Error::malformed("netlist", e.to_string()))?;
    build_netlist(design)
}

/// Reads a netlist file, gunzipping it first when it ends with `.gz`.
pub fn open<P>(path: P) -> Result<Netlist> where
    P: AsRef<Path>
{
    let path = path.as_ref();
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };

    let file = File::open(path).map_err(io_err)?;
    let mut src = String::new();
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        GzDecoder::new(BufReader::new(file)).read_to_string(&mut src).map_err(io_err)?;
    } else {
        BufReader::new(file).read_to_string(&mut src).map_err(io_err)?;
    }

    parse_str(&src)
}
