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

/* Logical netlist as written by nextpnr. Nets and cells live in arenas and are
 * never removed, so handles stay valid for the whole conversion. */

use std::collections::{BTreeMap, HashMap};

use crate::common::*;
use crate::device::PinDir;
use crate::error::{Error, Result};
use crate::phys::{PhysCellId, PhysNetId};

pub mod param;
pub mod parser;
#[cfg(test)]
mod tests;

pub use self::param::{decode_param, BitVector, ParamValue};
pub use self::parser::{open, parse_str};

define_id!(NetId);
define_id!(CellId);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub cell: CellId,
    pub port: String,
}

#[derive(Clone, Debug)]
pub struct LogicalPort {
    pub name: String,
    pub dir: PinDir,
    pub net: Option<NetId>,
}

#[derive(Clone, Debug)]
pub struct LogicalNet {
    /// Bit index used by cell connections to refer to this net.
    pub index: i64,
    pub name: String,
    pub driver: Option<PortRef>,
    pub users: Vec<PortRef>,
    pub attrs: BTreeMap<String, String>,
    pub phys: Option<PhysNetId>,
}

#[derive(Clone, Debug)]
pub struct LogicalCell {
    pub name: String,
    pub cell_type: String,
    pub ports: BTreeMap<String, LogicalPort>,
    pub attrs: BTreeMap<String, String>,
    pub params: BTreeMap<String, ParamValue>,
    pub phys: Option<PhysCellId>,
}

impl LogicalCell {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Type of the cell before nextpnr mapped it onto a BEL.
    pub fn orig_type(&self) -> Option<&str> {
        self.attr(ATTR_ORIG_TYPE)
    }

    /// Logical (pre-mapping) port names recorded for port `port`.
    pub fn orig_ports<'a>(&'a self, port: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        self.attr(&orig_port_attr(port)).map(split_name_list)
    }

    pub fn param_ends_with_one(&self, name: &str) -> bool {
        self.params.get(name)
            .map(|v| v.to_string().ends_with('1'))
            .unwrap_or(false)
    }
}

#[derive(Default)]
pub struct Netlist {
    nets: Vec<LogicalNet>,
    cells: Vec<LogicalCell>,
    net_by_name: HashMap<String, NetId>,
    net_by_index: HashMap<i64, NetId>,
    cell_by_name: HashMap<String, CellId>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_net(&mut self, index: i64, name: String, attrs: BTreeMap<String, String>)
        -> Result<NetId>
    {
        let context = format!("net {}", name);
        if self.net_by_name.contains_key(&name) {
            return Err(Error::malformed(context, "duplicate net name"));
        }
        if let Some(other) = self.net_by_index.get(&index) {
            return Err(Error::malformed(context, format!(
                "bit index {} already used by net {}", index, self.net(*other).name
            )));
        }

        let id = NetId::from_raw(self.nets.len() as u32);
        self.net_by_name.insert(name.clone(), id);
        self.net_by_index.insert(index, id);
        self.nets.push(LogicalNet {
            index,
            name,
            driver: None,
            users: Vec::new(),
            attrs,
            phys: None,
        });
        Ok(id)
    }

    pub fn add_cell(&mut self, cell: LogicalCell) -> Result<CellId> {
        if self.cell_by_name.contains_key(&cell.name) {
            return Err(Error::malformed(format!("cell {}", cell.name), "duplicate cell name"));
        }
        let id = CellId::from_raw(self.cells.len() as u32);
        self.cell_by_name.insert(cell.name.clone(), id);
        self.cells.push(cell);
        Ok(id)
    }

    /// Attaches a cell port to a net. Output ports become the net's driver,
    /// everything else is added to its users.
    pub fn connect(&mut self, cell: CellId, port: &str, net: NetId) -> Result<()> {
        let context = || format!("cell {} port {}", self.cells[cell.idx()].name, port);
        let dir = match self.cells[cell.idx()].ports.get(port) {
            Some(p) => p.dir,
            None => return Err(Error::malformed(context(), "connection on undeclared port")),
        };

        let port_ref = PortRef { cell, port: port.to_string() };
        if dir == PinDir::Output {
            if let Some(driver) = &self.nets[net.idx()].driver {
                return Err(Error::inconsistent(
                    format!("net {}", self.nets[net.idx()].name),
                    format!(
                        "driven by both {}.{} and {}.{}",
                        self.cells[driver.cell.idx()].name, driver.port,
                        self.cells[cell.idx()].name, port
                    )
                ));
            }
            self.nets[net.idx()].driver = Some(port_ref);
        } else {
            self.nets[net.idx()].users.push(port_ref);
        }

        if let Some(p) = self.cells[cell.idx()].ports.get_mut(port) {
            p.net = Some(net);
        }
        Ok(())
    }

    pub fn net(&self, id: NetId) -> &LogicalNet {
        &self.nets[id.idx()]
    }

    pub fn net_mut(&mut self, id: NetId) -> &mut LogicalNet {
        &mut self.nets[id.idx()]
    }

    pub fn cell(&self, id: CellId) -> &LogicalCell {
        &self.cells[id.idx()]
    }

    pub fn cell_mut(&mut self, id: CellId) -> &mut LogicalCell {
        &mut self.cells[id.idx()]
    }

    pub fn port(&self, port: &PortRef) -> Option<&LogicalPort> {
        self.cell(port.cell).ports.get(&port.port)
    }

    pub fn net_by_name(&self, name: &str) -> Option<NetId> {
        self.net_by_name.get(name).copied()
    }

    pub fn net_by_index(&self, index: i64) -> Option<NetId> {
        self.net_by_index.get(&index).copied()
    }

    pub fn cell_by_name(&self, name: &str) -> Option<CellId> {
        self.cell_by_name.get(name).copied()
    }

    pub fn net_ids(&self) -> impl Iterator<Item = NetId> {
        (0 .. self.nets.len() as u32).map(NetId::from_raw)
    }

    pub fn cell_ids(&self) -> impl Iterator<Item = CellId> {
        (0 .. self.cells.len() as u32).map(CellId::from_raw)
    }

    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
