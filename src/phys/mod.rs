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

//! Physical design handed over to the checkpoint writer: placed cells,
//! physical nets with their site pins and PIPs, site instances with their
//! internal routing, and the logical netlist of the top cell.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use serde::Serialize;

use crate::device::{PinDir, PrimitivePort};
use crate::error::{Error, Result};

mod site;

pub use self::site::{BelPinRef, SiteInst, SitePipRef, SiteSegment};

define_id!(PhysCellId);
define_id!(PhysNetId);
define_id!(LogicalNetId);

pub const GND_NET_NAME: &str = "GLOBAL_LOGIC0";
pub const VCC_NET_NAME: &str = "GLOBAL_LOGIC1";
pub const LOGICAL_GND_NET_NAME: &str = "<const0>";
pub const LOGICAL_VCC_NET_NAME: &str = "<const1>";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StaticNet {
    Gnd,
    Vcc,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PinMapping {
    pub physical: String,
    pub logical: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PhysCell {
    pub name: String,
    pub cell_type: String,
    pub site: String,
    pub bel: String,
    pin_map: BTreeSet<PinMapping>,
    pub properties: BTreeMap<String, String>,
    #[serde(skip)]
    pub ports: Vec<PrimitivePort>,
}

impl PhysCell {
    pub fn new(name: String, cell_type: String, site: String, bel: String) -> Self {
        Self {
            name,
            cell_type,
            site,
            bel,
            pin_map: BTreeSet::new(),
            properties: BTreeMap::new(),
            ports: Vec::new(),
        }
    }

    pub fn clear_pin_mappings(&mut self) {
        self.pin_map.clear();
    }

    pub fn add_pin_mapping<P, L>(&mut self, physical: P, logical: L) where
        P: Into<String>,
        L: Into<String>
    {
        self.pin_map.insert(PinMapping { physical: physical.into(), logical: logical.into() });
    }

    pub fn pin_mappings(&self) -> impl Iterator<Item = &PinMapping> {
        self.pin_map.iter()
    }

    /// Physical pin carrying logical pin `logical`, if any.
    pub fn physical_pin_for(&self, logical: &str) -> Option<&str> {
        self.pin_map.iter()
            .find(|m| m.logical == logical)
            .map(|m| m.physical.as_str())
    }

    pub fn add_property<N, V>(&mut self, name: N, value: V) where
        N: Into<String>,
        V: Into<String>
    {
        self.properties.insert(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn port(&self, name: &str) -> Option<&PrimitivePort> {
        self.ports.iter().find(|port| port.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SitePinInst {
    pub site: String,
    pub pin: String,
    pub is_output: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Pip {
    pub tile: String,
    pub src: u32,
    pub dst: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PhysNet {
    pub name: String,
    pub logical: LogicalNetId,
    pub pins: BTreeSet<SitePinInst>,
    pub pips: BTreeSet<Pip>,
}

impl PhysNet {
    pub fn add_pin(&mut self, pin: SitePinInst) -> bool {
        self.pins.insert(pin)
    }

    pub fn add_pip(&mut self, pip: Pip) -> bool {
        self.pips.insert(pip)
    }
}

/// A connection of a logical net to a cell port. Bus members carry their bit
/// position within the port.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PortInst {
    pub cell: String,
    pub port: String,
    pub index: Option<u32>,
    pub dir: PinDir,
}

#[derive(Clone, Debug, Serialize)]
pub struct LogicalNet {
    pub name: String,
    pub port_insts: Vec<PortInst>,
}

#[derive(Debug, Serialize)]
pub struct PhysDesign {
    pub name: String,
    pub part: String,
    cells: Vec<PhysCell>,
    nets: Vec<PhysNet>,
    logical_nets: Vec<LogicalNet>,
    site_insts: BTreeMap<String, SiteInst>,
    #[serde(skip)]
    cell_by_name: HashMap<String, PhysCellId>,
    #[serde(skip)]
    net_by_name: HashMap<String, PhysNetId>,
    #[serde(skip)]
    gnd: PhysNetId,
    #[serde(skip)]
    vcc: PhysNetId,
}

impl PhysDesign {
    /// Creates an empty design holding only the two static nets.
    pub fn new<N, P>(name: N, part: P) -> Self where
        N: Into<String>,
        P: Into<String>
    {
        let mut design = Self {
            name: name.into(),
            part: part.into(),
            cells: Vec::new(),
            nets: Vec::new(),
            logical_nets: Vec::new(),
            site_insts: BTreeMap::new(),
            cell_by_name: HashMap::new(),
            net_by_name: HashMap::new(),
            gnd: PhysNetId::from_raw(0),
            vcc: PhysNetId::from_raw(0),
        };
        design.gnd = design.push_net(GND_NET_NAME, LOGICAL_GND_NET_NAME);
        design.vcc = design.push_net(VCC_NET_NAME, LOGICAL_VCC_NET_NAME);
        design
    }

    fn push_net(&mut self, name: &str, logical_name: &str) -> PhysNetId {
        let logical = LogicalNetId::from_raw(self.logical_nets.len() as u32);
        self.logical_nets.push(LogicalNet { name: logical_name.into(), port_insts: Vec::new() });

        let id = PhysNetId::from_raw(self.nets.len() as u32);
        self.net_by_name.insert(name.into(), id);
        self.nets.push(PhysNet {
            name: name.into(),
            logical,
            pins: BTreeSet::new(),
            pips: BTreeSet::new(),
        });
        id
    }

    pub fn static_net(&self, kind: StaticNet) -> PhysNetId {
        match kind {
            StaticNet::Gnd => self.gnd,
            StaticNet::Vcc => self.vcc,
        }
    }

    /// Creates a physical net together with its logical counterpart.
    pub fn create_net(&mut self, name: &str) -> Result<PhysNetId> {
        if self.net_by_name.contains_key(name) {
            return Err(Error::inconsistent(format!("net {}", name), "physical net name already taken"));
        }
        Ok(self.push_net(name, name))
    }

    pub fn add_cell(&mut self, cell: PhysCell) -> Result<PhysCellId> {
        if self.cell_by_name.contains_key(&cell.name) {
            return Err(Error::inconsistent(format!("cell {}", cell.name), "cell placed twice"));
        }
        let id = PhysCellId::from_raw(self.cells.len() as u32);
        self.cell_by_name.insert(cell.name.clone(), id);
        self.cells.push(cell);
        Ok(id)
    }

    pub fn cell(&self, id: PhysCellId) -> &PhysCell {
        &self.cells[id.idx()]
    }

    pub fn cell_mut(&mut self, id: PhysCellId) -> &mut PhysCell {
        &mut self.cells[id.idx()]
    }

    pub fn cell_by_name(&self, name: &str) -> Option<PhysCellId> {
        self.cell_by_name.get(name).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = &PhysCell> {
        self.cells.iter()
    }

    pub fn net(&self, id: PhysNetId) -> &PhysNet {
        &self.nets[id.idx()]
    }

    pub fn net_mut(&mut self, id: PhysNetId) -> &mut PhysNet {
        &mut self.nets[id.idx()]
    }

    pub fn net_by_name(&self, name: &str) -> Option<PhysNetId> {
        self.net_by_name.get(name).copied()
    }

    pub fn nets(&self) -> impl Iterator<Item = &PhysNet> {
        self.nets.iter()
    }

    pub fn logical_net(&self, id: LogicalNetId) -> &LogicalNet {
        &self.logical_nets[id.idx()]
    }

    /// Attaches `port` (bit `index` of a bus port) of `cell` to the logical
    /// net of `net`. Returns the direction of the connected port.
    pub fn create_port_inst(
        &mut self,
        net: PhysNetId,
        cell: PhysCellId,
        port: &str,
        index: Option<u32>
    )
        -> Result<PinDir>
    {
        let c = &self.cells[cell.idx()];
        let dir = c.port(port)
            .map(|p| p.dir)
            .ok_or_else(|| Error::UnknownPrimitivePort { cell: c.name.clone(), port: port.into() })?;
        let inst = PortInst { cell: c.name.clone(), port: port.into(), index, dir };

        let logical = &mut self.logical_nets[self.nets[net.idx()].logical.idx()];
        if !logical.port_insts.contains(&inst) {
            logical.port_insts.push(inst);
        }
        Ok(dir)
    }

    pub fn site_inst(&self, site: &str) -> Option<&SiteInst> {
        self.site_insts.get(site)
    }

    pub fn site_inst_mut(&mut self, site: &str) -> Option<&mut SiteInst> {
        self.site_insts.get_mut(site)
    }

    pub fn get_or_create_site_inst(&mut self, site: &str, site_type: &str) -> &mut SiteInst {
        self.site_insts.entry(site.to_string())
            .or_insert_with(|| SiteInst::new(site.to_string(), site_type.to_string()))
    }

    pub fn site_insts(&self) -> impl Iterator<Item = &SiteInst> {
        self.site_insts.values()
    }
}
