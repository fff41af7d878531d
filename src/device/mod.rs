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

/* Read-only view of the target device and of the primitive library.
 * Both are consumed through traits, `DeviceDb` is the bundled implementation
 * backed by a serde data file. */

use std::collections::{BTreeMap, HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod loader;

pub use self::loader::{open, OpenOpts};

#[derive(Copy, Clone, Hash, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDir {
    Inout,
    Input,
    Output,
}

impl PinDir {
    pub fn is_input(self) -> bool {
        matches!(self, Self::Input | Self::Inout)
    }

    pub fn is_output(self) -> bool {
        matches!(self, Self::Output | Self::Inout)
    }
}

#[derive(Copy, Clone, Hash, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BELCategory {
    Logic,
    Routing,
    SitePort,
}

#[derive(Clone, Debug)]
pub struct BELPin {
    pub name: String,
    pub dir: PinDir,
    pub bel: usize,
    pub site_wire: usize,
}

#[derive(Clone, Debug)]
pub struct BEL {
    pub name: String,
    pub bel_type: String,
    pub category: BELCategory,
    /* Indices into `SiteType::bel_pins` */
    pub pins: Vec<usize>,
}

/// A site PIP connects an input pin of a routing BEL to one of its outputs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SitePIP {
    pub inpin: usize,
    pub outpin: usize,
}

#[derive(Clone, Debug)]
pub struct SiteType {
    pub name: String,
    pub bels: Vec<BEL>,
    pub bel_pins: Vec<BELPin>,
    pub site_wires: Vec<String>,
    pub site_pips: Vec<SitePIP>,
    bel_by_name: HashMap<String, usize>,
}

impl SiteType {
    pub fn bel(&self, name: &str) -> Option<usize> {
        self.bel_by_name.get(name).copied()
    }

    pub fn bel_pin(&self, bel: usize, pin: &str) -> Option<usize> {
        self.bels[bel].pins.iter()
            .copied()
            .find(|idx| self.bel_pins[*idx].name == pin)
    }

    pub fn pin_site_wire(&self, pin: usize) -> &str {
        &self.site_wires[self.bel_pins[pin].site_wire]
    }

    pub fn pin_bel(&self, pin: usize) -> &BEL {
        &self.bels[self.bel_pins[pin].bel]
    }

    /// Name of the site pin reachable from `pin` over its site wire, that is
    /// the site-port BEL sharing the wire.
    pub fn connected_site_pin(&self, pin: usize) -> Option<&str> {
        let wire = self.bel_pins[pin].site_wire;
        if self.pin_bel(pin).category == BELCategory::SitePort {
            return Some(self.pin_bel(pin).name.as_str());
        }
        self.bel_pins.iter()
            .find(|other| {
                other.site_wire == wire
                    && self.bels[other.bel].category == BELCategory::SitePort
            })
            .map(|other| self.bels[other.bel].name.as_str())
    }

    /// Site PIPs driven through BEL pin `pin`.
    pub fn site_pips_from<'s>(&'s self, pin: usize) -> impl Iterator<Item = &'s SitePIP> + 's {
        self.site_pips.iter().filter(move |spip| spip.inpin == pin)
    }

    /// All BEL pins of the site, paired with their index.
    pub fn pins<'s>(&'s self) -> impl Iterator<Item = (usize, &'s BELPin)> + 's {
        self.bel_pins.iter().enumerate()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitivePort {
    pub name: String,
    pub dir: PinDir,
    #[serde(default = "default_port_width")]
    pub width: u32,
}

fn default_port_width() -> u32 {
    1
}

/// A cell type which can be instantiated on the device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Primitive {
    pub name: String,
    #[serde(default)]
    pub ports: Vec<PrimitivePort>,
    /// Default mapping from physical (BEL) pins to logical ports.
    #[serde(default)]
    pub pin_map: BTreeMap<String, String>,
}

impl Primitive {
    pub fn port(&self, name: &str) -> Option<&PrimitivePort> {
        self.ports.iter().find(|port| port.name == name)
    }
}

pub trait DeviceModel {
    fn name(&self) -> &str;
    fn tile_wire_count(&self, tile: &str) -> Option<u32>;
    fn tile_has_pip(&self, tile: &str, src: u32, dst: u32) -> bool;
    fn site_type_of(&self, site: &str) -> Option<&SiteType>;
    fn package_pin_of_site(&self, site: &str) -> Option<&str>;
}

pub trait PrimitiveLibrary {
    fn primitive(&self, name: &str) -> Option<&Primitive>;
}

/* Serialized device description */

#[derive(Deserialize)]
pub(crate) struct RawDevice {
    name: String,
    #[serde(default)]
    tiles: Vec<RawTile>,
    #[serde(default)]
    site_types: Vec<RawSiteType>,
    #[serde(default)]
    sites: Vec<RawSite>,
    /* package pin -> site */
    #[serde(default)]
    package_pins: BTreeMap<String, String>,
    #[serde(default)]
    primitives: Vec<Primitive>,
}

#[derive(Deserialize)]
struct RawTile {
    name: String,
    wire_count: u32,
    #[serde(default)]
    pips: Vec<(u32, u32)>,
}

#[derive(Deserialize)]
struct RawSiteType {
    name: String,
    #[serde(default)]
    site_wires: Vec<String>,
    #[serde(default)]
    bels: Vec<RawBel>,
    #[serde(default)]
    site_pips: Vec<RawSitePIP>,
}

#[derive(Deserialize)]
struct RawBel {
    name: String,
    #[serde(rename = "type", default)]
    bel_type: String,
    category: BELCategory,
    #[serde(default)]
    pins: Vec<RawBelPin>,
}

#[derive(Deserialize)]
struct RawBelPin {
    name: String,
    dir: PinDir,
    site_wire: String,
}

#[derive(Deserialize)]
struct RawSitePIP {
    bel: String,
    input: String,
    output: String,
}

#[derive(Deserialize)]
struct RawSite {
    name: String,
    site_type: String,
}

pub struct Tile {
    pub wire_count: u32,
    pips: HashSet<(u32, u32)>,
}

pub struct DeviceDb {
    name: String,
    tiles: HashMap<String, Tile>,
    site_types: Vec<SiteType>,
    sites: HashMap<String, usize>,
    site_to_package_pin: HashMap<String, String>,
    primitives: HashMap<String, Primitive>,
}

fn build_site_type(raw: RawSiteType) -> Result<SiteType> {
    let context = format!("site type {}", raw.name);
    let wire_idx: HashMap<&str, usize> = raw.site_wires.iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut bels = Vec::new();
    let mut bel_pins = Vec::new();
    let mut bel_by_name = HashMap::new();

    for (bel_idx, rbel) in raw.bels.into_iter().enumerate() {
        if bel_by_name.insert(rbel.name.clone(), bel_idx).is_some() {
            return Err(Error::mismatch(&context, format!("BEL {} defined twice", rbel.name)));
        }
        let mut pins = Vec::new();
        for rpin in rbel.pins {
            let site_wire = *wire_idx.get(rpin.site_wire.as_str())
                .ok_or_else(|| Error::mismatch(&context, format!(
                    "pin {}.{} is on unknown site wire {}",
                    rbel.name, rpin.name, rpin.site_wire
                )))?;
            pins.push(bel_pins.len());
            bel_pins.push(BELPin { name: rpin.name, dir: rpin.dir, bel: bel_idx, site_wire });
        }
        bels.push(BEL {
            name: rbel.name,
            bel_type: rbel.bel_type,
            category: rbel.category,
            pins,
        });
    }

    let mut st = SiteType {
        name: raw.name,
        bels,
        bel_pins,
        site_wires: raw.site_wires,
        site_pips: Vec::new(),
        bel_by_name,
    };

    for rspip in raw.site_pips {
        let bel = st.bel(&rspip.bel)
            .ok_or_else(|| Error::mismatch(&context, format!("site PIP on unknown BEL {}", rspip.bel)))?;
        let pin = |name: &str| st.bel_pin(bel, name)
            .ok_or_else(|| Error::mismatch(&context, format!(
                "site PIP uses unknown pin {}.{}", rspip.bel, name
            )));
        let spip = SitePIP { inpin: pin(&rspip.input)?, outpin: pin(&rspip.output)? };
        st.site_pips.push(spip);
    }

    Ok(st)
}

impl DeviceDb {
    pub(crate) fn from_raw(raw: RawDevice) -> Result<Self> {
        let context = format!("device {}", raw.name);

        let tiles = raw.tiles.into_iter()
            .map(|t| (t.name, Tile { wire_count: t.wire_count, pips: t.pips.into_iter().collect() }))
            .collect();

        let site_types = raw.site_types.into_iter()
            .map(build_site_type)
            .collect::<Result<Vec<_>>>()?;
        let st_idx: HashMap<&str, usize> = site_types.iter()
            .enumerate()
            .map(|(idx, st)| (st.name.as_str(), idx))
            .collect();

        let mut sites = HashMap::new();
        for site in raw.sites {
            let idx = *st_idx.get(site.site_type.as_str())
                .ok_or_else(|| Error::mismatch(&context, format!(
                    "site {} has unknown type {}", site.name, site.site_type
                )))?;
            sites.insert(site.name, idx);
        }

        let mut site_to_package_pin = HashMap::new();
        for (pin, site) in raw.package_pins {
            site_to_package_pin.entry(site).or_insert(pin);
        }

        let primitives = raw.primitives.into_iter()
            .map(|prim| (prim.name.clone(), prim))
            .collect();

        Ok(Self {
            name: raw.name,
            tiles,
            site_types,
            sites,
            site_to_package_pin,
            primitives,
        })
    }

    pub fn from_yaml(src: &str) -> Result<Self> {
        let raw = serde_yaml::from_str(src)
            .map_err(|e| Error::Decode { path: "<yaml>".into(), reason: e.to_string() })?;
        Self::from_raw(raw)
    }

    pub fn from_json(src: &str) -> Result<Self> {
        let raw = serde_json::from_str(src)
            .map_err(|e| Error::Decode { path: "<json>".into(), reason: e.to_string() })?;
        Self::from_raw(raw)
    }
}

impl DeviceModel for DeviceDb {
    fn name(&self) -> &str {
        &self.name
    }

    fn tile_wire_count(&self, tile: &str) -> Option<u32> {
        self.tiles.get(tile).map(|t| t.wire_count)
    }

    fn tile_has_pip(&self, tile: &str, src: u32, dst: u32) -> bool {
        self.tiles.get(tile)
            .map(|t| t.pips.contains(&(src, dst)))
            .unwrap_or(false)
    }

    fn site_type_of(&self, site: &str) -> Option<&SiteType> {
        self.sites.get(site).map(|idx| &self.site_types[*idx])
    }

    fn package_pin_of_site(&self, site: &str) -> Option<&str> {
        self.site_to_package_pin.get(site).map(String::as_str)
    }
}

impl PrimitiveLibrary for DeviceDb {
    fn primitive(&self, name: &str) -> Option<&Primitive> {
        self.primitives.get(name)
    }
}
