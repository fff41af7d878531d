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

//! Instantiates a physical cell for every mapped logical cell, rebuilding
//! pin mappings and fixing up parameters per primitive.

use std::collections::HashMap;

use crate::common::*;
use crate::device::{DeviceModel, Primitive, PrimitiveLibrary, SiteType};
use crate::error::{Error, Result};
use crate::netlist::{CellId, LogicalCell, Netlist, ParamValue};
use crate::phys::{PhysCell, PhysCellId, PhysDesign};
use crate::ConvertOpts;
#[allow(unused)]
use crate::log::*;


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitFixup {
    /// LUT of the given arity, INIT is widened to `2^arity` bits.
    Lut(u32),
    /// Single-bit register initial value.
    Register,
}

#[derive(Clone, Debug, Default)]
pub struct PrimitiveRule {
    pub init: Option<InitFixup>,
    /// Keep the library pin map instead of rebuilding it from the netlist.
    pub keep_default_pin_map: bool,
    pub extra_properties: &'static [(&'static str, &'static str)],
}

/* Address decoding of RAMD64E is not written out by nextpnr */
const RAMD64E_PROPERTIES: &[(&str, &str)] = &[
    ("RAM_ADDRESS_MASK", "2'b11"),
    ("RAM_ADDRESS_SPACE", "2'b11"),
];

lazy_static! {
    static ref PRIMITIVE_RULES: HashMap<&'static str, PrimitiveRule> = {
        let mut rules = HashMap::new();
        for (name, arity) in [
            ("LUT1", 1), ("LUT2", 2), ("LUT3", 3), ("LUT4", 4), ("LUT5", 5), ("LUT6", 6)
        ] {
            rules.insert(name, PrimitiveRule {
                init: Some(InitFixup::Lut(arity)),
                ..Default::default()
            });
        }
        for name in ["FDRE", "FDSE", "FDCE", "FDPE"] {
            rules.insert(name, PrimitiveRule {
                init: Some(InitFixup::Register),
                ..Default::default()
            });
        }
        rules.insert("RAMD64E", PrimitiveRule {
            extra_properties: RAMD64E_PROPERTIES,
            ..Default::default()
        });
        rules.insert("PS8", PrimitiveRule {
            keep_default_pin_map: true,
            ..Default::default()
        });
        rules
    };
}

static NO_RULE: PrimitiveRule = PrimitiveRule {
    init: None,
    keep_default_pin_map: false,
    extra_properties: &[],
};

pub fn primitive_rule(primitive: &str) -> &'static PrimitiveRule {
    PRIMITIVE_RULES.get(primitive).unwrap_or(&NO_RULE)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IoDirection {
    In,
    Out,
}

/// nextpnr cell types which are placed as I/O buffers.
pub fn io_direction(cell_type: &str) -> Option<IoDirection> {
    match cell_type {
        "IOB_INBUF" | "IOB_IBUFCTRL" => Some(IoDirection::In),
        "IOB_OUTBUF" => Some(IoDirection::Out),
        _ => None,
    }
}

/// Renders a parameter as it is stored on the physical cell.
pub fn fixup_param(fixup: Option<InitFixup>, name: &str, value: &ParamValue)
    -> std::result::Result<String, String>
{
    let fixup = match fixup {
        Some(fixup) if name == "INIT" => fixup,
        _ => return Ok(value.to_string()),
    };
    let bits = match value {
        ParamValue::Bits(bits) => bits,
        ParamValue::Str(s) => return Err(format!("INIT `{}` is not a bit-vector literal", s)),
    };

    match fixup {
        InitFixup::Lut(arity) => bits.resized(1 << arity)
            .map(|bv| bv.to_string())
            .ok_or_else(|| format!("INIT {} does not fit a {}-input LUT", bits, arity)),
        InitFixup::Register => Ok(format!("1'h{}", bits.lsb() as u8)),
    }
}

struct Placement<'a> {
    site: &'a str,
    bel: &'a str,
    site_type: &'a SiteType,
}

fn resolve_placement<'a, D>(device: &'a D, cell: &'a LogicalCell) -> Result<Placement<'a>> where
    D: DeviceModel + ?Sized
{
    let context = format!("cell {}", cell.name);
    let loc = cell.attr(ATTR_BEL)
        .ok_or_else(|| Error::malformed(&context, format!("no {} attribute", ATTR_BEL)))?;
    let (site, bel) = split_bel_location(loc)
        .ok_or_else(|| Error::malformed(&context, format!("bad {} `{}`", ATTR_BEL, loc)))?;
    let site_type = device.site_type_of(site)
        .ok_or_else(|| Error::mismatch(&context, format!("unknown site {}", site)))?;
    if site_type.bel(bel).is_none() {
        return Err(Error::mismatch(&context, format!("site {} has no BEL {}", site, bel)));
    }
    Ok(Placement { site, bel, site_type })
}

fn lookup_primitive<'a, L>(library: &'a L, cell: &LogicalCell, name: &str) -> Result<&'a Primitive> where
    L: PrimitiveLibrary + ?Sized
{
    library.primitive(name)
        .ok_or_else(|| Error::UnknownPrimitiveType { cell: cell.name.clone(), primitive: name.into() })
}

fn new_phys_cell(cell: &LogicalCell, cell_type: &str, placement: &Placement, prim: &Primitive)
    -> PhysCell
{
    let mut pcell = PhysCell::new(
        cell.name.clone(),
        cell_type.to_string(),
        placement.site.to_string(),
        placement.bel.to_string()
    );
    pcell.ports = prim.ports.clone();
    for (physical, logical) in &prim.pin_map {
        pcell.add_pin_mapping(physical.as_str(), logical.as_str());
    }
    pcell
}

fn create_and_place_iob<D>(
    device: &D,
    cell: &LogicalCell,
    dir: IoDirection,
    placement: &Placement,
    prim: &Primitive,
    opts: &ConvertOpts
)
    -> Result<PhysCell> where
    D: DeviceModel + ?Sized
{
    let package_pin = device.package_pin_of_site(placement.site)
        .ok_or_else(|| Error::mismatch(
            format!("cell {}", cell.name),
            format!("site {} is not bonded to a package pin", placement.site)
        ))?;
    let iostandard = cell.attr(ATTR_IOSTANDARD).unwrap_or(&opts.default_iostandard);

    let mut pcell = new_phys_cell(cell, &prim.name, placement, prim);
    pcell.add_property("IOSTANDARD", iostandard);
    pcell.add_property("PACKAGE_PIN", package_pin);

    dbg_log!(
        DBG_EXTRA,
        "Placed {:?} buffer {} on {} ({})",
        dir, cell.name, placement.site, package_pin
    );
    Ok(pcell)
}

fn create_and_place_cell(cell: &LogicalCell, placement: &Placement, prim: &Primitive)
    -> Result<PhysCell>
{
    let rule = primitive_rule(&prim.name);
    let mut pcell = new_phys_cell(cell, &prim.name, placement, prim);

    if !rule.keep_default_pin_map {
        pcell.clear_pin_mappings();
        for port in cell.ports.keys() {
            if let Some(orig_ports) = cell.orig_ports(port) {
                for logical in orig_ports {
                    pcell.add_pin_mapping(port.as_str(), logical);
                }
            }
        }
    }

    for (name, value) in &cell.params {
        let value = fixup_param(rule.init, name, value)
            .map_err(|reason| Error::malformed(
                format!("cell {} parameter {}", cell.name, name),
                reason
            ))?;
        pcell.add_property(name.as_str(), value);
    }
    for (name, value) in rule.extra_properties {
        pcell.add_property(*name, *value);
    }

    Ok(pcell)
}

fn map_cell<D, L>(
    device: &D,
    library: &L,
    design: &mut PhysDesign,
    cell: &LogicalCell,
    opts: &ConvertOpts
)
    -> Result<Option<PhysCellId>> where
    D: DeviceModel + ?Sized,
    L: PrimitiveLibrary + ?Sized
{
    let orig_type = match cell.orig_type() {
        Some(t) => t,
        None => {
            dbg_log!(DBG_EXTRA, "Cell {} has no original type, not placing it", cell.name);
            return Ok(None);
        },
    };

    let prim = lookup_primitive(library, cell, orig_type)?;
    let placement = resolve_placement(device, cell)?;

    let pcell = match io_direction(&cell.cell_type) {
        Some(dir) => create_and_place_iob(device, cell, dir, &placement, prim, opts)?,
        None => create_and_place_cell(cell, &placement, prim)?,
    };

    design.get_or_create_site_inst(placement.site, &placement.site_type.name);
    design.add_cell(pcell).map(Some)
}

/// Places every logical cell carrying an original type.
pub fn map_cells<D, L>(
    netlist: &mut Netlist,
    design: &mut PhysDesign,
    device: &D,
    library: &L,
    opts: &ConvertOpts
)
    -> Result<()> where
    D: DeviceModel + ?Sized,
    L: PrimitiveLibrary + ?Sized
{
    let cell_ids: Vec<CellId> = netlist.cell_ids().collect();
    let mut placed = 0;

    for id in cell_ids {
        let phys = map_cell(device, library, design, netlist.cell(id), opts)?;
        if phys.is_some() {
            placed += 1;
        }
        netlist.cell_mut(id).phys = phys;
    }

    dbg_log!(DBG_INFO, "Placed {} of {} cells", placed, netlist.cell_count());
    Ok(())
}
