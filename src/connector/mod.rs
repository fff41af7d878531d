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

/* Creates the physical counterpart of every logical net and attaches cell
 * pins to it, at the logical level, the physical level or both. */

use crate::common::*;
use crate::device::{DeviceModel, PinDir, SiteType};
use crate::error::{Error, Result};
use crate::netlist::{NetId, Netlist, PortRef};
use crate::phys::{BelPinRef, PhysCellId, PhysDesign, PhysNetId, SitePinInst, StaticNet};
#[allow(unused)]
use crate::log::*;

#[cfg(test)]
mod tests;

/* Input buffers whose pins have to be attached with a plain connect */
const PASS_THROUGH_IO_TYPES: &[&str] = &["INBUF", "IBUFCTRL"];

/// Where a BEL pin of a placed cell leaves its site.
struct SiteExit {
    bel_pin: BelPinRef,
    site_wire: String,
    port_pin: BelPinRef,
    site_pin: String,
}

fn cell_site_type<'d, D>(device: &'d D, design: &PhysDesign, cell: PhysCellId)
    -> Result<(&'d SiteType, usize)> where
    D: DeviceModel + ?Sized
{
    let c = design.cell(cell);
    let context = || format!("cell {}", c.name);
    let site_type = device.site_type_of(&c.site)
        .ok_or_else(|| Error::mismatch(context(), format!("unknown site {}", c.site)))?;
    let bel = site_type.bel(&c.bel)
        .ok_or_else(|| Error::mismatch(context(), format!("site {} has no BEL {}", c.site, c.bel)))?;
    Ok((site_type, bel))
}

/// Follows BEL pin `pin` of `bel` to the site pin sharing its site wire.
fn site_exit(site_type: &SiteType, bel: usize, pin: &str) -> Option<SiteExit> {
    let pin_idx = site_type.bel_pin(bel, pin)?;
    let site_pin = site_type.connected_site_pin(pin_idx)?;
    let port_bel = site_type.bel(site_pin)?;
    let port_pin = *site_type.bels[port_bel].pins.first()?;

    Some(SiteExit {
        bel_pin: BelPinRef::new(site_type.bels[bel].name.as_str(), pin),
        site_wire: site_type.pin_site_wire(pin_idx).to_string(),
        port_pin: BelPinRef::new(site_pin, site_type.bel_pins[port_pin].name.as_str()),
        site_pin: site_pin.to_string(),
    })
}

/// Logical and physical connection of `logical_pin`, routing the site wire
/// between the BEL pin and its site pin.
fn connect(
    design: &mut PhysDesign,
    net: PhysNetId,
    cell: PhysCellId,
    logical_pin: &str,
    exit: Option<SiteExit>
)
    -> Result<()>
{
    let dir = design.create_port_inst(net, cell, logical_pin, None)?;
    let exit = match exit {
        Some(exit) => exit,
        None => return Ok(()),
    };

    let site = design.cell(cell).site.clone();
    let net_name = design.net(net).name.clone();
    design.net_mut(net).add_pin(SitePinInst {
        site: site.clone(),
        pin: exit.site_pin,
        is_output: dir == PinDir::Output,
    });

    let (from, to) = if dir == PinDir::Output {
        (exit.bel_pin, exit.port_pin)
    } else {
        (exit.port_pin, exit.bel_pin)
    };
    if let Some(si) = design.site_inst_mut(&site) {
        let wire = exit.site_wire.as_str();
        if let Err(owner) = si.route_intra_site_net(&net_name, (from, wire), (to, wire)) {
            dbg_log!(
                DBG_WARN,
                "Site wire {}/{} already used by net {}, not adding it to {}",
                site, wire, owner, net_name
            );
        }
    }
    Ok(())
}

/// Attaches logical pin `logical_pin` of a placed cell to `net`.
pub fn connect_logical_and_physical<D>(
    design: &mut PhysDesign,
    device: &D,
    net: PhysNetId,
    cell: PhysCellId,
    logical_pin: &str
)
    -> Result<()> where
    D: DeviceModel + ?Sized
{
    let (site_type, bel) = cell_site_type(device, design, cell)?;
    let c = design.cell(cell);
    let exit = c.physical_pin_for(logical_pin)
        .and_then(|pin| site_exit(site_type, bel, pin));

    if PASS_THROUGH_IO_TYPES.contains(&c.cell_type.as_str()) {
        return connect(design, net, cell, logical_pin, exit);
    }

    if let Some((bus, index)) = parse_bus_pin(logical_pin) {
        /* Bus members are numbered from the MSB in the logical netlist */
        let width = c.port(bus).map(|p| p.width).unwrap_or(0);
        if index >= width {
            return Err(Error::UnknownPrimitivePort { cell: c.name.clone(), port: logical_pin.into() });
        }
        let dir = design.create_port_inst(net, cell, bus, Some(width - 1 - index))?;
        if let Some(exit) = exit {
            let site = design.cell(cell).site.clone();
            design.net_mut(net).add_pin(SitePinInst {
                site,
                pin: exit.site_pin,
                is_output: dir == PinDir::Output,
            });
        }
        return Ok(());
    }

    match exit {
        Some(exit) => connect(design, net, cell, logical_pin, Some(exit)),
        None => design.create_port_inst(net, cell, logical_pin, None).map(|_| ()),
    }
}

/* A user pin with no logical counterpart, typically a LUT input tied high by
 * the placer. Only the site pin is added. */
fn connect_physical_only<D>(
    design: &mut PhysDesign,
    device: &D,
    net: PhysNetId,
    cell: PhysCellId,
    bel_pin: &str
)
    -> Result<()> where
    D: DeviceModel + ?Sized
{
    let (site_type, bel) = cell_site_type(device, design, cell)?;
    if let Some(exit) = site_exit(site_type, bel, bel_pin) {
        let site = design.cell(cell).site.clone();
        design.net_mut(net).add_pin(SitePinInst { site, pin: exit.site_pin, is_output: false });
    }
    Ok(())
}

fn create_phys_net(design: &mut PhysDesign, name: &str) -> Result<PhysNetId> {
    match name {
        PACKER_VCC_NET => Ok(design.static_net(StaticNet::Vcc)),
        PACKER_GND_NET => Ok(design.static_net(StaticNet::Gnd)),
        _ => design.create_net(&escape_name(name))
            .map_err(|_| Error::inconsistent(
                format!("net {}", name),
                format!("physical name {} is already taken", escape_name(name))
            )),
    }
}

fn connect_net<D>(netlist: &Netlist, design: &mut PhysDesign, device: &D, id: NetId, pnet: PhysNetId)
    -> Result<()> where
    D: DeviceModel + ?Sized
{
    let net = netlist.net(id);

    if let Some(PortRef { cell, port }) = &net.driver {
        let lcell = netlist.cell(*cell);
        match (lcell.phys, lcell.orig_ports(port)) {
            (Some(pcell), Some(orig_ports)) => for logical in orig_ports {
                connect_logical_and_physical(design, device, pnet, pcell, logical)?;
            },
            (Some(_), None) => {
                dbg_log!(DBG_EXTRA, "Driver {}.{} of net {} has no logical pin", lcell.name, port, net.name);
            },
            _ => (),
        }
    }

    for PortRef { cell, port } in &net.users {
        let lcell = netlist.cell(*cell);
        let pcell = match lcell.phys {
            Some(pcell) => pcell,
            None => continue,
        };
        match lcell.orig_ports(port) {
            Some(orig_ports) => for logical in orig_ports {
                connect_logical_and_physical(design, device, pnet, pcell, logical)?;
            },
            None => connect_physical_only(design, device, pnet, pcell, port)?,
        }
    }

    Ok(())
}

/// Creates and connects the physical counterpart of every logical net.
pub fn connect_nets<D>(netlist: &mut Netlist, design: &mut PhysDesign, device: &D) -> Result<()> where
    D: DeviceModel + ?Sized
{
    let net_ids: Vec<NetId> = netlist.net_ids().collect();
    for id in net_ids {
        let pnet = create_phys_net(design, &netlist.net(id).name)?;
        netlist.net_mut(id).phys = Some(pnet);
        connect_net(netlist, design, device, id, pnet)?;
    }

    dbg_log!(DBG_INFO, "Connected {} nets", netlist.net_count());
    Ok(())
}
