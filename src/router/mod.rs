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

//! Applies the routing found by nextpnr: inter-tile PIPs go onto the physical
//! nets, site PIPs and site wires become intra-site routing of site instances.

use std::collections::HashSet;

use crate::common::*;
use crate::device::{BELCategory, DeviceModel, SiteType};
use crate::error::{Error, Result};
use crate::netlist::{LogicalNet, Netlist, PortRef};
use crate::phys::{BelPinRef, PhysDesign, PhysNetId, Pip, SiteInst, SitePipRef};
use crate::{ConvertOpts, MismatchPolicy};
#[allow(unused)]
use crate::log::*;

pub mod tokens;
#[cfg(test)]
mod tests;

use self::tokens::{parse_pip, parse_site_wire, routing_entries, PipToken, RoutingEntry};

/* (site, site wire) pairs driven through an active inverter */
pub type InversionSet = HashSet<(String, String)>;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteStats {
    pub pips: usize,
    pub skipped_pips: usize,
    pub site_pips: usize,
    pub segments: usize,
}

/// Collects the site wires of user pins whose logical pin is inverted inside
/// the cell (`IS_<pin>_INVERTED` ending in `1`).
pub fn inverted_wires<D>(netlist: &Netlist, design: &PhysDesign, device: &D, net: &LogicalNet)
    -> InversionSet where
    D: DeviceModel + ?Sized
{
    let mut inverted = InversionSet::new();

    for PortRef { cell, port } in &net.users {
        let lcell = netlist.cell(*cell);
        let (orig_ports, pcell) = match (lcell.orig_ports(port), lcell.phys) {
            (Some(orig_ports), Some(pcell)) => (orig_ports, design.cell(pcell)),
            _ => continue,
        };
        for orig in orig_ports {
            if !lcell.param_ends_with_one(&format!("IS_{}_INVERTED", orig)) {
                continue;
            }
            let wire = device.site_type_of(&pcell.site)
                .and_then(|st| {
                    let pin = st.bel_pin(st.bel(&pcell.bel)?, port)?;
                    Some(st.pin_site_wire(pin).to_string())
                });
            if let Some(wire) = wire {
                inverted.insert((pcell.site.clone(), wire));
            }
        }
    }

    inverted
}

fn apply_tile_pip<D>(
    design: &mut PhysDesign,
    device: &D,
    net: PhysNetId,
    context: &str,
    (tile, src, dst): (&str, u32, u32),
    opts: &ConvertOpts,
    stats: &mut RouteStats
)
    -> Result<()> where
    D: DeviceModel + ?Sized
{
    let wire_count = device.tile_wire_count(tile)
        .ok_or_else(|| Error::mismatch(context, format!("unknown tile {}", tile)))?;

    if src >= wire_count || dst >= wire_count {
        if opts.pip_range_policy == MismatchPolicy::Fail {
            return Err(Error::mismatch(context, format!(
                "PIP {}/{}.{} is out of range, the tile has {} wires",
                tile, src, dst, wire_count
            )));
        }
        dbg_log!(
            DBG_WARN,
            "Skipping PIP {}/{}.{} of {}: tile has only {} wires",
            tile, src, dst, context, wire_count
        );
        stats.skipped_pips += 1;
        return Ok(());
    }

    if !device.tile_has_pip(tile, src, dst) {
        return Err(Error::mismatch(context, format!("tile {} has no PIP {}.{}", tile, src, dst)));
    }

    if design.net_mut(net).add_pip(Pip { tile: tile.to_string(), src, dst }) {
        stats.pips += 1;
    }
    Ok(())
}

fn route_segment(si: &mut SiteInst, st: &SiteType, net_name: &str, from: usize, to: usize) -> bool {
    let pin_ref = |pin: usize| BelPinRef::new(
        st.pin_bel(pin).name.as_str(),
        st.bel_pins[pin].name.as_str()
    );
    let res = si.route_intra_site_net(
        net_name,
        (pin_ref(from), st.pin_site_wire(from)),
        (pin_ref(to), st.pin_site_wire(to))
    );
    match res {
        Ok(()) => true,
        Err(owner) => {
            dbg_log!(
                DBG_WARN,
                "Site wire in {} already used by net {}, not routing {} through it",
                si.name, owner, net_name
            );
            false
        },
    }
}

/* Connects `source` to every input pin of the site sharing `wire` */
fn fan_out(si: &mut SiteInst, st: &SiteType, net_name: &str, source: usize, wire: usize)
    -> usize
{
    let sinks: Vec<usize> = st.pins()
        .filter(|(_, pin)| pin.dir.is_input() && pin.site_wire == wire)
        .map(|(idx, _)| idx)
        .collect();
    sinks.into_iter()
        .filter(|sink| route_segment(si, st, net_name, source, *sink))
        .count()
}

fn site_for<'d, D>(design: &mut PhysDesign, device: &'d D, context: &str, site: &str)
    -> Result<&'d SiteType> where
    D: DeviceModel + ?Sized
{
    let st = device.site_type_of(site)
        .ok_or_else(|| Error::mismatch(context, format!("unknown site {}", site)))?;
    design.get_or_create_site_inst(site, &st.name);
    Ok(st)
}

fn apply_site_pip<D>(
    design: &mut PhysDesign,
    device: &D,
    net_name: &str,
    context: &str,
    (site, bel, input_wire): (&str, &str, &str),
    inverted: &InversionSet,
    stats: &mut RouteStats
)
    -> Result<()> where
    D: DeviceModel + ?Sized
{
    let st = site_for(design, device, context, site)?;
    let bel_idx = st.bel(bel)
        .ok_or_else(|| Error::mismatch(context, format!("site {} has no BEL {}", site, bel)))?;
    let si = match design.site_inst_mut(site) {
        Some(si) => si,
        None => return Ok(()),
    };

    for &pin in &st.bels[bel_idx].pins {
        for spip in st.site_pips_from(pin) {
            if st.pin_site_wire(spip.inpin) != input_wire {
                continue;
            }
            /* Never route through an active inversion point */
            let out_wire = st.pin_site_wire(spip.outpin);
            if inverted.contains(&(site.to_string(), out_wire.to_string())) {
                continue;
            }

            let in_wire = st.bel_pins[spip.inpin].site_wire;
            let source = st.pins()
                .filter(|(_, p)| p.dir.is_output() && p.site_wire == in_wire)
                .map(|(idx, _)| idx)
                .last();
            if let Some(source) = source {
                stats.segments += fan_out(si, st, net_name, source, st.bel_pins[spip.outpin].site_wire);
            }

            let added = si.add_site_pip(SitePipRef {
                bel: bel.to_string(),
                input: st.bel_pins[spip.inpin].name.clone(),
                output: st.bel_pins[spip.outpin].name.clone(),
            });
            if added {
                stats.site_pips += 1;
            }
        }
    }
    Ok(())
}

fn apply_site_wire<D>(
    design: &mut PhysDesign,
    device: &D,
    net_name: &str,
    context: &str,
    (site, wire): (&str, &str),
    stats: &mut RouteStats
)
    -> Result<()> where
    D: DeviceModel + ?Sized
{
    let st = site_for(design, device, context, site)?;
    let si = match design.site_inst_mut(site) {
        Some(si) => si,
        None => return Ok(()),
    };
    let wire = match st.site_wires.iter().position(|w| w == wire) {
        Some(wire) => wire,
        None => return Ok(()),
    };

    /* Routing and site-port BELs may sink a site wire but never source it */
    let source = st.pins()
        .filter(|(_, p)| st.bels[p.bel].category == BELCategory::Logic)
        .filter(|(_, p)| p.dir.is_output() && p.site_wire == wire)
        .map(|(idx, _)| idx)
        .last();
    if let Some(source) = source {
        stats.segments += fan_out(si, st, net_name, source, wire);
    }
    Ok(())
}

fn inter_tile_pass<D>(
    design: &mut PhysDesign,
    device: &D,
    net: PhysNetId,
    context: &str,
    entries: &[RoutingEntry],
    opts: &ConvertOpts,
    stats: &mut RouteStats
)
    -> Result<()> where
    D: DeviceModel + ?Sized
{
    for entry in entries {
        let token = parse_pip(entry.pip).map_err(|reason| Error::malformed(context, reason))?;
        if let Some(PipToken::Tile { tile, src, dst }) = token {
            apply_tile_pip(design, device, net, context, (tile, src, dst), opts, stats)?;
        }
    }
    Ok(())
}

fn intra_site_pass<D>(
    design: &mut PhysDesign,
    device: &D,
    net: PhysNetId,
    context: &str,
    entries: &[RoutingEntry],
    inverted: &InversionSet,
    stats: &mut RouteStats
)
    -> Result<()> where
    D: DeviceModel + ?Sized
{
    let net_name = design.net(net).name.clone();

    for entry in entries {
        let token = parse_pip(entry.pip).map_err(|reason| Error::malformed(context, reason))?;
        if let Some(PipToken::Site { site, bel, input_wire }) = token {
            apply_site_pip(design, device, &net_name, context, (site, bel, input_wire), inverted, stats)?;
        }

        let site_wire = parse_site_wire(entry.wire).map_err(|reason| Error::malformed(context, reason))?;
        if let Some(site_wire) = site_wire {
            apply_site_wire(design, device, &net_name, context, site_wire, stats)?;
        }
    }
    Ok(())
}

/// Applies the `ROUTING` attribute of a single logical net.
pub fn route_net<D>(
    netlist: &Netlist,
    design: &mut PhysDesign,
    device: &D,
    net: &LogicalNet,
    opts: &ConvertOpts,
    stats: &mut RouteStats
)
    -> Result<()> where
    D: DeviceModel + ?Sized
{
    let context = format!("net {}", net.name);
    let pnet = net.phys
        .ok_or_else(|| Error::inconsistent(&context, "net has no physical counterpart"))?;

    let routing = match net.attrs.get(ATTR_ROUTING) {
        Some(routing) => routing.as_str(),
        None => {
            dbg_log!(DBG_WARN, "Net {} has no {} attribute", net.name, ATTR_ROUTING);
            ""
        },
    };
    let entries = routing_entries(routing);

    let inverted = inverted_wires(netlist, design, device, net);

    inter_tile_pass(design, device, pnet, &context, &entries, opts, stats)?;
    if net.name != PACKER_GND_NET {
        intra_site_pass(design, device, pnet, &context, &entries, &inverted, stats)?;
    }
    Ok(())
}

/// Routes every net. Must run after all nets are connected.
pub fn route_nets<D>(netlist: &Netlist, design: &mut PhysDesign, device: &D, opts: &ConvertOpts)
    -> Result<RouteStats> where
    D: DeviceModel + ?Sized
{
    let mut stats = RouteStats::default();
    for id in netlist.net_ids() {
        route_net(netlist, design, device, netlist.net(id), opts, &mut stats)?;
    }

    dbg_log!(
        DBG_INFO,
        "Routed {} nets: {} PIPs ({} skipped), {} site PIPs, {} site segments",
        netlist.net_count(), stats.pips, stats.skipped_pips, stats.site_pips, stats.segments
    );
    Ok(stats)
}
