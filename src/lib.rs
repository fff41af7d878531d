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

//! Converts a placed and routed nextpnr JSON netlist into a physical design:
//! placed primitives, physical nets with their site pins and PIPs, and site
//! instances with their intra-site routing.

#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod log;
#[macro_use]
pub mod common;
pub mod error;
pub mod device;
pub mod netlist;
pub mod phys;
pub mod mapper;
pub mod connector;
pub mod router;
pub mod exporter;


use crate::device::{DeviceModel, PrimitiveLibrary};
use crate::netlist::Netlist;
use crate::phys::PhysDesign;

pub use crate::error::{Error, Result};

/// What to do with routing that names tile wires the device does not have.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Drop the offending PIP and keep routing the net.
    Skip,
    Fail,
}

#[derive(Clone, Debug)]
pub struct ConvertOpts {
    /// I/O standard of buffers without an IOSTANDARD attribute.
    pub default_iostandard: String,
    pub pip_range_policy: MismatchPolicy,
}

impl Default for ConvertOpts {
    fn default() -> Self {
        Self {
            default_iostandard: "LVCMOS33".into(),
            pip_range_policy: MismatchPolicy::Skip,
        }
    }
}

/// Builds the physical design of `netlist`. Cells are placed first, then
/// every net is connected and finally routed.
pub fn convert<D, L>(netlist: &mut Netlist, device: &D, library: &L, opts: &ConvertOpts)
    -> Result<PhysDesign> where
    D: DeviceModel + ?Sized,
    L: PrimitiveLibrary + ?Sized
{
    let mut design = PhysDesign::new("top", device.name());

    mapper::map_cells(netlist, &mut design, device, library, opts)?;
    connector::connect_nets(netlist, &mut design, device)?;
    router::route_nets(netlist, &mut design, device, opts)?;

    Ok(design)
}
