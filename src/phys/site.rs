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

use std::collections::{BTreeMap, BTreeSet};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BelPinRef {
    pub bel: String,
    pub pin: String,
}

impl BelPinRef {
    pub fn new<B, P>(bel: B, pin: P) -> Self where
        B: Into<String>,
        P: Into<String>
    {
        Self { bel: bel.into(), pin: pin.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SitePipRef {
    pub bel: String,
    pub input: String,
    pub output: String,
}

/// Intra-site routing of a net from one BEL pin to another.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SiteSegment {
    pub net: String,
    pub from: BelPinRef,
    pub to: BelPinRef,
}

/// A used site: enabled site PIPs, routed segments and the net owning each
/// touched site wire.
#[derive(Clone, Debug, Serialize)]
pub struct SiteInst {
    pub name: String,
    pub site_type: String,
    pub site_pips: BTreeSet<SitePipRef>,
    pub segments: BTreeSet<SiteSegment>,
    pub wire_nets: BTreeMap<String, String>,
}

impl SiteInst {
    pub fn new(name: String, site_type: String) -> Self {
        Self {
            name,
            site_type,
            site_pips: BTreeSet::new(),
            segments: BTreeSet::new(),
            wire_nets: BTreeMap::new(),
        }
    }

    pub fn add_site_pip(&mut self, pip: SitePipRef) -> bool {
        self.site_pips.insert(pip)
    }

    pub fn wire_net(&self, wire: &str) -> Option<&str> {
        self.wire_nets.get(wire).map(String::as_str)
    }

    /// Claims `wire` for `net`. A wire already owned by another net keeps its
    /// owner, which is returned as the error.
    pub fn claim_wire(&mut self, wire: &str, net: &str) -> Result<(), String> {
        match self.wire_nets.get(wire) {
            Some(owner) if owner != net => Err(owner.clone()),
            Some(_) => Ok(()),
            None => {
                self.wire_nets.insert(wire.to_string(), net.to_string());
                Ok(())
            },
        }
    }

    fn check_wire(&self, wire: &str, net: &str) -> Result<(), String> {
        match self.wire_nets.get(wire) {
            Some(owner) if owner != net => Err(owner.clone()),
            _ => Ok(()),
        }
    }

    /// Routes `net` between two BEL pins of this site, claiming the site
    /// wires of both ends. Nothing is claimed unless both wires are free or
    /// already owned by `net`.
    pub fn route_intra_site_net(
        &mut self,
        net: &str,
        from: (BelPinRef, &str),
        to: (BelPinRef, &str)
    )
        -> Result<(), String>
    {
        self.check_wire(from.1, net)?;
        self.check_wire(to.1, net)?;
        self.claim_wire(from.1, net)?;
        self.claim_wire(to.1, net)?;
        self.segments.insert(SiteSegment { net: net.to_string(), from: from.0, to: to.0 });
        Ok(())
    }
}
