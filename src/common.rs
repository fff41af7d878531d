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

/* Arena handles, modeled as opaque indices */
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize)]
        pub struct $name(u32);

        impl $name {
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            pub fn idx(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/* Attribute and net names produced by nextpnr */
pub const ATTR_ORIG_TYPE: &str = "X_ORIG_TYPE";
pub const ATTR_ORIG_PORT_PREFIX: &str = "X_ORIG_PORT_";
pub const ATTR_BEL: &str = "NEXTPNR_BEL";
pub const ATTR_IOSTANDARD: &str = "IOSTANDARD";
pub const ATTR_ROUTING: &str = "ROUTING";

pub const PACKER_VCC_NET: &str = "$PACKER_VCC_NET";
pub const PACKER_GND_NET: &str = "$PACKER_GND_NET";

pub fn orig_port_attr(port: &str) -> String {
    format!("{}{}", ATTR_ORIG_PORT_PREFIX, port)
}

/// Makes a nextpnr net name acceptable as a physical net name.
pub fn escape_name(name: &str) -> String {
    name.replace('\\', "__").replace('/', "_")
}

/// Iterates over the non-empty entries of a space separated attribute list.
pub fn split_name_list<'a>(list: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    list.split(' ')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Splits a bus member pin name (`NAME[3]`) into bus name and index.
/// Returns `None` for scalar pins and for brackets not holding a number.
pub fn parse_bus_pin(pin: &str) -> Option<(&str, u32)> {
    let inner = pin.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    let index = inner[open + 1 ..].parse().ok()?;
    Some((&inner[.. open], index))
}

/// Splits a `SITE/BEL` placement string.
pub fn split_bel_location(loc: &str) -> Option<(&str, &str)> {
    let (site, bel) = loc.split_once('/')?;
    if site.is_empty() || bel.is_empty() {
        return None;
    }
    Some((site, bel))
}
