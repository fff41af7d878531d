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

/* Decoding of the ROUTING attribute: `wire;pip;strength;` repeated */

const SITEPIP_MARKER: &str = "SITEPIP";
const SITEWIRE_MARKER: &str = "SITEWIRE";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoutingEntry<'a> {
    pub wire: &'a str,
    pub pip: &'a str,
}

/// Splits a routing attribute into its `(wire, pip)` entries. The third field
/// of every triple is ignored and so is an incomplete trailing triple.
pub fn routing_entries(routing: &str) -> Vec<RoutingEntry<'_>> {
    let mut fields: Vec<&str> = routing.split(';').collect();
    if fields.last() == Some(&"") {
        fields.pop();
    }
    fields.chunks(3)
        .filter(|chunk| chunk.len() >= 2)
        .map(|chunk| RoutingEntry { wire: chunk[0], pip: chunk[1] })
        .collect()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipToken<'a> {
    /// Inter-tile PIP between two tile wire indices.
    Tile { tile: &'a str, src: u32, dst: u32 },
    /// Site PIP entered through `input_wire` on BEL `bel`.
    Site { site: &'a str, bel: &'a str, input_wire: &'a str },
}

/// Decodes the pip field of a routing entry. An empty field yields `None`.
pub fn parse_pip(pip: &str) -> Result<Option<PipToken<'_>>, String> {
    if pip.is_empty() {
        return Ok(None);
    }

    if pip.starts_with(SITEPIP_MARKER) {
        let mut parts = pip.splitn(4, '/').skip(1);
        return match (parts.next(), parts.next(), parts.next()) {
            (Some(site), Some(bel), Some(input_wire)) =>
                Ok(Some(PipToken::Site { site, bel, input_wire })),
            _ => Err(format!("bad site PIP `{}`", pip)),
        };
    }

    let bad_pip = || format!("bad PIP `{}`", pip);
    let (tile, wires) = pip.split_once('/').ok_or_else(bad_pip)?;
    let (src, dst) = wires.split_once('.').ok_or_else(bad_pip)?;
    let src = src.parse().map_err(|_| bad_pip())?;
    let dst = dst.parse().map_err(|_| bad_pip())?;
    Ok(Some(PipToken::Tile { tile, src, dst }))
}

/// Decodes a `SITEWIRE/<site>/<wire>` wire field. Other wires yield `None`.
pub fn parse_site_wire(wire: &str) -> Result<Option<(&str, &str)>, String> {
    if !wire.starts_with(SITEWIRE_MARKER) {
        return Ok(None);
    }
    let mut parts = wire.splitn(3, '/').skip(1);
    match (parts.next(), parts.next()) {
        (Some(site), Some(name)) => Ok(Some((site, name))),
        _ => Err(format!("bad site wire `{}`", wire)),
    }
}
