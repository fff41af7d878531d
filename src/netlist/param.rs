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

use serde_json::Value;

/// A sized bit-vector literal, rendered as `<width>'h<hex>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVector {
    width: u32,
    /* Lowercase hex digits, most significant first */
    hex: String,
}

impl BitVector {
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Decodes a string of `0`, `1` and `x` (don't care, read as `0`).
    pub fn from_binary(bits: &str) -> Self {
        let bits: Vec<u8> = bits.bytes()
            .map(|b| if b == b'1' { 1 } else { 0 })
            .collect();

        /* Group bits into nibbles starting from the LSB */
        let mut digits: Vec<char> = bits.rchunks(4)
            .map(|nibble| {
                let v = nibble.iter().fold(0u32, |acc, b| (acc << 1) | *b as u32);
                std::char::from_digit(v, 16).unwrap_or('0')
            })
            .collect();
        digits.reverse();

        Self { width: bits.len() as u32, hex: strip_leading_zeros(digits.into_iter().collect()) }
    }

    /// Encodes an integer. Negative values take 32 bits, others as few as needed.
    pub fn from_int(value: i64) -> Option<Self> {
        if value < 0 {
            let value = i32::try_from(value).ok()?;
            return Some(Self { width: 32, hex: format!("{:x}", value as u32) });
        }
        let value = value as u64;
        let width = (64 - value.leading_zeros()).max(1);
        Some(Self { width, hex: format!("{:x}", value) })
    }

    /// Re-renders the literal as exactly `width` bits, left-padding the hex
    /// digits with zeros. Fails if the value does not fit.
    pub fn resized(&self, width: u32) -> Option<Self> {
        let digits = ((width as usize) / 4).max(1);
        let significant = self.hex.trim_start_matches('0');
        if significant.len() > digits {
            return None;
        }
        let top_bits = width as usize - 4 * (digits - 1);
        if top_bits < 4 && significant.len() == digits {
            let top = significant.chars().next()?.to_digit(16)?;
            if top >> top_bits != 0 {
                return None;
            }
        }
        Some(Self { width, hex: format!("{:0>digits$}", significant, digits = digits) })
    }

    pub fn lsb(&self) -> bool {
        self.hex.chars()
            .last()
            .and_then(|c| c.to_digit(16))
            .map(|d| d & 1 == 1)
            .unwrap_or(false)
    }
}

impl std::fmt::Display for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}'h{}", self.width, self.hex)
    }
}

fn strip_leading_zeros(hex: String) -> String {
    let stripped = hex.trim_start_matches('0');
    if stripped.is_empty() { "0".into() } else { stripped.into() }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Bits(BitVector),
    /// Symbolic parameter, passed through as-is.
    Str(String),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bits(bv) => bv.fmt(f),
            Self::Str(s) => f.write_str(s),
        }
    }
}

fn is_binary_literal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0' | b'1' | b'x'))
}

/// Decodes a JSON parameter value.
pub fn decode_param(value: &Value) -> Result<ParamValue, String> {
    match value {
        Value::Number(n) => {
            let v = n.as_i64()
                .ok_or_else(|| format!("numeric literal {} is not a 64-bit integer", n))?;
            BitVector::from_int(v)
                .map(ParamValue::Bits)
                .ok_or_else(|| format!("negative literal {} does not fit in 32 bits", v))
        },
        Value::String(s) if is_binary_literal(s) => Ok(ParamValue::Bits(BitVector::from_binary(s))),
        Value::String(s) => Ok(ParamValue::Str(s.clone())),
        other => Err(format!("unsupported parameter literal {}", other)),
    }
}
