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

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use memmap2::Mmap;
use flate2::read::GzDecoder;

use super::{DeviceDb, RawDevice};
use crate::error::{Error, Result};
#[allow(unused)]
use crate::log::*;

pub struct OpenOpts {
    pub raw: bool,
}

impl Default for OpenOpts {
    fn default() -> Self {
        Self {
            raw: false
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Format {
    Json,
    Yaml,
}

impl Format {
    /* `device.yaml.gz` is YAML, anything not ending with .yaml/.yml is JSON */
    pub(crate) fn from_path(path: &Path) -> Self {
        let stem = match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => path.file_stem().map(Path::new).unwrap_or(path),
            _ => path,
        };
        match stem.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

fn decode(path: &Path, format: Format, data: &[u8]) -> Result<RawDevice> {
    let decode_err = |reason: String| Error::Decode { path: path.to_path_buf(), reason };
    match format {
        Format::Json => serde_json::from_slice(data).map_err(|e| decode_err(e.to_string())),
        Format::Yaml => serde_yaml::from_slice(data).map_err(|e| decode_err(e.to_string())),
    }
}

/// Loads a device description.
///
/// RAW mode memory-maps an uncompressed file, which loads much faster in debug
/// builds. Otherwise the file is expected to be gzip-compressed.
pub fn open<P>(path: P, opts: OpenOpts) -> Result<DeviceDb> where
    P: AsRef<Path>
{
    let path = path.as_ref();
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };
    let format = Format::from_path(path);

    let device_file = File::open(path).map_err(io_err)?;

    let raw = if opts.raw {
        /* UNSAFE DUE TO A POTENTIAL UB WHEN A FILE IS CHANGED! */
        let mmapped = unsafe { Mmap::map(&device_file) }.map_err(io_err)?;
        decode(path, format, &mmapped[..])?
    } else {
        let mut data = Vec::new();
        GzDecoder::new(BufReader::new(device_file))
            .read_to_end(&mut data)
            .map_err(io_err)?;
        decode(path, format, &data)?
    };

    let db = DeviceDb::from_raw(raw)?;
    dbg_log!(DBG_INFO, "Loaded device {}", path.display());
    Ok(db)
}
