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
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::phys::PhysDesign;
#[allow(unused)]
use crate::log::*;

pub struct WriteOpts {
    /// Gzip the output.
    pub compress: bool,
    pub pretty: bool,
}

impl Default for WriteOpts {
    fn default() -> Self {
        Self {
            compress: false,
            pretty: true,
        }
    }
}

pub trait Exporter<D> {
    /// Stages `data` for writing.
    fn export(&mut self, data: &D) -> Result<()>;

    /// Writes out everything staged so far.
    fn flush(&mut self) -> Result<()>;
}

pub fn to_json<D>(data: &D, pretty: bool) -> Result<String> where
    D: Serialize
{
    let res = if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    };
    res.map_err(|e| Error::Decode { path: "<design>".into(), reason: e.to_string() })
}

/* Serialization happens in `export`, so a failure there leaves no file behind */
pub struct JsonFileExporter {
    path: PathBuf,
    opts: WriteOpts,
    staged: Option<String>,
}

impl JsonFileExporter {
    pub fn new<P>(path: P, opts: WriteOpts) -> Self where
        P: AsRef<Path>
    {
        Self { path: path.as_ref().to_path_buf(), opts, staged: None }
    }
}

impl<D> Exporter<D> for JsonFileExporter where D: Serialize {
    fn export(&mut self, data: &D) -> Result<()> {
        self.staged = Some(to_json(data, self.opts.pretty)?);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let data = match self.staged.take() {
            Some(data) => data,
            None => return Ok(()),
        };
        let io_err = |source| Error::Io { path: self.path.clone(), source };

        let file = BufWriter::new(File::create(&self.path).map_err(io_err)?);
        if self.opts.compress {
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(data.as_bytes()).map_err(io_err)?;
            encoder.finish().map_err(io_err)?.flush().map_err(io_err)?;
        } else {
            let mut file = file;
            file.write_all(data.as_bytes()).map_err(io_err)?;
            file.flush().map_err(io_err)?;
        }

        dbg_log!(DBG_INFO, "Wrote {}", self.path.display());
        Ok(())
    }
}

/// Writes the finished physical design to `path`.
pub fn write_design<P>(path: P, design: &PhysDesign, opts: WriteOpts) -> Result<()> where
    P: AsRef<Path>
{
    let mut exporter = JsonFileExporter::new(path, opts);
    exporter.export(design)?;
    <JsonFileExporter as Exporter<PhysDesign>>::flush(&mut exporter)
}
