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

use std::path::PathBuf;

/// Errors aborting a conversion. Every variant carries enough context to find
/// the offending net, cell or attribute in the input netlist.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed input ({context}): {reason}")]
    MalformedInput { context: String, reason: String },

    #[error("cell `{cell}`: unknown primitive type `{primitive}`")]
    UnknownPrimitiveType { cell: String, primitive: String },

    #[error("cell `{cell}`: primitive has no port `{port}`")]
    UnknownPrimitivePort { cell: String, port: String },

    #[error("device model mismatch ({context}): {reason}")]
    DeviceModelMismatch { context: String, reason: String },

    #[error("inconsistent netlist ({context}): {reason}")]
    InconsistentNetlist { context: String, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn malformed<C, R>(context: C, reason: R) -> Self where
        C: Into<String>,
        R: Into<String>
    {
        Self::MalformedInput { context: context.into(), reason: reason.into() }
    }

    pub fn mismatch<C, R>(context: C, reason: R) -> Self where
        C: Into<String>,
        R: Into<String>
    {
        Self::DeviceModelMismatch { context: context.into(), reason: reason.into() }
    }

    pub fn inconsistent<C, R>(context: C, reason: R) -> Self where
        C: Into<String>,
        R: Into<String>
    {
        Self::InconsistentNetlist { context: context.into(), reason: reason.into() }
    }
}
