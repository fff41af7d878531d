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

use std::path::Path;
use std::process::ExitCode;
use clap::Parser;

use njpc::device::{self, OpenOpts};
use njpc::exporter::{write_design, WriteOpts};
use njpc::{convert, netlist, ConvertOpts, MismatchPolicy};

#[derive(Parser, Debug)]
#[clap(
    author = "Antmicro",
    version = "0.0.1",
    about = "NJPC - Nextpnr JSON to Physical netlist Converter",
    long_about = None
)]
struct Args {
    #[clap(help = "Device description file (JSON or YAML)")]
    device: String,
    #[clap(help = "Placed and routed nextpnr JSON netlist")]
    netlist: String,
    #[clap(help = "Physical design output file")]
    output: String,
    #[clap(long, help = "Use raw (uncompressed) device file")]
    raw: bool,
    #[clap(long, help = "Gzip the output file")]
    compress: bool,
    #[clap(
        long,
        default_value = "LVCMOS33",
        help = "I/O standard of buffers without an IOSTANDARD attribute"
    )]
    default_iostandard: String,
    #[clap(long, help = "Fail on PIPs naming wires the device tile does not have")]
    strict_pips: bool,
}

fn run(args: Args) -> njpc::Result<()> {
    let device = device::open(Path::new(&args.device), OpenOpts { raw: args.raw })?;
    let mut netlist = netlist::open(Path::new(&args.netlist))?;

    let opts = ConvertOpts {
        default_iostandard: args.default_iostandard,
        pip_range_policy: if args.strict_pips { MismatchPolicy::Fail } else { MismatchPolicy::Skip },
    };
    let design = convert(&mut netlist, &device, &device, &opts)?;

    write_design(&args.output, &design, WriteOpts { compress: args.compress, pretty: !args.compress })
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("njpc: {}", err);
            ExitCode::FAILURE
        },
    }
}
