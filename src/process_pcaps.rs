// FRR-FCT: Flow Completion Times of Fast-Reroute Experiments
// Copyright (C) 2024-2025 The FRR-FCT authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use frr_fct::{completion::scan_traces, report, util};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// Print the flow completion time of every packet trace in a directory.
struct Args {
    /// Directory holding the `.pcap` (or `.pcap.gz`) files.
    #[arg(short, long, default_value = "./traces/")]
    trace_dir: PathBuf,
    /// File to store the results in, one `file:time` line per trace.
    #[arg(short, long, default_value = "./results/results.txt")]
    output: PathBuf,
    /// Also print the endpoints of the first IP packet in every trace.
    #[arg(short, long)]
    endpoints: bool,
}

fn main() -> Result<()> {
    util::init_logging();
    let args = Args::parse();

    let summaries = scan_traces(&args.trace_dir)
        .with_context(|| format!("Could not read the traces in {:?}", args.trace_dir))?;
    if summaries.is_empty() {
        log::warn!("No packet traces found in {:?}", args.trace_dir);
    }

    for summary in &summaries {
        match (args.endpoints, summary.endpoints) {
            (true, Some((src, dst))) => println!("{summary} ({src} -> {dst})"),
            _ => println!("{summary}"),
        }
    }

    if let Some(parent) = args.output.parent() {
        fs::create_dir_all(parent)?;
    }
    report::write_report(&args.output, &summaries)
        .with_context(|| format!("Could not write {:?}", args.output))?;
    log::info!("Stored {} results in {:?}", summaries.len(), args.output);
    Ok(())
}
