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
//! Module extracting the flow completion time from packet traces.
use std::{
    borrow::Borrow,
    fmt,
    net::IpAddr,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use fct_utils::pcap_utils::{read_pcap, tcp_flags, PacketRecord};

use crate::{
    config::Scenario,
    report,
    util::{self, PathBufExt},
    Error,
};

/// Flags of the packet that closes a flow.
pub const FIN_ACK: u8 = tcp_flags::FIN | tcp_flags::ACK;

/// Returns the capture time of the first packet carrying both FIN and ACK. Later packets are not
/// examined, so a retransmitted FIN+ACK never moves the completion time.
pub fn find_flow_completion<I, P>(packets: I) -> Option<f64>
where
    I: IntoIterator<Item = P>,
    P: Borrow<PacketRecord>,
{
    packets.into_iter().find_map(|packet| {
        let packet = packet.borrow();
        packet
            .tcp()
            .filter(|tcp| tcp.has_flags(FIN_ACK))
            .map(|_| packet.time)
    })
}

/// Source and destination address of the first IP packet in the trace.
pub fn trace_endpoints<I, P>(packets: I) -> Option<(IpAddr, IpAddr)>
where
    I: IntoIterator<Item = P>,
    P: Borrow<PacketRecord>,
{
    packets.into_iter().find_map(|packet| {
        let packet = packet.borrow();
        packet.src_ip.zip(packet.dst_ip)
    })
}

/// Read a trace and extract its flow completion time.
pub fn flow_completion_time(pcap_path: impl AsRef<Path>) -> Result<Option<f64>, Error> {
    let pcap_path = pcap_path.as_ref();
    let packets = read_pcap(pcap_path)?;
    let fct = find_flow_completion(&packets);
    log::debug!(
        "{pcap_path:?}: {} packets, flow completion time {fct:?}",
        packets.len()
    );
    Ok(fct)
}

/// Flow completion time of one scenario in one queue-size directory of a variable.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlowResult {
    pub scenario: Scenario,
    pub queue_size: String,
    pub completion_time: Option<f64>,
    pub variable: String,
}

impl fmt::Display for FlowResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}",
            (
                self.scenario.to_string(),
                &self.queue_size,
                self.completion_time,
                &self.variable
            )
        )
    }
}

/// Walk `{source}/{variable}/{queue_size}/` and read `trace_file` of every scenario. Entries that
/// are not directories are skipped. A trace without a FIN+ACK packet yields an absent
/// completion time.
pub fn collect_flow_results(
    source: impl AsRef<Path>,
    scenarios: &[Scenario],
    trace_file: &str,
) -> Result<Vec<FlowResult>, Error> {
    let source = source.as_ref();
    let mut results = Vec::new();
    for variable in util::list_dirs(source)? {
        let variable_path = source.then(&variable);
        for queue_size in util::list_dirs(&variable_path)? {
            let queue_path = variable_path.clone().then(&queue_size);
            for scenario in scenarios {
                let pcap_path = queue_path.clone().then(scenario.dir_name()).then(trace_file);
                let completion_time = flow_completion_time(&pcap_path)?;
                if completion_time.is_none() {
                    log::warn!("No FIN+ACK packet found in {pcap_path:?}");
                }
                results.push(FlowResult {
                    scenario: *scenario,
                    queue_size: queue_size.clone(),
                    completion_time,
                    variable: variable.clone(),
                });
            }
        }
    }
    Ok(results)
}

/// Collect all `FlowResult`s of an experiment and store them in `{result_dir}/{mode}.txt` and
/// `{result_dir}/{mode}.csv`.
pub fn record_flow_completion_time(
    source: impl AsRef<Path>,
    result_dir: impl AsRef<Path>,
    mode: &str,
    scenarios: &[Scenario],
    trace_file: &str,
) -> Result<Vec<FlowResult>, Error> {
    let results = collect_flow_results(source, scenarios, trace_file)?;
    let result_dir = result_dir.as_ref();
    report::write_report(result_dir.then_mode(mode, "txt"), &results)?;
    report::write_csv(result_dir.then_mode(mode, "csv"), &results)?;
    log::info!("Stored {} flow completion times for {mode}", results.len());
    Ok(results)
}

/// Flow completion time of a single trace file, as written by `process_pcaps`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSummary {
    pub file: String,
    pub completion_time: Option<f64>,
    pub endpoints: Option<(IpAddr, IpAddr)>,
}

impl fmt::Display for TraceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.completion_time {
            Some(t) => write!(f, "{}:{t}", self.file),
            None => write!(f, "{}:None", self.file),
        }
    }
}

/// Summarize every `.pcap` and `.pcap.gz` file directly inside `trace_dir`, ordered by file
/// name.
pub fn scan_traces(trace_dir: impl AsRef<Path>) -> Result<Vec<TraceSummary>, Error> {
    let trace_dir = trace_dir.as_ref();
    let mut paths: Vec<PathBuf> = Vec::new();
    let escaped = glob::Pattern::escape(&trace_dir.to_string_lossy());
    for pattern in ["*.pcap", "*.pcap.gz"] {
        let pattern = Path::new(&escaped).then(pattern);
        for path in glob::glob(&pattern.to_string_lossy())? {
            paths.push(path.map_err(|e| e.into_error())?);
        }
    }

    paths
        .into_iter()
        .sorted_by(|a, b| human_sort::compare(&a.to_string_lossy(), &b.to_string_lossy()))
        .map(|path| -> Result<TraceSummary, Error> {
            let packets = read_pcap(&path)?;
            Ok(TraceSummary {
                file: path
                    .file_name()
                    .map(|f| f.to_string_lossy().to_string())
                    .unwrap_or_default(),
                completion_time: find_flow_completion(&packets),
                endpoints: trace_endpoints(&packets),
            })
        })
        .collect()
}
