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
//! Library for extracting and aggregating flow completion times from the packet traces of
//! fast-reroute experiments.
use std::path::PathBuf;

pub mod aggregate;
pub mod completion;
pub mod config;
pub mod plot;
pub mod report;
pub mod runner;
pub mod util;

#[cfg(test)]
mod test;

pub use fct_utils::pcap_utils::PacketRecord;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Trace error: {0}")]
    Trace(#[from] fct_utils::pcap_utils::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Unable to read the flow completion time from directory {0:?}")]
    MissingCompletionTime(PathBuf),
    #[error("No measurement for {senders} senders, case {case}, variable {variable}, queue size {queue_size}")]
    MissingCell {
        senders: usize,
        case: String,
        variable: String,
        queue_size: String,
    },
}

pub mod prelude {
    pub use super::{
        aggregate::{aggregate, record_aggregate, AggregateTable, QueueKey},
        completion::{
            collect_flow_results, find_flow_completion, record_flow_completion_time, FlowResult,
        },
        config::{
            AggregationConfig, AnalysisConfig, Experiment, MissingCellPolicy, ProtocolCase,
            Scenario, TraceLayout,
        },
        plot::{plot_flow_results, plot_table},
        runner::{run_all, run_experiment, ExperimentOutput},
        Error,
    };
}
