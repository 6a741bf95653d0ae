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
//! Module describing which experiments to analyze and how their traces are laid out on disk.
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
/// Scenarios simulated for every combination of variable and queue size.
pub enum Scenario {
    #[strum(to_string = "baseline_no_udp", serialize = "baseline-no-udp")]
    BaselineNoUdp,
    #[strum(to_string = "baseline_udp", serialize = "baseline-udp")]
    BaselineUdp,
    #[strum(to_string = "frr_no_udp", serialize = "frr-no-udp")]
    FrrNoUdp,
    #[strum(to_string = "frr")]
    Frr,
}

impl Scenario {
    /// Name of the directory holding the traces of this scenario.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::BaselineNoUdp => "baseline-no-udp",
            Self::BaselineUdp => "baseline-udp",
            Self::FrrNoUdp => "frr-no-udp",
            Self::Frr => "frr",
        }
    }

    pub fn is_baseline(&self) -> bool {
        matches!(self, Self::BaselineNoUdp | Self::BaselineUdp)
    }
}

/// Protocol mix of an experiment, pairing the baseline scenario with its FRR counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtocolCase {
    pub name: String,
    pub baseline: Scenario,
    pub frr: Scenario,
}

impl ProtocolCase {
    pub fn new(name: impl Into<String>, baseline: Scenario, frr: Scenario) -> Self {
        Self {
            name: name.into(),
            baseline,
            frr,
        }
    }

    /// TCP traffic only.
    pub fn no_udp() -> Self {
        Self::new("no-udp", Scenario::BaselineNoUdp, Scenario::FrrNoUdp)
    }

    /// TCP traffic competing with UDP cross traffic.
    pub fn udp() -> Self {
        Self::new("udp", Scenario::BaselineUdp, Scenario::Frr)
    }
}

/// What to do with table cells for which no trace directory exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCellPolicy {
    /// Keep the cell absent and log a warning.
    #[default]
    Absent,
    /// Store `0.0` and log a warning.
    Zero,
    /// Abort the aggregation.
    Error,
}

/// Location of the trace files inside a scenario directory
/// `{variable}/{queue_size}/{scenario}/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TraceLayout {
    /// Path of a trace relative to the scenario directory. `{seed}` and `{sender}` are replaced
    /// by the seed name and the sender index.
    pub template: String,
    /// Queue size whose baseline scenario fills the `base` column.
    pub baseline_queue_size: String,
    /// Queue sizes that are never traversed.
    pub excluded_queue_sizes: Vec<String>,
}

impl Default for TraceLayout {
    fn default() -> Self {
        Self {
            template: "-TrafficSender{sender}-1.pcap".to_string(),
            baseline_queue_size: "20".to_string(),
            excluded_queue_sizes: vec!["99".to_string()],
        }
    }
}

impl TraceLayout {
    /// Trace file of one sender for one seed, relative to the scenario directory.
    pub fn trace_file(&self, seed: &str, sender: usize) -> String {
        self.template
            .replace("{seed}", seed)
            .replace("{sender}", &sender.to_string())
    }

    pub fn uses_seeds(&self) -> bool {
        self.template.contains("{seed}")
    }

    pub fn is_excluded(&self, queue_size: &str) -> bool {
        self.excluded_queue_sizes.iter().any(|q| q == queue_size)
    }
}

/// Parameters of one aggregation over sender counts, protocol cases, variables and queue sizes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Variables to traverse. Discovered from the source directory if empty.
    pub variables: Vec<String>,
    pub queue_sizes: Vec<String>,
    pub cases: Vec<ProtocolCase>,
    pub sender_counts: Vec<usize>,
    pub seeds: Vec<String>,
    pub layout: TraceLayout,
    pub missing_cells: MissingCellPolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            variables: Vec::new(),
            queue_sizes: ["20", "40", "60", "80", "99"].map(String::from).to_vec(),
            cases: vec![ProtocolCase::no_udp(), ProtocolCase::udp()],
            sender_counts: vec![1],
            seeds: vec!["0".to_string()],
            layout: TraceLayout::default(),
            missing_cells: MissingCellPolicy::default(),
        }
    }
}

/// One experiment directory below `AnalysisConfig::experiments_root`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Experiment {
    /// Directory name, e.g. `bandwidth-primary`.
    pub dir: String,
    /// Name used for the result and plot files, e.g. `bandwidth_primary`.
    pub mode: String,
    /// Pairs of scenarios to plot against each other.
    #[serde(default)]
    pub comparisons: Vec<(Scenario, Scenario)>,
    /// Aggregate over sender counts and seeds instead of reading one trace per scenario.
    #[serde(default)]
    pub aggregate: bool,
}

impl Experiment {
    /// Experiment that compares both baselines against FRR, with and without UDP traffic.
    pub fn comparing_baselines(dir: impl Into<String>) -> Self {
        let dir = dir.into();
        Self {
            mode: dir.replace('-', "_"),
            dir,
            comparisons: vec![
                (Scenario::BaselineNoUdp, Scenario::FrrNoUdp),
                (Scenario::BaselineUdp, Scenario::Frr),
            ],
            aggregate: false,
        }
    }
}

/// Complete configuration of an analysis run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub experiments_root: PathBuf,
    pub results_dir: PathBuf,
    pub plots_dir: PathBuf,
    pub experiments: Vec<Experiment>,
    /// Scenarios read by the per-scenario traversal, in this order.
    pub scenarios: Vec<Scenario>,
    /// Trace file inside every scenario directory for the per-scenario traversal.
    pub trace_file: String,
    pub aggregation: AggregationConfig,
    /// Add a linear best fit to every plotted series.
    pub best_fit: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            experiments_root: PathBuf::from("experiments"),
            results_dir: PathBuf::from("results"),
            plots_dir: PathBuf::from("plots"),
            experiments: [
                "bandwidth-primary",
                "bandwidth-alternate",
                "delay-all",
                "delay-primary",
                "delay-alternate",
            ]
            .map(Experiment::comparing_baselines)
            .to_vec(),
            scenarios: Scenario::iter().collect(),
            trace_file: "-TrafficSender-1.pcap".to_string(),
            aggregation: AggregationConfig::default(),
            best_fit: false,
        }
    }
}

impl AnalysisConfig {
    /// Read the configuration from a JSON file. Missing fields take their default value.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let serialized = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&serialized)?)
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn scenario_names() {
        assert_eq!(Scenario::BaselineNoUdp.to_string(), "baseline_no_udp");
        assert_eq!(Scenario::Frr.dir_name(), "frr");
        assert_eq!(
            Scenario::from_str("baseline-udp").unwrap(),
            Scenario::BaselineUdp
        );
        assert_eq!(Scenario::from_str("frr_no_udp").unwrap(), Scenario::FrrNoUdp);
        assert!(Scenario::from_str("lfa").is_err());
    }

    #[test]
    fn trace_file_template() {
        let layout = TraceLayout::default();
        assert_eq!(layout.trace_file("1", 3), "-TrafficSender3-1.pcap");
        assert!(!layout.uses_seeds());
        assert!(layout.is_excluded("99"));
        assert!(!layout.is_excluded("20"));

        let layout = TraceLayout {
            template: "{seed}/-TrafficSender{sender}-1.pcap".to_string(),
            ..Default::default()
        };
        assert_eq!(layout.trace_file("A", 0), "A/-TrafficSender0-1.pcap");
        assert!(layout.uses_seeds());
    }

    #[test]
    fn default_experiments() {
        let config = AnalysisConfig::default();
        assert_eq!(config.experiments.len(), 5);
        assert_eq!(config.experiments[0].mode, "bandwidth_primary");
        assert_eq!(
            config.experiments[4].comparisons,
            vec![
                (Scenario::BaselineNoUdp, Scenario::FrrNoUdp),
                (Scenario::BaselineUdp, Scenario::Frr)
            ]
        );
    }

    #[test]
    fn partial_json() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{
                "results_dir": "/host/results",
                "experiments": [{"dir": "delay-all", "mode": "delay_all", "aggregate": true}],
                "aggregation": {"sender_counts": [1, 2], "missing_cells": "zero"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.results_dir, PathBuf::from("/host/results"));
        assert_eq!(config.plots_dir, PathBuf::from("plots"));
        assert!(config.experiments[0].aggregate);
        assert!(config.experiments[0].comparisons.is_empty());
        assert_eq!(config.aggregation.sender_counts, vec![1, 2]);
        assert_eq!(config.aggregation.missing_cells, MissingCellPolicy::Zero);
        assert_eq!(config.aggregation.layout, TraceLayout::default());
        assert_eq!(config.aggregation.cases.len(), 2);
    }
}
