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
//! Module aggregating flow completion times over sender counts, protocol cases, variables and
//! queue sizes.
use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt,
    path::Path,
};

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use statrs::statistics::Statistics;

use crate::{
    completion::flow_completion_time,
    config::{AggregationConfig, MissingCellPolicy},
    report,
    util::{self, PathBufExt},
    Error,
};

/// Column of the aggregate table: either a queue size, or the baseline measured at the baseline
/// queue size.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueueKey {
    Base,
    Size(String),
}

impl QueueKey {
    pub const BASE: &'static str = "base";
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str(Self::BASE),
            Self::Size(size) => f.write_str(size),
        }
    }
}

impl From<&str> for QueueKey {
    fn from(value: &str) -> Self {
        if value == Self::BASE {
            Self::Base
        } else {
            Self::Size(value.to_string())
        }
    }
}

impl Serialize for QueueKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QueueKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| Self::from(s.as_str()))
    }
}

type VariableCells = BTreeMap<String, BTreeMap<QueueKey, Option<f64>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CellKey {
    senders: usize,
    case: String,
    variable: String,
    queue: QueueKey,
}

/// Averaged flow completion times, indexed by sender count, protocol case, variable and queue
/// key. A cell is `None` if it was never measured. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTable {
    cells: BTreeMap<usize, BTreeMap<String, VariableCells>>,
    order: Vec<CellKey>,
}

/// One leaf cell of the `AggregateTable`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableEntry<'a> {
    pub senders: usize,
    pub case: &'a str,
    pub variable: &'a str,
    pub queue_size: &'a QueueKey,
    pub completion_time: Option<f64>,
}

impl fmt::Display for TableEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}",
            (
                self.senders,
                self.case,
                self.variable,
                self.queue_size.to_string(),
                self.completion_time
            )
        )
    }
}

impl AggregateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, creating it if necessary. New cells are appended to the iteration order.
    pub fn insert(
        &mut self,
        senders: usize,
        case: &str,
        variable: &str,
        queue: QueueKey,
        value: Option<f64>,
    ) {
        let cells = self
            .cells
            .entry(senders)
            .or_default()
            .entry(case.to_string())
            .or_default()
            .entry(variable.to_string())
            .or_default();
        match cells.entry(queue.clone()) {
            Entry::Occupied(mut e) => {
                e.insert(value);
            }
            Entry::Vacant(e) => {
                e.insert(value);
                self.order.push(CellKey {
                    senders,
                    case: case.to_string(),
                    variable: variable.to_string(),
                    queue,
                });
            }
        }
    }

    /// Value of a cell. `queue_size` may be `"base"`.
    pub fn get(&self, senders: usize, case: &str, variable: &str, queue_size: &str) -> Option<f64> {
        self.cell(senders, case, variable, queue_size).flatten()
    }

    /// Like `get`, but distinguishes a missing cell (`None`) from a cell without a value
    /// (`Some(None)`).
    pub fn cell(
        &self,
        senders: usize,
        case: &str,
        variable: &str,
        queue_size: &str,
    ) -> Option<Option<f64>> {
        self.cells
            .get(&senders)?
            .get(case)?
            .get(variable)?
            .get(&QueueKey::from(queue_size))
            .copied()
    }

    pub fn sender_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells.keys().copied()
    }

    pub fn cases(&self, senders: usize) -> impl Iterator<Item = &str> {
        self.cells
            .get(&senders)
            .into_iter()
            .flat_map(|cases| cases.keys().map(String::as_str))
    }

    pub fn variables(&self, senders: usize, case: &str) -> impl Iterator<Item = &str> {
        self.cells
            .get(&senders)
            .and_then(|cases| cases.get(case))
            .into_iter()
            .flat_map(|variables| variables.keys().map(String::as_str))
    }

    pub fn queue_keys(
        &self,
        senders: usize,
        case: &str,
        variable: &str,
    ) -> impl Iterator<Item = &QueueKey> {
        self.cells
            .get(&senders)
            .and_then(|cases| cases.get(case))
            .and_then(|variables| variables.get(variable))
            .into_iter()
            .flat_map(|queues| queues.keys())
    }

    /// Measured values of one `(senders, case)` combination per queue key, with the variables
    /// ordered by their physical value.
    pub fn series(&self, senders: usize, case: &str) -> BTreeMap<QueueKey, Vec<(String, f64)>> {
        let mut series: BTreeMap<QueueKey, Vec<(String, f64)>> = BTreeMap::new();
        let Some(variables) = self.cells.get(&senders).and_then(|cases| cases.get(case)) else {
            return series;
        };
        for (variable, queues) in variables
            .iter()
            .sorted_by(|(a, _), (b, _)| util::cmp_variables(a, b))
        {
            for (queue, value) in queues {
                let entry = series.entry(queue.clone()).or_default();
                if let Some(value) = value {
                    entry.push((variable.clone(), *value));
                }
            }
        }
        series
    }

    /// All cells in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = TableEntry<'_>> {
        self.order.iter().map(|key| TableEntry {
            senders: key.senders,
            case: &key.case,
            variable: &key.variable,
            queue_size: &key.queue,
            completion_time: self.cells[&key.senders][&key.case][&key.variable][&key.queue],
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Build the `AggregateTable` of the experiment in `source`.
///
/// For every sender count, protocol case and variable, the `base` column is read from the
/// case's baseline scenario at the baseline queue size, and every configured (not excluded)
/// queue size is read from the case's FRR scenario. A cell is the mean flow completion time over
/// all seeds and all senders `0..sender_count`. Missing scenario directories are skipped and
/// handled according to `params.missing_cells`. A trace without a FIN+ACK packet in an existing
/// directory aborts the aggregation.
pub fn aggregate(
    source: impl AsRef<Path>,
    params: &AggregationConfig,
) -> Result<AggregateTable, Error> {
    let source = source.as_ref();
    let layout = &params.layout;

    let variables = if params.variables.is_empty() {
        util::list_dirs(source)?
            .into_iter()
            .sorted_by(|a, b| util::cmp_variables(a, b))
            .collect_vec()
    } else {
        params.variables.clone()
    };
    let queue_sizes = params
        .queue_sizes
        .iter()
        .filter(|q| !layout.is_excluded(q))
        .filter(|q| {
            let reserved = q.as_str() == QueueKey::BASE;
            if reserved {
                log::warn!("Skipping queue size {q:?}, the name is reserved for the baseline");
            }
            !reserved
        })
        .collect_vec();
    if params.seeds.len() > 1 && !layout.uses_seeds() {
        log::warn!(
            "Trace template {:?} does not depend on the seed, all seeds read the same traces.",
            layout.template
        );
    }

    let mut table = AggregateTable::new();
    for &senders in &params.sender_counts {
        for case in &params.cases {
            for variable in &variables {
                let variable_path = source.then(variable);

                let base_dir = variable_path
                    .clone()
                    .then(&layout.baseline_queue_size)
                    .then(case.baseline.dir_name());
                let base = measure_cell(&base_dir, senders, params)?;
                let base = settle(
                    base,
                    params.missing_cells,
                    senders,
                    &case.name,
                    variable,
                    &QueueKey::Base,
                )?;
                table.insert(senders, &case.name, variable, QueueKey::Base, base);

                for queue_size in &queue_sizes {
                    let queue = QueueKey::Size(queue_size.to_string());
                    let scenario_dir = variable_path
                        .clone()
                        .then(queue_size.as_str())
                        .then(case.frr.dir_name());
                    let value = measure_cell(&scenario_dir, senders, params)?;
                    let value = settle(
                        value,
                        params.missing_cells,
                        senders,
                        &case.name,
                        variable,
                        &queue,
                    )?;
                    table.insert(senders, &case.name, variable, queue, value);
                }
            }
        }
    }

    Ok(table)
}

/// Aggregate the experiment in `source` and dump the table to `{result_dir}/{mode}.txt` and
/// `{result_dir}/{mode}.csv`.
pub fn record_aggregate(
    source: impl AsRef<Path>,
    result_dir: impl AsRef<Path>,
    mode: &str,
    params: &AggregationConfig,
) -> Result<AggregateTable, Error> {
    let table = aggregate(source, params)?;
    let result_dir = result_dir.as_ref();
    report::write_report(result_dir.then_mode(mode, "txt"), table.entries())?;
    report::write_csv(result_dir.then_mode(mode, "csv"), table.entries())?;
    log::info!("Stored {} aggregated cells for {mode}", table.len());
    Ok(table)
}

/// Mean flow completion time over all seeds and senders in a scenario directory, or `None` if
/// the directory does not exist.
fn measure_cell(
    scenario_dir: &Path,
    senders: usize,
    params: &AggregationConfig,
) -> Result<Option<f64>, Error> {
    if !scenario_dir.is_dir() {
        log::warn!("Skipping missing directory {scenario_dir:?}");
        return Ok(None);
    }

    let mut times = Vec::with_capacity(params.seeds.len() * senders);
    for seed in &params.seeds {
        for sender in 0..senders {
            let pcap_path = scenario_dir.then(params.layout.trace_file(seed, sender));
            let Some(fct) = flow_completion_time(&pcap_path)? else {
                log::error!("No FIN+ACK packet of sender {sender} (seed {seed}) in {pcap_path:?}");
                return Err(Error::MissingCompletionTime(scenario_dir.to_path_buf()));
            };
            times.push(fct);
        }
    }

    if times.is_empty() {
        return Ok(None);
    }
    Ok(Some(times.iter().mean()))
}

/// Apply the `MissingCellPolicy` to a cell that may not have been measured.
fn settle(
    value: Option<f64>,
    policy: MissingCellPolicy,
    senders: usize,
    case: &str,
    variable: &str,
    queue: &QueueKey,
) -> Result<Option<f64>, Error> {
    if value.is_some() {
        return Ok(value);
    }
    match policy {
        MissingCellPolicy::Absent => {
            log::warn!("No measurement for {senders} senders, {case}, {variable}, queue {queue}");
            Ok(None)
        }
        MissingCellPolicy::Zero => {
            log::warn!(
                "No measurement for {senders} senders, {case}, {variable}, queue {queue}. Using 0.0"
            );
            Ok(Some(0.0))
        }
        MissingCellPolicy::Error => Err(Error::MissingCell {
            senders,
            case: case.to_string(),
            variable: variable.to_string(),
            queue_size: queue.to_string(),
        }),
    }
}
