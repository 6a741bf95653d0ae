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
//! Module that processes all configured experiments, one after the other.

use std::{fs, path::PathBuf, time::Instant};

use itertools::Itertools;

use crate::{
    aggregate::record_aggregate,
    completion::record_flow_completion_time,
    config::{AnalysisConfig, Experiment},
    plot,
    util::PathBufExt,
    Error,
};

/// Files written for a single experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentOutput {
    pub mode: String,
    pub report: PathBuf,
    pub csv: PathBuf,
    pub plots: Vec<PathBuf>,
}

/// Process a single experiment: write its results to `{results_dir}/{mode}.txt` (and `.csv`) and
/// its plots to `plots_dir`. Returns `None` if the experiment directory does not exist.
pub fn run_experiment(
    config: &AnalysisConfig,
    experiment: &Experiment,
) -> Result<Option<ExperimentOutput>, Error> {
    let source = config.experiments_root.clone().then(&experiment.dir);
    if !source.is_dir() {
        log::warn!("Skipping experiment {}: {source:?} does not exist", experiment.dir);
        return Ok(None);
    }
    let mode = experiment.mode.as_str();
    let start = Instant::now();
    fs::create_dir_all(&config.results_dir)?;
    log::info!("Processing experiment {} from {source:?}", experiment.dir);

    let mut plots = Vec::new();
    if experiment.aggregate {
        let table = record_aggregate(&source, &config.results_dir, mode, &config.aggregation)?;
        for senders in table.sender_counts().collect_vec() {
            for case in table.cases(senders).collect_vec() {
                plots.push(plot::plot_table(
                    &table,
                    mode,
                    case,
                    senders,
                    &config.plots_dir,
                    config.best_fit,
                )?);
            }
        }
    } else {
        let results = record_flow_completion_time(
            &source,
            &config.results_dir,
            mode,
            &config.scenarios,
            &config.trace_file,
        )?;
        for &comparison in &experiment.comparisons {
            plots.push(plot::plot_flow_results(
                &results,
                mode,
                comparison,
                &config.plots_dir,
                config.best_fit,
            )?);
        }
    }

    log::debug!("Processed {mode} in {:?}", start.elapsed());
    Ok(Some(ExperimentOutput {
        mode: mode.to_string(),
        report: config.results_dir.clone().then_mode(mode, "txt"),
        csv: config.results_dir.clone().then_mode(mode, "csv"),
        plots,
    }))
}

/// Process all experiments of the configuration in order. The first failing experiment aborts
/// the run.
pub fn run_all(config: &AnalysisConfig) -> Result<Vec<ExperimentOutput>, Error> {
    fs::create_dir_all(&config.results_dir)?;
    fs::create_dir_all(&config.plots_dir)?;

    let mut outputs = Vec::new();
    for experiment in &config.experiments {
        if let Some(output) = run_experiment(config, experiment)? {
            outputs.push(output);
        }
    }
    log::info!(
        "Processed {} of {} experiments",
        outputs.len(),
        config.experiments.len()
    );
    Ok(outputs)
}
