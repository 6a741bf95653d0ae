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
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use frr_fct::{config::AnalysisConfig, runner, util};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// Extract, aggregate and plot the flow completion times of all FRR experiments.
struct Args {
    /// JSON configuration file. Without it, the default experiments are processed.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overwrite the directory holding the experiment directories.
    #[arg(short, long)]
    experiments_root: Option<PathBuf>,
    /// Overwrite the directory for the result files.
    #[arg(short, long)]
    results_dir: Option<PathBuf>,
    /// Overwrite the directory for the plots.
    #[arg(short, long)]
    plots_dir: Option<PathBuf>,
    /// Only process the experiments in the given directories.
    #[arg(short = 'x', long = "experiment")]
    experiments: Vec<String>,
    /// Add a linear best fit to every plotted series.
    #[arg(short, long)]
    best_fit: bool,
}

fn main() -> Result<()> {
    util::init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Could not read the configuration {path:?}"))?,
        None => AnalysisConfig::default(),
    };
    if let Some(root) = args.experiments_root {
        config.experiments_root = root;
    }
    if let Some(results_dir) = args.results_dir {
        config.results_dir = results_dir;
    }
    if let Some(plots_dir) = args.plots_dir {
        config.plots_dir = plots_dir;
    }
    if !args.experiments.is_empty() {
        config
            .experiments
            .retain(|e| args.experiments.contains(&e.dir));
    }
    config.best_fit |= args.best_fit;

    let outputs = runner::run_all(&config).context("Processing the experiments failed")?;
    for output in outputs {
        log::info!(
            "{}: {} and {} plots",
            output.mode,
            output.report.to_string_lossy(),
            output.plots.len()
        );
    }
    Ok(())
}
