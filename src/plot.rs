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
//! Module rendering flow completion times as interactive plots.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use plotly::{
    common::{DashType, Line, Marker, MarkerSymbol, Mode, Title},
    layout::Axis,
    Plot, Scatter,
};

use crate::{
    aggregate::AggregateTable,
    completion::FlowResult,
    config::Scenario,
    util::{self, PathBufExt},
    Error,
};

struct MarkerStyle {
    symbol: MarkerSymbol,
    color: &'static str,
}

/// Marker of a series, by queue size. The baseline is always drawn with black circles.
fn marker_style(series: &str) -> MarkerStyle {
    let (symbol, color) = match series {
        "base" | "baseline" => (MarkerSymbol::Circle, "black"),
        "20" => (MarkerSymbol::Square, "blue"),
        "40" => (MarkerSymbol::TriangleUp, "green"),
        "60" => (MarkerSymbol::TriangleDown, "purple"),
        "80" => (MarkerSymbol::X, "brown"),
        "99" => (MarkerSymbol::Diamond, "red"),
        _ => (MarkerSymbol::Cross, "gray"),
    };
    MarkerStyle { symbol, color }
}

fn series_trace(
    name: &str,
    points: &[(String, f64)],
    style: &MarkerStyle,
) -> Box<Scatter<String, f64>> {
    let (xs, ys): (Vec<String>, Vec<f64>) = points.iter().cloned().unzip();
    Scatter::new(xs, ys)
        .name(name)
        .mode(Mode::LinesMarkers)
        .marker(Marker::new().symbol(style.symbol.clone()).color(style.color).size(8))
        .line(Line::new().color(style.color))
}

/// Least-squares line over the physical value of the variables. Variables without a value are
/// left out.
fn best_fit_trace(
    name: &str,
    points: &[(String, f64)],
    style: &MarkerStyle,
) -> Option<Box<Scatter<String, f64>>> {
    let values = points
        .iter()
        .filter_map(|(variable, y)| Some((variable.clone(), util::variable_value(variable)?, *y)))
        .collect_vec();
    let xs = values.iter().map(|(_, x, _)| *x).collect_vec();
    let ys = values.iter().map(|(_, _, y)| *y).collect_vec();
    let (slope, intercept) = util::linear_fit(&xs, &ys)?;

    let (labels, fitted): (Vec<String>, Vec<f64>) = values
        .into_iter()
        .map(|(variable, x, _)| (variable, slope * x + intercept))
        .unzip();
    Some(
        Scatter::new(labels, fitted)
            .name(format!("{name} (best fit)"))
            .mode(Mode::Lines)
            .line(Line::new().color(style.color).dash(DashType::Dash))
            .show_legend(false),
    )
}

fn new_plot(title: String, x_label: &str) -> Plot {
    let mut plot = Plot::new();
    plot.set_layout(
        plot.layout()
            .clone()
            .title(title)
            .x_axis(Axis::new().title(Title::with_text(x_label)))
            .y_axis(Axis::new().title(Title::with_text("flow completion time in seconds")))
            .height(600),
    );
    plot
}

fn write_plot(plot: &Plot, path: PathBuf) -> PathBuf {
    plot.write_html(&path);
    log::info!("Written plot to: {}", path.as_os_str().to_string_lossy());
    path
}

/// Plot the flow completion times of scenario `cases.0` (the baseline) against scenario
/// `cases.1` over all variables, with one series per queue size. The plot is stored as
/// `{plots_dir}/{mode}-{cases.0}-{cases.1}.html`.
pub fn plot_flow_results(
    results: &[FlowResult],
    mode: &str,
    cases: (Scenario, Scenario),
    plots_dir: impl AsRef<Path>,
    best_fit: bool,
) -> Result<PathBuf, Error> {
    let plots_dir = plots_dir.as_ref();
    fs::create_dir_all(plots_dir)?;
    let (baseline, other) = cases;

    let mut series: BTreeMap<(bool, &str), Vec<(String, f64)>> = BTreeMap::new();
    for result in results
        .iter()
        .filter(|r| r.scenario == baseline || r.scenario == other)
        .sorted_by(|a, b| util::cmp_variables(&a.variable, &b.variable))
    {
        let Some(fct) = result.completion_time else {
            continue;
        };
        series
            .entry((result.scenario != baseline, result.queue_size.as_str()))
            .or_default()
            .push((result.variable.clone(), fct));
    }

    let mut plot = new_plot(
        format!("<b>flow completion for {mode}, {baseline} and {other}</b>"),
        mode,
    );
    for ((is_other, queue_size), points) in series {
        let (name, style) = if is_other {
            (format!("{other}, queue {queue_size}"), marker_style(queue_size))
        } else {
            (format!("{baseline}, queue {queue_size}"), marker_style("baseline"))
        };
        let group = if is_other { queue_size } else { "baseline" };
        plot.add_trace(series_trace(&name, &points, &style).legend_group(group));
        if best_fit {
            if let Some(trace) = best_fit_trace(&name, &points, &style) {
                plot.add_trace(trace.legend_group(group));
            }
        }
    }

    Ok(write_plot(
        &plot,
        plots_dir.then(format!("{mode}-{baseline}-{other}.html")),
    ))
}

/// Plot one `(senders, case)` slice of the aggregate table, with one series per queue key. The
/// plot is stored as `{plots_dir}/{mode}-{case}-senders{senders}.html`.
pub fn plot_table(
    table: &AggregateTable,
    mode: &str,
    case: &str,
    senders: usize,
    plots_dir: impl AsRef<Path>,
    best_fit: bool,
) -> Result<PathBuf, Error> {
    let plots_dir = plots_dir.as_ref();
    fs::create_dir_all(plots_dir)?;

    let mut plot = new_plot(
        format!("<b>flow completion for {mode}, {case} with {senders} senders</b>"),
        mode,
    );
    for (queue, points) in table.series(senders, case) {
        if points.is_empty() {
            log::debug!("No values to plot for queue {queue} of {mode}, {case}, {senders} senders");
            continue;
        }
        let name = queue.to_string();
        let style = marker_style(&name);
        plot.add_trace(series_trace(&name, &points, &style));
        if best_fit {
            if let Some(trace) = best_fit_trace(&name, &points, &style) {
                plot.add_trace(trace);
            }
        }
    }

    Ok(write_plot(
        &plot,
        plots_dir.then(format!("{mode}-{case}-senders{senders}.html")),
    ))
}
