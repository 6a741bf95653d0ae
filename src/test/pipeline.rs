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
//! End-to-end runs over synthetic experiment trees.

use std::{fs, path::Path};

use itertools::Itertools;

use fct_utils::pcap_utils::tcp_flags;

use super::{flow, tcp, write_trace, TestDir};
use crate::{
    config::{AggregationConfig, AnalysisConfig, Experiment, ProtocolCase, Scenario},
    runner::{run_all, run_experiment},
    util::PathBufExt,
    Error,
};

fn analysis_config(root: &Path, experiments: Vec<Experiment>) -> AnalysisConfig {
    AnalysisConfig {
        experiments_root: root.then("experiments"),
        results_dir: root.then("results"),
        plots_dir: root.then("plots"),
        experiments,
        ..Default::default()
    }
}

#[test]
fn per_scenario_experiment() {
    let dir = TestDir::new("per_scenario_experiment");
    let source = dir.path().then("experiments").then("bandwidth-primary");
    for (variable, offset) in [("10Mbps", 0.0), ("5Mbps", 1.0)] {
        for queue_size in ["20", "40"] {
            for (i, scenario) in ["baseline-no-udp", "baseline-udp", "frr-no-udp", "frr"]
                .into_iter()
                .enumerate()
            {
                write_trace(
                    source
                        .clone()
                        .then(variable)
                        .then(queue_size)
                        .then(scenario)
                        .then("-TrafficSender-1.pcap"),
                    &flow(2.0 + offset + i as f64),
                );
            }
        }
    }
    let config = analysis_config(
        dir.path(),
        vec![
            Experiment::comparing_baselines("bandwidth-primary"),
            Experiment::comparing_baselines("delay-all"),
        ],
    );

    let outputs = run_all(&config).unwrap();

    // the missing experiment is skipped
    assert_eq!(outputs.len(), 1);
    let output = &outputs[0];
    assert_eq!(output.mode, "bandwidth_primary");
    assert_eq!(
        output.plots,
        vec![
            config
                .plots_dir
                .clone()
                .then("bandwidth_primary-baseline_no_udp-frr_no_udp.html"),
            config.plots_dir.clone().then("bandwidth_primary-baseline_udp-frr.html"),
        ]
    );
    assert!(output.plots.iter().all(|p| p.exists()));

    let txt = fs::read_to_string(&output.report).unwrap();
    let lines = txt.lines().collect_vec();
    assert_eq!(lines.len(), 16);
    assert_eq!(lines[0], r#"("baseline_no_udp", "20", Some(3.0), "5Mbps")"#);
    assert_eq!(lines[3], r#"("frr", "20", Some(6.0), "5Mbps")"#);
    assert_eq!(lines[15], r#"("frr", "40", Some(5.0), "10Mbps")"#);

    let csv = fs::read_to_string(&output.csv).unwrap();
    assert_eq!(
        csv.lines().next(),
        Some("scenario,queue_size,completion_time,variable")
    );
    assert_eq!(csv.lines().count(), 17);
}

#[test]
fn aggregated_experiment() {
    let dir = TestDir::new("aggregated_experiment");
    let source = dir.path().then("experiments").then("delay-all");
    for (variable, fct) in [("5ms", 1.0), ("20ms", 4.0)] {
        let var_dir = source.clone().then(variable);
        for sender in 0..2 {
            let file = format!("-TrafficSender{sender}-1.pcap");
            let delta = sender as f64;
            write_trace(
                var_dir.clone().then("20").then("baseline-no-udp").then(&file),
                &flow(fct + delta),
            );
            write_trace(
                var_dir.clone().then("20").then("frr-no-udp").then(&file),
                &flow(fct + 1.0 + delta),
            );
            // excluded, never read
            write_trace(
                var_dir.clone().then("99").then("frr-no-udp").then(&file),
                &[tcp(0.1, tcp_flags::SYN)],
            );
        }
    }
    let mut config = analysis_config(
        dir.path(),
        vec![Experiment {
            dir: "delay-all".to_string(),
            mode: "delay_all".to_string(),
            comparisons: Vec::new(),
            aggregate: true,
        }],
    );
    config.aggregation = AggregationConfig {
        queue_sizes: vec!["20".to_string(), "99".to_string()],
        cases: vec![ProtocolCase::no_udp()],
        sender_counts: vec![2],
        ..Default::default()
    };
    config.best_fit = true;

    let output = run_experiment(&config, &config.experiments[0])
        .unwrap()
        .unwrap();

    assert_eq!(
        output.plots,
        vec![config.plots_dir.clone().then("delay_all-no-udp-senders2.html")]
    );
    assert!(output.plots[0].exists());
    let txt = fs::read_to_string(&output.report).unwrap();
    assert_eq!(
        txt.lines().collect_vec(),
        vec![
            r#"(2, "no-udp", "5ms", "base", Some(1.5))"#,
            r#"(2, "no-udp", "5ms", "20", Some(2.5))"#,
            r#"(2, "no-udp", "20ms", "base", Some(4.5))"#,
            r#"(2, "no-udp", "20ms", "20", Some(5.5))"#,
        ]
    );
}

#[test]
fn failing_experiment_aborts_run() {
    let dir = TestDir::new("failing_experiment_aborts_run");
    let trace = dir
        .path()
        .then("experiments")
        .then("delay-primary")
        .then("5ms")
        .then("20")
        .then(Scenario::FrrNoUdp.dir_name())
        .then("-TrafficSender0-1.pcap");
    write_trace(&trace, &[tcp(0.1, tcp_flags::SYN)]);
    let mut config = analysis_config(
        dir.path(),
        vec![Experiment {
            aggregate: true,
            ..Experiment::comparing_baselines("delay-primary")
        }],
    );
    config.aggregation.queue_sizes = vec!["20".to_string()];
    config.aggregation.cases = vec![ProtocolCase::no_udp()];

    match run_all(&config) {
        Err(Error::MissingCompletionTime(path)) => {
            assert_eq!(Some(path.as_path()), trace.parent())
        }
        r => panic!("unexpected result: {r:?}"),
    }
}
