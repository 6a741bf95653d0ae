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
//! Utility module collection of functions

use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use lazy_static::lazy_static;
use ordered_float::OrderedFloat;
use regex::Regex;
use statrs::statistics::Statistics;

use crate::Error;

/// Initialize logging from `log4rs.yml` if present, and from `RUST_LOG` otherwise.
pub fn init_logging() {
    let config = Path::new("log4rs.yml");
    if config.exists() {
        if let Err(e) = log4rs::init_file(config, Default::default()) {
            eprintln!("Could not initialize logging from {config:?}: {e}");
        }
    } else {
        let _ = pretty_env_logger::try_init();
    }
}

pub trait PathBufExt: Sized {
    fn then(self, p: impl AsRef<Path>) -> PathBuf;

    fn then_mode(self, mode: &str, extension: &str) -> PathBuf {
        self.then(format!("{mode}.{extension}"))
    }
}

impl PathBufExt for PathBuf {
    fn then(mut self, p: impl AsRef<Path>) -> PathBuf {
        self.push(p);
        self
    }
}

impl PathBufExt for &Path {
    fn then(self, p: impl AsRef<Path>) -> PathBuf {
        let mut path = self.to_path_buf();
        path.push(p);
        path
    }
}

/// Names of all sub-directories of `path` in natural order. Other entries are ignored.
pub fn list_dirs(path: impl AsRef<Path>) -> Result<Vec<String>, Error> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(path.as_ref())? {
        let entry = entry?;
        if entry.path().is_dir() {
            dirs.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(dirs
        .into_iter()
        .sorted_by(|a, b| human_sort::compare(a, b))
        .collect())
}

lazy_static! {
    static ref QUANTITY: Regex =
        Regex::new(r"^(?P<value>[0-9]+(?:\.[0-9]+)?)\s*(?P<unit>[A-Za-z]*)$").unwrap();
}

/// Physical value of a variable name such as `500Kbps`, `10Mbps`, `5ms` or `20`, in bits per
/// second, seconds, or as a plain number.
pub fn variable_value(name: impl AsRef<str>) -> Option<f64> {
    let captures = QUANTITY.captures(name.as_ref().trim())?;
    let value: f64 = captures.name("value")?.as_str().parse().ok()?;
    let scale = match captures.name("unit").map_or("", |u| u.as_str()) {
        "" | "bps" | "s" | "p" => 1.0,
        "Kbps" | "kbps" => 1e3,
        "Mbps" | "mbps" => 1e6,
        "Gbps" | "gbps" => 1e9,
        "ms" => 1e-3,
        "us" => 1e-6,
        "ns" => 1e-9,
        _ => return None,
    };
    Some(value * scale)
}

/// Order variable names by their physical value. Names without a value are placed after all
/// others, in natural order.
pub fn cmp_variables(a: &str, b: &str) -> Ordering {
    match (variable_value(a), variable_value(b)) {
        (Some(x), Some(y)) => OrderedFloat(x)
            .cmp(&OrderedFloat(y))
            .then_with(|| human_sort::compare(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => human_sort::compare(a, b),
    }
}

/// Least-squares line through the given points, as `(slope, intercept)`. Returns `None` for less
/// than two points or if all `xs` are equal.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let variance = xs.iter().variance();
    if !variance.is_normal() {
        return None;
    }
    let slope = xs.iter().covariance(ys.iter()) / variance;
    let intercept = ys.iter().mean() - slope * xs.iter().mean();
    Some((slope, intercept))
}
