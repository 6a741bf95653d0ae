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
//! Module writing results to text and CSV files.
use std::{
    fmt::Display,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::Error;

/// Write one line per item, in the given order. An existing file is overwritten.
pub fn write_report<I>(path: impl AsRef<Path>, items: I) -> Result<(), Error>
where
    I: IntoIterator,
    I::Item: Display,
{
    let path = path.as_ref();
    let mut file = BufWriter::new(File::create(path)?);
    for item in items {
        writeln!(file, "{item}")?;
    }
    file.flush()?;
    log::debug!("Written report to {path:?}");
    Ok(())
}

/// Write all rows to a CSV file with a header row. An existing file is overwritten.
pub fn write_csv<I>(path: impl AsRef<Path>, rows: I) -> Result<(), Error>
where
    I: IntoIterator,
    I::Item: Serialize,
{
    let path = path.as_ref();
    let mut csv = csv::Writer::from_path(path)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    log::debug!("Written csv to {path:?}");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{test::TestDir, util::PathBufExt};

    #[derive(Serialize)]
    struct Row {
        variable: &'static str,
        value: Option<f64>,
    }

    #[test]
    fn overwrite_report() {
        let dir = TestDir::new("overwrite_report");
        let path = dir.path().then("mode.txt");
        write_report(&path, ["first", "second", "third"]).unwrap();
        write_report(&path, [3, 1, 2]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "3\n1\n2\n");
    }

    #[test]
    fn csv_rows() {
        let dir = TestDir::new("csv_rows");
        let path = dir.path().then("mode.csv");
        write_csv(
            &path,
            [
                Row {
                    variable: "5ms",
                    value: Some(1.5),
                },
                Row {
                    variable: "10ms",
                    value: None,
                },
            ],
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "variable,value\n5ms,1.5\n10ms,\n"
        );
    }
}
