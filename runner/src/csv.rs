//! CSV result writer
//!
//! One file per output: two comment header lines (the output name and the
//! column labels), the reference axis in the first column, one column per
//! (site, motion) series, and the ensemble statistics when available.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use shearwave_numerics::UnitSystem;
use shearwave_outputs::{Distribution, OutputTable, ReferenceAxis};

use crate::Result;

fn axis_label(axis: ReferenceAxis, units: UnitSystem) -> String {
    match axis {
        ReferenceAxis::Depth => format!("Depth ({})", units.length_label()),
        ReferenceAxis::Frequency => "Frequency (Hz)".to_string(),
        ReferenceAxis::Period => "Period (s)".to_string(),
        ReferenceAxis::Time => "Time (s)".to_string(),
    }
}

/// Write one output table to `<dir>/<prefix>-<shortName>.csv` and return
/// the path.
pub fn write_output(
    dir: &Path,
    prefix: &str,
    table: &OutputTable,
    units: UnitSystem,
) -> Result<PathBuf> {
    let path = dir.join(format!("{}-{}.csv", prefix, table.kind().short_name()));
    let mut out = BufWriter::new(File::create(&path)?);

    writeln!(out, "# {}", table.kind().name())?;

    // Column labels
    let mut labels = vec![axis_label(table.kind().ref_axis(), units)];
    for series in table.series() {
        labels.push(format!("s{}-m{}", series.site + 1, series.motion + 1));
    }
    if let Some(stats) = table.statistics() {
        match stats.distribution {
            Distribution::LogNormal => {
                labels.push("median".to_string());
                labels.push("lnStdev".to_string());
            }
            Distribution::Normal => {
                labels.push("mean".to_string());
                labels.push("stdev".to_string());
            }
        }
    }
    writeln!(out, "# {}", labels.join(","))?;

    for (i, reference) in table.reference().iter().enumerate() {
        let mut row = vec![format!("{:e}", reference)];

        for series in table.series() {
            row.push(
                series
                    .data
                    .get(i)
                    .map(|v| format!("{:e}", v))
                    .unwrap_or_default(),
            );
        }
        if let Some(stats) = table.statistics() {
            row.push(
                stats
                    .average
                    .get(i)
                    .map(|v| format!("{:e}", v))
                    .unwrap_or_default(),
            );
            row.push(
                stats
                    .stdev
                    .get(i)
                    .map(|v| format!("{:e}", v))
                    .unwrap_or_default(),
            );
        }

        writeln!(out, "{}", row.join(","))?;
    }

    out.flush()?;
    Ok(path)
}
