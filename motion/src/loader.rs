//! Free-form text table reader for recorded motions
//!
//! Strong-motion records arrive as whitespace-separated text with a
//! site-specific layout: a header to skip, data laid out in rows or columns,
//! an acceleration column to pick, and a unit plus scale factor to apply.
//! The reader produces a plain acceleration sequence in g; everything else
//! about the file stays outside the engine.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{MotionError, Result};

/// Layout of the data block within the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableFormat {
    /// Every value on every line is a sample, reading left to right
    #[default]
    Rows,
    /// One sample per line, taken from a fixed column
    Columns,
}

/// Units of the acceleration values in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputUnits {
    #[default]
    Gravity,
    CentimetersPerSecondSquared,
    InchesPerSecondSquared,
}

impl InputUnits {
    /// Factor converting a value in these units to g.
    pub fn to_gravity(&self) -> f64 {
        match self {
            InputUnits::Gravity => 1.0,
            InputUnits::CentimetersPerSecondSquared => 1.0 / 980.665,
            InputUnits::InchesPerSecondSquared => 1.0 / 386.088,
        }
    }
}

/// Description of a motion file's layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionLayout {
    #[serde(default)]
    pub format: TableFormat,
    /// Number of header lines to skip
    #[serde(default)]
    pub start_line: usize,
    /// Last line to read, 0 for the whole file
    #[serde(default)]
    pub stop_line: usize,
    /// Zero-based column holding the acceleration, for column layouts
    #[serde(default)]
    pub data_column: usize,
    #[serde(default)]
    pub input_units: InputUnits,
    /// Scale factor applied after the unit conversion
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Time step of the record in seconds
    pub time_step: f64,
}

fn default_scale() -> f64 {
    1.0
}

/// Read an acceleration sequence in g from a text file.
pub fn load_accel(path: &Path, layout: &MotionLayout) -> Result<Vec<f64>> {
    let contents = fs::read_to_string(path)?;
    let accel = parse_accel(&contents, layout)?;
    debug!(
        "loaded {} points at {} s from {}",
        accel.len(),
        layout.time_step,
        path.display()
    );
    Ok(accel)
}

/// Parse an acceleration sequence from file contents.
pub fn parse_accel(contents: &str, layout: &MotionLayout) -> Result<Vec<f64>> {
    let factor = layout.input_units.to_gravity() * layout.scale;
    let mut accel = Vec::new();

    for (number, line) in contents.lines().enumerate() {
        if number < layout.start_line {
            continue;
        }
        if layout.stop_line > 0 && number >= layout.stop_line {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match layout.format {
            TableFormat::Rows => {
                for token in line.split_whitespace() {
                    let value: f64 = token.parse().map_err(|_| MotionError::Parse {
                        line: number + 1,
                        token: token.to_string(),
                    })?;
                    accel.push(factor * value);
                }
            }
            TableFormat::Columns => {
                let token = line
                    .split_whitespace()
                    .nth(layout.data_column)
                    .ok_or(MotionError::MissingColumn {
                        line: number + 1,
                        column: layout.data_column,
                    })?;

                let value: f64 = token.parse().map_err(|_| MotionError::Parse {
                    line: number + 1,
                    token: token.to_string(),
                })?;
                accel.push(factor * value);
            }
        }
    }

    if accel.is_empty() {
        return Err(MotionError::EmptyRecord);
    }

    Ok(accel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rows_layout() {
        let contents = "header one\nheader two\n0.01 0.02 0.03\n-0.01 -0.02\n";
        let layout = MotionLayout {
            format: TableFormat::Rows,
            start_line: 2,
            stop_line: 0,
            data_column: 0,
            input_units: InputUnits::Gravity,
            scale: 1.0,
            time_step: 0.01,
        };

        let accel = parse_accel(contents, &layout).unwrap();
        assert_eq!(accel.len(), 5);
        assert_relative_eq!(accel[2], 0.03);
        assert_relative_eq!(accel[4], -0.02);
    }

    #[test]
    fn test_columns_layout_with_units_and_scale() {
        let contents = "0.00 98.0665\n0.01 -49.03325\n";
        let layout = MotionLayout {
            format: TableFormat::Columns,
            start_line: 0,
            stop_line: 0,
            data_column: 1,
            input_units: InputUnits::CentimetersPerSecondSquared,
            scale: 2.0,
            time_step: 0.01,
        };

        let accel = parse_accel(contents, &layout).unwrap();
        assert_relative_eq!(accel[0], 0.2, max_relative = 1e-10);
        assert_relative_eq!(accel[1], -0.1, max_relative = 1e-10);
    }

    #[test]
    fn test_stop_line_truncates() {
        let contents = "0.1\n0.2\n0.3\n0.4\n";
        let layout = MotionLayout {
            format: TableFormat::Columns,
            start_line: 0,
            stop_line: 2,
            data_column: 0,
            input_units: InputUnits::Gravity,
            scale: 1.0,
            time_step: 0.02,
        };

        let accel = parse_accel(contents, &layout).unwrap();
        assert_eq!(accel.len(), 2);
    }

    #[test]
    fn test_bad_token_reports_line() {
        let contents = "0.1\nnot-a-number\n";
        let layout = MotionLayout {
            format: TableFormat::Rows,
            start_line: 0,
            stop_line: 0,
            data_column: 0,
            input_units: InputUnits::Gravity,
            scale: 1.0,
            time_step: 0.01,
        };

        match parse_accel(contents, &layout) {
            Err(MotionError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_rejected() {
        let layout = MotionLayout {
            format: TableFormat::Rows,
            start_line: 0,
            stop_line: 0,
            data_column: 0,
            input_units: InputUnits::Gravity,
            scale: 1.0,
            time_step: 0.01,
        };
        assert!(matches!(
            parse_accel("", &layout),
            Err(MotionError::EmptyRecord)
        ));
    }
}
