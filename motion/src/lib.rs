//! # Shearwave Motion Module
//!
//! Ground-motion records and their frequency-domain derivatives.
//!
//! A [`TimeSeriesMotion`] wraps an acceleration record in g and exposes the
//! quantities the rest of the engine consumes: the one-sided frequency grid,
//! the complex acceleration and velocity Fourier spectra, peak values under
//! arbitrary complex transfer functions, response spectra, strain series,
//! and Arias intensity. Every peak is measured on a time series recovered by
//! inverse FFT, never on spectral magnitudes.
//!
//! ## Features
//!
//! - **Spectra**: one-sided acceleration and velocity Fourier spectra
//! - **Response Spectra**: SDOF oscillator sweep with memoized transfer
//!   functions, parallel over periods
//! - **Peaks**: PGA/PGV/PGD and peak strain under a transfer function
//! - **Baseline Correction**: polynomial detrending of derived series
//! - **Loading**: free-form text table reader for recorded motions
//!
//! ## Example
//!
//! ```rust
//! use shearwave_motion::{MotionType, TimeSeriesMotion};
//! use shearwave_numerics::UnitSystem;
//!
//! let accel: Vec<f64> = (0..512)
//!     .map(|i| 0.1 * (2.0 * std::f64::consts::PI * 0.05 * i as f64).sin())
//!     .collect();
//!
//! let motion = TimeSeriesMotion::from_accel(
//!     "example", accel, 0.01, MotionType::Outcrop, UnitSystem::Metric,
//! ).unwrap();
//!
//! println!("pga = {:.3} g over {} frequencies", motion.pga(), motion.freq_count());
//! ```

pub mod loader;
pub mod time_series;

pub use loader::{load_accel, InputUnits, MotionLayout, TableFormat};
pub use time_series::{TimeSeriesKind, TimeSeriesMotion};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for motion operations
#[derive(Error, Debug)]
pub enum MotionError {
    #[error("Motion record is empty")]
    EmptyRecord,

    #[error("Time step {time_step} is not positive")]
    InvalidTimeStep { time_step: f64 },

    #[error("Transfer function has {actual} points, expected {expected}")]
    TransferFunctionLength { expected: usize, actual: usize },

    #[error("Failed to parse \"{token}\" on line {line}")]
    Parse { line: usize, token: String },

    #[error("Data column {column} missing on line {line}")]
    MissingColumn { line: usize, column: usize },

    #[error("Numerics error: {0}")]
    Numerics(#[from] shearwave_numerics::NumericsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for motion operations
pub type Result<T> = std::result::Result<T, MotionError>;

/// How a motion is interpreted with respect to the up- and down-going wave
/// pair at its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionType {
    /// Free-surface amplification present; incoming and reflected waves are
    /// identical
    #[default]
    Outcrop,
    /// Both incoming and reflected waves
    Within,
    /// Only the incoming wave
    IncomingOnly,
}
