//! # Shearwave Numerics Module
//!
//! Numerical kernels shared by the shearwave site-response engine.
//!
//! This module provides the low-level building blocks used throughout the
//! workspace: real-to-complex FFTs at power-of-two lengths, least-squares
//! fitting, trapezoidal integration, interpolation tables, and the unit
//! system carried through every physical computation.
//!
//! ## Features
//!
//! - **Real FFT**: forward/inverse transforms with a fixed power-of-two plan
//! - **Least Squares**: general linear fits and polynomial baseline fits
//! - **Integration**: trapezoidal rule on arbitrary and uniform grids
//! - **Interpolation**: linear and log-abscissa tables with endpoint clamping
//! - **Units**: metric/english unit system passed by value, no global state
//!
//! ## Example
//!
//! ```rust
//! use shearwave_numerics::{complex_shear_modulus, UnitSystem};
//!
//! let modulus = complex_shear_modulus(48_000.0, 0.05);
//! let units = UnitSystem::Metric;
//!
//! println!("G* = {:?} at g = {}", modulus, units.gravity());
//! ```

pub mod fft;
pub mod fit;
pub mod interp;
pub mod series;
pub mod units;

pub use fft::*;
pub use fit::*;
pub use interp::*;
pub use series::*;
pub use units::*;

use num_complex::Complex64;
use thiserror::Error;

/// Error types for numerical operations
#[derive(Error, Debug)]
pub enum NumericsError {
    #[error("FFT length {len} is not a power of two")]
    InvalidFftLength { len: usize },

    #[error("FFT processing failed: {message}")]
    FftFailed { message: String },

    #[error("Input length {actual} does not match expected length {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Least-squares fit failed: {message}")]
    FitFailed { message: String },

    #[error("Fit is underdetermined: {rows} samples for {params} parameters")]
    Underdetermined { rows: usize, params: usize },

    #[error("Interpolation table is empty")]
    EmptyTable,
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, NumericsError>;

/// Complex shear modulus from shear modulus and damping ratio.
///
/// Uses the simplified formulation of Kramer (1996),
/// `G* = G ((1 - d^2) + 2 i d)`, which produces hysteretic damping that is
/// independent of frequency. The SHAKE91 formulation
/// `G ((1 - 2 d^2) + 2 i d sqrt(1 - d^2))` results in frequency dependent
/// damping and is not used.
///
/// `damping` is a fraction, not a percent.
pub fn complex_shear_modulus(shear_mod: f64, damping: f64) -> Complex64 {
    shear_mod * Complex64::new(1.0 - damping * damping, 2.0 * damping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_complex_shear_modulus_ratio() {
        // Im(G*)/Re(G*) must equal 2 d / (1 - d^2) over the working range
        for i in 0..=30 {
            let d = i as f64 / 100.0;
            let gstar = complex_shear_modulus(1.0, d);
            assert_relative_eq!(
                gstar.im / gstar.re,
                2.0 * d / (1.0 - d * d),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_complex_shear_modulus_undamped() {
        let gstar = complex_shear_modulus(250.0, 0.0);
        assert_relative_eq!(gstar.re, 250.0);
        assert_relative_eq!(gstar.im, 0.0);
    }
}
