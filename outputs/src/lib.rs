//! # Shearwave Outputs Module
//!
//! Extraction of named result vectors from a converged computation.
//!
//! Each [`OutputKind`] pairs a pure extractor with the metadata the driver
//! needs: the reference axis it is plotted against, whether it requires a
//! time-domain motion, whether it depends on the motion at all, and the
//! distribution used for its ensemble statistics. The [`OutputCatalog`]
//! collects the extracted series across the (site, motion) grid, supports
//! rewinding a failed site, and computes mean and standard deviation over
//! the ensemble.
//!
//! ## Features
//!
//! - **Profiles**: velocities, moduli, damping, peak response, stresses,
//!   Arias intensity, dissipated energy versus depth
//! - **Spectra**: response spectra, spectral ratios, Fourier amplitudes
//! - **Transfer Functions**: acceleration and strain magnitudes
//! - **Time Series**: acceleration, velocity, displacement, strain, stress
//! - **Statistics**: log-normal or normal mean and stdev over the ensemble

pub mod catalog;
pub mod extract;
pub mod kind;
pub mod statistics;

pub use catalog::{OutputCatalog, OutputSeries, OutputSettings, OutputTable};
pub use extract::{extract, ExtractContext};
pub use kind::{Distribution, OutputKind, ReferenceAxis};
pub use statistics::OutputStatistics;

use thiserror::Error;

/// Error types for output operations
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Output \"{name}\" produced {data} values against {reference} reference points")]
    ReferenceMismatch {
        name: String,
        reference: usize,
        data: usize,
    },

    #[error("Solver error: {0}")]
    Solver(#[from] shearwave_solver::SolverError),

    #[error("Motion error: {0}")]
    Motion(#[from] shearwave_motion::MotionError),

    #[error("Profile error: {0}")]
    Profile(#[from] shearwave_profile::ProfileError),

    #[error("Numerics error: {0}")]
    Numerics(#[from] shearwave_numerics::NumericsError),
}

/// Result type for output operations
pub type Result<T> = std::result::Result<T, OutputError>;
