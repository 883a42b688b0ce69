//! # Shearwave Solver Module
//!
//! Frequency-domain SH wave propagation and strain-compatible iteration.
//!
//! The [`WaveField`] carries the complex shear moduli, wave numbers, and
//! up/down-going wave amplitudes of the column and derives transfer
//! functions between any two locations. The [`SiteResponseCalculator`]
//! drives it: linear-elastic in one pass, or iterating the equivalent-linear
//! and frequency-dependent schemes until the soil properties are compatible
//! with the strains they produce.
//!
//! ## Features
//!
//! - **Wave Field**: layer-by-layer amplitude recursion with free-surface
//!   and near-DC handling
//! - **Transfer Functions**: acceleration, strain, and stress between
//!   arbitrary (location, motion-type) pairs
//! - **Iteration Modes**: linear-elastic, equivalent-linear, and
//!   frequency-dependent equivalent-linear
//! - **Cancellation**: cooperative token observed at iteration boundaries
//!
//! ## Example
//!
//! ```rust,no_run
//! use shearwave_solver::{CancelToken, IterationMode, SiteResponseCalculator};
//!
//! let mut calc = SiteResponseCalculator::new(IterationMode::EquivalentLinear {
//!     strain_ratio: 0.65,
//! });
//!
//! # let motion: shearwave_motion::TimeSeriesMotion = unimplemented!();
//! # let mut profile: shearwave_profile::Profile = unimplemented!();
//! let summary = calc.run(&motion, &mut profile, &CancelToken::new()).unwrap();
//! println!("converged: {}", summary.converged);
//! ```

pub mod calculator;
pub mod field;

pub use calculator::{IterationMode, RunSummary, SiteResponseCalculator};
pub use field::WaveField;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Error types for solver operations
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Non-finite wave amplitude in layer {layer} at frequency index {freq_index}")]
    PropagationFailed { layer: usize, freq_index: usize },

    #[error("Zero peak strain in sub-layer {layer}")]
    ZeroStrain { layer: usize },

    #[error("Computation cancelled")]
    Cancelled,

    #[error("Profile has no sub-layers; discretize before running")]
    NotDiscretized,

    #[error("Profile error: {0}")]
    Profile(#[from] shearwave_profile::ProfileError),

    #[error("Motion error: {0}")]
    Motion(#[from] shearwave_motion::MotionError),

    #[error("Numerics error: {0}")]
    Numerics(#[from] shearwave_numerics::NumericsError),
}

impl SolverError {
    /// Failures that discard the current (site, motion) pair while the batch
    /// continues.
    pub fn is_propagation_failure(&self) -> bool {
        matches!(
            self,
            SolverError::PropagationFailed { .. } | SolverError::ZeroStrain { .. }
        )
    }
}

/// Result type for solver operations
pub type Result<T> = std::result::Result<T, SolverError>;

/// Cooperative cancellation flag shared between the driver and a running
/// calculation.
///
/// Observed between outer iterations and between sub-layer updates; a
/// cancelled run returns [`SolverError::Cancelled`] at the next check.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
