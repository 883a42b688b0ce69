//! # Shearwave Runner Module
//!
//! Batch orchestration of site-response analyses.
//!
//! The [`Driver`] multiplies a site profile by a motion library: for every
//! (site, motion) pair it discretizes the column, runs the configured
//! calculator, hands the converged state to the output catalog, and resets
//! the sub-layers for the next motion. Wave-propagation failures discard the
//! affected site without aborting the batch, and a cooperative cancel token
//! stops the run at the next pair boundary with the partial result set
//! intact.
//!
//! ## Features
//!
//! - **Project Documents**: serde-backed configuration of the whole run
//! - **Driver**: the (site × motion) loop with rewind-on-failure
//! - **Progress**: lossy bounded channel that never stalls the computation
//! - **CSV**: one result file per output with ensemble statistics

pub mod config;
pub mod csv;
pub mod driver;
pub mod progress;

pub use config::{
    BedrockConfig, CalculatorConfig, LayerConfig, MotionConfig, ProfileConfig, ProjectConfig,
};
pub use csv::write_output;
pub use driver::{Driver, DriverOutcome};
pub use progress::{Progress, ProgressReceiver, ProgressSender};

use thiserror::Error;

/// Error types for the batch runner
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Project requires at least one enabled motion")]
    NoMotions,

    #[error("Unknown soil type \"{name}\" referenced by layer {layer}")]
    UnknownSoilType { name: String, layer: usize },

    #[error("Solver error: {0}")]
    Solver(#[from] shearwave_solver::SolverError),

    #[error("Motion error: {0}")]
    Motion(#[from] shearwave_motion::MotionError),

    #[error("Profile error: {0}")]
    Profile(#[from] shearwave_profile::ProfileError),

    #[error("Output error: {0}")]
    Output(#[from] shearwave_outputs::OutputError),

    #[error("Failed to parse project: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the batch runner
pub type Result<T> = std::result::Result<T, RunnerError>;
