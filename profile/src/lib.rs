//! # Shearwave Profile Module
//!
//! Layered soil column model for one-dimensional site-response analysis.
//!
//! A [`Profile`] is built from a stack of [`SoilLayer`]s over an elastic
//! [`Bedrock`] half-space. Before a computation the stack is discretized
//! into [`SubLayer`]s thin enough to resolve the shortest wavelength of
//! interest; the sub-layers carry the strain-dependent state that the
//! iterative calculators update.
//!
//! ## Features
//!
//! - **Soil Types**: normalized modulus-reduction and damping curves
//! - **Discretization**: wavelength-controlled sub-layer generation
//! - **Locations**: depth to (layer, offset) mapping with a bedrock sentinel
//! - **Strain State**: per-sub-layer strain-compatible properties and errors
//!
//! ## Example
//!
//! ```rust
//! use shearwave_profile::{Bedrock, Profile, SoilLayer, SoilType};
//! use shearwave_numerics::UnitSystem;
//! use std::sync::Arc;
//!
//! let sand = Arc::new(SoilType::linear_elastic("sand", 18.0, 5.0));
//! let layers = vec![SoilLayer::new(sand, 10.0, 250.0)];
//! let bedrock = Bedrock::new(23.0, 1200.0, 1.0);
//!
//! let mut profile = Profile::new(UnitSystem::Metric, layers, bedrock).unwrap();
//! profile.discretize().unwrap();
//!
//! println!("{} sub-layers", profile.sub_layer_count());
//! ```

pub mod curves;
pub mod layer;
pub mod location;
pub mod sublayer;

mod column;

pub use column::Profile;
pub use curves::{NonlinearCurve, SoilType};
pub use layer::{Bedrock, SoilLayer};
pub use location::Location;
pub use sublayer::SubLayer;

use thiserror::Error;

/// Error types for profile operations
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile requires at least one soil layer")]
    NoSoilLayers,

    #[error("Soil layer {index} has non-positive thickness {thickness}")]
    InvalidThickness { index: usize, thickness: f64 },

    #[error("Soil layer {index} has non-positive shear-wave velocity {velocity}")]
    InvalidVelocity { index: usize, velocity: f64 },

    #[error("Nonlinear curve for \"{name}\" is empty")]
    EmptyCurve { name: String },

    #[error("Numerics error: {0}")]
    Numerics(#[from] shearwave_numerics::NumericsError),
}

/// Result type for profile operations
pub type Result<T> = std::result::Result<T, ProfileError>;
