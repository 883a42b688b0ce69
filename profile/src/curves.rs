//! Strain-dependent soil property curves

use serde::{Deserialize, Serialize};
use shearwave_numerics::interp_log_x;

use crate::{ProfileError, Result};

/// A monotone strain-to-value curve tabulated in percent strain.
///
/// Interpolation is linear in the logarithm of strain and clamps at the
/// tabulated endpoints, so a strain outside the curve range returns the
/// nearest endpoint value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonlinearCurve {
    /// Shear strain in percent, ascending
    pub strain: Vec<f64>,
    /// Curve ordinate: G/Gmax or damping in percent
    pub value: Vec<f64>,
}

impl NonlinearCurve {
    pub fn new(strain: Vec<f64>, value: Vec<f64>) -> Self {
        Self { strain, value }
    }

    /// A curve that returns `value` at every strain.
    pub fn constant(value: f64) -> Self {
        Self {
            strain: vec![1e-4],
            value: vec![value],
        }
    }

    pub fn interp(&self, strain: f64) -> Result<f64> {
        Ok(interp_log_x(&self.strain, &self.value, strain)?)
    }
}

/// A soil material: unit weight plus its modulus-reduction and damping
/// curves.
///
/// Shared between every sub-layer discretized from layers of this material;
/// immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilType {
    pub name: String,
    /// Unit weight (kN/m³ or pcf)
    pub unit_weight: f64,
    /// Normalized shear modulus G/Gmax versus strain
    pub mod_reduc: NonlinearCurve,
    /// Damping in percent versus strain
    pub damping: NonlinearCurve,
    /// Damping floor in percent
    pub min_damping: f64,
}

impl SoilType {
    pub fn new(
        name: impl Into<String>,
        unit_weight: f64,
        mod_reduc: NonlinearCurve,
        damping: NonlinearCurve,
        min_damping: f64,
    ) -> Self {
        Self {
            name: name.into(),
            unit_weight,
            mod_reduc,
            damping,
            min_damping,
        }
    }

    /// A strain-independent material with the given damping in percent.
    pub fn linear_elastic(name: impl Into<String>, unit_weight: f64, damping: f64) -> Self {
        Self::new(
            name,
            unit_weight,
            NonlinearCurve::constant(1.0),
            NonlinearCurve::constant(damping),
            damping,
        )
    }

    /// Interpolate both curves at a strain in percent.
    ///
    /// Returns the normalized shear modulus and the damping in percent, with
    /// the damping held at or above the floor.
    pub fn interp(&self, strain: f64) -> Result<(f64, f64)> {
        if self.mod_reduc.strain.is_empty() || self.damping.strain.is_empty() {
            return Err(ProfileError::EmptyCurve {
                name: self.name.clone(),
            });
        }

        let norm_mod = self.mod_reduc.interp(strain)?;
        let damping = self.damping.interp(strain)?.max(self.min_damping);

        Ok((norm_mod, damping))
    }
}
