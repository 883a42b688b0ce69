//! Discretized sub-layers carrying strain-dependent state

use std::sync::Arc;

use shearwave_numerics::UnitSystem;

use crate::curves::SoilType;
use crate::layer::SoilLayer;
use crate::Result;

/// A numerical layer through which waves are propagated.
///
/// Sub-layers are produced by [`crate::Profile::discretize`] and hold the
/// only mutable state of a computation: the strain-compatible shear modulus
/// and damping, plus the bookkeeping used to measure convergence. All other
/// fields are fixed for the realization.
#[derive(Debug, Clone)]
pub struct SubLayer {
    thickness: f64,
    /// Depth to the top of the sub-layer
    depth: f64,
    /// Total vertical stress at the middle of the sub-layer
    v_total_stress: f64,
    soil_type: Arc<SoilType>,

    density: f64,
    initial_shear_vel: f64,
    initial_shear_mod: f64,
    initial_damping: f64,

    // Strain-dependent state, reset between motions
    eff_strain: f64,
    max_strain: f64,
    shear_mod: f64,
    norm_shear_mod: f64,
    shear_vel: f64,
    damping: f64,
    old_shear_mod: f64,
    old_damping: f64,
    shear_mod_error: f64,
    damping_error: f64,
}

impl SubLayer {
    pub fn new(
        thickness: f64,
        depth: f64,
        v_total_stress: f64,
        layer: &SoilLayer,
        units: UnitSystem,
    ) -> Result<Self> {
        let density = layer.density(units);
        let shear_vel = layer.shear_vel();
        let shear_mod = density * shear_vel * shear_vel;
        let (_, damping) = layer.soil_type().interp(0.0)?;

        let mut sublayer = Self {
            thickness,
            depth,
            v_total_stress,
            soil_type: Arc::clone(layer.soil_type()),
            density,
            initial_shear_vel: shear_vel,
            initial_shear_mod: shear_mod,
            initial_damping: damping,
            eff_strain: 0.0,
            max_strain: 0.0,
            shear_mod,
            norm_shear_mod: 1.0,
            shear_vel,
            damping,
            old_shear_mod: shear_mod,
            old_damping: damping,
            shear_mod_error: 0.0,
            damping_error: 0.0,
        };
        sublayer.reset();

        Ok(sublayer)
    }

    /// Restore the strain-dependent state to the initial small-strain values.
    pub fn reset(&mut self) {
        self.eff_strain = 0.0;
        self.max_strain = 0.0;
        self.shear_mod = self.initial_shear_mod;
        self.norm_shear_mod = 1.0;
        self.shear_vel = self.initial_shear_vel;
        self.damping = self.initial_damping;
        self.old_shear_mod = self.initial_shear_mod;
        self.old_damping = self.initial_damping;
        self.shear_mod_error = 0.0;
        self.damping_error = 0.0;
    }

    pub fn soil_type_name(&self) -> &str {
        &self.soil_type.name
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Depth to the top of the sub-layer.
    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn depth_to_mid(&self) -> f64 {
        self.depth + self.thickness / 2.0
    }

    pub fn depth_to_base(&self) -> f64 {
        self.depth + self.thickness
    }

    pub fn unit_weight(&self) -> f64 {
        self.soil_type.unit_weight
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn v_total_stress(&self) -> f64 {
        self.v_total_stress
    }

    /// Total vertical stress at a fraction of the sub-layer height, 0 at
    /// the top and 1 at the base.
    pub fn v_total_stress_at(&self, fraction: f64) -> f64 {
        let at_top = self.v_total_stress - self.unit_weight() * self.thickness / 2.0;
        at_top + self.unit_weight() * self.thickness * fraction
    }

    /// Effective strain in percent.
    pub fn eff_strain(&self) -> f64 {
        self.eff_strain
    }

    /// Maximum strain in percent.
    pub fn max_strain(&self) -> f64 {
        self.max_strain
    }

    /// Shear-wave velocity corrected for strain.
    pub fn shear_vel(&self) -> f64 {
        self.shear_vel
    }

    /// Shear modulus corrected for strain.
    pub fn shear_mod(&self) -> f64 {
        self.shear_mod
    }

    pub fn norm_shear_mod(&self) -> f64 {
        self.norm_shear_mod
    }

    /// Damping in percent, corrected for strain.
    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn initial_shear_vel(&self) -> f64 {
        self.initial_shear_vel
    }

    pub fn initial_shear_mod(&self) -> f64 {
        self.initial_shear_mod
    }

    /// Maximum shear stress in the sub-layer.
    pub fn shear_stress(&self) -> f64 {
        self.shear_mod * self.max_strain / 100.0
    }

    /// Ratio of maximum shear stress to vertical total stress.
    pub fn stress_ratio(&self) -> f64 {
        self.shear_stress() / self.v_total_stress
    }

    /// Interpolate the soil curves at a strain in percent.
    ///
    /// Returns the strain-compatible shear modulus (not normalized) and the
    /// damping in percent.
    pub fn interp(&self, strain: f64) -> Result<(f64, f64)> {
        let (norm_mod, damping) = self.soil_type.interp(strain)?;
        Ok((norm_mod * self.initial_shear_mod, damping))
    }

    /// Seed the properties from an initial strain estimate, in percent.
    ///
    /// The previous-iteration values follow the seeded properties so the
    /// first iteration error measures against this estimate.
    pub fn set_initial_strain(&mut self, strain: f64) -> Result<()> {
        self.eff_strain = strain;

        let (norm_mod, damping) = self.soil_type.interp(strain)?;
        self.norm_shear_mod = norm_mod;
        self.shear_mod = norm_mod * self.initial_shear_mod;
        self.shear_vel = (self.shear_mod / self.density).sqrt();
        self.damping = damping;
        self.old_shear_mod = self.shear_mod;
        self.old_damping = self.damping;
        self.shear_mod_error = 0.0;
        self.damping_error = 0.0;

        Ok(())
    }

    /// Update the properties for a new effective strain and record the
    /// relative change from the previous iteration in percent.
    pub fn set_strain(&mut self, eff_strain: f64, max_strain: f64) -> Result<()> {
        self.eff_strain = eff_strain;
        self.max_strain = max_strain;

        self.old_shear_mod = self.shear_mod;
        self.old_damping = self.damping;

        let (norm_mod, damping) = self.soil_type.interp(eff_strain)?;
        self.norm_shear_mod = norm_mod;
        self.shear_mod = norm_mod * self.initial_shear_mod;
        self.shear_vel = (self.shear_mod / self.density).sqrt();
        self.damping = damping;

        self.shear_mod_error =
            100.0 * (self.shear_mod - self.old_shear_mod).abs() / self.old_shear_mod;
        self.damping_error = 100.0 * (self.damping - self.old_damping).abs() / self.old_damping;

        Ok(())
    }

    pub fn shear_mod_error(&self) -> f64 {
        self.shear_mod_error
    }

    pub fn damping_error(&self) -> f64 {
        self.damping_error
    }

    /// Largest of the modulus and damping errors, in percent.
    pub fn error(&self) -> f64 {
        self.shear_mod_error.max(self.damping_error)
    }
}
