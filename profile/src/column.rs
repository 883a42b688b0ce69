//! The discretized soil column

use log::debug;
use shearwave_numerics::UnitSystem;

use crate::layer::{Bedrock, SoilLayer};
use crate::location::Location;
use crate::sublayer::SubLayer;
use crate::{ProfileError, Result};

const DEFAULT_MAX_FREQ: f64 = 20.0;
const DEFAULT_WAVE_FRACTION: f64 = 0.20;

/// A layered soil column over an elastic half-space.
///
/// Owns the sub-layer sequence produced by [`Profile::discretize`]. The
/// convenience accessors taking a layer index treat the index equal to the
/// sub-layer count as the bedrock, so the propagation loops can address the
/// whole column uniformly.
#[derive(Debug, Clone)]
pub struct Profile {
    units: UnitSystem,
    soil_layers: Vec<SoilLayer>,
    bedrock: Bedrock,
    sub_layers: Vec<SubLayer>,

    /// Depth where the input motion is applied; negative selects the bedrock
    input_depth: f64,
    /// Highest frequency the discretization must resolve (Hz)
    max_freq: f64,
    /// Fraction of the shortest wavelength allowed per sub-layer
    wave_fraction: f64,
    /// Keep one sub-layer per soil layer instead of subdividing
    disable_auto_discretization: bool,
}

impl Profile {
    pub fn new(units: UnitSystem, soil_layers: Vec<SoilLayer>, bedrock: Bedrock) -> Result<Self> {
        if soil_layers.is_empty() {
            return Err(ProfileError::NoSoilLayers);
        }

        for (index, layer) in soil_layers.iter().enumerate() {
            if layer.thickness() <= 0.0 {
                return Err(ProfileError::InvalidThickness {
                    index,
                    thickness: layer.thickness(),
                });
            }
            if layer.shear_vel() <= 0.0 {
                return Err(ProfileError::InvalidVelocity {
                    index,
                    velocity: layer.shear_vel(),
                });
            }
        }

        Ok(Self {
            units,
            soil_layers,
            bedrock,
            sub_layers: Vec::new(),
            input_depth: -1.0,
            max_freq: DEFAULT_MAX_FREQ,
            wave_fraction: DEFAULT_WAVE_FRACTION,
            disable_auto_discretization: false,
        })
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    pub fn soil_layers(&self) -> &[SoilLayer] {
        &self.soil_layers
    }

    pub fn bedrock(&self) -> &Bedrock {
        &self.bedrock
    }

    pub fn set_input_depth(&mut self, depth: f64) {
        self.input_depth = depth;
    }

    pub fn set_max_freq(&mut self, max_freq: f64) {
        self.max_freq = max_freq;
    }

    pub fn set_wave_fraction(&mut self, wave_fraction: f64) {
        self.wave_fraction = wave_fraction;
    }

    pub fn set_disable_auto_discretization(&mut self, disable: bool) {
        self.disable_auto_discretization = disable;
    }

    /// Build the sub-layer sequence.
    ///
    /// Each soil layer is split into sub-layers no thicker than
    /// `wave_fraction * Vs / max_freq`, so the column resolves vertically
    /// propagating waves up to `max_freq`. Vertical total stress is
    /// accumulated to the middle of every sub-layer.
    pub fn discretize(&mut self) -> Result<()> {
        self.sub_layers.clear();

        let mut depth = 0.0;
        let mut stress = 0.0;

        for layer in &self.soil_layers {
            let count = if self.disable_auto_discretization {
                1
            } else {
                let target = self.wave_fraction * layer.shear_vel() / self.max_freq;
                (layer.thickness() / target).ceil().max(1.0) as usize
            };

            let thickness = layer.thickness() / count as f64;

            for _ in 0..count {
                let mid_stress = stress + layer.unit_weight() * thickness / 2.0;
                self.sub_layers
                    .push(SubLayer::new(thickness, depth, mid_stress, layer, self.units)?);

                depth += thickness;
                stress += layer.unit_weight() * thickness;
            }
        }

        debug!(
            "discretized {} soil layers into {} sub-layers to {:.1} {}",
            self.soil_layers.len(),
            self.sub_layers.len(),
            depth,
            self.units.length_label()
        );

        Ok(())
    }

    /// Restore every sub-layer to its small-strain state.
    pub fn reset_sub_layers(&mut self) {
        for sublayer in &mut self.sub_layers {
            sublayer.reset();
        }
    }

    pub fn sub_layers(&self) -> &[SubLayer] {
        &self.sub_layers
    }

    pub fn sub_layers_mut(&mut self) -> &mut [SubLayer] {
        &mut self.sub_layers
    }

    pub fn sub_layer_count(&self) -> usize {
        self.sub_layers.len()
    }

    /// Total depth to the bedrock surface.
    pub fn depth_to_bedrock(&self) -> f64 {
        self.sub_layers
            .last()
            .map(|sublayer| sublayer.depth_to_base())
            .unwrap_or(0.0)
    }

    /// Where the input motion is applied: the configured depth, or the
    /// bedrock when the depth is negative.
    pub fn input_location(&self) -> Location {
        if self.input_depth < 0.0 {
            Location::new(self.sub_layer_count(), 0.0)
        } else {
            self.depth_to_location(self.input_depth)
        }
    }

    /// Map a depth below the surface to a location in the column.
    ///
    /// Depths at or below the bedrock surface return the bedrock sentinel.
    pub fn depth_to_location(&self, depth: f64) -> Location {
        if depth >= self.depth_to_bedrock() {
            return Location::new(self.sub_layer_count(), 0.0);
        }

        let index = self
            .sub_layers
            .partition_point(|sublayer| sublayer.depth_to_base() <= depth)
            .min(self.sub_layer_count().saturating_sub(1));

        Location::new(index, depth - self.sub_layers[index].depth())
    }

    // Uniform accessors over sub-layers and bedrock. The index equal to the
    // sub-layer count addresses the bedrock.

    pub fn density(&self, layer: usize) -> f64 {
        if layer < self.sub_layer_count() {
            self.sub_layers[layer].density()
        } else {
            self.bedrock.density(self.units)
        }
    }

    pub fn shear_vel(&self, layer: usize) -> f64 {
        if layer < self.sub_layer_count() {
            self.sub_layers[layer].shear_vel()
        } else {
            self.bedrock.shear_vel()
        }
    }

    pub fn shear_mod(&self, layer: usize) -> f64 {
        if layer < self.sub_layer_count() {
            self.sub_layers[layer].shear_mod()
        } else {
            self.bedrock.shear_mod(self.units)
        }
    }

    /// Damping in percent.
    pub fn damping(&self, layer: usize) -> f64 {
        if layer < self.sub_layer_count() {
            self.sub_layers[layer].damping()
        } else {
            self.bedrock.damping()
        }
    }

    pub fn thickness(&self, layer: usize) -> f64 {
        if layer < self.sub_layer_count() {
            self.sub_layers[layer].thickness()
        } else {
            0.0
        }
    }

    // Profile vectors consumed by the output extractors.

    /// Depths to the sub-layer tops plus the bedrock surface.
    pub fn depth_profile(&self) -> Vec<f64> {
        let mut depths: Vec<f64> = self.sub_layers.iter().map(|sl| sl.depth()).collect();
        depths.push(self.depth_to_bedrock());
        depths
    }

    /// Depths to the sub-layer mid-heights.
    pub fn depth_to_mid_profile(&self) -> Vec<f64> {
        self.sub_layers.iter().map(|sl| sl.depth_to_mid()).collect()
    }

    pub fn initial_velocity_profile(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .sub_layers
            .iter()
            .map(|sl| sl.initial_shear_vel())
            .collect();
        values.push(self.bedrock.shear_vel());
        values
    }

    pub fn final_velocity_profile(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.sub_layers.iter().map(|sl| sl.shear_vel()).collect();
        values.push(self.bedrock.shear_vel());
        values
    }

    pub fn modulus_profile(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.sub_layers.iter().map(|sl| sl.shear_mod()).collect();
        values.push(self.bedrock.shear_mod(self.units));
        values
    }

    /// Damping profile in percent.
    pub fn damping_profile(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.sub_layers.iter().map(|sl| sl.damping()).collect();
        values.push(self.bedrock.damping());
        values
    }

    pub fn max_shear_strain_profile(&self) -> Vec<f64> {
        self.sub_layers.iter().map(|sl| sl.max_strain()).collect()
    }

    pub fn max_shear_stress_profile(&self) -> Vec<f64> {
        self.sub_layers.iter().map(|sl| sl.shear_stress()).collect()
    }

    pub fn stress_ratio_profile(&self) -> Vec<f64> {
        self.sub_layers.iter().map(|sl| sl.stress_ratio()).collect()
    }

    pub fn vertical_total_stress_profile(&self) -> Vec<f64> {
        self.sub_layers
            .iter()
            .map(|sl| sl.v_total_stress())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::SoilType;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn two_layer_profile() -> Profile {
        let soft = Arc::new(SoilType::linear_elastic("soft clay", 16.0, 5.0));
        let stiff = Arc::new(SoilType::linear_elastic("dense sand", 19.0, 2.0));

        Profile::new(
            UnitSystem::Metric,
            vec![
                SoilLayer::new(soft, 10.0, 200.0),
                SoilLayer::new(stiff, 10.0, 400.0),
            ],
            Bedrock::new(23.0, 1500.0, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_requires_layers() {
        let bedrock = Bedrock::new(23.0, 1500.0, 1.0);
        assert!(matches!(
            Profile::new(UnitSystem::Metric, vec![], bedrock),
            Err(ProfileError::NoSoilLayers)
        ));
    }

    #[test]
    fn test_discretization_thickness_limit() {
        let mut profile = two_layer_profile();
        profile.discretize().unwrap();

        // wave_fraction * vs / max_freq = 0.2 * 200 / 20 = 2 m for the top layer
        for sublayer in profile.sub_layers() {
            let limit = 0.2 * sublayer.initial_shear_vel() / 20.0;
            assert!(sublayer.thickness() <= limit + 1e-9);
        }
        assert_relative_eq!(profile.depth_to_bedrock(), 20.0, max_relative = 1e-12);
    }

    #[test]
    fn test_disable_auto_discretization() {
        let mut profile = two_layer_profile();
        profile.set_disable_auto_discretization(true);
        profile.discretize().unwrap();
        assert_eq!(profile.sub_layer_count(), 2);
    }

    #[test]
    fn test_depth_to_location() {
        let mut profile = two_layer_profile();
        profile.set_disable_auto_discretization(true);
        profile.discretize().unwrap();

        let loc = profile.depth_to_location(12.5);
        assert_eq!(loc.layer(), 1);
        assert_relative_eq!(loc.depth(), 2.5);

        // Below the column lands on the bedrock sentinel
        let deep = profile.depth_to_location(100.0);
        assert_eq!(deep.layer(), 2);
        assert_relative_eq!(deep.depth(), 0.0);
    }

    #[test]
    fn test_bedrock_accessors() {
        let mut profile = two_layer_profile();
        profile.set_disable_auto_discretization(true);
        profile.discretize().unwrap();

        let n = profile.sub_layer_count();
        assert_relative_eq!(profile.shear_vel(n), 1500.0);
        assert_relative_eq!(profile.damping(n), 1.0);
        assert_relative_eq!(profile.density(n), 23.0 / 9.80665);
    }

    #[test]
    fn test_total_stress_accumulates() {
        let mut profile = two_layer_profile();
        profile.set_disable_auto_discretization(true);
        profile.discretize().unwrap();

        let sub_layers = profile.sub_layers();
        assert_relative_eq!(sub_layers[0].v_total_stress(), 16.0 * 5.0);
        assert_relative_eq!(sub_layers[1].v_total_stress(), 16.0 * 10.0 + 19.0 * 5.0);
    }

    #[test]
    fn test_input_location_defaults_to_bedrock() {
        let mut profile = two_layer_profile();
        profile.discretize().unwrap();
        let loc = profile.input_location();
        assert_eq!(loc.layer(), profile.sub_layer_count());
    }
}
