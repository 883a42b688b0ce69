//! Soil layers and the bedrock half-space

use std::sync::Arc;

use shearwave_numerics::UnitSystem;

use crate::curves::SoilType;

/// One layer of the as-modeled soil column.
#[derive(Debug, Clone)]
pub struct SoilLayer {
    soil_type: Arc<SoilType>,
    thickness: f64,
    /// Small-strain shear-wave velocity (m/s or ft/s)
    shear_vel: f64,
}

impl SoilLayer {
    pub fn new(soil_type: Arc<SoilType>, thickness: f64, shear_vel: f64) -> Self {
        Self {
            soil_type,
            thickness,
            shear_vel,
        }
    }

    pub fn soil_type(&self) -> &Arc<SoilType> {
        &self.soil_type
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn shear_vel(&self) -> f64 {
        self.shear_vel
    }

    pub fn unit_weight(&self) -> f64 {
        self.soil_type.unit_weight
    }

    /// Mass density, unit weight over gravity.
    pub fn density(&self, units: UnitSystem) -> f64 {
        self.soil_type.unit_weight / units.gravity()
    }
}

/// The elastic half-space below the column.
///
/// Its shear modulus does not change with strain or frequency.
#[derive(Debug, Clone)]
pub struct Bedrock {
    unit_weight: f64,
    shear_vel: f64,
    /// Damping in percent
    damping: f64,
}

impl Bedrock {
    pub fn new(unit_weight: f64, shear_vel: f64, damping: f64) -> Self {
        Self {
            unit_weight,
            shear_vel,
            damping,
        }
    }

    pub fn unit_weight(&self) -> f64 {
        self.unit_weight
    }

    pub fn shear_vel(&self) -> f64 {
        self.shear_vel
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn density(&self, units: UnitSystem) -> f64 {
        self.unit_weight / units.gravity()
    }

    pub fn shear_mod(&self, units: UnitSystem) -> f64 {
        self.density(units) * self.shear_vel * self.shear_vel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bedrock_shear_mod() {
        let bedrock = Bedrock::new(23.0, 1500.0, 1.0);
        let units = UnitSystem::Metric;
        // G = rho Vs^2 with rho in Mg/m3 gives kPa
        assert_relative_eq!(
            bedrock.shear_mod(units),
            23.0 / 9.80665 * 1500.0 * 1500.0,
            max_relative = 1e-12
        );
    }
}
