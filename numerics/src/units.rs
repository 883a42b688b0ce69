//! Unit system carried by value through the engine
//!
//! Accelerations are always expressed in g. Velocities and displacements use
//! cm/s and cm (metric) or in/s and in (english); lengths and shear-wave
//! velocities use m or ft; stresses use kPa or psf. The gravity value below
//! is the single source for every unit conversion in the engine; there is no
//! process-wide unit state.

use serde::{Deserialize, Serialize};

/// System of units for a complete analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    Metric,
    English,
}

impl UnitSystem {
    /// Gravitational acceleration in length units per second squared
    /// (m/s² or ft/s²).
    pub fn gravity(&self) -> f64 {
        match self {
            UnitSystem::Metric => 9.80665,
            UnitSystem::English => 32.174,
        }
    }

    /// Conversion from an acceleration in g to the time-series units of the
    /// system (cm/s² or in/s²).
    pub fn ts_conv(&self) -> f64 {
        match self {
            UnitSystem::Metric => 100.0 * self.gravity(),
            UnitSystem::English => 12.0 * self.gravity(),
        }
    }

    /// Unit weight of water (kN/m³ or pcf).
    pub fn water_unit_weight(&self) -> f64 {
        match self {
            UnitSystem::Metric => 9.81,
            UnitSystem::English => 62.4,
        }
    }

    pub fn length_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::English => "ft",
        }
    }

    pub fn accel_label(&self) -> &'static str {
        "g"
    }

    pub fn vel_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "cm/s",
            UnitSystem::English => "in/s",
        }
    }

    pub fn disp_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "cm",
            UnitSystem::English => "in",
        }
    }

    pub fn vel_time_series_label(&self) -> &'static str {
        self.vel_label()
    }

    pub fn unit_weight_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "kN/m³",
            UnitSystem::English => "pcf",
        }
    }

    pub fn stress_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "kPa",
            UnitSystem::English => "psf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_metric_conversions() {
        let units = UnitSystem::Metric;
        assert_relative_eq!(units.gravity(), 9.80665);
        assert_relative_eq!(units.ts_conv(), 980.665);
    }

    #[test]
    fn test_english_conversions() {
        let units = UnitSystem::English;
        assert_relative_eq!(units.ts_conv(), 12.0 * 32.174);
        assert_eq!(units.vel_label(), "in/s");
    }
}
