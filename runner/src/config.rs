//! Project documents consumed by the batch runner

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use shearwave_motion::{load_accel, MotionLayout, MotionType, TimeSeriesMotion};
use shearwave_numerics::UnitSystem;
use shearwave_outputs::{OutputCatalog, OutputKind, OutputSettings};
use shearwave_profile::{Bedrock, Profile, SoilLayer, SoilType};
use shearwave_solver::{IterationMode, SiteResponseCalculator};

use crate::{Result, RunnerError};

/// The calculator section of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorConfig {
    #[serde(flatten)]
    pub mode: IterationMode,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_error_tolerance")]
    pub error_tolerance: f64,
}

fn default_max_iterations() -> usize {
    shearwave_solver::calculator::DEFAULT_MAX_ITERATIONS
}

fn default_error_tolerance() -> f64 {
    shearwave_solver::calculator::DEFAULT_ERROR_TOLERANCE
}

impl CalculatorConfig {
    pub fn build(&self) -> SiteResponseCalculator {
        let mut calc = SiteResponseCalculator::new(self.mode);
        calc.set_max_iterations(self.max_iterations);
        calc.set_error_tolerance(self.error_tolerance);
        calc
    }
}

/// One soil layer of the column, referencing a soil type by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    pub soil_type: String,
    pub thickness: f64,
    pub shear_vel: f64,
}

/// The elastic half-space below the column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockConfig {
    pub unit_weight: f64,
    pub shear_vel: f64,
    pub damping: f64,
}

/// The site section of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    pub soil_types: Vec<SoilType>,
    pub layers: Vec<LayerConfig>,
    pub bedrock: BedrockConfig,
    /// Depth where the motion is applied; negative selects the bedrock
    #[serde(default = "default_input_depth")]
    pub input_depth: f64,
    #[serde(default = "default_max_freq")]
    pub max_freq: f64,
    #[serde(default = "default_wave_fraction")]
    pub wave_fraction: f64,
    #[serde(default)]
    pub disable_auto_discretization: bool,
}

fn default_input_depth() -> f64 {
    -1.0
}

fn default_max_freq() -> f64 {
    20.0
}

fn default_wave_fraction() -> f64 {
    0.20
}

impl ProfileConfig {
    pub fn build(&self, units: UnitSystem) -> Result<Profile> {
        let types: Vec<Arc<SoilType>> = self.soil_types.iter().cloned().map(Arc::new).collect();

        let mut layers = Vec::with_capacity(self.layers.len());
        for (index, layer) in self.layers.iter().enumerate() {
            let soil_type = types
                .iter()
                .find(|t| t.name == layer.soil_type)
                .ok_or_else(|| RunnerError::UnknownSoilType {
                    name: layer.soil_type.clone(),
                    layer: index,
                })?;

            layers.push(SoilLayer::new(
                Arc::clone(soil_type),
                layer.thickness,
                layer.shear_vel,
            ));
        }

        let bedrock = Bedrock::new(
            self.bedrock.unit_weight,
            self.bedrock.shear_vel,
            self.bedrock.damping,
        );

        let mut profile = Profile::new(units, layers, bedrock)?;
        profile.set_input_depth(self.input_depth);
        profile.set_max_freq(self.max_freq);
        profile.set_wave_fraction(self.wave_fraction);
        profile.set_disable_auto_discretization(self.disable_auto_discretization);

        Ok(profile)
    }
}

/// One input motion: a file path plus its layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionConfig {
    pub path: PathBuf,
    #[serde(flatten)]
    pub layout: MotionLayout,
    #[serde(rename = "type", default)]
    pub mtype: MotionType,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl MotionConfig {
    /// Load the motion, resolving a relative path against `base`.
    pub fn load(&self, base: &Path, units: UnitSystem) -> Result<TimeSeriesMotion> {
        let path = if self.path.is_absolute() {
            self.path.clone()
        } else {
            base.join(&self.path)
        };

        let accel = load_accel(&path, &self.layout)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "motion".to_string());

        Ok(TimeSeriesMotion::from_accel(
            name,
            accel,
            self.layout.time_step,
            self.mtype,
            units,
        )?)
    }
}

/// A complete project document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub units: UnitSystem,
    pub calculator: CalculatorConfig,
    pub profile: ProfileConfig,
    pub motions: Vec<MotionConfig>,
    #[serde(default)]
    pub outputs: Vec<OutputKind>,
    #[serde(default)]
    pub output_settings: OutputSettings,
    /// Number of site realizations
    #[serde(default = "default_site_count")]
    pub site_count: usize,
    /// Exclude non-converged results from the statistics
    #[serde(default)]
    pub only_converged: bool,
}

fn default_site_count() -> usize {
    1
}

impl ProjectConfig {
    /// Parse a project from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn build_catalog(&self) -> OutputCatalog {
        OutputCatalog::new(self.outputs.clone(), self.output_settings.clone())
    }

    /// Load every enabled motion, resolving paths against `base`.
    pub fn load_motions(&self, base: &Path) -> Result<Vec<TimeSeriesMotion>> {
        self.motions
            .iter()
            .filter(|m| m.enabled)
            .map(|m| m.load(base, self.units))
            .collect()
    }
}
