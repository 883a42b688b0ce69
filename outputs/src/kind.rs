//! Output kinds and their metadata

use serde::{Deserialize, Serialize};
use shearwave_motion::MotionType;

/// Reference axis an output is tabulated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceAxis {
    Depth,
    Frequency,
    Period,
    Time,
}

/// Distribution assumed when computing ensemble statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distribution {
    LogNormal,
    Normal,
}

/// One configured output of the computation.
///
/// Depths are measured from the surface; a negative depth addresses the
/// bedrock surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutputKind {
    // Profiles versus depth
    InitialVelProfile,
    FinalVelProfile,
    ModulusProfile,
    DampingProfile,
    MaxAccelProfile,
    MaxVelProfile,
    MaxDispProfile,
    MaxStrainProfile,
    MaxStressProfile,
    StressRatioProfile,
    VerticalTotalStressProfile,
    AriasIntensityProfile,
    DissipatedEnergyProfile,

    // Spectra and ratios at a location
    FourierSpectrum {
        depth: f64,
        #[serde(default)]
        mtype: MotionType,
    },
    ResponseSpectrum {
        depth: f64,
        #[serde(default)]
        mtype: MotionType,
    },
    SpectralRatio {
        in_depth: f64,
        #[serde(default)]
        in_type: MotionType,
        out_depth: f64,
        #[serde(default)]
        out_type: MotionType,
    },
    AccelTransferFunction {
        in_depth: f64,
        #[serde(default)]
        in_type: MotionType,
        out_depth: f64,
        #[serde(default)]
        out_type: MotionType,
    },
    StrainTransferFunction {
        in_depth: f64,
        #[serde(default)]
        in_type: MotionType,
        out_depth: f64,
    },

    // Time series at a location
    AccelTimeSeries {
        depth: f64,
        #[serde(default)]
        mtype: MotionType,
        #[serde(default)]
        baseline_correct: bool,
    },
    VelTimeSeries {
        depth: f64,
        #[serde(default)]
        mtype: MotionType,
        #[serde(default)]
        baseline_correct: bool,
    },
    DispTimeSeries {
        depth: f64,
        #[serde(default)]
        mtype: MotionType,
        #[serde(default)]
        baseline_correct: bool,
    },
    StrainTimeSeries {
        depth: f64,
        #[serde(default)]
        baseline_correct: bool,
    },
    StressTimeSeries {
        depth: f64,
        #[serde(default)]
        baseline_correct: bool,
    },
}

impl OutputKind {
    pub fn name(&self) -> &'static str {
        match self {
            OutputKind::InitialVelProfile => "Initial Shear-Wave Velocity Profile",
            OutputKind::FinalVelProfile => "Final Shear-Wave Velocity Profile",
            OutputKind::ModulusProfile => "Shear-Modulus Profile",
            OutputKind::DampingProfile => "Damping Profile",
            OutputKind::MaxAccelProfile => "Peak Ground Acceleration Profile",
            OutputKind::MaxVelProfile => "Peak Ground Velocity Profile",
            OutputKind::MaxDispProfile => "Peak Displacement Profile",
            OutputKind::MaxStrainProfile => "Maximum Shear-Strain Profile",
            OutputKind::MaxStressProfile => "Maximum Shear-Stress Profile",
            OutputKind::StressRatioProfile => "Stress Ratio Profile",
            OutputKind::VerticalTotalStressProfile => "Vertical Total Stress Profile",
            OutputKind::AriasIntensityProfile => "Arias Intensity Profile",
            OutputKind::DissipatedEnergyProfile => "Dissipated Energy Profile",
            OutputKind::FourierSpectrum { .. } => "Fourier Amplitude Spectrum",
            OutputKind::ResponseSpectrum { .. } => "Acceleration Response Spectrum",
            OutputKind::SpectralRatio { .. } => "Spectral Ratio",
            OutputKind::AccelTransferFunction { .. } => "Acceleration Transfer Function",
            OutputKind::StrainTransferFunction { .. } => "Strain Transfer Function",
            OutputKind::AccelTimeSeries { .. } => "Acceleration Time Series",
            OutputKind::VelTimeSeries { .. } => "Velocity Time Series",
            OutputKind::DispTimeSeries { .. } => "Displacement Time Series",
            OutputKind::StrainTimeSeries { .. } => "Shear-Strain Time Series",
            OutputKind::StressTimeSeries { .. } => "Shear-Stress Time Series",
        }
    }

    /// Short name used in output file names.
    pub fn short_name(&self) -> &'static str {
        match self {
            OutputKind::InitialVelProfile => "initialVs",
            OutputKind::FinalVelProfile => "finalVs",
            OutputKind::ModulusProfile => "modulus",
            OutputKind::DampingProfile => "damping",
            OutputKind::MaxAccelProfile => "pga",
            OutputKind::MaxVelProfile => "pgv",
            OutputKind::MaxDispProfile => "pgd",
            OutputKind::MaxStrainProfile => "strain",
            OutputKind::MaxStressProfile => "stress",
            OutputKind::StressRatioProfile => "stressRatio",
            OutputKind::VerticalTotalStressProfile => "vTotalStress",
            OutputKind::AriasIntensityProfile => "ariasIntensity",
            OutputKind::DissipatedEnergyProfile => "dissipatedEnergy",
            OutputKind::FourierSpectrum { .. } => "fas",
            OutputKind::ResponseSpectrum { .. } => "respSpec",
            OutputKind::SpectralRatio { .. } => "specRatio",
            OutputKind::AccelTransferFunction { .. } => "accelTf",
            OutputKind::StrainTransferFunction { .. } => "strainTf",
            OutputKind::AccelTimeSeries { .. } => "accelTs",
            OutputKind::VelTimeSeries { .. } => "velTs",
            OutputKind::DispTimeSeries { .. } => "dispTs",
            OutputKind::StrainTimeSeries { .. } => "strainTs",
            OutputKind::StressTimeSeries { .. } => "stressTs",
        }
    }

    pub fn ref_axis(&self) -> ReferenceAxis {
        match self {
            OutputKind::InitialVelProfile
            | OutputKind::FinalVelProfile
            | OutputKind::ModulusProfile
            | OutputKind::DampingProfile
            | OutputKind::MaxAccelProfile
            | OutputKind::MaxVelProfile
            | OutputKind::MaxDispProfile
            | OutputKind::MaxStrainProfile
            | OutputKind::MaxStressProfile
            | OutputKind::StressRatioProfile
            | OutputKind::VerticalTotalStressProfile
            | OutputKind::AriasIntensityProfile
            | OutputKind::DissipatedEnergyProfile => ReferenceAxis::Depth,
            OutputKind::FourierSpectrum { .. }
            | OutputKind::AccelTransferFunction { .. }
            | OutputKind::StrainTransferFunction { .. } => ReferenceAxis::Frequency,
            OutputKind::ResponseSpectrum { .. } | OutputKind::SpectralRatio { .. } => {
                ReferenceAxis::Period
            }
            OutputKind::AccelTimeSeries { .. }
            | OutputKind::VelTimeSeries { .. }
            | OutputKind::DispTimeSeries { .. }
            | OutputKind::StrainTimeSeries { .. }
            | OutputKind::StressTimeSeries { .. } => ReferenceAxis::Time,
        }
    }

    /// Whether the output can only be produced from a time-domain motion.
    pub fn time_series_only(&self) -> bool {
        matches!(
            self,
            OutputKind::AriasIntensityProfile
                | OutputKind::DissipatedEnergyProfile
                | OutputKind::AccelTimeSeries { .. }
                | OutputKind::VelTimeSeries { .. }
                | OutputKind::DispTimeSeries { .. }
                | OutputKind::StrainTimeSeries { .. }
                | OutputKind::StressTimeSeries { .. }
        )
    }

    /// Whether the output is the same for every motion of a site.
    pub fn motion_independent(&self) -> bool {
        matches!(
            self,
            OutputKind::InitialVelProfile | OutputKind::VerticalTotalStressProfile
        )
    }

    /// Distribution of the ensemble statistics; time series carry none.
    pub fn distribution(&self) -> Option<Distribution> {
        match self.ref_axis() {
            ReferenceAxis::Time => None,
            _ => match self {
                OutputKind::DampingProfile | OutputKind::StressRatioProfile => {
                    Some(Distribution::Normal)
                }
                _ => Some(Distribution::LogNormal),
            },
        }
    }
}
