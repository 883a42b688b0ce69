//! Iteration drivers for strain-compatible soil properties

use log::{debug, info, trace};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use shearwave_numerics::{complex_shear_modulus, fit_two_parameter};
use shearwave_motion::TimeSeriesMotion;
use shearwave_profile::{Location, Profile};

use crate::field::WaveField;
use crate::{CancelToken, Result, SolverError};

/// Default number of property-update iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;
/// Default convergence tolerance on the property change, in percent.
pub const DEFAULT_ERROR_TOLERANCE: f64 = 2.0;
/// Default ratio of effective to peak strain for the equivalent-linear mode.
pub const DEFAULT_STRAIN_RATIO: f64 = 0.65;

/// How strain-compatible properties are derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum IterationMode {
    /// Initial properties throughout; a single propagation pass
    LinearElastic,
    /// One modulus and damping per layer, from the effective strain
    EquivalentLinear {
        #[serde(default = "default_strain_ratio")]
        strain_ratio: f64,
    },
    /// Modulus and damping per layer and per frequency, from the shape of
    /// the strain spectrum
    FrequencyDependent {
        #[serde(default)]
        use_smooth_spectrum: bool,
    },
}

fn default_strain_ratio() -> f64 {
    DEFAULT_STRAIN_RATIO
}

impl IterationMode {
    pub fn name(&self) -> &'static str {
        match self {
            IterationMode::LinearElastic => "linear elastic",
            IterationMode::EquivalentLinear { .. } => "EQL",
            IterationMode::FrequencyDependent { .. } => "EQL-FDM",
        }
    }
}

/// Outcome of one (site, motion) computation.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub converged: bool,
    pub iterations: usize,
    /// Largest per-layer property change of the final iteration, in percent
    pub max_error: f64,
}

/// Drives the wave field until soil properties and strains agree.
///
/// One calculator serves any number of (site, motion) pairs in sequence;
/// [`SiteResponseCalculator::run`] leaves the profile's sub-layers carrying
/// strain-compatible properties and the wave field valid for extraction.
#[derive(Debug)]
pub struct SiteResponseCalculator {
    mode: IterationMode,
    max_iterations: usize,
    error_tolerance: f64,
    field: WaveField,
    summary: RunSummary,
}

impl SiteResponseCalculator {
    pub fn new(mode: IterationMode) -> Self {
        Self {
            mode,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            error_tolerance: DEFAULT_ERROR_TOLERANCE,
            field: WaveField::new(0, 0),
            summary: RunSummary {
                converged: false,
                iterations: 0,
                max_error: 0.0,
            },
        }
    }

    pub fn mode(&self) -> IterationMode {
        self.mode
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    pub fn error_tolerance(&self) -> f64 {
        self.error_tolerance
    }

    pub fn set_error_tolerance(&mut self, error_tolerance: f64) {
        self.error_tolerance = error_tolerance;
    }

    /// The wave field of the most recent run.
    pub fn field(&self) -> &WaveField {
        &self.field
    }

    /// Summary of the most recent run.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Peak acceleration at the free surface for the converged field, in g.
    pub fn surface_pga(&self, motion: &TimeSeriesMotion, profile: &Profile) -> Result<f64> {
        let tf = self.field.accel_tf(
            &profile.input_location(),
            motion.motion_type(),
            &Location::surface(),
            shearwave_motion::MotionType::Outcrop,
        );
        Ok(motion.max(Some(&tf))?)
    }

    /// Compute strain-compatible properties for one (site, motion) pair.
    ///
    /// On success the profile's sub-layers hold the final properties and
    /// [`SiteResponseCalculator::field`] is valid. A propagation failure or
    /// cancellation leaves the profile in an intermediate state; the caller
    /// resets the sub-layers between pairs.
    pub fn run(
        &mut self,
        motion: &TimeSeriesMotion,
        profile: &mut Profile,
        cancel: &CancelToken,
    ) -> Result<RunSummary> {
        if profile.sub_layer_count() == 0 {
            return Err(SolverError::NotDiscretized);
        }

        let nsl = profile.sub_layer_count();
        self.field = WaveField::new(nsl, motion.freq_count());
        self.summary = RunSummary {
            converged: false,
            iterations: 0,
            max_error: 0.0,
        };

        // Bedrock properties do not change during the process; its modulus
        // is constant over the frequency range.
        self.field.fill_layer_modulus(
            nsl,
            complex_shear_modulus(
                profile.bedrock().shear_mod(profile.units()),
                profile.bedrock().damping() / 100.0,
            ),
        );

        match self.mode {
            IterationMode::LinearElastic => self.run_linear_elastic(motion, profile),
            IterationMode::EquivalentLinear { .. } | IterationMode::FrequencyDependent { .. } => {
                self.run_iterative(motion, profile, cancel)
            }
        }
    }

    fn run_linear_elastic(
        &mut self,
        motion: &TimeSeriesMotion,
        profile: &mut Profile,
    ) -> Result<RunSummary> {
        info!("computing wave propagation using the linear elastic method");

        for i in 0..profile.sub_layer_count() {
            self.field.fill_layer_modulus(
                i,
                complex_shear_modulus(profile.shear_mod(i), profile.damping(i) / 100.0),
            );
        }

        self.field.calc_waves(profile, motion)?;
        self.summary = RunSummary {
            converged: true,
            iterations: 1,
            max_error: 0.0,
        };

        Ok(self.summary)
    }

    fn run_iterative(
        &mut self,
        motion: &TimeSeriesMotion,
        profile: &mut Profile,
        cancel: &CancelToken,
    ) -> Result<RunSummary> {
        self.estimate_initial_strains(motion, profile, cancel)?;

        info!(
            "computing wave propagation using the {} method",
            self.mode.name()
        );

        let nsl = profile.sub_layer_count();
        let input_location = profile.input_location();
        let mut iter = 0;
        let mut max_error = 0.0;

        loop {
            if cancel.is_cancelled() {
                return Err(SolverError::Cancelled);
            }

            self.field.calc_waves(profile, motion)?;

            for i in 0..nsl {
                let mid = Location::new(i, profile.sub_layers()[i].thickness() / 2.0);
                let strain_tf =
                    self.field
                        .strain_tf(profile, &input_location, motion.motion_type(), &mid);

                self.update_sub_layer(i, &strain_tf, motion, profile)?;

                let error = profile.sub_layers()[i].error();
                if i == 0 || max_error < error {
                    max_error = error;
                }

                if cancel.is_cancelled() {
                    return Err(SolverError::Cancelled);
                }
            }

            iter += 1;
            debug!("iteration {}: maximum error {:.2} %", iter, max_error);
            trace!("{}", sub_layer_table(profile));

            if max_error <= self.error_tolerance || iter >= self.max_iterations {
                break;
            }
        }

        let converged = !(iter == self.max_iterations && max_error > self.error_tolerance);
        if !converged {
            info!(
                "maximum number of iterations reached ({}), maximum error {:.2} %",
                iter, max_error
            );
        }

        self.summary = RunSummary {
            converged,
            iterations: iter,
            max_error,
        };

        Ok(self.summary)
    }

    fn estimate_initial_strains(
        &mut self,
        motion: &TimeSeriesMotion,
        profile: &mut Profile,
        cancel: &CancelToken,
    ) -> Result<()> {
        match self.mode {
            IterationMode::LinearElastic => {}
            IterationMode::EquivalentLinear { .. } => {
                debug!("estimating strains from pgv and shear velocity");

                // The quotient of pgv in cm/s (or in/s) over Vs in m/s (or
                // ft/s) lands in percent strain, the unit of the curves.
                for sublayer in profile.sub_layers_mut() {
                    let strain = motion.pgv() / sublayer.shear_vel();
                    sublayer.set_initial_strain(strain)?;
                }
            }
            IterationMode::FrequencyDependent { .. } => {
                debug!("estimating strains with an equivalent linear pass");

                let mut eql = SiteResponseCalculator::new(IterationMode::EquivalentLinear {
                    strain_ratio: DEFAULT_STRAIN_RATIO,
                });
                eql.set_max_iterations(self.max_iterations);
                eql.run(motion, profile, cancel)?;

                for sublayer in profile.sub_layers_mut() {
                    let strain = sublayer.eff_strain();
                    sublayer.set_initial_strain(strain)?;
                }
            }
        }

        // Frequency independent moduli from the estimated strains
        for i in 0..profile.sub_layer_count() {
            self.field.fill_layer_modulus(
                i,
                complex_shear_modulus(profile.shear_mod(i), profile.damping(i) / 100.0),
            );
        }

        Ok(())
    }

    fn update_sub_layer(
        &mut self,
        index: usize,
        strain_tf: &[Complex64],
        motion: &TimeSeriesMotion,
        profile: &mut Profile,
    ) -> Result<()> {
        // Percent strain from the peak of the strain time series
        let strain_max = 100.0 * motion.calc_max_strain(strain_tf)?;
        if strain_max <= 0.0 {
            return Err(SolverError::ZeroStrain { layer: index });
        }

        match self.mode {
            IterationMode::LinearElastic => Ok(()),
            IterationMode::EquivalentLinear { strain_ratio } => {
                let sublayer = &mut profile.sub_layers_mut()[index];
                sublayer.set_strain(strain_ratio * strain_max, strain_max)?;

                let modulus =
                    complex_shear_modulus(sublayer.shear_mod(), sublayer.damping() / 100.0);
                self.field.fill_layer_modulus(index, modulus);

                Ok(())
            }
            IterationMode::FrequencyDependent {
                use_smooth_spectrum,
            } => {
                profile.sub_layers_mut()[index].set_strain(strain_max, strain_max)?;

                let strain_fas = motion.abs_fourier_vel(Some(strain_tf))?;

                if use_smooth_spectrum {
                    self.update_smooth_spectrum(index, strain_max, &strain_fas, motion, profile)
                } else {
                    self.update_raw_spectrum(index, strain_max, &strain_fas, profile)
                }
            }
        }
    }

    /// Per-frequency moduli from the raw strain-spectrum shape.
    fn update_raw_spectrum(
        &mut self,
        index: usize,
        strain_max: f64,
        strain_fas: &[f64],
        profile: &Profile,
    ) -> Result<()> {
        let max_fas = strain_fas.iter().fold(0.0f64, |max, &v| max.max(v));
        let sublayer = &profile.sub_layers()[index];

        for (j, &fas) in strain_fas.iter().enumerate() {
            let strain = strain_max * fas / max_fas;
            let (shear_mod, damping) = sublayer.interp(strain)?;
            self.field
                .set_modulus(index, j, complex_shear_modulus(shear_mod, damping / 100.0));
        }

        Ok(())
    }

    /// Per-frequency moduli from the smoothed strain-spectrum model of
    /// Kausel and Assimaki (2002).
    fn update_smooth_spectrum(
        &mut self,
        index: usize,
        strain_max: f64,
        strain_fas: &[f64],
        motion: &TimeSeriesMotion,
        profile: &Profile,
    ) -> Result<()> {
        let freq = motion.freq();
        let nf = freq.len();

        // Mean frequency of the strain spectrum, by the trapezoid rule
        let mut numer = 0.0;
        let mut denom = 0.0;
        for i in 1..nf {
            let dfreq = freq[i] - freq[i - 1];
            numer += dfreq * (freq[i - 1] * strain_fas[i - 1] + freq[i] * strain_fas[i]) / 2.0;
            denom += dfreq * (strain_fas[i - 1] + strain_fas[i]) / 2.0;
        }
        let freq_avg = numer / denom;

        // Mean strain below the mean frequency
        let mut sum = 0.0;
        let mut offset = 1;
        while offset < nf - 1 && freq[offset] < freq_avg {
            let dfreq = freq[offset] - freq[offset - 1];
            sum += dfreq * (strain_fas[offset - 1] + strain_fas[offset]) / 2.0;
            offset += 1;
        }
        let strain_avg = sum / freq_avg;

        // Fit the two shape parameters above the mean frequency
        let model: Vec<[f64; 2]> = (offset..nf)
            .map(|i| [-freq[i] / freq_avg, -(freq[i] / freq_avg).ln()])
            .collect();
        let data: Vec<f64> = (offset..nf)
            .map(|i| (strain_fas[i] / strain_avg).ln())
            .collect();

        let (alpha, beta) = fit_two_parameter(&model, &data)?;

        let sublayer = &profile.sub_layers()[index];
        for j in 0..nf {
            // Slightly different from the published shape so the function
            // tapers smoothly to one near DC
            let ratio = freq[j] / freq_avg;
            let shape = ((-alpha * ratio).exp() / ratio.powf(beta)).min(1.0);
            let strain = strain_max * shape;

            let (shear_mod, damping) = sublayer.interp(strain)?;
            self.field
                .set_modulus(index, j, complex_shear_modulus(shear_mod, damping / 100.0));
        }

        Ok(())
    }
}

fn sub_layer_table(profile: &Profile) -> String {
    let mut table = String::from(
        "layer    depth  eff. strain  max strain    G/Gmax   damping\n",
    );
    for (i, sl) in profile.sub_layers().iter().enumerate() {
        table.push_str(&format!(
            "{:5} {:8.2} {:12.5} {:11.5} {:9.4} {:8.2} %\n",
            i,
            sl.depth(),
            sl.eff_strain(),
            sl.max_strain(),
            sl.norm_shear_mod(),
            sl.damping(),
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use shearwave_motion::MotionType;
    use shearwave_numerics::UnitSystem;
    use shearwave_profile::{Bedrock, NonlinearCurve, SoilLayer, SoilType};
    use std::sync::Arc;

    fn sine_motion() -> TimeSeriesMotion {
        let dt = 0.005;
        let accel: Vec<f64> = (0..2000)
            .map(|i| 0.1 * (2.0 * std::f64::consts::PI * 5.0 * i as f64 * dt).sin())
            .collect();
        TimeSeriesMotion::from_accel("sine", accel, dt, MotionType::Outcrop, UnitSystem::Metric)
            .unwrap()
    }

    fn nonlinear_profile() -> Profile {
        let soil = Arc::new(SoilType::new(
            "soft clay",
            18.0,
            NonlinearCurve::new(vec![1e-4, 1e-3, 1e-2, 1e-1, 1.0], vec![1.0, 0.95, 0.8, 0.5, 0.15]),
            NonlinearCurve::new(vec![1e-4, 1e-3, 1e-2, 1e-1, 1.0], vec![1.0, 1.5, 4.0, 10.0, 18.0]),
            0.5,
        ));
        let mut profile = Profile::new(
            UnitSystem::Metric,
            vec![SoilLayer::new(soil, 20.0, 200.0)],
            Bedrock::new(23.0, 1500.0, 1.0),
        )
        .unwrap();
        profile.discretize().unwrap();
        profile
    }

    #[test]
    fn test_linear_elastic_single_pass() {
        let motion = sine_motion();
        let mut profile = nonlinear_profile();
        let mut calc = SiteResponseCalculator::new(IterationMode::LinearElastic);

        let summary = calc.run(&motion, &mut profile, &CancelToken::new()).unwrap();
        assert!(summary.converged);
        assert_eq!(summary.iterations, 1);

        // Properties are untouched
        for sl in profile.sub_layers() {
            assert_relative_eq!(sl.shear_mod(), sl.initial_shear_mod());
        }
    }

    #[test]
    fn test_eql_converges_and_softens() {
        let motion = sine_motion();
        let mut profile = nonlinear_profile();
        let mut calc = SiteResponseCalculator::new(IterationMode::EquivalentLinear {
            strain_ratio: DEFAULT_STRAIN_RATIO,
        });

        let summary = calc.run(&motion, &mut profile, &CancelToken::new()).unwrap();
        assert!(summary.converged, "did not converge: {:?}", summary);
        assert!(summary.iterations <= DEFAULT_MAX_ITERATIONS);
        assert!(summary.max_error <= DEFAULT_ERROR_TOLERANCE);

        // Strained soil must be softer than its small-strain state
        for sl in profile.sub_layers() {
            assert!(sl.max_strain() > 0.0);
            assert!(sl.shear_mod() < sl.initial_shear_mod());
        }
    }

    #[test]
    fn test_cancel_before_start() {
        let motion = sine_motion();
        let mut profile = nonlinear_profile();
        let mut calc = SiteResponseCalculator::new(IterationMode::EquivalentLinear {
            strain_ratio: DEFAULT_STRAIN_RATIO,
        });

        let cancel = CancelToken::new();
        cancel.cancel();

        match calc.run(&motion, &mut profile, &cancel) {
            Err(SolverError::Cancelled) => {}
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_discretization() {
        let motion = sine_motion();
        let soil = Arc::new(SoilType::linear_elastic("sand", 18.0, 5.0));
        let mut profile = Profile::new(
            UnitSystem::Metric,
            vec![SoilLayer::new(soil, 10.0, 250.0)],
            Bedrock::new(23.0, 1200.0, 1.0),
        )
        .unwrap();

        let mut calc = SiteResponseCalculator::new(IterationMode::LinearElastic);
        assert!(matches!(
            calc.run(&motion, &mut profile, &CancelToken::new()),
            Err(SolverError::NotDiscretized)
        ));
    }

    #[test]
    fn test_fdm_raw_runs() {
        let motion = sine_motion();
        let mut profile = nonlinear_profile();
        let mut calc = SiteResponseCalculator::new(IterationMode::FrequencyDependent {
            use_smooth_spectrum: false,
        });

        let summary = calc.run(&motion, &mut profile, &CancelToken::new()).unwrap();
        assert!(summary.iterations >= 1);

        // The strain spectrum peaks near the 5 Hz excitation, so the layer
        // is softer there than at the quiet Nyquist end
        let excited = (5.0 * 2048.0 * 0.005) as usize;
        let at_peak = calc.field().modulus(0, excited);
        let at_nyquist = calc.field().modulus(0, motion.freq_count() - 1);
        assert!(at_peak.re < at_nyquist.re);
    }
}
