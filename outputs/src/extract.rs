//! Stateless extraction of result vectors from a converged computation

use num_complex::Complex64;

use shearwave_motion::{MotionType, TimeSeriesKind, TimeSeriesMotion};
use shearwave_numerics::moving_average;
use shearwave_profile::{Location, Profile};
use shearwave_solver::SiteResponseCalculator;

use crate::catalog::OutputSettings;
use crate::kind::OutputKind;
use crate::Result;

/// Window used to knock FFT noise off spectral magnitudes.
const SMOOTHING_WINDOW: usize = 5;

/// Everything an extractor may read. Extractors never mutate the
/// calculator, profile, or motion.
pub struct ExtractContext<'a> {
    pub calc: &'a SiteResponseCalculator,
    pub motion: &'a TimeSeriesMotion,
    pub profile: &'a Profile,
    pub settings: &'a OutputSettings,
}

impl<'a> ExtractContext<'a> {
    /// Map a configured depth to a location; negative depths address the
    /// bedrock surface.
    fn locate(&self, depth: f64) -> Location {
        if depth < 0.0 {
            Location::new(self.profile.sub_layer_count(), 0.0)
        } else {
            self.profile.depth_to_location(depth)
        }
    }

    /// Acceleration transfer function from the input location to a depth.
    fn accel_tf_to(&self, depth: f64, mtype: MotionType) -> Vec<Complex64> {
        self.calc.field().accel_tf(
            &self.profile.input_location(),
            self.motion.motion_type(),
            &self.locate(depth),
            mtype,
        )
    }

    /// Strain transfer function from the input location to a depth.
    fn strain_tf_to(&self, depth: f64) -> Vec<Complex64> {
        self.calc.field().strain_tf(
            self.profile,
            &self.profile.input_location(),
            self.motion.motion_type(),
            &self.locate(depth),
        )
    }
}

/// Extract one output as a (reference, data) pair.
pub fn extract(kind: &OutputKind, ctx: &ExtractContext) -> Result<(Vec<f64>, Vec<f64>)> {
    match kind {
        OutputKind::InitialVelProfile => Ok((
            ctx.profile.depth_profile(),
            ctx.profile.initial_velocity_profile(),
        )),
        OutputKind::FinalVelProfile => Ok((
            ctx.profile.depth_profile(),
            ctx.profile.final_velocity_profile(),
        )),
        OutputKind::ModulusProfile => {
            Ok((ctx.profile.depth_profile(), ctx.profile.modulus_profile()))
        }
        OutputKind::DampingProfile => {
            Ok((ctx.profile.depth_profile(), ctx.profile.damping_profile()))
        }

        OutputKind::MaxAccelProfile => {
            peak_profile(ctx, |tf| Ok(ctx.motion.max(Some(tf))?))
        }
        OutputKind::MaxVelProfile => {
            peak_profile(ctx, |tf| Ok(ctx.motion.max_vel(Some(tf))?))
        }
        OutputKind::MaxDispProfile => {
            peak_profile(ctx, |tf| Ok(ctx.motion.max_disp(Some(tf))?))
        }

        OutputKind::MaxStrainProfile => {
            mid_profile(ctx.profile, ctx.profile.max_shear_strain_profile())
        }
        OutputKind::MaxStressProfile => {
            mid_profile(ctx.profile, ctx.profile.max_shear_stress_profile())
        }
        OutputKind::StressRatioProfile => {
            mid_profile(ctx.profile, ctx.profile.stress_ratio_profile())
        }

        OutputKind::VerticalTotalStressProfile => {
            let sub_layers = ctx.profile.sub_layers();

            let mut reference = vec![0.0];
            let mut data = vec![0.0];
            for sublayer in sub_layers {
                reference.push(sublayer.depth_to_mid());
                data.push(sublayer.v_total_stress());
            }
            reference.push(ctx.profile.depth_to_bedrock());
            data.push(sub_layers[sub_layers.len() - 1].v_total_stress_at(1.0));

            Ok((reference, data))
        }

        OutputKind::AriasIntensityProfile => {
            // Outcrop for the surface, within for every deeper point
            let reference = ctx.profile.depth_profile();
            let mut mtype = MotionType::Outcrop;
            let mut data = Vec::with_capacity(reference.len());

            for &depth in &reference {
                let tf = ctx.accel_tf_to(depth, mtype);
                let arias = ctx.motion.arias_intensity(Some(&tf))?;
                data.push(arias[arias.len() - 1]);
                mtype = MotionType::Within;
            }

            Ok((reference, data))
        }

        OutputKind::DissipatedEnergyProfile => {
            let reference = ctx.profile.depth_profile();
            let mut data = Vec::with_capacity(reference.len());

            for &depth in &reference {
                if depth == 0.0 {
                    // No accumulated energy at the surface
                    data.push(0.0);
                    continue;
                }

                let strain_tf = ctx.strain_tf_to(depth);
                let stress_tf = ctx.calc.field().stress_tf(
                    ctx.profile,
                    &ctx.profile.input_location(),
                    ctx.motion.motion_type(),
                    &ctx.locate(depth),
                );

                let strain_ts = ctx.motion.strain_time_series(&strain_tf, false)?;
                let stress_ts = ctx.motion.strain_time_series(&stress_tf, false)?;

                // Loop integral of stress over strain by the trapezoid rule
                let mut sum = 0.0;
                for i in 1..strain_ts.len() {
                    sum += 0.5 * (stress_ts[i] + stress_ts[i - 1])
                        * (strain_ts[i] - strain_ts[i - 1]);
                }
                data.push(sum);
            }

            Ok((reference, data))
        }

        OutputKind::FourierSpectrum { depth, mtype } => {
            let tf = ctx.accel_tf_to(*depth, *mtype);
            let data = ctx.motion.abs_fourier_acc(Some(&tf))?;
            Ok((
                ctx.motion.freq().to_vec(),
                moving_average(&data, SMOOTHING_WINDOW),
            ))
        }

        OutputKind::ResponseSpectrum { depth, mtype } => {
            let tf = ctx.accel_tf_to(*depth, *mtype);
            let data =
                ctx.motion
                    .compute_sa(&ctx.settings.periods, ctx.settings.damping, Some(&tf))?;
            Ok((ctx.settings.periods.clone(), data))
        }

        OutputKind::SpectralRatio {
            in_depth,
            in_type,
            out_depth,
            out_type,
        } => {
            let in_sa = ctx.motion.compute_sa(
                &ctx.settings.periods,
                ctx.settings.damping,
                Some(&ctx.accel_tf_to(*in_depth, *in_type)),
            )?;
            let out_sa = ctx.motion.compute_sa(
                &ctx.settings.periods,
                ctx.settings.damping,
                Some(&ctx.accel_tf_to(*out_depth, *out_type)),
            )?;

            let data = out_sa
                .iter()
                .zip(&in_sa)
                .map(|(out, inp)| out / inp)
                .collect();
            Ok((ctx.settings.periods.clone(), data))
        }

        OutputKind::AccelTransferFunction {
            in_depth,
            in_type,
            out_depth,
            out_type,
        } => {
            let tf = ctx.calc.field().accel_tf(
                &ctx.locate(*in_depth),
                *in_type,
                &ctx.locate(*out_depth),
                *out_type,
            );
            let magnitude: Vec<f64> = tf.iter().map(|c| c.norm()).collect();
            Ok((
                ctx.motion.freq().to_vec(),
                moving_average(&magnitude, SMOOTHING_WINDOW),
            ))
        }

        OutputKind::StrainTransferFunction {
            in_depth,
            in_type,
            out_depth,
        } => {
            let tf = ctx.calc.field().strain_tf(
                ctx.profile,
                &ctx.locate(*in_depth),
                *in_type,
                &ctx.locate(*out_depth),
            );
            let magnitude: Vec<f64> = tf.iter().map(|c| c.norm()).collect();
            Ok((
                ctx.motion.freq().to_vec(),
                moving_average(&magnitude, SMOOTHING_WINDOW),
            ))
        }

        OutputKind::AccelTimeSeries {
            depth,
            mtype,
            baseline_correct,
        } => time_series(ctx, TimeSeriesKind::Acceleration, *depth, *mtype, *baseline_correct),
        OutputKind::VelTimeSeries {
            depth,
            mtype,
            baseline_correct,
        } => time_series(ctx, TimeSeriesKind::Velocity, *depth, *mtype, *baseline_correct),
        OutputKind::DispTimeSeries {
            depth,
            mtype,
            baseline_correct,
        } => time_series(ctx, TimeSeriesKind::Displacement, *depth, *mtype, *baseline_correct),

        OutputKind::StrainTimeSeries {
            depth,
            baseline_correct,
        } => {
            let tf = ctx.strain_tf_to(*depth);
            let mut data = ctx.motion.strain_time_series(&tf, *baseline_correct)?;
            // Report strain in percent
            for value in &mut data {
                *value *= 100.0;
            }
            Ok((ctx.motion.time(), data))
        }

        OutputKind::StressTimeSeries {
            depth,
            baseline_correct,
        } => {
            let tf = ctx.strain_tf_to(*depth);
            let mut data = ctx.motion.strain_time_series(&tf, *baseline_correct)?;

            let shear_mod = ctx.profile.shear_mod(ctx.locate(*depth).layer());
            for value in &mut data {
                *value *= shear_mod;
            }
            Ok((ctx.motion.time(), data))
        }
    }
}

/// Peak-value profile: outcrop at the surface, within below.
fn peak_profile(
    ctx: &ExtractContext,
    peak: impl Fn(&[Complex64]) -> Result<f64>,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let reference = ctx.profile.depth_profile();
    let mut mtype = MotionType::Outcrop;
    let mut data = Vec::with_capacity(reference.len());

    for &depth in &reference {
        let tf = ctx.accel_tf_to(depth, mtype);
        data.push(peak(&tf)?);
        mtype = MotionType::Within;
    }

    Ok((reference, data))
}

/// Mid-height profile with a zero at the surface and an extrapolated value
/// at the bedrock surface.
fn mid_profile(profile: &Profile, values: Vec<f64>) -> Result<(Vec<f64>, Vec<f64>)> {
    let sub_layers = profile.sub_layers();

    let mut reference = vec![0.0];
    reference.extend(profile.depth_to_mid_profile());
    reference.push(profile.depth_to_bedrock());

    let mut data = vec![0.0];
    data.extend(values);

    // Extrapolate to the bedrock surface from the slope of the last two
    // samples, clamped at the smallest positive value
    let n = reference.len() - 2;
    let slope = (data[n] - data[n - 1]) / (reference[n] - reference[n - 1]);
    let last_thickness = sub_layers[sub_layers.len() - 1].thickness();
    data.push((data[n] + slope * last_thickness / 2.0).max(f64::MIN_POSITIVE));

    Ok((reference, data))
}

fn time_series(
    ctx: &ExtractContext,
    kind: TimeSeriesKind,
    depth: f64,
    mtype: MotionType,
    baseline_correct: bool,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let tf = ctx.accel_tf_to(depth, mtype);
    let data = ctx.motion.time_series(kind, Some(&tf), baseline_correct)?;
    Ok((ctx.motion.time(), data))
}
