//! Acceleration time-series records and derived quantities

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;
use parking_lot::Mutex;
use rayon::prelude::*;

use shearwave_numerics::{
    cum_trapz_uniform, find_max_abs, next_power_of_two, polyder, polyfit, polyval, RealFft,
    UnitSystem,
};

use crate::{MotionError, MotionType, Result};

const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// Kind of time series recovered from the acceleration spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSeriesKind {
    /// Acceleration in g
    Acceleration,
    /// Single-integrated acceleration, in the velocity units of the system
    Velocity,
    /// Double-integrated acceleration, in the displacement units of the system
    Displacement,
}

/// An acceleration record and its one-sided Fourier representation.
///
/// The record is zero padded to the FFT size (the next power of two above
/// the raw length) at construction, so every derived series shares one time
/// grid. The acceleration stays in g end to end; the velocity spectrum is
/// kept in g-seconds and the gravity factor inside the strain transfer
/// function moves strains onto a velocity basis.
pub struct TimeSeriesMotion {
    name: String,
    time_step: f64,
    mtype: MotionType,
    units: UnitSystem,

    /// Raw point count before zero padding
    raw_count: usize,
    /// Acceleration in g, length equal to the FFT size
    accel: Vec<f64>,
    freq: Vec<f64>,
    fourier_acc: Vec<Complex64>,
    fourier_vel: Vec<Complex64>,

    pga: f64,
    pgv: f64,

    fft: RealFft,
    sdof_cache: Mutex<HashMap<(u64, u64), Arc<Vec<Complex64>>>>,
}

impl fmt::Debug for TimeSeriesMotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSeriesMotion")
            .field("name", &self.name)
            .field("time_step", &self.time_step)
            .field("point_count", &self.accel.len())
            .field("pga", &self.pga)
            .finish()
    }
}

impl TimeSeriesMotion {
    /// Build a motion from an acceleration record in g.
    pub fn from_accel(
        name: impl Into<String>,
        accel: Vec<f64>,
        time_step: f64,
        mtype: MotionType,
        units: UnitSystem,
    ) -> Result<Self> {
        if accel.is_empty() {
            return Err(MotionError::EmptyRecord);
        }
        if time_step <= 0.0 {
            return Err(MotionError::InvalidTimeStep { time_step });
        }

        let raw_count = accel.len();
        let padded = next_power_of_two(raw_count);
        let fft = RealFft::new(padded)?;

        let mut accel = accel;
        accel.resize(padded, 0.0);

        let fourier_acc = fft.forward(&accel)?;

        let freq: Vec<f64> = (0..fft.spectrum_len())
            .map(|k| k as f64 / (padded as f64 * time_step))
            .collect();

        // Velocity spectrum in g-seconds, defined as zero at DC
        let fourier_vel: Vec<Complex64> = fourier_acc
            .iter()
            .zip(&freq)
            .map(|(&fa, &f)| {
                if f > 0.0 {
                    fa / Complex64::new(0.0, TWO_PI * f)
                } else {
                    Complex64::new(0.0, 0.0)
                }
            })
            .collect();

        let pga = find_max_abs(&accel);

        let mut motion = Self {
            name: name.into(),
            time_step,
            mtype,
            units,
            raw_count,
            accel,
            freq,
            fourier_acc,
            fourier_vel,
            pga,
            pgv: 0.0,
            fft,
            sdof_cache: Mutex::new(HashMap::new()),
        };
        motion.pgv = motion.max_vel(None)?;

        Ok(motion)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn motion_type(&self) -> MotionType {
        self.mtype
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    /// Point count of the padded record.
    pub fn point_count(&self) -> usize {
        self.accel.len()
    }

    /// Point count of the record before zero padding.
    pub fn raw_count(&self) -> usize {
        self.raw_count
    }

    /// Acceleration record in g, zero padded.
    pub fn accel(&self) -> &[f64] {
        &self.accel
    }

    pub fn time(&self) -> Vec<f64> {
        (0..self.accel.len())
            .map(|i| i as f64 * self.time_step)
            .collect()
    }

    /// One-sided frequency grid in Hz.
    pub fn freq(&self) -> &[f64] {
        &self.freq
    }

    pub fn freq_count(&self) -> usize {
        self.freq.len()
    }

    pub fn freq_at(&self, index: usize) -> f64 {
        self.freq[index]
    }

    pub fn ang_freq_at(&self, index: usize) -> f64 {
        TWO_PI * self.freq[index]
    }

    /// Nyquist frequency of the record.
    pub fn freq_max(&self) -> f64 {
        self.freq[self.freq.len() - 1]
    }

    pub fn fourier_acc(&self) -> &[Complex64] {
        &self.fourier_acc
    }

    pub fn fourier_vel(&self) -> &[Complex64] {
        &self.fourier_vel
    }

    /// Peak ground acceleration in g.
    pub fn pga(&self) -> f64 {
        self.pga
    }

    /// Peak ground velocity in the velocity units of the system.
    pub fn pgv(&self) -> f64 {
        self.pgv
    }

    /// Multiply a spectrum by a transfer function; an empty transfer
    /// function is the identity.
    fn apply_tf(&self, spectrum: &[Complex64], tf: Option<&[Complex64]>) -> Result<Vec<Complex64>> {
        match tf {
            None => Ok(spectrum.to_vec()),
            Some(tf) if tf.is_empty() => Ok(spectrum.to_vec()),
            Some(tf) => {
                if tf.len() != spectrum.len() {
                    return Err(MotionError::TransferFunctionLength {
                        expected: spectrum.len(),
                        actual: tf.len(),
                    });
                }
                Ok(spectrum.iter().zip(tf).map(|(&s, &t)| s * t).collect())
            }
        }
    }

    /// Absolute acceleration Fourier spectrum under a transfer function.
    pub fn abs_fourier_acc(&self, tf: Option<&[Complex64]>) -> Result<Vec<f64>> {
        Ok(self
            .apply_tf(&self.fourier_acc, tf)?
            .iter()
            .map(|c| c.norm())
            .collect())
    }

    /// Absolute velocity Fourier spectrum under a transfer function.
    pub fn abs_fourier_vel(&self, tf: Option<&[Complex64]>) -> Result<Vec<f64>> {
        Ok(self
            .apply_tf(&self.fourier_vel, tf)?
            .iter()
            .map(|c| c.norm())
            .collect())
    }

    /// Time series from a spectrum by inverse FFT.
    fn calc_time_series(&self, spectrum: Vec<Complex64>) -> Result<Vec<f64>> {
        Ok(self.fft.inverse(&spectrum)?)
    }

    /// Integrate a time series once in the frequency domain. The DC bin is
    /// defined as zero.
    fn fd_integrate(&self, series: &[f64]) -> Result<Vec<f64>> {
        let mut spectrum = self.fft.forward(series)?;

        for (k, bin) in spectrum.iter_mut().enumerate() {
            if k == 0 {
                *bin = Complex64::new(0.0, 0.0);
            } else {
                *bin /= Complex64::new(0.0, TWO_PI * self.freq[k]);
            }
        }

        self.calc_time_series(spectrum)
    }

    /// Remove low-order drift from an acceleration series.
    ///
    /// A degree-1 polynomial is fit to the trapezoid-integrated velocity and
    /// its derivative subtracted from the record; then a degree-3 polynomial
    /// is fit to the displacement of the corrected record and its second
    /// derivative subtracted in turn. The two fits run in sequence so a
    /// drift captured by the velocity fit is not removed twice.
    fn baseline_correct(&self, accel: &[f64]) -> Result<Vec<f64>> {
        let time = self.time();

        let vel = cum_trapz_uniform(accel, self.time_step);
        let from_vel = polyder(&polyfit(&time, &vel, 1)?);
        let corrected: Vec<f64> = accel
            .iter()
            .zip(&time)
            .map(|(&a, &t)| a - polyval(&from_vel, t))
            .collect();

        let disp = cum_trapz_uniform(
            &cum_trapz_uniform(&corrected, self.time_step),
            self.time_step,
        );
        let from_disp = polyder(&polyder(&polyfit(&time, &disp, 3)?));

        Ok(corrected
            .iter()
            .zip(&time)
            .map(|(&a, &t)| a - polyval(&from_disp, t))
            .collect())
    }

    /// Compute a time series for a given transfer function.
    ///
    /// Velocity and displacement are integrated in the frequency domain and
    /// converted into the units of the active system; acceleration stays
    /// in g.
    pub fn time_series(
        &self,
        kind: TimeSeriesKind,
        tf: Option<&[Complex64]>,
        baseline_correct: bool,
    ) -> Result<Vec<f64>> {
        let mut accel = self.calc_time_series(self.apply_tf(&self.fourier_acc, tf)?)?;

        if baseline_correct {
            accel = self.baseline_correct(&accel)?;
        }

        match kind {
            TimeSeriesKind::Acceleration => Ok(accel),
            TimeSeriesKind::Velocity => {
                let mut vel = self.fd_integrate(&accel)?;
                for v in &mut vel {
                    *v *= self.units.ts_conv();
                }
                Ok(vel)
            }
            TimeSeriesKind::Displacement => {
                let mut disp = self.fd_integrate(&self.fd_integrate(&accel)?)?;
                for d in &mut disp {
                    *d *= self.units.ts_conv();
                }
                Ok(disp)
            }
        }
    }

    /// Peak of the acceleration time series under a transfer function, in g.
    pub fn max(&self, tf: Option<&[Complex64]>) -> Result<f64> {
        Ok(find_max_abs(&self.time_series(
            TimeSeriesKind::Acceleration,
            tf,
            false,
        )?))
    }

    /// Peak of the velocity time series under a transfer function.
    pub fn max_vel(&self, tf: Option<&[Complex64]>) -> Result<f64> {
        Ok(find_max_abs(&self.time_series(
            TimeSeriesKind::Velocity,
            tf,
            false,
        )?))
    }

    /// Peak of the displacement time series under a transfer function.
    pub fn max_disp(&self, tf: Option<&[Complex64]>) -> Result<f64> {
        Ok(find_max_abs(&self.time_series(
            TimeSeriesKind::Displacement,
            tf,
            false,
        )?))
    }

    /// Strain time series from a strain transfer function applied to the
    /// velocity Fourier spectrum. The result is a dimensionless strain.
    ///
    /// Baseline correction subtracts the degree-3 polynomial fit of the
    /// series itself.
    pub fn strain_time_series(
        &self,
        strain_tf: &[Complex64],
        baseline_correct: bool,
    ) -> Result<Vec<f64>> {
        let mut series = self.calc_time_series(self.apply_tf(&self.fourier_vel, Some(strain_tf))?)?;

        if baseline_correct {
            let time = self.time();
            let fit = polyfit(&time, &series, 3)?;
            for (value, &t) in series.iter_mut().zip(&time) {
                *value -= polyval(&fit, t);
            }
        }

        Ok(series)
    }

    /// Peak dimensionless strain under a strain transfer function.
    pub fn calc_max_strain(&self, strain_tf: &[Complex64]) -> Result<f64> {
        Ok(find_max_abs(&self.strain_time_series(strain_tf, false)?))
    }

    /// Transfer function of a single-degree-of-freedom oscillator, memoized
    /// per (period, damping) pair.
    ///
    /// ```text
    ///                       -fn^2
    ///  H = ----------------------------------------
    ///       (f^2 - fn^2) - 2 i (damping/100) fn f
    /// ```
    fn sdof_tf(&self, period: f64, damping: f64) -> Arc<Vec<Complex64>> {
        let key = (period.to_bits(), damping.to_bits());

        let mut cache = self.sdof_cache.lock();
        Arc::clone(cache.entry(key).or_insert_with(|| {
            let fn_ = 1.0 / period;
            let d = damping / 100.0;

            Arc::new(
                self.freq
                    .iter()
                    .map(|&f| {
                        (-fn_ * fn_)
                            / Complex64::new(f * f - fn_ * fn_, -2.0 * d * fn_ * f)
                    })
                    .collect(),
            )
        }))
    }

    /// Acceleration response spectrum.
    ///
    /// For each period the SDOF transfer function is combined with the
    /// optional site transfer function, applied to the acceleration
    /// spectrum, and the peak of the recovered time series is reported in g.
    /// Periods are processed in parallel.
    pub fn compute_sa(
        &self,
        periods: &[f64],
        damping: f64,
        accel_tf: Option<&[Complex64]>,
    ) -> Result<Vec<f64>> {
        let site_spectrum = self.apply_tf(&self.fourier_acc, accel_tf)?;

        periods
            .par_iter()
            .map(|&period| {
                let sdof = self.sdof_tf(period, damping);
                let spectrum: Vec<Complex64> = site_spectrum
                    .iter()
                    .zip(sdof.iter())
                    .map(|(&fa, &h)| fa * h)
                    .collect();

                Ok(find_max_abs(&self.calc_time_series(spectrum)?))
            })
            .collect()
    }

    /// Cumulative Arias intensity of the acceleration series under a
    /// transfer function, in length units per second.
    pub fn arias_intensity(&self, accel_tf: Option<&[Complex64]>) -> Result<Vec<f64>> {
        let accel = self.time_series(TimeSeriesKind::Acceleration, accel_tf, false)?;
        let gravity = self.units.gravity();
        let factor = std::f64::consts::PI / (2.0 * gravity);

        let mut total = 0.0;
        Ok(accel
            .iter()
            .map(|&a| {
                let a = a * gravity;
                total += factor * a * a * self.time_step;
                total
            })
            .collect())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine_motion(freq_hz: f64, amplitude: f64, duration: f64, dt: f64) -> TimeSeriesMotion {
        let count = (duration / dt) as usize;
        let accel: Vec<f64> = (0..count)
            .map(|i| amplitude * (TWO_PI * freq_hz * i as f64 * dt).sin())
            .collect();

        TimeSeriesMotion::from_accel(
            "sine",
            accel,
            dt,
            MotionType::Outcrop,
            UnitSystem::Metric,
        )
        .unwrap()
    }

    #[test]
    fn test_grid_properties() {
        let motion = sine_motion(5.0, 0.1, 10.0, 0.005);

        // 2000 raw points padded to 2048
        assert_eq!(motion.point_count(), 2048);
        assert_eq!(motion.freq_count(), 1025);
        assert_relative_eq!(motion.freq_at(0), 0.0);
        assert_relative_eq!(motion.freq_max(), 100.0, max_relative = 1e-12);
    }

    #[test]
    fn test_max_with_identity_tf_matches_pga() {
        let motion = sine_motion(5.0, 0.1, 10.0, 0.005);
        let identity = vec![Complex64::new(1.0, 0.0); motion.freq_count()];

        let peak = motion.max(Some(&identity)).unwrap();
        assert_relative_eq!(peak, motion.pga(), max_relative = 1e-12);
    }

    #[test]
    fn test_dc_fourier_vel_is_zero() {
        let motion = sine_motion(2.0, 0.05, 8.0, 0.01);
        assert_eq!(motion.fourier_vel()[0], Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_peak_velocity_of_sine() {
        // a(t) = A sin(w t) integrates to v(t) ~ -(A/w) cos(w t); with A in g
        // the peak velocity is ts_conv * A / w
        let motion = sine_motion(5.0, 0.1, 10.0, 0.005);
        let expected = UnitSystem::Metric.ts_conv() * 0.1 / (TWO_PI * 5.0);
        // Zero padding shifts the zero-mean antiderivative by a few percent
        assert_relative_eq!(motion.pgv(), expected, max_relative = 0.05);
    }

    #[test]
    fn test_fd_integration_round_trip() {
        // Integrating then differentiating in the frequency domain recovers
        // the zero-mean part of the record away from DC
        let motion = sine_motion(4.0, 0.08, 8.0, 0.005);
        let vel = motion
            .time_series(TimeSeriesKind::Velocity, None, false)
            .unwrap();

        let mut spectrum = motion.fft.forward(&vel).unwrap();
        for (k, bin) in spectrum.iter_mut().enumerate() {
            *bin *= Complex64::new(0.0, TWO_PI * motion.freq_at(k));
        }
        let accel_again = motion.fft.inverse(&spectrum).unwrap();

        for (i, (&a, &b)) in motion.accel.iter().zip(&accel_again).enumerate() {
            let b = b / UnitSystem::Metric.ts_conv();
            assert!(
                (a - b).abs() < 1e-8,
                "mismatch at sample {}: {} vs {}",
                i,
                a,
                b
            );
        }
    }

    #[test]
    fn test_sa_approaches_pga_at_short_period() {
        // A rigid oscillator tracks the ground: Sa(T -> 0) -> PGA
        let motion = sine_motion(2.0, 0.1, 10.0, 0.005);
        let sa = motion.compute_sa(&[0.01], 5.0, None).unwrap();
        assert_relative_eq!(sa[0], motion.pga(), max_relative = 0.05);
    }

    #[test]
    fn test_sa_resonance_amplifies() {
        let motion = sine_motion(2.0, 0.1, 10.0, 0.005);
        // Oscillator tuned to the excitation frequency responds far above pga
        let sa = motion.compute_sa(&[0.5], 5.0, None).unwrap();
        assert!(sa[0] > 3.0 * motion.pga());
    }

    #[test]
    fn test_sa_at_long_period_converges_to_pgd() {
        // For an oscillator far softer than any signal content, the
        // pseudo-spectral displacement Sa/wn^2 equals the peak ground
        // displacement
        let motion = sine_motion(5.0, 0.1, 10.0, 0.005);
        let period = 10.0;
        let sa = motion.compute_sa(&[period], 5.0, None).unwrap()[0];

        let wn = TWO_PI / period;
        let sd = sa * UnitSystem::Metric.ts_conv() / (wn * wn);
        let pgd = motion.max_disp(None).unwrap();

        assert_relative_eq!(sd, pgd, max_relative = 0.01);
    }

    #[test]
    fn test_sdof_cache_hit_returns_same_values() {
        let motion = sine_motion(2.0, 0.1, 4.0, 0.01);
        let first = motion.sdof_tf(0.5, 5.0);
        let second = motion.sdof_tf(0.5, 5.0);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_arias_intensity_non_decreasing() {
        let motion = sine_motion(3.0, 0.2, 6.0, 0.005);
        let arias = motion.arias_intensity(None).unwrap();

        assert!(arias.windows(2).all(|w| w[1] >= w[0]));
        assert!(arias.last().unwrap() > &0.0);

        // The final value is the scalar Arias intensity
        let gravity = UnitSystem::Metric.gravity();
        let expected: f64 = motion
            .accel()
            .iter()
            .map(|&a| {
                std::f64::consts::PI / (2.0 * gravity)
                    * (a * gravity).powi(2)
                    * motion.time_step()
            })
            .sum();
        assert_relative_eq!(*arias.last().unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_baseline_correction_removes_constant_offset() {
        // A constant acceleration offset integrates to a linear velocity
        // drift; the velocity fit must remove it exactly
        let dt = 0.005;
        let offset = 0.01;
        // 3.125 Hz fits 32 whole periods into the 10.24 s window
        let accel: Vec<f64> = (0..2048)
            .map(|i| {
                let t = i as f64 * dt;
                0.05 * (TWO_PI * 3.125 * t).sin() + offset
            })
            .collect();
        let motion = TimeSeriesMotion::from_accel(
            "drifting",
            accel,
            dt,
            MotionType::Outcrop,
            UnitSystem::Metric,
        )
        .unwrap();

        let corrected = motion.baseline_correct(motion.accel()).unwrap();
        let mean: f64 = corrected.iter().sum::<f64>() / corrected.len() as f64;
        assert!(mean.abs() < 0.05 * offset, "offset survived: mean {}", mean);
    }

    #[test]
    fn test_baseline_correction_is_stable() {
        let dt = 0.005;
        let accel: Vec<f64> = (0..2048)
            .map(|i| {
                let t = i as f64 * dt;
                0.05 * (TWO_PI * 3.125 * t).sin() + 1e-3 + 1e-4 * t
            })
            .collect();
        let motion = TimeSeriesMotion::from_accel(
            "drifting",
            accel,
            dt,
            MotionType::Outcrop,
            UnitSystem::Metric,
        )
        .unwrap();

        let once = motion.baseline_correct(motion.accel()).unwrap();
        let twice = motion.baseline_correct(&once).unwrap();

        // The first pass absorbs the drift; the second pass must move the
        // record by a small fraction of what the first pass removed
        let first_change = find_max_abs(
            &motion
                .accel()
                .iter()
                .zip(&once)
                .map(|(a, b)| a - b)
                .collect::<Vec<f64>>(),
        );
        let second_change = find_max_abs(
            &once
                .iter()
                .zip(&twice)
                .map(|(a, b)| a - b)
                .collect::<Vec<f64>>(),
        );

        assert!(first_change > 0.0);
        assert!(
            second_change <= 1e-2 * first_change,
            "second pass changed the record by {} vs {}",
            second_change,
            first_change
        );
    }

    #[test]
    fn test_transfer_function_length_checked() {
        let motion = sine_motion(2.0, 0.1, 4.0, 0.01);
        let bad = vec![Complex64::new(1.0, 0.0); 3];
        assert!(motion.max(Some(&bad)).is_err());
    }
}
