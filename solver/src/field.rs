//! Up- and down-going wave amplitudes and transfer functions

use ndarray::Array2;
use num_complex::Complex64;
use num_traits::Zero;

use shearwave_motion::{MotionType, TimeSeriesMotion};
use shearwave_profile::{Location, Profile};

use crate::{Result, SolverError};

/// Frequencies below this value are treated as DC and not propagated.
const FREQ_EPS: f64 = 1e-6;

/// The wave-propagation state of a column for one set of complex moduli.
///
/// Rows index the sub-layers with the bedrock as the final row; columns
/// index the one-sided frequency grid of the motion. Allocated once per run
/// and overwritten on every iteration.
#[derive(Debug, Clone)]
pub struct WaveField {
    nsl: usize,
    nf: usize,
    shear_mod: Array2<Complex64>,
    wave_a: Array2<Complex64>,
    wave_b: Array2<Complex64>,
    wave_num: Array2<Complex64>,
}

impl WaveField {
    /// Allocate a field for `nsl` sub-layers over `nf` frequencies.
    pub fn new(nsl: usize, nf: usize) -> Self {
        let zeros = Array2::from_elem((nsl + 1, nf), Complex64::zero());

        Self {
            nsl,
            nf,
            shear_mod: zeros.clone(),
            wave_a: zeros.clone(),
            wave_b: zeros.clone(),
            wave_num: zeros,
        }
    }

    pub fn sub_layer_count(&self) -> usize {
        self.nsl
    }

    pub fn freq_count(&self) -> usize {
        self.nf
    }

    /// Set one layer's complex modulus across every frequency.
    pub fn fill_layer_modulus(&mut self, layer: usize, modulus: Complex64) {
        self.shear_mod.row_mut(layer).fill(modulus);
    }

    /// Set one layer's complex modulus at a single frequency.
    pub fn set_modulus(&mut self, layer: usize, freq_index: usize, modulus: Complex64) {
        self.shear_mod[[layer, freq_index]] = modulus;
    }

    pub fn modulus(&self, layer: usize, freq_index: usize) -> Complex64 {
        self.shear_mod[[layer, freq_index]]
    }

    /// Propagate wave amplitudes through the column.
    ///
    /// The free surface reflects completely, so the top layer carries unit
    /// up- and down-going amplitudes. Interfaces transmit according to the
    /// complex impedance ratio; near-DC bins are carried through unchanged.
    pub fn calc_waves(&mut self, profile: &Profile, motion: &TimeSeriesMotion) -> Result<()> {
        // Complex wave numbers for the whole column
        for i in 0..=self.nsl {
            let density = profile.density(i);
            for j in 0..self.nf {
                self.wave_num[[i, j]] =
                    motion.ang_freq_at(j) / (self.shear_mod[[i, j]] / density).sqrt();
            }
        }

        for i in 0..self.nsl {
            let thickness = profile.thickness(i);

            for j in 0..self.nf {
                if i == 0 {
                    // Complete reflection at the free surface
                    self.wave_a[[0, j]] = Complex64::new(1.0, 0.0);
                    self.wave_b[[0, j]] = Complex64::new(1.0, 0.0);
                }

                if motion.freq_at(j) < FREQ_EPS {
                    self.wave_a[[i + 1, j]] = Complex64::new(1.0, 0.0);
                    self.wave_b[[i + 1, j]] = Complex64::new(1.0, 0.0);
                    continue;
                }

                let imped = (self.wave_num[[i, j]] * self.shear_mod[[i, j]])
                    / (self.wave_num[[i + 1, j]] * self.shear_mod[[i + 1, j]]);

                // Phase across the full layer height
                let phase = Complex64::new(0.0, 1.0) * self.wave_num[[i, j]] * thickness;

                let one = Complex64::new(1.0, 0.0);
                let a = 0.5 * self.wave_a[[i, j]] * (one + imped) * phase.exp()
                    + 0.5 * self.wave_b[[i, j]] * (one - imped) * (-phase).exp();
                let b = 0.5 * self.wave_a[[i, j]] * (one - imped) * phase.exp()
                    + 0.5 * self.wave_b[[i, j]] * (one + imped) * (-phase).exp();

                if !a.is_finite() || !b.is_finite() {
                    return Err(SolverError::PropagationFailed {
                        layer: i + 1,
                        freq_index: j,
                    });
                }

                self.wave_a[[i + 1, j]] = a;
                self.wave_b[[i + 1, j]] = b;
            }
        }

        Ok(())
    }

    /// Wave amplitude at a location for a given motion interpretation.
    pub fn waves(&self, freq_index: usize, location: &Location, mtype: MotionType) -> Complex64 {
        let layer = location.layer();
        let phase = Complex64::new(0.0, 1.0) * self.wave_num[[layer, freq_index]] * location.depth();

        match mtype {
            MotionType::Within => {
                self.wave_a[[layer, freq_index]] * phase.exp()
                    + self.wave_b[[layer, freq_index]] * (-phase).exp()
            }
            MotionType::Outcrop => 2.0 * self.wave_a[[layer, freq_index]] * phase.exp(),
            MotionType::IncomingOnly => self.wave_a[[layer, freq_index]] * phase.exp(),
        }
    }

    /// Acceleration transfer function between two locations.
    ///
    /// Division of a zero input by a zero output at DC yields NaN bins,
    /// which are coerced to zero.
    pub fn accel_tf(
        &self,
        in_location: &Location,
        in_type: MotionType,
        out_location: &Location,
        out_type: MotionType,
    ) -> Vec<Complex64> {
        (0..self.nf)
            .map(|j| {
                let value =
                    self.waves(j, out_location, out_type) / self.waves(j, in_location, in_type);
                if value.is_nan() {
                    Complex64::new(0.0, 0.0)
                } else {
                    value
                }
            })
            .collect()
    }

    /// Strain transfer function from the input location to a point within a
    /// layer, on a velocity-spectrum basis.
    ///
    /// The strain at depth z of layer m for an input acceleration at layer n
    /// could be written with the acceleration spectrum in the denominator,
    /// but that form divides by values near zero at low frequencies.
    /// Computed against the velocity spectrum instead:
    ///
    /// ```text
    /// Strain(w, z)    (g - i) [A_m exp(i k z) - B_m exp(-i k z)]
    /// ------------- = ------------------------------------------
    ///   vel_n(w)                  v*_s  waves_n(w)
    /// ```
    ///
    /// The gravity factor moves the acceleration scaling, which is in g,
    /// onto a velocity basis.
    pub fn strain_tf(
        &self,
        profile: &Profile,
        in_location: &Location,
        in_type: MotionType,
        out_location: &Location,
    ) -> Vec<Complex64> {
        let layer = out_location.layer();
        let density = profile.density(layer);
        let gravity = profile.units().gravity();
        let prefactor = Complex64::new(gravity, -1.0);

        (0..self.nf)
            .map(|j| {
                let phase =
                    Complex64::new(0.0, 1.0) * self.wave_num[[layer, j]] * out_location.depth();

                let numer = prefactor
                    * (self.wave_a[[layer, j]] * phase.exp()
                        - self.wave_b[[layer, j]] * (-phase).exp());
                let denom = (self.shear_mod[[layer, j]] / density).sqrt()
                    * self.waves(j, in_location, in_type);

                let value = numer / denom;
                if value.is_nan() {
                    Complex64::new(0.0, 0.0)
                } else {
                    value
                }
            })
            .collect()
    }

    /// Stress transfer function: the strain transfer function scaled by the
    /// complex modulus of the output layer.
    pub fn stress_tf(
        &self,
        profile: &Profile,
        in_location: &Location,
        in_type: MotionType,
        out_location: &Location,
    ) -> Vec<Complex64> {
        let layer = out_location.layer();

        self.strain_tf(profile, in_location, in_type, out_location)
            .into_iter()
            .enumerate()
            .map(|(j, value)| value * self.shear_mod[[layer, j]])
            .collect()
    }
}
