//! Real-to-complex FFT plans at power-of-two lengths

use num_complex::Complex64;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::{NumericsError, Result};

/// Smallest power of two greater than or equal to `n`.
pub fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two()
}

/// Paired forward and inverse real FFT plans for a fixed length.
///
/// The forward transform maps a real sequence of length `n` to a one-sided
/// complex spectrum of length `n/2 + 1`; bin `k` corresponds to frequency
/// `k / (n dt)`. The forward transform is unscaled and the inverse is scaled
/// by `1/n` so that `inverse(forward(x)) == x`.
pub struct RealFft {
    len: usize,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
}

impl RealFft {
    /// Create plans for a real sequence of length `len`.
    pub fn new(len: usize) -> Result<Self> {
        if len < 2 || !len.is_power_of_two() {
            return Err(NumericsError::InvalidFftLength { len });
        }

        let mut planner = RealFftPlanner::<f64>::new();

        Ok(Self {
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        })
    }

    /// Length of the real sequence.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the one-sided spectrum, `n/2 + 1`.
    pub fn spectrum_len(&self) -> usize {
        self.len / 2 + 1
    }

    /// Forward transform of a real sequence. Inputs shorter than the plan
    /// length are zero padded; longer inputs are rejected.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<Complex64>> {
        if input.len() > self.len {
            return Err(NumericsError::LengthMismatch {
                expected: self.len,
                actual: input.len(),
            });
        }

        let mut padded = vec![0.0; self.len];
        padded[..input.len()].copy_from_slice(input);

        let mut spectrum = self.forward.make_output_vec();
        self.forward
            .process(&mut padded, &mut spectrum)
            .map_err(|err| NumericsError::FftFailed {
                message: err.to_string(),
            })?;

        Ok(spectrum)
    }

    /// Inverse transform of a one-sided spectrum, scaled so that the
    /// round trip with [`RealFft::forward`] is the identity.
    pub fn inverse(&self, spectrum: &[Complex64]) -> Result<Vec<f64>> {
        if spectrum.len() != self.spectrum_len() {
            return Err(NumericsError::LengthMismatch {
                expected: self.spectrum_len(),
                actual: spectrum.len(),
            });
        }

        let mut buffer = spectrum.to_vec();

        // A real sequence carries no phase at DC or Nyquist; transfer
        // functions can leave residual imaginary parts there which the
        // complex-to-real transform rejects.
        buffer[0].im = 0.0;
        let last = buffer.len() - 1;
        buffer[last].im = 0.0;

        let mut output = self.inverse.make_output_vec();
        self.inverse
            .process(&mut buffer, &mut output)
            .map_err(|err| NumericsError::FftFailed {
                message: err.to_string(),
            })?;

        let scale = 1.0 / self.len as f64;
        for value in &mut output {
            *value *= scale;
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(RealFft::new(100).is_err());
        assert!(RealFft::new(0).is_err());
        assert!(RealFft::new(128).is_ok());
    }

    #[test]
    fn test_bin_frequencies() {
        let fft = RealFft::new(64).unwrap();
        assert_eq!(fft.spectrum_len(), 33);
    }

    #[test]
    fn test_single_tone() {
        // A pure cosine at bin 4 must land all its energy in bin 4
        let n = 256;
        let fft = RealFft::new(n).unwrap();
        let input: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * 4.0 * i as f64 / n as f64).cos())
            .collect();

        let spectrum = fft.forward(&input).unwrap();
        assert_relative_eq!(spectrum[4].re, n as f64 / 2.0, max_relative = 1e-9);

        for (k, bin) in spectrum.iter().enumerate() {
            if k != 4 {
                assert!(bin.norm() < 1e-8, "leakage at bin {}", k);
            }
        }
    }

    #[test]
    fn test_zero_padding() {
        let fft = RealFft::new(32).unwrap();
        let short = vec![1.0, -1.0, 0.5];
        let spectrum = fft.forward(&short).unwrap();
        let recovered = fft.inverse(&spectrum).unwrap();

        assert_relative_eq!(recovered[0], 1.0, max_relative = 1e-10);
        assert_relative_eq!(recovered[1], -1.0, max_relative = 1e-10);
        assert_relative_eq!(recovered[2], 0.5, max_relative = 1e-10);
        for value in &recovered[3..] {
            assert!(value.abs() < 1e-10);
        }
    }

    proptest! {
        #[test]
        fn round_trip_recovers_input(
            exponent in 3usize..10,
            seed in proptest::collection::vec(-10.0f64..10.0, 1024),
        ) {
            let n = 1 << exponent;
            let input = &seed[..n];
            let fft = RealFft::new(n).unwrap();
            let recovered = fft.inverse(&fft.forward(input).unwrap()).unwrap();

            for (a, b) in input.iter().zip(&recovered) {
                prop_assert!((a - b).abs() <= 1e-10 * a.abs().max(1.0));
            }
        }
    }
}
