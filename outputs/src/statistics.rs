//! Ensemble statistics over the (site, motion) grid

use crate::catalog::OutputSeries;
use crate::kind::Distribution;

/// Mean and standard deviation of an output across the ensemble.
///
/// Log-normal quantities are averaged in log space, so `average` is the
/// median and `stdev` the log standard deviation; the `plus_std` and
/// `minus_std` curves are one standard deviation either side.
#[derive(Debug, Clone)]
pub struct OutputStatistics {
    pub distribution: Distribution,
    pub average: Vec<f64>,
    pub stdev: Vec<f64>,
    pub plus_std: Vec<f64>,
    pub minus_std: Vec<f64>,
}

impl OutputStatistics {
    /// Compute statistics over the enabled series, one value per reference
    /// point. Returns `None` with fewer than two series.
    pub fn calculate(
        reference_len: usize,
        series: &[OutputSeries],
        distribution: Distribution,
    ) -> Option<Self> {
        let enabled: Vec<&OutputSeries> = series.iter().filter(|s| s.enabled).collect();
        if enabled.len() < 2 {
            return None;
        }

        let mut average = Vec::new();
        let mut stdev = Vec::new();

        for i in 0..reference_len {
            let mut count = 0usize;
            let mut sum = 0.0;
            let mut sqr_sum = 0.0;

            for series in &enabled {
                if i < series.data.len() {
                    let mut value = series.data[i];
                    if distribution == Distribution::LogNormal {
                        // Surface points of the strain and stress profiles
                        // are exactly zero; clamp like the extrapolation does
                        value = value.max(f64::MIN_POSITIVE).ln();
                    }
                    sum += value;
                    sqr_sum += value * value;
                    count += 1;
                }
            }

            if count == 0 {
                break;
            }

            average.push(sum / count as f64);
            // The absolute value guards against a tiny negative variance
            // when every sample is the same number
            stdev.push(if count > 2 {
                ((sqr_sum - sum * sum / count as f64).abs() / (count - 1) as f64).sqrt()
            } else {
                0.0
            });
        }

        if distribution == Distribution::LogNormal {
            for value in &mut average {
                *value = value.exp();
            }
        }

        let (plus_std, minus_std) = match distribution {
            Distribution::Normal => (
                average.iter().zip(&stdev).map(|(a, s)| a + s).collect(),
                average.iter().zip(&stdev).map(|(a, s)| a - s).collect(),
            ),
            Distribution::LogNormal => (
                average
                    .iter()
                    .zip(&stdev)
                    .map(|(a, s)| a * s.exp())
                    .collect(),
                average
                    .iter()
                    .zip(&stdev)
                    .map(|(a, s)| a * (-s).exp())
                    .collect(),
            ),
        };

        Some(Self {
            distribution,
            average,
            stdev,
            plus_std,
            minus_std,
        })
    }
}
