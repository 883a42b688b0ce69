//! Discrete series helpers: peaks, integration, smoothing

/// Largest absolute value in a series, 0 for an empty series.
pub fn find_max_abs(series: &[f64]) -> f64 {
    series.iter().fold(0.0, |max, &v| max.max(v.abs()))
}

/// Trapezoidal integral of `y` over the (possibly non-uniform) grid `x`.
pub fn trapz(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) / 2.0)
        .sum()
}

/// Cumulative trapezoidal integral on a uniform grid with spacing `dx`.
///
/// The result has the same length as the input and starts at zero.
pub fn cum_trapz_uniform(y: &[f64], dx: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(y.len());
    let mut total = 0.0;
    out.push(0.0);

    for pair in y.windows(2) {
        total += dx * (pair[0] + pair[1]) / 2.0;
        out.push(total);
    }

    out
}

/// Logarithmically spaced grid from `start` to `stop`, inclusive.
pub fn log_space(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![start];
    }

    let log_start = start.ln();
    let step = (stop.ln() - log_start) / (count - 1) as f64;
    (0..count)
        .map(|i| (log_start + step * i as f64).exp())
        .collect()
}

/// Centered moving average with the given window size.
///
/// The window shrinks near the edges so the output has the same length as
/// the input. Used to knock FFT noise off transfer-function magnitudes.
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window < 2 || data.len() < window {
        return data.to_vec();
    }

    let half = window / 2;
    (0..data.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(data.len());
            data[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_find_max_abs() {
        assert_relative_eq!(find_max_abs(&[0.1, -0.8, 0.3]), 0.8);
        assert_relative_eq!(find_max_abs(&[]), 0.0);
    }

    #[test]
    fn test_trapz_linear_function() {
        let x: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| 2.0 * v).collect();
        assert_relative_eq!(trapz(&x, &y), 100.0);
    }

    #[test]
    fn test_cum_trapz_monotone_for_positive_input() {
        let y = [1.0, 4.0, 2.0, 5.0];
        let cum = cum_trapz_uniform(&y, 0.5);
        assert_eq!(cum.len(), 4);
        assert_relative_eq!(cum[0], 0.0);
        assert_relative_eq!(cum[3], 0.25 * (5.0 + 6.0 + 7.0));
        assert!(cum.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_log_space_endpoints() {
        let grid = log_space(0.01, 10.0, 31);
        assert_eq!(grid.len(), 31);
        assert_relative_eq!(grid[0], 0.01, max_relative = 1e-12);
        assert_relative_eq!(grid[30], 10.0, max_relative = 1e-12);
        assert!(grid.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_moving_average_preserves_constant() {
        let data = vec![3.0; 20];
        let smoothed = moving_average(&data, 5);
        assert_eq!(smoothed.len(), 20);
        for v in smoothed {
            assert_relative_eq!(v, 3.0);
        }
    }

    #[test]
    fn test_moving_average_short_input_passthrough() {
        let data = vec![1.0, 2.0];
        assert_eq!(moving_average(&data, 5), data);
    }
}
