//! Interpolation tables with endpoint clamping

use crate::{NumericsError, Result};

/// Linear interpolation of `ys` over `xs` at `x`, clamped at the endpoints.
///
/// `xs` must be sorted ascending.
pub fn interp_linear(xs: &[f64], ys: &[f64], x: f64) -> Result<f64> {
    if xs.is_empty() || xs.len() != ys.len() {
        return Err(NumericsError::EmptyTable);
    }

    if x <= xs[0] {
        return Ok(ys[0]);
    }
    if x >= xs[xs.len() - 1] {
        return Ok(ys[ys.len() - 1]);
    }

    let upper = xs.partition_point(|&v| v < x);
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let (y0, y1) = (ys[upper - 1], ys[upper]);

    Ok(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
}

/// Interpolation that is linear in the logarithm of the abscissa.
///
/// Used for strain-dependent property curves, which are tabulated over
/// several decades of strain. Non-positive `x` clamps to the first entry.
pub fn interp_log_x(xs: &[f64], ys: &[f64], x: f64) -> Result<f64> {
    if xs.is_empty() || xs.len() != ys.len() {
        return Err(NumericsError::EmptyTable);
    }

    if x <= xs[0] {
        return Ok(ys[0]);
    }
    if x >= xs[xs.len() - 1] {
        return Ok(ys[ys.len() - 1]);
    }

    let upper = xs.partition_point(|&v| v < x);
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let (y0, y1) = (ys[upper - 1], ys[upper]);

    Ok(y0 + (y1 - y0) * (x.ln() - x0.ln()) / (x1.ln() - x0.ln()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_midpoint() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 10.0, 40.0];
        assert_relative_eq!(interp_linear(&xs, &ys, 1.5).unwrap(), 25.0);
    }

    #[test]
    fn test_clamping() {
        let xs = [1e-4, 1e-2, 1.0];
        let ys = [1.0, 0.5, 0.1];
        assert_relative_eq!(interp_log_x(&xs, &ys, 1e-6).unwrap(), 1.0);
        assert_relative_eq!(interp_log_x(&xs, &ys, 10.0).unwrap(), 0.1);
        // Zero and negative strain clamp instead of producing NaN
        assert_relative_eq!(interp_log_x(&xs, &ys, 0.0).unwrap(), 1.0);
        assert_relative_eq!(interp_log_x(&xs, &ys, -1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_log_abscissa_geometric_midpoint() {
        let xs = [1e-3, 1e-1];
        let ys = [0.0, 1.0];
        // 1e-2 is halfway between the entries in log space
        assert_relative_eq!(interp_log_x(&xs, &ys, 1e-2).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_table() {
        assert!(interp_linear(&[], &[], 0.5).is_err());
    }
}
