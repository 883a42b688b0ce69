//! Least-squares fitting

use nalgebra::{DMatrix, DVector};

use crate::{NumericsError, Result};

/// Solve the linear least-squares problem `min || A x - b ||` by SVD.
pub fn least_squares(a: DMatrix<f64>, b: DVector<f64>) -> Result<DVector<f64>> {
    if a.nrows() < a.ncols() {
        return Err(NumericsError::Underdetermined {
            rows: a.nrows(),
            params: a.ncols(),
        });
    }

    let svd = a.svd(true, true);
    svd.solve(&b, 1e-12).map_err(|message| NumericsError::FitFailed {
        message: message.to_string(),
    })
}

/// Two-parameter linear fit used by the smooth strain-spectrum model.
///
/// Each row of `model` holds the two regressors for one sample; `data` holds
/// the observations. Returns the fitted `(alpha, beta)` pair.
pub fn fit_two_parameter(model: &[[f64; 2]], data: &[f64]) -> Result<(f64, f64)> {
    if model.len() != data.len() {
        return Err(NumericsError::LengthMismatch {
            expected: model.len(),
            actual: data.len(),
        });
    }

    let a = DMatrix::from_fn(model.len(), 2, |i, j| model[i][j]);
    let b = DVector::from_column_slice(data);

    let params = least_squares(a, b)?;
    Ok((params[0], params[1]))
}

/// Fit a polynomial of the given degree to `(x, y)` samples.
///
/// Coefficients are returned lowest order first.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>> {
    if x.len() != y.len() {
        return Err(NumericsError::LengthMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }

    let a = DMatrix::from_fn(x.len(), degree + 1, |i, j| x[i].powi(j as i32));
    let b = DVector::from_column_slice(y);

    Ok(least_squares(a, b)?.iter().copied().collect())
}

/// Evaluate a polynomial with coefficients lowest order first.
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Derivative of a polynomial, coefficients lowest order first.
pub fn polyder(coeffs: &[f64]) -> Vec<f64> {
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, &c)| i as f64 * c)
        .collect()
}
