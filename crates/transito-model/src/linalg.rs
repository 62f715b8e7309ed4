//! Dense linear algebra for small symmetric positive definite systems
//!
//! Normal equations of a regression have one row and column per parameter,
//! so a plain Cholesky factorization is enough.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2};

/// Relative pivot threshold below which a matrix is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Cholesky factorization `A = L Lᵀ`
///
/// # Arguments
/// * `matrix` - Symmetric positive definite matrix
///
/// # Returns
/// * Lower triangular factor `L`
///
/// Fails with [`ModelError::SingularMatrix`] when a pivot is not positive
/// relative to the largest diagonal element.
pub fn cholesky(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let scale = (0..n)
        .map(|i| matrix[[i, i]].abs())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut pivot = matrix[[j, j]];
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if !pivot.is_finite() || pivot <= PIVOT_TOLERANCE * scale {
            return Err(ModelError::SingularMatrix);
        }
        let diag = pivot.sqrt();
        l[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut value = matrix[[i, j]];
            for k in 0..j {
                value -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = value / diag;
        }
    }

    Ok(l)
}

/// Solve `L Lᵀ x = b` given the Cholesky factor `L`.
pub fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    // forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut value = b[i];
        for k in 0..i {
            value -= l[[i, k]] * z[k];
        }
        z[i] = value / l[[i, i]];
    }

    // back substitution: Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut value = z[i];
        for k in (i + 1)..n {
            value -= l[[k, i]] * x[k];
        }
        x[i] = value / l[[i, i]];
    }

    x
}

/// Inverse of a symmetric positive definite matrix.
pub fn spd_inverse(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let l = cholesky(matrix)?;
    let n = l.nrows();

    let mut inverse = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut unit = Array1::<f64>::zeros(n);
        unit[j] = 1.0;
        inverse.column_mut(j).assign(&cholesky_solve(&l, &unit));
    }

    // symmetrize away rounding noise
    let transposed = inverse.t().to_owned();
    Ok((inverse + transposed) * 0.5)
}

/// Quadratic form `xᵀ A x`.
pub fn quadratic_form(matrix: &Array2<f64>, x: &Array1<f64>) -> f64 {
    x.dot(&matrix.dot(x))
}
