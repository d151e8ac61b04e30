use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Solves `a · x = b` by LU decomposition with partial pivoting.
///
/// Returns `None` if `a` is singular or the solution is not finite.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let (rows, cols) = a.dim();
    debug_assert_eq!(rows, cols, "coefficient matrix must be square");
    debug_assert_eq!(rows, b.len(), "target vector must match the matrix");

    if rows == 0 {
        return Some(Array1::zeros(0));
    }

    // ndarray iterates in logical row-major order regardless of memory layout.
    let m = DMatrix::from_row_iterator(rows, cols, a.iter().copied());
    let v = DVector::from_iterator(b.len(), b.iter().copied());

    let x = m.lu().solve(&v)?;
    x.iter()
        .all(|x| x.is_finite())
        .then(|| x.iter().copied().collect())
}

/// Index of the greatest value. Ties go to the lowest index and NaNs never win.
pub fn argmax(xs: impl IntoIterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut max = f64::NEG_INFINITY;
    for (i, x) in xs.into_iter().enumerate() {
        if x > max {
            max = x;
            best = i;
        }
    }

    best
}
