use crate::linalg::LinalgError;
use crate::Matrix;

/// LU decomposition of a matrix A.
///
/// For an m-by-n matrix A, the LU decomposition is `A = P * L * U`, where P
/// is an m-by-m row permutation matrix, L is an m-by-min(m,n) lower
/// triangular (or trapezoidal) matrix with unit diagonal, and U is a
/// min(m,n)-by-n upper triangular (or trapezoidal) matrix.
///
/// The decomposition with partial pivoting never fails, even for a singular
/// A; construction records a [`is_singular`](LuDecomposition::is_singular)
/// flag instead. Solving a square linear system is only possible when A is
/// non-singular.
///
/// # Example
///
/// ```
/// use densemat::Matrix;
///
/// let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 5.0, 3.0]);
/// let lud = a.lud();
/// assert!(!lud.is_singular());
/// assert!((lud.det() - 1.0).abs() < 1e-12);
///
/// let b = Matrix::from_rows(2, 1, &[4.0, 11.0]);
/// let x = lud.solve(&b).unwrap();
/// assert!((x.get(0, 0) - 1.0).abs() < 1e-12);
/// assert!((x.get(1, 0) - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    m: usize,
    n: usize,
    /// Packed factors: U in and above the diagonal, the multipliers of L
    /// below it.
    lu: Vec<f64>,
    /// Row interchanged with row k at elimination step k; length min(m, n).
    ipiv: Vec<usize>,
    /// Zero-based permutation: row `p[i]` of the factored system came from
    /// row i of A.
    p: Vec<usize>,
    det: f64,
    singular: bool,
}

impl LuDecomposition {
    /// Factor the matrix by Gaussian elimination with partial pivoting.
    ///
    /// Works for any m-by-n shape and never fails; a zero pivot column is
    /// skipped and recorded in the singular flag.
    pub fn new(a: &Matrix) -> Self {
        let m = a.nrows();
        let n = a.ncols();
        let mut lu = a.packed_columns();
        let npiv = m.min(n);
        let mut ipiv = vec![0usize; npiv];
        let mut singular = false;

        for k in 0..npiv {
            // Largest-magnitude entry in column k at or below the diagonal.
            let mut piv = k;
            let mut max = lu[k + k * m].abs();
            for i in (k + 1)..m {
                let v = lu[i + k * m].abs();
                if v > max {
                    max = v;
                    piv = i;
                }
            }
            ipiv[k] = piv;

            if lu[piv + k * m] == 0.0 {
                singular = true;
                continue;
            }

            if piv != k {
                for j in 0..n {
                    lu.swap(k + j * m, piv + j * m);
                }
            }

            // Scale the sub-column, then the rank-1 trailing update. Both
            // inner loops run down contiguous column data.
            let pivot = lu[k + k * m];
            for i in (k + 1)..m {
                lu[i + k * m] /= pivot;
            }
            for j in (k + 1)..n {
                let t = lu[k + j * m];
                if t != 0.0 {
                    for i in (k + 1)..m {
                        lu[i + j * m] -= t * lu[i + k * m];
                    }
                }
            }
        }

        // Replay the interchanges to build the permutation; each swap
        // flips the determinant sign.
        let mut p: Vec<usize> = (0..m).collect();
        let mut det = 1.0;
        for k in 0..npiv {
            det *= lu[k + k * m];
            if ipiv[k] != k {
                p.swap(k, ipiv[k]);
                det = -det;
            }
        }

        Self {
            m,
            n,
            lu,
            ipiv,
            p,
            det,
            singular,
        }
    }

    /// Whether A is singular. A singular decomposition cannot be used to
    /// solve linear systems.
    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// The lower triangular (or trapezoidal) factor L, m-by-min(m,n) with
    /// unit diagonal.
    pub fn l(&self) -> Matrix {
        let m = self.m;
        let n = self.m.min(self.n);
        let mut l = vec![0.0; m * n];
        for j in 0..n {
            l[j + j * m] = 1.0;
            for i in (j + 1)..m {
                l[i + j * m] = self.lu[i + j * self.m];
            }
        }
        Matrix::from_packed(m, n, l)
    }

    /// The upper triangular (or trapezoidal) factor U, min(m,n)-by-n.
    pub fn u(&self) -> Matrix {
        let m = self.m.min(self.n);
        let n = self.n;
        let mut u = vec![0.0; m * n];
        for j in 0..n {
            for i in 0..=j.min(m - 1) {
                u[i + j * m] = self.lu[i + j * self.m];
            }
        }
        Matrix::from_packed(m, n, u)
    }

    /// The m-by-m row permutation matrix P, with `P * L * U = A`.
    pub fn p_matrix(&self) -> Matrix {
        let m = self.m;
        let mut p = vec![0.0; m * m];
        for (i, &pi) in self.p.iter().enumerate() {
            p[pi + i * m] = 1.0;
        }
        Matrix::from_packed(m, m, p)
    }

    /// The zero-based row permutation (pivot) indices: row i of A was
    /// interchanged with row `p[i]`.
    pub fn pivot_indices(&self) -> Vec<usize> {
        self.p.clone()
    }

    /// The determinant of the square matrix A.
    ///
    /// Panics unless A is square.
    pub fn det(&self) -> f64 {
        assert_eq!(self.m, self.n, "determinant requires a square matrix");
        self.det
    }

    /// Solve `A * X = B`, returning X.
    ///
    /// Requires a square A with the same number of rows as B; returns
    /// [`LinalgError::Singular`] if the decomposition found A singular.
    pub fn solve(&self, b: &Matrix) -> Result<Matrix, LinalgError> {
        assert_eq!(self.m, self.n, "LU solve requires a square matrix");
        assert_eq!(
            b.nrows(),
            self.m,
            "A and B must have the same number of rows",
        );
        if self.singular {
            return Err(LinalgError::Singular);
        }

        let m = self.m;
        let n = self.n;
        let nrhs = b.ncols();
        let mut x = b.packed_columns();

        // Apply the recorded row interchanges to B, then forward- and
        // back-substitute through the packed factors.
        for k in 0..n {
            let piv = self.ipiv[k];
            if piv != k {
                for j in 0..nrhs {
                    x.swap(k + j * m, piv + j * m);
                }
            }
        }
        for j in 0..nrhs {
            for k in 0..n {
                let t = x[k + j * m];
                if t != 0.0 {
                    for i in (k + 1)..n {
                        x[i + j * m] -= t * self.lu[i + k * m];
                    }
                }
            }
            for k in (0..n).rev() {
                x[k + j * m] /= self.lu[k + k * m];
                let t = x[k + j * m];
                if t != 0.0 {
                    for i in 0..k {
                        x[i + j * m] -= t * self.lu[i + k * m];
                    }
                }
            }
        }

        Ok(Matrix::from_packed(m, nrhs, x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn assert_matrix_near(a: &Matrix, b: &Matrix, tol: f64, msg: &str) {
        assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()), "{}: shape", msg);
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                assert!(
                    (a.get(i, j) - b.get(i, j)).abs() < tol,
                    "{}: ({},{}) {} vs {}",
                    msg,
                    i,
                    j,
                    a.get(i, j),
                    b.get(i, j),
                );
            }
        }
    }

    #[test]
    fn reconstruction_square() {
        let a = Matrix::from_rows(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let lud = a.lud();
        let plu = &lud.p_matrix() * &(&lud.l() * &lud.u());
        assert_matrix_near(&plu, &a, TOL, "P*L*U");
    }

    #[test]
    fn reconstruction_tall() {
        let a = Matrix::from_rows(4, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0]);
        let lud = a.lud();
        assert_eq!(lud.l().nrows(), 4);
        assert_eq!(lud.l().ncols(), 2);
        assert_eq!(lud.u().nrows(), 2);
        assert_eq!(lud.u().ncols(), 2);
        let plu = &lud.p_matrix() * &(&lud.l() * &lud.u());
        assert_matrix_near(&plu, &a, TOL, "P*L*U tall");
    }

    #[test]
    fn reconstruction_wide() {
        let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let lud = a.lud();
        let plu = &lud.p_matrix() * &(&lud.l() * &lud.u());
        assert_matrix_near(&plu, &a, TOL, "P*L*U wide");
    }

    #[test]
    fn factors_are_triangular() {
        let a = Matrix::from_rows(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let lud = a.lud();
        let l = lud.l();
        let u = lud.u();
        for i in 0..3 {
            assert!((l.get(i, i) - 1.0).abs() < TOL, "unit diagonal");
            for j in (i + 1)..3 {
                assert_eq!(l.get(i, j), 0.0, "L upper");
            }
            for j in 0..i {
                assert_eq!(u.get(i, j), 0.0, "U lower");
            }
        }
    }

    #[test]
    fn det_known() {
        let a = Matrix::from_rows(3, 3, &[6.0, 1.0, 1.0, 4.0, -2.0, 5.0, 2.0, 8.0, 7.0]);
        assert!((a.lud().det() - (-306.0)).abs() < 1e-9);
    }

    #[test]
    fn det_sign_flips_under_row_swap() {
        let a = Matrix::from_rows(3, 3, &[6.0, 1.0, 1.0, 4.0, -2.0, 5.0, 2.0, 8.0, 7.0]);
        let swapped = a.select_rows(&[1, 0, 2]);
        assert!((a.det() + swapped.det()).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "square")]
    fn det_non_square_panics() {
        let a = Matrix::from_rows(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let _ = a.lud().det();
    }

    #[test]
    fn singular_flag_and_solve_error() {
        let a = Matrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let lud = a.lud();
        assert!(lud.is_singular());
        assert!((lud.det()).abs() < TOL);
        let b = Matrix::identity(2, 2);
        assert_eq!(lud.solve(&b).unwrap_err(), LinalgError::Singular);
    }

    #[test]
    fn solve_multiple_rhs() {
        let a = Matrix::from_rows(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let b = Matrix::from_rows(3, 2, &[8.0, 1.0, -11.0, 0.0, -3.0, 2.0]);
        let x = a.lud().solve(&b).unwrap();
        let ax = &a * &x;
        assert_matrix_near(&ax, &b, TOL, "A*X = B");
        assert!((x.get(0, 0) - 2.0).abs() < TOL);
        assert!((x.get(1, 0) - 3.0).abs() < TOL);
        assert!((x.get(2, 0) + 1.0).abs() < TOL);
    }

    #[test]
    fn pivot_indices_describe_p() {
        let a = Matrix::from_rows(3, 3, &[0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 3.0, 0.0, 0.0]);
        let lud = a.lud();
        let p = lud.pivot_indices();
        let pm = lud.p_matrix();
        for (i, &pi) in p.iter().enumerate() {
            assert_eq!(pm.get(pi, i), 1.0);
        }
    }

    #[test]
    fn queries_are_idempotent() {
        let a = Matrix::from_rows(2, 2, &[3.0, 1.0, 4.0, 2.0]);
        let lud = a.lud();
        assert_eq!(lud.l(), lud.l());
        assert_eq!(lud.u(), lud.u());
        assert_eq!(lud.p_matrix(), lud.p_matrix());
    }
}
