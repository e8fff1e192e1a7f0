use crate::linalg::LinalgError;
use crate::Matrix;

/// Cholesky decomposition of a symmetric positive-definite matrix A.
///
/// For a symmetric positive-definite n-by-n matrix A, the decomposition is
/// `A = L * L^T`, where L is lower triangular.
///
/// Symmetry is assumed, not verified: only the lower triangle of A is
/// read, so passing a non-symmetric matrix silently factors the symmetric
/// matrix implied by that triangle. Positive definiteness, by contrast, is
/// detected during factorization and reported through
/// [`is_positive_definite`](CholeskyDecomposition::is_positive_definite);
/// the solve refuses to run without it.
///
/// # Example
///
/// ```
/// use densemat::Matrix;
///
/// let a = Matrix::from_rows(3, 3, &[
///     4.0, 12.0, -16.0,
///     12.0, 37.0, -43.0,
///     -16.0, -43.0, 98.0,
/// ]);
/// let chd = a.chd();
/// assert!(chd.is_positive_definite());
/// assert!((chd.det() - 36.0).abs() < 1e-10);
/// let l = chd.l();
/// assert!((l.get(1, 0) - 6.0).abs() < 1e-12);
/// assert!((l.get(2, 1) - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CholeskyDecomposition {
    n: usize,
    /// The factor L; the upper triangle is explicitly zeroed.
    l: Vec<f64>,
    positive_definite: bool,
    det: f64,
}

impl CholeskyDecomposition {
    /// Factor the lower triangle of the matrix.
    ///
    /// Panics unless the matrix is square. A non-positive pivot stops the
    /// factorization and clears the positive-definite flag.
    pub fn new(a: &Matrix) -> Self {
        assert!(a.is_square(), "Cholesky decomposition requires a square matrix");
        let n = a.nrows();
        let mut l = a.packed_columns();
        let mut positive_definite = true;
        let mut det = 1.0;

        for j in 0..n {
            // Left-looking update: fold every previous column into column j.
            for k in 0..j {
                let t = l[j + k * n];
                if t != 0.0 {
                    for i in j..n {
                        l[i + j * n] -= t * l[i + k * n];
                    }
                }
            }

            let d = l[j + j * n];
            if d <= 0.0 {
                positive_definite = false;
                det = 0.0;
                break;
            }
            det *= d;

            let s = d.sqrt();
            l[j + j * n] = s;
            for i in (j + 1)..n {
                l[i + j * n] /= s;
            }
        }

        // The factor is lower triangular; clear whatever the source matrix
        // carried above the diagonal.
        for j in 1..n {
            for i in 0..j {
                l[i + j * n] = 0.0;
            }
        }

        Self {
            n,
            l,
            positive_definite,
            det,
        }
    }

    /// Whether the factorization completed with strictly positive pivots.
    pub fn is_positive_definite(&self) -> bool {
        self.positive_definite
    }

    /// The lower triangular factor L, as a copy.
    pub fn l(&self) -> Matrix {
        Matrix::from_packed(self.n, self.n, self.l.clone())
    }

    /// The determinant of A: the product of the squared diagonal entries
    /// of L. Meaningful only when the matrix is positive definite; a
    /// failed factorization reports 0.
    pub fn det(&self) -> f64 {
        self.det
    }

    /// Solve `A * X = B`, returning X.
    ///
    /// Requires B to have n rows; returns
    /// [`LinalgError::NotPositiveDefinite`] unless the factorization
    /// succeeded.
    pub fn solve(&self, b: &Matrix) -> Result<Matrix, LinalgError> {
        assert_eq!(
            b.nrows(),
            self.n,
            "A and B must have the same number of rows",
        );
        if !self.positive_definite {
            return Err(LinalgError::NotPositiveDefinite);
        }

        let n = self.n;
        let nrhs = b.ncols();
        let mut x = b.packed_columns();

        for j in 0..nrhs {
            // Forward substitution with L.
            for i in 0..n {
                let mut t = x[i + j * n];
                for k in 0..i {
                    t -= self.l[i + k * n] * x[k + j * n];
                }
                x[i + j * n] = t / self.l[i + i * n];
            }
            // Back substitution with L^T.
            for i in (0..n).rev() {
                let mut t = x[i + j * n];
                for k in (i + 1)..n {
                    t -= self.l[k + i * n] * x[k + j * n];
                }
                x[i + j * n] = t / self.l[i + i * n];
            }
        }

        Ok(Matrix::from_packed(n, nrhs, x))
    }
}
