use crate::blas::{self, Diag, Side, Trans, UpLo};
use crate::linalg::LinalgError;
use crate::Matrix;

/// QR decomposition of a matrix A.
///
/// For an m-by-n matrix A with `m >= n`, the QR decomposition is
/// `A = Q * R`, where Q is an m-by-n matrix with orthonormal columns and R
/// is an n-by-n upper triangular matrix.
///
/// The decomposition is constructed even if A is rank deficient; the
/// least-squares solve, which is its primary use, is only feasible when
/// [`is_full_rank`](QrDecomposition::is_full_rank) holds.
///
/// # Example
///
/// ```
/// use densemat::Matrix;
///
/// // Least-squares fit of y = c0 + c1*x through (0,1), (1,2), (2,4)
/// let a = Matrix::from_rows(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
/// let b = Matrix::from_rows(3, 1, &[1.0, 2.0, 4.0]);
/// let x = a.qrd().solve(&b).unwrap();
/// assert!((x.get(0, 0) - 5.0 / 6.0).abs() < 1e-10);
/// assert!((x.get(1, 0) - 3.0 / 2.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct QrDecomposition {
    m: usize,
    n: usize,
    /// Packed factorization: R in and above the diagonal, the Householder
    /// vectors (with implicit leading 1) below it.
    qr: Vec<f64>,
    /// Scale factors of the elementary reflectors.
    tau: Vec<f64>,
}

impl QrDecomposition {
    /// Factor the matrix with Householder reflections.
    ///
    /// Panics unless `m >= n`.
    pub fn new(a: &Matrix) -> Self {
        let m = a.nrows();
        let n = a.ncols();
        assert!(m >= n, "QR decomposition requires m >= n");

        let mut qr = a.packed_columns();
        let mut tau = vec![0.0; n];

        for k in 0..n {
            let mut norm_sq = 0.0;
            for i in k..m {
                let v = qr[i + k * m];
                norm_sq += v * v;
            }
            // A zero column needs no reflector; tau stays 0 and the R
            // diagonal entry stays 0, marking the rank deficiency.
            if norm_sq == 0.0 {
                continue;
            }

            let norm = norm_sq.sqrt();
            let akk = qr[k + k * m];
            // Choose the sign that avoids cancellation in v0.
            let sigma = if akk >= 0.0 { norm } else { -norm };
            let v0 = akk + sigma;
            tau[k] = v0 / sigma;

            // Store the reflector scaled so its leading entry is 1.
            for i in (k + 1)..m {
                qr[i + k * m] /= v0;
            }

            // Apply H = I - tau * v * v^T to the trailing columns.
            for j in (k + 1)..n {
                let mut dot = qr[k + j * m];
                for i in (k + 1)..m {
                    dot += qr[i + k * m] * qr[i + j * m];
                }
                dot *= tau[k];
                qr[k + j * m] -= dot;
                for i in (k + 1)..m {
                    qr[i + j * m] -= dot * qr[i + k * m];
                }
            }

            qr[k + k * m] = -sigma;
        }

        Self { m, n, qr, tau }
    }

    /// Whether A is of full rank: true iff every diagonal entry of R is
    /// nonzero.
    pub fn is_full_rank(&self) -> bool {
        (0..self.n).all(|j| self.qr[j + j * self.m] != 0.0)
    }

    /// The m-by-n factor Q with orthonormal columns, reconstructed by
    /// applying the stored reflectors to the thin identity.
    pub fn q(&self) -> Matrix {
        let m = self.m;
        let n = self.n;
        let mut q = vec![0.0; m * n];
        for i in 0..n {
            q[i + i * m] = 1.0;
        }

        for k in (0..n).rev() {
            let tau = self.tau[k];
            for j in k..n {
                let mut dot = q[k + j * m];
                for i in (k + 1)..m {
                    dot += self.qr[i + k * m] * q[i + j * m];
                }
                dot *= tau;
                q[k + j * m] -= dot;
                for i in (k + 1)..m {
                    q[i + j * m] -= dot * self.qr[i + k * m];
                }
            }
        }

        Matrix::from_packed(m, n, q)
    }

    /// The n-by-n upper triangular factor R.
    pub fn r(&self) -> Matrix {
        let n = self.n;
        let mut r = vec![0.0; n * n];
        for j in 0..n {
            for i in 0..=j {
                r[i + j * n] = self.qr[i + j * self.m];
            }
        }
        Matrix::from_packed(n, n, r)
    }

    /// The least-squares solution X minimizing `||A * X - B||`.
    ///
    /// `B` must have the same number of rows (m) as A and may have any
    /// number of columns. Returns [`LinalgError::RankDeficient`] unless A
    /// is of full rank.
    pub fn solve(&self, b: &Matrix) -> Result<Matrix, LinalgError> {
        assert_eq!(
            b.nrows(),
            self.m,
            "A and B must have the same number of rows",
        );
        if !self.is_full_rank() {
            return Err(LinalgError::RankDeficient);
        }

        let m = self.m;
        let n = self.n;
        let nrhs = b.ncols();

        // C = Q^T * B, applying the reflectors in order. C keeps all m rows
        // because it overwrites a copy of B.
        let mut c = b.packed_columns();
        for k in 0..n {
            let tau = self.tau[k];
            for j in 0..nrhs {
                let mut dot = c[k + j * m];
                for i in (k + 1)..m {
                    dot += self.qr[i + k * m] * c[i + j * m];
                }
                dot *= tau;
                c[k + j * m] -= dot;
                for i in (k + 1)..m {
                    c[i + j * m] -= dot * self.qr[i + k * m];
                }
            }
        }

        // Solve R * X = C against the packed factor, then discard the
        // extra m - n rows.
        blas::trsm(
            Side::Left,
            UpLo::Upper,
            Trans::No,
            Diag::NonUnit,
            n,
            nrhs,
            1.0,
            &self.qr,
            m,
            &mut c,
            m,
        );

        let mut x = vec![0.0; n * nrhs];
        for j in 0..nrhs {
            x[j * n..j * n + n].copy_from_slice(&c[j * m..j * m + n]);
        }
        Ok(Matrix::from_packed(n, nrhs, x))
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
        let a = Matrix::from_rows(
            3,
            3,
            &[12.0, -51.0, 4.0, 6.0, 167.0, -68.0, -4.0, 24.0, -41.0],
        );
        let qrd = a.qrd();
        let qr = &qrd.q() * &qrd.r();
        assert_matrix_near(&qr, &a, TOL, "Q*R");
    }

    #[test]
    fn q_has_orthonormal_columns() {
        let a = Matrix::from_rows(
            4,
            3,
            &[1.0, -1.0, 4.0, 1.0, 4.0, -2.0, 1.0, 4.0, 2.0, 1.0, -1.0, 0.0],
        );
        let qrd = a.qrd();
        let q = qrd.q();
        let qtq = q.transpose_mul(&q);
        assert_matrix_near(&qtq, &Matrix::identity(3, 3), TOL, "Q^T*Q");
        let qr = &q * &qrd.r();
        assert_matrix_near(&qr, &a, TOL, "Q*R rectangular");
    }

    #[test]
    fn r_is_upper_triangular() {
        let a = Matrix::random(5, 3);
        let r = a.qrd().r();
        for i in 1..3 {
            for j in 0..i {
                assert_eq!(r.get(i, j), 0.0);
            }
        }
    }

    #[test]
    fn solve_square_matches_lu() {
        let a = Matrix::from_rows(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let b = Matrix::from_rows(3, 1, &[8.0, -11.0, -3.0]);
        let x_qr = a.qrd().solve(&b).unwrap();
        let x_lu = a.lud().solve(&b).unwrap();
        assert_matrix_near(&x_qr, &x_lu, TOL, "QR vs LU");
    }

    #[test]
    fn least_squares_matches_normal_equations() {
        let a = Matrix::from_rows(
            4,
            2,
            &[1.0, 0.5, 1.0, 1.5, 1.0, 2.5, 1.0, 4.0],
        );
        let b = Matrix::from_rows(4, 1, &[1.0, 2.0, 3.0, 5.0]);
        let x = a.qrd().solve(&b).unwrap();
        assert_eq!(x.nrows(), 2);
        assert_eq!(x.ncols(), 1);

        // Solve the normal equations A^T A x = A^T b independently.
        let ata = a.transpose_mul(&a);
        let atb = a.transpose_mul(&b);
        let x_ne = ata.lud().solve(&atb).unwrap();
        assert_matrix_near(&x, &x_ne, 1e-9, "QR vs normal equations");

        // The residual must be orthogonal to the column space.
        let r = &b - &(&a * &x);
        let atr = a.transpose_mul(&r);
        for i in 0..2 {
            assert!(atr.get(i, 0).abs() < TOL, "A^T r [{}]", i);
        }
    }

    #[test]
    fn solve_multiple_rhs() {
        let a = Matrix::from_rows(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let b = Matrix::from_rows(3, 2, &[1.0, 0.0, 2.0, 1.0, 4.0, 2.0]);
        let x = a.qrd().solve(&b).unwrap();
        assert!((x.get(0, 0) - 5.0 / 6.0).abs() < TOL);
        assert!((x.get(1, 0) - 3.0 / 2.0).abs() < TOL);
        // The second right-hand side lies exactly in the column space.
        assert!(x.get(0, 1).abs() < TOL);
        assert!((x.get(1, 1) - 1.0).abs() < TOL);
    }

    #[test]
    #[should_panic(expected = "m >= n")]
    fn wide_matrix_panics() {
        let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let _ = a.qrd();
    }

    #[test]
    fn rank_deficient_flag_and_solve_error() {
        let a = Matrix::from_rows(3, 2, &[1.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
        let qrd = a.qrd();
        assert!(!qrd.is_full_rank());
        let b = Matrix::from_rows(3, 1, &[1.0, 1.0, 1.0]);
        assert_eq!(qrd.solve(&b).unwrap_err(), LinalgError::RankDeficient);
    }

    #[test]
    fn full_rank_flag() {
        let a = Matrix::from_rows(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        assert!(a.qrd().is_full_rank());
    }

    #[test]
    fn queries_are_idempotent() {
        let a = Matrix::from_rows(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let qrd = a.qrd();
        assert_eq!(qrd.q(), qrd.q());
        assert_eq!(qrd.r(), qrd.r());
    }
}
