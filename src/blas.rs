//! BLAS-style computational kernels on packed column-major arrays.
//!
//! The two routines here are the only places in the crate that multiply
//! matrices or solve triangular systems; [`crate::Matrix`] and the
//! decompositions delegate to them. Both operate directly on flat
//! column-major slices with explicit leading dimensions, so a caller can
//! address a sub-matrix of a larger packed array without copying.
//!
//! Following the classical BLAS contract, these routines do not validate
//! dimensions beyond debug assertions; callers are responsible for passing
//! consistent `m`/`n`/`k` and leading dimensions.

/// Transpose flag for [`gemm`] and [`trsm`] operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trans {
    /// Use the operand as stored.
    No,
    /// Use the transpose of the operand.
    Trans,
}

/// Which side a triangular operand multiplies from in [`trsm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Solve `op(A) * X = alpha * B`.
    Left,
    /// Solve `X * op(A) = alpha * B`.
    Right,
}

/// Which triangle of a [`trsm`] operand holds the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpLo {
    Upper,
    Lower,
}

/// Whether a triangular operand has an implicit unit diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diag {
    NonUnit,
    Unit,
}

/// General matrix-matrix product: `C := alpha * op(A) * op(B) + beta * C`.
///
/// `op(A)` is `m` by `k` and `op(B)` is `k` by `n`; `C` is `m` by `n`.
/// All three arrays are column-major with leading dimensions `lda`, `ldb`,
/// `ldc`. With `trans_a == Trans::No` element (i, j) of `A` is
/// `a[i + j*lda]`; with `Trans::Trans` it is `a[j + i*lda]`.
///
/// The untransposed loop nests run down columns so the innermost loop is an
/// AXPY over contiguous memory.
///
/// # Example
///
/// ```
/// use densemat::blas::{gemm, Trans};
///
/// // A = [[1, 3], [2, 4]] (column-major), B = I
/// let a = [1.0, 2.0, 3.0, 4.0];
/// let b = [1.0, 0.0, 0.0, 1.0];
/// let mut c = [0.0; 4];
/// gemm(Trans::No, Trans::No, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2);
/// assert_eq!(c, a);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn gemm(
    trans_a: Trans,
    trans_b: Trans,
    m: usize,
    n: usize,
    k: usize,
    alpha: f64,
    a: &[f64],
    lda: usize,
    b: &[f64],
    ldb: usize,
    beta: f64,
    c: &mut [f64],
    ldc: usize,
) {
    debug_assert!(ldc >= m.max(1));
    debug_assert!(n == 0 || c.len() >= (n - 1) * ldc + m);

    // C := beta * C
    for j in 0..n {
        let col = &mut c[j * ldc..j * ldc + m];
        if beta == 0.0 {
            col.fill(0.0);
        } else if beta != 1.0 {
            for x in col.iter_mut() {
                *x *= beta;
            }
        }
    }
    if alpha == 0.0 || k == 0 {
        return;
    }

    match (trans_a, trans_b) {
        (Trans::No, Trans::No) => {
            // C[:, j] += alpha * B[l, j] * A[:, l]
            for j in 0..n {
                for l in 0..k {
                    let t = alpha * b[l + j * ldb];
                    if t != 0.0 {
                        for i in 0..m {
                            c[i + j * ldc] += t * a[i + l * lda];
                        }
                    }
                }
            }
        }
        (Trans::No, Trans::Trans) => {
            for j in 0..n {
                for l in 0..k {
                    let t = alpha * b[j + l * ldb];
                    if t != 0.0 {
                        for i in 0..m {
                            c[i + j * ldc] += t * a[i + l * lda];
                        }
                    }
                }
            }
        }
        (Trans::Trans, Trans::No) => {
            // C[i, j] += alpha * A[:, i] . B[:, j]
            for j in 0..n {
                for i in 0..m {
                    let mut s = 0.0;
                    for l in 0..k {
                        s += a[l + i * lda] * b[l + j * ldb];
                    }
                    c[i + j * ldc] += alpha * s;
                }
            }
        }
        (Trans::Trans, Trans::Trans) => {
            for j in 0..n {
                for i in 0..m {
                    let mut s = 0.0;
                    for l in 0..k {
                        s += a[l + i * lda] * b[j + l * ldb];
                    }
                    c[i + j * ldc] += alpha * s;
                }
            }
        }
    }
}

/// Triangular solve in place: `op(A) * X = alpha * B` (left side) or
/// `X * op(A) = alpha * B` (right side), overwriting `B` with `X`.
///
/// `A` is an `m` by `m` (left) or `n` by `n` (right) triangular matrix
/// stored column-major with leading dimension `lda`; only the triangle
/// named by `uplo` is referenced, and with `Diag::Unit` the diagonal is
/// taken to be one without being read. `B` is `m` by `n` with leading
/// dimension `ldb`.
///
/// The diagonal is not checked for zeros; solving against a singular
/// triangle produces infinities or NaNs, exactly as the classical routine
/// does. Callers gate on their own rank/singularity flags first.
#[allow(clippy::too_many_arguments)]
pub fn trsm(
    side: Side,
    uplo: UpLo,
    trans_a: Trans,
    diag: Diag,
    m: usize,
    n: usize,
    alpha: f64,
    a: &[f64],
    lda: usize,
    b: &mut [f64],
    ldb: usize,
) {
    debug_assert!(ldb >= m.max(1));
    debug_assert!(n == 0 || b.len() >= (n - 1) * ldb + m);

    if alpha != 1.0 {
        for j in 0..n {
            for i in 0..m {
                b[i + j * ldb] *= alpha;
            }
        }
    }

    // Effective element op(A)[i, k] and whether the effective matrix is
    // upper triangular after applying the transpose flag.
    let elem = |i: usize, k: usize| -> f64 {
        match trans_a {
            Trans::No => a[i + k * lda],
            Trans::Trans => a[k + i * lda],
        }
    };
    let upper = (uplo == UpLo::Upper) == (trans_a == Trans::No);
    let unit = diag == Diag::Unit;

    match side {
        Side::Left => {
            debug_assert!(lda >= m.max(1));
            // Solve op(A) x = b for each column of B.
            for j in 0..n {
                if upper {
                    for i in (0..m).rev() {
                        let mut t = b[i + j * ldb];
                        for k in (i + 1)..m {
                            t -= elem(i, k) * b[k + j * ldb];
                        }
                        if !unit {
                            t /= elem(i, i);
                        }
                        b[i + j * ldb] = t;
                    }
                } else {
                    for i in 0..m {
                        let mut t = b[i + j * ldb];
                        for k in 0..i {
                            t -= elem(i, k) * b[k + j * ldb];
                        }
                        if !unit {
                            t /= elem(i, i);
                        }
                        b[i + j * ldb] = t;
                    }
                }
            }
        }
        Side::Right => {
            debug_assert!(lda >= n.max(1));
            // X op(A) = B row by row is op(A)^T x^T = b^T, which flips the
            // effective triangle.
            for i in 0..m {
                if upper {
                    for p in 0..n {
                        let mut t = b[i + p * ldb];
                        for k in 0..p {
                            t -= elem(k, p) * b[i + k * ldb];
                        }
                        if !unit {
                            t /= elem(p, p);
                        }
                        b[i + p * ldb] = t;
                    }
                } else {
                    for p in (0..n).rev() {
                        let mut t = b[i + p * ldb];
                        for k in (p + 1)..n {
                            t -= elem(k, p) * b[i + k * ldb];
                        }
                        if !unit {
                            t /= elem(p, p);
                        }
                        b[i + p * ldb] = t;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn assert_near(a: f64, b: f64, msg: &str) {
        assert!((a - b).abs() < TOL, "{}: {} vs {}", msg, a, b);
    }

    #[test]
    fn gemm_2x2() {
        // A = [[1, 2], [3, 4]], B = [[5, 6], [7, 8]] (row-major view)
        let a = [1.0, 3.0, 2.0, 4.0];
        let b = [5.0, 7.0, 6.0, 8.0];
        let mut c = [0.0; 4];
        gemm(Trans::No, Trans::No, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2);
        // A*B = [[19, 22], [43, 50]]
        assert_near(c[0], 19.0, "c00");
        assert_near(c[1], 43.0, "c10");
        assert_near(c[2], 22.0, "c01");
        assert_near(c[3], 50.0, "c11");
    }

    #[test]
    fn gemm_transpose_flags() {
        let a = [1.0, 3.0, 2.0, 4.0]; // A = [[1, 2], [3, 4]]
        let b = [5.0, 7.0, 6.0, 8.0]; // B = [[5, 6], [7, 8]]

        // A^T * B = [[1,3],[2,4]]*[[5,6],[7,8]] = [[26, 30], [38, 44]]
        let mut c = [0.0; 4];
        gemm(Trans::Trans, Trans::No, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2);
        assert_near(c[0], 26.0, "atb 00");
        assert_near(c[1], 38.0, "atb 10");
        assert_near(c[2], 30.0, "atb 01");
        assert_near(c[3], 44.0, "atb 11");

        // A * B^T = [[1,2],[3,4]]*[[5,7],[6,8]] = [[17, 23], [39, 53]]
        let mut c = [0.0; 4];
        gemm(Trans::No, Trans::Trans, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2);
        assert_near(c[0], 17.0, "abt 00");
        assert_near(c[1], 39.0, "abt 10");
        assert_near(c[2], 23.0, "abt 01");
        assert_near(c[3], 53.0, "abt 11");
    }

    #[test]
    fn gemm_alpha_beta() {
        let a = [1.0, 0.0, 0.0, 1.0];
        let b = [1.0, 2.0, 3.0, 4.0];
        let mut c = [10.0, 10.0, 10.0, 10.0];
        gemm(Trans::No, Trans::No, 2, 2, 2, 2.0, &a, 2, &b, 2, 0.5, &mut c, 2);
        // 2*I*B + 0.5*C
        assert_near(c[0], 7.0, "c00");
        assert_near(c[1], 9.0, "c10");
        assert_near(c[2], 11.0, "c01");
        assert_near(c[3], 13.0, "c11");
    }

    #[test]
    fn gemm_submatrix_via_lda() {
        // A is the top-left 2x2 of a 3x3 packed array; lda = 3.
        let a = [1.0, 3.0, 9.0, 2.0, 4.0, 9.0, 9.0, 9.0, 9.0];
        let b = [1.0, 0.0, 0.0, 1.0];
        let mut c = [0.0; 4];
        gemm(Trans::No, Trans::No, 2, 2, 2, 1.0, &a, 3, &b, 2, 0.0, &mut c, 2);
        assert_near(c[0], 1.0, "c00");
        assert_near(c[1], 3.0, "c10");
        assert_near(c[2], 2.0, "c01");
        assert_near(c[3], 4.0, "c11");
    }

    #[test]
    fn trsm_left_upper() {
        // A = [[2, 1], [0, 4]] upper; solve A x = b with b = [4, 8]
        let a = [2.0, 0.0, 1.0, 4.0];
        let mut b = [4.0, 8.0];
        trsm(Side::Left, UpLo::Upper, Trans::No, Diag::NonUnit, 2, 1, 1.0, &a, 2, &mut b, 2);
        // x1 = 2, x0 = (4 - 1*2)/2 = 1
        assert_near(b[0], 1.0, "x0");
        assert_near(b[1], 2.0, "x1");
    }

    #[test]
    fn trsm_left_lower_unit() {
        // L = [[1, 0], [3, 1]] with implicit unit diagonal
        let a = [9.0, 3.0, 9.0, 9.0]; // only the strict lower triangle is read
        let mut b = [1.0, 5.0];
        trsm(Side::Left, UpLo::Lower, Trans::No, Diag::Unit, 2, 1, 1.0, &a, 2, &mut b, 2);
        // x0 = 1, x1 = 5 - 3*1 = 2
        assert_near(b[0], 1.0, "x0");
        assert_near(b[1], 2.0, "x1");
    }

    #[test]
    fn trsm_left_transpose() {
        // Solve A^T x = b with A = [[2, 1], [0, 4]] upper, so A^T is lower.
        let a = [2.0, 0.0, 1.0, 4.0];
        let mut b = [2.0, 9.0];
        trsm(Side::Left, UpLo::Upper, Trans::Trans, Diag::NonUnit, 2, 1, 1.0, &a, 2, &mut b, 2);
        // x0 = 2/2 = 1, x1 = (9 - 1*1)/4 = 2
        assert_near(b[0], 1.0, "x0");
        assert_near(b[1], 2.0, "x1");
    }

    #[test]
    fn trsm_right_upper() {
        // Solve X * A = B with A = [[2, 1], [0, 4]], B = [[2, 9]]
        let a = [2.0, 0.0, 1.0, 4.0];
        let mut b = [2.0, 9.0]; // 1x2, ldb = 1
        trsm(Side::Right, UpLo::Upper, Trans::No, Diag::NonUnit, 1, 2, 1.0, &a, 2, &mut b, 1);
        // x0 = 2/2 = 1, x1 = (9 - 1*1)/4 = 2
        assert_near(b[0], 1.0, "x0");
        assert_near(b[1], 2.0, "x1");
    }

    #[test]
    fn trsm_alpha() {
        let a = [2.0, 0.0, 0.0, 2.0];
        let mut b = [2.0, 4.0];
        trsm(Side::Left, UpLo::Upper, Trans::No, Diag::NonUnit, 2, 1, 2.0, &a, 2, &mut b, 2);
        assert_near(b[0], 2.0, "x0");
        assert_near(b[1], 4.0, "x1");
    }
}
