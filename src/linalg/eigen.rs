use crate::linalg::LinalgError;
use crate::Matrix;

/// Eigenvalue and eigenvector decomposition of a square matrix A.
///
/// If A is symmetric, `A = V * D * V^T` where the eigenvalue matrix D is
/// diagonal (real eigenvalues, ascending) and the eigenvector matrix V is
/// orthogonal (`V * V^T = I`).
///
/// If A is not symmetric, the eigenvalue matrix D is block diagonal: a
/// real eigenvalue occupies a 1-by-1 block, and a complex conjugate pair
/// `lambda ± i*mu` occupies a 2-by-2 block `[lambda, mu; -mu, lambda]` at
/// consecutive diagonal positions. The columns of V satisfy `A * V = V * D`,
/// but V may be ill-conditioned or even singular, so `A = V * D * V^-1` is
/// not guaranteed to be numerically usable.
///
/// The branch is selected once at construction by an exact element-wise
/// symmetry test. Failure of the iterative eigenvalue algorithm to
/// converge aborts construction with
/// [`LinalgError::ConvergenceFailure`]; no partial decomposition is
/// produced.
///
/// # Example
///
/// ```
/// use densemat::Matrix;
///
/// let a = Matrix::from_rows(2, 2, &[2.0, -1.0, -1.0, 2.0]);
/// let evd = a.evd().unwrap();
/// let d = evd.real_eigenvalues();
/// assert!((d[0] - 1.0).abs() < 1e-10);
/// assert!((d[1] - 3.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    n: usize,
    /// Eigenvectors, n-by-n column-major.
    v: Vec<f64>,
    /// Real parts of the eigenvalues.
    d: Vec<f64>,
    /// Imaginary parts of the eigenvalues (zero for real eigenvalues).
    e: Vec<f64>,
}

impl EigenDecomposition {
    /// Decompose a square matrix.
    ///
    /// Panics unless the matrix is square.
    pub fn new(a: &Matrix) -> Result<Self, LinalgError> {
        assert!(a.is_square(), "eigendecomposition requires a square matrix");
        let n = a.nrows();
        let mut d = vec![0.0; n];
        let mut e = vec![0.0; n];

        if n == 0 {
            return Ok(Self {
                n,
                v: Vec::new(),
                d,
                e,
            });
        }

        let v = if a.is_symmetric() {
            let mut v = a.packed_columns();
            tred2(n, &mut v, &mut d, &mut e);
            tql2(n, &mut v, &mut d, &mut e)?;
            v
        } else {
            let mut h = a.packed_columns();
            let mut v = vec![0.0; n * n];
            orthes(n, &mut h, &mut v);
            hqr2(n, &mut h, &mut v, &mut d, &mut e)?;
            v
        };

        Ok(Self { n, v, d, e })
    }

    /// The matrix of eigenvectors V, as a copy.
    pub fn v(&self) -> Matrix {
        Matrix::from_packed(self.n, self.n, self.v.clone())
    }

    /// The block diagonal eigenvalue matrix D, materialized from the
    /// stored real and imaginary parts.
    pub fn d(&self) -> Matrix {
        let n = self.n;
        let mut dm = Matrix::zeros(n, n);
        for i in 0..n {
            dm.set(i, i, self.d[i]);
            if self.e[i] > 0.0 {
                dm.set(i, i + 1, self.e[i]);
            } else if self.e[i] < 0.0 {
                dm.set(i, i - 1, self.e[i]);
            }
        }
        dm
    }

    /// The real parts of the eigenvalues, as a copy.
    pub fn real_eigenvalues(&self) -> Vec<f64> {
        self.d.clone()
    }

    /// The imaginary parts of the eigenvalues, as a copy. Complex
    /// eigenvalues come in conjugate pairs at consecutive indices.
    pub fn imag_eigenvalues(&self) -> Vec<f64> {
        self.e.clone()
    }
}

// Symmetric Householder reduction to tridiagonal form, derived from the
// Algol procedure tred2 (Bowdler, Martin, Reinsch, and Wilkinson, Handbook
// for Automatic Computation) and the corresponding EISPACK routine.
//
// On entry `v` holds the symmetric matrix; on return it holds the
// accumulated orthogonal transform, `d` the diagonal of the tridiagonal
// form, and `e` its subdiagonal.
fn tred2(n: usize, v: &mut [f64], d: &mut [f64], e: &mut [f64]) {
    for j in 0..n {
        d[j] = v[(n - 1) + j * n];
    }

    // Householder reduction.
    for i in (1..n).rev() {
        // Scale to avoid under/overflow.
        let mut scale = 0.0;
        let mut h = 0.0;
        for k in 0..i {
            scale += d[k].abs();
        }
        if scale == 0.0 {
            e[i] = d[i - 1];
            for j in 0..i {
                d[j] = v[(i - 1) + j * n];
                v[i + j * n] = 0.0;
                v[j + i * n] = 0.0;
            }
        } else {
            // Generate the Householder vector.
            for k in 0..i {
                d[k] /= scale;
                h += d[k] * d[k];
            }
            let mut f = d[i - 1];
            let mut g = h.sqrt();
            if f > 0.0 {
                g = -g;
            }
            e[i] = scale * g;
            h -= f * g;
            d[i - 1] = f - g;
            for item in e.iter_mut().take(i) {
                *item = 0.0;
            }

            // Apply the similarity transformation to the remaining columns.
            for j in 0..i {
                f = d[j];
                v[j + i * n] = f;
                g = e[j] + v[j + j * n] * f;
                for k in (j + 1)..i {
                    g += v[k + j * n] * d[k];
                    e[k] += v[k + j * n] * f;
                }
                e[j] = g;
            }
            f = 0.0;
            for j in 0..i {
                e[j] /= h;
                f += e[j] * d[j];
            }
            let hh = f / (h + h);
            for j in 0..i {
                e[j] -= hh * d[j];
            }
            for j in 0..i {
                f = d[j];
                g = e[j];
                for k in j..i {
                    v[k + j * n] -= f * e[k] + g * d[k];
                }
                d[j] = v[(i - 1) + j * n];
                v[i + j * n] = 0.0;
            }
        }
        d[i] = h;
    }

    // Accumulate the transformations.
    for i in 0..n.saturating_sub(1) {
        v[(n - 1) + i * n] = v[i + i * n];
        v[i + i * n] = 1.0;
        let h = d[i + 1];
        if h != 0.0 {
            for k in 0..=i {
                d[k] = v[k + (i + 1) * n] / h;
            }
            for j in 0..=i {
                let mut g = 0.0;
                for k in 0..=i {
                    g += v[k + (i + 1) * n] * v[k + j * n];
                }
                for k in 0..=i {
                    v[k + j * n] -= g * d[k];
                }
            }
        }
        for k in 0..=i {
            v[k + (i + 1) * n] = 0.0;
        }
    }
    for j in 0..n {
        d[j] = v[(n - 1) + j * n];
        v[(n - 1) + j * n] = 0.0;
    }
    v[(n - 1) + (n - 1) * n] = 1.0;
    e[0] = 0.0;
}

// Symmetric tridiagonal QL algorithm with implicit shifts, derived from
// the Algol procedure tql2 and the corresponding EISPACK routine.
//
// Diagonalizes the tridiagonal form produced by tred2, accumulating the
// rotations into `v`. Eigenvalues end up in `d`, sorted ascending with
// matching eigenvector columns.
fn tql2(n: usize, v: &mut [f64], d: &mut [f64], e: &mut [f64]) -> Result<(), LinalgError> {
    for i in 1..n {
        e[i - 1] = e[i];
    }
    e[n - 1] = 0.0;

    let mut f = 0.0_f64;
    let mut tst1 = 0.0_f64;
    let eps = f64::EPSILON;
    let max_iter = 30 * n;
    let mut iter = 0usize;

    for l in 0..n {
        // Find a small subdiagonal element.
        tst1 = tst1.max(d[l].abs() + e[l].abs());
        let mut m = l;
        while m < n {
            if e[m].abs() <= eps * tst1 {
                break;
            }
            m += 1;
        }

        // If m == l, d[l] is an eigenvalue; otherwise iterate.
        if m > l {
            loop {
                iter += 1;
                if iter > max_iter {
                    return Err(LinalgError::ConvergenceFailure);
                }

                // Compute the implicit shift.
                let mut g = d[l];
                let mut p = (d[l + 1] - g) / (2.0 * e[l]);
                let mut r = p.hypot(1.0);
                if p < 0.0 {
                    r = -r;
                }
                d[l] = e[l] / (p + r);
                d[l + 1] = e[l] * (p + r);
                let dl1 = d[l + 1];
                let mut h = g - d[l];
                for item in d.iter_mut().take(n).skip(l + 2) {
                    *item -= h;
                }
                f += h;

                // Implicit QL transformation.
                p = d[m];
                let mut c = 1.0_f64;
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l + 1];
                let mut s = 0.0_f64;
                let mut s2 = 0.0_f64;
                for i in (l..m).rev() {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    g = c * e[i];
                    h = c * p;
                    r = p.hypot(e[i]);
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);

                    // Accumulate the rotation.
                    for k in 0..n {
                        h = v[k + (i + 1) * n];
                        v[k + (i + 1) * n] = s * v[k + i * n] + c * h;
                        v[k + i * n] = c * v[k + i * n] - s * h;
                    }
                }
                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;

                if e[l].abs() <= eps * tst1 {
                    break;
                }
            }
        }
        d[l] += f;
        e[l] = 0.0;
    }

    // Sort eigenvalues ascending, carrying the eigenvector columns along.
    for i in 0..n.saturating_sub(1) {
        let mut k = i;
        let mut p = d[i];
        for j in (i + 1)..n {
            if d[j] < p {
                k = j;
                p = d[j];
            }
        }
        if k != i {
            d[k] = d[i];
            d[i] = p;
            for j in 0..n {
                v.swap(j + i * n, j + k * n);
            }
        }
    }

    Ok(())
}

// Nonsymmetric reduction to upper Hessenberg form, derived from the Algol
// procedures orthes and ortran (Martin and Wilkinson) and the
// corresponding EISPACK routines.
//
// On return `h` holds the Hessenberg form (with the reflector vectors
// parked below it during the pass) and `v` the accumulated orthogonal
// transform.
fn orthes(n: usize, h: &mut [f64], v: &mut [f64]) {
    let low = 0;
    let high = n - 1;
    let mut ort = vec![0.0; n];

    for m in (low + 1)..high {
        // Scale the column.
        let mut scale = 0.0;
        for i in m..=high {
            scale += h[i + (m - 1) * n].abs();
        }
        if scale != 0.0 {
            // Compute the Householder transformation.
            let mut hsum = 0.0;
            for i in (m..=high).rev() {
                ort[i] = h[i + (m - 1) * n] / scale;
                hsum += ort[i] * ort[i];
            }
            let mut g = hsum.sqrt();
            if ort[m] > 0.0 {
                g = -g;
            }
            hsum -= ort[m] * g;
            ort[m] -= g;

            // Apply H = (I - u*u'/h) on both sides.
            for j in m..n {
                let mut f = 0.0;
                for i in (m..=high).rev() {
                    f += ort[i] * h[i + j * n];
                }
                f /= hsum;
                for i in m..=high {
                    h[i + j * n] -= f * ort[i];
                }
            }
            for i in 0..=high {
                let mut f = 0.0;
                for j in (m..=high).rev() {
                    f += ort[j] * h[i + j * n];
                }
                f /= hsum;
                for j in m..=high {
                    h[i + j * n] -= f * ort[j];
                }
            }
            ort[m] *= scale;
            h[m + (m - 1) * n] = scale * g;
        }
    }

    // Accumulate the transformations.
    for i in 0..n {
        for j in 0..n {
            v[i + j * n] = if i == j { 1.0 } else { 0.0 };
        }
    }
    for m in ((low + 1)..high).rev() {
        if h[m + (m - 1) * n] != 0.0 {
            for i in (m + 1)..=high {
                ort[i] = h[i + (m - 1) * n];
            }
            for j in m..=high {
                let mut g = 0.0;
                for i in m..=high {
                    g += ort[i] * v[i + j * n];
                }
                // Double division avoids possible underflow.
                g = (g / ort[m]) / h[m + (m - 1) * n];
                for i in m..=high {
                    v[i + j * n] += g * ort[i];
                }
            }
        }
    }
}

// Complex scalar division.
fn cdiv(xr: f64, xi: f64, yr: f64, yi: f64) -> (f64, f64) {
    if yr.abs() > yi.abs() {
        let r = yi / yr;
        let d = yr + r * yi;
        ((xr + r * xi) / d, (xi - r * xr) / d)
    } else {
        let r = yr / yi;
        let d = yi + r * yr;
        ((r * xr + xi) / d, (r * xi - xr) / d)
    }
}

// Nonsymmetric reduction from Hessenberg to real Schur form, derived from
// the Algol procedure hqr2 (Martin and Wilkinson) and the corresponding
// EISPACK routine. Eigenvalues land in (d, e); eigenvectors of the
// original matrix are accumulated into `v` by back-substitution and back
// transformation.
fn hqr2(
    nn: usize,
    h: &mut [f64],
    v: &mut [f64],
    d: &mut [f64],
    e: &mut [f64],
) -> Result<(), LinalgError> {
    let ld = nn;
    let mut n = nn as isize - 1;
    let low = 0usize;
    let high = nn - 1;
    let eps = f64::EPSILON;
    let mut exshift = 0.0_f64;
    let (mut p, mut q, mut r, mut s, mut z) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    let (mut t, mut w, mut x, mut y) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);

    let max_iter = 50 * nn;
    let mut total_iter = 0usize;

    // Compute the matrix norm.
    let mut norm = 0.0_f64;
    for i in 0..nn {
        for j in i.saturating_sub(1)..nn {
            norm += h[i + j * ld].abs();
        }
    }

    // Outer loop over the eigenvalue index.
    let mut iter = 0usize;
    while n >= low as isize {
        let ni = n as usize;

        // Look for a single small subdiagonal element.
        let mut l = ni;
        while l > low {
            s = h[(l - 1) + (l - 1) * ld].abs() + h[l + l * ld].abs();
            if s == 0.0 {
                s = norm;
            }
            if h[l + (l - 1) * ld].abs() < eps * s {
                break;
            }
            l -= 1;
        }

        if l == ni {
            // One root found.
            h[ni + ni * ld] += exshift;
            d[ni] = h[ni + ni * ld];
            e[ni] = 0.0;
            n -= 1;
            iter = 0;
        } else if l == ni - 1 {
            // Two roots found.
            w = h[ni + (ni - 1) * ld] * h[(ni - 1) + ni * ld];
            p = (h[(ni - 1) + (ni - 1) * ld] - h[ni + ni * ld]) / 2.0;
            q = p * p + w;
            z = q.abs().sqrt();
            h[ni + ni * ld] += exshift;
            h[(ni - 1) + (ni - 1) * ld] += exshift;
            x = h[ni + ni * ld];

            if q >= 0.0 {
                // Real pair.
                z = if p >= 0.0 { p + z } else { p - z };
                d[ni - 1] = x + z;
                d[ni] = d[ni - 1];
                if z != 0.0 {
                    d[ni] = x - w / z;
                }
                e[ni - 1] = 0.0;
                e[ni] = 0.0;
                x = h[ni + (ni - 1) * ld];
                s = x.abs() + z.abs();
                p = x / s;
                q = z / s;
                r = (p * p + q * q).sqrt();
                p /= r;
                q /= r;

                // Row modification.
                for j in (ni - 1)..nn {
                    z = h[(ni - 1) + j * ld];
                    h[(ni - 1) + j * ld] = q * z + p * h[ni + j * ld];
                    h[ni + j * ld] = q * h[ni + j * ld] - p * z;
                }
                // Column modification.
                for i in 0..=ni {
                    z = h[i + (ni - 1) * ld];
                    h[i + (ni - 1) * ld] = q * z + p * h[i + ni * ld];
                    h[i + ni * ld] = q * h[i + ni * ld] - p * z;
                }
                // Accumulate the transformations.
                for i in low..=high {
                    z = v[i + (ni - 1) * ld];
                    v[i + (ni - 1) * ld] = q * z + p * v[i + ni * ld];
                    v[i + ni * ld] = q * v[i + ni * ld] - p * z;
                }
            } else {
                // Complex pair.
                d[ni - 1] = x + p;
                d[ni] = x + p;
                e[ni - 1] = z;
                e[ni] = -z;
            }
            n -= 2;
            iter = 0;
        } else {
            // No convergence yet; form a shift.
            x = h[ni + ni * ld];
            y = 0.0;
            w = 0.0;
            if l < ni {
                y = h[(ni - 1) + (ni - 1) * ld];
                w = h[ni + (ni - 1) * ld] * h[(ni - 1) + ni * ld];
            }

            // Wilkinson's original ad hoc shift.
            if iter == 10 {
                exshift += x;
                for i in low..=ni {
                    h[i + i * ld] -= x;
                }
                s = h[ni + (ni - 1) * ld].abs() + h[(ni - 1) + (ni - 2) * ld].abs();
                x = 0.75 * s;
                y = x;
                w = -0.4375 * s * s;
            }

            // MATLAB's ad hoc shift.
            if iter == 30 {
                s = (y - x) / 2.0;
                s = s * s + w;
                if s > 0.0 {
                    s = s.sqrt();
                    if y < x {
                        s = -s;
                    }
                    s = x - w / ((y - x) / 2.0 + s);
                    for i in low..=ni {
                        h[i + i * ld] -= s;
                    }
                    exshift += s;
                    x = 0.964;
                    y = 0.964;
                    w = 0.964;
                }
            }

            iter += 1;
            total_iter += 1;
            if total_iter > max_iter {
                return Err(LinalgError::ConvergenceFailure);
            }

            // Look for two consecutive small subdiagonal elements.
            let mut m = ni - 2;
            loop {
                z = h[m + m * ld];
                r = x - z;
                s = y - z;
                p = (r * s - w) / h[(m + 1) + m * ld] + h[m + (m + 1) * ld];
                q = h[(m + 1) + (m + 1) * ld] - z - r - s;
                r = h[(m + 2) + (m + 1) * ld];
                s = p.abs() + q.abs() + r.abs();
                p /= s;
                q /= s;
                r /= s;
                if m == l {
                    break;
                }
                if h[m + (m - 1) * ld].abs() * (q.abs() + r.abs())
                    < eps
                        * (p.abs()
                            * (h[(m - 1) + (m - 1) * ld].abs()
                                + z.abs()
                                + h[(m + 1) + (m + 1) * ld].abs()))
                {
                    break;
                }
                m -= 1;
            }
            for i in (m + 2)..=ni {
                h[i + (i - 2) * ld] = 0.0;
                if i > m + 2 {
                    h[i + (i - 3) * ld] = 0.0;
                }
            }

            // Double QR step involving rows l..=ni and columns m..=ni.
            for k in m..ni {
                let notlast = k != ni - 1;
                if k != m {
                    p = h[k + (k - 1) * ld];
                    q = h[(k + 1) + (k - 1) * ld];
                    r = if notlast { h[(k + 2) + (k - 1) * ld] } else { 0.0 };
                    x = p.abs() + q.abs() + r.abs();
                    if x != 0.0 {
                        p /= x;
                        q /= x;
                        r /= x;
                    }
                }
                if x == 0.0 {
                    break;
                }
                s = (p * p + q * q + r * r).sqrt();
                if p < 0.0 {
                    s = -s;
                }
                if s != 0.0 {
                    if k != m {
                        h[k + (k - 1) * ld] = -s * x;
                    } else if l != m {
                        h[k + (k - 1) * ld] = -h[k + (k - 1) * ld];
                    }
                    p += s;
                    x = p / s;
                    y = q / s;
                    z = r / s;
                    q /= p;
                    r /= p;

                    // Row modification.
                    for j in k..nn {
                        p = h[k + j * ld] + q * h[(k + 1) + j * ld];
                        if notlast {
                            p += r * h[(k + 2) + j * ld];
                            h[(k + 2) + j * ld] -= p * z;
                        }
                        h[k + j * ld] -= p * x;
                        h[(k + 1) + j * ld] -= p * y;
                    }
                    // Column modification.
                    for i in 0..=ni.min(k + 3) {
                        p = x * h[i + k * ld] + y * h[i + (k + 1) * ld];
                        if notlast {
                            p += z * h[i + (k + 2) * ld];
                            h[i + (k + 2) * ld] -= p * r;
                        }
                        h[i + k * ld] -= p;
                        h[i + (k + 1) * ld] -= p * q;
                    }
                    // Accumulate the transformations.
                    for i in low..=high {
                        p = x * v[i + k * ld] + y * v[i + (k + 1) * ld];
                        if notlast {
                            p += z * v[i + (k + 2) * ld];
                            v[i + (k + 2) * ld] -= p * r;
                        }
                        v[i + k * ld] -= p;
                        v[i + (k + 1) * ld] -= p * q;
                    }
                }
            }
        }
    }

    // Backsubstitute to find the vectors of the upper triangular form.
    if norm == 0.0 {
        return Ok(());
    }

    let mut n = nn as isize - 1;
    while n >= 0 {
        let ni = n as usize;
        p = d[ni];
        q = e[ni];

        if q == 0.0 {
            // Real vector.
            let mut l = ni;
            h[ni + ni * ld] = 1.0;
            for i in (0..ni).rev() {
                w = h[i + i * ld] - p;
                r = 0.0;
                for j in l..=ni {
                    r += h[i + j * ld] * h[j + ni * ld];
                }
                if e[i] < 0.0 {
                    z = w;
                    s = r;
                } else {
                    l = i;
                    if e[i] == 0.0 {
                        if w != 0.0 {
                            h[i + ni * ld] = -r / w;
                        } else {
                            h[i + ni * ld] = -r / (eps * norm);
                        }
                    } else {
                        // Solve the real 2-by-2 system.
                        x = h[i + (i + 1) * ld];
                        y = h[(i + 1) + i * ld];
                        q = (d[i] - p) * (d[i] - p) + e[i] * e[i];
                        t = (x * s - z * r) / q;
                        h[i + ni * ld] = t;
                        if x.abs() > z.abs() {
                            h[(i + 1) + ni * ld] = (-r - w * t) / x;
                        } else {
                            h[(i + 1) + ni * ld] = (-s - y * t) / z;
                        }
                    }

                    // Overflow control.
                    t = h[i + ni * ld].abs();
                    if (eps * t) * t > 1.0 {
                        for j in i..=ni {
                            h[j + ni * ld] /= t;
                        }
                    }
                }
            }
        } else if q < 0.0 {
            // Complex vector; the last component is chosen imaginary so the
            // matrix is triangular.
            let mut l = ni - 1;
            if h[ni + (ni - 1) * ld].abs() > h[(ni - 1) + ni * ld].abs() {
                h[(ni - 1) + (ni - 1) * ld] = q / h[ni + (ni - 1) * ld];
                h[(ni - 1) + ni * ld] = -(h[ni + ni * ld] - p) / h[ni + (ni - 1) * ld];
            } else {
                let (cr, ci) = cdiv(0.0, -h[(ni - 1) + ni * ld], h[(ni - 1) + (ni - 1) * ld] - p, q);
                h[(ni - 1) + (ni - 1) * ld] = cr;
                h[(ni - 1) + ni * ld] = ci;
            }
            h[ni + (ni - 1) * ld] = 0.0;
            h[ni + ni * ld] = 1.0;
            for i in (0..ni.saturating_sub(1)).rev() {
                let mut ra = 0.0;
                let mut sa = 0.0;
                for j in l..=ni {
                    ra += h[i + j * ld] * h[j + (ni - 1) * ld];
                    sa += h[i + j * ld] * h[j + ni * ld];
                }
                w = h[i + i * ld] - p;

                if e[i] < 0.0 {
                    z = w;
                    r = ra;
                    s = sa;
                } else {
                    l = i;
                    if e[i] == 0.0 {
                        let (cr, ci) = cdiv(-ra, -sa, w, q);
                        h[i + (ni - 1) * ld] = cr;
                        h[i + ni * ld] = ci;
                    } else {
                        // Solve the complex 2-by-2 system.
                        x = h[i + (i + 1) * ld];
                        y = h[(i + 1) + i * ld];
                        let mut vr = (d[i] - p) * (d[i] - p) + e[i] * e[i] - q * q;
                        let vi = (d[i] - p) * 2.0 * q;
                        if vr == 0.0 && vi == 0.0 {
                            vr = eps * norm * (w.abs() + q.abs() + x.abs() + y.abs() + z.abs());
                        }
                        let (cr, ci) =
                            cdiv(x * r - z * ra + q * sa, x * s - z * sa - q * ra, vr, vi);
                        h[i + (ni - 1) * ld] = cr;
                        h[i + ni * ld] = ci;
                        if x.abs() > z.abs() + q.abs() {
                            h[(i + 1) + (ni - 1) * ld] =
                                (-ra - w * h[i + (ni - 1) * ld] + q * h[i + ni * ld]) / x;
                            h[(i + 1) + ni * ld] =
                                (-sa - w * h[i + ni * ld] - q * h[i + (ni - 1) * ld]) / x;
                        } else {
                            let (cr, ci) =
                                cdiv(-r - y * h[i + (ni - 1) * ld], -s - y * h[i + ni * ld], z, q);
                            h[(i + 1) + (ni - 1) * ld] = cr;
                            h[(i + 1) + ni * ld] = ci;
                        }
                    }

                    // Overflow control.
                    t = h[i + (ni - 1) * ld].abs().max(h[i + ni * ld].abs());
                    if (eps * t) * t > 1.0 {
                        for j in i..ni {
                            h[j + (ni - 1) * ld] /= t;
                            h[j + ni * ld] /= t;
                        }
                    }
                }
            }
        }
        n -= 1;
    }

    // Back transformation to get the eigenvectors of the original matrix.
    for j in (low..nn).rev() {
        for i in low..=high {
            z = 0.0;
            for k in low..=j.min(high) {
                z += v[i + k * ld] * h[k + j * ld];
            }
            v[i + j * ld] = z;
        }
    }

    Ok(())
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
    fn symmetric_known_2x2() {
        let a = Matrix::from_rows(2, 2, &[2.0, -1.0, -1.0, 2.0]);
        let evd = a.evd().unwrap();
        let d = evd.real_eigenvalues();
        assert!((d[0] - 1.0).abs() < TOL);
        assert!((d[1] - 3.0).abs() < TOL);
        assert!(evd.imag_eigenvalues().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn symmetric_orthogonal_eigenvectors() {
        let a = Matrix::from_rows(
            3,
            3,
            &[4.0, 1.0, -1.0, 1.0, 3.0, 2.0, -1.0, 2.0, 5.0],
        );
        let evd = a.evd().unwrap();
        let v = evd.v();
        let vvt = v.mul_transpose(&v);
        assert_matrix_near(&vvt, &Matrix::identity(3, 3), TOL, "V*V^T");
    }

    #[test]
    fn symmetric_reconstruction() {
        let a = Matrix::from_rows(
            3,
            3,
            &[4.0, 1.0, -1.0, 1.0, 3.0, 2.0, -1.0, 2.0, 5.0],
        );
        let evd = a.evd().unwrap();
        let v = evd.v();
        let vdvt = (&v * &evd.d()).mul_transpose(&v);
        assert_matrix_near(&vdvt, &a, TOL, "V*D*V^T");
    }

    #[test]
    fn symmetric_eigenvalues_ascending() {
        let a = Matrix::from_rows(
            4,
            4,
            &[
                10.0, 3.0, 0.0, 0.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 7.0, 2.0, 0.0, 0.0, 2.0, 4.0,
            ],
        );
        let d = a.evd().unwrap().real_eigenvalues();
        for i in 0..3 {
            assert!(d[i] <= d[i + 1] + TOL, "not ascending at {}", i);
        }
    }

    #[test]
    fn nonsymmetric_real_eigenvalues() {
        // Companion matrix of (x-1)(x-2)(x-3).
        let a = Matrix::from_rows(
            3,
            3,
            &[0.0, 0.0, 6.0, 1.0, 0.0, -11.0, 0.0, 1.0, 6.0],
        );
        let evd = a.evd().unwrap();
        let mut d = evd.real_eigenvalues();
        let e = evd.imag_eigenvalues();
        assert!(e.iter().all(|&x| x.abs() < TOL));
        d.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((d[0] - 1.0).abs() < 1e-8);
        assert!((d[1] - 2.0).abs() < 1e-8);
        assert!((d[2] - 3.0).abs() < 1e-8);
    }

    #[test]
    fn nonsymmetric_av_equals_vd() {
        let a = Matrix::from_rows(
            3,
            3,
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 0.0],
        );
        let evd = a.evd().unwrap();
        let av = &a * &evd.v();
        let vd = &evd.v() * &evd.d();
        assert_matrix_near(&av, &vd, 1e-8, "A*V = V*D");
    }

    #[test]
    fn complex_pair_block_structure() {
        // Rotation by 90 degrees has eigenvalues ±i.
        let a = Matrix::from_rows(2, 2, &[0.0, -1.0, 1.0, 0.0]);
        let evd = a.evd().unwrap();
        let d = evd.real_eigenvalues();
        let e = evd.imag_eigenvalues();
        assert!(d[0].abs() < TOL);
        assert!(d[1].abs() < TOL);
        assert!((e[0] - 1.0).abs() < TOL);
        assert!((e[1] + 1.0).abs() < TOL);

        // D carries the pair as [lambda, mu; -mu, lambda].
        let dm = evd.d();
        assert!((dm.get(0, 1) - e[0]).abs() < TOL);
        assert!((dm.get(1, 0) - e[1]).abs() < TOL);

        let av = &a * &evd.v();
        let vd = &evd.v() * &dm;
        assert_matrix_near(&av, &vd, TOL, "A*V = V*D complex");
    }

    #[test]
    fn complex_pair_scaled_rotation() {
        let (c, s) = (0.6, 0.8);
        let a = Matrix::from_rows(2, 2, &[c, -s, s, c]);
        let evd = a.evd().unwrap();
        let d = evd.real_eigenvalues();
        let e = evd.imag_eigenvalues();
        assert!((d[0] - c).abs() < TOL);
        assert!((e[0].abs() - s).abs() < TOL);
        assert!(e[0] * e[1] < 0.0, "conjugate pair");
    }

    #[test]
    fn mixed_real_and_complex() {
        // Block diagonal: rotation block plus a real eigenvalue 5.
        let a = Matrix::from_rows(
            3,
            3,
            &[0.0, -2.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 5.0],
        );
        let evd = a.evd().unwrap();
        let av = &a * &evd.v();
        let vd = &evd.v() * &evd.d();
        assert_matrix_near(&av, &vd, 1e-9, "A*V = V*D mixed");

        let e = evd.imag_eigenvalues();
        let n_complex = e.iter().filter(|&&x| x != 0.0).count();
        assert_eq!(n_complex, 2);
    }

    #[test]
    fn eigenvalue_sum_is_trace() {
        let a = Matrix::from_rows(
            4,
            4,
            &[
                4.0, 1.0, -2.0, 2.0, 1.0, 2.0, 0.0, 1.0, -2.0, 0.0, 3.0, -2.0, 2.0, 1.0, -2.0, 1.0,
            ],
        );
        let evd = a.evd().unwrap();
        let sum: f64 = evd.real_eigenvalues().iter().sum();
        assert!((sum - a.trace()).abs() < 1e-9);
    }

    #[test]
    fn symmetric_branch_on_exact_symmetry_only() {
        // Slightly asymmetric input takes the general path and still
        // satisfies A*V = V*D.
        let a = Matrix::from_rows(2, 2, &[2.0, 1.0 + 1e-14, 1.0, 2.0]);
        let evd = a.evd().unwrap();
        let av = &a * &evd.v();
        let vd = &evd.v() * &evd.d();
        assert_matrix_near(&av, &vd, 1e-9, "A*V = V*D asym");
    }

    #[test]
    fn size_1x1() {
        let a = Matrix::from_rows(1, 1, &[42.0]);
        let evd = a.evd().unwrap();
        assert_eq!(evd.real_eigenvalues(), vec![42.0]);
        assert_eq!(evd.v().get(0, 0), 1.0);
    }

    #[test]
    #[should_panic(expected = "square")]
    fn non_square_panics() {
        let _ = Matrix::zeros(2, 3).evd();
    }

    #[test]
    fn queries_are_idempotent() {
        let a = Matrix::from_rows(2, 2, &[2.0, -1.0, -1.0, 2.0]);
        let evd = a.evd().unwrap();
        assert_eq!(evd.v(), evd.v());
        assert_eq!(evd.d(), evd.d());
        assert_eq!(evd.real_eigenvalues(), evd.real_eigenvalues());
    }
}
