use std::ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use super::Matrix;
use crate::blas::{self, Trans};

// ── Indexing ────────────────────────────────────────────────────────

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        debug_assert!(i < self.nrows && j < self.ncols);
        &self.data[i + j * self.nrows]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        debug_assert!(i < self.nrows && j < self.ncols);
        &mut self.data[i + j * self.nrows]
    }
}

// ── Elementwise helpers ─────────────────────────────────────────────

fn check_same_dims(a: &Matrix, b: &Matrix, op: &str) {
    assert_eq!(
        (a.nrows, a.ncols),
        (b.nrows, b.ncols),
        "dimension mismatch: {}x{} {} {}x{}",
        a.nrows,
        a.ncols,
        op,
        b.nrows,
        b.ncols,
    );
}

fn zip_new(a: &Matrix, b: &Matrix, op: &str, f: impl Fn(f64, f64) -> f64) -> Matrix {
    check_same_dims(a, b, op);
    let data = a.data.iter().zip(b.data.iter()).map(|(&x, &y)| f(x, y)).collect();
    Matrix {
        data,
        nrows: a.nrows,
        ncols: a.ncols,
    }
}

fn zip_assign(a: &mut Matrix, b: &Matrix, op: &str, f: impl Fn(f64, f64) -> f64) {
    check_same_dims(a, b, op);
    for (x, &y) in a.data.iter_mut().zip(b.data.iter()) {
        *x = f(*x, y);
    }
}

// ── Negation ────────────────────────────────────────────────────────

impl Neg for &Matrix {
    type Output = Matrix;
    fn neg(self) -> Matrix {
        Matrix {
            data: self.data.iter().map(|&x| -x).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl Neg for Matrix {
    type Output = Matrix;
    fn neg(mut self) -> Matrix {
        for x in self.data.iter_mut() {
            *x = -*x;
        }
        self
    }
}

// ── Addition and subtraction ────────────────────────────────────────

impl Add<&Matrix> for &Matrix {
    type Output = Matrix;
    fn add(self, rhs: &Matrix) -> Matrix {
        zip_new(self, rhs, "+", |a, b| a + b)
    }
}

impl Add for Matrix {
    type Output = Matrix;
    fn add(mut self, rhs: Matrix) -> Matrix {
        self += &rhs;
        self
    }
}

impl Add<&Matrix> for Matrix {
    type Output = Matrix;
    fn add(mut self, rhs: &Matrix) -> Matrix {
        self += rhs;
        self
    }
}

impl Add<Matrix> for &Matrix {
    type Output = Matrix;
    fn add(self, rhs: Matrix) -> Matrix {
        rhs + self
    }
}

impl AddAssign for Matrix {
    fn add_assign(&mut self, rhs: Matrix) {
        *self += &rhs;
    }
}

impl AddAssign<&Matrix> for Matrix {
    fn add_assign(&mut self, rhs: &Matrix) {
        zip_assign(self, rhs, "+=", |a, b| a + b);
    }
}

impl Sub<&Matrix> for &Matrix {
    type Output = Matrix;
    fn sub(self, rhs: &Matrix) -> Matrix {
        zip_new(self, rhs, "-", |a, b| a - b)
    }
}

impl Sub for Matrix {
    type Output = Matrix;
    fn sub(mut self, rhs: Matrix) -> Matrix {
        self -= &rhs;
        self
    }
}

impl Sub<&Matrix> for Matrix {
    type Output = Matrix;
    fn sub(mut self, rhs: &Matrix) -> Matrix {
        self -= rhs;
        self
    }
}

impl Sub<Matrix> for &Matrix {
    type Output = Matrix;
    fn sub(self, rhs: Matrix) -> Matrix {
        zip_new(self, &rhs, "-", |a, b| a - b)
    }
}

impl SubAssign for Matrix {
    fn sub_assign(&mut self, rhs: Matrix) {
        *self -= &rhs;
    }
}

impl SubAssign<&Matrix> for Matrix {
    fn sub_assign(&mut self, rhs: &Matrix) {
        zip_assign(self, rhs, "-=", |a, b| a - b);
    }
}

// ── Scalar multiplication ───────────────────────────────────────────

impl Mul<f64> for &Matrix {
    type Output = Matrix;
    fn mul(self, s: f64) -> Matrix {
        Matrix {
            data: self.data.iter().map(|&x| x * s).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl Mul<f64> for Matrix {
    type Output = Matrix;
    fn mul(mut self, s: f64) -> Matrix {
        self *= s;
        self
    }
}

impl MulAssign<f64> for Matrix {
    fn mul_assign(&mut self, s: f64) {
        for x in self.data.iter_mut() {
            *x *= s;
        }
    }
}

// ── Matrix product ──────────────────────────────────────────────────

fn mat_mul(a: &Matrix, b: &Matrix) -> Matrix {
    assert_eq!(
        a.ncols, b.nrows,
        "dimension mismatch: {}x{} * {}x{}",
        a.nrows, a.ncols, b.nrows, b.ncols,
    );
    let mut c = Matrix::zeros(a.nrows, b.ncols);
    blas::gemm(
        Trans::No,
        Trans::No,
        a.nrows,
        b.ncols,
        a.ncols,
        1.0,
        &a.data,
        a.nrows.max(1),
        &b.data,
        b.nrows.max(1),
        0.0,
        &mut c.data,
        a.nrows.max(1),
    );
    c
}

impl Mul<&Matrix> for &Matrix {
    type Output = Matrix;
    fn mul(self, rhs: &Matrix) -> Matrix {
        mat_mul(self, rhs)
    }
}

impl Mul for Matrix {
    type Output = Matrix;
    fn mul(self, rhs: Matrix) -> Matrix {
        mat_mul(&self, &rhs)
    }
}

impl Mul<&Matrix> for Matrix {
    type Output = Matrix;
    fn mul(self, rhs: &Matrix) -> Matrix {
        mat_mul(&self, rhs)
    }
}

impl Mul<Matrix> for &Matrix {
    type Output = Matrix;
    fn mul(self, rhs: Matrix) -> Matrix {
        mat_mul(self, &rhs)
    }
}

impl Matrix {
    /// `A * B^T`, where `A` is this matrix. Requires the column counts of
    /// `A` and `B` to match.
    pub fn mul_transpose(&self, b: &Matrix) -> Matrix {
        assert_eq!(
            self.ncols, b.ncols,
            "dimension mismatch: {}x{} * ({}x{})^T",
            self.nrows, self.ncols, b.nrows, b.ncols,
        );
        let mut c = Matrix::zeros(self.nrows, b.nrows);
        blas::gemm(
            Trans::No,
            Trans::Trans,
            self.nrows,
            b.nrows,
            self.ncols,
            1.0,
            &self.data,
            self.nrows.max(1),
            &b.data,
            b.nrows.max(1),
            0.0,
            &mut c.data,
            self.nrows.max(1),
        );
        c
    }

    /// `A^T * B`, where `A` is this matrix. Requires the row counts of
    /// `A` and `B` to match.
    pub fn transpose_mul(&self, b: &Matrix) -> Matrix {
        assert_eq!(
            self.nrows, b.nrows,
            "dimension mismatch: ({}x{})^T * {}x{}",
            self.nrows, self.ncols, b.nrows, b.ncols,
        );
        let mut c = Matrix::zeros(self.ncols, b.ncols);
        blas::gemm(
            Trans::Trans,
            Trans::No,
            self.ncols,
            b.ncols,
            self.nrows,
            1.0,
            &self.data,
            self.nrows.max(1),
            &b.data,
            b.nrows.max(1),
            0.0,
            &mut c.data,
            self.ncols.max(1),
        );
        c
    }

    /// Element-by-element product `A .* B`.
    pub fn elem_mul(&self, b: &Matrix) -> Matrix {
        zip_new(self, b, ".*", |x, y| x * y)
    }

    /// Element-by-element product in place.
    pub fn elem_mul_assign(&mut self, b: &Matrix) {
        zip_assign(self, b, ".*", |x, y| x * y);
    }

    /// Element-by-element right division `A ./ B`.
    pub fn elem_div(&self, b: &Matrix) -> Matrix {
        zip_new(self, b, "./", |x, y| x / y)
    }

    /// Element-by-element right division in place.
    pub fn elem_div_assign(&mut self, b: &Matrix) {
        zip_assign(self, b, "./", |x, y| x / y);
    }

    /// Element-by-element left division `A .\ B`, that is `B ./ A`.
    pub fn elem_ldiv(&self, b: &Matrix) -> Matrix {
        zip_new(self, b, ".\\", |x, y| y / x)
    }

    /// Element-by-element left division in place.
    pub fn elem_ldiv_assign(&mut self, b: &Matrix) {
        zip_assign(self, b, ".\\", |x, y| y / x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> Matrix {
        Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0])
    }

    fn b() -> Matrix {
        Matrix::from_rows(2, 2, &[5.0, 6.0, 7.0, 8.0])
    }

    #[test]
    fn add_sub_neg() {
        assert_eq!(&a() + &b(), Matrix::from_rows(2, 2, &[6.0, 8.0, 10.0, 12.0]));
        assert_eq!(&b() - &a(), Matrix::from_rows(2, 2, &[4.0, 4.0, 4.0, 4.0]));
        assert_eq!(-&a(), Matrix::from_rows(2, 2, &[-1.0, -2.0, -3.0, -4.0]));
    }

    #[test]
    fn assign_ops_mutate_in_place() {
        let mut m = a();
        m += &b();
        assert_eq!(m, Matrix::from_rows(2, 2, &[6.0, 8.0, 10.0, 12.0]));
        m -= &b();
        assert_eq!(m, a());
        m *= 2.0;
        assert_eq!(m, Matrix::from_rows(2, 2, &[2.0, 4.0, 6.0, 8.0]));
    }

    #[test]
    fn matrix_product() {
        let c = &a() * &b();
        assert_eq!(c, Matrix::from_rows(2, 2, &[19.0, 22.0, 43.0, 50.0]));
    }

    #[test]
    fn product_rectangular() {
        let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = Matrix::from_rows(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let c = &a * &b;
        assert_eq!(c, Matrix::from_rows(2, 2, &[58.0, 64.0, 139.0, 154.0]));
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn product_inner_mismatch() {
        let _ = &a() * &Matrix::zeros(3, 2);
    }

    #[test]
    fn transpose_products_match_explicit() {
        let m = Matrix::from_rows(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let n = Matrix::from_rows(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);

        assert_eq!(m.transpose_mul(&n), &m.transpose() * &n);
        assert_eq!(m.mul_transpose(&m), &m * &m.transpose());
    }

    #[test]
    fn elementwise_family() {
        assert_eq!(a().elem_mul(&b()), Matrix::from_rows(2, 2, &[5.0, 12.0, 21.0, 32.0]));
        assert_eq!(b().elem_div(&a()), Matrix::from_rows(2, 2, &[5.0, 3.0, 7.0 / 3.0, 2.0]));
        assert_eq!(a().elem_ldiv(&b()), b().elem_div(&a()));

        let mut m = a();
        m.elem_mul_assign(&b());
        assert_eq!(m, a().elem_mul(&b()));
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn elementwise_dim_mismatch() {
        let _ = a().elem_mul(&Matrix::zeros(2, 3));
    }

    #[test]
    fn index_pair() {
        let mut m = a();
        assert_eq!(m[(0, 1)], 2.0);
        m[(0, 1)] = 9.0;
        assert_eq!(m.get(0, 1), 9.0);
    }
}
