use super::Matrix;
use crate::linalg::LinalgError;

impl Matrix {
    /// One-norm: the maximum absolute column sum.
    pub fn norm1(&self) -> f64 {
        let mut f = 0.0_f64;
        for j in 0..self.ncols {
            let s: f64 = self.data[j * self.nrows..(j + 1) * self.nrows]
                .iter()
                .map(|x| x.abs())
                .sum();
            f = f.max(s);
        }
        f
    }

    /// Infinity-norm: the maximum absolute row sum.
    pub fn norm_inf(&self) -> f64 {
        let mut f = 0.0_f64;
        for i in 0..self.nrows {
            let mut s = 0.0;
            for j in 0..self.ncols {
                s += self.data[i + j * self.nrows].abs();
            }
            f = f.max(s);
        }
        f
    }

    /// Frobenius norm: the square root of the sum of squared elements.
    ///
    /// Accumulated with a running `hypot` so intermediate squares cannot
    /// overflow or underflow where the result itself would not.
    pub fn norm_fro(&self) -> f64 {
        let mut f = 0.0_f64;
        for &x in &self.data {
            f = f.hypot(x);
        }
        f
    }

    /// Two-norm: the largest singular value.
    pub fn norm2(&self) -> Result<f64, LinalgError> {
        Ok(self.svd()?.norm2())
    }
}
