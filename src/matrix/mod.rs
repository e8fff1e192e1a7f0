mod fmt;
mod norm;
mod ops;

use std::hash::{Hash, Hasher};

use rand::Rng;

use crate::linalg::{
    CholeskyDecomposition, EigenDecomposition, LinalgError, LuDecomposition, QrDecomposition,
    SvdDecomposition,
};

/// Dense double-precision matrix.
///
/// Elements of an m-by-n matrix are stored contiguously in a single
/// `Vec<f64>` in column-major order: element (i, j) sits at
/// `data[i + j*m]`. A 3-by-3 matrix is laid out as
///
/// ```text
///   a[0] a[3] a[6]
///   a[1] a[4] a[7]
///   a[2] a[5] a[8]
/// ```
///
/// This is the layout the packed kernels in [`crate::blas`] and the
/// decompositions operate on, so factor extraction and multiplication never
/// reshuffle data. Mutating operations (`set`, the `*_assign` arithmetic)
/// work in place; everything that extracts a sub-range or computes a new
/// value allocates a fresh matrix. A matrix never resizes.
///
/// Decompositions of a matrix are requested through the factory methods
/// [`lud`](Matrix::lud), [`qrd`](Matrix::qrd), [`chd`](Matrix::chd),
/// [`evd`](Matrix::evd), and [`svd`](Matrix::svd); each factors eagerly and
/// owns a private copy of the packed data, so later mutation of the source
/// matrix does not disturb it.
///
/// # Example
///
/// ```
/// use densemat::Matrix;
///
/// let a = Matrix::from_rows(2, 2, &[4.0, 3.0, 6.0, 3.0]);
/// let b = Matrix::from_rows(2, 1, &[10.0, 12.0]);
/// let x = a.solve(&b).unwrap();
/// assert!((x.get(0, 0) - 1.0).abs() < 1e-12);
/// assert!((x.get(1, 0) - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

// ── Constructors and factories ──────────────────────────────────────

impl Matrix {
    /// Create an `nrows` by `ncols` matrix of zeros.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create an `nrows` by `ncols` matrix filled with `value`.
    pub fn filled(nrows: usize, ncols: usize, value: f64) -> Self {
        Self {
            data: vec![value; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create a matrix by calling `f(row, col)` for each element.
    ///
    /// ```
    /// use densemat::Matrix;
    /// let m = Matrix::from_fn(3, 3, |i, j| if i == j { 1.0 } else { 0.0 });
    /// assert_eq!(m, Matrix::identity(3, 3));
    /// ```
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Create a matrix from an owned column-major buffer, without copying.
    ///
    /// The buffer contains packed columns: element (i, j) at
    /// `data[i + j*nrows]`. This is the zero-copy construction path; use
    /// [`as_mut_slice`](Matrix::as_mut_slice) to keep mutating the storage
    /// directly afterwards.
    ///
    /// Panics if `data.len() != nrows * ncols`.
    ///
    /// ```
    /// use densemat::Matrix;
    /// // Columns [1, 3] and [2, 4]
    /// let m = Matrix::from_packed(2, 2, vec![1.0, 3.0, 2.0, 4.0]);
    /// assert_eq!(m.get(1, 0), 3.0);
    /// assert_eq!(m.get(0, 1), 2.0);
    /// ```
    pub fn from_packed(nrows: usize, ncols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "buffer length {} does not match {}x{} matrix",
            data.len(),
            nrows,
            ncols,
        );
        Self { data, nrows, ncols }
    }

    /// Create a matrix from a flat slice in row-major order.
    ///
    /// Transposes the data into column-major internal storage.
    ///
    /// Panics if `row_major.len() != nrows * ncols`.
    ///
    /// ```
    /// use densemat::Matrix;
    /// let m = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// assert_eq!(m.get(0, 2), 3.0);
    /// assert_eq!(m.get(1, 0), 4.0);
    /// ```
    pub fn from_rows(nrows: usize, ncols: usize, row_major: &[f64]) -> Self {
        assert_eq!(
            row_major.len(),
            nrows * ncols,
            "slice length {} does not match {}x{} matrix",
            row_major.len(),
            nrows,
            ncols,
        );
        let mut data = vec![0.0; nrows * ncols];
        for i in 0..nrows {
            for j in 0..ncols {
                data[i + j * nrows] = row_major[i * ncols + j];
            }
        }
        Self { data, nrows, ncols }
    }

    /// Create a matrix from nested rows, copying each element.
    ///
    /// Every row must have the same length.
    pub fn from_nested(rows: &[Vec<f64>]) -> Self {
        let nrows = rows.len();
        let ncols = if nrows > 0 { rows[0].len() } else { 0 };
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(
                row.len(),
                ncols,
                "row {} has length {}, expected {}",
                i,
                row.len(),
                ncols,
            );
        }
        let mut data = vec![0.0; nrows * ncols];
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                data[i + j * nrows] = v;
            }
        }
        Self { data, nrows, ncols }
    }

    /// Create a matrix with elements drawn uniformly from `[0, 1)`.
    pub fn random(nrows: usize, ncols: usize) -> Self {
        let mut rng = rand::thread_rng();
        Self::from_fn(nrows, ncols, |_, _| rng.gen())
    }

    /// Create an `nrows` by `ncols` identity matrix (ones on the main
    /// diagonal, zeros elsewhere).
    pub fn identity(nrows: usize, ncols: usize) -> Self {
        let mut m = Self::zeros(nrows, ncols);
        for i in 0..nrows.min(ncols) {
            m.data[i + i * nrows] = 1.0;
        }
        m
    }

    /// Create a square diagonal matrix from the given diagonal elements.
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let n = diag.len();
        let mut m = Self::zeros(n, n);
        for (i, &d) in diag.iter().enumerate() {
            m.data[i + i * n] = d;
        }
        m
    }
}

// ── Shape and element access ────────────────────────────────────────

impl Matrix {
    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Whether the matrix is square.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Whether the matrix is square and exactly symmetric.
    ///
    /// The comparison is exact element equality, not a tolerance check.
    pub fn is_symmetric(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.nrows;
        for j in 0..n {
            for i in (j + 1)..n {
                if self.data[i + j * n] != self.data[j + i * n] {
                    return false;
                }
            }
        }
        true
    }

    /// Get element (i, j).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.nrows && j < self.ncols);
        self.data[i + j * self.nrows]
    }

    /// Set element (i, j).
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        debug_assert!(i < self.nrows && j < self.ncols);
        self.data[i + j * self.nrows] = v;
    }

    /// The backing column-major storage, by reference.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// The backing column-major storage, mutably.
    ///
    /// Writes land directly in the matrix; keeping element (i, j) at
    /// `slice[i + j*nrows]` is the caller's responsibility.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the matrix and return the column-major buffer.
    pub fn into_packed(self) -> Vec<f64> {
        self.data
    }

    /// The elements packed by columns, copied into a new vector.
    pub fn packed_columns(&self) -> Vec<f64> {
        self.data.clone()
    }

    /// The elements packed by rows, copied into a new vector.
    pub fn packed_rows(&self) -> Vec<f64> {
        let mut r = vec![0.0; self.nrows * self.ncols];
        for j in 0..self.ncols {
            for i in 0..self.nrows {
                r[i * self.ncols + j] = self.data[i + j * self.nrows];
            }
        }
        r
    }

    /// Overwrite all elements from a column-major slice.
    ///
    /// Panics if the slice length does not match.
    pub fn set_packed_columns(&mut self, packed: &[f64]) {
        assert_eq!(
            packed.len(),
            self.nrows * self.ncols,
            "slice length {} does not match {}x{} matrix",
            packed.len(),
            self.nrows,
            self.ncols,
        );
        self.data.copy_from_slice(packed);
    }

    /// Overwrite all elements from a row-major slice.
    ///
    /// Panics if the slice length does not match.
    pub fn set_packed_rows(&mut self, packed: &[f64]) {
        assert_eq!(
            packed.len(),
            self.nrows * self.ncols,
            "slice length {} does not match {}x{} matrix",
            packed.len(),
            self.nrows,
            self.ncols,
        );
        for j in 0..self.ncols {
            for i in 0..self.nrows {
                self.data[i + j * self.nrows] = packed[i * self.ncols + j];
            }
        }
    }

    /// Copy the elements out as nested rows.
    pub fn to_nested(&self) -> Vec<Vec<f64>> {
        (0..self.nrows)
            .map(|i| (0..self.ncols).map(|j| self.get(i, j)).collect())
            .collect()
    }
}

// ── Sub-matrix extraction and assignment ────────────────────────────

impl Matrix {
    fn check_row_range(&self, i0: usize, i1: usize) {
        assert!(
            i1 < self.nrows,
            "row index {} out of bounds for {} rows",
            i1,
            self.nrows,
        );
        assert!(i0 <= i1, "row range inverted: {} > {}", i0, i1);
    }

    fn check_col_range(&self, j0: usize, j1: usize) {
        assert!(
            j1 < self.ncols,
            "column index {} out of bounds for {} columns",
            j1,
            self.ncols,
        );
        assert!(j0 <= j1, "column range inverted: {} > {}", j0, j1);
    }

    /// Copy out the sub-matrix with rows `i0..=i1` and columns `j0..=j1`
    /// (closed ranges).
    ///
    /// Panics if a bound is out of range or a range is inverted.
    ///
    /// ```
    /// use densemat::Matrix;
    /// let m = Matrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    /// let s = m.submatrix(1, 2, 0, 1);
    /// assert_eq!(s, Matrix::from_rows(2, 2, &[4.0, 5.0, 7.0, 8.0]));
    /// ```
    pub fn submatrix(&self, i0: usize, i1: usize, j0: usize, j1: usize) -> Matrix {
        self.check_row_range(i0, i1);
        self.check_col_range(j0, j1);
        let m = i1 - i0 + 1;
        let n = j1 - j0 + 1;
        let mut b = vec![0.0; m * n];
        for j in 0..n {
            for i in 0..m {
                b[i + j * m] = self.data[i + i0 + (j + j0) * self.nrows];
            }
        }
        Matrix::from_packed(m, n, b)
    }

    /// Gather a new matrix from the given row and column index sets.
    ///
    /// `None` selects all indices of that axis in order. Indices may repeat.
    ///
    /// ```
    /// use densemat::Matrix;
    /// let m = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let g = m.select(Some(&[1, 0]), None);
    /// assert_eq!(g, Matrix::from_rows(2, 3, &[4.0, 5.0, 6.0, 1.0, 2.0, 3.0]));
    /// ```
    pub fn select(&self, rows: Option<&[usize]>, cols: Option<&[usize]>) -> Matrix {
        let m = rows.map_or(self.nrows, <[usize]>::len);
        let n = cols.map_or(self.ncols, <[usize]>::len);
        let mut b = vec![0.0; m * n];
        for j in 0..n {
            let sj = cols.map_or(j, |c| c[j]);
            for i in 0..m {
                let si = rows.map_or(i, |r| r[i]);
                b[i + j * m] = self.get(si, sj);
            }
        }
        Matrix::from_packed(m, n, b)
    }

    /// Gather the given rows, all columns.
    pub fn select_rows(&self, rows: &[usize]) -> Matrix {
        self.select(Some(rows), None)
    }

    /// Gather the given columns, all rows.
    pub fn select_cols(&self, cols: &[usize]) -> Matrix {
        self.select(None, Some(cols))
    }

    /// Copy `x` into this matrix with its top-left element at (i0, j0).
    ///
    /// Panics if `x` does not fit.
    pub fn set_submatrix(&mut self, i0: usize, j0: usize, x: &Matrix) {
        if x.nrows > 0 && x.ncols > 0 {
            self.check_row_range(i0, i0 + x.nrows - 1);
            self.check_col_range(j0, j0 + x.ncols - 1);
        }
        for j in 0..x.ncols {
            for i in 0..x.nrows {
                self.data[i + i0 + (j + j0) * self.nrows] = x.data[i + j * x.nrows];
            }
        }
    }

    /// Scatter `x` into the given row and column index sets.
    ///
    /// `None` selects all indices of that axis in order; the dimensions of
    /// `x` must match the selected index counts.
    pub fn set_select(&mut self, rows: Option<&[usize]>, cols: Option<&[usize]>, x: &Matrix) {
        let m = rows.map_or(self.nrows, <[usize]>::len);
        let n = cols.map_or(self.ncols, <[usize]>::len);
        assert_eq!(m, x.nrows, "row selection count {} != {} rows in x", m, x.nrows);
        assert_eq!(n, x.ncols, "column selection count {} != {} columns in x", n, x.ncols);
        for j in 0..n {
            let dj = cols.map_or(j, |c| c[j]);
            for i in 0..m {
                let di = rows.map_or(i, |r| r[i]);
                self.set(di, dj, x.data[i + j * m]);
            }
        }
    }
}

// ── Derived scalars and transpose ───────────────────────────────────

impl Matrix {
    /// The transpose: element (i, j) of the result equals element (j, i)
    /// of this matrix.
    pub fn transpose(&self) -> Matrix {
        let m = self.nrows;
        let n = self.ncols;
        let mut b = vec![0.0; m * n];
        for j in 0..n {
            for i in 0..m {
                b[j + i * n] = self.data[i + j * m];
            }
        }
        Matrix::from_packed(n, m, b)
    }

    /// Sum of the `min(m, n)` diagonal elements.
    pub fn trace(&self) -> f64 {
        let mn = self.nrows.min(self.ncols);
        (0..mn).map(|i| self.data[i + i * self.nrows]).sum()
    }

    /// The determinant, via LU decomposition.
    ///
    /// Panics unless the matrix is square.
    pub fn det(&self) -> f64 {
        assert!(self.is_square(), "determinant requires a square matrix");
        self.lud().det()
    }

    /// The condition number (ratio of largest to smallest singular value),
    /// via singular value decomposition.
    ///
    /// Returns `f64::INFINITY` for an exactly singular matrix.
    pub fn cond(&self) -> Result<f64, LinalgError> {
        Ok(self.svd()?.cond())
    }

    /// The effective numerical rank, via singular value decomposition.
    pub fn rank(&self) -> Result<usize, LinalgError> {
        Ok(self.svd()?.rank())
    }
}

// ── Decomposition factories, solve, and inverse ─────────────────────

impl Matrix {
    /// The LU decomposition of this matrix.
    pub fn lud(&self) -> LuDecomposition {
        LuDecomposition::new(self)
    }

    /// The QR decomposition of this matrix. Panics unless `m >= n`.
    pub fn qrd(&self) -> QrDecomposition {
        QrDecomposition::new(self)
    }

    /// The Cholesky decomposition of this matrix. Panics unless square.
    ///
    /// Symmetry is assumed, not verified; only the lower triangle is read.
    pub fn chd(&self) -> CholeskyDecomposition {
        CholeskyDecomposition::new(self)
    }

    /// The eigenvalue and eigenvector decomposition of this matrix.
    /// Panics unless square.
    pub fn evd(&self) -> Result<EigenDecomposition, LinalgError> {
        EigenDecomposition::new(self)
    }

    /// The singular value decomposition of this matrix.
    pub fn svd(&self) -> Result<SvdDecomposition, LinalgError> {
        SvdDecomposition::new(self)
    }

    /// Solve `A * X = B`, where `A` is this matrix.
    ///
    /// Requires `m >= n`. A square system is solved exactly via LU; an
    /// overdetermined system (`m > n`) yields the least-squares solution
    /// via QR. `B` must have `m` rows and may have any number of columns.
    ///
    /// ```
    /// use densemat::Matrix;
    /// // Least-squares line fit through (0,1), (1,2), (2,4)
    /// let a = Matrix::from_rows(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
    /// let b = Matrix::from_rows(3, 1, &[1.0, 2.0, 4.0]);
    /// let x = a.solve(&b).unwrap();
    /// assert!((x.get(0, 0) - 5.0 / 6.0).abs() < 1e-10);
    /// assert!((x.get(1, 0) - 3.0 / 2.0).abs() < 1e-10);
    /// ```
    pub fn solve(&self, b: &Matrix) -> Result<Matrix, LinalgError> {
        assert!(
            self.nrows >= self.ncols,
            "solve requires at least as many rows as columns",
        );
        if self.nrows == self.ncols {
            self.lud().solve(b)
        } else {
            self.qrd().solve(b)
        }
    }

    /// The inverse of a square matrix, or the pseudo-inverse when `m > n`.
    pub fn inverse(&self) -> Result<Matrix, LinalgError> {
        self.solve(&Matrix::identity(self.nrows, self.nrows))
    }
}

impl Hash for Matrix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nrows.hash(state);
        self.ncols.hash(state);
        for &v in &self.data {
            v.to_bits().hash(state);
        }
    }
}
