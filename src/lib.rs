//! # densemat
//!
//! Dense double-precision matrices with the classical decompositions:
//! LU, QR, Cholesky, eigenvalue, and singular value.
//!
//! Elements of an m-by-n [`Matrix`] are stored in a single contiguous
//! buffer in column-major order (element (i, j) at `a[i + j*m]`), the
//! layout the BLAS-style kernels in [`blas`] consume directly, so
//! sub-matrices can be multiplied and factored without copying or
//! reshuffling.
//!
//! ## Quick start
//!
//! ```
//! use densemat::Matrix;
//!
//! // Solve a square system A*x = b
//! let a = Matrix::from_rows(3, 3, &[
//!     2.0, 1.0, -1.0,
//!     -3.0, -1.0, 2.0,
//!     -2.0, 1.0, 2.0,
//! ]);
//! let b = Matrix::from_rows(3, 1, &[8.0, -11.0, -3.0]);
//! let x = a.solve(&b).unwrap(); // x = [2, 3, -1]
//! assert!((x.get(0, 0) - 2.0).abs() < 1e-12);
//!
//! // Factor a symmetric positive-definite matrix
//! let spd = Matrix::from_rows(2, 2, &[4.0, 2.0, 2.0, 3.0]);
//! let chd = spd.chd();
//! assert!(chd.is_positive_definite());
//! ```
//!
//! ## Modules
//!
//! - [`matrix`] — the [`Matrix`] container: constructors, element and
//!   packed access, sub-matrix extraction, norms, arithmetic, and the
//!   decomposition factory methods `lud()`, `qrd()`, `chd()`, `evd()`,
//!   `svd()`.
//! - [`blas`] — the two packed column-major kernels everything else is
//!   built on: a general matrix product with transpose flags and an
//!   in-place triangular solve.
//! - [`linalg`] — the decompositions themselves and [`LinalgError`].
//!   Each factors eagerly at construction and is read-only afterwards.
//!
//! Decompositions copy the packed data before factoring, so they remain
//! valid snapshots even if the source matrix is mutated afterwards.
//! Nothing here is synchronized; share a matrix across threads only for
//! reading.

pub mod blas;
pub mod linalg;
pub mod matrix;

pub use linalg::{
    CholeskyDecomposition, EigenDecomposition, LinalgError, LuDecomposition, QrDecomposition,
    SvdDecomposition,
};
pub use matrix::Matrix;
