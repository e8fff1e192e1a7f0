//! Matrix decompositions: LU, QR, Cholesky, eigenvalue, and singular value.
//!
//! Each decomposition factors eagerly in its constructor and is immutable
//! afterwards; queries (`solve`, `det`, factor extraction) are pure reads of
//! the cached factorization. Because every constructor copies the packed
//! matrix data before factoring in place, a decomposition stays valid even
//! if the source [`crate::Matrix`] is mutated later.
//!
//! Shape preconditions (squareness, `m >= n`, matching row counts) panic at
//! the offending call; numeric state preconditions (singular, not positive
//! definite, rank deficient) are reported through [`LinalgError`] when a
//! solve is attempted, and iterative non-convergence aborts the eigen/SVD
//! constructors with [`LinalgError::ConvergenceFailure`].

pub(crate) mod cholesky;
pub(crate) mod eigen;
pub(crate) mod lu;
pub(crate) mod qr;
pub(crate) mod svd;

pub use cholesky::CholeskyDecomposition;
pub use eigen::EigenDecomposition;
pub use lu::LuDecomposition;
pub use qr::QrDecomposition;
pub use svd::SvdDecomposition;

use thiserror::Error;

/// Errors from linear algebra operations.
///
/// Returned by the decomposition `solve` methods and by the eigen/SVD
/// constructors.
///
/// ```
/// use densemat::{LinalgError, Matrix};
///
/// let singular = Matrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]);
/// let b = Matrix::identity(2, 1);
/// assert_eq!(singular.lud().solve(&b).unwrap_err(), LinalgError::Singular);
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinalgError {
    /// Matrix is singular; the linear system has no unique solution.
    #[error("matrix is singular")]
    Singular,

    /// Matrix is not positive definite (required for a Cholesky solve).
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,

    /// Matrix is rank deficient; the least-squares problem has no unique
    /// solution.
    #[error("matrix is rank deficient")]
    RankDeficient,

    /// An iterative algorithm did not converge within its iteration budget.
    #[error("iterative algorithm did not converge")]
    ConvergenceFailure,
}
