use thiserror::Error;

/// Errors that can occur during point cloud registration.
#[derive(Debug, Error)]
pub enum IcpError {
    /// The source or target point cloud is empty.
    #[error("Point cloud is empty")]
    EmptyPointCloud,

    /// The source and destination sets have different lengths.
    #[error("Source and destination must have the same length ({0} vs {1})")]
    MismatchedLengths(usize, usize),

    /// Not enough point pairs to estimate a transformation.
    #[error("Need at least 3 point pairs to estimate a transformation ({0} given)")]
    InsufficientPoints(usize),

    /// The decomposition of the cross covariance produced non-finite values.
    #[error("SVD of the cross covariance produced non-finite values")]
    DegenerateCovariance,
}
