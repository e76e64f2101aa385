#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Linear algebra utilities.
pub mod linalg;

/// Operations on 3D points.
pub mod ops;

/// Point cloud container.
pub mod pointcloud;

/// Singular value decomposition of 3x3 matrices.
pub mod svd;

/// 3D transforms algorithms.
pub mod transforms;
