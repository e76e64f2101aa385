use glam::{DMat3, DMat4, DVec3};

use crate::error::IcpError;
use pointalign_3d::{ops::euclidean_distance, svd::svd3, transforms::se3_from_rt};

/// Correspondences between a source and a target point set.
///
/// Both vectors are ordered like the source set: `indices[i]` is the index
/// of the target point closest to source point `i` and `distances[i]` is the
/// distance between the two. Several source points may map to the same
/// target index.
#[derive(Debug, Clone)]
pub struct Correspondences {
    /// For each source point, the index of its nearest target point.
    pub indices: Vec<usize>,
    /// For each source point, the distance to its nearest target point.
    pub distances: Vec<f64>,
}

/// Find for each source point the nearest point in the target set.
///
/// The search is an exhaustive scan of the target for every source point,
/// i.e. O(|source| * |target|). Ties are resolved in favor of the lowest
/// target index.
///
/// # Arguments
///
/// * `source` - Source point set.
/// * `target` - Target point set.
///
/// # Returns
///
/// The correspondences ordered like the source set.
///
/// # Errors
///
/// Returns an error if either point set is empty.
pub fn find_correspondences(
    source: &[[f64; 3]],
    target: &[[f64; 3]],
) -> Result<Correspondences, IcpError> {
    if source.is_empty() || target.is_empty() {
        return Err(IcpError::EmptyPointCloud);
    }

    let mut indices = Vec::with_capacity(source.len());
    let mut distances = Vec::with_capacity(source.len());

    for point_src in source.iter() {
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        for (j, point_tgt) in target.iter().enumerate() {
            let distance = euclidean_distance(point_src, point_tgt);
            if distance < best_distance {
                best_index = j;
                best_distance = distance;
            }
        }
        indices.push(best_index);
        distances.push(best_distance);
    }

    Ok(Correspondences { indices, distances })
}

/// Compute the rigid transformation between two corresponding point sets.
///
/// Closed form solution via the singular value decomposition of the cross
/// covariance of the centered sets. The rotation block of the returned
/// matrix is always a proper rotation, i.e. det(R) = +1, even when the
/// correspondence geometry favors a reflection.
///
/// # Arguments
///
/// * `points_src` - Source points.
/// * `points_dst` - Destination points, `points_dst[i]` corresponding to
///   `points_src[i]`.
///
/// # Returns
///
/// The homogeneous transformation mapping the source onto the destination.
///
/// # Errors
///
/// Returns an error if the sets have different lengths, are empty, hold
/// fewer than 3 pairs, or if the covariance decomposition produces
/// non-finite values.
pub fn fit_transformation(
    points_src: &[[f64; 3]],
    points_dst: &[[f64; 3]],
) -> Result<DMat4, IcpError> {
    if points_src.len() != points_dst.len() {
        return Err(IcpError::MismatchedLengths(
            points_src.len(),
            points_dst.len(),
        ));
    }
    if points_src.is_empty() {
        return Err(IcpError::EmptyPointCloud);
    }
    if points_src.len() < 3 {
        return Err(IcpError::InsufficientPoints(points_src.len()));
    }

    // compute centroids
    let (src_centroid, dst_centroid) = compute_centroids(points_src, points_dst);

    // compute covariance matrix H = Σ[(src - src_mean) * (dst - dst_mean)^T]
    let mut h = DMat3::ZERO;
    for (p_in_src, p_in_dst) in points_src.iter().zip(points_dst.iter()) {
        let src_centered = DVec3::from_array(*p_in_src) - src_centroid;
        let dst_centered = DVec3::from_array(*p_in_dst) - dst_centroid;
        h += DMat3::from_cols(
            src_centered * dst_centered.x,
            src_centered * dst_centered.y,
            src_centered * dst_centered.z,
        );
    }

    // Compute SVD of covariance matrix
    let svd_result = svd3(&h);
    let u = *svd_result.u();
    let v = *svd_result.v();
    if !u.is_finite() || !v.is_finite() {
        return Err(IcpError::DegenerateCovariance);
    }

    // Compute rotation matrix R = V * U^T
    let mut r = v * u.transpose();

    // Handle reflection case to keep a proper rotation matrix
    if r.determinant() < 0.0 {
        let v_corrected = DMat3::from_cols(v.x_axis, v.y_axis, -v.z_axis);
        r = v_corrected * u.transpose();
    }

    // Compute translation vector
    let t = dst_centroid - r * src_centroid;

    Ok(se3_from_rt(&r, &t))
}

/// Compute the centroids of two sets of points.
pub(crate) fn compute_centroids(points1: &[[f64; 3]], points2: &[[f64; 3]]) -> (DVec3, DVec3) {
    let mut centroid1 = DVec3::ZERO;
    let mut centroid2 = DVec3::ZERO;

    for (p1, p2) in points1.iter().zip(points2.iter()) {
        centroid1 += DVec3::from_array(*p1);
        centroid2 += DVec3::from_array(*p2);
    }

    centroid1 /= points1.len() as f64;
    centroid2 /= points2.len() as f64;

    (centroid1, centroid2)
}
