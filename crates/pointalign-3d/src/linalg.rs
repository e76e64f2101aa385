use glam::{DMat3, DMat4, DVec3};

/// Transform a set of points using a rotation and translation.
///
/// # Arguments
///
/// * `src_points` - A set of points to be transformed.
/// * `dst_r_src` - The rotation from the source to the destination frame.
/// * `dst_t_src` - The translation from the source to the destination frame.
/// * `dst_points` - A pre-allocated buffer to store the transformed points.
///
/// PRECONDITION: dst_points is a pre-allocated slice of the same size as src_points.
///
/// Example:
///
/// ```
/// use glam::{DMat3, DVec3};
/// use pointalign_3d::linalg::transform_points;
///
/// let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
/// let rotation = DMat3::IDENTITY;
/// let translation = DVec3::ZERO;
/// let mut dst_points = vec![[0.0; 3]; src_points.len()];
/// transform_points(&src_points, &rotation, &translation, &mut dst_points);
/// assert_eq!(dst_points, src_points);
/// ```
pub fn transform_points(
    src_points: &[[f64; 3]],
    dst_r_src: &DMat3,
    dst_t_src: &DVec3,
    dst_points: &mut [[f64; 3]],
) {
    assert_eq!(src_points.len(), dst_points.len());

    for (point_dst, point_src) in dst_points.iter_mut().zip(src_points.iter()) {
        let point = (*dst_r_src) * DVec3::from_array(*point_src) + *dst_t_src;
        *point_dst = point.to_array();
    }
}

/// Transform a set of points in place using a homogeneous transformation.
///
/// # Arguments
///
/// * `points` - The points to be transformed.
/// * `transform` - The homogeneous transformation to apply.
pub fn transform_points_inplace(points: &mut [[f64; 3]], transform: &DMat4) {
    for point in points.iter_mut() {
        *point = transform.transform_point3(DVec3::from_array(*point)).to_array();
    }
}
