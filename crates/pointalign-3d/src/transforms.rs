use glam::{DMat3, DMat4, DQuat, DVec3, DVec4};
use thiserror::Error;

/// Error type for transform construction.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The rotation axis has zero length.
    #[error("Cannot compute a rotation from a zero length axis")]
    ZeroAxis,
}

/// Compute the rotation matrix from an axis and angle.
///
/// The axis does not need to be normalized.
///
/// # Arguments
///
/// * `axis` - The axis of rotation.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The rotation matrix.
///
/// Example:
///
/// ```
/// use glam::DVec3;
/// use pointalign_3d::transforms::axis_angle_to_rotation_matrix;
///
/// let rotation = axis_angle_to_rotation_matrix(&DVec3::X, std::f64::consts::FRAC_PI_2).unwrap();
/// assert!((rotation.determinant() - 1.0).abs() < 1e-12);
/// ```
pub fn axis_angle_to_rotation_matrix(axis: &DVec3, angle: f64) -> Result<DMat3, TransformError> {
    if axis.length_squared() < 1e-20 {
        return Err(TransformError::ZeroAxis);
    }
    Ok(DMat3::from_quat(DQuat::from_axis_angle(
        axis.normalize(),
        angle,
    )))
}

/// Assemble a homogeneous transformation from a rotation and translation.
pub fn se3_from_rt(rotation: &DMat3, translation: &DVec3) -> DMat4 {
    let mut matrix = DMat4::from_mat3(*rotation);
    matrix.w_axis = DVec4::new(translation.x, translation.y, translation.z, 1.0);
    matrix
}

/// Split a homogeneous transformation into its rotation and translation.
pub fn rt_from_se3(transform: &DMat4) -> (DMat3, DVec3) {
    (DMat3::from_mat4(*transform), transform.w_axis.truncate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_angle_to_rotation_matrix() -> Result<(), TransformError> {
        let rotation = axis_angle_to_rotation_matrix(&DVec3::X, std::f64::consts::FRAC_PI_2)?;
        let expected = DMat3::from_cols(
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(0.0, -1.0, 0.0),
        );
        assert!(rotation.abs_diff_eq(expected, 1e-12));
        Ok(())
    }

    #[test]
    fn test_axis_angle_to_rotation_matrix_unnormalized_axis() -> Result<(), TransformError> {
        let angle = 0.42;
        let rotation = axis_angle_to_rotation_matrix(&DVec3::new(0.0, 3.0, 0.0), angle)?;
        let expected = axis_angle_to_rotation_matrix(&DVec3::Y, angle)?;
        assert!(rotation.abs_diff_eq(expected, 1e-12));
        Ok(())
    }

    #[test]
    fn test_axis_angle_to_rotation_matrix_proper() -> Result<(), TransformError> {
        let axis = DVec3::new(0.3, -1.2, 0.8);
        let rotation = axis_angle_to_rotation_matrix(&axis, 1.7)?;
        assert!((rotation.determinant() - 1.0).abs() < 1e-12);
        assert!((rotation.transpose() * rotation).abs_diff_eq(DMat3::IDENTITY, 1e-12));
        Ok(())
    }

    #[test]
    fn test_axis_angle_to_rotation_matrix_zero_axis() {
        let result = axis_angle_to_rotation_matrix(&DVec3::ZERO, 1.0);
        assert!(matches!(result, Err(TransformError::ZeroAxis)));
    }

    #[test]
    fn test_se3_roundtrip() {
        let rotation = DMat3::from_rotation_z(0.7);
        let translation = DVec3::new(1.0, -2.0, 3.0);

        let transform = se3_from_rt(&rotation, &translation);
        let (rotation_back, translation_back) = rt_from_se3(&transform);

        assert_eq!(rotation_back, rotation);
        assert_eq!(translation_back, translation);
    }

    #[test]
    fn test_se3_from_rt_last_row() {
        let rotation = DMat3::from_rotation_y(1.1);
        let translation = DVec3::new(0.5, 0.5, -0.5);

        let transform = se3_from_rt(&rotation, &translation);
        assert_eq!(transform.x_axis.w, 0.0);
        assert_eq!(transform.y_axis.w, 0.0);
        assert_eq!(transform.z_axis.w, 0.0);
        assert_eq!(transform.w_axis.w, 1.0);
    }
}
