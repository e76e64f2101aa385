//! Fast 3x3 Singular Value Decomposition (SVD) implementation.
//!
//! Branch-minimizing SVD for 3x3 matrices at f64 precision, as needed by
//! rigid transform estimation where the cross covariance of two point sets
//! is decomposed every iteration.
//!
//! For any matrix A in R3x3 the decomposition is
//!
//! ```text
//! A = U S V^T
//! ```
//!
//! where U and V are orthogonal and S is diagonal with non-negative entries
//! sorted in descending order. The eigenvectors of A^T A are computed with a
//! cyclic Jacobi iteration that accumulates the rotations in a quaternion,
//! followed by a Givens QR decomposition of A V.
//!
//! # Example
//!
//! ```
//! use glam::DMat3;
//! use pointalign_3d::svd::svd3;
//!
//! let matrix = DMat3::from_cols_array(&[
//!     1.0, 0.0, 0.0, //
//!     0.0, 2.0, 0.0, //
//!     0.0, 0.0, 3.0, //
//! ]);
//!
//! let svd = svd3(&matrix);
//! let reconstruction = *svd.u() * *svd.s() * svd.v().transpose();
//! assert!(matrix.abs_diff_eq(reconstruction, 1e-9));
//! ```
//!
//! # References
//!
//! * McAdams, Selle, Tamstorf, Teran, and Sifakis (2011).
//!   "Computing the Singular Value Decomposition of 3x3 matrices with minimal
//!   branching and elementary floating point operations."
//!   University of Wisconsin-Madison Technical Report TR1690.

use glam::{DMat3, DQuat, DVec3};

const GAMMA: f64 = 5.828_427_124_746_19;
const CSTAR: f64 = 0.923_879_532_511_286_7;
const SSTAR: f64 = 0.382_683_432_365_089_8;
const SVD3_EPSILON: f64 = 1e-12;
const MAX_SWEEPS: usize = 8;

#[derive(Debug, Clone)]
/// A symmetric 3x3 matrix stored as its lower triangle.
struct Symmetric3x3 {
    /// The element at row 0, column 0, first diagonal element.
    m_00: f64,

    /// The element at row 1, column 0. equivalent to `m_01`.
    m_10: f64,

    /// The element at row 1, column 1, the second diagonal element.
    m_11: f64,

    /// The element at row 2, column 0. equivalent to `m_02`.
    m_20: f64,

    /// The element at row 2, column 1. equivalent to `m_12`.
    m_21: f64,

    /// The element at row 2, column 2, the third diagonal element.
    m_22: f64,
}

impl Symmetric3x3 {
    /// Constructor from a regular DMat3, keeping the lower triangle.
    fn from_mat3x3(mat: &DMat3) -> Self {
        Symmetric3x3 {
            m_00: mat.x_axis.x,
            m_10: mat.y_axis.x,
            m_11: mat.y_axis.y,
            m_20: mat.x_axis.z,
            m_21: mat.y_axis.z,
            m_22: mat.z_axis.z,
        }
    }
}

#[derive(Debug)]
/// The two coefficients of a Givens rotation.
struct Givens {
    /// The cosine of the angle in the Givens rotation.
    cos_theta: f64,

    /// The sine of the angle in the Givens rotation.
    sin_theta: f64,
}

#[derive(Debug)]
/// The factors of a QR decomposition.
struct QR3 {
    /// The orthogonal matrix Q.
    q: DMat3,

    /// The upper triangular matrix R.
    r: DMat3,
}

#[derive(Debug)]
/// The singular value decomposition of a 3x3 matrix.
pub struct Svd3 {
    /// The matrix of left singular vectors.
    u: DMat3,

    /// The diagonal matrix of singular values.
    s: DMat3,

    /// The matrix of right singular vectors.
    v: DMat3,
}

impl Svd3 {
    /// Get the left singular vectors matrix.
    #[inline]
    pub fn u(&self) -> &DMat3 {
        &self.u
    }

    /// Get the diagonal matrix of singular values.
    #[inline]
    pub fn s(&self) -> &DMat3 {
        &self.s
    }

    /// Get the right singular vectors matrix.
    #[inline]
    pub fn v(&self) -> &DMat3 {
        &self.v
    }
}

/// Approximation of the optimal Givens rotation for one Jacobi step
/// (Algorithm 2 of the McAdams report). Returns the x and w components of
/// the givens quaternion, y and z are 0.
#[inline(always)]
fn approximate_givens_parameters(s_pp: f64, s_qq: f64, s_pq: f64) -> Givens {
    let cos_theta_val = 2.0 * (s_pp - s_qq);
    let sin_theta_val = s_pq;
    let cos_theta2 = cos_theta_val * cos_theta_val;
    let sin_theta2 = sin_theta_val * sin_theta_val;

    if GAMMA * sin_theta2 < cos_theta2 {
        let w = 1.0 / ((cos_theta2 + sin_theta2).sqrt());
        Givens {
            cos_theta: w * cos_theta_val,
            sin_theta: w * sin_theta_val,
        }
    } else {
        Givens {
            cos_theta: CSTAR,
            sin_theta: SSTAR,
        }
    }
}

#[inline(always)]
fn conjugate_xy(s: &mut Symmetric3x3, q: &mut DQuat) {
    let mut g = approximate_givens_parameters(s.m_00, s.m_11, s.m_10);

    let cos_theta2 = g.cos_theta * g.cos_theta;
    let sin_theta2 = g.sin_theta * g.sin_theta;
    let scale = 1.0 / (cos_theta2 + sin_theta2);
    let a = (cos_theta2 - sin_theta2) * scale;
    let b = 2.0 * g.sin_theta * g.cos_theta * scale;

    // cache original matrix elements
    let s00 = s.m_00;
    let s10 = s.m_10;
    let s11 = s.m_11;
    let s20 = s.m_20;
    let s21 = s.m_21;

    // conjugate the matrix, S' = G^T S G
    s.m_00 = a * (a * s00 + b * s10) + b * (a * s10 + b * s11);
    s.m_10 = a * (-b * s00 + a * s10) + b * (-b * s10 + a * s11);
    s.m_11 = -b * (-b * s00 + a * s10) + a * (-b * s10 + a * s11);
    s.m_20 = a * s20 + b * s21;
    s.m_21 = -b * s20 + a * s21;

    // accumulate the rotation into the quaternion
    let tmp_x = q.x * g.sin_theta;
    let tmp_y = q.y * g.sin_theta;
    let tmp_z = q.z * g.sin_theta;
    g.sin_theta *= q.w;

    q.z = q.z * g.cos_theta + g.sin_theta;
    q.w = q.w * g.cos_theta - tmp_z;
    q.x = q.x * g.cos_theta + tmp_y;
    q.y = q.y * g.cos_theta - tmp_x;
}

#[inline(always)]
fn conjugate_yz(s: &mut Symmetric3x3, q: &mut DQuat) {
    let mut g = approximate_givens_parameters(s.m_11, s.m_22, s.m_21);

    let cos_theta2 = g.cos_theta * g.cos_theta;
    let sin_theta2 = g.sin_theta * g.sin_theta;
    let scale = 1.0 / (cos_theta2 + sin_theta2);
    let a = (cos_theta2 - sin_theta2) * scale;
    let b = 2.0 * g.sin_theta * g.cos_theta * scale;

    // cache original matrix elements
    let s11 = s.m_11;
    let s21 = s.m_21;
    let s22 = s.m_22;
    let s10 = s.m_10;
    let s20 = s.m_20;

    // conjugate the matrix, S' = G^T S G
    s.m_11 = a * (a * s11 + b * s21) + b * (a * s21 + b * s22);
    s.m_21 = a * (-b * s11 + a * s21) + b * (-b * s21 + a * s22);
    s.m_22 = -b * (-b * s11 + a * s21) + a * (-b * s21 + a * s22);
    s.m_10 = a * s10 + b * s20;
    s.m_20 = -b * s10 + a * s20;

    // accumulate the rotation into the quaternion
    let tmp_x = q.x * g.sin_theta;
    let tmp_y = q.y * g.sin_theta;
    let tmp_z = q.z * g.sin_theta;
    g.sin_theta *= q.w;

    q.x = q.x * g.cos_theta + g.sin_theta;
    q.w = q.w * g.cos_theta - tmp_x;
    q.y = q.y * g.cos_theta + tmp_z;
    q.z = q.z * g.cos_theta - tmp_y;
}

#[inline(always)]
fn conjugate_xz(s: &mut Symmetric3x3, q: &mut DQuat) {
    let mut g = approximate_givens_parameters(s.m_00, s.m_22, s.m_20);

    let cos_theta2 = g.cos_theta * g.cos_theta;
    let sin_theta2 = g.sin_theta * g.sin_theta;
    let scale = 1.0 / (cos_theta2 + sin_theta2);
    let a = (cos_theta2 - sin_theta2) * scale;
    let b = 2.0 * g.sin_theta * g.cos_theta * scale;

    // cache original matrix elements
    let s00 = s.m_00;
    let s20 = s.m_20;
    let s22 = s.m_22;
    let s10 = s.m_10;
    let s21 = s.m_21;

    // conjugate the matrix, S' = G^T S G
    s.m_00 = a * (a * s00 + b * s20) + b * (a * s20 + b * s22);
    s.m_20 = a * (-b * s00 + a * s20) + b * (-b * s20 + a * s22);
    s.m_22 = -b * (-b * s00 + a * s20) + a * (-b * s20 + a * s22);
    s.m_10 = a * s10 + b * s21;
    s.m_21 = -b * s10 + a * s21;

    // accumulate the rotation into the quaternion
    let tmp_x = q.x * g.sin_theta;
    let tmp_y = q.y * g.sin_theta;
    let tmp_z = q.z * g.sin_theta;
    g.sin_theta *= q.w;

    q.y = q.y * g.cos_theta + g.sin_theta;
    q.w = q.w * g.cos_theta - tmp_y;
    q.z = q.z * g.cos_theta + tmp_x;
    q.x = q.x * g.cos_theta - tmp_z;
}

/// Cyclic Jacobi eigenanalysis of a symmetric matrix. Returns the
/// eigenvector matrix accumulated from the per-step quaternions.
fn jacobi_eigenanalysis(mut s: Symmetric3x3) -> DMat3 {
    let mut q = DQuat::from_xyzw(0.0, 0.0, 0.0, 1.0);
    for _i in 0..MAX_SWEEPS {
        conjugate_xy(&mut s, &mut q);
        conjugate_yz(&mut s, &mut q);
        conjugate_xz(&mut s, &mut q);

        let off_diag_norm_sq = s.m_10 * s.m_10 + s.m_20 * s.m_20 + s.m_21 * s.m_21;
        if off_diag_norm_sq < 1e-24 {
            break;
        }
    }
    DMat3::from_quat(q)
}

/// Helper function used to swap X with Y and Y with X if c == true
#[inline(always)]
fn cond_swap(c: bool, x: &mut f64, y: &mut f64) {
    let z = *x;
    if c {
        *x = *y;
        *y = z;
    }
}

/// Helper function to conditionally swap two DVec3s
#[inline(always)]
fn cond_swap_vec3(c: bool, x: &mut DVec3, y: &mut DVec3) {
    let z = *x;
    if c {
        *x = *y;
        *y = z;
    }
}

/// Helper function to conditionally negate a DVec3
#[inline(always)]
fn cond_negate_vec3(c: bool, v: &mut DVec3) {
    let mask = 0_i64.wrapping_sub(c as i64) as u64;
    let sign_mask = 0x8000_0000_0000_0000u64;

    let neg_mask = mask & sign_mask;
    *v = DVec3::new(
        f64::from_bits(v.x.to_bits() ^ neg_mask),
        f64::from_bits(v.y.to_bits() ^ neg_mask),
        f64::from_bits(v.z.to_bits() ^ neg_mask),
    );
}

/// Sorts the singular values in descending order and adjusts the corresponding singular vectors accordingly
#[inline(always)]
fn sort_singular_values(b: &mut DMat3, v: &mut DMat3) {
    let mut rho1 = b.x_axis.length_squared();
    let mut rho2 = b.y_axis.length_squared();
    let mut rho3 = b.z_axis.length_squared();

    // First comparison (rho1, rho2)
    let c1 = rho1 < rho2;
    cond_swap(c1, &mut rho1, &mut rho2);
    cond_swap_vec3(c1, &mut b.x_axis, &mut b.y_axis);
    cond_swap_vec3(c1, &mut v.x_axis, &mut v.y_axis);
    cond_negate_vec3(c1, &mut b.y_axis);
    cond_negate_vec3(c1, &mut v.y_axis);

    // Second comparison (rho1, rho3)
    let c2 = rho1 < rho3;
    cond_swap(c2, &mut rho1, &mut rho3);
    cond_swap_vec3(c2, &mut b.x_axis, &mut b.z_axis);
    cond_swap_vec3(c2, &mut v.x_axis, &mut v.z_axis);
    cond_negate_vec3(c2, &mut b.z_axis);
    cond_negate_vec3(c2, &mut v.z_axis);

    // Third comparison (rho2, rho3)
    let c3 = rho2 < rho3;
    cond_swap_vec3(c3, &mut b.y_axis, &mut b.z_axis);
    cond_swap_vec3(c3, &mut v.y_axis, &mut v.z_axis);
    cond_negate_vec3(c3, &mut b.z_axis);
    cond_negate_vec3(c3, &mut v.z_axis);
}

/// Givens rotation for one QR elimination step (Algorithm 4 of the McAdams
/// report), expressed as the half angle quaternion components.
#[inline(always)]
fn qr_givens_quaternion(a1: f64, a2: f64) -> Givens {
    let epsilon = SVD3_EPSILON;
    let rho = (a1 * a1 + a2 * a2).sqrt();

    let mut g = Givens {
        cos_theta: a1.abs() + f64::max(rho, epsilon),
        sin_theta: if rho > epsilon { a2 } else { 0.0 },
    };

    let b = a1 < 0.0;
    cond_swap(b, &mut g.sin_theta, &mut g.cos_theta);

    let w = (g.cos_theta * g.cos_theta + g.sin_theta * g.sin_theta)
        .sqrt()
        .recip();
    g.cos_theta *= w;
    g.sin_theta *= w;
    g
}

/// Implements a QR decomposition of a Matrix using Givens rotations
fn qr_decomposition(b_mat: &mut DMat3) -> QR3 {
    // --- First Givens rotation to zero out b[1][0] (affects rows 0 and 1) ---
    let g1 = qr_givens_quaternion(b_mat.x_axis.x, b_mat.x_axis.y);
    let a1 = -2.0 * g1.sin_theta * g1.sin_theta + 1.0; // a1 = cos(theta1)
    let b1 = 2.0 * g1.cos_theta * g1.sin_theta; // b1 = sin(theta1)

    // Apply Q1.T to B (row-wise operation)
    let c0 = b_mat.x_axis.x;
    let c1 = b_mat.x_axis.y;
    b_mat.x_axis.x = a1 * c0 + b1 * c1;
    b_mat.x_axis.y = -b1 * c0 + a1 * c1;
    let c0 = b_mat.y_axis.x;
    let c1 = b_mat.y_axis.y;
    b_mat.y_axis.x = a1 * c0 + b1 * c1;
    b_mat.y_axis.y = -b1 * c0 + a1 * c1;
    let c0 = b_mat.z_axis.x;
    let c1 = b_mat.z_axis.y;
    b_mat.z_axis.x = a1 * c0 + b1 * c1;
    b_mat.z_axis.y = -b1 * c0 + a1 * c1;

    // --- Second Givens rotation to zero out b[2][0] (affects rows 0 and 2) ---
    let g2 = qr_givens_quaternion(b_mat.x_axis.x, b_mat.x_axis.z);
    let a2 = -2.0 * g2.sin_theta * g2.sin_theta + 1.0; // a2 = cos(theta2)
    let b2 = 2.0 * g2.cos_theta * g2.sin_theta; // b2 = sin(theta2)

    // Apply Q2.T to (Q1.T * B)
    let c0 = b_mat.x_axis.x;
    let c2 = b_mat.x_axis.z;
    b_mat.x_axis.x = a2 * c0 + b2 * c2;
    b_mat.x_axis.z = -b2 * c0 + a2 * c2;
    let c0 = b_mat.y_axis.x;
    let c2 = b_mat.y_axis.z;
    b_mat.y_axis.x = a2 * c0 + b2 * c2;
    b_mat.y_axis.z = -b2 * c0 + a2 * c2;
    let c0 = b_mat.z_axis.x;
    let c2 = b_mat.z_axis.z;
    b_mat.z_axis.x = a2 * c0 + b2 * c2;
    b_mat.z_axis.z = -b2 * c0 + a2 * c2;

    // --- Third Givens rotation to zero out b[2][1] (affects rows 1 and 2) ---
    let g3 = qr_givens_quaternion(b_mat.y_axis.y, b_mat.y_axis.z);
    let a3 = -2.0 * g3.sin_theta * g3.sin_theta + 1.0; // a3 = cos(theta3)
    let b3 = 2.0 * g3.cos_theta * g3.sin_theta; // b3 = sin(theta3)

    // Apply Q3.T to (Q2.T * Q1.T * B)
    let c1 = b_mat.x_axis.y;
    let c2 = b_mat.x_axis.z;
    b_mat.x_axis.y = a3 * c1 + b3 * c2;
    b_mat.x_axis.z = -b3 * c1 + a3 * c2;
    let c1 = b_mat.y_axis.y;
    let c2 = b_mat.y_axis.z;
    b_mat.y_axis.y = a3 * c1 + b3 * c2;
    b_mat.y_axis.z = -b3 * c1 + a3 * c2;
    let c1 = b_mat.z_axis.y;
    let c2 = b_mat.z_axis.z;
    b_mat.z_axis.y = a3 * c1 + b3 * c2;
    b_mat.z_axis.z = -b3 * c1 + a3 * c2;

    let r = *b_mat;

    // --- Construct Q = Q1 * Q2 * Q3 ---
    // Q1 = (Q1.T).T
    let q1 = DMat3::from_cols(
        DVec3::new(a1, b1, 0.0),
        DVec3::new(-b1, a1, 0.0),
        DVec3::Z,
    );

    // Q2 = (Q2.T).T
    let q2 = DMat3::from_cols(
        DVec3::new(a2, 0.0, b2),
        DVec3::Y,
        DVec3::new(-b2, 0.0, a2),
    );

    // Q3 = (Q3.T).T
    let q3 = DMat3::from_cols(
        DVec3::X,
        DVec3::new(0.0, a3, b3),
        DVec3::new(0.0, -b3, a3),
    );

    let q = q1 * q2 * q3;
    QR3 { q, r }
}

/// Compute the singular value decomposition of a 3x3 matrix.
///
/// # Arguments
///
/// * `a` - The matrix to decompose.
///
/// # Returns
///
/// The decomposition with the singular values sorted in descending order.
pub fn svd3(a: &DMat3) -> Svd3 {
    // Compute the eigenvectors of A^T * A, which is V in SVD (right singular vectors)
    let mut v = jacobi_eigenanalysis(Symmetric3x3::from_mat3x3(&(a.transpose().mul_mat3(a))));
    // Compute B = A * V
    let mut b = a.mul_mat3(&v);

    // Sort the singular values
    sort_singular_values(&mut b, &mut v);

    // Perform QR decomposition on B to get Q and R
    let qr = qr_decomposition(&mut b);

    let mut u = qr.q;
    let mut s = qr.r;

    // Fix the signs so the singular values are non-negative
    let cond_x = s.x_axis.x < 0.0;
    let cond_y = s.y_axis.y < 0.0;
    let cond_z = s.z_axis.z < 0.0;

    cond_negate_vec3(cond_x, &mut u.x_axis);
    cond_negate_vec3(cond_y, &mut u.y_axis);
    cond_negate_vec3(cond_z, &mut u.z_axis);

    s.x_axis.x = s.x_axis.x.abs();
    s.y_axis.y = s.y_axis.y.abs();
    s.z_axis.z = s.z_axis.z.abs();

    Svd3 { u, s, v }
}
