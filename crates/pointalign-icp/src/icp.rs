use std::time::Instant;

use glam::DMat4;

use crate::error::IcpError;
use crate::ops::{find_correspondences, fit_transformation};
use pointalign_3d::{linalg::transform_points_inplace, pointcloud::PointCloud};

/// Structure to define the ICP convergence criteria.
#[derive(Debug, Clone)]
pub struct IcpConvergenceCriteria {
    /// Maximum number of iterations to perform.
    pub max_iterations: usize,
    /// Convergence tolerance as the difference in mean correspondence
    /// distance between two consecutive iterations.
    pub tolerance: f64,
}

impl Default for IcpConvergenceCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
        }
    }
}

/// Reason the ICP loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcpTermination {
    /// The change in mean correspondence distance fell below the tolerance.
    Converged,
    /// The iteration cap was reached before the tolerance was met.
    MaxIterationsReached,
}

/// Result of the ICP algorithm.
///
/// The transformation is from the source to the target frame.
#[derive(Debug, Clone)]
pub struct IcpResult {
    /// Estimated homogeneous transformation.
    pub transform: DMat4,
    /// Correspondence distances of the last executed matching pass. They are
    /// measured before that iteration applies its transform update, so they
    /// lag the returned transformation by one update.
    pub distances: Vec<f64>,
    /// The total number of iterations performed.
    pub num_iterations: usize,
    /// Why the loop stopped.
    pub termination: IcpTermination,
}

/// Iterative Closest Point (ICP) algorithm using point to point distance.
///
/// Keeps a working copy of `source` and repeatedly matches it against
/// `target` with an exhaustive nearest neighbor search, fits the rigid
/// transformation between the matched sets, and applies it to the working
/// copy. The loop stops once the change in mean correspondence distance
/// between two consecutive iterations falls below `criteria.tolerance`, or
/// after `criteria.max_iterations` iterations. The returned transformation
/// is fit in a single step from the original source onto the final working
/// copy rather than accumulated across iterations.
///
/// # Arguments
///
/// * `source` - Source point cloud.
/// * `target` - Target point cloud.
/// * `criteria` - Convergence criteria.
///
/// # Returns
///
/// Result of the ICP algorithm containing the transformation from the
/// source to the target frame, the correspondence distances of the last
/// matching pass, the number of iterations performed, and the reason the
/// loop stopped.
///
/// # Errors
///
/// Returns an error if either point cloud is empty, if the source holds
/// fewer than 3 points, or if the transform estimation degenerates.
pub fn icp(
    source: &PointCloud,
    target: &PointCloud,
    criteria: &IcpConvergenceCriteria,
) -> Result<IcpResult, IcpError> {
    // working copy of the source points, updated every iteration
    let mut current = source.points().to_vec();

    let mut distances = Vec::new();
    let mut num_iterations = 0;
    let mut termination = IcpTermination::MaxIterationsReached;
    let mut prev_error = 0.0;

    // main icp loop
    for i in 0..criteria.max_iterations {
        let now = Instant::now();

        // find closest points between the working copy and target
        let correspondences = find_correspondences(&current, target.points())?;

        // reorder the target by the matched indices
        let matched = correspondences
            .indices
            .iter()
            .map(|&idx| target.points()[idx])
            .collect::<Vec<_>>();

        // compute the incremental transformation and apply it to the
        // working copy
        let delta = fit_transformation(&current, &matched)?;
        transform_points_inplace(&mut current, &delta);

        // compute error as the mean correspondence distance
        let mean_error = correspondences.distances.iter().sum::<f64>()
            / correspondences.distances.len() as f64;

        distances = correspondences.distances;
        num_iterations = i + 1;

        log::debug!(
            "iteration: {}, mean error: {}, elapsed: {:?}",
            i,
            mean_error,
            now.elapsed()
        );

        // check convergence and exit if below tolerance
        if (prev_error - mean_error).abs() < criteria.tolerance {
            termination = IcpTermination::Converged;
            break;
        }
        prev_error = mean_error;
    }

    // fit the final transformation from the untouched source onto the
    // aligned working copy
    let transform = fit_transformation(source.points(), &current)?;

    Ok(IcpResult {
        transform,
        distances,
        num_iterations,
        termination,
    })
}
