//! Constant-velocity Kalman filter over `[cx, cy, aspect, height]` boxes.
//!
//! The 8-dimensional state is the box center, aspect ratio (w/h) and
//! height followed by their velocities. Process and observation noise are
//! scaled by the current height so boxes of different sizes behave alike.

use log::warn;
use nalgebra::{Matrix4, SMatrix};
use ndarray::{Array1, Array2};

const NDIM: usize = 4;
const STATE_DIM: usize = 2 * NDIM;

/// Mean and covariance of one track's motion estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanState {
    /// State mean, `[cx, cy, a, h, vcx, vcy, va, vh]`
    pub mean: Array1<f64>,
    /// State covariance, 8x8
    pub covariance: Array2<f64>,
}

impl KalmanState {
    /// Box of the current estimate in TLWH form.
    pub fn tlwh(&self) -> [f64; 4] {
        let (cx, cy, aspect, h) = (self.mean[0], self.mean[1], self.mean[2], self.mean[3]);
        let w = aspect * h;
        [cx - w / 2.0, cy - h / 2.0, w, h]
    }
}

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = Array2::eye(STATE_DIM);
        for i in 0..NDIM {
            motion_mat[[i, NDIM + i]] = 1.0;
        }

        let mut update_mat = Array2::zeros((NDIM, STATE_DIM));
        for i in 0..NDIM {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    /// Create a track state from an unassociated `[cx, cy, a, h]` measurement.
    ///
    /// Velocities start at zero with a wide uncertainty.
    pub fn initiate(&self, measurement: [f64; 4]) -> KalmanState {
        let mut mean = Array1::zeros(STATE_DIM);
        for (i, &m) in measurement.iter().enumerate() {
            mean[i] = m;
        }

        let h = measurement[3];
        let std = [
            2.0 * self.std_weight_position * h,
            2.0 * self.std_weight_position * h,
            1e-2,
            2.0 * self.std_weight_position * h,
            10.0 * self.std_weight_velocity * h,
            10.0 * self.std_weight_velocity * h,
            1e-5,
            10.0 * self.std_weight_velocity * h,
        ];

        KalmanState {
            mean,
            covariance: diag_squared(&std),
        }
    }

    /// Run the prediction step: `x' = F x`, `P' = F P F^T + Q`.
    pub fn predict(&self, state: &KalmanState) -> KalmanState {
        let h = state.mean[3];
        let std = [
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-2,
            self.std_weight_position * h,
            self.std_weight_velocity * h,
            self.std_weight_velocity * h,
            1e-5,
            self.std_weight_velocity * h,
        ];
        let motion_cov = diag_squared(&std);

        let mean = self.motion_mat.dot(&state.mean);
        let covariance = self
            .motion_mat
            .dot(&state.covariance)
            .dot(&self.motion_mat.t())
            + motion_cov;

        KalmanState { mean, covariance }
    }

    /// Project the state into measurement space: `(H x, H P H^T + R)`.
    pub fn project(&self, state: &KalmanState) -> (Array1<f64>, Array2<f64>) {
        let h = state.mean[3];
        let std = [
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-1,
            self.std_weight_position * h,
        ];
        let innovation_cov = diag_squared(&std);

        let mean = self.update_mat.dot(&state.mean);
        let covariance = self
            .update_mat
            .dot(&state.covariance)
            .dot(&self.update_mat.t())
            + innovation_cov;

        (mean, covariance)
    }

    /// Run the correction step with a `[cx, cy, a, h]` measurement.
    ///
    /// The gain is obtained by solving `S K^T = H P` with an LU
    /// decomposition. If `S` cannot be factorized (a zero-height box has
    /// no positional uncertainty) the measurement is dropped and the
    /// prior state returned unchanged.
    pub fn update(&self, state: &KalmanState, measurement: [f64; 4]) -> KalmanState {
        let (projected_mean, projected_cov) = self.project(state);
        let innovation = Array1::from_iter(measurement) - projected_mean;

        // P * H^T, 8x4
        let pht = state.covariance.dot(&self.update_mat.t());

        let s = Matrix4::from_fn(|i, j| projected_cov[[i, j]]);
        let rhs = SMatrix::<f64, NDIM, STATE_DIM>::from_fn(|i, j| pht[[j, i]]);
        let gain_t = match s.lu().solve(&rhs) {
            Some(k) if k.iter().all(|v| v.is_finite()) => k,
            _ => {
                warn!("innovation covariance is singular, skipping kalman correction");
                return state.clone();
            }
        };
        let kalman_gain = Array2::from_shape_fn((STATE_DIM, NDIM), |(i, j)| gain_t[(j, i)]);

        let mean = &state.mean + &kalman_gain.dot(&innovation);
        let covariance = (Array2::<f64>::eye(STATE_DIM) - kalman_gain.dot(&self.update_mat))
            .dot(&state.covariance);

        KalmanState { mean, covariance }
    }
}

fn diag_squared(std: &[f64]) -> Array2<f64> {
    Array2::from_diag(&Array1::from_iter(std.iter().map(|s| s * s)))
}
