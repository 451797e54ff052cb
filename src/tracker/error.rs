//! Error type shared by the tracker modules.

use thiserror::Error;

/// Errors reported by the tracker, the matcher and the assignment solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// The tracker was constructed with an unusable configuration.
    #[error("invalid tracker configuration: {0}")]
    InvalidConfig(String),

    /// The cost matrix holds a NaN or negative infinity entry after
    /// normalization.
    #[error("cost matrix contains NaN or -inf entries")]
    InvalidCostMatrix,

    /// No complete assignment exists, every remaining pair is forbidden.
    #[error("cost matrix has no feasible assignment")]
    InfeasibleCostMatrix,
}

impl TrackError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
