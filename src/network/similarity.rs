//! Distance-to-similarity activation
//!
//! Maps a distance map to bounded similarity scores with
//! `ln((d + 1) / (d + epsilon))`: monotonically decreasing in the distance,
//! peaking at `ln(1/epsilon)` for a perfect match and decaying to zero as
//! the distance grows.

use ndarray::{Array, Dimension};

/// Default epsilon of the log activation
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// Distance-to-similarity operator
#[derive(Debug, Clone, Copy)]
pub struct DistanceToSimilarity {
    epsilon: f64,
}

impl DistanceToSimilarity {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Convert distances (values >= 0, any shape) to similarity scores of
    /// the same shape. Negative inputs are a caller-contract violation and
    /// are not guarded.
    pub fn apply<D: Dimension>(&self, distances: &Array<f64, D>) -> Array<f64, D> {
        distances.mapv(|d| ((d + 1.0) / (d + self.epsilon)).ln())
    }
}

impl Default for DistanceToSimilarity {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}
