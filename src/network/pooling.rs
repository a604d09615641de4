//! Global min-distance pooling
//!
//! Reduces the spatial distance map to one value per prototype: the minimum
//! distance across all positions. The reduction is realized as negate,
//! max-pool, negate, reusing the max primitive; for finite inputs this is
//! exactly the direct minimum.

use ndarray::{Array2, Array4};

use crate::config::{FeatureShape, ModelConfig, PrototypeShape};

/// Min-distance pooling operator
#[derive(Debug, Clone, Copy)]
pub struct MinDistancePooling {
    /// Pooling window, equal to the full spatial extent of the distance map
    window: (usize, usize),
    num_prototypes: usize,
}

impl MinDistancePooling {
    pub fn new(window: (usize, usize), num_prototypes: usize) -> Self {
        Self {
            window,
            num_prototypes,
        }
    }

    /// Window and prototype count derived from the model configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::from_shapes(&config.feature_shape, &config.prototype_shape)
    }

    /// Window covering the distance map a prototype patch leaves behind
    pub fn from_shapes(feature: &FeatureShape, prototype: &PrototypeShape) -> Self {
        let window = (
            feature.height - prototype.height + 1,
            feature.width - prototype.width + 1,
        );
        Self::new(window, prototype.num_prototypes)
    }

    pub fn window(&self) -> (usize, usize) {
        self.window
    }

    /// Pool the distance map down to the per-prototype minimum.
    ///
    /// # Arguments
    /// - `distances` - Distance map of shape `(batch, H', W', P)`
    ///
    /// # Returns
    /// - Minimum distances of shape `(batch, P)`, singleton spatial
    ///   dimensions dropped
    pub fn apply(&self, distances: &Array4<f64>) -> Array2<f64> {
        let (batch, height, width, num_prototypes) = distances.dim();
        assert_eq!(
            (height, width),
            self.window,
            "pooling window must cover the full spatial extent"
        );
        assert_eq!(num_prototypes, self.num_prototypes, "prototype count mismatch");

        let mut min_distances = Array2::zeros((batch, num_prototypes));

        for b in 0..batch {
            for p in 0..num_prototypes {
                let mut max_negated = f64::NEG_INFINITY;
                for i in 0..height {
                    for j in 0..width {
                        max_negated = max_negated.max(-distances[[b, i, j, p]]);
                    }
                }
                min_distances[[b, p]] = -max_negated;
            }
        }

        min_distances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array4;

    #[test]
    fn test_selects_single_minimum() {
        let op = MinDistancePooling::new((3, 4), 2);

        let mut distances = Array4::from_elem((1, 3, 4, 2), 5.0);
        distances[[0, 1, 2, 0]] = 0.25;
        distances[[0, 2, 0, 1]] = 1.75;

        let pooled = op.apply(&distances);

        assert_eq!(pooled.dim(), (1, 2));
        assert_relative_eq!(pooled[[0, 0]], 0.25);
        assert_relative_eq!(pooled[[0, 1]], 1.75);
    }

    #[test]
    fn test_channels_pool_independently() {
        let op = MinDistancePooling::new((2, 2), 3);

        let distances = Array4::from_shape_fn((2, 2, 2, 3), |(b, i, j, p)| {
            (b + 1) as f64 * 10.0 + (i * 2 + j) as f64 + p as f64 * 0.1
        });
        let pooled = op.apply(&distances);

        // The minimum sits at spatial position (0, 0) for every channel.
        for b in 0..2 {
            for p in 0..3 {
                assert_relative_eq!(pooled[[b, p]], distances[[b, 0, 0, p]]);
            }
        }
    }

    #[test]
    fn test_from_shapes_window() {
        let feature = FeatureShape::new(7, 7, 128);
        let prototype = PrototypeShape::new(200, 128, 1, 1);
        let op = MinDistancePooling::from_shapes(&feature, &prototype);

        assert_eq!(op.window(), (7, 7));

        let patchy = PrototypeShape::new(10, 128, 2, 3);
        let op = MinDistancePooling::from_shapes(&feature, &patchy);
        assert_eq!(op.window(), (6, 5));
    }

    #[test]
    #[should_panic(expected = "full spatial extent")]
    fn test_partial_window_rejected() {
        let op = MinDistancePooling::new((2, 2), 1);
        let distances = Array4::zeros((1, 3, 3, 1));
        op.apply(&distances);
    }
}
