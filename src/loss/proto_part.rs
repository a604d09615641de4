//! Cluster and separation costs
//!
//! Both costs operate on the `(batch, P)` minimum-distance matrix. The
//! cluster cost pulls each example toward the nearest prototype of its own
//! class; the separation cost measures closeness to the nearest wrong-class
//! prototype and enters the combined loss with a negative weight.
//!
//! The selection runs on inverted distances, `max_distance - d`, so the
//! nearest masked prototype is the row maximum and zeroed-out entries never
//! win the reduction.

use ndarray::Array2;

use super::argmax_rows;
use crate::config::{ConfigError, PrototypeShape};
use crate::network::PrototypeClassAssignment;

/// Weight of the cluster cost in the combined loss
pub const CLUSTER_WEIGHT: f64 = 0.8;
/// Weight of the separation cost in the combined loss
pub const SEPARATION_WEIGHT: f64 = -0.08;

/// Prototype-part loss over minimum distances
#[derive(Debug, Clone)]
pub struct ProtoPartLoss {
    /// Largest squared distance one prototype can produce: `C * H * W`
    max_distance: f64,
    assignment: PrototypeClassAssignment,
}

impl ProtoPartLoss {
    pub fn new(
        prototype_shape: &PrototypeShape,
        assignment: PrototypeClassAssignment,
    ) -> Result<Self, ConfigError> {
        if assignment.num_prototypes() != prototype_shape.num_prototypes {
            return Err(ConfigError::AssignmentRowCount {
                rows: assignment.num_prototypes(),
                num_prototypes: prototype_shape.num_prototypes,
            });
        }

        Ok(Self {
            max_distance: prototype_shape.max_distance(),
            assignment,
        })
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Mean distance to the nearest own-class prototype.
    ///
    /// # Arguments
    /// - `y_true` - One-hot labels, `(batch, num_classes)`
    /// - `min_distances` - Per-prototype minimum distances, `(batch, P)`
    pub fn cluster_cost(&self, y_true: &Array2<f64>, min_distances: &Array2<f64>) -> f64 {
        let mask = self.correct_class_mask(y_true, min_distances);
        self.masked_nearest_cost(&mask, min_distances)
    }

    /// Mean distance to the nearest wrong-class prototype.
    pub fn separation_cost(&self, y_true: &Array2<f64>, min_distances: &Array2<f64>) -> f64 {
        let mask = self.correct_class_mask(y_true, min_distances);
        self.masked_nearest_cost(&mask.mapv(|v| 1.0 - v), min_distances)
    }

    /// `0.8 * cluster - 0.08 * separation`. The weights are fixed design
    /// constants.
    pub fn combined(&self, y_true: &Array2<f64>, min_distances: &Array2<f64>) -> f64 {
        CLUSTER_WEIGHT * self.cluster_cost(y_true, min_distances)
            + SEPARATION_WEIGHT * self.separation_cost(y_true, min_distances)
    }

    fn correct_class_mask(&self, y_true: &Array2<f64>, min_distances: &Array2<f64>) -> Array2<f64> {
        assert_eq!(
            y_true.nrows(),
            min_distances.nrows(),
            "label/distance batch mismatch"
        );
        assert_eq!(
            min_distances.ncols(),
            self.assignment.num_prototypes(),
            "distance column count must equal the number of prototypes"
        );

        let labels = argmax_rows(y_true);
        self.assignment.correct_class_mask(&labels)
    }

    /// For each example, select the masked prototype with the largest
    /// inverted distance and charge how far it still is from a perfect
    /// match; average over the batch.
    fn masked_nearest_cost(&self, mask: &Array2<f64>, min_distances: &Array2<f64>) -> f64 {
        let (batch, num_prototypes) = min_distances.dim();
        let mut total = 0.0;

        for b in 0..batch {
            let mut inverted = f64::NEG_INFINITY;
            for p in 0..num_prototypes {
                let candidate = mask[[b, p]] * (self.max_distance - min_distances[[b, p]]);
                inverted = inverted.max(candidate);
            }
            total += self.max_distance - inverted;
        }

        total / batch as f64
    }
}
