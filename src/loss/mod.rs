//! Loss functions for prototype-part training
//!
//! This module provides:
//! - The cluster/separation cost pair over per-prototype minimum distances
//! - Categorical cross-entropy with an optional prediction observer

mod cross_entropy;
mod proto_part;

pub use cross_entropy::CrossEntropyLoss;
pub use proto_part::{ProtoPartLoss, CLUSTER_WEIGHT, SEPARATION_WEIGHT};

use ndarray::Array2;

/// Index of the largest entry in each row
pub(crate) fn argmax_rows(matrix: &Array2<f64>) -> Vec<usize> {
    matrix
        .outer_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(idx, _)| idx)
                .unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_rows() {
        let matrix = array![[0.1, 0.7, 0.2], [0.9, 0.05, 0.05]];
        assert_eq!(argmax_rows(&matrix), vec![1, 0]);
    }
}
