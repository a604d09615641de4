//! Prototype-to-class assignment
//!
//! Each prototype belongs to exactly one class. The assignment is a binary
//! `(P, num_classes)` matrix fixed at model construction; the loss module
//! gathers its columns per example to mask correct-class prototypes.

use ndarray::Array2;

use crate::config::ConfigError;

/// Binary matrix mapping each prototype to its class
#[derive(Debug, Clone, PartialEq)]
pub struct PrototypeClassAssignment {
    /// `(P, num_classes)`, one 1 per row
    matrix: Array2<f64>,
}

impl PrototypeClassAssignment {
    /// Assign prototypes to classes in even contiguous blocks: prototype
    /// `j` belongs to class `j / (P / num_classes)`.
    pub fn even_split(num_prototypes: usize, num_classes: usize) -> Result<Self, ConfigError> {
        if num_classes == 0 {
            return Err(ConfigError::ZeroDimension("num_classes"));
        }
        if num_prototypes == 0 {
            return Err(ConfigError::ZeroDimension("num_prototypes"));
        }
        if num_prototypes % num_classes != 0 {
            return Err(ConfigError::UnevenClassSplit {
                num_prototypes,
                num_classes,
            });
        }

        let per_class = num_prototypes / num_classes;
        let mut matrix = Array2::zeros((num_prototypes, num_classes));
        for j in 0..num_prototypes {
            matrix[[j, j / per_class]] = 1.0;
        }

        Ok(Self { matrix })
    }

    /// Use a caller-supplied 0/1 matrix. Each row must be one-hot.
    pub fn from_matrix(matrix: Array2<f64>) -> Result<Self, ConfigError> {
        for (row_idx, row) in matrix.outer_iter().enumerate() {
            let ones = row.iter().filter(|&&v| v == 1.0).count();
            let zeros = row.iter().filter(|&&v| v == 0.0).count();
            if ones != 1 || ones + zeros != row.len() {
                return Err(ConfigError::AssignmentRowNotOneHot { row: row_idx });
            }
        }

        Ok(Self { matrix })
    }

    pub fn num_prototypes(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn num_classes(&self) -> usize {
        self.matrix.ncols()
    }

    /// The raw `(P, num_classes)` matrix
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Class index of one prototype
    pub fn class_of(&self, prototype: usize) -> usize {
        self.matrix
            .row(prototype)
            .iter()
            .position(|&v| v == 1.0)
            .unwrap_or(0)
    }

    /// Gather, per example, the assignment column of its true class:
    /// a `(batch, P)` mask of the correct-class prototypes.
    pub fn correct_class_mask(&self, labels: &[usize]) -> Array2<f64> {
        let num_prototypes = self.num_prototypes();
        let mut mask = Array2::zeros((labels.len(), num_prototypes));

        for (b, &label) in labels.iter().enumerate() {
            assert!(label < self.num_classes(), "label out of range");
            for p in 0..num_prototypes {
                mask[[b, p]] = self.matrix[[p, label]];
            }
        }

        mask
    }
}
