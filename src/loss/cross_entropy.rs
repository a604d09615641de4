//! Categorical cross-entropy with a prediction observer
//!
//! The loss itself is the standard mean negative log-likelihood of the true
//! class. Predicted class indices are additionally emitted for diagnostics,
//! through `tracing` and an optional caller-supplied observer; with no
//! observer installed the computation has no observable side effects beyond
//! the log record.

use ndarray::Array2;
use tracing::debug;

use super::argmax_rows;

/// Probability floor guarding `ln(0)`
const PROB_EPSILON: f64 = 1e-7;

/// Callback receiving the batch's predicted class indices
pub type PredictionObserver = Box<dyn Fn(&[usize]) + Send + Sync>;

/// Categorical cross-entropy loss
#[derive(Default)]
pub struct CrossEntropyLoss {
    observer: Option<PredictionObserver>,
}

impl std::fmt::Debug for CrossEntropyLoss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossEntropyLoss")
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl CrossEntropyLoss {
    pub fn new() -> Self {
        Self { observer: None }
    }

    /// Install an observer that receives each batch's predicted classes.
    pub fn with_observer(observer: impl Fn(&[usize]) + Send + Sync + 'static) -> Self {
        Self {
            observer: Some(Box::new(observer)),
        }
    }

    /// Mean categorical cross-entropy over the batch.
    ///
    /// # Arguments
    /// - `y_true` - One-hot labels, `(batch, num_classes)`
    /// - `y_pred` - Class probabilities, `(batch, num_classes)`
    pub fn apply(&self, y_true: &Array2<f64>, y_pred: &Array2<f64>) -> f64 {
        assert_eq!(y_true.dim(), y_pred.dim(), "label/prediction shape mismatch");

        let predictions = argmax_rows(y_pred);
        debug!(?predictions, "predicted classes");
        if let Some(observer) = &self.observer {
            observer(&predictions);
        }

        let batch = y_true.nrows();
        let mut total = 0.0;
        for (truth, pred) in y_true.outer_iter().zip(y_pred.outer_iter()) {
            let mut row_loss = 0.0;
            for (&t, &p) in truth.iter().zip(pred.iter()) {
                row_loss -= t * p.max(PROB_EPSILON).ln();
            }
            total += row_loss;
        }

        total / batch as f64
    }
}
