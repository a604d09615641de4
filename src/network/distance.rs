//! Squared-L2 distances between feature patches and prototype vectors
//!
//! The distance map is computed through the convolution identity
//! `||x - p||^2 = ||x||^2 - 2*x.p + ||p||^2` evaluated per spatial patch,
//! which turns the patch-wise distance into two valid correlations and a
//! per-prototype constant.

use ndarray::{Array1, Array4};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::config::PrototypeShape;

/// Prototype distance operator
///
/// Owns two separate buffers over the same `(kh, kw, C, P)` layout: the
/// learned prototype bank, updated externally between calls, and a constant
/// all-ones kernel used to sum squared patch entries. Only the bank is ever
/// mutated.
#[derive(Debug, Clone)]
pub struct PrototypeDistance {
    shape: PrototypeShape,
    /// Learned prototype bank, `(kh, kw, C, P)`
    prototypes: Array4<f64>,
    /// Constant patch-sum kernel, same layout, never updated
    ones: Array4<f64>,
}

impl PrototypeDistance {
    /// Create the operator with a uniformly initialized bank on `[0, 1)`.
    pub fn new(shape: PrototypeShape) -> Self {
        let dims = shape.kernel_dims();
        let prototypes = Array4::random(dims, Uniform::new(0.0, 1.0));

        Self {
            shape,
            prototypes,
            ones: Array4::ones(dims),
        }
    }

    /// Create the operator with a specific bank (for testing or loading).
    pub fn with_prototypes(shape: PrototypeShape, prototypes: Array4<f64>) -> Self {
        let dims = shape.kernel_dims();
        assert_eq!(
            prototypes.dim(),
            dims,
            "prototype bank does not match declared shape"
        );

        Self {
            shape,
            prototypes,
            ones: Array4::ones(dims),
        }
    }

    /// The declared bank shape
    pub fn shape(&self) -> &PrototypeShape {
        &self.shape
    }

    /// The prototype bank, `(kh, kw, C, P)`
    pub fn prototypes(&self) -> &Array4<f64> {
        &self.prototypes
    }

    /// Mutable access for the external optimizer
    pub fn prototypes_mut(&mut self) -> &mut Array4<f64> {
        &mut self.prototypes
    }

    /// Compute the distance map.
    ///
    /// # Arguments
    /// - `features` - Feature tensor of shape `(batch, H, W, C)`
    ///
    /// # Returns
    /// - Distances of shape `(batch, H - kh + 1, W - kw + 1, P)`
    pub fn apply(&self, features: &Array4<f64>) -> Array4<f64> {
        let (_, height, width, channels) = features.dim();
        let (kh, kw, kc, num_prototypes) = self.shape.kernel_dims();
        assert_eq!(channels, kc, "feature channel mismatch");
        assert!(
            height >= kh && width >= kw,
            "feature map smaller than prototype patch"
        );

        // ||x||^2 per patch: squared input correlated with the ones kernel
        let squared = features.mapv(|v| v * v);
        let x2_patch_sum = correlate_valid(&squared, &self.ones);

        // ||p||^2 per prototype
        let p2 = self.prototype_norms();

        // x.p per position and prototype
        let xp = correlate_valid(features, &self.prototypes);

        let mut distances = x2_patch_sum;
        let (batch, out_h, out_w, _) = distances.dim();
        for b in 0..batch {
            for i in 0..out_h {
                for j in 0..out_w {
                    for p in 0..num_prototypes {
                        let d = distances[[b, i, j, p]] - 2.0 * xp[[b, i, j, p]] + p2[p];
                        // True squared distance is never negative; the clamp
                        // only absorbs floating-point cancellation residue.
                        distances[[b, i, j, p]] = d.max(0.0);
                    }
                }
            }
        }

        distances
    }

    /// Sum of squares of each prototype vector's own entries
    fn prototype_norms(&self) -> Array1<f64> {
        let (kh, kw, kc, num_prototypes) = self.shape.kernel_dims();
        let mut norms = Array1::zeros(num_prototypes);

        for p in 0..num_prototypes {
            let mut sum = 0.0;
            for i in 0..kh {
                for j in 0..kw {
                    for c in 0..kc {
                        let v = self.prototypes[[i, j, c, p]];
                        sum += v * v;
                    }
                }
            }
            norms[p] = sum;
        }

        norms
    }
}

/// Valid, stride-1 correlation of `(B, H, W, C)` input with a
/// `(kh, kw, C, P)` kernel bank, producing `(B, H', W', P)`.
fn correlate_valid(input: &Array4<f64>, kernel: &Array4<f64>) -> Array4<f64> {
    let (batch, height, width, channels) = input.dim();
    let (kh, kw, _, num_kernels) = kernel.dim();
    let out_h = height - kh + 1;
    let out_w = width - kw + 1;

    let mut output = Array4::zeros((batch, out_h, out_w, num_kernels));

    for b in 0..batch {
        for i in 0..out_h {
            for j in 0..out_w {
                for p in 0..num_kernels {
                    let mut sum = 0.0;
                    for di in 0..kh {
                        for dj in 0..kw {
                            for c in 0..channels {
                                sum += input[[b, i + di, j + dj, c]] * kernel[[di, dj, c, p]];
                            }
                        }
                    }
                    output[[b, i, j, p]] = sum;
                }
            }
        }
    }

    output
}
