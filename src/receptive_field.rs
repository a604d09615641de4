//! Receptive-field arithmetic for convolutional backbones
//!
//! Tracks how spatial coordinates transform layer by layer: the number of
//! positions along one axis, the jump (stride in input-pixel units) between
//! adjacent positions, the receptive field size in input pixels, and the
//! input-pixel coordinate of the first position's center. The chain
//! terminates at the prototype layer, whose descriptor locates every
//! prototype activation back in the original image.
//!
//! The rounding direction in each padding regime is load-bearing: a
//! one-pixel error here silently shifts every visualization built on top.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors detected while validating or folding a layer chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceptiveFieldError {
    #[error(
        "backbone sequences differ in length: {filters} filter sizes, {strides} strides, {paddings} paddings"
    )]
    MismatchedLayerCounts {
        filters: usize,
        strides: usize,
        paddings: usize,
    },

    #[error("filter of size {filter_size} exceeds padded input extent {extent}")]
    FilterExceedsExtent { filter_size: usize, extent: usize },

    #[error("layer stride must be non-zero")]
    ZeroStride,

    #[error("layer filter size must be non-zero")]
    ZeroFilter,
}

/// Convolution padding regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Padding {
    /// Output extent is the stride-scaled input extent
    Same,
    /// No padding, output shrinks by the filter size
    Valid,
    /// Explicit one-side padding amount
    Explicit(usize),
}

/// One convolutional or pooling layer of the backbone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub filter_size: usize,
    pub stride: usize,
    pub padding: Padding,
}

impl LayerSpec {
    pub fn new(filter_size: usize, stride: usize, padding: Padding) -> Self {
        Self {
            filter_size,
            stride,
            padding,
        }
    }

    /// Build the backbone sequence from parallel parameter lists, as
    /// architecture descriptions usually supply them.
    ///
    /// The three lists must have equal length; a mismatch is a
    /// configuration error, rejected before any computation.
    pub fn from_parts(
        filter_sizes: &[usize],
        strides: &[usize],
        paddings: &[Padding],
    ) -> Result<Vec<LayerSpec>, ReceptiveFieldError> {
        if filter_sizes.len() != strides.len() || filter_sizes.len() != paddings.len() {
            return Err(ReceptiveFieldError::MismatchedLayerCounts {
                filters: filter_sizes.len(),
                strides: strides.len(),
                paddings: paddings.len(),
            });
        }

        Ok(filter_sizes
            .iter()
            .zip(strides)
            .zip(paddings)
            .map(|((&filter_size, &stride), &padding)| LayerSpec::new(filter_size, stride, padding))
            .collect())
    }
}

/// Receptive-field descriptor of one layer's output positions
///
/// `n` is the spatial extent, `jump` the spacing between adjacent output
/// positions in input pixels, `size` the receptive field size in input
/// pixels, and `start` the input-pixel coordinate of the center of the
/// first output position. `start` is fractional: the first input pixel is
/// centered at 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceptiveField {
    pub n: usize,
    pub jump: usize,
    pub size: usize,
    pub start: f64,
}

impl ReceptiveField {
    /// Descriptor of the raw input image: every pixel is its own position,
    /// one pixel apart, covering one pixel, centered at 0.5.
    pub fn input(img_size: usize) -> Self {
        Self {
            n: img_size,
            jump: 1,
            size: 1,
            start: 0.5,
        }
    }

    /// Fold one layer into the descriptor.
    ///
    /// The three padding regimes round differently: `Same` takes the
    /// ceiling of `n / stride`, `Valid` the ceiling of
    /// `(n - filter + 1) / stride`, and explicit padding the floor of
    /// `(n - filter + pad) / stride` plus one.
    pub fn step(&self, layer: &LayerSpec) -> Result<ReceptiveField, ReceptiveFieldError> {
        let filter = layer.filter_size;
        let stride = layer.stride;
        if stride == 0 {
            return Err(ReceptiveFieldError::ZeroStride);
        }
        if filter == 0 {
            return Err(ReceptiveFieldError::ZeroFilter);
        }

        let (n_out, pad) = match layer.padding {
            Padding::Same => {
                let n_out = (self.n + stride - 1) / stride;
                let pad = if self.n % stride == 0 {
                    filter.saturating_sub(stride)
                } else {
                    filter.saturating_sub(self.n % stride)
                };
                (n_out, pad)
            }
            Padding::Valid => {
                if filter > self.n {
                    return Err(ReceptiveFieldError::FilterExceedsExtent {
                        filter_size: filter,
                        extent: self.n,
                    });
                }
                ((self.n - filter) / stride + 1, 0)
            }
            Padding::Explicit(p) => {
                let pad = 2 * p;
                if filter > self.n + pad {
                    return Err(ReceptiveFieldError::FilterExceedsExtent {
                        filter_size: filter,
                        extent: self.n + pad,
                    });
                }
                ((self.n + pad - filter) / stride + 1, pad)
            }
        };

        let pad_left = pad / 2;

        Ok(ReceptiveField {
            n: n_out,
            jump: self.jump * stride,
            size: self.size + (filter - 1) * self.jump,
            start: self.start
                + ((filter - 1) as f64 / 2.0 - pad_left as f64) * self.jump as f64,
        })
    }
}

/// Compute the prototype layer's receptive-field descriptor.
///
/// Folds the backbone layers in architectural order, then applies one more
/// step for the prototype kernel itself (stride 1, no padding).
pub fn proto_layer_receptive_field(
    img_size: usize,
    backbone: &[LayerSpec],
    prototype_kernel_size: usize,
) -> Result<ReceptiveField, ReceptiveFieldError> {
    let mut rf = ReceptiveField::input(img_size);

    for layer in backbone {
        rf = rf.step(layer)?;
    }

    let proto_layer = LayerSpec::new(prototype_kernel_size, 1, Padding::Valid);
    let rf = rf.step(&proto_layer)?;

    debug!(
        n = rf.n,
        jump = rf.jump,
        size = rf.size,
        start = rf.start,
        "prototype layer receptive field"
    );

    Ok(rf)
}
