//! Shape descriptors and model configuration
//!
//! The operators in this crate are parameterized by two plain shape records:
//! the prototype bank shape and the spatial shape of the feature map the
//! backbone hands to the distance operator. Both are owned by the caller and
//! validated eagerly, before any tensor work starts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors detected during configuration validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("dimension `{0}` must be non-zero")]
    ZeroDimension(&'static str),

    #[error("feature channels ({feature}) do not match prototype channels ({prototype})")]
    ChannelMismatch { feature: usize, prototype: usize },

    #[error("{num_prototypes} prototypes cannot be split evenly across {num_classes} classes")]
    UnevenClassSplit {
        num_prototypes: usize,
        num_classes: usize,
    },

    #[error("prototype patch {proto_h}x{proto_w} exceeds feature map {feat_h}x{feat_w}")]
    PatchExceedsFeatureMap {
        proto_h: usize,
        proto_w: usize,
        feat_h: usize,
        feat_w: usize,
    },

    #[error("assignment row {row} is not one-hot")]
    AssignmentRowNotOneHot { row: usize },

    #[error("assignment matrix has {rows} rows, expected one per prototype ({num_prototypes})")]
    AssignmentRowCount { rows: usize, num_prototypes: usize },
}

/// Shape of the learned prototype bank, `(P, C, H, W)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrototypeShape {
    /// Number of prototype vectors
    pub num_prototypes: usize,
    /// Channel depth of each prototype
    pub channels: usize,
    /// Patch height
    pub height: usize,
    /// Patch width
    pub width: usize,
}

impl PrototypeShape {
    pub fn new(num_prototypes: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            num_prototypes,
            channels,
            height,
            width,
        }
    }

    /// Layout of the bank tensor as stored by the distance operator:
    /// `(patch height, patch width, channels, num_prototypes)`.
    pub fn kernel_dims(&self) -> (usize, usize, usize, usize) {
        (self.height, self.width, self.channels, self.num_prototypes)
    }

    /// Largest squared distance the distance formula can produce when
    /// features are bounded in `[0, 1]`: one unit per bank entry.
    pub fn max_distance(&self) -> f64 {
        (self.channels * self.height * self.width) as f64
    }
}

impl Default for PrototypeShape {
    fn default() -> Self {
        Self::new(200, 128, 1, 1)
    }
}

/// Spatial shape of the feature map presented to the distance operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl FeatureShape {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }
}

impl Default for FeatureShape {
    fn default() -> Self {
        Self::new(7, 7, 128)
    }
}

/// Configuration shared by the prototype-layer operators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Input image size (square)
    pub img_size: usize,
    /// Number of output classes
    pub num_classes: usize,
    /// Shape of the prototype bank
    pub prototype_shape: PrototypeShape,
    /// Shape of the backbone's output feature map
    pub feature_shape: FeatureShape,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            img_size: 224,
            num_classes: 20,
            prototype_shape: PrototypeShape::default(),
            feature_shape: FeatureShape::default(),
        }
    }
}

impl ModelConfig {
    /// Validate the configuration before any operator is constructed.
    ///
    /// Rejections are eager and never silently defaulted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.img_size == 0 {
            return Err(ConfigError::ZeroDimension("img_size"));
        }
        if self.num_classes == 0 {
            return Err(ConfigError::ZeroDimension("num_classes"));
        }
        let p = &self.prototype_shape;
        if p.num_prototypes == 0 {
            return Err(ConfigError::ZeroDimension("num_prototypes"));
        }
        if p.channels == 0 || p.height == 0 || p.width == 0 {
            return Err(ConfigError::ZeroDimension("prototype_shape"));
        }
        let f = &self.feature_shape;
        if f.height == 0 || f.width == 0 || f.channels == 0 {
            return Err(ConfigError::ZeroDimension("feature_shape"));
        }
        if f.channels != p.channels {
            return Err(ConfigError::ChannelMismatch {
                feature: f.channels,
                prototype: p.channels,
            });
        }
        if p.num_prototypes % self.num_classes != 0 {
            return Err(ConfigError::UnevenClassSplit {
                num_prototypes: p.num_prototypes,
                num_classes: self.num_classes,
            });
        }
        if p.height > f.height || p.width > f.width {
            return Err(ConfigError::PatchExceedsFeatureMap {
                proto_h: p.height,
                proto_w: p.width,
                feat_h: f.height,
                feat_w: f.width,
            });
        }
        Ok(())
    }
}
