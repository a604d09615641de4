//! # Prototype-Part Network Core
//!
//! This library implements the geometric and numeric core of a
//! "this-looks-like-that" prototype-part classification network: the
//! receptive-field arithmetic mapping prototype activations back to input
//! pixels, and the comparison operators between feature patches and learned
//! prototype vectors.
//!
//! ## Overview
//!
//! A prototype-part network classifies an image by comparing patches of a
//! convolutional feature map against a bank of learned prototype vectors.
//! Interpreting a match requires knowing which input pixels a feature
//! position sees, which is what the receptive-field chain computes:
//!
//! - The chain folds kernel size, stride, and padding layer by layer with
//!   the exact rounding rules of each padding regime; the result locates
//!   every prototype activation in the original image.
//! - The comparison operators are pure tensor transformations: patch-wise
//!   squared distances, a log similarity activation, global min pooling,
//!   and the cluster/separation loss pair.
//!
//! ## Modules
//!
//! - `config` - Shape descriptors and model configuration
//! - `receptive_field` - Layer-by-layer receptive-field arithmetic
//! - `network` - Distance, similarity, pooling, and assignment operators
//! - `loss` - Cluster/separation costs and cross-entropy

pub mod config;
pub mod loss;
pub mod network;
pub mod receptive_field;

/// Prelude module for convenient imports
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigError, FeatureShape, ModelConfig, PrototypeShape};

    // Receptive-field arithmetic
    pub use crate::receptive_field::{
        proto_layer_receptive_field, LayerSpec, Padding, ReceptiveField, ReceptiveFieldError,
    };

    // Prototype-layer operators
    pub use crate::network::{
        DistanceToSimilarity, MinDistancePooling, PrototypeClassAssignment, PrototypeDistance,
        DEFAULT_EPSILON,
    };

    // Losses
    pub use crate::loss::{
        CrossEntropyLoss, ProtoPartLoss, CLUSTER_WEIGHT, SEPARATION_WEIGHT,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
