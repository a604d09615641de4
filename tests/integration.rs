//! Integration tests for the prototype-part network core
//!
//! These tests verify the end-to-end functionality of the library: the
//! receptive-field chain over a realistic backbone, and the full operator
//! pipeline from feature map to losses.

use approx::assert_relative_eq;
use ndarray::{Array2, Array4};
use proto_part_network::prelude::*;
use rand::prelude::*;

/// Feature tensor with reproducible pseudo-random entries in [0, 1)
fn random_features(batch: usize, h: usize, w: usize, c: usize, seed: u64) -> Array4<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array4::from_shape_fn((batch, h, w, c), |_| rng.gen::<f64>())
}

#[test]
fn test_vgg_style_receptive_field_chain() {
    // Five same-padded 3x3 conv blocks, each followed by a 2x2/2 pool:
    // the classic 224 -> 7 reduction.
    let mut filter_sizes = Vec::new();
    let mut strides = Vec::new();
    let mut paddings = Vec::new();
    for _ in 0..5 {
        filter_sizes.extend([3, 2]);
        strides.extend([1, 2]);
        paddings.extend([Padding::Same, Padding::Same]);
    }

    let backbone = LayerSpec::from_parts(&filter_sizes, &strides, &paddings).unwrap();
    let rf = proto_layer_receptive_field(224, &backbone, 1).unwrap();

    assert_eq!(rf.n, 7);
    assert_eq!(rf.jump, 32);
    // Receptive field grows but never exceeds what the strides allow.
    assert!(rf.size > 32);
    assert!(rf.size < 224);
}

#[test]
fn test_chain_matches_manual_fold() {
    let backbone = vec![
        LayerSpec::new(7, 2, Padding::Explicit(3)),
        LayerSpec::new(3, 2, Padding::Same),
        LayerSpec::new(3, 1, Padding::Valid),
    ];

    let mut rf = ReceptiveField::input(64);
    for layer in &backbone {
        rf = rf.step(layer).unwrap();
    }
    let expected = rf.step(&LayerSpec::new(2, 1, Padding::Valid)).unwrap();

    let chained = proto_layer_receptive_field(64, &backbone, 2).unwrap();
    assert_eq!(chained, expected);
}

#[test]
fn test_full_operator_pipeline() {
    // Small configuration: 6 prototypes over 3 classes, 4x4x2 features,
    // 1x1 prototype patches.
    let config = ModelConfig {
        img_size: 16,
        num_classes: 3,
        prototype_shape: PrototypeShape::new(6, 2, 1, 1),
        feature_shape: FeatureShape::new(4, 4, 2),
    };
    config.validate().unwrap();

    let batch = 5;
    let features = random_features(batch, 4, 4, 2, 42);

    // Distance map
    let distance_op = PrototypeDistance::new(config.prototype_shape);
    let distances = distance_op.apply(&features);
    assert_eq!(distances.dim(), (batch, 4, 4, 6));
    assert!(distances.iter().all(|&d| d >= 0.0));

    // Min pooling
    let pooling = MinDistancePooling::from_config(&config);
    let min_distances = pooling.apply(&distances);
    assert_eq!(min_distances.dim(), (batch, 6));

    // Pooled minima must be attained somewhere in the map.
    for b in 0..batch {
        for p in 0..6 {
            let direct_min = distances
                .slice(ndarray::s![b, .., .., p])
                .iter()
                .cloned()
                .fold(f64::INFINITY, f64::min);
            assert_relative_eq!(min_distances[[b, p]], direct_min);
        }
    }

    // Similarity scores are bounded by the zero-distance peak.
    let similarity = DistanceToSimilarity::default();
    let scores = similarity.apply(&min_distances);
    let peak = (1.0f64 / DEFAULT_EPSILON).ln();
    assert!(scores.iter().all(|&s| s <= peak));

    // Losses over the pooled distances.
    let assignment = PrototypeClassAssignment::even_split(6, 3).unwrap();
    let loss = ProtoPartLoss::new(&config.prototype_shape, assignment).unwrap();

    let mut y_true = Array2::zeros((batch, 3));
    for b in 0..batch {
        y_true[[b, b % 3]] = 1.0;
    }

    let cluster = loss.cluster_cost(&y_true, &min_distances);
    let separation = loss.separation_cost(&y_true, &min_distances);
    let combined = loss.combined(&y_true, &min_distances);

    assert!(cluster >= 0.0);
    assert!(cluster <= loss.max_distance());
    assert!(separation >= 0.0);
    assert_relative_eq!(
        combined,
        CLUSTER_WEIGHT * cluster + SEPARATION_WEIGHT * separation
    );
}

#[test]
fn test_distance_and_pooling_with_patch_prototypes() {
    // 2x2 prototype patches shrink the distance map to 3x3.
    let config = ModelConfig {
        img_size: 16,
        num_classes: 2,
        prototype_shape: PrototypeShape::new(4, 3, 2, 2),
        feature_shape: FeatureShape::new(4, 4, 3),
    };
    config.validate().unwrap();

    let features = random_features(2, 4, 4, 3, 7);
    let distance_op = PrototypeDistance::new(config.prototype_shape);
    let distances = distance_op.apply(&features);
    assert_eq!(distances.dim(), (2, 3, 3, 4));

    let pooling = MinDistancePooling::from_config(&config);
    assert_eq!(pooling.window(), (3, 3));
    let min_distances = pooling.apply(&distances);
    assert_eq!(min_distances.dim(), (2, 4));
}

#[test]
fn test_cross_entropy_with_observer() {
    use std::sync::{Arc, Mutex};

    let captured: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    let loss = CrossEntropyLoss::with_observer(move |predictions| {
        sink.lock().unwrap().extend_from_slice(predictions);
    });

    let y_true = ndarray::array![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
    let y_pred = ndarray::array![[0.8, 0.1, 0.1], [0.2, 0.3, 0.5]];

    let value = loss.apply(&y_true, &y_pred);
    assert!(value > 0.0);
    assert_eq!(*captured.lock().unwrap(), vec![0, 2]);

    // The pure variant computes the same value.
    let pure = CrossEntropyLoss::new();
    assert_relative_eq!(pure.apply(&y_true, &y_pred), value);
}

#[test]
fn test_prototype_bank_update_changes_distances() {
    // The bank is the only mutable buffer; pushing it toward a patch must
    // shrink that patch's distance.
    let shape = PrototypeShape::new(2, 2, 1, 1);
    let features = random_features(1, 3, 3, 2, 3);

    let mut distance_op = PrototypeDistance::with_prototypes(
        shape,
        Array4::zeros(shape.kernel_dims()),
    );
    let before = distance_op.apply(&features)[[0, 1, 1, 0]];

    // Move prototype 0 onto the feature vector at (1, 1).
    distance_op.prototypes_mut()[[0, 0, 0, 0]] = features[[0, 1, 1, 0]];
    distance_op.prototypes_mut()[[0, 0, 1, 0]] = features[[0, 1, 1, 1]];
    let after = distance_op.apply(&features)[[0, 1, 1, 0]];

    assert!(after < before);
    assert_relative_eq!(after, 0.0, epsilon = 1e-9);
}
