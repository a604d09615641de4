//! Prototype Pipeline Example
//!
//! Runs a synthetic feature map through the full operator chain:
//! distances, min pooling, similarity scores, and the loss pair.
//!
//! Run with: cargo run --example prototype_pipeline

use anyhow::Result;
use ndarray::{Array2, Array4};
use proto_part_network::prelude::*;
use rand::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    println!("=== Prototype Pipeline ===\n");

    let config = ModelConfig {
        img_size: 32,
        num_classes: 4,
        prototype_shape: PrototypeShape::new(8, 16, 1, 1),
        feature_shape: FeatureShape::new(5, 5, 16),
    };
    config.validate()?;

    println!(
        "1. Configuration: {} prototypes x {} channels over {} classes",
        config.prototype_shape.num_prototypes,
        config.prototype_shape.channels,
        config.num_classes
    );

    // Synthetic feature batch in [0, 1), as a sigmoid add-on layer would produce.
    let batch = 6;
    let mut rng = StdRng::seed_from_u64(17);
    let features = Array4::from_shape_fn(
        (
            batch,
            config.feature_shape.height,
            config.feature_shape.width,
            config.feature_shape.channels,
        ),
        |_| rng.gen::<f64>(),
    );
    println!("2. Feature batch: {:?}", features.dim());

    let distance_op = PrototypeDistance::new(config.prototype_shape);
    let distances = distance_op.apply(&features);
    println!("3. Distance map: {:?}", distances.dim());

    let pooling = MinDistancePooling::from_config(&config);
    let min_distances = pooling.apply(&distances);
    println!("4. Min distances: {:?}", min_distances.dim());

    let similarity = DistanceToSimilarity::default();
    let scores = similarity.apply(&min_distances);
    for b in 0..batch {
        let best = scores
            .row(b)
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(p, s)| (p, *s))
            .unwrap();
        println!(
            "   - example {}: best prototype {} (similarity {:.3})",
            b, best.0, best.1
        );
    }

    // Random one-hot labels for the loss demonstration.
    let mut y_true = Array2::zeros((batch, config.num_classes));
    for b in 0..batch {
        y_true[[b, rng.gen_range(0..config.num_classes)]] = 1.0;
    }

    let assignment = PrototypeClassAssignment::even_split(
        config.prototype_shape.num_prototypes,
        config.num_classes,
    )?;
    let loss = ProtoPartLoss::new(&config.prototype_shape, assignment)?;

    let cluster = loss.cluster_cost(&y_true, &min_distances);
    let separation = loss.separation_cost(&y_true, &min_distances);
    println!("\n5. Cluster cost:    {:.4}", cluster);
    println!("   Separation cost: {:.4}", separation);
    println!(
        "   Combined:        {:.4}  ({} * cluster + {} * separation)",
        loss.combined(&y_true, &min_distances),
        CLUSTER_WEIGHT,
        SEPARATION_WEIGHT
    );

    Ok(())
}
