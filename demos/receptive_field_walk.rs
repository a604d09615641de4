//! Receptive-Field Walk Example
//!
//! Folds a small convolutional backbone layer by layer and prints how the
//! receptive-field descriptor evolves, terminating at the prototype layer.
//!
//! Run with: cargo run --example receptive_field_walk

use anyhow::Result;
use proto_part_network::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    println!("=== Receptive-Field Walk ===\n");

    let img_size = 32;
    let backbone = LayerSpec::from_parts(
        &[3, 2, 3, 2, 3],
        &[1, 2, 1, 2, 1],
        &[
            Padding::Same,
            Padding::Same,
            Padding::Same,
            Padding::Same,
            Padding::Valid,
        ],
    )?;
    let prototype_kernel_size = 1;

    println!("Input image: {}x{} pixels\n", img_size, img_size);
    println!(
        "{:<28} {:>5} {:>6} {:>6} {:>8}",
        "layer", "n", "jump", "size", "start"
    );

    let mut rf = ReceptiveField::input(img_size);
    println!(
        "{:<28} {:>5} {:>6} {:>6} {:>8.2}",
        "input", rf.n, rf.jump, rf.size, rf.start
    );

    for (idx, layer) in backbone.iter().enumerate() {
        rf = rf.step(layer)?;
        let label = format!(
            "layer {} ({}x{}/{} {:?})",
            idx + 1,
            layer.filter_size,
            layer.filter_size,
            layer.stride,
            layer.padding
        );
        println!(
            "{:<28} {:>5} {:>6} {:>6} {:>8.2}",
            label, rf.n, rf.jump, rf.size, rf.start
        );
    }

    let rf = proto_layer_receptive_field(img_size, &backbone, prototype_kernel_size)?;
    println!(
        "{:<28} {:>5} {:>6} {:>6} {:>8.2}",
        "prototype layer", rf.n, rf.jump, rf.size, rf.start
    );

    println!(
        "\nEach prototype activation sees a {}x{} pixel region; adjacent \
         activations are {} pixels apart.",
        rf.size, rf.size, rf.jump
    );

    Ok(())
}
