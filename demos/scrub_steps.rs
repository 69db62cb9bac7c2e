//! Scrubs a three-step result over a static mesh and shows which pieces
//! of work the caches absorb.
//!
//! Run with `cargo run --example scrub_steps`.

use std::sync::Arc;

use mesh_supports::io::memory::MemorySource;
use mesh_supports::prelude::*;

fn main() -> Result<(), MeshSupportError> {
    let mut source = MemorySource::new();
    source.add_mesh(
        "plate",
        2,
        &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0, 4.0, 0.0, 5.0, 0.0],
    );
    let snap = source.add_snapshot("plate", ComputeStep::new(0.0, 1));
    source.add_group(
        "plate",
        snap,
        ElementKind::Seg2,
        Domain::Cell,
        &[0, 1, 1, 2, 2, 3, 3, 4, 4, 5],
        Some(&[1, 1, 1, 2, 2]),
    );
    source.add_family("plate", 1, "bulk", Domain::Cell, &[]);
    source.add_family("plate", 2, "edge", Domain::Cell, &[]);

    let field = source.add_field("temperature", FieldKind::Cell, 1);
    for (index, time) in [0.0, 0.5, 1.0].into_iter().enumerate() {
        let step = source.add_field_step(field, ComputeStep::new(time, 1));
        let base = 300.0 + 25.0 * index as f64;
        source.add_field_values(
            field,
            step,
            ElementKind::Seg2,
            None,
            1,
            None,
            &[base, base + 1.0, base + 2.0, base + 3.0, base + 4.0],
        );
    }

    let mut reader = MeshReader::open(Box::new(source))?;
    reader.set_cache_strategy(CacheStrategy::CacheGeometry);

    println!("advertised steps:");
    for step in reader.available_steps() {
        println!("  t = {:>4}  it = {}", step.time, step.iteration);
    }

    let mut previous: Option<Vec<Arc<Geometry>>> = None;
    for time in [0.0, 0.5, 1.0] {
        reader.set_request(time, 1);
        let output = reader.build_request()?;
        println!("\nrequest at t = {time}:");
        for block in &output.blocks {
            let reused = previous
                .as_ref()
                .is_some_and(|geos| geos.iter().any(|g| Arc::ptr_eq(g, &block.geometry)));
            println!(
                "  {:<40} {:>2} cells, {:>2} points, geometry {}",
                block.path.join("/"),
                block.geometry.cell_count(),
                block.geometry.point_count(),
                if reused { "reused" } else { "built" },
            );
            for field in &block.fields {
                println!(
                    "    {:<12} {:?}{}",
                    field.field,
                    &field.values[..],
                    if field.shallow { "  (by reference)" } else { "" },
                );
            }
        }
        previous = Some(output.blocks.iter().map(|b| Arc::clone(&b.geometry)).collect());
    }
    Ok(())
}
