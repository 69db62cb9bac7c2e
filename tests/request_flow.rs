use std::sync::Arc;

use mesh_supports::io::memory::MemorySource;
use mesh_supports::mesh_error::MeshSupportError;
use mesh_supports::prelude::*;

/// 6 points, 5 seg2 cells; family 1 on cells {0..2}, family 2 on {3,4};
/// a cell field with steps at t = 0, 1, 2.
fn scrub_source() -> MemorySource {
    let mut src = MemorySource::new();
    src.add_mesh(
        "plate",
        2,
        &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0, 4.0, 0.0, 5.0, 0.0],
    );
    let snap = src.add_snapshot("plate", ComputeStep::new(0.0, 1));
    src.add_group(
        "plate",
        snap,
        ElementKind::Seg2,
        Domain::Cell,
        &[0, 1, 1, 2, 2, 3, 3, 4, 4, 5],
        Some(&[1, 1, 1, 2, 2]),
    );
    src.add_family("plate", 1, "bulk", Domain::Cell, &[]);
    src.add_family("plate", 2, "edge", Domain::Cell, &[]);
    let f = src.add_field("temp", FieldKind::Cell, 1);
    for (i, t) in [0.0, 1.0, 2.0].iter().enumerate() {
        let s = src.add_field_step(f, ComputeStep::new(*t, 1));
        let base = (i * 10) as f64;
        src.add_field_values(
            f,
            s,
            ElementKind::Seg2,
            None,
            1,
            None,
            &[base, base + 1.0, base + 2.0, base + 3.0, base + 4.0],
        );
    }
    src
}

#[test]
fn default_request_produces_one_block_per_family() {
    let mut reader = MeshReader::open(Box::new(scrub_source())).unwrap();
    reader.set_request(0.0, 1);
    let output = reader.build_request().unwrap();
    assert_eq!(output.blocks.len(), 2);

    let bulk = &output.blocks[0];
    assert_eq!(bulk.path, vec!["plate", "OnCell", "bulk", "Seg2"]);
    assert_eq!(bulk.geometry.cell_count(), 3);
    assert_eq!(bulk.fields.len(), 1);
    assert_eq!(&bulk.fields[0].values[..], &[0.0, 1.0, 2.0]);

    let edge = &output.blocks[1];
    assert_eq!(edge.geometry.cell_count(), 2);
    assert_eq!(edge.geometry.point_count(), 3);
    assert_eq!(&edge.fields[0].values[..], &[3.0, 4.0]);

    for block in &output.blocks {
        assert_eq!(
            reader.catalog().get(block.support).unwrap().state(),
            SupportState::FieldsMapped
        );
    }
}

#[test]
fn time_scrub_reuses_cached_geometry() {
    let mut reader = MeshReader::open(Box::new(scrub_source())).unwrap();
    reader.set_cache_strategy(CacheStrategy::CacheGeometry);
    reader.set_request(0.0, 1);
    let first = reader.build_request().unwrap();
    reader.set_request(2.0, 1);
    let second = reader.build_request().unwrap();

    // same support identity, same geometry allocation, fresh field data
    assert_eq!(first.blocks[0].support, second.blocks[0].support);
    assert!(Arc::ptr_eq(
        &first.blocks[0].geometry,
        &second.blocks[0].geometry
    ));
    assert_eq!(&second.blocks[0].fields[0].values[..], &[20.0, 21.0, 22.0]);
}

#[test]
fn nearest_step_resolution_floors_time() {
    let mut reader = MeshReader::open(Box::new(scrub_source())).unwrap();
    reader.set_request(1.7, 0);
    let output = reader.build_request().unwrap();
    // t=1.7 resolves to the stored step at t=1.0
    assert_eq!(&output.blocks[0].fields[0].values[..], &[10.0, 11.0, 12.0]);
}

#[test]
fn cache_nothing_drops_geometry_after_the_request() {
    let mut reader = MeshReader::open(Box::new(scrub_source())).unwrap();
    reader.set_cache_strategy(CacheStrategy::CacheNothing);
    reader.set_request(0.0, 1);
    let output = reader.build_request().unwrap();
    for block in &output.blocks {
        assert!(reader.cached_geometry(block.support).is_none());
    }
}

#[test]
fn decode_failure_aborts_but_keeps_prior_caches() {
    let source = scrub_source();
    let mut reader = MeshReader::open(Box::new(source)).unwrap();
    reader.set_cache_strategy(CacheStrategy::CacheGeometry);
    reader.set_request(0.0, 1);
    let first = reader.build_request().unwrap();
    let prior: Vec<SupportId> = first.blocks.iter().map(|b| b.support).collect();

    // poison the next field read; Arc'd buffers decoded earlier still
    // serve, so force a fresh step
    // (the source was moved into the reader; rebuild with a poisoned one)
    let poisoned = scrub_source();
    poisoned.set_fail_field_reads(true);
    let mut reader2 = MeshReader::open(Box::new(poisoned)).unwrap();
    reader2.set_cache_strategy(CacheStrategy::CacheGeometry);
    reader2.set_request(0.0, 1);
    let err = reader2.build_request().unwrap_err();
    assert!(matches!(err, MeshSupportError::DecodeFailed { .. }));

    // the healthy reader's caches were untouched by the other's failure
    for id in prior {
        assert!(reader.cached_geometry(id).is_some());
    }
}

#[test]
fn deselecting_a_family_drops_its_block_and_resets_state() {
    let mut reader = MeshReader::open(Box::new(scrub_source())).unwrap();
    reader.set_request(0.0, 1);
    let all = reader.build_request().unwrap();
    assert_eq!(all.blocks.len(), 2);

    reader.selection_mut().set_family_selected("plate", "edge", false);
    let trimmed = reader.build_request().unwrap();
    assert_eq!(trimmed.blocks.len(), 1);
    assert_eq!(trimmed.blocks[0].path[2], "bulk");
}

#[test]
fn deselecting_the_field_still_emits_geometry() {
    let mut reader = MeshReader::open(Box::new(scrub_source())).unwrap();
    reader.set_request(0.0, 1);
    reader.selection_mut().set_field_selected("temp", false);
    let output = reader.build_request().unwrap();
    assert_eq!(output.blocks.len(), 2);
    assert!(output.blocks.iter().all(|b| b.fields.is_empty()));
}

#[test]
fn disabling_the_element_kind_suppresses_the_group() {
    let mut reader = MeshReader::open(Box::new(scrub_source())).unwrap();
    reader.set_request(0.0, 1);
    reader.selection_mut().set_kind_enabled(ElementKind::Seg2, false);
    let output = reader.build_request().unwrap();
    assert!(output.blocks.is_empty());
}

#[test]
fn iteration_mode_resolves_exact_then_clamps() {
    let mut src = MemorySource::new();
    src.add_mesh("m", 2, &[0.0, 0.0, 1.0, 0.0]);
    let snap = src.add_snapshot("m", ComputeStep::new(0.0, 1));
    src.add_group("m", snap, ElementKind::Seg2, Domain::Cell, &[0, 1], Some(&[1]));
    let f = src.add_field("temp", FieldKind::Cell, 1);
    for iteration in 1..=3 {
        let s = src.add_field_step(f, ComputeStep::new(0.0, iteration));
        src.add_field_values(
            f,
            s,
            ElementKind::Seg2,
            None,
            1,
            None,
            &[iteration as f64],
        );
    }
    let mut reader = MeshReader::open(Box::new(src)).unwrap();
    reader.set_step_mode(StepMode::Iteration);
    reader.set_time_index_for_iterations(0);

    reader.set_request(0.0, 2);
    let output = reader.build_request().unwrap();
    assert_eq!(&output.blocks[0].fields[0].values[..], &[2.0]);

    // an iteration beyond all stored entries clamps to the last
    reader.set_request(0.0, 99);
    let output = reader.build_request().unwrap();
    assert_eq!(&output.blocks[0].fields[0].values[..], &[3.0]);
}

#[test]
fn field_profile_forces_extra_support() {
    let mut src = scrub_source();
    src.add_profile("edge_tip", &[5]);
    let f = src.add_field("flux", FieldKind::Cell, 1);
    let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
    src.add_field_values(f, s, ElementKind::Seg2, Some("edge_tip"), 1, None, &[7.5]);

    let mut reader = MeshReader::open(Box::new(src)).unwrap();
    reader.set_request(0.0, 1);
    let output = reader.build_request().unwrap();
    // each family resolves against the field's storage profile instead of
    // the default support; family 2 keeps the profiled cell, family 1
    // classifies empty on it and is skipped by the mapper
    let profiled: Vec<_> = output
        .blocks
        .iter()
        .filter(|b| b.path.last().map(String::as_str) == Some("edge_tip"))
        .collect();
    assert_eq!(profiled.len(), 2);
    let edge_block = profiled
        .iter()
        .find(|b| b.path[2] == "edge")
        .expect("edge family block");
    let flux: Vec<_> = edge_block
        .fields
        .iter()
        .filter(|f| f.field == "flux")
        .collect();
    assert_eq!(flux.len(), 1);
    assert_eq!(&flux[0].values[..], &[7.5]);
}

#[test]
fn explicit_support_resolution_is_idempotent() {
    let mut reader = MeshReader::open(Box::new(scrub_source())).unwrap();
    let a = reader.resolve_support(0, 0, 0, FamilyId(1), None).unwrap();
    let b = reader.resolve_support(0, 0, 0, FamilyId(1), None).unwrap();
    assert_eq!(a, b);
    assert_eq!(reader.catalog().len(), 1);
    // a triple that does not exist in the model is refused
    assert!(reader.resolve_support(0, 0, 9, FamilyId(1), None).is_err());
    assert!(reader
        .resolve_support(0, 0, 0, FamilyId(1), Some("no_such_profile"))
        .is_err());
}

#[test]
fn mismatched_family_ids_disable_only_that_group() {
    let mut src = MemorySource::new();
    src.add_mesh("m", 2, &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0]);
    let snap = src.add_snapshot("m", ComputeStep::new(0.0, 1));
    // healthy group
    src.add_group("m", snap, ElementKind::Seg2, Domain::Cell, &[0, 1], Some(&[1]));
    // declares 2 cells but ships 3 family ids
    src.add_group_raw(
        "m",
        snap,
        ElementKind::Tri3,
        Domain::Cell,
        2,
        &[0, 1, 2, 0, 1, 2],
        Some(&[1, 1, 1]),
    );
    let mut reader = MeshReader::open(Box::new(src)).unwrap();
    reader.set_request(0.0, 1);
    let output = reader.build_request().unwrap();
    // the broken group is dropped with a warning, the healthy one proceeds
    assert_eq!(output.blocks.len(), 1);
    assert_eq!(output.blocks[0].path[3], "Seg2");
}

#[test]
fn metadata_reload_clears_everything() {
    let mut reader = MeshReader::open(Box::new(scrub_source())).unwrap();
    reader.set_cache_strategy(CacheStrategy::CacheGeometryAndFields);
    reader.set_request(0.0, 1);
    let output = reader.build_request().unwrap();
    let id = output.blocks[0].support;
    assert!(reader.cached_geometry(id).is_some());
    reader.reload_metadata().unwrap();
    assert!(reader.cached_geometry(id).is_none());
    assert!(reader.catalog().is_empty());
}
