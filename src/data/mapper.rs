//! Field mapping: shallow vs. gathered attachment of field buffers onto
//! supports.
//!
//! Mapping decides, per field domain and support domain, whether the
//! decoded buffer can be handed over by reference or must be gathered
//! through the support's kept-element / kept-point sequence. Gathers walk
//! the kept sequence in ascending order and binary-search the field's
//! storage profile for each kept index; a kept index with no stored value
//! is a recoverable gap, never an error.

use std::sync::Arc;

use crate::algs::partition::WorkerLayout;
use crate::cache::RequestCaches;
use crate::data::field::{Field, FieldKind, FieldOnSupport, FieldStep};
use crate::data::localization::{Localization, LocalizationKey};
use crate::io::SupportSource;
use crate::mesh_error::MeshSupportError;
use crate::support::catalog::SupportCatalog;
use crate::support::remap;
use crate::topology::element::Domain;
use crate::topology::ids::SupportId;
use crate::topology::mesh::MeshModel;

/// One field array attached to one support.
#[derive(Debug, Clone)]
pub struct MappedField {
    pub field: String,
    pub components: usize,
    /// Flat tuples, `components` per entry; shared by reference when the
    /// mapping was shallow.
    pub values: Arc<Vec<f64>>,
    /// Optional 3-component promotion of 2-component data.
    pub vectors: Option<Arc<Vec<f64>>>,
    /// Kept indices with no stored value (holes the consumer must
    /// tolerate as "no value").
    pub gaps: usize,
    /// Per-surviving-cell offsets into `values`, for quadrature layouts.
    pub quadrature_offsets: Option<Arc<Vec<usize>>>,
    /// True when `values` is the decoded buffer itself.
    pub shallow: bool,
}

#[cfg(test)]
impl MappedField {
    pub(crate) fn test_stub(name: &str) -> Self {
        Self {
            field: name.to_string(),
            components: 1,
            values: Arc::new(Vec::new()),
            vectors: None,
            gaps: 0,
            quadrature_offsets: None,
            shallow: false,
        }
    }
}

/// Position lookup into a field's storage subset.
enum StorageLookup<'a> {
    /// Unprofiled storage: position == global index.
    Identity { count: usize },
    /// Profiled storage: binary search of the 1-based sorted index list.
    Profile(&'a [usize]),
}

impl StorageLookup<'_> {
    fn new<'a>(
        model: &'a MeshModel,
        source: &dyn SupportSource,
        fos: &FieldOnSupport,
    ) -> Result<StorageLookup<'a>, MeshSupportError> {
        Ok(match fos.profile() {
            None => StorageLookup::Identity {
                count: fos.entity_count(),
            },
            Some(id) => StorageLookup::Profile(model.profiles().get(id)?.indices(source)?),
        })
    }

    /// Storage row of global (0-based) index `global`, if stored.
    fn position_of(&self, global: usize) -> Option<usize> {
        match self {
            StorageLookup::Identity { count } => (global < *count).then_some(global),
            StorageLookup::Profile(indices) => indices.binary_search(&(global + 1)).ok(),
        }
    }
}

/// Whether `fos` can be attached to the support at all.
///
/// Cell-domain data never lands on node supports, and must match the
/// support's element kind. An invalid support maps nothing (a worker
/// whose block misses the affected elements simply reports no data). A
/// support classified `Empty` has nothing to attach to, and node data on
/// a cell support must cover the support's used points.
pub fn can_map(
    model: &MeshModel,
    source: &dyn SupportSource,
    catalog: &mut SupportCatalog,
    layout: WorkerLayout,
    id: SupportId,
    field: &Field,
    fos: &FieldOnSupport,
) -> Result<bool, MeshSupportError> {
    let support = catalog.get(id)?;
    if support.is_invalid() {
        return Ok(false);
    }
    let key = *support.key();
    let mesh = model.mesh(key.mesh)?;
    let group = mesh.snapshot(key.snapshot)?.group(key.group)?;

    let field_domain = field.kind().domain();
    if group.domain() == Domain::Node && field_domain == Domain::Cell {
        return Ok(false);
    }
    if field_domain == Domain::Cell && fos.element_kind() != group.kind() {
        return Ok(false);
    }

    use crate::support::support::Intersection;
    if catalog.classify_intersection(model, source, layout, id)? == Intersection::Empty {
        return Ok(false);
    }

    if group.domain() == Domain::Cell && field_domain == Domain::Node {
        use crate::support::support::PointProfileMatch;
        let matched = catalog.point_profile_match(model, source, layout, id, fos.profile())?;
        if matched == PointProfileMatch::Insufficient {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether the decoded buffer may be attached by reference.
///
/// Shallow copies require that the storage subset and the support line up
/// exactly, so that tuple `i` of the buffer is tuple `i` of the block:
/// - cell data on a cell support: same profile and the family alone on
///   its group;
/// - node data on a node support: same profile and at most one
///   node-domain support in the whole mesh;
/// - node data on a cell support: the storage profile is exactly the
///   used-point set.
///
/// Multi-worker layouts always gather: blocks only ever cover part of
/// the buffer.
pub fn can_shallow_copy(
    model: &MeshModel,
    source: &dyn SupportSource,
    catalog: &mut SupportCatalog,
    layout: WorkerLayout,
    id: SupportId,
    field: &Field,
    fos: &FieldOnSupport,
) -> Result<bool, MeshSupportError> {
    if !layout.is_serial() {
        return Ok(false);
    }
    let support = catalog.get(id)?;
    let key = *support.key();
    let mesh = model.mesh(key.mesh)?;
    let group = mesh.snapshot(key.snapshot)?.group(key.group)?;

    Ok(match (field.kind().domain(), group.domain()) {
        (Domain::Cell, Domain::Cell) => {
            fos.profile() == key.profile && catalog.family_is_sole(model, source, &key)?
        }
        (Domain::Node, Domain::Node) => {
            fos.profile() == key.profile
                && catalog.node_support_count(model, source, key.mesh, key.snapshot)? <= 1
        }
        (Domain::Node, Domain::Cell) => {
            use crate::support::support::PointProfileMatch;
            catalog.point_profile_match(model, source, layout, id, fos.profile())?
                == PointProfileMatch::Equal
        }
        (Domain::Cell, Domain::Node) => false,
    })
}

/// Maps one field storage onto one support.
///
/// Callers should gate on [`can_map`]; mapping an unmappable combination
/// yields an all-gaps array rather than an error.
pub fn map_field(
    model: &MeshModel,
    source: &dyn SupportSource,
    catalog: &mut SupportCatalog,
    caches: &mut RequestCaches,
    layout: WorkerLayout,
    id: SupportId,
    field: &Field,
    step: &FieldStep,
    fos: &FieldOnSupport,
    generate_vectors: bool,
) -> Result<MappedField, MeshSupportError> {
    let components = field.components();
    let values = Arc::clone(fos.values(source, field.name(), step.step(), components)?);

    let mut mapped = if can_shallow_copy(model, source, catalog, layout, id, field, fos)? {
        let offsets = quadrature_key(model, field, fos).map(|key| {
            let nquad = fos.integration_points();
            let cells = fos.entity_count();
            caches.quadrature_offsets(id, key, || {
                Arc::new((0..cells).map(|i| i * nquad).collect())
            })
        });
        MappedField {
            field: field.name().to_string(),
            components,
            values,
            vectors: None,
            gaps: 0,
            quadrature_offsets: offsets,
            shallow: true,
        }
    } else {
        match field.kind().domain() {
            Domain::Cell => gather_cell_data(
                model, source, catalog, caches, layout, id, field, fos, &values,
            )?,
            Domain::Node => gather_node_data(
                model, source, catalog, layout, id, field, fos, &values,
            )?,
        }
    };

    if generate_vectors {
        mapped.vectors = promote_vectors(&mapped);
    }
    Ok(mapped)
}

/// Cell-domain gather: one tuple block per kept cell, appended in kept
/// order, with a fresh offset array for quadrature layouts.
fn gather_cell_data(
    model: &MeshModel,
    source: &dyn SupportSource,
    catalog: &mut SupportCatalog,
    caches: &mut RequestCaches,
    layout: WorkerLayout,
    id: SupportId,
    field: &Field,
    fos: &FieldOnSupport,
    values: &Arc<Vec<f64>>,
) -> Result<MappedField, MeshSupportError> {
    let key = *catalog.get(id)?.key();
    let components = field.components();
    let nquad = fos.integration_points();
    let tuple = nquad * components;
    let storage = StorageLookup::new(model, source, fos)?;

    let mut out = Vec::new();
    let mut survivors = 0usize;
    let mut gaps = 0usize;
    remap::for_each_kept_cell(model, source, &key, layout, |element| {
        match storage.position_of(element) {
            None => gaps += 1,
            Some(position) => {
                out.extend_from_slice(&values[position * tuple..(position + 1) * tuple]);
                survivors += 1;
            }
        }
        Ok(())
    })?;
    if gaps > 0 {
        log::debug!(
            "field `{}` on support {id}: {gaps} kept cells without stored values",
            field.name()
        );
    }

    let offsets = quadrature_key(model, field, fos).map(|lkey| {
        caches.quadrature_offsets(id, lkey, || {
            Arc::new((0..survivors).map(|i| i * nquad).collect())
        })
    });

    Ok(MappedField {
        field: field.name().to_string(),
        components,
        values: Arc::new(out),
        vectors: None,
        gaps,
        quadrature_offsets: offsets,
        shallow: false,
    })
}

/// Node-domain gather: tuples land at the remapped local position of each
/// kept point; missing storage entries leave default-filled holes.
fn gather_node_data(
    model: &MeshModel,
    source: &dyn SupportSource,
    catalog: &mut SupportCatalog,
    layout: WorkerLayout,
    id: SupportId,
    field: &Field,
    fos: &FieldOnSupport,
    values: &Arc<Vec<f64>>,
) -> Result<MappedField, MeshSupportError> {
    let components = field.components();
    let used = catalog.used_points(model, source, layout, id)?;
    let storage = StorageLookup::new(model, source, fos)?;

    let mut out = vec![0.0; used.used_count() * components];
    let mut gaps = 0usize;
    for global in used.globals() {
        match storage.position_of(global) {
            None => gaps += 1,
            Some(position) => {
                // local_index is total over kept globals by construction
                let local = used.local_index(global).unwrap_or(0);
                out[local * components..(local + 1) * components]
                    .copy_from_slice(&values[position * components..(position + 1) * components]);
            }
        }
    }
    if gaps > 0 {
        log::debug!(
            "field `{}` on support {id}: {gaps} kept points without stored values",
            field.name()
        );
    }

    Ok(MappedField {
        field: field.name().to_string(),
        components,
        values: Arc::new(out),
        vectors: None,
        gaps,
        quadrature_offsets: None,
        shallow: false,
    })
}

/// Offset-array cache key for quadrature-layout fields; `None` for plain
/// node/cell data.
fn quadrature_key(
    model: &MeshModel,
    field: &Field,
    fos: &FieldOnSupport,
) -> Option<LocalizationKey> {
    match field.kind() {
        FieldKind::Quadrature => Some(match fos.localization().and_then(|n| model.localization(n)) {
            Some(loc) => loc.key(),
            None => LocalizationKey {
                name: fos.localization().unwrap_or("quadrature").to_string(),
                points: fos.integration_points(),
            },
        }),
        FieldKind::ElementNode => Some(Localization::elno(fos.element_kind()).key()),
        FieldKind::Node | FieldKind::Cell => None,
    }
}

/// Widens 2-component tuples to 3 (zero Z) and truncates wider-than-3
/// tuples, for consumers that want displayable vectors.
fn promote_vectors(mapped: &MappedField) -> Option<Arc<Vec<f64>>> {
    let ncomp = mapped.components;
    if ncomp <= 1 || ncomp == 3 {
        return None;
    }
    let tuples = mapped.values.len() / ncomp;
    let mut vectors = Vec::with_capacity(tuples * 3);
    for t in 0..tuples {
        let tuple = &mapped.values[t * ncomp..(t + 1) * ncomp];
        for c in 0..3 {
            vectors.push(tuple.get(c).copied().unwrap_or(0.0));
        }
    }
    Some(Arc::new(vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::MemorySource;
    use crate::support::support::SupportKey;
    use crate::topology::element::ElementKind;
    use crate::topology::ids::FamilyId;
    use crate::topology::step::ComputeStep;

    // 6 points, 5 seg2 cells; family 1 on cells 0..3, family 2 on 3..5
    fn strip() -> (MemorySource, MeshModel) {
        let mut src = MemorySource::new();
        src.add_mesh(
            "m",
            2,
            &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0, 4.0, 0.0, 5.0, 0.0],
        );
        let snap = src.add_snapshot("m", ComputeStep::new(0.0, 1));
        src.add_group(
            "m",
            snap,
            ElementKind::Seg2,
            Domain::Cell,
            &[0, 1, 1, 2, 2, 3, 3, 4, 4, 5],
            Some(&[1, 1, 1, 2, 2]),
        );
        let model = src.model().unwrap();
        (src, model)
    }

    fn key(family: i64) -> SupportKey {
        SupportKey {
            mesh: 0,
            snapshot: 0,
            group: 0,
            family: FamilyId(family),
            profile: None,
        }
    }

    #[test]
    fn cell_gather_filters_by_family() {
        let (mut src, _) = strip();
        let f = src.add_field("temp", FieldKind::Cell, 1);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        src.add_field_values(
            f,
            s,
            ElementKind::Seg2,
            None,
            1,
            None,
            &[10.0, 11.0, 12.0, 13.0, 14.0],
        );
        let model = src.model().unwrap();
        let field = model.field(0).unwrap();
        let step = field.step(0).unwrap();
        let fos = step.storage_for(ElementKind::Seg2).unwrap();

        let mut catalog = SupportCatalog::new();
        let mut caches = RequestCaches::new();
        let layout = WorkerLayout::serial();
        let id = catalog.resolve_support(key(2));
        assert!(can_map(&model, &src, &mut catalog, layout, id, field, fos).unwrap());
        // two families on the group: a gather is required
        assert!(!can_shallow_copy(&model, &src, &mut catalog, layout, id, field, fos).unwrap());
        let mapped = map_field(
            &model, &src, &mut catalog, &mut caches, layout, id, field, step, fos, false,
        )
        .unwrap();
        assert!(!mapped.shallow);
        assert_eq!(&mapped.values[..], &[13.0, 14.0]);
        assert_eq!(mapped.gaps, 0);
    }

    #[test]
    fn sole_family_cell_field_is_shallow() {
        let mut src = MemorySource::new();
        src.add_mesh("m", 2, &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0]);
        let snap = src.add_snapshot("m", ComputeStep::new(0.0, 1));
        src.add_group(
            "m",
            snap,
            ElementKind::Seg2,
            Domain::Cell,
            &[0, 1, 1, 2],
            Some(&[1, 1]),
        );
        let f = src.add_field("temp", FieldKind::Cell, 1);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        src.add_field_values(f, s, ElementKind::Seg2, None, 1, None, &[5.0, 6.0]);
        let model = src.model().unwrap();
        let field = model.field(0).unwrap();
        let step = field.step(0).unwrap();
        let fos = step.storage_for(ElementKind::Seg2).unwrap();

        let mut catalog = SupportCatalog::new();
        let mut caches = RequestCaches::new();
        let layout = WorkerLayout::serial();
        let id = catalog.resolve_support(key(1));
        assert!(can_shallow_copy(&model, &src, &mut catalog, layout, id, field, fos).unwrap());
        let mapped = map_field(
            &model, &src, &mut catalog, &mut caches, layout, id, field, step, fos, false,
        )
        .unwrap();
        assert!(mapped.shallow);
        // shared by reference, not copied
        let stored = fos
            .values(&src, "temp", ComputeStep::new(0.0, 1), 1)
            .unwrap();
        assert!(Arc::ptr_eq(&mapped.values, stored));
    }

    #[test]
    fn profiled_cell_field_gathers_with_binary_search() {
        let (mut src, _) = strip();
        // values stored only on cells {1,2,4} (1-based {2,3,5})
        src.add_profile("sparse_cells", &[2, 3, 5]);
        let f = src.add_field("temp", FieldKind::Cell, 1);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        src.add_field_values(
            f,
            s,
            ElementKind::Seg2,
            Some("sparse_cells"),
            1,
            None,
            &[21.0, 22.0, 24.0],
        );
        let model = src.model().unwrap();
        let field = model.field(0).unwrap();
        let step = field.step(0).unwrap();
        let fos = step.storage_for(ElementKind::Seg2).unwrap();

        let mut catalog = SupportCatalog::new();
        let mut caches = RequestCaches::new();
        let layout = WorkerLayout::serial();
        // family 1 keeps cells {0,1,2}; stored are {1,2}: one gap (cell 0)
        let id = catalog.resolve_support(key(1));
        let mapped = map_field(
            &model, &src, &mut catalog, &mut caches, layout, id, field, step, fos, false,
        )
        .unwrap();
        assert_eq!(&mapped.values[..], &[21.0, 22.0]);
        assert_eq!(mapped.gaps, 1);
    }

    #[test]
    fn node_field_on_cell_support_lands_at_local_positions() {
        let (mut src, _) = strip();
        let f = src.add_field("disp", FieldKind::Node, 1);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        src.add_field_values(
            f,
            s,
            ElementKind::Node,
            None,
            1,
            None,
            &[100.0, 101.0, 102.0, 103.0, 104.0, 105.0],
        );
        let model = src.model().unwrap();
        let field = model.field(0).unwrap();
        let step = field.step(0).unwrap();
        let fos = step.storage_for(ElementKind::Node).unwrap();

        let mut catalog = SupportCatalog::new();
        let mut caches = RequestCaches::new();
        let layout = WorkerLayout::serial();
        // family 2 uses global points {3,4,5} -> locals {0,1,2}
        let id = catalog.resolve_support(key(2));
        assert!(can_map(&model, &src, &mut catalog, layout, id, field, fos).unwrap());
        let mapped = map_field(
            &model, &src, &mut catalog, &mut caches, layout, id, field, step, fos, false,
        )
        .unwrap();
        assert!(!mapped.shallow);
        assert_eq!(&mapped.values[..], &[103.0, 104.0, 105.0]);
    }

    #[test]
    fn insufficient_point_profile_is_unmappable() {
        let (mut src, _) = strip();
        // storage only covers points {4,5} (1-based), support 2 needs {4,5,6}
        src.add_profile("short_pts", &[4, 5]);
        let f = src.add_field("disp", FieldKind::Node, 1);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        src.add_field_values(
            f,
            s,
            ElementKind::Node,
            Some("short_pts"),
            1,
            None,
            &[103.0, 104.0],
        );
        let model = src.model().unwrap();
        let field = model.field(0).unwrap();
        let fos = model
            .field(0)
            .unwrap()
            .step(0)
            .unwrap()
            .storage_for(ElementKind::Node)
            .unwrap();

        let mut catalog = SupportCatalog::new();
        let layout = WorkerLayout::serial();
        let id = catalog.resolve_support(key(2));
        assert!(!can_map(&model, &src, &mut catalog, layout, id, field, fos).unwrap());
    }

    #[test]
    fn cell_field_never_maps_on_node_support() {
        let mut src = MemorySource::new();
        src.add_mesh("m", 2, &[0.0, 0.0, 1.0, 0.0]);
        let snap = src.add_snapshot("m", ComputeStep::new(0.0, 1));
        src.add_node_group("m", snap, None);
        let f = src.add_field("temp", FieldKind::Cell, 1);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        src.add_field_values(f, s, ElementKind::Seg2, None, 1, None, &[1.0]);
        let model = src.model().unwrap();
        let field = model.field(0).unwrap();
        let fos = model
            .field(0)
            .unwrap()
            .step(0)
            .unwrap()
            .storage_for(ElementKind::Seg2)
            .unwrap();

        let mut catalog = SupportCatalog::new();
        let id = catalog.resolve_support(SupportKey {
            mesh: 0,
            snapshot: 0,
            group: 0,
            family: FamilyId::DEFAULT,
            profile: None,
        });
        assert!(
            !can_map(&model, &src, &mut catalog, WorkerLayout::serial(), id, field, fos).unwrap()
        );
    }

    #[test]
    fn quadrature_gather_expands_integration_points() {
        let (mut src, _) = strip();
        src.add_localization("gauss2", ElementKind::Seg2, 2);
        let f = src.add_field("stress", FieldKind::Quadrature, 1);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        // 5 cells × 2 integration points
        src.add_field_values(
            f,
            s,
            ElementKind::Seg2,
            None,
            2,
            Some("gauss2"),
            &[0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5],
        );
        let model = src.model().unwrap();
        let field = model.field(0).unwrap();
        let step = field.step(0).unwrap();
        let fos = step.storage_for(ElementKind::Seg2).unwrap();

        let mut catalog = SupportCatalog::new();
        let mut caches = RequestCaches::new();
        let layout = WorkerLayout::serial();
        let id = catalog.resolve_support(key(2));
        let mapped = map_field(
            &model, &src, &mut catalog, &mut caches, layout, id, field, step, fos, false,
        )
        .unwrap();
        // cells 3,4 survive with both their integration points
        assert_eq!(&mapped.values[..], &[3.0, 3.5, 4.0, 4.5]);
        let offsets = mapped.quadrature_offsets.unwrap();
        assert_eq!(&offsets[..], &[0, 2]);
    }

    #[test]
    fn two_quadrature_fields_share_one_offset_array() {
        let (mut src, _) = strip();
        src.add_localization("gauss2", ElementKind::Seg2, 2);
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        for name in ["stress", "strain"] {
            let f = src.add_field(name, FieldKind::Quadrature, 1);
            let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
            src.add_field_values(f, s, ElementKind::Seg2, None, 2, Some("gauss2"), &values);
        }
        let model = src.model().unwrap();
        let mut catalog = SupportCatalog::new();
        let mut caches = RequestCaches::new();
        let layout = WorkerLayout::serial();
        let id = catalog.resolve_support(key(2));

        let mut offset_arrays = Vec::new();
        for index in 0..2 {
            let field = model.field(index).unwrap();
            let step = field.step(0).unwrap();
            let fos = step.storage_for(ElementKind::Seg2).unwrap();
            let mapped = map_field(
                &model, &src, &mut catalog, &mut caches, layout, id, field, step, fos, false,
            )
            .unwrap();
            offset_arrays.push(mapped.quadrature_offsets.unwrap());
        }
        assert!(Arc::ptr_eq(&offset_arrays[0], &offset_arrays[1]));
    }

    #[test]
    fn vector_promotion_pads_z() {
        let mut src = MemorySource::new();
        src.add_mesh("m", 2, &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0]);
        let snap = src.add_snapshot("m", ComputeStep::new(0.0, 1));
        src.add_group(
            "m",
            snap,
            ElementKind::Seg2,
            Domain::Cell,
            &[0, 1, 1, 2],
            Some(&[1, 1]),
        );
        let f = src.add_field("velocity", FieldKind::Cell, 2);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        src.add_field_values(
            f,
            s,
            ElementKind::Seg2,
            None,
            1,
            None,
            &[1.0, 2.0, 3.0, 4.0],
        );
        let model = src.model().unwrap();
        let field = model.field(0).unwrap();
        let step = field.step(0).unwrap();
        let fos = step.storage_for(ElementKind::Seg2).unwrap();

        let mut catalog = SupportCatalog::new();
        let mut caches = RequestCaches::new();
        let id = catalog.resolve_support(key(1));
        let mapped = map_field(
            &model,
            &src,
            &mut catalog,
            &mut caches,
            WorkerLayout::serial(),
            id,
            field,
            step,
            fos,
            true,
        )
        .unwrap();
        let vectors = mapped.vectors.unwrap();
        assert_eq!(&vectors[..], &[1.0, 2.0, 0.0, 3.0, 4.0, 0.0]);
    }
}
