//! In-memory [`SupportSource`]: fixture builder for tests and demos.
//!
//! Holds metadata specs and payload buffers side by side; `load_model`
//! assembles a fresh [`MeshModel`] from the specs, and the read methods
//! serve the payloads back as a real decoder would.

use std::cell::Cell;
use std::collections::BTreeMap;

use crate::data::field::{Field, FieldKind, FieldOnSupport, FieldStep};
use crate::data::localization::Localization;
use crate::io::{StorageMode, SupportSource};
use crate::mesh_error::MeshSupportError;
use crate::topology::element::{Domain, ElementGroup, ElementKind};
use crate::topology::family::{Family, Group};
use crate::topology::ids::FamilyId;
use crate::topology::mesh::{Mesh, MeshModel, Snapshot};
use crate::topology::step::ComputeStep;

#[derive(Debug)]
struct GroupSpec {
    kind: ElementKind,
    domain: Domain,
    count: usize,
    snapshot: usize,
    connectivity: Vec<usize>,
    family_ids: Option<Vec<FamilyId>>,
}

#[derive(Debug)]
struct SnapshotSpec {
    step: ComputeStep,
    coordinates: Option<Vec<f64>>,
}

#[derive(Debug)]
struct MeshSpec {
    name: String,
    dim: usize,
    coordinates: Vec<f64>,
    snapshots: Vec<SnapshotSpec>,
    groups: Vec<GroupSpec>,
    families: Vec<Family>,
    selection_groups: Vec<Group>,
}

#[derive(Debug)]
struct StorageSpec {
    step_index: usize,
    kind: ElementKind,
    profile: Option<String>,
    integration_points: usize,
    localization: Option<String>,
    values: Vec<f64>,
}

#[derive(Debug)]
struct FieldSpec {
    name: String,
    kind: FieldKind,
    components: usize,
    steps: Vec<ComputeStep>,
    storages: Vec<StorageSpec>,
}

/// In-memory source; build it up, then hand it to a reader.
#[derive(Debug, Default)]
pub struct MemorySource {
    meshes: Vec<MeshSpec>,
    /// Ordered so profile handles come out deterministic.
    profiles: BTreeMap<String, Vec<usize>>,
    fields: Vec<FieldSpec>,
    localizations: Vec<Localization>,
    fail_field_reads: Cell<bool>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mesh with static coordinates shared by its snapshots.
    pub fn add_mesh(&mut self, name: &str, dim: usize, coordinates: &[f64]) {
        self.meshes.push(MeshSpec {
            name: name.to_string(),
            dim,
            coordinates: coordinates.to_vec(),
            snapshots: Vec::new(),
            groups: Vec::new(),
            families: Vec::new(),
            selection_groups: Vec::new(),
        });
    }

    fn mesh_spec_mut(&mut self, name: &str) -> &mut MeshSpec {
        self.meshes
            .iter_mut()
            .find(|m| m.name == name)
            .unwrap_or_else(|| panic!("unknown fixture mesh `{name}`"))
    }

    /// Appends a snapshot; returns its token.
    pub fn add_snapshot(&mut self, mesh: &str, step: ComputeStep) -> usize {
        let spec = self.mesh_spec_mut(mesh);
        spec.snapshots.push(SnapshotSpec {
            step,
            coordinates: None,
        });
        spec.snapshots.len() - 1
    }

    /// Appends a snapshot with its own coordinates (moving geometry).
    pub fn add_snapshot_with_coords(
        &mut self,
        mesh: &str,
        step: ComputeStep,
        coordinates: &[f64],
    ) -> usize {
        let spec = self.mesh_spec_mut(mesh);
        spec.snapshots.push(SnapshotSpec {
            step,
            coordinates: Some(coordinates.to_vec()),
        });
        spec.snapshots.len() - 1
    }

    /// Appends a cell-domain group, inferring the element count from the
    /// connectivity length; returns its token.
    pub fn add_group(
        &mut self,
        mesh: &str,
        snapshot: usize,
        kind: ElementKind,
        domain: Domain,
        connectivity: &[usize],
        family_ids: Option<&[i64]>,
    ) -> usize {
        let count = connectivity.len() / kind.node_count();
        self.add_group_raw(mesh, snapshot, kind, domain, count, connectivity, family_ids)
    }

    /// Appends a group with an explicit declared count (may disagree with
    /// the payload, for mismatch tests); returns its token.
    pub fn add_group_raw(
        &mut self,
        mesh: &str,
        snapshot: usize,
        kind: ElementKind,
        domain: Domain,
        count: usize,
        connectivity: &[usize],
        family_ids: Option<&[i64]>,
    ) -> usize {
        let spec = self.mesh_spec_mut(mesh);
        spec.groups.push(GroupSpec {
            kind,
            domain,
            count,
            snapshot,
            connectivity: connectivity.to_vec(),
            family_ids: family_ids.map(|ids| ids.iter().map(|&i| FamilyId(i)).collect()),
        });
        spec.groups.len() - 1
    }

    /// Appends the node block of a snapshot (one element per point);
    /// returns its token.
    pub fn add_node_group(
        &mut self,
        mesh: &str,
        snapshot: usize,
        family_ids: Option<&[i64]>,
    ) -> usize {
        let spec = self.mesh_spec_mut(mesh);
        let points = spec.coordinates.len() / spec.dim;
        let identity: Vec<usize> = (0..points).collect();
        spec.groups.push(GroupSpec {
            kind: ElementKind::Node,
            domain: Domain::Node,
            count: points,
            snapshot,
            connectivity: identity,
            family_ids: family_ids.map(|ids| ids.iter().map(|&i| FamilyId(i)).collect()),
        });
        spec.groups.len() - 1
    }

    /// Declares family metadata (name, domain, group membership).
    pub fn add_family(
        &mut self,
        mesh: &str,
        id: i64,
        name: &str,
        domain: Domain,
        groups: &[&str],
    ) {
        let spec = self.mesh_spec_mut(mesh);
        spec.families
            .push(Family::new(FamilyId(id), name, domain).with_groups(groups));
    }

    /// Declares a user-facing selection group.
    pub fn add_selection_group(&mut self, mesh: &str, name: &str, families: &[&str]) {
        let spec = self.mesh_spec_mut(mesh);
        spec.selection_groups.push(Group::new(name, families));
    }

    /// Registers a named profile payload.
    pub fn add_profile(&mut self, name: &str, indices: &[usize]) {
        self.profiles.insert(name.to_string(), indices.to_vec());
    }

    pub fn add_localization(&mut self, name: &str, kind: ElementKind, points: usize) {
        self.localizations.push(Localization::new(name, kind, points));
    }

    /// Registers a field; returns its token.
    pub fn add_field(&mut self, name: &str, kind: FieldKind, components: usize) -> usize {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            components,
            steps: Vec::new(),
            storages: Vec::new(),
        });
        self.fields.len() - 1
    }

    /// Appends a step to a field; returns the step index.
    pub fn add_field_step(&mut self, field: usize, step: ComputeStep) -> usize {
        let spec = &mut self.fields[field];
        spec.steps.push(step);
        spec.steps.len() - 1
    }

    /// Attaches a value buffer to a field step for one element kind and
    /// storage profile. The entity count is inferred from the buffer.
    pub fn add_field_values(
        &mut self,
        field: usize,
        step_index: usize,
        kind: ElementKind,
        profile: Option<&str>,
        integration_points: usize,
        localization: Option<&str>,
        values: &[f64],
    ) {
        let spec = &mut self.fields[field];
        spec.storages.push(StorageSpec {
            step_index,
            kind,
            profile: profile.map(str::to_string),
            integration_points: integration_points.max(1),
            localization: localization.map(str::to_string),
            values: values.to_vec(),
        });
    }

    /// Makes every subsequent field-value read fail, simulating an I/O
    /// error from the decoder.
    pub fn set_fail_field_reads(&self, fail: bool) {
        self.fail_field_reads.set(fail);
    }

    /// Builds a fresh metadata model from the registered specs.
    pub fn model(&self) -> Result<MeshModel, MeshSupportError> {
        let mut model = MeshModel::new();
        for name in self.profiles.keys() {
            model.profiles_mut().intern(name);
        }
        for loc in &self.localizations {
            model.add_localization(loc.clone());
        }
        for mesh_spec in &self.meshes {
            let mut mesh = Mesh::new(&mesh_spec.name);
            for family in &mesh_spec.families {
                mesh.add_family(family.clone());
            }
            for group in &mesh_spec.selection_groups {
                mesh.add_group(group.clone());
            }
            let point_count = mesh_spec.coordinates.len() / mesh_spec.dim.max(1);
            for (token, snap_spec) in mesh_spec.snapshots.iter().enumerate() {
                let points = snap_spec
                    .coordinates
                    .as_ref()
                    .map_or(point_count, |c| c.len() / mesh_spec.dim.max(1));
                let mut snapshot = Snapshot::new(snap_spec.step, token, points, mesh_spec.dim);
                for (gtoken, group) in mesh_spec.groups.iter().enumerate() {
                    if group.snapshot == token {
                        snapshot.push_group(ElementGroup::new(
                            group.kind,
                            group.domain,
                            group.count,
                            gtoken,
                        ));
                    }
                }
                mesh.add_snapshot(snapshot);
            }
            model.add_mesh(mesh);
        }
        for field_spec in &self.fields {
            let mut field = Field::new(&field_spec.name, field_spec.kind, field_spec.components);
            for &step in &field_spec.steps {
                field.add_step(FieldStep::new(step));
            }
            for storage in &field_spec.storages {
                let profile_id = storage
                    .profile
                    .as_deref()
                    .map(|name| model.profiles_mut().intern(name));
                let entity_count = storage.values.len()
                    / (storage.integration_points * field_spec.components).max(1);
                let fos = FieldOnSupport::new(
                    storage.kind,
                    profile_id,
                    storage.profile.clone(),
                    entity_count,
                    storage.integration_points,
                    storage.localization.clone(),
                );
                // steps were appended in spec order, so the index matches
                field_step_mut(&mut field, storage.step_index)?.add_storage(fos);
            }
            model.add_field(field);
        }
        Ok(model)
    }

    fn group_spec(&self, mesh: &str, group: usize) -> Result<&GroupSpec, MeshSupportError> {
        self.meshes
            .iter()
            .find(|m| m.name == mesh)
            .and_then(|m| m.groups.get(group))
            .ok_or(MeshSupportError::UnknownEntry {
                what: "element group",
                index: group,
            })
    }
}

fn field_step_mut(field: &mut Field, index: usize) -> Result<&mut FieldStep, MeshSupportError> {
    field
        .field_steps_mut()
        .get_mut(index)
        .ok_or(MeshSupportError::UnknownEntry {
            what: "field step",
            index,
        })
}

impl SupportSource for MemorySource {
    fn load_model(&self) -> Result<MeshModel, MeshSupportError> {
        self.model()
    }

    fn read_family_ids(
        &self,
        mesh: &str,
        group: usize,
    ) -> Result<Option<Vec<FamilyId>>, MeshSupportError> {
        Ok(self.group_spec(mesh, group)?.family_ids.clone())
    }

    fn read_connectivity(&self, mesh: &str, group: usize) -> Result<Vec<usize>, MeshSupportError> {
        Ok(self.group_spec(mesh, group)?.connectivity.clone())
    }

    fn read_coordinates(&self, mesh: &str, snapshot: usize) -> Result<Vec<f64>, MeshSupportError> {
        let spec = self
            .meshes
            .iter()
            .find(|m| m.name == mesh)
            .ok_or(MeshSupportError::UnknownEntry {
                what: "mesh",
                index: 0,
            })?;
        let snap = spec
            .snapshots
            .get(snapshot)
            .ok_or(MeshSupportError::UnknownEntry {
                what: "snapshot",
                index: snapshot,
            })?;
        Ok(snap
            .coordinates
            .clone()
            .unwrap_or_else(|| spec.coordinates.clone()))
    }

    fn read_profile_indices(&self, name: &str) -> Result<Vec<usize>, MeshSupportError> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| MeshSupportError::DecodeFailed {
                what: "profile indices",
                reason: format!("no profile named `{name}`"),
            })
    }

    fn read_field_values(
        &self,
        field: &str,
        step: ComputeStep,
        kind: ElementKind,
        profile: Option<&str>,
        mode: StorageMode,
    ) -> Result<Vec<f64>, MeshSupportError> {
        if self.fail_field_reads.get() {
            return Err(MeshSupportError::DecodeFailed {
                what: "field values",
                reason: "injected read failure".to_string(),
            });
        }
        if mode == StorageMode::Global {
            return Err(MeshSupportError::DecodeFailed {
                what: "field values",
                reason: "MemorySource stores compact buffers only".to_string(),
            });
        }
        let spec = self
            .fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| MeshSupportError::DecodeFailed {
                what: "field values",
                reason: format!("no field named `{field}`"),
            })?;
        let storage = spec
            .storages
            .iter()
            .find(|s| {
                spec.steps.get(s.step_index) == Some(&step)
                    && s.kind == kind
                    && s.profile.as_deref() == profile
            })
            .ok_or_else(|| MeshSupportError::NoFieldStorage {
                field: field.to_string(),
            })?;
        Ok(storage.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_round_trip() {
        let mut src = MemorySource::new();
        src.add_mesh("m", 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let snap = src.add_snapshot("m", ComputeStep::new(0.0, 1));
        src.add_group(
            "m",
            snap,
            ElementKind::Tri3,
            Domain::Cell,
            &[0, 1, 2],
            Some(&[1]),
        );
        src.add_profile("p", &[1]);
        let f = src.add_field("temp", FieldKind::Cell, 1);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        src.add_field_values(f, s, ElementKind::Tri3, Some("p"), 1, None, &[273.15]);

        let model = src.model().unwrap();
        assert_eq!(model.meshes().len(), 1);
        assert_eq!(model.fields().len(), 1);
        let mesh = model.mesh(0).unwrap();
        assert_eq!(mesh.snapshot(0).unwrap().point_count(), 3);
        let field = model.field(0).unwrap();
        let storage = field.step(0).unwrap().storage_for(ElementKind::Tri3).unwrap();
        assert_eq!(storage.entity_count(), 1);
        assert!(storage.profile().is_some());
    }

    #[test]
    fn injected_failure_surfaces_as_decode_error() {
        let mut src = MemorySource::new();
        let f = src.add_field("temp", FieldKind::Cell, 1);
        let s = src.add_field_step(f, ComputeStep::new(0.0, 1));
        src.add_field_values(f, s, ElementKind::Tri3, None, 1, None, &[1.0]);
        src.set_fail_field_reads(true);
        let err = src
            .read_field_values(
                "temp",
                ComputeStep::new(0.0, 1),
                ElementKind::Tri3,
                None,
                StorageMode::Compact,
            )
            .unwrap_err();
        assert!(matches!(err, MeshSupportError::DecodeFailed { .. }));
    }
}
