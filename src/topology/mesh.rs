//! Meshes, snapshots, and the metadata model root.
//!
//! A `Mesh` owns an ordered list of `Snapshot`s keyed by compute step; a
//! `MeshModel` is the root of one metadata generation (meshes, fields,
//! profiles, localizations), immutable once loaded. Heavy payloads
//! (coordinates) stay behind `OnceCell` and decode on first touch.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::data::field::Field;
use crate::data::localization::Localization;
use crate::io::SupportSource;
use crate::mesh_error::MeshSupportError;
use crate::topology::element::ElementGroup;
use crate::topology::family::{Family, Group};
use crate::topology::ids::FamilyId;
use crate::topology::profile::ProfileStore;
use crate::topology::step::{ComputeStep, StepIndex, StepMode};

/// One version of a mesh geometry.
#[derive(Debug)]
pub struct Snapshot {
    step: ComputeStep,
    token: usize,
    point_count: usize,
    dim: usize,
    coordinates: OnceCell<Arc<Vec<f64>>>,
    groups: Vec<ElementGroup>,
}

impl Snapshot {
    pub fn new(step: ComputeStep, token: usize, point_count: usize, dim: usize) -> Self {
        Self {
            step,
            token,
            point_count,
            dim,
            coordinates: OnceCell::new(),
            groups: Vec::new(),
        }
    }

    pub fn step(&self) -> ComputeStep {
        self.step
    }

    pub fn token(&self) -> usize {
        self.token
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Spatial dimension of the coordinate tuples.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn push_group(&mut self, group: ElementGroup) {
        self.groups.push(group);
    }

    pub fn groups(&self) -> &[ElementGroup] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Result<&ElementGroup, MeshSupportError> {
        self.groups.get(index).ok_or(MeshSupportError::UnknownEntry {
            what: "element group",
            index,
        })
    }

    /// Interleaved point coordinates, `dim` components per point, decoded
    /// on first access and shared from then on.
    pub fn coordinates(
        &self,
        source: &dyn SupportSource,
        mesh: &str,
    ) -> Result<&Arc<Vec<f64>>, MeshSupportError> {
        self.coordinates.get_or_try_init(|| {
            let coords = source.read_coordinates(mesh, self.token)?;
            let expected = self.point_count * self.dim;
            if coords.len() != expected {
                return Err(MeshSupportError::SizeMismatch {
                    what: "coordinates",
                    expected,
                    found: coords.len(),
                });
            }
            Ok(Arc::new(coords))
        })
    }
}

/// Named geometric object owning its snapshots and tag metadata.
#[derive(Debug)]
pub struct Mesh {
    name: String,
    families: Vec<Family>,
    groups: Vec<Group>,
    snapshots: Vec<Snapshot>,
    steps: StepIndex<usize>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            families: Vec::new(),
            groups: Vec::new(),
            snapshots: Vec::new(),
            steps: StepIndex::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_family(&mut self, family: Family) {
        self.families.push(family);
    }

    pub fn add_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    /// Appends a snapshot and indexes it under its compute step.
    pub fn add_snapshot(&mut self, snapshot: Snapshot) -> usize {
        let index = self.snapshots.len();
        self.steps.insert(snapshot.step(), index);
        self.snapshots.push(snapshot);
        index
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn snapshot(&self, index: usize) -> Result<&Snapshot, MeshSupportError> {
        self.snapshots
            .get(index)
            .ok_or(MeshSupportError::UnknownEntry {
                what: "snapshot",
                index,
            })
    }

    /// Snapshot active for `requested` under `mode`; `None` when the mesh
    /// stores no geometry at all.
    pub fn find_snapshot(&self, mode: StepMode, requested: ComputeStep) -> Option<usize> {
        self.steps.find_nearest(mode, requested).copied()
    }

    pub fn steps(&self) -> &StepIndex<usize> {
        &self.steps
    }

    /// Family metadata by tag value, if declared.
    pub fn family_by_id(&self, id: FamilyId) -> Option<&Family> {
        self.families.iter().find(|f| f.id == id)
    }

    pub fn family_by_name(&self, name: &str) -> Option<&Family> {
        self.families.iter().find(|f| f.name == name)
    }
}

/// Root of one metadata generation.
///
/// Rebuilt wholesale when the underlying file is reselected or relinked;
/// every derived structure (catalog, caches) is keyed to the generation
/// and dies with it.
#[derive(Debug, Default)]
pub struct MeshModel {
    meshes: Vec<Mesh>,
    fields: Vec<Field>,
    profiles: ProfileStore,
    localizations: Vec<Localization>,
}

impl MeshModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_field(&mut self, field: Field) -> usize {
        self.fields.push(field);
        self.fields.len() - 1
    }

    pub fn add_localization(&mut self, localization: Localization) {
        self.localizations.push(localization);
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> Result<&Mesh, MeshSupportError> {
        self.meshes.get(index).ok_or(MeshSupportError::UnknownEntry {
            what: "mesh",
            index,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Result<&Field, MeshSupportError> {
        self.fields.get(index).ok_or(MeshSupportError::UnknownEntry {
            what: "field",
            index,
        })
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn profiles_mut(&mut self) -> &mut ProfileStore {
        &mut self.profiles
    }

    pub fn localization(&self, name: &str) -> Option<&Localization> {
        self.localizations.iter().find(|l| l.name() == name)
    }

    /// Union of all snapshot and field steps over the model, ascending.
    ///
    /// An empty model advertises the single undefined step so callers
    /// always have something to request.
    pub fn available_steps(&self) -> Vec<ComputeStep> {
        let mut steps: Vec<ComputeStep> = Vec::new();
        for mesh in &self.meshes {
            steps.extend(mesh.steps().iter().map(|(s, _)| s));
        }
        for field in &self.fields {
            steps.extend(field.steps().iter().map(|(s, _)| s));
        }
        steps.sort();
        steps.dedup();
        if steps.is_empty() {
            steps.push(ComputeStep::undefined());
        }
        steps
    }
}
