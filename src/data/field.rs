//! Fields and their per-step, per-kind, per-profile storage.
//!
//! A `Field` has values at snapshot-aligned compute steps; each `FieldStep`
//! stores its values per element kind and per profile (`FieldOnSupport`).
//! Value buffers decode lazily and are immutable once read.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::io::{StorageMode, SupportSource};
use crate::mesh_error::MeshSupportError;
use crate::topology::element::{Domain, ElementKind};
use crate::topology::ids::ProfileId;
use crate::topology::step::{ComputeStep, StepIndex};

/// Where a field's values live.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FieldKind {
    /// One tuple per mesh node.
    Node,
    /// One tuple per cell.
    Cell,
    /// Several tuples per cell, at quadrature points of a localization.
    Quadrature,
    /// One tuple per cell node (ELNO layout).
    ElementNode,
}

impl FieldKind {
    /// Domain the values are keyed by.
    pub fn domain(self) -> Domain {
        match self {
            FieldKind::Node => Domain::Node,
            _ => Domain::Cell,
        }
    }
}

/// One physical field over the whole time range.
#[derive(Debug)]
pub struct Field {
    name: String,
    kind: FieldKind,
    components: usize,
    component_names: Vec<String>,
    steps: Vec<FieldStep>,
    step_index: StepIndex<usize>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind, components: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            components,
            component_names: Vec::new(),
            steps: Vec::new(),
            step_index: StepIndex::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn set_component_names(&mut self, names: &[&str]) {
        self.component_names = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn component_names(&self) -> &[String] {
        &self.component_names
    }

    pub fn add_step(&mut self, step: FieldStep) -> usize {
        let index = self.steps.len();
        self.step_index.insert(step.step(), index);
        self.steps.push(step);
        index
    }

    pub fn step(&self, index: usize) -> Result<&FieldStep, MeshSupportError> {
        self.steps.get(index).ok_or(MeshSupportError::UnknownEntry {
            what: "field step",
            index,
        })
    }

    pub fn steps(&self) -> &StepIndex<usize> {
        &self.step_index
    }

    pub fn field_steps(&self) -> &[FieldStep] {
        &self.steps
    }

    pub(crate) fn field_steps_mut(&mut self) -> &mut [FieldStep] {
        &mut self.steps
    }

    /// The step resolved for `requested` under `mode`, if the field stores
    /// any steps at all.
    pub fn find_step(
        &self,
        mode: crate::topology::step::StepMode,
        requested: ComputeStep,
    ) -> Option<&FieldStep> {
        let index = *self.step_index.find_nearest(mode, requested)?;
        self.steps.get(index)
    }
}

/// One field's values at one compute step.
#[derive(Debug)]
pub struct FieldStep {
    step: ComputeStep,
    storages: Vec<FieldOnSupport>,
}

impl FieldStep {
    pub fn new(step: ComputeStep) -> Self {
        Self {
            step,
            storages: Vec::new(),
        }
    }

    pub fn step(&self) -> ComputeStep {
        self.step
    }

    pub fn add_storage(&mut self, storage: FieldOnSupport) {
        self.storages.push(storage);
    }

    pub fn storages(&self) -> &[FieldOnSupport] {
        &self.storages
    }

    /// The storage covering one element kind, if present.
    pub fn storage_for(&self, kind: ElementKind) -> Option<&FieldOnSupport> {
        self.storages.iter().find(|s| s.element_kind() == kind)
    }
}

/// Values of one field step for one element kind, restricted to one
/// profile (`None` = all elements of the kind). Immutable once decoded.
#[derive(Debug)]
pub struct FieldOnSupport {
    element_kind: ElementKind,
    profile: Option<ProfileId>,
    profile_name: Option<String>,
    /// Stored entities (profile length, or the whole group when unprofiled).
    entity_count: usize,
    /// Value tuples per stored entity (1 unless quadrature/ELNO).
    integration_points: usize,
    localization: Option<String>,
    values: OnceCell<Arc<Vec<f64>>>,
}

impl FieldOnSupport {
    pub fn new(
        element_kind: ElementKind,
        profile: Option<ProfileId>,
        profile_name: Option<String>,
        entity_count: usize,
        integration_points: usize,
        localization: Option<String>,
    ) -> Self {
        Self {
            element_kind,
            profile,
            profile_name,
            entity_count,
            integration_points: integration_points.max(1),
            localization,
            values: OnceCell::new(),
        }
    }

    pub fn element_kind(&self) -> ElementKind {
        self.element_kind
    }

    pub fn profile(&self) -> Option<ProfileId> {
        self.profile
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.profile_name.as_deref()
    }

    /// Stored entity count (rows before integration-point expansion).
    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    pub fn integration_points(&self) -> usize {
        self.integration_points
    }

    pub fn localization(&self) -> Option<&str> {
        self.localization.as_deref()
    }

    /// Flat value buffer, `components` floats per tuple, decoded compactly
    /// on first access.
    ///
    /// # Errors
    /// `SizeMismatch` when the decoded length disagrees with
    /// `entity_count × integration_points × components`.
    pub fn values(
        &self,
        source: &dyn SupportSource,
        field: &str,
        step: ComputeStep,
        components: usize,
    ) -> Result<&Arc<Vec<f64>>, MeshSupportError> {
        self.values.get_or_try_init(|| {
            let values = source.read_field_values(
                field,
                step,
                self.element_kind,
                self.profile_name.as_deref(),
                StorageMode::Compact,
            )?;
            let expected = self.entity_count * self.integration_points * components;
            if values.len() != expected {
                return Err(MeshSupportError::SizeMismatch {
                    what: "field values",
                    expected,
                    found: values.len(),
                });
            }
            Ok(Arc::new(values))
        })
    }
}
