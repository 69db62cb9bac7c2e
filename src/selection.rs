//! Selection state: which families, groups, element kinds, and fields
//! participate in a request.
//!
//! Every mutation bumps a generation counter; the request orchestrator
//! compares it against the last generation it applied and resets the
//! affected supports when it moved. Everything defaults to selected so a
//! fresh reader produces output without any UI round-trip.

use std::collections::HashMap;

use crate::topology::element::ElementKind;
use crate::topology::family::Family;
use crate::topology::mesh::Mesh;

/// Selection flags with explicit-override semantics for families.
#[derive(Debug, Default)]
pub struct Selection {
    /// Explicit per-family flags, keyed by (mesh, family name).
    families: HashMap<(String, String), bool>,
    /// Per-group flags, keyed by (mesh, group name). Default on.
    groups: HashMap<(String, String), bool>,
    kinds: HashMap<ElementKind, bool>,
    fields: HashMap<String, bool>,
    generation: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the last mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn set_family_selected(&mut self, mesh: &str, family: &str, selected: bool) {
        self.families
            .insert((mesh.to_string(), family.to_string()), selected);
        self.touch();
    }

    pub fn set_group_selected(&mut self, mesh: &str, group: &str, selected: bool) {
        self.groups
            .insert((mesh.to_string(), group.to_string()), selected);
        self.touch();
    }

    pub fn set_kind_enabled(&mut self, kind: ElementKind, enabled: bool) {
        self.kinds.insert(kind, enabled);
        self.touch();
    }

    pub fn set_field_selected(&mut self, field: &str, selected: bool) {
        self.fields.insert(field.to_string(), selected);
        self.touch();
    }

    pub fn is_kind_enabled(&self, kind: ElementKind) -> bool {
        self.kinds.get(&kind).copied().unwrap_or(true)
    }

    pub fn is_field_selected(&self, field: &str) -> bool {
        self.fields.get(field).copied().unwrap_or(true)
    }

    pub fn is_group_selected(&self, mesh: &str, group: &str) -> bool {
        self.groups
            .get(&(mesh.to_string(), group.to_string()))
            .copied()
            .unwrap_or(true)
    }

    /// Effective status of a declared family: an explicit family flag
    /// wins; otherwise the family is selected iff any of its groups is.
    /// Families in no group at all default to selected.
    pub fn is_family_selected(&self, mesh: &Mesh, family: &Family) -> bool {
        if let Some(&explicit) = self
            .families
            .get(&(mesh.name().to_string(), family.name.clone()))
        {
            return explicit;
        }
        if family.groups.is_empty() {
            return true;
        }
        family
            .groups
            .iter()
            .any(|g| self.is_group_selected(mesh.name(), g))
    }

    /// Status of a family known only by tag value (no declared metadata):
    /// selected unless explicitly disabled under its synthesized name.
    pub fn is_family_id_selected(&self, mesh: &Mesh, id: crate::topology::ids::FamilyId) -> bool {
        match mesh.family_by_id(id) {
            Some(family) => self.is_family_selected(mesh, family),
            None => true,
        }
    }
}
