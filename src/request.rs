//! The request orchestrator: one end-to-end data request.
//!
//! A request resolves the active compute step, enumerates the supports
//! implied by the current selection (including those forced by selected
//! fields' storage profiles), materializes geometry per support, attaches
//! mapped field arrays, and applies the cache policy at the request
//! boundaries. A request either completes or aborts with a fatal error;
//! caches from prior successful requests stay valid either way.

use std::sync::Arc;

use crate::algs::partition::WorkerLayout;
use crate::cache::{CacheStrategy, EvictionPhase, FieldStepKey, RequestCaches};
use crate::data::field::FieldKind;
use crate::data::mapper;
use crate::io::SupportSource;
use crate::mesh_error::MeshSupportError;
use crate::selection::Selection;
use crate::support::build::{self, Geometry};
use crate::support::catalog::SupportCatalog;
use crate::support::support::{SupportKey, SupportState};
use crate::topology::cache::InvalidateCache;
use crate::topology::element::{Domain, ElementKind};
use crate::topology::ids::{FamilyId, SupportId};
use crate::topology::mesh::MeshModel;
use crate::topology::step::{ComputeStep, StepMode};

/// One output block: a support's geometry plus its mapped fields.
#[derive(Debug, Clone)]
pub struct SupportBlock {
    pub support: SupportId,
    /// Naming path `mesh / domain / family [/ kind] [/ profile]`.
    pub path: Vec<String>,
    pub geometry: Arc<Geometry>,
    pub fields: Vec<mapper::MappedField>,
}

/// Result of one request.
#[derive(Debug, Default)]
pub struct RequestOutput {
    pub blocks: Vec<SupportBlock>,
}

/// Drives requests against one opened source.
pub struct MeshReader {
    source: Box<dyn SupportSource>,
    model: MeshModel,
    selection: Selection,
    catalog: SupportCatalog,
    caches: RequestCaches,
    strategy: CacheStrategy,
    mode: StepMode,
    requested: ComputeStep,
    time_index_for_iterations: usize,
    layout: WorkerLayout,
    generate_vectors: bool,
    selection_seen: u64,
}

impl MeshReader {
    /// Opens a source: decodes its catalog into the metadata model. The
    /// source is the per-format strategy object; it is chosen here, once.
    pub fn open(source: Box<dyn SupportSource>) -> Result<Self, MeshSupportError> {
        let model = source.load_model()?;
        Ok(Self {
            source,
            model,
            selection: Selection::new(),
            catalog: SupportCatalog::new(),
            caches: RequestCaches::new(),
            strategy: CacheStrategy::CacheGeometry,
            mode: StepMode::PhysicalTime,
            requested: ComputeStep::undefined(),
            time_index_for_iterations: 0,
            layout: WorkerLayout::serial(),
            generate_vectors: false,
            selection_seen: 0,
        })
    }

    /// Re-decodes the catalog after the file was reselected or relinked.
    /// Clears everything derived, unconditionally.
    pub fn reload_metadata(&mut self) -> Result<(), MeshSupportError> {
        self.model = self.source.load_model()?;
        self.catalog = SupportCatalog::new();
        self.caches.evict(self.strategy, EvictionPhase::Initialize);
        self.selection_seen = self.selection.generation();
        Ok(())
    }

    pub fn model(&self) -> &MeshModel {
        &self.model
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn catalog(&self) -> &SupportCatalog {
        &self.catalog
    }

    pub fn set_cache_strategy(&mut self, strategy: CacheStrategy) {
        self.strategy = strategy;
    }

    pub fn set_step_mode(&mut self, mode: StepMode) {
        self.mode = mode;
    }

    /// The step the next request asks for.
    pub fn set_request(&mut self, time: f64, iteration: i64) {
        self.requested = ComputeStep::new(time, iteration);
    }

    /// Which advertised time iteration-mode requests are pinned to.
    pub fn set_time_index_for_iterations(&mut self, index: usize) {
        self.time_index_for_iterations = index;
    }

    pub fn set_worker_layout(&mut self, layout: WorkerLayout) {
        self.layout = layout;
    }

    pub fn set_generate_vectors(&mut self, enabled: bool) {
        self.generate_vectors = enabled;
    }

    /// Ordered union of every advertised compute step.
    pub fn available_steps(&self) -> Vec<ComputeStep> {
        self.model.available_steps()
    }

    /// Cached geometry for a support, if the policy kept it.
    pub fn cached_geometry(&self, id: SupportId) -> Option<Arc<Geometry>> {
        self.caches.get_geometry(id)
    }

    /// Resolves (or creates) the support for an explicit triple. Exposed
    /// for geometric selections that reference supports directly.
    pub fn resolve_support(
        &mut self,
        mesh: usize,
        snapshot: usize,
        group: usize,
        family: FamilyId,
        profile: Option<&str>,
    ) -> Result<SupportId, MeshSupportError> {
        // validate the coordinates before minting a key
        self.model.mesh(mesh)?.snapshot(snapshot)?.group(group)?;
        let profile = match profile {
            None => None,
            Some(name) => Some(self.model.profiles().lookup(name).ok_or_else(|| {
                MeshSupportError::DecodeFailed {
                    what: "profile indices",
                    reason: format!("no profile named `{name}`"),
                }
            })?),
        };
        Ok(self.catalog.resolve_support(SupportKey {
            mesh,
            snapshot,
            group,
            family,
            profile,
        }))
    }

    /// The concrete step a request resolves against, mode-dependent.
    fn effective_request_step(&self) -> ComputeStep {
        match self.mode {
            StepMode::PhysicalTime | StepMode::Modes => self.requested,
            StepMode::Iteration => {
                let mut times: Vec<f64> = self.available_steps().iter().map(|s| s.time).collect();
                times.dedup_by(|a, b| a.total_cmp(b).is_eq());
                let index = self.time_index_for_iterations.min(times.len().saturating_sub(1));
                ComputeStep::new(times.get(index).copied().unwrap_or_default(), self.requested.iteration)
            }
        }
    }

    /// Drives one end-to-end request.
    pub fn build_request(&mut self) -> Result<RequestOutput, MeshSupportError> {
        if self.selection.generation() != self.selection_seen {
            self.catalog.reset_for_selection_change();
            self.selection_seen = self.selection.generation();
        }
        self.caches.evict(self.strategy, EvictionPhase::StartRequest);

        let requested = self.effective_request_step();
        let used = self.enumerate_supports(requested)?;

        let mut blocks = Vec::new();
        for id in used {
            if let Some(block) = self.materialize(id)? {
                blocks.push(block);
            }
        }

        self.map_selected_fields(requested, &mut blocks)?;

        for block in &blocks {
            self.catalog.advance(block.support, SupportState::FieldsMapped);
        }

        self.caches.evict(self.strategy, EvictionPhase::EndRequest);
        Ok(RequestOutput { blocks })
    }

    /// Enumerates the supports this request touches: for every enabled
    /// group and selected family, the supports forced by selected fields'
    /// storage profiles, falling back to the default (unprofiled) support
    /// when no field forces one.
    fn enumerate_supports(
        &mut self,
        requested: ComputeStep,
    ) -> Result<Vec<SupportId>, MeshSupportError> {
        let mut used = Vec::new();
        for (mesh_index, mesh) in self.model.meshes().iter().enumerate() {
            let Some(snapshot_index) = mesh.find_snapshot(self.mode, requested) else {
                continue;
            };
            let snapshot = mesh.snapshot(snapshot_index)?;
            for (group_index, group) in snapshot.groups().iter().enumerate() {
                if !self.selection.is_kind_enabled(group.kind()) {
                    continue;
                }
                let families = match group.families_present(&*self.source, mesh.name()) {
                    Ok(families) => families.to_vec(),
                    Err(err) if !is_fatal(&err) => {
                        log::warn!(
                            "mesh `{}`: element group {group_index} disabled: {err}",
                            mesh.name()
                        );
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                for family in families {
                    if !self.selection.is_family_id_selected(mesh, family) {
                        continue;
                    }
                    let mut forced = false;
                    for field in self.model.fields() {
                        if !self.selection.is_field_selected(field.name()) {
                            continue;
                        }
                        let Some(&step_index) = field.steps().find_nearest(self.mode, requested)
                        else {
                            continue;
                        };
                        let step = field.step(step_index)?;
                        for storage in step.storages() {
                            if storage.element_kind() != group.kind() {
                                continue;
                            }
                            let id = self.catalog.resolve_support(SupportKey {
                                mesh: mesh_index,
                                snapshot: snapshot_index,
                                group: group_index,
                                family,
                                profile: storage.profile(),
                            });
                            if !used.contains(&id) {
                                used.push(id);
                            }
                            forced = true;
                        }
                    }
                    if !forced {
                        let id = self.catalog.ensure_default_support(
                            mesh_index,
                            snapshot_index,
                            group_index,
                            family,
                        );
                        if !used.contains(&id) {
                            used.push(id);
                        }
                    }
                }
            }
        }
        Ok(used)
    }

    /// Classifies and builds one support's geometry block.
    ///
    /// Invalid supports are skipped: with a warning when running alone,
    /// silently in a fleet (a worker's block may legitimately contain
    /// none of the affected elements).
    fn materialize(&mut self, id: SupportId) -> Result<Option<SupportBlock>, MeshSupportError> {
        if self.catalog.get(id)?.is_invalid() {
            if self.layout.is_serial() {
                log::warn!("support {id} is invalid; excluded from output");
            }
            return Ok(None);
        }

        match self
            .catalog
            .classify_intersection(&self.model, &*self.source, self.layout, id)
        {
            Ok(_) => {}
            Err(err) if !is_fatal(&err) => {
                log::warn!("support {id}: classification failed: {err}");
                return Ok(None);
            }
            Err(err) => return Err(err),
        }

        let geometry = if let Some(cached) = self.caches.get_geometry(id) {
            cached
        } else {
            match build::build_geometry(&self.model, &*self.source, &mut self.catalog, self.layout, id)
            {
                Ok(geometry) => {
                    let geometry = Arc::new(geometry);
                    self.caches.put_geometry(id, Arc::clone(&geometry));
                    geometry
                }
                Err(err) if !is_fatal(&err) => {
                    if self.layout.is_serial() {
                        log::warn!("support {id}: geometry build failed: {err}");
                    }
                    self.caches.clear_support(id);
                    return Ok(None);
                }
                Err(err) => return Err(err),
            }
        };
        self.caches.set_active(id, Arc::clone(&geometry));
        self.catalog.advance(id, SupportState::Built);

        let path = self.block_path(id)?;
        Ok(Some(SupportBlock {
            support: id,
            path,
            geometry,
            fields: Vec::new(),
        }))
    }

    /// Attaches every selected field's resolved step to every block that
    /// accepts it, through the field cache.
    fn map_selected_fields(
        &mut self,
        requested: ComputeStep,
        blocks: &mut [SupportBlock],
    ) -> Result<(), MeshSupportError> {
        for field_index in 0..self.model.fields().len() {
            let field = self.model.field(field_index)?;
            if !self.selection.is_field_selected(field.name()) {
                continue;
            }
            let Some(&step_index) = field.steps().find_nearest(self.mode, requested) else {
                continue;
            };

            for block in blocks.iter_mut() {
                let id = block.support;
                let key = *self.catalog.get(id)?.key();
                let mesh = self.model.mesh(key.mesh)?;
                let group = mesh.snapshot(key.snapshot)?.group(key.group)?;
                let storage_kind = match field.kind() {
                    FieldKind::Node => ElementKind::Node,
                    _ => group.kind(),
                };

                let step = field.step(step_index)?;
                let Some(fos) = step.storage_for(storage_kind) else {
                    continue;
                };
                if !mapper::can_map(
                    &self.model,
                    &*self.source,
                    &mut self.catalog,
                    self.layout,
                    id,
                    field,
                    fos,
                )? {
                    continue;
                }

                let cache_key = FieldStepKey {
                    field: field_index,
                    step: step_index,
                    kind: fos.element_kind(),
                    profile: fos.profile(),
                };
                if let Some(cached) = self.caches.get_field(id, cache_key) {
                    block.fields.push(cached.clone());
                    continue;
                }

                match mapper::map_field(
                    &self.model,
                    &*self.source,
                    &mut self.catalog,
                    &mut self.caches,
                    self.layout,
                    id,
                    field,
                    step,
                    fos,
                    self.generate_vectors,
                ) {
                    Ok(mapped) => {
                        self.caches.put_field(id, cache_key, mapped.clone());
                        block.fields.push(mapped);
                    }
                    Err(err) if !is_fatal(&err) => {
                        log::warn!(
                            "field `{}` on support {id}: mapping failed: {err}",
                            field.name()
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(())
    }

    /// Naming path of one block: `mesh / domain / family [/ kind]
    /// [/ profile]`.
    fn block_path(&self, id: SupportId) -> Result<Vec<String>, MeshSupportError> {
        let key = *self.catalog.get(id)?.key();
        let mesh = self.model.mesh(key.mesh)?;
        let group = mesh.snapshot(key.snapshot)?.group(key.group)?;
        let family_name = mesh
            .family_by_id(key.family)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| format!("FAM_{}", key.family));

        let mut path = vec![mesh.name().to_string()];
        match group.domain() {
            Domain::Node => {
                path.push("OnPoint".to_string());
                path.push(family_name);
            }
            Domain::Cell => {
                path.push("OnCell".to_string());
                path.push(family_name);
                path.push(format!("{:?}", group.kind()));
            }
        }
        if let Some(profile_id) = key.profile {
            path.push(self.model.profiles().get(profile_id)?.name().to_string());
        }
        Ok(path)
    }
}

impl InvalidateCache for MeshReader {
    fn invalidate_cache(&mut self) {
        self.catalog.reset_for_selection_change();
        self.caches.invalidate_cache();
    }
}

/// Errors that abort the whole request, as opposed to conditions
/// recovered locally (an invalid support, a disabled group, a gap).
fn is_fatal(err: &MeshSupportError) -> bool {
    !matches!(
        err,
        MeshSupportError::PointOutOfRange { .. }
            | MeshSupportError::ProfileOutOfRange { .. }
            | MeshSupportError::ProfileNotSorted { .. }
            | MeshSupportError::SizeMismatch { .. }
            | MeshSupportError::InvalidSupport(_)
            | MeshSupportError::NoFieldStorage { .. }
    )
}
