//! The support catalog: arena, resolution, and classification.
//!
//! Supports are created on demand, either because a geometric selection
//! references them or because a selected field's storage profile forces
//! their existence. Within one metadata generation they are never
//! destroyed, only invalidated and reclassified when selection or
//! metadata changes (tracked by a generation counter).

use std::sync::Arc;

use hashbrown::HashMap;

use crate::algs::partition::WorkerLayout;
use crate::io::SupportSource;
use crate::mesh_error::MeshSupportError;
use crate::support::remap::{self, UsedPoints};
use crate::support::support::{
    Intersection, PointProfileMatch, Support, SupportKey, SupportState,
};
use crate::topology::cache::InvalidateCache;
use crate::topology::element::Domain;
use crate::topology::ids::{FamilyId, ProfileId, SupportId};
use crate::topology::mesh::MeshModel;

/// Arena of supports plus the generation counter their memos key on.
#[derive(Debug, Default)]
pub struct SupportCatalog {
    supports: Vec<Support>,
    by_key: HashMap<SupportKey, SupportId>,
    generation: u64,
}

impl SupportCatalog {
    pub fn new() -> Self {
        Self {
            supports: Vec::new(),
            by_key: HashMap::new(),
            generation: 1,
        }
    }

    /// Current generation; memos computed under an older one are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of supports resolved so far.
    pub fn len(&self) -> usize {
        self.supports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supports.is_empty()
    }

    /// Returns the existing support for `key` or creates it.
    ///
    /// Idempotent: identical arguments return the same handle and allocate
    /// nothing new.
    pub fn resolve_support(&mut self, key: SupportKey) -> SupportId {
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = SupportId::from_index(self.supports.len());
        self.supports.push(Support::new(key));
        self.by_key.insert(key, id);
        id
    }

    /// Guarantees a support with `profile = None` exists for the pair.
    pub fn ensure_default_support(
        &mut self,
        mesh: usize,
        snapshot: usize,
        group: usize,
        family: FamilyId,
    ) -> SupportId {
        self.resolve_support(SupportKey {
            mesh,
            snapshot,
            group,
            family,
            profile: None,
        })
    }

    pub fn get(&self, id: SupportId) -> Result<&Support, MeshSupportError> {
        self.supports
            .get(id.index())
            .ok_or(MeshSupportError::UnknownSupport(id))
    }

    fn get_mut(&mut self, id: SupportId) -> Result<&mut Support, MeshSupportError> {
        self.supports
            .get_mut(id.index())
            .ok_or(MeshSupportError::UnknownSupport(id))
    }

    /// All resolved supports in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (SupportId, &Support)> {
        self.supports
            .iter()
            .enumerate()
            .map(|(i, s)| (SupportId::from_index(i), s))
    }

    /// Marks a support invalid (sticky until metadata reload).
    pub fn mark_invalid(&mut self, id: SupportId) {
        if let Ok(support) = self.get_mut(id) {
            support.advance(SupportState::Invalid);
        }
    }

    /// Advances a support's request state.
    pub fn advance(&mut self, id: SupportId, state: SupportState) {
        if let Ok(support) = self.get_mut(id) {
            support.advance(state);
        }
    }

    /// Selection changed: every non-invalid support returns to
    /// `Unresolved` and stale memos die with the generation bump.
    pub fn reset_for_selection_change(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        for support in &mut self.supports {
            support.reset();
        }
    }

    /// True when `family` is the only family present on the support's
    /// element group.
    pub fn family_is_sole(
        &self,
        model: &MeshModel,
        source: &dyn SupportSource,
        key: &SupportKey,
    ) -> Result<bool, MeshSupportError> {
        let mesh = model.mesh(key.mesh)?;
        let group = mesh.snapshot(key.snapshot)?.group(key.group)?;
        let present = group.families_present(source, mesh.name())?;
        Ok(present.len() == 1 && present.contains(&key.family))
    }

    /// Number of node-domain supports the snapshot partitions into (one
    /// per family present on each node-domain group).
    pub fn node_support_count(
        &self,
        model: &MeshModel,
        source: &dyn SupportSource,
        mesh_index: usize,
        snapshot: usize,
    ) -> Result<usize, MeshSupportError> {
        let mesh = model.mesh(mesh_index)?;
        let snap = mesh.snapshot(snapshot)?;
        let mut count = 0;
        for group in snap.groups() {
            if group.domain() == Domain::Node {
                count += group.families_present(source, mesh.name())?.len();
            }
        }
        Ok(count)
    }

    /// Classifies how the support's family intersects its profile.
    ///
    /// With no profile the classification degenerates to "does this family
    /// cover the whole element group". With a profile, one scan tracks
    /// whether any and all entries carry the family. The result is
    /// memoized on the support until the generation moves.
    ///
    /// In a multi-worker layout the scan covers only this worker's element
    /// block; a profile whose block slice is empty classifies `Empty`,
    /// which is legitimate there.
    pub fn classify_intersection(
        &mut self,
        model: &MeshModel,
        source: &dyn SupportSource,
        layout: WorkerLayout,
        id: SupportId,
    ) -> Result<Intersection, MeshSupportError> {
        let generation = self.generation;
        let support = self.get_mut(id)?;
        if support.is_invalid() {
            return Err(MeshSupportError::InvalidSupport(id));
        }
        support.refresh_memos(generation);
        if let Some(result) = support.classification() {
            return Ok(result);
        }
        let key = *support.key();

        let mesh = model.mesh(key.mesh)?;
        let group = mesh.snapshot(key.snapshot)?.group(key.group)?;

        let result = match key.profile {
            None => {
                let present = group.families_present(source, mesh.name())?;
                if !present.contains(&key.family) {
                    Intersection::Empty
                } else if present.len() == 1 {
                    Intersection::Included
                } else {
                    Intersection::Partial
                }
            }
            Some(profile_id) => {
                let profile = model.profiles().get(profile_id)?;
                let indices = profile.indices(source)?;
                let block = layout.block(group.count());
                let mut any_match = false;
                let mut all_match = true;
                for &value in indices {
                    let element = value - 1;
                    if element >= group.count() {
                        self.mark_invalid(id);
                        return Err(MeshSupportError::ProfileOutOfRange {
                            name: profile.name().to_string(),
                            value,
                            count: group.count(),
                        });
                    }
                    if !block.contains(&element) {
                        continue;
                    }
                    if group.family_id(source, mesh.name(), element)? == key.family {
                        any_match = true;
                    } else {
                        all_match = false;
                    }
                }
                if !any_match {
                    Intersection::Empty
                } else if all_match {
                    Intersection::Included
                } else {
                    Intersection::Partial
                }
            }
        };

        let support = self.get_mut(id)?;
        support.set_classification(result);
        support.advance(SupportState::Classified);
        Ok(result)
    }

    /// Kept-point set of the support, computing and memoizing on first
    /// call per generation.
    ///
    /// A point-range failure marks the support invalid and aborts only
    /// this support.
    pub fn used_points(
        &mut self,
        model: &MeshModel,
        source: &dyn SupportSource,
        layout: WorkerLayout,
        id: SupportId,
    ) -> Result<Arc<UsedPoints>, MeshSupportError> {
        let generation = self.generation;
        let support = self.get_mut(id)?;
        if support.is_invalid() {
            return Err(MeshSupportError::InvalidSupport(id));
        }
        support.refresh_memos(generation);
        if let Some(used) = support.used_points() {
            return Ok(Arc::clone(used));
        }
        let key = *support.key();
        let sole = self.family_is_sole(model, source, &key)?;
        match remap::compute_used_points(model, source, &key, layout, sole) {
            Ok(used) => {
                let used = Arc::new(used);
                let support = self.get_mut(id)?;
                support.set_used_points(Arc::clone(&used));
                support.advance(SupportState::PointsComputed);
                Ok(used)
            }
            Err(err) => {
                log::warn!("support {id}: used-point sweep failed: {err}");
                self.mark_invalid(id);
                Err(err)
            }
        }
    }

    /// How a node-domain storage profile relates to this support's used
    /// points. Memoized per storage profile.
    ///
    /// One counting basis only: `hits` = distinct used points the profile
    /// covers. `Equal` when the profile is exactly the used set, `Covers`
    /// when it is a strict superset, `Insufficient` when some used point
    /// is missing from it.
    pub fn point_profile_match(
        &mut self,
        model: &MeshModel,
        source: &dyn SupportSource,
        layout: WorkerLayout,
        id: SupportId,
        storage_profile: Option<ProfileId>,
    ) -> Result<PointProfileMatch, MeshSupportError> {
        {
            let generation = self.generation;
            let support = self.get_mut(id)?;
            support.refresh_memos(generation);
            if let Some(result) = support.point_match(storage_profile) {
                return Ok(result);
            }
        }
        let used = self.used_points(model, source, layout, id)?;
        let result = match storage_profile {
            None => {
                if used.use_all() {
                    PointProfileMatch::Equal
                } else {
                    PointProfileMatch::Covers
                }
            }
            Some(profile_id) => {
                let profile = model.profiles().get(profile_id)?;
                let indices = profile.indices(source)?;
                let hits = indices
                    .iter()
                    .filter(|&&value| used.keep_point(value - 1))
                    .count();
                if hits < used.used_count() {
                    PointProfileMatch::Insufficient
                } else if indices.len() == hits {
                    PointProfileMatch::Equal
                } else {
                    PointProfileMatch::Covers
                }
            }
        };
        let support = self.get_mut(id)?;
        support.set_point_match(storage_profile, result);
        Ok(result)
    }
}

impl InvalidateCache for SupportCatalog {
    fn invalidate_cache(&mut self) {
        self.reset_for_selection_change();
    }
}
