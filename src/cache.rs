//! Geometry and field caches with a phase-driven eviction policy.
//!
//! Built geometry blocks and mapped field arrays are memoized by support
//! identity so time scrubbing does not rebuild static geometry. What
//! survives a request boundary is governed by the externally chosen
//! [`CacheStrategy`]; metadata invalidation clears everything regardless.
//!
//! Caches are process-local and mutated only by the thread driving the
//! request; there is no locking because there is no concurrent mutation.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::data::localization::LocalizationKey;
use crate::data::mapper::MappedField;
use crate::support::build::Geometry;
use crate::topology::cache::InvalidateCache;
use crate::topology::element::ElementKind;
use crate::topology::ids::{ProfileId, SupportId};

/// What survives a request boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CacheStrategy {
    /// Everything is rebuilt on every request.
    CacheNothing,
    /// Geometry blocks survive, mapped fields are dropped.
    CacheGeometry,
    /// Both geometry and mapped fields survive.
    CacheGeometryAndFields,
}

/// Where in the request lifecycle an eviction happens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EvictionPhase {
    /// Metadata (re)load: everything goes, unconditionally.
    Initialize,
    /// Start of a request: the active-block map is request-scoped and
    /// always cleared; the strategy decides the rest.
    StartRequest,
    /// End of a request: same clears as the start.
    EndRequest,
}

/// Identity of one field storage at one step, for field-cache keying.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldStepKey {
    pub field: usize,
    pub step: usize,
    pub kind: ElementKind,
    pub profile: Option<ProfileId>,
}

/// All memoized request state.
#[derive(Debug, Default)]
pub struct RequestCaches {
    geometry: HashMap<SupportId, Arc<Geometry>>,
    /// Blocks of the request currently being assembled.
    active: HashMap<SupportId, Arc<Geometry>>,
    fields: HashMap<(SupportId, FieldStepKey), MappedField>,
    quad_offsets: HashMap<(SupportId, LocalizationKey), Arc<Vec<usize>>>,
}

impl RequestCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_geometry(&self, id: SupportId) -> Option<Arc<Geometry>> {
        self.geometry.get(&id).cloned()
    }

    pub fn put_geometry(&mut self, id: SupportId, geometry: Arc<Geometry>) {
        self.geometry.insert(id, geometry);
    }

    /// Marks a block active in the request being assembled.
    pub fn set_active(&mut self, id: SupportId, geometry: Arc<Geometry>) {
        self.active.insert(id, geometry);
    }

    pub fn active(&self, id: SupportId) -> Option<&Arc<Geometry>> {
        self.active.get(&id)
    }

    pub fn get_field(&self, id: SupportId, key: FieldStepKey) -> Option<&MappedField> {
        self.fields.get(&(id, key))
    }

    pub fn put_field(&mut self, id: SupportId, key: FieldStepKey, mapped: MappedField) {
        self.fields.insert((id, key), mapped);
    }

    /// Offset array shared by fields with the same localization on the
    /// same support.
    pub fn quadrature_offsets(
        &mut self,
        id: SupportId,
        key: LocalizationKey,
        build: impl FnOnce() -> Arc<Vec<usize>>,
    ) -> Arc<Vec<usize>> {
        Arc::clone(self.quad_offsets.entry((id, key)).or_insert_with(build))
    }

    /// Drops every cached entry for one support (it went invalid or its
    /// geometry changed).
    pub fn clear_support(&mut self, id: SupportId) {
        self.geometry.remove(&id);
        self.active.remove(&id);
        self.fields.retain(|(sid, _), _| *sid != id);
        self.quad_offsets.retain(|(sid, _), _| *sid != id);
    }

    /// Applies the eviction policy at a request boundary.
    pub fn evict(&mut self, strategy: CacheStrategy, phase: EvictionPhase) {
        match phase {
            EvictionPhase::Initialize => self.invalidate_cache(),
            EvictionPhase::StartRequest | EvictionPhase::EndRequest => {
                self.active.clear();
                match strategy {
                    CacheStrategy::CacheNothing => {
                        self.geometry.clear();
                        self.fields.clear();
                        self.quad_offsets.clear();
                    }
                    CacheStrategy::CacheGeometry => {
                        self.fields.clear();
                    }
                    CacheStrategy::CacheGeometryAndFields => {}
                }
            }
        }
    }
}

impl InvalidateCache for RequestCaches {
    fn invalidate_cache(&mut self) {
        self.geometry.clear();
        self.active.clear();
        self.fields.clear();
        self.quad_offsets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::build::Geometry;

    fn dummy_geometry() -> Arc<Geometry> {
        // a geometry with no points or cells is still a valid cache entry
        Arc::new(Geometry::empty(ElementKind::Node, 3))
    }

    fn sid(raw: u32) -> SupportId {
        SupportId::new(raw).unwrap()
    }

    #[test]
    fn cache_nothing_drops_everything_at_end() {
        let mut caches = RequestCaches::new();
        caches.put_geometry(sid(1), dummy_geometry());
        caches.evict(CacheStrategy::CacheNothing, EvictionPhase::EndRequest);
        assert!(caches.get_geometry(sid(1)).is_none());
    }

    #[test]
    fn cache_geometry_keeps_blocks_drops_fields() {
        let mut caches = RequestCaches::new();
        caches.put_geometry(sid(1), dummy_geometry());
        let key = FieldStepKey {
            field: 0,
            step: 0,
            kind: ElementKind::Node,
            profile: None,
        };
        caches.put_field(sid(1), key, MappedField::test_stub("f"));
        caches.evict(CacheStrategy::CacheGeometry, EvictionPhase::EndRequest);
        assert!(caches.get_geometry(sid(1)).is_some());
        assert!(caches.get_field(sid(1), key).is_none());
    }

    #[test]
    fn active_map_is_request_scoped() {
        let mut caches = RequestCaches::new();
        caches.set_active(sid(1), dummy_geometry());
        caches.evict(CacheStrategy::CacheGeometryAndFields, EvictionPhase::StartRequest);
        assert!(caches.active(sid(1)).is_none());
    }

    #[test]
    fn initialize_ignores_strategy() {
        let mut caches = RequestCaches::new();
        caches.put_geometry(sid(1), dummy_geometry());
        caches.evict(CacheStrategy::CacheGeometryAndFields, EvictionPhase::Initialize);
        assert!(caches.get_geometry(sid(1)).is_none());
    }

    #[test]
    fn quadrature_offsets_shared_by_key() {
        let mut caches = RequestCaches::new();
        let key = LocalizationKey {
            name: "gauss3".to_string(),
            points: 3,
        };
        let a = caches.quadrature_offsets(sid(1), key.clone(), || Arc::new(vec![0, 3, 6]));
        let b = caches.quadrature_offsets(sid(1), key, || unreachable!("must reuse"));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
