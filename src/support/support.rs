//! The support record: one (family × element group × profile) triple.
//!
//! A support is the atomic unit that becomes one output geometry block and
//! the unit of field attachment and caching. Records live in the catalog
//! arena and carry their memoized classification and remap results, keyed
//! by the catalog generation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::support::remap::UsedPoints;
use crate::topology::ids::{FamilyId, ProfileId};

/// Identity of a support inside one metadata generation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SupportKey {
    /// Mesh index in the model.
    pub mesh: usize,
    /// Snapshot index within the mesh.
    pub snapshot: usize,
    /// Element group index within the snapshot.
    pub group: usize,
    /// Family tag the support selects.
    pub family: FamilyId,
    /// Sparse subset restriction; `None` = all elements.
    pub profile: Option<ProfileId>,
}

/// How a support's family relates to its profile (spec-level three-way
/// intersection result).
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Intersection {
    /// Every profile entry belongs to the family and the family is covered.
    Included,
    /// Some profile entries belong to the family, some do not.
    Partial,
    /// No profile entry belongs to the family.
    Empty,
}

/// How a node-domain storage profile relates to a cell support's used
/// points, counted on one basis: distinct used points the profile covers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PointProfileMatch {
    /// The profile is exactly the used-point set.
    Equal,
    /// The profile covers every used point and more.
    Covers,
    /// Some used point has no entry in the profile.
    Insufficient,
}

/// Lifecycle of a support across one request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum SupportState {
    Unresolved,
    Classified,
    PointsComputed,
    Built,
    FieldsMapped,
    /// Terminal and sticky until metadata reload.
    Invalid,
}

/// One arena entry.
#[derive(Debug)]
pub struct Support {
    key: SupportKey,
    state: SupportState,
    classification: Option<Intersection>,
    point_match: HashMap<Option<ProfileId>, PointProfileMatch>,
    used_points: Option<Arc<UsedPoints>>,
    /// Catalog generation the memos above were computed at.
    memo_generation: u64,
}

impl Support {
    pub(crate) fn new(key: SupportKey) -> Self {
        Self {
            key,
            state: SupportState::Unresolved,
            classification: None,
            point_match: HashMap::new(),
            used_points: None,
            memo_generation: 0,
        }
    }

    pub fn key(&self) -> &SupportKey {
        &self.key
    }

    pub fn state(&self) -> SupportState {
        self.state
    }

    pub fn is_invalid(&self) -> bool {
        self.state == SupportState::Invalid
    }

    /// Advances the state machine; states never move backward within a
    /// request and `Invalid` is sticky.
    pub(crate) fn advance(&mut self, to: SupportState) {
        if self.state == SupportState::Invalid {
            return;
        }
        if to == SupportState::Invalid || to > self.state {
            self.state = to;
        }
    }

    /// Resets to `Unresolved` after a selection change. `Invalid` stays.
    pub(crate) fn reset(&mut self) {
        if self.state != SupportState::Invalid {
            self.state = SupportState::Unresolved;
        }
    }

    pub(crate) fn memo_generation(&self) -> u64 {
        self.memo_generation
    }

    /// Drops memos computed under an older generation.
    pub(crate) fn refresh_memos(&mut self, generation: u64) {
        if self.memo_generation != generation {
            self.classification = None;
            self.point_match.clear();
            self.used_points = None;
            self.memo_generation = generation;
        }
    }

    pub(crate) fn classification(&self) -> Option<Intersection> {
        self.classification
    }

    pub(crate) fn set_classification(&mut self, value: Intersection) {
        self.classification = Some(value);
    }

    pub(crate) fn point_match(&self, profile: Option<ProfileId>) -> Option<PointProfileMatch> {
        self.point_match.get(&profile).copied()
    }

    pub(crate) fn set_point_match(&mut self, profile: Option<ProfileId>, value: PointProfileMatch) {
        self.point_match.insert(profile, value);
    }

    pub(crate) fn used_points(&self) -> Option<&Arc<UsedPoints>> {
        self.used_points.as_ref()
    }

    pub(crate) fn set_used_points(&mut self, value: Arc<UsedPoints>) {
        self.used_points = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SupportKey {
        SupportKey {
            mesh: 0,
            snapshot: 0,
            group: 0,
            family: FamilyId(1),
            profile: None,
        }
    }

    #[test]
    fn states_only_advance() {
        let mut s = Support::new(key());
        s.advance(SupportState::Classified);
        s.advance(SupportState::PointsComputed);
        // a repeated earlier transition does not move backward
        s.advance(SupportState::Classified);
        assert_eq!(s.state(), SupportState::PointsComputed);
        s.advance(SupportState::Built);
        s.advance(SupportState::FieldsMapped);
        assert_eq!(s.state(), SupportState::FieldsMapped);
    }

    #[test]
    fn invalid_is_sticky() {
        let mut s = Support::new(key());
        s.advance(SupportState::Built);
        s.advance(SupportState::Invalid);
        s.advance(SupportState::FieldsMapped);
        assert_eq!(s.state(), SupportState::Invalid);
        s.reset();
        assert_eq!(s.state(), SupportState::Invalid);
    }

    #[test]
    fn reset_clears_progress() {
        let mut s = Support::new(key());
        s.advance(SupportState::FieldsMapped);
        s.reset();
        assert_eq!(s.state(), SupportState::Unresolved);
    }

    #[test]
    fn memo_refresh_drops_stale_results() {
        let mut s = Support::new(key());
        s.refresh_memos(1);
        s.set_classification(Intersection::Partial);
        s.refresh_memos(1);
        assert_eq!(s.classification(), Some(Intersection::Partial));
        s.refresh_memos(2);
        assert_eq!(s.classification(), None);
    }
}
