//! Element kinds and element groups.
//!
//! An `ElementGroup` gathers all elements of one geometric kind within one
//! domain (node or cell) of a snapshot. Connectivity and per-element family
//! tags are decoded lazily through the [`SupportSource`] collaborator and
//! cached on the group.
//!
//! [`SupportSource`]: crate::io::SupportSource

use std::sync::Arc;

use itertools::Itertools;
use once_cell::sync::OnceCell;

use crate::io::SupportSource;
use crate::mesh_error::MeshSupportError;
use crate::topology::ids::FamilyId;

/// Whether data lives on mesh nodes or on cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Domain {
    Node,
    Cell,
}

/// Geometric element kinds with fixed per-element node counts.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum ElementKind {
    /// The node block itself (one "element" per mesh point).
    Node,
    Point1,
    Seg2,
    Seg3,
    Tri3,
    Tri6,
    Quad4,
    Quad8,
    Tet4,
    Tet10,
    Pyr5,
    Penta6,
    Hex8,
    Hex20,
}

impl ElementKind {
    /// Number of points each element of this kind references.
    pub fn node_count(self) -> usize {
        match self {
            ElementKind::Node | ElementKind::Point1 => 1,
            ElementKind::Seg2 => 2,
            ElementKind::Seg3 | ElementKind::Tri3 => 3,
            ElementKind::Tet4 | ElementKind::Quad4 => 4,
            ElementKind::Pyr5 => 5,
            ElementKind::Tri6 | ElementKind::Penta6 => 6,
            ElementKind::Quad8 | ElementKind::Hex8 => 8,
            ElementKind::Tet10 => 10,
            ElementKind::Hex20 => 20,
        }
    }
}

/// All elements of one kind within one domain of a snapshot.
///
/// The element count is declared at metadata load; connectivity and family
/// tags arrive on first use through the decode collaborator, addressed by
/// the group's source `token`. A group whose decoded buffers disagree with
/// the declared count is disabled by the request layer, not here.
#[derive(Debug)]
pub struct ElementGroup {
    kind: ElementKind,
    domain: Domain,
    count: usize,
    token: usize,
    connectivity: OnceCell<Arc<Vec<usize>>>,
    family_ids: OnceCell<Option<Vec<FamilyId>>>,
    families_present: OnceCell<Vec<FamilyId>>,
}

impl ElementGroup {
    pub fn new(kind: ElementKind, domain: Domain, count: usize, token: usize) -> Self {
        Self {
            kind,
            domain,
            count,
            token,
            connectivity: OnceCell::new(),
            family_ids: OnceCell::new(),
            families_present: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Declared number of elements in this group.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Opaque id the decode collaborator addresses this group by.
    pub fn token(&self) -> usize {
        self.token
    }

    /// 0-based point indices, `kind().node_count()` per element.
    ///
    /// Decoded on first call. The node domain stores no connectivity; node
    /// supports use element index == point index and never call this.
    ///
    /// # Errors
    /// `SizeMismatch` when the decoded buffer length disagrees with the
    /// declared element count; decode errors pass through.
    pub fn connectivity(
        &self,
        source: &dyn SupportSource,
        mesh: &str,
    ) -> Result<&Arc<Vec<usize>>, MeshSupportError> {
        self.connectivity.get_or_try_init(|| {
            let conn = source.read_connectivity(mesh, self.token)?;
            let expected = self.count * self.kind.node_count();
            if conn.len() != expected {
                return Err(MeshSupportError::SizeMismatch {
                    what: "connectivity",
                    expected,
                    found: conn.len(),
                });
            }
            Ok(Arc::new(conn))
        })
    }

    /// Per-element family tags; `None` means the group carries no explicit
    /// tags and belongs wholesale to [`FamilyId::DEFAULT`].
    pub fn family_ids(
        &self,
        source: &dyn SupportSource,
        mesh: &str,
    ) -> Result<Option<&[FamilyId]>, MeshSupportError> {
        let ids = self
            .family_ids
            .get_or_try_init(|| match source.read_family_ids(mesh, self.token)? {
                None => Ok(None),
                Some(ids) => {
                    if ids.len() != self.count {
                        return Err(MeshSupportError::SizeMismatch {
                            what: "family ids",
                            expected: self.count,
                            found: ids.len(),
                        });
                    }
                    Ok(Some(ids))
                }
            })?;
        Ok(ids.as_deref())
    }

    /// Family tag of one element. Elements of untagged groups report the
    /// default family.
    pub fn family_id(
        &self,
        source: &dyn SupportSource,
        mesh: &str,
        element: usize,
    ) -> Result<FamilyId, MeshSupportError> {
        Ok(self
            .family_ids(source, mesh)?
            .map_or(FamilyId::DEFAULT, |ids| ids[element]))
    }

    /// Distinct family tags present on this group, ascending.
    ///
    /// This is the partition the support catalog enumerates: every element
    /// carries exactly one tag, so the per-family element sets are disjoint
    /// and exhaustive.
    pub fn families_present(
        &self,
        source: &dyn SupportSource,
        mesh: &str,
    ) -> Result<&[FamilyId], MeshSupportError> {
        let present = self.families_present.get_or_try_init(|| {
            let present = match self.family_ids(source, mesh)? {
                None => vec![FamilyId::DEFAULT],
                Some(ids) => ids.iter().copied().sorted_unstable().dedup().collect(),
            };
            Ok::<_, MeshSupportError>(present)
        })?;
        Ok(present)
    }
}
