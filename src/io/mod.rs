//! Decode-collaborator seam.
//!
//! Byte-level file decoding is not this crate's business: everything the
//! engine needs from a result file arrives through the [`SupportSource`]
//! trait. A concrete source is the strategy object chosen once when a file
//! is opened (one per on-disk format version); the engine never dispatches
//! on format again afterward.
//!
//! [`MemorySource`](memory::MemorySource) is the in-memory implementation
//! used by tests and demos, and the reference for the trait contract.

pub mod memory;

use crate::mesh_error::MeshSupportError;
use crate::topology::element::ElementKind;
use crate::topology::ids::FamilyId;
use crate::topology::mesh::MeshModel;
use crate::topology::step::ComputeStep;

/// How field value buffers are laid out relative to their profile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StorageMode {
    /// One tuple per profile entry (or per element when unprofiled).
    Compact,
    /// One tuple per element of the whole group; the profile only marks
    /// which entries are meaningful.
    Global,
}

/// Everything the engine consumes from the file-decoding collaborator.
///
/// All methods are read-only; sources cache internally if re-decoding is
/// expensive. Group and snapshot arguments are the opaque tokens the
/// source itself assigned while building the [`MeshModel`].
pub trait SupportSource {
    /// Decodes the file catalog into a fresh metadata model.
    fn load_model(&self) -> Result<MeshModel, MeshSupportError>;

    /// Per-element family tags for a group; `None` when the group carries
    /// no explicit tags.
    fn read_family_ids(
        &self,
        mesh: &str,
        group: usize,
    ) -> Result<Option<Vec<FamilyId>>, MeshSupportError>;

    /// 0-based connectivity for a cell-domain group.
    fn read_connectivity(&self, mesh: &str, group: usize) -> Result<Vec<usize>, MeshSupportError>;

    /// Interleaved point coordinates of one snapshot.
    fn read_coordinates(&self, mesh: &str, snapshot: usize) -> Result<Vec<f64>, MeshSupportError>;

    /// Sorted, 1-based indices of a named profile.
    fn read_profile_indices(&self, name: &str) -> Result<Vec<usize>, MeshSupportError>;

    /// Flat value buffer of one field at one step for one element kind and
    /// storage profile.
    fn read_field_values(
        &self,
        field: &str,
        step: ComputeStep,
        kind: ElementKind,
        profile: Option<&str>,
        mode: StorageMode,
    ) -> Result<Vec<f64>, MeshSupportError>;
}
