//! # mesh-supports
//!
//! mesh-supports is a support-resolution and field-mapping engine for
//! hierarchical finite-element result meshes, designed for post-processing
//! and visualization pipelines. It reads time-ordered mesh snapshots
//! subdivided by element kind, annotated with per-element family tags and
//! sparse index profiles, and produces a minimal set of in-memory geometry
//! blocks with field data attached.
//!
//! ## Features
//! - Support catalog: every (family × element group × profile) triple that
//!   actually occurs, classified by a three-way set intersection
//! - Index remapper: kept-point sets and compacted local renumberings per
//!   support
//! - Field mapper: shallow vs. gathered attachment of field buffers,
//!   including quadrature and per-element-node layouts
//! - Geometry and field caches keyed by support identity, with a
//!   request-boundary eviction policy for time scrubbing
//! - Rank-arithmetic block partitioning for coordination-free distributed
//!   execution
//!
//! ## Determinism
//!
//! Supports are enumerated in model order and gathers walk kept elements
//! in ascending global order, so outputs are reproducible across runs.
//!
//! ## Usage
//!
//! Byte-level decoding stays behind the [`io::SupportSource`] trait; open
//! a reader over any source and drive requests:
//!
//! ```rust
//! use mesh_supports::io::memory::MemorySource;
//! use mesh_supports::prelude::*;
//!
//! # fn main() -> Result<(), mesh_supports::mesh_error::MeshSupportError> {
//! let mut source = MemorySource::new();
//! source.add_mesh("plate", 2, &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0]);
//! let snap = source.add_snapshot("plate", ComputeStep::new(0.0, 1));
//! source.add_group(
//!     "plate",
//!     snap,
//!     ElementKind::Seg2,
//!     Domain::Cell,
//!     &[0, 1, 1, 2],
//!     Some(&[1, 1]),
//! );
//! let mut reader = MeshReader::open(Box::new(source))?;
//! reader.set_request(0.0, 1);
//! let output = reader.build_request()?;
//! assert_eq!(output.blocks.len(), 1);
//! # Ok(())
//! # }
//! ```

// Re-export our major subsystems:
pub mod algs;
pub mod cache;
pub mod data;
pub mod io;
pub mod mesh_error;
pub mod request;
pub mod selection;
pub mod support;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::partition::WorkerLayout;
    pub use crate::cache::{CacheStrategy, EvictionPhase, RequestCaches};
    pub use crate::data::field::{Field, FieldKind, FieldOnSupport, FieldStep};
    pub use crate::data::localization::{Localization, LocalizationKey};
    pub use crate::data::mapper::MappedField;
    pub use crate::io::{StorageMode, SupportSource};
    pub use crate::mesh_error::MeshSupportError;
    pub use crate::request::{MeshReader, RequestOutput, SupportBlock};
    pub use crate::selection::Selection;
    pub use crate::support::build::Geometry;
    pub use crate::support::catalog::SupportCatalog;
    pub use crate::support::support::{
        Intersection, PointProfileMatch, Support, SupportKey, SupportState,
    };
    pub use crate::topology::cache::InvalidateCache;
    pub use crate::topology::element::{Domain, ElementGroup, ElementKind};
    pub use crate::topology::family::{Family, Group};
    pub use crate::topology::ids::{FamilyId, ProfileId, SupportId};
    pub use crate::topology::mesh::{Mesh, MeshModel, Snapshot};
    pub use crate::topology::profile::{Profile, ProfileStore};
    pub use crate::topology::step::{ComputeStep, StepIndex, StepMode};
}
