//! MeshSupportError: Unified error type for mesh-supports public APIs
//!
//! This error type is used throughout the mesh-supports library to provide
//! robust, non-panicking error handling for all public APIs.

use thiserror::Error;

use crate::topology::ids::{ProfileId, SupportId};

/// Unified error type for mesh-supports operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshSupportError {
    /// Attempted to construct an arena handle with a zero value (invalid).
    #[error("arena handle must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidHandle,
    /// A handle does not resolve to an entry in its arena.
    #[error("unknown support handle `{0}`")]
    UnknownSupport(SupportId),
    /// A profile handle does not resolve to an entry in the profile store.
    #[error("unknown profile handle `{0}`")]
    UnknownProfile(ProfileId),
    /// A mesh, snapshot or element group index is out of range.
    #[error("unknown {what} index {index}")]
    UnknownEntry { what: &'static str, index: usize },
    /// Profile indices must be strictly increasing and 1-based.
    #[error("profile `{name}`: indices must be strictly increasing and 1-based (offending value {value} at position {position})")]
    ProfileNotSorted {
        name: String,
        value: usize,
        position: usize,
    },
    /// A profile index points past the end of its element group.
    #[error("profile `{name}`: index {value} exceeds element count {count}")]
    ProfileOutOfRange {
        name: String,
        value: usize,
        count: usize,
    },
    /// Declared element count disagrees with a decoded buffer length.
    #[error("{what}: declared {expected} entries but decoded {found}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// Connectivity references a point outside the snapshot's point range.
    #[error("connectivity references point {index} but the snapshot has {count} points")]
    PointOutOfRange { index: usize, count: usize },
    /// A support was marked invalid by an earlier failure and cannot be used.
    #[error("support `{0}` is invalid (malformed subset or connectivity)")]
    InvalidSupport(SupportId),
    /// The decode collaborator failed; aborts the current request.
    #[error("decode failure in {what}: {reason}")]
    DecodeFailed { what: &'static str, reason: String },
    /// A field step holds no storage for the requested element kind.
    #[error("field `{field}` has no values for the requested support")]
    NoFieldStorage { field: String },
    /// Worker layouts need at least one worker and a rank inside the fleet.
    #[error("worker rank {rank} outside fleet of {count}")]
    BadWorkerLayout { rank: usize, count: usize },
}
